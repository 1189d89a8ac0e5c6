use std::collections::BTreeMap;

use chrono::NaiveDate;

use crate::dates::week_start;
use crate::model::{DayWinSummary, Goal, Horizon, WeekWinSummary};

/// Smallest count that reaches two thirds of `total`, rounded up.
pub fn win_threshold(total: usize) -> usize {
    (total * 2).div_ceil(3)
}

/// Summarizes one day. Only priority slots count; a day without priority
/// goals is never a win.
pub fn build_day_stats(date: NaiveDate, goals: &[Goal]) -> DayWinSummary {
    let priority: Vec<&Goal> = goals
        .iter()
        .filter(|goal| goal.horizon == Horizon::Daily && goal.slot.is_priority())
        .collect();
    let priority_goal_count = priority.len();
    let priority_completed_count = priority.iter().filter(|goal| goal.done).count();
    let has_win =
        priority_goal_count > 0 && priority_completed_count >= win_threshold(priority_goal_count);
    DayWinSummary {
        date,
        priority_goal_count,
        priority_completed_count,
        has_win,
    }
}

pub fn build_week_stats(week_start: NaiveDate, mut days: Vec<DayWinSummary>) -> WeekWinSummary {
    days.sort_by_key(|day| day.date);
    let with_data = days.iter().filter(|day| day.has_data()).count();
    let wins = days.iter().filter(|day| day.has_win).count();
    let has_win = with_data > 0 && wins >= win_threshold(with_data);
    WeekWinSummary {
        week_start,
        days,
        has_win,
    }
}

/// Buckets day summaries into Monday-anchored weeks, oldest week first.
pub fn group_into_weeks(days: &[DayWinSummary]) -> Vec<WeekWinSummary> {
    let mut buckets: BTreeMap<NaiveDate, Vec<DayWinSummary>> = BTreeMap::new();
    for day in days {
        buckets
            .entry(week_start(day.date))
            .or_default()
            .push(day.clone());
    }
    buckets
        .into_iter()
        .map(|(start, days)| build_week_stats(start, days))
        .collect()
}

pub fn progress_percent(goals: &[Goal]) -> u8 {
    if goals.is_empty() {
        return 0;
    }
    let done = goals.iter().filter(|goal| goal.done).count();
    ((done as f64 / goals.len() as f64) * 100.0).round() as u8
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dates::parse_key_date;
    use crate::model::Slot;

    fn date(value: &str) -> NaiveDate {
        parse_key_date(value).expect("valid date")
    }

    fn daily(slot: u8, done: bool) -> Goal {
        let mut goal = Goal::new(
            Horizon::Daily,
            Slot::new(slot).expect("slot"),
            format!("Goal {slot}"),
        );
        goal.done = done;
        goal
    }

    fn day(value: &str, total: usize, completed: usize) -> DayWinSummary {
        DayWinSummary {
            date: date(value),
            priority_goal_count: total,
            priority_completed_count: completed,
            has_win: total > 0 && completed >= win_threshold(total),
        }
    }

    #[test]
    fn threshold_rounds_up() {
        assert_eq!(win_threshold(1), 1);
        assert_eq!(win_threshold(2), 2);
        assert_eq!(win_threshold(3), 2);
        assert_eq!(win_threshold(6), 4);
        assert_eq!(win_threshold(7), 5);
    }

    #[test]
    fn two_of_three_priority_goals_is_a_win() {
        let goals = vec![daily(1, true), daily(2, true), daily(3, false)];
        let stats = build_day_stats(date("2026-10-17"), &goals);
        assert_eq!(stats.priority_goal_count, 3);
        assert_eq!(stats.priority_completed_count, 2);
        assert!(stats.has_win);
    }

    #[test]
    fn one_of_three_priority_goals_is_not_a_win() {
        let goals = vec![daily(1, true), daily(2, false), daily(3, false)];
        assert!(!build_day_stats(date("2026-10-17"), &goals).has_win);
    }

    #[test]
    fn day_without_priority_goals_is_not_a_win() {
        let stats = build_day_stats(date("2026-10-17"), &[]);
        assert_eq!(stats.priority_goal_count, 0);
        assert!(!stats.has_win);
    }

    #[test]
    fn optional_slots_never_count() {
        let goals = vec![daily(1, false), daily(4, true), daily(5, true)];
        let stats = build_day_stats(date("2026-10-17"), &goals);
        assert_eq!(stats.priority_goal_count, 1);
        assert_eq!(stats.priority_completed_count, 0);
        assert!(!stats.has_win);

        let only_optional = vec![daily(4, true), daily(5, true)];
        assert!(!build_day_stats(date("2026-10-17"), &only_optional).has_win);
    }

    #[test]
    fn week_win_counts_only_days_with_data() {
        let days = vec![
            day("2026-10-12", 3, 2),
            day("2026-10-13", 3, 3),
            day("2026-10-14", 3, 0),
            day("2026-10-15", 0, 0),
            day("2026-10-16", 0, 0),
        ];
        let week = build_week_stats(date("2026-10-12"), days);
        assert_eq!(week.days_with_data(), 3);
        assert_eq!(week.winning_days(), 2);
        assert!(week.has_win);
    }

    #[test]
    fn week_without_data_is_not_a_win() {
        let week = build_week_stats(date("2026-10-12"), vec![day("2026-10-12", 0, 0)]);
        assert!(!week.has_win);
    }

    #[test]
    fn weeks_are_grouped_by_monday_in_order() {
        let days = vec![
            day("2026-10-19", 3, 3),
            day("2026-10-11", 3, 3),
            day("2026-10-12", 3, 1),
            day("2026-10-18", 3, 3),
        ];
        let weeks = group_into_weeks(&days);
        let starts: Vec<NaiveDate> = weeks.iter().map(|week| week.week_start).collect();
        assert_eq!(
            starts,
            vec![date("2026-10-05"), date("2026-10-12"), date("2026-10-19")]
        );
        assert_eq!(weeks[1].days.len(), 2);
        assert_eq!(weeks[1].days[0].date, date("2026-10-12"));
        assert!(weeks[1].has_win);
    }

    #[test]
    fn progress_rounds_to_percent() {
        assert_eq!(progress_percent(&[]), 0);
        let goals = vec![daily(1, true), daily(2, false), daily(3, false)];
        assert_eq!(progress_percent(&goals), 33);
        let goals = vec![daily(1, true), daily(2, true), daily(3, false)];
        assert_eq!(progress_percent(&goals), 67);
    }
}
