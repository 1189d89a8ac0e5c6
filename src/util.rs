use chrono::{DateTime, NaiveDate, Utc};

use crate::dates::{five_year_span, format_key_date, format_long_date, week_days};
use crate::model::{
    DayWinSummary, Goal, GoalLink, GoalScope, Horizon, InactiveGoal, PeriodKey, Slot, Streaks,
    WeekWinSummary,
};
use crate::linker::{children_of, resolve_parent};
use crate::stats::progress_percent;

pub fn format_datetime(dt: DateTime<Utc>) -> String {
    dt.format("%Y-%m-%d %H:%M").to_string()
}

fn checkbox(done: bool) -> &'static str {
    if done {
        "x"
    } else {
        " "
    }
}

fn slot_kind(slot: Slot) -> &'static str {
    if slot.is_priority() {
        "priority"
    } else {
        "optional"
    }
}

pub fn scope_heading(scope: &GoalScope, today: NaiveDate) -> String {
    match scope.period() {
        PeriodKey::Day(date) => format!("{} - {}", scope.horizon().label(), format_long_date(date)),
        PeriodKey::Week(start) => {
            let end = week_days(start).last().copied().unwrap_or(start);
            format!(
                "{} - week of {} to {}",
                scope.horizon().label(),
                format_key_date(start),
                format_key_date(end)
            )
        }
        PeriodKey::Current => match scope.horizon() {
            Horizon::Monthly => format!("{} - {}", scope.horizon().label(), today.format("%B %Y")),
            Horizon::Yearly => format!("{} - {}", scope.horizon().label(), today.format("%Y")),
            _ => format!("{} - {}", scope.horizon().label(), five_year_span(today)),
        },
    }
}

/// Parent line of a goal. A link whose target is gone reads as unlinked.
pub fn format_link(goal: &Goal, parent: Option<&Goal>) -> String {
    match (&goal.link, parent) {
        (GoalLink::Linked { horizon, .. }, Some(parent)) => {
            format!("{} goal \"{}\" ({})", horizon, parent.title, parent.id)
        }
        _ => "unlinked".to_string(),
    }
}

/// Slot-by-slot view of one scope, with each goal's parent if it resolves.
pub fn format_goal_list(heading: &str, goals: &[Goal], parents: &[Goal]) -> String {
    let mut output = String::new();
    output.push_str(heading);
    output.push('\n');
    for slot in Slot::all() {
        match goals.iter().find(|goal| goal.slot == slot) {
            Some(goal) => {
                output.push_str(&format!(
                    "{}. [{}] {} (id {})",
                    slot,
                    checkbox(goal.done),
                    goal.title,
                    goal.id
                ));
                if let Some(area) = goal.area.as_deref() {
                    output.push_str(&format!(" #{area}"));
                }
                output.push('\n');
                if goal.link.parent_id().is_some() {
                    let parent = resolve_parent(goal, parents);
                    output.push_str(&format!("   -> {}\n", format_link(goal, parent)));
                }
            }
            None => {
                output.push_str(&format!("{}. (empty {} slot)\n", slot, slot_kind(slot)));
            }
        }
    }
    output.trim_end().to_string()
}

pub fn format_goal_detail(goal: &Goal, parent: Option<&Goal>) -> String {
    let mut output = String::new();
    output.push_str(&format!("Goal ID: {}\n", goal.id));
    output.push_str(&format!("Horizon: {}\n", goal.horizon));
    output.push_str(&format!("Slot: {} ({})\n", goal.slot, slot_kind(goal.slot)));
    output.push_str(&format!("Status: {}\n", if goal.done { "done" } else { "todo" }));
    output.push_str(&format!("Title: {}\n", goal.title));
    if let Some(area) = goal.area.as_deref() {
        output.push_str(&format!("Area: {area}\n"));
    }
    output.push_str(&format!("Parent: {}\n", format_link(goal, parent)));
    output.push_str(&format!("Created: {}", format_datetime(goal.created_at)));
    output
}

pub fn format_inactive(goals: &[InactiveGoal]) -> String {
    if goals.is_empty() {
        return "No inactive goals.".to_string();
    }
    let mut lines = vec![format!(
        "{:<38} {:<10} {:<17} {}",
        "ID", "HORIZON", "ARCHIVED", "TITLE"
    )];
    for entry in goals {
        lines.push(format!(
            "{:<38} {:<10} {:<17} {}",
            entry.goal.id,
            entry.goal.horizon.as_str(),
            format_datetime(entry.archived_at),
            entry.goal.title
        ));
    }
    lines.join("\n")
}

pub fn format_day_stats(day: &DayWinSummary) -> String {
    let verdict = if day.has_win {
        "win"
    } else if day.has_data() {
        "no win"
    } else {
        "no goals set"
    };
    format!(
        "{}: {}/{} priority goals done - {}",
        format_key_date(day.date),
        day.priority_completed_count,
        day.priority_goal_count,
        verdict
    )
}

pub fn format_week_stats(week: &WeekWinSummary) -> String {
    let mut output = format!(
        "Week of {}: {}/{} winning days - {}\n",
        format_key_date(week.week_start),
        week.winning_days(),
        week.days_with_data(),
        if week.has_win { "win" } else { "no win" }
    );
    for day in &week.days {
        output.push_str(&format!("  {}\n", format_day_stats(day)));
    }
    output.trim_end().to_string()
}

pub fn format_streaks(daily: Streaks, weekly: Streaks) -> String {
    format!(
        "Daily streak: current {} (best {})\nWeekly streak: current {} (best {})",
        daily.current, daily.best, weekly.current, weekly.best
    )
}

/// One pyramid tier. `children` is the next-smaller tier, used to count the
/// goals linked under each entry.
pub fn format_pyramid_level(heading: &str, goals: &[Goal], children: &[Goal]) -> String {
    let mut output = format!("{heading} [{}%]\n", progress_percent(goals));
    if goals.is_empty() {
        output.push_str("  No goals set yet");
        return output;
    }
    for goal in goals.iter().take(3) {
        output.push_str(&format!("  [{}] {}", checkbox(goal.done), goal.title));
        let linked = children_of(goal, children).len();
        if linked > 0 {
            output.push_str(&format!(" ({linked} linked)"));
        }
        output.push('\n');
    }
    if goals.len() > 3 {
        output.push_str(&format!("  +{} more goals\n", goals.len() - 3));
    }
    output.trim_end().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dates::parse_key_date;

    fn date(value: &str) -> NaiveDate {
        parse_key_date(value).expect("valid date")
    }

    fn goal(horizon: Horizon, slot: u8, title: &str) -> Goal {
        Goal::new(horizon, Slot::new(slot).expect("slot"), title.to_string())
    }

    #[test]
    fn goal_list_marks_empty_slots_and_dangling_links() {
        let mut daily = goal(Horizon::Daily, 1, "Write");
        daily.link = GoalLink::Linked {
            horizon: Horizon::Weekly,
            id: "gone".to_string(),
        };
        daily.done = true;
        let output = format_goal_list("Today", &[daily], &[]);
        assert!(output.contains("1. [x] Write"));
        assert!(output.contains("-> unlinked"));
        assert!(output.contains("4. (empty optional slot)"));
        assert!(output.contains("2. (empty priority slot)"));
    }

    #[test]
    fn goal_list_shows_resolved_parent() {
        let parent = goal(Horizon::Weekly, 1, "Launch");
        let mut daily = goal(Horizon::Daily, 2, "Post");
        daily.link = GoalLink::Linked {
            horizon: Horizon::Weekly,
            id: parent.id.clone(),
        };
        let output = format_goal_list("Today", &[daily], std::slice::from_ref(&parent));
        assert!(output.contains("weekly goal \"Launch\""));
    }

    #[test]
    fn day_stats_distinguish_empty_days() {
        let empty = DayWinSummary {
            date: date("2026-10-17"),
            priority_goal_count: 0,
            priority_completed_count: 0,
            has_win: false,
        };
        assert!(format_day_stats(&empty).ends_with("no goals set"));
    }

    #[test]
    fn pyramid_level_truncates_to_three() {
        let goals: Vec<Goal> = (1..=5)
            .map(|slot| goal(Horizon::Yearly, slot, &format!("Goal {slot}")))
            .collect();
        let output = format_pyramid_level("Yearly Goals", &goals, &[]);
        assert!(output.starts_with("Yearly Goals [0%]"));
        assert!(output.contains("+2 more goals"));
    }

    #[test]
    fn pyramid_level_counts_linked_children() {
        let monthly = goal(Horizon::Monthly, 1, "Ship v1");
        let mut weekly = goal(Horizon::Weekly, 1, "Beta");
        weekly.link = GoalLink::Linked {
            horizon: Horizon::Monthly,
            id: monthly.id.clone(),
        };
        let output = format_pyramid_level("Monthly Goals", &[monthly], &[weekly]);
        assert!(output.contains("[ ] Ship v1 (1 linked)"));
    }

    #[test]
    fn week_heading_spans_monday_to_sunday() {
        let scope = GoalScope::for_date(Horizon::Weekly, date("2026-10-15"));
        let heading = scope_heading(&scope, date("2026-10-17"));
        assert_eq!(heading, "Weekly Goals - week of 2026-10-12 to 2026-10-18");
    }
}
