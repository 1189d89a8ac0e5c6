use crate::model::{DayWinSummary, Streaks, WeekWinSummary};

/// A summarized period that either was or was not a win.
pub trait WinRecord {
    fn is_win(&self) -> bool;
}

impl WinRecord for DayWinSummary {
    fn is_win(&self) -> bool {
        self.has_win
    }
}

impl WinRecord for WeekWinSummary {
    fn is_win(&self) -> bool {
        self.has_win
    }
}

/// Computes streaks from periods ordered oldest first.
///
/// The scan runs from the most recent period backward. `current` only grows
/// while the run that starts at the most recent period is unbroken, so a
/// missing or lost "today" leaves it at zero even when yesterday closed a
/// long run. `best` is the longest run anywhere.
pub fn compute_streaks<T: WinRecord>(periods: &[T]) -> Streaks {
    let mut streaks = Streaks::default();
    let mut running = 0u32;
    let mut in_current_run = true;

    for period in periods.iter().rev() {
        if period.is_win() {
            running += 1;
            if in_current_run {
                streaks.current = running;
            }
        } else {
            in_current_run = false;
            running = 0;
        }
        streaks.best = streaks.best.max(running);
    }

    streaks
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Outcome(bool);

    impl WinRecord for Outcome {
        fn is_win(&self) -> bool {
            self.0
        }
    }

    /// Builds oldest-first input from a most-recent-first description.
    fn recent_first(wins: &[bool]) -> Vec<Outcome> {
        wins.iter().rev().map(|win| Outcome(*win)).collect()
    }

    #[test]
    fn no_history_has_no_streaks() {
        let streaks = compute_streaks::<Outcome>(&[]);
        assert_eq!(streaks, Streaks { current: 0, best: 0 });
    }

    #[test]
    fn current_run_ends_at_first_loss() {
        let streaks = compute_streaks(&recent_first(&[true, true, false, true]));
        assert_eq!(streaks, Streaks { current: 2, best: 2 });
    }

    #[test]
    fn lost_today_keeps_best_but_zeroes_current() {
        let streaks = compute_streaks(&recent_first(&[false, true, true, true]));
        assert_eq!(streaks, Streaks { current: 0, best: 3 });
    }

    #[test]
    fn best_run_can_be_older_than_current() {
        let streaks = compute_streaks(&recent_first(&[true, false, true, true, true, false]));
        assert_eq!(streaks, Streaks { current: 1, best: 3 });
    }

    #[test]
    fn unbroken_history_counts_every_period() {
        let streaks = compute_streaks(&recent_first(&[true, true, true, true]));
        assert_eq!(streaks, Streaks { current: 4, best: 4 });
    }

    #[test]
    fn all_losses_have_no_streaks() {
        let streaks = compute_streaks(&recent_first(&[false, false]));
        assert_eq!(streaks, Streaks { current: 0, best: 0 });
    }
}
