use std::collections::BTreeSet;
use std::fmt;

use chrono::{Days, NaiveDate, Utc};
use tracing::{info, warn};

use crate::dates::week_start;
use crate::error::AppError;
use crate::linker;
use crate::model::{
    DayWinSummary, Goal, GoalScope, Horizon, InactiveGoal, Slot, Streaks, WeekWinSummary,
};
use crate::repo::GoalRepository;
use crate::stats::{build_day_stats, group_into_weeks};
use crate::streak::compute_streaks;

/// A write that could not be persisted. The change still took effect for the
/// current command.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct StoreNotice {
    pub target: String,
    pub message: String,
}

impl fmt::Display for StoreNotice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "could not save {} ({}); the change was kept for this session only",
            self.target, self.message
        )
    }
}

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq)]
pub struct StreakReport {
    pub daily: Streaks,
    pub weekly: Streaks,
}

pub struct PyramidLevel {
    pub scope: GoalScope,
    pub goals: Vec<Goal>,
}

pub struct App {
    repo: Box<dyn GoalRepository>,
    today: NaiveDate,
}

impl App {
    pub fn new(repo: Box<dyn GoalRepository>, today: NaiveDate) -> Self {
        Self { repo, today }
    }

    pub fn today(&self) -> NaiveDate {
        self.today
    }

    pub fn scope(&self, horizon: Horizon, date: Option<NaiveDate>) -> GoalScope {
        GoalScope::for_date(horizon, date.unwrap_or(self.today))
    }

    /// Goals of one scope ordered by slot.
    pub async fn list_goals(&self, scope: &GoalScope) -> Result<Vec<Goal>, AppError> {
        let mut goals = self.repo.load_goals(scope).await?;
        goals.sort_by_key(|goal| goal.slot);
        Ok(goals)
    }

    pub async fn get_goal(&self, scope: &GoalScope, id: &str) -> Result<Option<Goal>, AppError> {
        let goals = self.repo.load_goals(scope).await?;
        Ok(goals.into_iter().find(|goal| goal.id == id))
    }

    /// Fills `slot` with a brand new goal, replacing whatever occupied it.
    pub async fn upsert_goal(
        &self,
        scope: &GoalScope,
        slot: Slot,
        title: &str,
        area: Option<String>,
    ) -> Result<(Goal, Option<StoreNotice>), AppError> {
        let title = ensure_title(title)?;
        let mut goals = self.repo.load_goals(scope).await?;
        goals.retain(|goal| goal.slot != slot);

        let mut goal = Goal::new(scope.horizon(), slot, title);
        goal.area = normalize_area(area);
        goals.push(goal.clone());
        goals.sort_by_key(|goal| goal.slot);

        let notice = self.persist_goals(scope, &goals).await;
        info!(%scope, slot = %slot, id = %goal.id, "goal set");
        Ok((goal, notice))
    }

    pub async fn rename_goal(
        &self,
        scope: &GoalScope,
        id: &str,
        title: &str,
    ) -> Result<(Option<Goal>, Option<StoreNotice>), AppError> {
        let title = ensure_title(title)?;
        self.modify_goal(scope, id, |goal| {
            goal.title = title;
            Ok(())
        })
        .await
    }

    pub async fn toggle_done(
        &self,
        scope: &GoalScope,
        id: &str,
    ) -> Result<(Option<Goal>, Option<StoreNotice>), AppError> {
        self.modify_goal(scope, id, |goal| {
            goal.done = !goal.done;
            Ok(())
        })
        .await
    }

    pub async fn set_area(
        &self,
        scope: &GoalScope,
        id: &str,
        area: Option<String>,
    ) -> Result<(Option<Goal>, Option<StoreNotice>), AppError> {
        let area = normalize_area(area);
        self.modify_goal(scope, id, |goal| {
            goal.area = area;
            Ok(())
        })
        .await
    }

    pub async fn link_to_parent(
        &self,
        scope: &GoalScope,
        id: &str,
        parent_horizon: Horizon,
        parent_id: &str,
    ) -> Result<(Option<Goal>, Option<StoreNotice>), AppError> {
        self.modify_goal(scope, id, |goal| {
            linker::link_to_parent(goal, parent_horizon, parent_id)
        })
        .await
    }

    pub async fn unlink(
        &self,
        scope: &GoalScope,
        id: &str,
    ) -> Result<(Option<Goal>, Option<StoreNotice>), AppError> {
        self.modify_goal(scope, id, |goal| {
            linker::unlink(goal);
            Ok(())
        })
        .await
    }

    /// Empties a slot without archiving its goal.
    pub async fn clear_slot(
        &self,
        scope: &GoalScope,
        slot: Slot,
    ) -> Result<(Option<Goal>, Option<StoreNotice>), AppError> {
        let mut goals = self.repo.load_goals(scope).await?;
        let Some(idx) = goals.iter().position(|goal| goal.slot == slot) else {
            return Ok((None, None));
        };
        let removed = goals.remove(idx);
        let notice = self.persist_goals(scope, &goals).await;
        Ok((Some(removed), notice))
    }

    /// Resolves the parent of `goal`, which lives in `scope`, against the
    /// parent horizon's list for the enclosing period.
    pub async fn resolve_parent(
        &self,
        scope: &GoalScope,
        goal: &Goal,
    ) -> Result<Option<Goal>, AppError> {
        let Some(parent_scope) = scope.parent(self.today) else {
            return Ok(None);
        };
        if goal.link.parent_id().is_none() {
            return Ok(None);
        }
        let parents = self.repo.load_goals(&parent_scope).await?;
        Ok(linker::resolve_parent(goal, &parents).cloned())
    }

    /// Moves a goal into the inactive holding list.
    pub async fn archive_goal(
        &self,
        scope: &GoalScope,
        id: &str,
    ) -> Result<(Option<InactiveGoal>, Option<StoreNotice>), AppError> {
        let mut goals = self.repo.load_goals(scope).await?;
        let Some(idx) = goals.iter().position(|goal| goal.id == id) else {
            return Ok((None, None));
        };
        let goal = goals.remove(idx);
        let archived = InactiveGoal {
            goal,
            archived_at: Utc::now(),
        };

        let mut inactive = self.repo.load_inactive().await?;
        inactive.push(archived.clone());

        // The goal must never be stored in both lists.
        if let Some(notice) = self.persist_goals(scope, &goals).await {
            return Ok((Some(archived), Some(notice)));
        }
        let notice = self.persist_inactive(&inactive).await;
        info!(%scope, id, "goal archived");
        Ok((Some(archived), notice))
    }

    pub async fn list_inactive(&self) -> Result<Vec<InactiveGoal>, AppError> {
        self.repo.load_inactive().await
    }

    /// Restores an archived goal into the first free slot of its horizon's
    /// current period.
    pub async fn restore_goal(
        &self,
        id: &str,
    ) -> Result<(Option<Goal>, Option<StoreNotice>), AppError> {
        let mut inactive = self.repo.load_inactive().await?;
        let Some(idx) = inactive.iter().position(|entry| entry.goal.id == id) else {
            return Ok((None, None));
        };
        let horizon = inactive[idx].goal.horizon;
        let scope = GoalScope::for_date(horizon, self.today);
        let mut goals = self.repo.load_goals(&scope).await?;
        let Some(slot) = Slot::all().find(|slot| goals.iter().all(|goal| goal.slot != *slot))
        else {
            return Err(AppError::InvalidInput(format!(
                "no free slot left in {scope}; clear or archive a goal first"
            )));
        };

        let mut goal = inactive.remove(idx).goal;
        goal.slot = slot;
        goal.done = false;
        goals.push(goal.clone());
        goals.sort_by_key(|goal| goal.slot);

        let notice = self.persist_goals(&scope, &goals).await;
        let notice = self.persist_inactive(&inactive).await.or(notice);
        info!(%scope, slot = %slot, id, "goal restored");
        Ok((Some(goal), notice))
    }

    pub async fn day_stats(&self, date: NaiveDate) -> Result<DayWinSummary, AppError> {
        let goals = self
            .repo
            .load_goals(&GoalScope::for_date(Horizon::Daily, date))
            .await?;
        Ok(build_day_stats(date, &goals))
    }

    /// Day summaries from the first recorded day through today. Indexed days
    /// and today are read from the store. A run of unrecorded days collapses
    /// to its first day plus each Monday inside it, all empty, so the gap
    /// still breaks daily and weekly streaks.
    pub async fn day_history(&self) -> Result<Vec<DayWinSummary>, AppError> {
        let dates: BTreeSet<NaiveDate> = self
            .repo
            .snapshot_dates()
            .await?
            .into_iter()
            .filter(|date| *date < self.today)
            .collect();

        let mut history = Vec::with_capacity(dates.len() + 1);
        let mut previous: Option<NaiveDate> = None;
        for date in dates.iter().copied().chain(std::iter::once(self.today)) {
            if let Some(previous) = previous {
                for gap_day in gap_markers(previous, date) {
                    history.push(build_day_stats(gap_day, &[]));
                }
            }
            history.push(self.day_stats(date).await?);
            previous = Some(date);
        }
        Ok(history)
    }

    pub async fn week_history(&self) -> Result<Vec<WeekWinSummary>, AppError> {
        let days = self.day_history().await?;
        Ok(group_into_weeks(&days))
    }

    pub async fn streaks(&self) -> Result<StreakReport, AppError> {
        let days = self.day_history().await?;
        let weeks = group_into_weeks(&days);
        Ok(StreakReport {
            daily: compute_streaks(&days),
            weekly: compute_streaks(&weeks),
        })
    }

    /// Current lists of every horizon, largest horizon first.
    pub async fn pyramid(&self) -> Result<Vec<PyramidLevel>, AppError> {
        let mut levels = Vec::with_capacity(Horizon::ALL.len());
        for horizon in Horizon::ALL.into_iter().rev() {
            let scope = GoalScope::for_date(horizon, self.today);
            let goals = self.list_goals(&scope).await?;
            levels.push(PyramidLevel { scope, goals });
        }
        Ok(levels)
    }

    async fn modify_goal<F>(
        &self,
        scope: &GoalScope,
        id: &str,
        apply: F,
    ) -> Result<(Option<Goal>, Option<StoreNotice>), AppError>
    where
        F: FnOnce(&mut Goal) -> Result<(), AppError>,
    {
        let mut goals = self.repo.load_goals(scope).await?;
        let Some(goal) = goals.iter_mut().find(|goal| goal.id == id) else {
            return Ok((None, None));
        };
        apply(goal)?;
        let updated = goal.clone();
        let notice = self.persist_goals(scope, &goals).await;
        Ok((Some(updated), notice))
    }

    async fn persist_goals(&self, scope: &GoalScope, goals: &[Goal]) -> Option<StoreNotice> {
        match self.repo.save_goals(scope, goals).await {
            Ok(()) => None,
            Err(err) => {
                warn!(%scope, error = %err, "failed to persist goal list");
                Some(StoreNotice {
                    target: scope.to_string(),
                    message: err.to_string(),
                })
            }
        }
    }

    async fn persist_inactive(&self, goals: &[InactiveGoal]) -> Option<StoreNotice> {
        match self.repo.save_inactive(goals).await {
            Ok(()) => None,
            Err(err) => {
                warn!(error = %err, "failed to persist inactive goals");
                Some(StoreNotice {
                    target: "inactive goals".to_string(),
                    message: err.to_string(),
                })
            }
        }
    }
}

/// Empty days kept between two recorded days: the first missing day and
/// every Monday after it.
fn gap_markers(previous: NaiveDate, next: NaiveDate) -> Vec<NaiveDate> {
    let Some(first) = previous.checked_add_days(Days::new(1)) else {
        return Vec::new();
    };
    if first >= next {
        return Vec::new();
    }
    let mut markers = vec![first];
    let mut monday = week_start(first) + Days::new(7);
    while monday < next {
        markers.push(monday);
        monday = monday + Days::new(7);
    }
    markers
}

fn ensure_title(value: &str) -> Result<String, AppError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(AppError::InvalidInput("goal title cannot be empty".to_string()));
    }
    Ok(trimmed.to_string())
}

fn normalize_area(area: Option<String>) -> Option<String> {
    area.map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}
