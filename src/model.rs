use std::fmt;

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::dates::{format_key_date, week_start};
use crate::error::AppError;

pub const MIN_SLOT: u8 = 1;
pub const MAX_SLOT: u8 = 5;
pub const PRIORITY_SLOTS: u8 = 3;

#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Horizon {
    Daily,
    Weekly,
    Monthly,
    Yearly,
    FiveYear,
}

impl Horizon {
    pub const ALL: [Horizon; 5] = [
        Horizon::Daily,
        Horizon::Weekly,
        Horizon::Monthly,
        Horizon::Yearly,
        Horizon::FiveYear,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Daily => "daily",
            Self::Weekly => "weekly",
            Self::Monthly => "monthly",
            Self::Yearly => "yearly",
            Self::FiveYear => "five-year",
        }
    }

    /// Name used by the remote backend, which stores horizons in snake case.
    pub fn remote_name(&self) -> &'static str {
        match self {
            Self::FiveYear => "five_year",
            other => other.as_str(),
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Daily => "Today's Focus",
            Self::Weekly => "Weekly Goals",
            Self::Monthly => "Monthly Goals",
            Self::Yearly => "Yearly Goals",
            Self::FiveYear => "5-Year Vision",
        }
    }

    /// The next-larger horizon a goal of this horizon may link to.
    pub fn parent(&self) -> Option<Horizon> {
        match self {
            Self::Daily => Some(Self::Weekly),
            Self::Weekly => Some(Self::Monthly),
            Self::Monthly => Some(Self::Yearly),
            Self::Yearly => Some(Self::FiveYear),
            Self::FiveYear => None,
        }
    }

    pub fn child(&self) -> Option<Horizon> {
        Self::ALL
            .into_iter()
            .find(|candidate| candidate.parent() == Some(*self))
    }
}

impl fmt::Display for Horizon {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "u8", into = "u8")]
pub struct Slot(u8);

impl Slot {
    pub fn new(value: u8) -> Result<Self, AppError> {
        Self::try_from(value).map_err(AppError::InvalidInput)
    }

    pub fn all() -> impl Iterator<Item = Slot> {
        (MIN_SLOT..=MAX_SLOT).map(Slot)
    }

    pub fn get(&self) -> u8 {
        self.0
    }

    pub fn is_priority(&self) -> bool {
        self.0 <= PRIORITY_SLOTS
    }
}

impl TryFrom<u8> for Slot {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        if (MIN_SLOT..=MAX_SLOT).contains(&value) {
            Ok(Self(value))
        } else {
            Err(format!("slot must be between {MIN_SLOT} and {MAX_SLOT}, got {value}"))
        }
    }
}

impl From<Slot> for u8 {
    fn from(value: Slot) -> Self {
        value.0
    }
}

impl fmt::Display for Slot {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub enum PeriodKey {
    Day(NaiveDate),
    /// Monday that starts the week.
    Week(NaiveDate),
    Current,
}

/// One goal list: a horizon plus the period it belongs to.
#[derive(Clone, Copy, Debug, Eq, PartialEq, Hash)]
pub struct GoalScope {
    horizon: Horizon,
    period: PeriodKey,
}

impl GoalScope {
    pub fn for_date(horizon: Horizon, date: NaiveDate) -> Self {
        let period = match horizon {
            Horizon::Daily => PeriodKey::Day(date),
            Horizon::Weekly => PeriodKey::Week(week_start(date)),
            Horizon::Monthly | Horizon::Yearly | Horizon::FiveYear => PeriodKey::Current,
        };
        Self { horizon, period }
    }

    pub fn horizon(&self) -> Horizon {
        self.horizon
    }

    pub fn period(&self) -> PeriodKey {
        self.period
    }

    /// First calendar day of the period, or `today` for undated buckets.
    pub fn anchor_date(&self, today: NaiveDate) -> NaiveDate {
        match self.period {
            PeriodKey::Day(date) | PeriodKey::Week(date) => date,
            PeriodKey::Current => today,
        }
    }

    /// Scope holding the goals this scope's goals may link to.
    pub fn parent(&self, today: NaiveDate) -> Option<GoalScope> {
        let horizon = self.horizon.parent()?;
        Some(GoalScope::for_date(horizon, self.anchor_date(today)))
    }

    pub fn is_current(&self, today: NaiveDate) -> bool {
        *self == GoalScope::for_date(self.horizon, today)
    }
}

impl fmt::Display for GoalScope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.period {
            PeriodKey::Day(date) => write!(f, "{} goals for {}", self.horizon, format_key_date(date)),
            PeriodKey::Week(date) => write!(
                f,
                "{} goals for week of {}",
                self.horizon,
                format_key_date(date)
            ),
            PeriodKey::Current => write!(f, "{} goals", self.horizon),
        }
    }
}

/// Reference from a goal to a goal in the next-larger horizon. Resolution is
/// lazy; a link whose target no longer exists simply fails to resolve.
#[derive(Clone, Debug, Default, Eq, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum GoalLink {
    #[default]
    Unlinked,
    Linked { horizon: Horizon, id: String },
}

impl GoalLink {
    pub fn parent_id(&self) -> Option<&str> {
        match self {
            Self::Linked { id, .. } => Some(id.as_str()),
            Self::Unlinked => None,
        }
    }
}

#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct Goal {
    pub id: String,
    pub horizon: Horizon,
    pub slot: Slot,
    pub title: String,
    pub done: bool,
    #[serde(default)]
    pub area: Option<String>,
    #[serde(default)]
    pub link: GoalLink,
    pub created_at: DateTime<Utc>,
}

impl Goal {
    pub fn new(horizon: Horizon, slot: Slot, title: String) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            horizon,
            slot,
            title,
            done: false,
            area: None,
            link: GoalLink::Unlinked,
            created_at: Utc::now(),
        }
    }
}

#[derive(Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub struct InactiveGoal {
    pub goal: Goal,
    pub archived_at: DateTime<Utc>,
}

#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct DayWinSummary {
    pub date: NaiveDate,
    pub priority_goal_count: usize,
    pub priority_completed_count: usize,
    pub has_win: bool,
}

impl DayWinSummary {
    pub fn has_data(&self) -> bool {
        self.priority_goal_count > 0
    }
}

#[derive(Clone, Debug, Eq, PartialEq, Serialize)]
pub struct WeekWinSummary {
    pub week_start: NaiveDate,
    pub days: Vec<DayWinSummary>,
    pub has_win: bool,
}

impl WeekWinSummary {
    pub fn winning_days(&self) -> usize {
        self.days.iter().filter(|day| day.has_win).count()
    }

    pub fn days_with_data(&self) -> usize {
        self.days.iter().filter(|day| day.has_data()).count()
    }
}

#[derive(Clone, Copy, Debug, Default, Eq, PartialEq, Serialize)]
pub struct Streaks {
    pub current: u32,
    pub best: u32,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dates::parse_key_date;

    fn date(value: &str) -> NaiveDate {
        parse_key_date(value).expect("valid date")
    }

    #[test]
    fn horizon_adjacency_is_fixed() {
        assert_eq!(Horizon::Daily.parent(), Some(Horizon::Weekly));
        assert_eq!(Horizon::Yearly.parent(), Some(Horizon::FiveYear));
        assert_eq!(Horizon::FiveYear.parent(), None);
        assert_eq!(Horizon::Weekly.child(), Some(Horizon::Daily));
        assert_eq!(Horizon::Daily.child(), None);
    }

    #[test]
    fn slot_rejects_out_of_range() {
        assert!(Slot::new(0).is_err());
        assert!(Slot::new(6).is_err());
        assert!(Slot::new(3).expect("slot").is_priority());
        assert!(!Slot::new(4).expect("slot").is_priority());
    }

    #[test]
    fn scope_normalizes_period() {
        let scope = GoalScope::for_date(Horizon::Weekly, date("2026-10-17"));
        assert_eq!(scope.period(), PeriodKey::Week(date("2026-10-12")));
        let scope = GoalScope::for_date(Horizon::Yearly, date("2026-10-17"));
        assert_eq!(scope.period(), PeriodKey::Current);
    }

    #[test]
    fn daily_scope_parent_is_week_of_day() {
        let today = date("2026-10-17");
        let scope = GoalScope::for_date(Horizon::Daily, date("2026-10-05"));
        let parent = scope.parent(today).expect("parent scope");
        assert_eq!(parent.horizon(), Horizon::Weekly);
        assert_eq!(parent.period(), PeriodKey::Week(date("2026-10-05")));
        assert!(GoalScope::for_date(Horizon::FiveYear, today).parent(today).is_none());
    }

    #[test]
    fn goal_deserializes_without_optional_fields() {
        let raw = r#"{"id":"a","horizon":"five-year","slot":2,"title":"Run","done":false,"created_at":"2026-10-17T08:00:00Z"}"#;
        let goal: Goal = serde_json::from_str(raw).expect("parse goal");
        assert_eq!(goal.horizon, Horizon::FiveYear);
        assert_eq!(goal.link, GoalLink::Unlinked);
        assert_eq!(goal.area, None);
    }

    #[test]
    fn goal_with_invalid_slot_fails_to_parse() {
        let raw = r#"{"id":"a","horizon":"daily","slot":9,"title":"Run","done":false,"created_at":"2026-10-17T08:00:00Z"}"#;
        assert!(serde_json::from_str::<Goal>(raw).is_err());
    }
}
