use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDate;
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use tracing::{debug, warn};

use crate::dates::{format_key_date, parse_key_date};
use crate::error::AppError;
use crate::model::{Goal, GoalScope, Horizon, InactiveGoal, PeriodKey};
use crate::store::KeyValueStore;

pub const LIVE_DAILY_KEY: &str = "daily-outcomes";
pub const LIVE_DAILY_DATE_KEY: &str = "daily-outcomes-date";
pub const INACTIVE_KEY: &str = "inactive-goals";

/// Storage key holding the goal list of `scope`.
pub fn scope_key(scope: &GoalScope) -> String {
    match (scope.horizon(), scope.period()) {
        (Horizon::Daily, PeriodKey::Day(date)) => {
            format!("{LIVE_DAILY_KEY}-{}", format_key_date(date))
        }
        (Horizon::Weekly, PeriodKey::Week(start)) => {
            format!("weekly-goals-{}", format_key_date(start))
        }
        (horizon, _) => format!("{}-goals", horizon.as_str()),
    }
}

/// Where goal lists live. Aggregation and the goal store only see this trait.
#[async_trait]
pub trait GoalRepository: Send + Sync {
    /// Goals of one scope, in stored order.
    async fn load_goals(&self, scope: &GoalScope) -> Result<Vec<Goal>, AppError>;

    /// Replaces the whole list of one scope.
    async fn save_goals(&self, scope: &GoalScope, goals: &[Goal]) -> Result<(), AppError>;

    async fn load_inactive(&self) -> Result<Vec<InactiveGoal>, AppError>;

    async fn save_inactive(&self, goals: &[InactiveGoal]) -> Result<(), AppError>;

    /// Days with a dated daily snapshot, ascending.
    async fn snapshot_dates(&self) -> Result<Vec<NaiveDate>, AppError>;
}

pub struct LocalRepository {
    store: Arc<dyn KeyValueStore>,
    today: NaiveDate,
}

impl LocalRepository {
    pub fn new(store: Arc<dyn KeyValueStore>, today: NaiveDate) -> Self {
        Self { store, today }
    }

    pub fn today(&self) -> NaiveDate {
        self.today
    }

    async fn read_list<T: DeserializeOwned>(&self, key: &str) -> Result<Option<Vec<T>>, AppError> {
        let Some(value) = self.store.get(key).await? else {
            return Ok(None);
        };
        match serde_json::from_value(value) {
            Ok(items) => Ok(Some(items)),
            Err(err) => {
                warn!(key, error = %err, "ignoring unreadable entry");
                Ok(None)
            }
        }
    }

    /// The live list, if it was written for today. A live list without a
    /// date marker is only trusted while no dated snapshot exists.
    async fn live_list_for_today(&self) -> Result<Vec<Goal>, AppError> {
        let marker = self.store.get(LIVE_DAILY_DATE_KEY).await?;
        match marker.as_ref().and_then(Value::as_str).and_then(parse_key_date) {
            Some(date) if date == self.today => {}
            Some(date) => {
                debug!(date = %date, "live daily list belongs to an earlier day");
                return Ok(Vec::new());
            }
            None => {
                if marker.is_some() || !self.store.snapshot_dates().await?.is_empty() {
                    debug!("live daily list has no usable date; ignoring it");
                    return Ok(Vec::new());
                }
            }
        }
        Ok(self.read_list(LIVE_DAILY_KEY).await?.unwrap_or_default())
    }

    async fn write_list<T: Serialize>(&self, key: &str, items: &[T]) -> Result<(), AppError> {
        let value = serde_json::to_value(items)?;
        self.store.set(key, value).await
    }
}

#[async_trait]
impl GoalRepository for LocalRepository {
    async fn load_goals(&self, scope: &GoalScope) -> Result<Vec<Goal>, AppError> {
        let key = scope_key(scope);
        if let Some(goals) = self.read_list(&key).await? {
            return Ok(goals);
        }
        // Only today may fall back to the undated live list.
        if scope.horizon() == Horizon::Daily && scope.is_current(self.today) {
            debug!(key, "no dated snapshot yet; reading live daily list");
            return self.live_list_for_today().await;
        }
        Ok(Vec::new())
    }

    async fn save_goals(&self, scope: &GoalScope, goals: &[Goal]) -> Result<(), AppError> {
        let key = scope_key(scope);
        self.write_list(&key, goals).await?;
        if let PeriodKey::Day(date) = scope.period() {
            self.store.index_snapshot_date(date).await?;
            if date == self.today {
                self.write_list(LIVE_DAILY_KEY, goals).await?;
                self.store
                    .set(LIVE_DAILY_DATE_KEY, Value::String(format_key_date(date)))
                    .await?;
            }
        }
        debug!(key, count = goals.len(), "saved goal list");
        Ok(())
    }

    async fn load_inactive(&self) -> Result<Vec<InactiveGoal>, AppError> {
        Ok(self.read_list(INACTIVE_KEY).await?.unwrap_or_default())
    }

    async fn save_inactive(&self, goals: &[InactiveGoal]) -> Result<(), AppError> {
        self.write_list(INACTIVE_KEY, goals).await
    }

    async fn snapshot_dates(&self) -> Result<Vec<NaiveDate>, AppError> {
        self.store.snapshot_dates().await
    }
}
