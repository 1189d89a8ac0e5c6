//! Optional remote backend holding one goal list per horizon for a workspace.

use std::collections::BTreeSet;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use reqwest::{header, Client};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, info, warn};
use url::Url;

use crate::error::AppError;
use crate::model::{Goal, GoalLink, GoalScope, Horizon, InactiveGoal, Slot};
use crate::repo::{GoalRepository, LocalRepository};

const DEFAULT_TIMEOUT_SECS: u64 = 10;

#[derive(Debug, Error)]
pub enum RemoteError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("server error {status}: {message}")]
    Server { status: u16, message: String },

    #[error("invalid remote url: {0}")]
    InvalidUrl(String),

    #[error("remote token is not a valid header value")]
    InvalidToken,
}

#[derive(Clone, Debug)]
pub struct RemoteConfig {
    pub base_url: Url,
    pub token: Option<String>,
    pub timeout_secs: u64,
}

impl RemoteConfig {
    pub fn new(base_url: &str, token: Option<String>) -> Result<Self, RemoteError> {
        let base_url =
            Url::parse(base_url).map_err(|err| RemoteError::InvalidUrl(format!("{base_url}: {err}")))?;
        if base_url.cannot_be_a_base() {
            return Err(RemoteError::InvalidUrl(base_url.to_string()));
        }
        Ok(Self {
            base_url,
            token,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
        })
    }
}

/// Goal row as the backend stores it. `active` is the inverse of `done`.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct RemoteGoal {
    pub id: String,
    #[serde(default)]
    pub slot: Option<u8>,
    pub title: String,
    pub active: bool,
    #[serde(default)]
    pub area: Option<String>,
    #[serde(default)]
    pub parent_goal_id: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl RemoteGoal {
    fn from_goal(goal: &Goal) -> Self {
        Self {
            id: goal.id.clone(),
            slot: Some(goal.slot.get()),
            title: goal.title.clone(),
            active: !goal.done,
            area: goal.area.clone(),
            parent_goal_id: goal.link.parent_id().map(str::to_string),
            created_at: goal.created_at,
        }
    }
}

pub struct RemoteClient {
    config: RemoteConfig,
    client: Client,
}

impl RemoteClient {
    pub fn new(config: RemoteConfig) -> Result<Self, RemoteError> {
        let mut headers = header::HeaderMap::new();
        if let Some(token) = config.token.as_deref() {
            let value = header::HeaderValue::from_str(&format!("Bearer {token}"))
                .map_err(|_| RemoteError::InvalidToken)?;
            headers.insert(header::AUTHORIZATION, value);
        }
        let client = Client::builder()
            .default_headers(headers)
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;
        Ok(Self { config, client })
    }

    pub async fn list_goals(
        &self,
        scope_id: &str,
        horizon: Horizon,
    ) -> Result<Vec<Goal>, RemoteError> {
        let url = self.goals_url(scope_id, horizon)?;
        let response = self.client.get(url).send().await?;
        let rows: Vec<RemoteGoal> = check_status(response).await?.json().await?;
        debug!(%horizon, count = rows.len(), "fetched remote goals");
        Ok(decode_goals(horizon, rows))
    }

    pub async fn replace_goals(
        &self,
        scope_id: &str,
        horizon: Horizon,
        goals: &[Goal],
    ) -> Result<(), RemoteError> {
        let url = self.goals_url(scope_id, horizon)?;
        let body: Vec<RemoteGoal> = goals.iter().map(RemoteGoal::from_goal).collect();
        let response = self.client.put(url).json(&body).send().await?;
        check_status(response).await?;
        debug!(%horizon, count = goals.len(), "replaced remote goals");
        Ok(())
    }

    fn goals_url(&self, scope_id: &str, horizon: Horizon) -> Result<Url, RemoteError> {
        let mut url = self.config.base_url.clone();
        url.path_segments_mut()
            .map_err(|_| RemoteError::InvalidUrl(self.config.base_url.to_string()))?
            .pop_if_empty()
            .extend(["workspaces", scope_id, "goals"]);
        url.query_pairs_mut()
            .append_pair("horizon", horizon.remote_name());
        Ok(url)
    }
}

async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, RemoteError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let message = response.text().await.unwrap_or_default();
    let message = if message.trim().is_empty() {
        status
            .canonical_reason()
            .unwrap_or("request failed")
            .to_string()
    } else {
        message
    };
    Err(RemoteError::Server {
        status: status.as_u16(),
        message,
    })
}

/// Turns backend rows into slot-placed goals. Rows keep a valid, unused slot;
/// the rest take the next free slot in creation order, and rows beyond the
/// last slot are dropped.
fn decode_goals(horizon: Horizon, mut rows: Vec<RemoteGoal>) -> Vec<Goal> {
    rows.sort_by(|a, b| a.created_at.cmp(&b.created_at));
    let mut taken = BTreeSet::new();
    let mut placed: Vec<(Option<Slot>, RemoteGoal)> = Vec::with_capacity(rows.len());
    for row in rows {
        let slot = row
            .slot
            .and_then(|value| Slot::try_from(value).ok())
            .filter(|slot| taken.insert(*slot));
        placed.push((slot, row));
    }

    let mut goals = Vec::with_capacity(placed.len());
    for (slot, row) in placed {
        let slot = match slot {
            Some(slot) => slot,
            None => match Slot::all().find(|candidate| !taken.contains(candidate)) {
                Some(free) => {
                    taken.insert(free);
                    free
                }
                None => {
                    warn!(%horizon, id = %row.id, "no free slot for remote goal; dropping it");
                    continue;
                }
            },
        };
        let link = match (row.parent_goal_id, horizon.parent()) {
            (Some(id), Some(parent)) if !id.trim().is_empty() => GoalLink::Linked {
                horizon: parent,
                id,
            },
            _ => GoalLink::Unlinked,
        };
        goals.push(Goal {
            id: row.id,
            horizon,
            slot,
            title: row.title,
            done: !row.active,
            area: row.area,
            link,
            created_at: row.created_at,
        });
    }
    goals.sort_by_key(|goal| goal.slot);
    goals
}

/// Local repository mirrored to the backend. Reads are always local; writes
/// land locally first and a failed remote write only logs, so local data
/// wins until the next successful pull.
pub struct RemoteRepository {
    local: LocalRepository,
    client: RemoteClient,
    workspace: String,
}

impl RemoteRepository {
    pub fn new(local: LocalRepository, client: RemoteClient, workspace: String) -> Self {
        Self {
            local,
            client,
            workspace,
        }
    }

    /// Overwrites every current local list with the backend's copy.
    ///
    /// The backend keeps a single undated daily list. It is taken as today's
    /// only when it is empty or holds a goal created today; otherwise it is
    /// an earlier day's list and is skipped.
    pub async fn pull(&self) -> Result<usize, AppError> {
        let today = self.local.today();
        let mut total = 0;
        for horizon in Horizon::ALL {
            let goals = self.client.list_goals(&self.workspace, horizon).await?;
            if horizon == Horizon::Daily
                && !goals.is_empty()
                && goals
                    .iter()
                    .all(|goal| goal.created_at.date_naive() != today)
            {
                info!(workspace = %self.workspace, "remote daily list predates today; skipped");
                continue;
            }
            let scope = GoalScope::for_date(horizon, today);
            self.local.save_goals(&scope, &goals).await?;
            total += goals.len();
        }
        info!(workspace = %self.workspace, total, "pulled remote goals");
        Ok(total)
    }

    /// Replaces every backend list with the current local one.
    pub async fn push(&self) -> Result<usize, AppError> {
        let today = self.local.today();
        let mut total = 0;
        for horizon in Horizon::ALL {
            let scope = GoalScope::for_date(horizon, today);
            let goals = self.local.load_goals(&scope).await?;
            self.client
                .replace_goals(&self.workspace, horizon, &goals)
                .await?;
            total += goals.len();
        }
        info!(workspace = %self.workspace, total, "pushed local goals");
        Ok(total)
    }
}

#[async_trait]
impl GoalRepository for RemoteRepository {
    async fn load_goals(&self, scope: &GoalScope) -> Result<Vec<Goal>, AppError> {
        self.local.load_goals(scope).await
    }

    async fn save_goals(&self, scope: &GoalScope, goals: &[Goal]) -> Result<(), AppError> {
        self.local.save_goals(scope, goals).await?;
        // The backend only keeps the current period of each horizon.
        if !scope.is_current(self.local.today()) {
            return Ok(());
        }
        if let Err(err) = self
            .client
            .replace_goals(&self.workspace, scope.horizon(), goals)
            .await
        {
            warn!(%scope, error = %err, "remote sync failed; kept local copy");
        }
        Ok(())
    }

    async fn load_inactive(&self) -> Result<Vec<InactiveGoal>, AppError> {
        self.local.load_inactive().await
    }

    async fn save_inactive(&self, goals: &[InactiveGoal]) -> Result<(), AppError> {
        self.local.save_inactive(goals).await
    }

    async fn snapshot_dates(&self) -> Result<Vec<NaiveDate>, AppError> {
        self.local.snapshot_dates().await
    }
}
