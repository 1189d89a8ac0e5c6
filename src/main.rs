mod app;
mod cli;
mod dates;
mod db;
mod entities;
mod error;
mod linker;
mod model;
mod remote;
mod repo;
mod stats;
mod store;
mod streak;
mod util;

use std::path::PathBuf;
use std::sync::Arc;

use chrono::Days;
use clap::Parser;
use tracing_subscriber::EnvFilter;

use crate::app::{App, StoreNotice};
use crate::cli::{
    Cli, Command, GoalArea, GoalClear, GoalCommand, GoalLinkArgs, GoalList, GoalRename,
    GoalRestore, GoalSet, GoalTarget, StatsCommand, StatsDay, StatsHistory, StatsWeek,
    SyncCommand,
};
use crate::dates::{today_utc, week_start};
use crate::error::AppError;
use crate::model::{GoalScope, Horizon, Slot};
use crate::remote::{RemoteClient, RemoteConfig, RemoteRepository};
use crate::repo::{GoalRepository, LocalRepository};
use crate::stats::build_week_stats;
use crate::store::{KeyValueStore, SqliteStore};
use crate::util::{
    format_day_stats, format_goal_detail, format_goal_list, format_inactive,
    format_pyramid_level, format_streaks, format_week_stats, scope_heading,
};

const DATA_DIR_ENV: &str = "FOCUSPYRAMID_HOME";
const REMOTE_URL_ENV: &str = "FOCUSPYRAMID_REMOTE_URL";
const WORKSPACE_ENV: &str = "FOCUSPYRAMID_WORKSPACE";
const TOKEN_ENV: &str = "FOCUSPYRAMID_TOKEN";

struct RemoteSettings {
    config: RemoteConfig,
    workspace: String,
}

#[tokio::main]
async fn main() {
    if let Err(err) = run().await {
        eprintln!("Error: {err}");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), AppError> {
    let Cli {
        data_dir,
        today,
        remote_url,
        workspace,
        token,
        verbose,
        command,
    } = Cli::parse();
    init_tracing(verbose);

    let today = today.unwrap_or_else(today_utc);
    let data_dir = resolve_data_dir(data_dir)?;
    let db_path = db::resolve_db_path(&data_dir);
    db::ensure_parent_dir(&db_path)?;
    let mut lock = db::open_lock(&db_path)?;
    let _guard = lock.write()?;

    let db = db::connect(&db_path).await?;
    db::ensure_schema(&db).await?;
    let store: Arc<dyn KeyValueStore> = Arc::new(SqliteStore::new(db));
    let local = LocalRepository::new(store, today);
    let remote = resolve_remote(remote_url, workspace, token)?;

    match command {
        Command::Sync(command) => {
            let Some(settings) = remote else {
                return Err(AppError::InvalidInput(format!(
                    "sync requires --remote-url and --workspace (or {REMOTE_URL_ENV} and {WORKSPACE_ENV})"
                )));
            };
            let client = RemoteClient::new(settings.config)?;
            let repo = RemoteRepository::new(local, client, settings.workspace.clone());
            handle_sync(&repo, &settings.workspace, command).await
        }
        command => {
            let repo: Box<dyn GoalRepository> = match remote {
                Some(settings) => {
                    let client = RemoteClient::new(settings.config)?;
                    Box::new(RemoteRepository::new(local, client, settings.workspace))
                }
                None => Box::new(local),
            };
            let app = App::new(repo, today);
            match command {
                Command::Goal(command) => handle_goal(&app, command).await,
                Command::Stats(command) => handle_stats(&app, command).await,
                Command::Streak(_) => handle_streak(&app).await,
                Command::Pyramid(_) => handle_pyramid(&app).await,
                Command::Sync(_) => Ok(()),
            }
        }
    }
}

fn init_tracing(verbose: bool) {
    let fallback = if verbose {
        "focuspyramid=debug"
    } else {
        "focuspyramid=warn"
    };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

async fn handle_goal(app: &App, command: GoalCommand) -> Result<(), AppError> {
    match command {
        GoalCommand::Set(args) => handle_goal_set(app, args).await,
        GoalCommand::Rename(args) => handle_goal_rename(app, args).await,
        GoalCommand::Toggle(args) => handle_goal_toggle(app, args).await,
        GoalCommand::Area(args) => handle_goal_area(app, args).await,
        GoalCommand::Clear(args) => handle_goal_clear(app, args).await,
        GoalCommand::Link(args) => handle_goal_link(app, args).await,
        GoalCommand::Unlink(args) => handle_goal_unlink(app, args).await,
        GoalCommand::List(args) => handle_goal_list(app, args).await,
        GoalCommand::Show(args) => handle_goal_show(app, args).await,
        GoalCommand::Archive(args) => handle_goal_archive(app, args).await,
        GoalCommand::Restore(args) => handle_goal_restore(app, args).await,
        GoalCommand::Inactive => handle_goal_inactive(app).await,
    }
}

async fn handle_goal_set(app: &App, args: GoalSet) -> Result<(), AppError> {
    let slot = Slot::new(args.slot)?;
    let scope = app.scope(args.horizon.into(), args.period.date);
    let (goal, notice) = app.upsert_goal(&scope, slot, &args.title, args.area).await?;
    println!("Created goal ID: {} in slot {} of {}", goal.id, slot, scope);
    print_notice(notice);
    Ok(())
}

async fn handle_goal_rename(app: &App, args: GoalRename) -> Result<(), AppError> {
    let scope = app.scope(args.horizon.into(), args.period.date);
    let (goal, notice) = app.rename_goal(&scope, &args.id, &args.title).await?;
    match goal {
        Some(goal) => println!("Renamed goal ID: {} to {}", goal.id, goal.title),
        None => print_missing(&args.id, &scope),
    }
    print_notice(notice);
    Ok(())
}

async fn handle_goal_toggle(app: &App, args: GoalTarget) -> Result<(), AppError> {
    let scope = app.scope(args.horizon.into(), args.period.date);
    let (goal, notice) = app.toggle_done(&scope, &args.id).await?;
    match goal {
        Some(goal) if goal.done => println!("Goal ID: {} marked done.", goal.id),
        Some(goal) => println!("Goal ID: {} marked todo.", goal.id),
        None => print_missing(&args.id, &scope),
    }
    print_notice(notice);
    Ok(())
}

async fn handle_goal_area(app: &App, args: GoalArea) -> Result<(), AppError> {
    let scope = app.scope(args.horizon.into(), args.period.date);
    let (goal, notice) = app.set_area(&scope, &args.id, args.area).await?;
    match goal {
        Some(goal) => match goal.area.as_deref() {
            Some(area) => println!("Goal ID: {} area set to {}.", goal.id, area),
            None => println!("Goal ID: {} area cleared.", goal.id),
        },
        None => print_missing(&args.id, &scope),
    }
    print_notice(notice);
    Ok(())
}

async fn handle_goal_clear(app: &App, args: GoalClear) -> Result<(), AppError> {
    let slot = Slot::new(args.slot)?;
    let scope = app.scope(args.horizon.into(), args.period.date);
    let (goal, notice) = app.clear_slot(&scope, slot).await?;
    match goal {
        Some(goal) => println!("Slot {} of {} cleared (goal ID: {}).", slot, scope, goal.id),
        None => println!("Slot {} of {} is already empty.", slot, scope),
    }
    print_notice(notice);
    Ok(())
}

async fn handle_goal_link(app: &App, args: GoalLinkArgs) -> Result<(), AppError> {
    let horizon: Horizon = args.horizon.into();
    let parent_horizon = match args.parent_horizon {
        Some(parent) => parent.into(),
        None => horizon.parent().ok_or_else(|| {
            AppError::InvalidInput(format!("{horizon} goals have no parent horizon"))
        })?,
    };
    let scope = app.scope(horizon, args.period.date);
    let (goal, notice) = app
        .link_to_parent(&scope, &args.id, parent_horizon, &args.parent_id)
        .await?;
    match goal {
        Some(goal) => println!(
            "Linked goal ID: {} to {} goal ID: {}",
            goal.id, parent_horizon, args.parent_id
        ),
        None => print_missing(&args.id, &scope),
    }
    print_notice(notice);
    Ok(())
}

async fn handle_goal_unlink(app: &App, args: GoalTarget) -> Result<(), AppError> {
    let scope = app.scope(args.horizon.into(), args.period.date);
    let (goal, notice) = app.unlink(&scope, &args.id).await?;
    match goal {
        Some(goal) => println!("Goal ID: {} unlinked.", goal.id),
        None => print_missing(&args.id, &scope),
    }
    print_notice(notice);
    Ok(())
}

async fn handle_goal_list(app: &App, args: GoalList) -> Result<(), AppError> {
    let scope = app.scope(args.horizon.into(), args.period.date);
    let goals = app.list_goals(&scope).await?;
    let parents = match scope.parent(app.today()) {
        Some(parent_scope) => app.list_goals(&parent_scope).await?,
        None => Vec::new(),
    };
    let heading = scope_heading(&scope, app.today());
    println!("{}", format_goal_list(&heading, &goals, &parents));
    Ok(())
}

async fn handle_goal_show(app: &App, args: GoalTarget) -> Result<(), AppError> {
    let scope = app.scope(args.horizon.into(), args.period.date);
    let Some(goal) = app.get_goal(&scope, &args.id).await? else {
        return Err(AppError::NotFound(format!("goal id {} in {}", args.id, scope)));
    };
    let parent = app.resolve_parent(&scope, &goal).await?;
    println!("{}", format_goal_detail(&goal, parent.as_ref()));
    Ok(())
}

async fn handle_goal_archive(app: &App, args: GoalTarget) -> Result<(), AppError> {
    let scope = app.scope(args.horizon.into(), args.period.date);
    let (archived, notice) = app.archive_goal(&scope, &args.id).await?;
    match archived {
        Some(entry) => println!("Goal ID: {} archived.", entry.goal.id),
        None => print_missing(&args.id, &scope),
    }
    print_notice(notice);
    Ok(())
}

async fn handle_goal_restore(app: &App, args: GoalRestore) -> Result<(), AppError> {
    let (goal, notice) = app.restore_goal(&args.id).await?;
    match goal {
        Some(goal) => {
            let scope = GoalScope::for_date(goal.horizon, app.today());
            println!(
                "Goal ID: {} restored into slot {} of {}.",
                goal.id, goal.slot, scope
            );
        }
        None => println!("Goal ID: {} is not in the inactive list.", args.id),
    }
    print_notice(notice);
    Ok(())
}

async fn handle_goal_inactive(app: &App) -> Result<(), AppError> {
    let inactive = app.list_inactive().await?;
    println!("{}", format_inactive(&inactive));
    Ok(())
}

async fn handle_stats(app: &App, command: StatsCommand) -> Result<(), AppError> {
    match command {
        StatsCommand::Day(args) => handle_stats_day(app, args).await,
        StatsCommand::Week(args) => handle_stats_week(app, args).await,
        StatsCommand::History(args) => handle_stats_history(app, args).await,
    }
}

async fn handle_stats_day(app: &App, args: StatsDay) -> Result<(), AppError> {
    let date = args.period.date.unwrap_or(app.today());
    let day = app.day_stats(date).await?;
    println!("{}", format_day_stats(&day));
    Ok(())
}

async fn handle_stats_week(app: &App, args: StatsWeek) -> Result<(), AppError> {
    let start = week_start(args.period.date.unwrap_or(app.today()));
    let mut days = Vec::with_capacity(7);
    for offset in 0..7 {
        let date = start + Days::new(offset);
        if date > app.today() {
            break;
        }
        days.push(app.day_stats(date).await?);
    }
    println!("{}", format_week_stats(&build_week_stats(start, days)));
    Ok(())
}

async fn handle_stats_history(app: &App, args: StatsHistory) -> Result<(), AppError> {
    let weeks = app.week_history().await?;
    let skip = match args.weeks {
        Some(limit) => weeks.len().saturating_sub(limit),
        None => 0,
    };
    let blocks: Vec<String> = weeks.iter().skip(skip).map(format_week_stats).collect();
    println!("{}", blocks.join("\n\n"));
    Ok(())
}

async fn handle_streak(app: &App) -> Result<(), AppError> {
    let report = app.streaks().await?;
    println!("{}", format_streaks(report.daily, report.weekly));
    Ok(())
}

async fn handle_pyramid(app: &App) -> Result<(), AppError> {
    let levels = app.pyramid().await?;
    let blocks: Vec<String> = levels
        .iter()
        .map(|level| {
            let heading = scope_heading(&level.scope, app.today());
            let children = level
                .scope
                .horizon()
                .child()
                .and_then(|child| levels.iter().find(|other| other.scope.horizon() == child))
                .map(|other| other.goals.as_slice())
                .unwrap_or(&[]);
            format_pyramid_level(&heading, &level.goals, children)
        })
        .collect();
    println!("{}", blocks.join("\n\n"));
    Ok(())
}

async fn handle_sync(
    repo: &RemoteRepository,
    workspace: &str,
    command: SyncCommand,
) -> Result<(), AppError> {
    match command {
        SyncCommand::Push => {
            let total = repo.push().await?;
            println!("Pushed {total} goals to workspace {workspace}.");
        }
        SyncCommand::Pull => {
            let total = repo.pull().await?;
            println!("Pulled {total} goals from workspace {workspace}.");
        }
    }
    Ok(())
}

fn print_missing(id: &str, scope: &GoalScope) {
    println!("Goal ID: {id} not found in {scope}.");
}

fn print_notice(notice: Option<StoreNotice>) {
    if let Some(notice) = notice {
        eprintln!("Warning: {notice}");
    }
}

fn resolve_data_dir(flag: Option<PathBuf>) -> Result<PathBuf, AppError> {
    if let Some(path) = flag {
        if path.as_os_str().is_empty() {
            return Err(AppError::InvalidInput("--data-dir is empty".to_string()));
        }
        return Ok(path);
    }
    if let Some(path) = env_value(DATA_DIR_ENV) {
        return Ok(PathBuf::from(path));
    }
    if let Some(home) = env_value("HOME") {
        return Ok(PathBuf::from(home).join(".focuspyramid"));
    }
    Err(AppError::InvalidInput(format!(
        "unable to resolve data directory; pass --data-dir or set {DATA_DIR_ENV}"
    )))
}

fn resolve_remote(
    url: Option<String>,
    workspace: Option<String>,
    token: Option<String>,
) -> Result<Option<RemoteSettings>, AppError> {
    let url = non_empty(url).or_else(|| env_value(REMOTE_URL_ENV));
    let workspace = non_empty(workspace).or_else(|| env_value(WORKSPACE_ENV));
    let token = non_empty(token).or_else(|| env_value(TOKEN_ENV));
    match (url, workspace) {
        (None, None) => Ok(None),
        (Some(url), Some(workspace)) => Ok(Some(RemoteSettings {
            config: RemoteConfig::new(&url, token)?,
            workspace,
        })),
        (Some(_), None) => Err(AppError::InvalidInput(
            "--workspace is required when a remote url is set".to_string(),
        )),
        (None, Some(_)) => Err(AppError::InvalidInput(
            "--remote-url is required when a workspace is set".to_string(),
        )),
    }
}

fn env_value(name: &str) -> Option<String> {
    non_empty(std::env::var(name).ok())
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}
