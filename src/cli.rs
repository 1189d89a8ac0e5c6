use std::path::PathBuf;

use chrono::NaiveDate;
use clap::{Args, Parser, Subcommand, ValueEnum};

use crate::model::Horizon;

#[derive(Parser, Debug)]
#[command(
    name = "focuspyramid",
    version,
    about = "Set and check off goals across five nested time horizons"
)]
pub struct Cli {
    #[arg(
        long,
        global = true,
        value_name = "PATH",
        help = "Data directory (defaults to $FOCUSPYRAMID_HOME or ~/.focuspyramid)"
    )]
    pub data_dir: Option<PathBuf>,
    #[arg(
        long,
        global = true,
        value_name = "YYYY-MM-DD",
        help = "Treat this date as today"
    )]
    pub today: Option<NaiveDate>,
    #[arg(long, global = true, value_name = "URL", help = "Remote backend base URL")]
    pub remote_url: Option<String>,
    #[arg(long, global = true, value_name = "ID", help = "Remote workspace identifier")]
    pub workspace: Option<String>,
    #[arg(long, global = true, value_name = "TOKEN", help = "Remote bearer token")]
    pub token: Option<String>,
    #[arg(short, long, global = true, help = "Log debug output to stderr")]
    pub verbose: bool,
    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    #[command(subcommand)]
    Goal(GoalCommand),
    #[command(subcommand)]
    Stats(StatsCommand),
    Streak(StreakArgs),
    Pyramid(PyramidArgs),
    #[command(subcommand)]
    Sync(SyncCommand),
}

#[derive(Subcommand, Debug)]
pub enum GoalCommand {
    Set(GoalSet),
    Rename(GoalRename),
    Toggle(GoalTarget),
    Area(GoalArea),
    Clear(GoalClear),
    Link(GoalLinkArgs),
    Unlink(GoalTarget),
    List(GoalList),
    Show(GoalTarget),
    Archive(GoalTarget),
    Restore(GoalRestore),
    Inactive,
}

#[derive(Subcommand, Debug)]
pub enum StatsCommand {
    Day(StatsDay),
    Week(StatsWeek),
    History(StatsHistory),
}

#[derive(Subcommand, Debug)]
pub enum SyncCommand {
    Push,
    Pull,
}

#[derive(Args, Debug)]
pub struct PeriodArg {
    #[arg(long, value_name = "YYYY-MM-DD", help = "Any day inside the period")]
    pub date: Option<NaiveDate>,
}

#[derive(Args, Debug)]
pub struct GoalSet {
    #[arg(value_enum)]
    pub horizon: HorizonArg,
    pub slot: u8,
    pub title: String,
    #[arg(long)]
    pub area: Option<String>,
    #[command(flatten)]
    pub period: PeriodArg,
}

#[derive(Args, Debug)]
pub struct GoalRename {
    #[arg(value_enum)]
    pub horizon: HorizonArg,
    pub id: String,
    pub title: String,
    #[command(flatten)]
    pub period: PeriodArg,
}

#[derive(Args, Debug)]
pub struct GoalTarget {
    #[arg(value_enum)]
    pub horizon: HorizonArg,
    pub id: String,
    #[command(flatten)]
    pub period: PeriodArg,
}

#[derive(Args, Debug)]
pub struct GoalArea {
    #[arg(value_enum)]
    pub horizon: HorizonArg,
    pub id: String,
    #[arg(value_name = "AREA", help = "Omit to clear the area")]
    pub area: Option<String>,
    #[command(flatten)]
    pub period: PeriodArg,
}

#[derive(Args, Debug)]
pub struct GoalClear {
    #[arg(value_enum)]
    pub horizon: HorizonArg,
    pub slot: u8,
    #[command(flatten)]
    pub period: PeriodArg,
}

#[derive(Args, Debug)]
pub struct GoalLinkArgs {
    #[arg(value_enum)]
    pub horizon: HorizonArg,
    pub id: String,
    pub parent_id: String,
    #[arg(
        long,
        value_enum,
        help = "Horizon of the parent goal (defaults to the next larger horizon)"
    )]
    pub parent_horizon: Option<HorizonArg>,
    #[command(flatten)]
    pub period: PeriodArg,
}

#[derive(Args, Debug)]
pub struct GoalList {
    #[arg(value_enum)]
    pub horizon: HorizonArg,
    #[command(flatten)]
    pub period: PeriodArg,
}

#[derive(Args, Debug)]
pub struct GoalRestore {
    pub id: String,
}

#[derive(Args, Debug)]
pub struct StatsDay {
    #[command(flatten)]
    pub period: PeriodArg,
}

#[derive(Args, Debug)]
pub struct StatsWeek {
    #[command(flatten)]
    pub period: PeriodArg,
}

#[derive(Args, Debug)]
pub struct StatsHistory {
    #[arg(long, help = "Show only the most recent N weeks")]
    pub weeks: Option<usize>,
}

#[derive(Args, Debug)]
pub struct StreakArgs {}

#[derive(Args, Debug)]
pub struct PyramidArgs {}

#[derive(ValueEnum, Clone, Copy, Debug)]
pub enum HorizonArg {
    Daily,
    Weekly,
    Monthly,
    Yearly,
    FiveYear,
}

impl From<HorizonArg> for Horizon {
    fn from(value: HorizonArg) -> Self {
        match value {
            HorizonArg::Daily => Horizon::Daily,
            HorizonArg::Weekly => Horizon::Weekly,
            HorizonArg::Monthly => Horizon::Monthly,
            HorizonArg::Yearly => Horizon::Yearly,
            HorizonArg::FiveYear => Horizon::FiveYear,
        }
    }
}
