use clap::builder::styling::{AnsiColor, Effects, Styles};
use clap::{Parser, ValueEnum};

use crate::data_fetcher::api::League;

fn get_styles() -> Styles {
    Styles::styled()
        .header(AnsiColor::Cyan.on_default().effects(Effects::BOLD))
        .usage(AnsiColor::Cyan.on_default().effects(Effects::BOLD))
        .literal(AnsiColor::Green.on_default())
        .placeholder(AnsiColor::Yellow.on_default())
        .error(AnsiColor::Red.on_default().effects(Effects::BOLD))
        .valid(AnsiColor::Green.on_default())
        .invalid(AnsiColor::Red.on_default())
}

/// Which seasons a run loads.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum RunMode {
    /// Every season from 1970 through the current year
    Build,
    /// Yesterday's games (or --date) for the current season
    Daily,
    /// One season, given with --season
    Season,
}

impl RunMode {
    pub fn log_file_name(self) -> &'static str {
        match self {
            RunMode::Build => "build_etl.log",
            RunMode::Daily => "daily_etl.log",
            RunMode::Season => "season_etl.log",
        }
    }
}

/// Basketball stats ETL
///
/// Loads league game logs from the stats API, one season per worker.
///
/// Modes:
/// - build: full history, 1970 through the current year (override with --start/--end)
/// - daily: games from yesterday, or from --date, for both leagues
/// - season: a single season, optionally limited to one league
///
/// Exits with a non-zero status when any season fails.
#[derive(Parser, Debug)]
#[command(about, long_about = None)]
#[command(styles = get_styles())]
pub struct Args {
    /// Run mode
    #[arg(
        long,
        short = 'm',
        value_enum,
        required_unless_present = "list_config"
    )]
    pub mode: Option<RunMode>,

    /// Start year of the season to load, e.g. 2024 for 2024-25. Season mode only.
    #[arg(long, short = 's', value_name = "YEAR", help_heading = "Season Options")]
    pub season: Option<i32>,

    /// Limit the run to one league (nba or wnba). Defaults to both.
    #[arg(long, value_name = "LEAGUE", help_heading = "Season Options")]
    pub league: Option<League>,

    /// First season of a build run
    #[arg(long, value_name = "YEAR", help_heading = "Season Options")]
    pub start: Option<i32>,

    /// Last season of a build run
    #[arg(long, value_name = "YEAR", help_heading = "Season Options")]
    pub end: Option<i32>,

    /// Game date for a daily run in YYYY-MM-DD format. Defaults to yesterday.
    #[arg(long, short = 'd', help_heading = "Season Options")]
    pub date: Option<String>,

    /// Specify a custom log file path. If not provided, logs will be written to the default location.
    #[arg(long = "log-file", help_heading = "Logging")]
    pub log_file: Option<String>,

    /// Only log to the log file, not to stdout
    #[arg(long, short = 'q', help_heading = "Logging")]
    pub quiet: bool,

    /// List current configuration settings
    #[arg(long = "list-config", short = 'l', help_heading = "Configuration")]
    pub list_config: bool,
}
