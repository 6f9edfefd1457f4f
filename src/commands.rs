use chrono::{Datelike, NaiveDate};

use crate::cli::{Args, RunMode};
use crate::config::Config;
use crate::constants::BUILD_START_YEAR;
use crate::data_fetcher::api::{League, check_season_year, parse_date, previous_day};
use crate::error::AppError;

/// Seasons a run covers, resolved from the command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunRequest {
    Range { start: i32, end: i32 },
    Season(i32),
    Daily(NaiveDate),
}

/// Validates command line argument combinations.
///
/// Returns an error if an option is used with a mode it does not apply to.
pub fn validate_args(args: &Args) -> Result<(), AppError> {
    let Some(mode) = args.mode else {
        return Ok(());
    };

    if args.season.is_some() && mode != RunMode::Season {
        return Err(AppError::config_error("--season can only be used with --mode season"));
    }
    if mode == RunMode::Season && args.season.is_none() {
        return Err(AppError::config_error("--mode season requires --season <YEAR>"));
    }
    if (args.start.is_some() || args.end.is_some()) && mode != RunMode::Build {
        return Err(AppError::config_error(
            "--start and --end can only be used with --mode build",
        ));
    }
    if args.date.is_some() && mode != RunMode::Daily {
        return Err(AppError::config_error("--date can only be used with --mode daily"));
    }

    for (flag, year) in [("--season", args.season), ("--start", args.start), ("--end", args.end)] {
        if let Some(year) = year {
            check_season_year(year).map_err(|e| AppError::config_error(format!("{flag}: {e}")))?;
        }
    }
    Ok(())
}

/// Resolves the seasons to fetch. `today` anchors the build range end and the
/// default daily date.
pub fn resolve_run(args: &Args, today: NaiveDate) -> Result<RunRequest, AppError> {
    match args.mode {
        Some(RunMode::Build) => Ok(RunRequest::Range {
            start: args.start.unwrap_or(BUILD_START_YEAR),
            end: args.end.unwrap_or(today.year()),
        }),
        Some(RunMode::Season) => {
            let year = args
                .season
                .ok_or_else(|| AppError::config_error("--mode season requires --season <YEAR>"))?;
            check_season_year(year).map_err(|e| AppError::config_error(format!("--season: {e}")))?;
            Ok(RunRequest::Season(year))
        }
        Some(RunMode::Daily) => {
            let date = match &args.date {
                Some(date) => parse_date(date)?,
                None => previous_day(today)?,
            };
            Ok(RunRequest::Daily(date))
        }
        None => Err(AppError::config_error("no run mode given")),
    }
}

/// Leagues a run fetches: the `--league` choice, or every league.
pub fn resolve_leagues(args: &Args) -> Vec<League> {
    match args.league {
        Some(league) => vec![league],
        None => League::ALL.to_vec(),
    }
}

/// Handles the --list-config command.
pub fn handle_list_config_command(config: &Config) {
    config.display();
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;

    fn parse(argv: &[&str]) -> Args {
        let mut full = vec!["bball_etl"];
        full.extend_from_slice(argv);
        Args::try_parse_from(full).unwrap()
    }

    fn today() -> NaiveDate {
        NaiveDate::from_ymd_opt(2026, 10, 16).unwrap()
    }

    #[test]
    fn test_build_defaults_to_full_history() {
        let args = parse(&["--mode", "build"]);
        validate_args(&args).unwrap();
        assert_eq!(
            resolve_run(&args, today()).unwrap(),
            RunRequest::Range {
                start: 1970,
                end: 2026
            }
        );
    }

    #[test]
    fn test_build_range_override() {
        let args = parse(&["--mode", "build", "--start", "2000", "--end", "2005"]);
        validate_args(&args).unwrap();
        assert_eq!(
            resolve_run(&args, today()).unwrap(),
            RunRequest::Range {
                start: 2000,
                end: 2005
            }
        );
    }

    #[test]
    fn test_daily_defaults_to_yesterday() {
        let args = parse(&["--mode", "daily"]);
        assert_eq!(
            resolve_run(&args, today()).unwrap(),
            RunRequest::Daily(NaiveDate::from_ymd_opt(2026, 10, 15).unwrap())
        );

        let args = parse(&["--mode", "daily", "--date", "2026-02-01"]);
        assert_eq!(
            resolve_run(&args, today()).unwrap(),
            RunRequest::Daily(NaiveDate::from_ymd_opt(2026, 2, 1).unwrap())
        );
    }

    #[test]
    fn test_daily_rejects_bad_date() {
        let args = parse(&["--mode", "daily", "--date", "yesterday"]);
        assert!(matches!(
            resolve_run(&args, today()),
            Err(AppError::DateTimeParse(_))
        ));
    }

    #[test]
    fn test_season_mode_needs_season() {
        let args = parse(&["--mode", "season"]);
        assert!(matches!(validate_args(&args), Err(AppError::Config(_))));

        let args = parse(&["--mode", "season", "--season", "1999"]);
        validate_args(&args).unwrap();
        assert_eq!(resolve_run(&args, today()).unwrap(), RunRequest::Season(1999));
    }

    #[test]
    fn test_options_rejected_outside_their_mode() {
        for argv in [
            &["--mode", "build", "--season", "2020"][..],
            &["--mode", "daily", "--start", "2020"][..],
            &["--mode", "season", "--season", "2020", "--date", "2020-01-01"][..],
        ] {
            assert!(validate_args(&parse(argv)).is_err(), "{argv:?}");
        }
    }

    #[test]
    fn test_years_outside_supported_range_are_rejected() {
        for argv in [
            &["--mode", "season", "--season", "2147483647"][..],
            &["--mode", "season", "--season", "1945"][..],
            &["--mode", "build", "--start=-2000000000", "--end=2000000000"][..],
            &["--mode", "build", "--end", "10000"][..],
        ] {
            assert!(
                matches!(validate_args(&parse(argv)), Err(AppError::Config(_))),
                "{argv:?}"
            );
        }

        let args = parse(&["--mode", "season", "--season", "2147483647"]);
        assert!(matches!(resolve_run(&args, today()), Err(AppError::Config(_))));

        let args = parse(&["--mode", "build", "--start", "1946", "--end", "9999"]);
        validate_args(&args).unwrap();
    }

    #[test]
    fn test_resolve_leagues() {
        assert_eq!(resolve_leagues(&parse(&["-m", "daily"])), League::ALL.to_vec());
        assert_eq!(
            resolve_leagues(&parse(&["-m", "daily", "--league", "nba"])),
            vec![League::Nba]
        );
    }
}
