//! Season tokens, leagues and date helpers

use std::fmt;
use std::ops::RangeInclusive;
use std::str::FromStr;

use chrono::{Datelike, Local, NaiveDate};

use crate::error::AppError;

/// How a season is labelled.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SeasonFormat {
    /// `2024`, for leagues playing inside one calendar year
    SingleYear,
    /// `2024-25`, for leagues spanning two calendar years
    CrossYear,
}

impl SeasonFormat {
    pub fn label(self, start_year: i32) -> String {
        match self {
            SeasonFormat::SingleYear => start_year.to_string(),
            SeasonFormat::CrossYear => {
                format!("{start_year}-{:02}", (start_year.rem_euclid(100) + 1) % 100)
            }
        }
    }
}

/// Label identifying one season. Ordered by start year.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SeasonToken {
    start_year: i32,
    label: String,
}

impl SeasonToken {
    pub fn new(start_year: i32, format: SeasonFormat) -> Self {
        Self {
            start_year,
            label: format.label(start_year),
        }
    }

    pub fn start_year(&self) -> i32 {
        self.start_year
    }

    pub fn label(&self) -> &str {
        &self.label
    }
}

impl fmt::Display for SeasonToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.label)
    }
}

/// Start years accepted for a season: the first NBA season through 9999.
pub const SEASON_YEARS: RangeInclusive<i32> = 1946..=9999;

/// Rejects a start year outside [`SEASON_YEARS`].
pub fn check_season_year(year: i32) -> Result<(), AppError> {
    if SEASON_YEARS.contains(&year) {
        Ok(())
    } else {
        Err(AppError::season_year(
            year,
            *SEASON_YEARS.start(),
            *SEASON_YEARS.end(),
        ))
    }
}

/// Expands `[start_year, end_year]` into ascending season tokens.
///
/// # Errors
/// * `AppError::SeasonYear` - either year outside [`SEASON_YEARS`]
/// * `AppError::Range` - `end_year < start_year`
///
/// # Example
/// ```
/// use bball_etl::data_fetcher::api::{SeasonFormat, season_range};
///
/// let seasons = season_range(1999, 2001, SeasonFormat::CrossYear).unwrap();
/// let labels: Vec<&str> = seasons.iter().map(|s| s.label()).collect();
/// assert_eq!(labels, ["1999-00", "2000-01", "2001-02"]);
/// ```
pub fn season_range(
    start_year: i32,
    end_year: i32,
    format: SeasonFormat,
) -> Result<Vec<SeasonToken>, AppError> {
    check_season_year(start_year)?;
    check_season_year(end_year)?;
    if end_year < start_year {
        return Err(AppError::range(start_year, end_year));
    }
    Ok((start_year..=end_year)
        .map(|year| SeasonToken::new(year, format))
        .collect())
}

/// Leagues served by the stats API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum League {
    Nba,
    Wnba,
}

impl League {
    pub const ALL: [League; 2] = [League::Nba, League::Wnba];

    pub fn league_id(self) -> &'static str {
        match self {
            League::Nba => "00",
            League::Wnba => "10",
        }
    }

    pub fn code(self) -> &'static str {
        match self {
            League::Nba => "nba",
            League::Wnba => "wnba",
        }
    }

    /// First season the league played
    pub fn first_season(self) -> i32 {
        match self {
            League::Nba => 1946,
            League::Wnba => 1997,
        }
    }

    pub fn season_format(self) -> SeasonFormat {
        match self {
            League::Nba => SeasonFormat::CrossYear,
            League::Wnba => SeasonFormat::SingleYear,
        }
    }

    pub fn played_in(self, season: &SeasonToken) -> bool {
        season.start_year() >= self.first_season()
    }

    /// `Season` query value for this league. A single-year league filtered to
    /// one game date uses that date's year.
    pub fn season_param(self, season: &SeasonToken, game_date: Option<NaiveDate>) -> String {
        match self {
            League::Nba => SeasonFormat::CrossYear.label(season.start_year()),
            League::Wnba => game_date
                .map(|date| date.year())
                .unwrap_or(season.start_year())
                .to_string(),
        }
    }

    /// Start year of the season a date falls in. NBA seasons roll over in October.
    pub fn season_start_year(self, date: NaiveDate) -> i32 {
        match self {
            League::Nba if date.month() >= 10 => date.year(),
            League::Nba => date.year() - 1,
            League::Wnba => date.year(),
        }
    }
}

impl fmt::Display for League {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

impl FromStr for League {
    type Err = AppError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "nba" => Ok(League::Nba),
            "wnba" => Ok(League::Wnba),
            other => Err(AppError::config_error(format!(
                "unknown league '{other}', expected nba or wnba"
            ))),
        }
    }
}

/// Season label format for a set of leagues: single-year only when every league uses it.
pub fn season_format_for(leagues: &[League]) -> SeasonFormat {
    if !leagues.is_empty()
        && leagues
            .iter()
            .all(|league| league.season_format() == SeasonFormat::SingleYear)
    {
        SeasonFormat::SingleYear
    } else {
        SeasonFormat::CrossYear
    }
}

/// Parses a `YYYY-MM-DD` date.
pub fn parse_date(date: &str) -> Result<NaiveDate, AppError> {
    NaiveDate::parse_from_str(date, "%Y-%m-%d")
        .map_err(|e| AppError::datetime_parse_error(format!("invalid date '{date}': {e}")))
}

/// The local calendar date before `today`.
pub fn previous_day(today: NaiveDate) -> Result<NaiveDate, AppError> {
    today
        .pred_opt()
        .ok_or_else(|| AppError::datetime_parse_error(format!("no day before {today}")))
}

/// Today's local date.
pub fn local_today() -> NaiveDate {
    Local::now().date_naive()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn date(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn test_season_range_count_and_order() {
        for (start, end) in [(1970, 2026), (2024, 2024), (1999, 2001)] {
            let seasons = season_range(start, end, SeasonFormat::CrossYear).unwrap();
            assert_eq!(seasons.len(), (end - start + 1) as usize);
            assert!(seasons.windows(2).all(|w| w[0] < w[1]));
            assert_eq!(seasons[0].start_year(), start);
            assert_eq!(seasons.last().unwrap().start_year(), end);
        }
    }

    #[test]
    fn test_season_range_rejects_inverted_range() {
        let result = season_range(2025, 2024, SeasonFormat::SingleYear);
        assert!(matches!(
            result,
            Err(AppError::Range {
                start: 2025,
                end: 2024
            })
        ));
    }

    #[test]
    fn test_season_range_rejects_years_out_of_bounds() {
        assert!(matches!(
            season_range(i32::MAX - 1, i32::MAX, SeasonFormat::CrossYear),
            Err(AppError::SeasonYear { year, .. }) if year == i32::MAX - 1
        ));
        assert!(matches!(
            season_range(-2_000_000_000, 2_000_000_000, SeasonFormat::SingleYear),
            Err(AppError::SeasonYear { .. })
        ));
        assert!(matches!(
            season_range(1945, 1950, SeasonFormat::CrossYear),
            Err(AppError::SeasonYear { year: 1945, .. })
        ));
        assert_eq!(season_range(1946, 1946, SeasonFormat::CrossYear).unwrap().len(), 1);
        assert_eq!(season_range(9999, 9999, SeasonFormat::CrossYear).unwrap()[0].label(), "9999-00");
    }

    #[test]
    fn test_cross_year_label_at_extremes() {
        assert_eq!(SeasonFormat::CrossYear.label(i32::MAX), "2147483647-48");
        assert_eq!(SeasonFormat::CrossYear.label(-1), "-1-00");
        assert_eq!(SeasonToken::new(i32::MAX, SeasonFormat::CrossYear).start_year(), i32::MAX);
    }

    #[test]
    fn test_season_labels() {
        assert_eq!(SeasonFormat::CrossYear.label(2024), "2024-25");
        assert_eq!(SeasonFormat::CrossYear.label(1999), "1999-00");
        assert_eq!(SeasonFormat::CrossYear.label(2009), "2009-10");
        assert_eq!(SeasonFormat::SingleYear.label(2024), "2024");
        assert_eq!(SeasonToken::new(1970, SeasonFormat::CrossYear).to_string(), "1970-71");
    }

    #[test]
    fn test_league_season_params() {
        let token = SeasonToken::new(2024, SeasonFormat::CrossYear);
        assert_eq!(League::Nba.season_param(&token, None), "2024-25");
        assert_eq!(League::Wnba.season_param(&token, None), "2024");
        assert_eq!(
            League::Wnba.season_param(&token, Some(date(2025, 7, 1))),
            "2025"
        );
    }

    #[test]
    fn test_league_played_in() {
        let token = SeasonToken::new(1985, SeasonFormat::CrossYear);
        assert!(League::Nba.played_in(&token));
        assert!(!League::Wnba.played_in(&token));
        assert!(League::Wnba.played_in(&SeasonToken::new(1997, SeasonFormat::SingleYear)));
    }

    #[test]
    fn test_season_start_year() {
        assert_eq!(League::Nba.season_start_year(date(2026, 10, 15)), 2026);
        assert_eq!(League::Nba.season_start_year(date(2027, 1, 15)), 2026);
        assert_eq!(League::Wnba.season_start_year(date(2027, 1, 15)), 2027);
    }

    #[test]
    fn test_league_from_str() {
        assert_eq!("NBA".parse::<League>().unwrap(), League::Nba);
        assert_eq!(" wnba ".parse::<League>().unwrap(), League::Wnba);
        assert!("nhl".parse::<League>().is_err());
    }

    #[test]
    fn test_season_format_for() {
        assert_eq!(season_format_for(&[League::Wnba]), SeasonFormat::SingleYear);
        assert_eq!(season_format_for(&League::ALL), SeasonFormat::CrossYear);
        assert_eq!(season_format_for(&[]), SeasonFormat::CrossYear);
    }

    #[test]
    fn test_parse_date_and_previous_day() {
        assert_eq!(parse_date("2026-03-01").unwrap(), date(2026, 3, 1));
        assert!(matches!(
            parse_date("03/01/2026"),
            Err(AppError::DateTimeParse(_))
        ));
        assert_eq!(previous_day(date(2024, 3, 1)).unwrap(), date(2024, 2, 29));
    }
}
