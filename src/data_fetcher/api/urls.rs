//! URL and request building for API endpoints

use chrono::NaiveDate;

use super::season_utils::{League, SeasonToken};
use crate::constants::endpoint::{DEFAULT_HEADERS, LEAGUE_GAME_LOG_PATH};

/// Scheme used when rendering an [`EndpointRequest`] URL.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Scheme {
    #[default]
    Https,
    /// Plain http, used for local mock servers
    Http,
}

impl Scheme {
    pub fn as_str(self) -> &'static str {
        match self {
            Scheme::Https => "https",
            Scheme::Http => "http",
        }
    }
}

/// A GET request against one endpoint: host, path, ordered query
/// parameters and headers.
///
/// Built once through the consuming builder methods and then only read.
/// Parameter and header order is kept exactly as inserted, duplicates included.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EndpointRequest {
    scheme: Scheme,
    host: String,
    path: String,
    params: Vec<(String, String)>,
    headers: Vec<(String, String)>,
}

impl EndpointRequest {
    pub fn new(host: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            scheme: Scheme::Https,
            host: host.into(),
            path: path.into(),
            params: Vec::new(),
            headers: Vec::new(),
        }
    }

    pub fn with_scheme(mut self, scheme: Scheme) -> Self {
        self.scheme = scheme;
        self
    }

    /// Appends a query parameter. The value is used verbatim, so reserved
    /// characters must already be escaped.
    pub fn param(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.params.push((key.into(), value.into()));
        self
    }

    /// Appends a header. Repeating a key adds another header line.
    pub fn header(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.push((key.into(), value.into()));
        self
    }

    pub fn headers(&self) -> &[(String, String)] {
        &self.headers
    }

    /// Renders the full URL. Deterministic for a given request.
    pub fn url(&self) -> String {
        render_url(self.scheme, &self.host, &self.path, &self.params)
    }
}

/// Builds `https://{host}{path}?{k1}={v1}&{k2}={v2}...` in parameter order.
///
/// # Example
/// ```
/// use bball_etl::data_fetcher::api::build_url;
///
/// let params = vec![
///     ("LeagueID".to_string(), "00".to_string()),
///     ("Season".to_string(), "2024-25".to_string()),
/// ];
/// let url = build_url("stats.nba.com", "/stats/leaguegamelog", &params);
/// assert_eq!(url, "https://stats.nba.com/stats/leaguegamelog?LeagueID=00&Season=2024-25");
/// ```
pub fn build_url(host: &str, path: &str, params: &[(String, String)]) -> String {
    render_url(Scheme::Https, host, path, params)
}

fn render_url(scheme: Scheme, host: &str, path: &str, params: &[(String, String)]) -> String {
    let query = params
        .iter()
        .map(|(key, value)| format!("{key}={value}"))
        .collect::<Vec<_>>()
        .join("&");
    format!("{}://{host}{path}?{query}", scheme.as_str())
}

/// Player or team game logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LogScope {
    Player,
    Team,
}

impl LogScope {
    pub const ALL: [LogScope; 2] = [LogScope::Player, LogScope::Team];

    pub fn param(self) -> &'static str {
        match self {
            LogScope::Player => "P",
            LogScope::Team => "T",
        }
    }
}

/// Part of the season a game log covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SeasonType {
    RegularSeason,
    Playoffs,
}

impl SeasonType {
    pub const ALL: [SeasonType; 2] = [SeasonType::RegularSeason, SeasonType::Playoffs];

    /// Query value, pre-escaped for the URL
    pub fn param(self) -> &'static str {
        match self {
            SeasonType::RegularSeason => "Regular+Season",
            SeasonType::Playoffs => "Playoffs",
        }
    }
}

/// One league game log query.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GameLogQuery {
    pub league: League,
    pub scope: LogScope,
    pub season_type: SeasonType,
    pub season: SeasonToken,
    /// Restricts the log to a single game date (nightly runs)
    pub game_date: Option<NaiveDate>,
}

impl GameLogQuery {
    /// Short label used in logs and by row loaders, e.g. `nba-P-Regular+Season`.
    pub fn label(&self) -> String {
        format!(
            "{}-{}-{}",
            self.league.code(),
            self.scope.param(),
            self.season_type.param()
        )
    }
}

/// Formats a date the way the stats API expects it, pre-escaped (`10%2F15%2F2026`).
pub fn format_api_date(date: NaiveDate) -> String {
    date.format("%m%%2F%d%%2F%Y").to_string()
}

/// Builds the league game log request for a query, with the standard stats headers.
pub fn build_game_log_request(host: &str, scheme: Scheme, query: &GameLogQuery) -> EndpointRequest {
    let date = query.game_date.map(format_api_date).unwrap_or_default();
    let season = query.league.season_param(&query.season, query.game_date);

    let request = EndpointRequest::new(host, LEAGUE_GAME_LOG_PATH)
        .with_scheme(scheme)
        .param("Counter", "0")
        .param("DateFrom", date.clone())
        .param("DateTo", date)
        .param("Direction", "DESC")
        .param("LeagueID", query.league.league_id())
        .param("PlayerOrTeam", query.scope.param())
        .param("Season", season)
        .param("SeasonType", query.season_type.param())
        .param("Sorter", "DATE");

    DEFAULT_HEADERS
        .iter()
        .fold(request, |request, (key, value)| request.header(*key, *value))
}
