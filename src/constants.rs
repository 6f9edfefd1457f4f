//! Application-wide constants and configuration values
//!
//! This module centralizes the magic numbers of the fetch pipeline so the
//! retry, pool and endpoint settings live in one place.

/// Default timeout for HTTP requests in seconds
pub const DEFAULT_HTTP_TIMEOUT_SECONDS: u64 = 30;

/// Maximum number of idle connections per host in the HTTP client pool
pub const HTTP_POOL_MAX_IDLE_PER_HOST: usize = 40;

/// Default upstream statistics host
pub const DEFAULT_API_HOST: &str = "stats.nba.com";

/// Default number of seasons fetched concurrently
pub const DEFAULT_MAX_CONCURRENT_SEASONS: usize = 8;

/// First season loaded by a full build
pub const BUILD_START_YEAR: i32 = 1970;

/// Retry configuration
pub mod retry {
    /// Number of retries after the first attempt (4 attempts total)
    pub const MAX_RETRIES: u32 = 3;

    /// Base delay for exponential backoff (seconds); attempt i sleeps base << i
    pub const BASE_DELAY_SECONDS: u64 = 5;

    /// How long a 429 holds back new attempts across all workers (seconds)
    pub const RATE_LIMIT_COOLDOWN_SECONDS: u64 = 5;

    /// Highest accepted `max_retries`
    pub const MAX_RETRIES_LIMIT: u32 = 10;

    /// Highest accepted backoff base and cooldown (seconds)
    pub const MAX_DELAY_SECONDS: u64 = 3600;
}

/// Game log endpoint settings
pub mod endpoint {
    /// Path of the league game log endpoint
    pub const LEAGUE_GAME_LOG_PATH: &str = "/stats/leaguegamelog";

    /// Headers the stats API expects from a browser-like client
    pub const DEFAULT_HEADERS: &[(&str, &str)] = &[
        ("Accept", "application/json, text/plain, */*"),
        ("Accept-Language", "en-US,en;q=0.9"),
        ("Connection", "keep-alive"),
        ("Origin", "https://www.nba.com"),
        ("Referer", "https://www.nba.com/"),
        (
            "User-Agent",
            "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/126.0 Safari/537.36",
        ),
        ("x-nba-stats-origin", "stats"),
        ("x-nba-stats-token", "true"),
    ];
}

/// Environment variable names
pub mod env_vars {
    /// Environment variable for API host override
    pub const API_HOST: &str = "BBALL_API_HOST";

    /// Environment variable for log file path override
    pub const LOG_FILE: &str = "BBALL_LOG_FILE";

    /// Environment variable for HTTP timeout override (seconds)
    pub const HTTP_TIMEOUT: &str = "BBALL_HTTP_TIMEOUT";

    /// Environment variable for worker pool size override
    pub const MAX_WORKERS: &str = "BBALL_MAX_WORKERS";
}
