use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Failed to build HTTP client: {0}")]
    HttpClient(#[from] reqwest::Error),

    // Fetch errors
    #[error("Network error while fetching {url}: {message}")]
    Network { url: String, message: String },

    #[error("Retries exhausted after {attempts} attempts, last status {status} (URL: {url})")]
    RetryExhausted {
        url: String,
        status: u16,
        attempts: u32,
    },

    #[error("Non-retryable HTTP status {status} (URL: {url})")]
    Client { url: String, status: u16 },

    // Payload errors
    #[error("Failed to decode API response: {message}")]
    Decode { message: String },

    #[error("Failed to load rows for season {season}: {message}")]
    Load { season: String, message: String },

    #[error("Season {season} aborted unexpectedly: {message}")]
    SeasonPanicked { season: String, message: String },

    // Run-level errors
    #[error("Invalid season range: end year {end} is before start year {start}")]
    Range { start: i32, end: i32 },

    #[error("Season start year {year} is outside the supported range {min}..={max}")]
    SeasonYear { year: i32, min: i32, max: i32 },

    #[error("Run interrupted before completion")]
    Interrupted,

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("TOML serialization error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    #[error("TOML deserialization error: {0}")]
    TomlDeserialize(#[from] toml::de::Error),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Date/time parsing error: {0}")]
    DateTimeParse(String),

    #[error("Log setup error: {0}")]
    LogSetup(String),
}

impl AppError {
    /// Create a configuration error with context
    pub fn config_error(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a date/time parsing error with context
    pub fn datetime_parse_error(msg: impl Into<String>) -> Self {
        Self::DateTimeParse(msg.into())
    }

    /// Create a log setup error with context
    pub fn log_setup_error(msg: impl Into<String>) -> Self {
        Self::LogSetup(msg.into())
    }

    /// Create a network error (transport failure or unreadable body)
    pub fn network(url: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Network {
            url: url.into(),
            message: message.into(),
        }
    }

    /// Create a retry-exhausted error carrying the last retryable status
    pub fn retry_exhausted(url: impl Into<String>, status: u16, attempts: u32) -> Self {
        Self::RetryExhausted {
            url: url.into(),
            status,
            attempts,
        }
    }

    /// Create a non-retryable client error
    pub fn client(url: impl Into<String>, status: u16) -> Self {
        Self::Client {
            url: url.into(),
            status,
        }
    }

    /// Create a decode error
    pub fn decode(message: impl Into<String>) -> Self {
        Self::Decode {
            message: message.into(),
        }
    }

    /// Create a row loading error for a season
    pub fn load(season: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Load {
            season: season.into(),
            message: message.into(),
        }
    }

    /// Create a season range error
    pub fn range(start: i32, end: i32) -> Self {
        Self::Range { start, end }
    }

    /// Create a season start year error
    pub fn season_year(year: i32, min: i32, max: i32) -> Self {
        Self::SeasonYear { year, min, max }
    }

    /// Create an error for a season pipeline that panicked or vanished
    pub fn season_panicked(season: impl Into<String>, message: impl Into<String>) -> Self {
        Self::SeasonPanicked {
            season: season.into(),
            message: message.into(),
        }
    }

    /// HTTP status carried by the error, if any
    pub fn status(&self) -> Option<u16> {
        match self {
            AppError::RetryExhausted { status, .. } | AppError::Client { status, .. } => {
                Some(*status)
            }
            _ => None,
        }
    }
}
