pub mod fetch_utils;
pub mod http_client;
pub mod orchestrator;
pub mod rate_limit;
pub mod season_utils;
pub mod urls;

// Re-export URL and request utilities
pub use urls::*;
// Re-export season and league utilities
pub use season_utils::*;
// Re-export HTTP transport utilities
pub use http_client::{
    Transport, TransportError, TransportResponse, create_http_client_with_timeout,
};
// Re-export the resilient fetcher
pub use fetch_utils::{Clock, Fetcher, RetryPolicy, StatusClass, TokioClock, classify};
pub use orchestrator::{FetchOutcome, FetchPlan, RunReport, SeasonOrchestrator};
pub use rate_limit::Cooldown;
