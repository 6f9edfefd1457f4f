//! Basketball stats ETL library
//!
//! Fetches league game logs from the stats API over a bounded pool of season
//! workers, with retry, backoff and a shared rate-limit cooldown, and hands
//! each decoded result set to a row loader.
//!
//! # Examples
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use bball_etl::data_fetcher::api::{
//!     FetchPlan, Fetcher, SeasonOrchestrator, TokioClock, create_http_client_with_timeout,
//! };
//! use bball_etl::data_fetcher::loader::SummaryLoader;
//! use bball_etl::logging::{RunLog, TracingRunLog};
//! use bball_etl::AppError;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), AppError> {
//!     let log: Arc<dyn RunLog> = Arc::new(TracingRunLog);
//!     let client = create_http_client_with_timeout(30)?;
//!     let fetcher = Fetcher::new(client, TokioClock, log.clone());
//!     let orchestrator = SeasonOrchestrator::new(
//!         fetcher,
//!         SummaryLoader::new(log.clone()),
//!         FetchPlan::new("stats.nba.com"),
//!         log,
//!     );
//!
//!     let report = orchestrator.run(2020, 2024).await?;
//!     println!("{}", report.summary_message());
//!     Ok(())
//! }
//! ```

pub mod app;
pub mod cli;
pub mod commands;
pub mod config;
pub mod constants;
pub mod data_fetcher;
pub mod error;
pub mod logging;
pub mod testing_utils;

// Re-export commonly used types for convenience
pub use config::Config;
pub use data_fetcher::api::{FetchPlan, Fetcher, RunReport, SeasonOrchestrator};
pub use data_fetcher::models::{ResultSet, TabularResponse};
pub use error::AppError;

/// Current version of the library
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");
