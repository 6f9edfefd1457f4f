pub mod api;
pub mod loader;
pub mod models;

pub use api::{FetchPlan, Fetcher, RunReport, SeasonOrchestrator};
pub use loader::{RowLoader, SummaryLoader};
pub use models::{ResultSet, TabularResponse, decode};
