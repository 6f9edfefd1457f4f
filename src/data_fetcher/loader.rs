//! Row loading seam between decoded result sets and the store

use std::future::Future;
use std::sync::Arc;

use super::api::SeasonToken;
use super::models::ResultSet;
use crate::error::AppError;
use crate::logging::RunLog;

/// Persists decoded rows. The pipeline only counts the returned number.
pub trait RowLoader: Send + Sync + 'static {
    /// Loads one result set fetched by the request labelled `source`.
    ///
    /// Returns the number of rows affected.
    fn load(
        &self,
        season: &SeasonToken,
        source: &str,
        set: &ResultSet,
    ) -> impl Future<Output = Result<u64, AppError>> + Send;
}

/// Loader that reports each result set to the run log and counts its rows.
#[derive(Clone)]
pub struct SummaryLoader {
    log: Arc<dyn RunLog>,
}

impl SummaryLoader {
    pub fn new(log: Arc<dyn RunLog>) -> Self {
        Self { log }
    }
}

/// First and last `GAME_DATE` in a set, when the column is present.
fn game_date_span(set: &ResultSet) -> Option<(String, String)> {
    let column = set.column("GAME_DATE")?;
    let mut dates = set
        .rows
        .iter()
        .filter_map(|row| row.get(column)?.as_str().map(str::to_string));
    let first = dates.next()?;
    let (min, max) = dates.fold((first.clone(), first), |(min, max), date| {
        (min.min(date.clone()), max.max(date))
    });
    Some((min, max))
}

impl RowLoader for SummaryLoader {
    fn load(
        &self,
        season: &SeasonToken,
        source: &str,
        set: &ResultSet,
    ) -> impl Future<Output = Result<u64, AppError>> + Send {
        let rows = set.row_count() as u64;
        let line = match game_date_span(set) {
            Some((from, to)) => format!(
                "{season} {source}: {rows} rows in {} ({from} to {to})",
                set.name
            ),
            None => format!("{season} {source}: {rows} rows in {}", set.name),
        };
        self.log.write_line(&line);
        async move { Ok(rows) }
    }
}
