//! Season orchestration: a bounded worker pool running one
//! fetch-decode-load pipeline per season, drained by a single aggregator.

use std::any::Any;
use std::collections::HashSet;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;

use chrono::{Datelike, NaiveDate};
use futures::FutureExt;
use futures::future::join_all;
use tokio::sync::{Mutex, mpsc};
use tracing::{debug, error, info, instrument, warn};

use super::fetch_utils::{Clock, Fetcher};
use super::http_client::Transport;
use super::season_utils::{League, SeasonToken, season_format_for, season_range};
use super::urls::{EndpointRequest, GameLogQuery, LogScope, Scheme, SeasonType, build_game_log_request};
use crate::config::Config;
use crate::constants;
use crate::data_fetcher::loader::RowLoader;
use crate::data_fetcher::models::decode;
use crate::error::AppError;
use crate::logging::RunLog;

/// What each season worker fetches, and how many workers run at once.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchPlan {
    pub host: String,
    pub scheme: Scheme,
    pub leagues: Vec<League>,
    pub season_types: Vec<SeasonType>,
    pub scopes: Vec<LogScope>,
    pub max_workers: usize,
}

impl FetchPlan {
    /// Every league, season type and scope against `host` over https.
    pub fn new(host: impl Into<String>) -> Self {
        Self {
            host: host.into(),
            scheme: Scheme::Https,
            leagues: League::ALL.to_vec(),
            season_types: SeasonType::ALL.to_vec(),
            scopes: LogScope::ALL.to_vec(),
            max_workers: constants::DEFAULT_MAX_CONCURRENT_SEASONS,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        let scheme = if config.plain_http {
            Scheme::Http
        } else {
            Scheme::Https
        };
        Self::new(config.api_host.clone())
            .with_scheme(scheme)
            .with_max_workers(config.max_concurrent_seasons)
    }

    pub fn with_scheme(mut self, scheme: Scheme) -> Self {
        self.scheme = scheme;
        self
    }

    pub fn with_leagues(mut self, leagues: Vec<League>) -> Self {
        self.leagues = leagues;
        self
    }

    pub fn with_season_types(mut self, season_types: Vec<SeasonType>) -> Self {
        self.season_types = season_types;
        self
    }

    pub fn with_scopes(mut self, scopes: Vec<LogScope>) -> Self {
        self.scopes = scopes;
        self
    }

    pub fn with_max_workers(mut self, max_workers: usize) -> Self {
        self.max_workers = max_workers;
        self
    }

    /// Queries one season expands into, skipping leagues not yet founded.
    pub fn queries(&self, season: &SeasonToken, game_date: Option<NaiveDate>) -> Vec<GameLogQuery> {
        let mut queries = Vec::new();
        for league in self.leagues.iter().filter(|league| league.played_in(season)) {
            for season_type in &self.season_types {
                for scope in &self.scopes {
                    queries.push(GameLogQuery {
                        league: *league,
                        scope: *scope,
                        season_type: *season_type,
                        season: season.clone(),
                        game_date,
                    });
                }
            }
        }
        queries
    }

    /// Whether any configured league played in `season`.
    pub fn covers(&self, season: &SeasonToken) -> bool {
        self.leagues.iter().any(|league| league.played_in(season))
    }

    /// Pool size for `season_count` seasons: at least one, never more than the seasons.
    pub fn worker_count(&self, season_count: usize) -> usize {
        self.max_workers.max(1).min(season_count)
    }
}

/// Result of one season's pipeline.
#[derive(Debug)]
pub struct FetchOutcome {
    pub season: SeasonToken,
    pub success: bool,
    pub message: String,
    /// Rows loaded. For a failed season, the rows loaded before the failure.
    pub rows_affected: u64,
    pub error: Option<AppError>,
}

impl FetchOutcome {
    fn success(season: SeasonToken, rows_affected: u64, requests: usize) -> Self {
        Self {
            season,
            success: true,
            message: format!("loaded {rows_affected} rows from {requests} requests"),
            rows_affected,
            error: None,
        }
    }

    fn failure(season: SeasonToken, rows_affected: u64, error: AppError) -> Self {
        Self {
            season,
            success: false,
            message: error.to_string(),
            rows_affected,
            error: Some(error),
        }
    }
}

/// Everything the aggregator collected for one run.
#[derive(Debug, Default)]
pub struct RunReport {
    /// Outcomes in completion order
    pub outcomes: Vec<FetchOutcome>,
    pub rows_affected: u64,
    /// Seasons no configured league played, never queued
    pub skipped: Vec<SeasonToken>,
}

impl RunReport {
    pub fn failures(&self) -> impl Iterator<Item = &FetchOutcome> {
        self.outcomes.iter().filter(|outcome| !outcome.success)
    }

    pub fn failure_count(&self) -> usize {
        self.failures().count()
    }

    pub fn success_count(&self) -> usize {
        self.outcomes.len() - self.failure_count()
    }

    pub fn is_success(&self) -> bool {
        self.failure_count() == 0
    }

    pub fn sorted_outcomes(&self) -> Vec<&FetchOutcome> {
        let mut outcomes: Vec<&FetchOutcome> = self.outcomes.iter().collect();
        outcomes.sort_by(|a, b| a.season.cmp(&b.season));
        outcomes
    }

    pub fn summary_message(&self) -> String {
        let mut message = format!(
            "{} seasons, {} succeeded, {} failed, {} rows affected",
            self.outcomes.len(),
            self.success_count(),
            self.failure_count(),
            self.rows_affected
        );
        if !self.skipped.is_empty() {
            message.push_str(&format!(", {} skipped", self.skipped.len()));
        }
        message
    }
}

struct SeasonPipeline<T, C, L> {
    fetcher: Fetcher<T, C>,
    loader: L,
    plan: FetchPlan,
    log: Arc<dyn RunLog>,
}

impl<T: Transport, C: Clock, L: RowLoader> SeasonPipeline<T, C, L> {
    async fn run_season(&self, season: SeasonToken, game_date: Option<NaiveDate>) -> FetchOutcome {
        let queries = self.plan.queries(&season, game_date);
        let mut rows = 0;
        for query in &queries {
            let label = query.label();
            let request = build_game_log_request(&self.plan.host, self.plan.scheme, query);
            match self.fetch_and_load(&season, &label, &request).await {
                Ok(loaded) => rows += loaded,
                Err(e) => {
                    self.log
                        .write_line(&format!("Season {season} failed on {label}: {e}"));
                    return FetchOutcome::failure(season, rows, e);
                }
            }
        }

        self.log
            .write_line(&format!("Season {season} loaded {rows} rows"));
        FetchOutcome::success(season, rows, queries.len())
    }

    async fn fetch_and_load(
        &self,
        season: &SeasonToken,
        label: &str,
        request: &EndpointRequest,
    ) -> Result<u64, AppError> {
        let body = self.fetcher.fetch(request).await?;
        let response = decode(&body)?;
        debug!(
            "{label}: decoded {} result sets with {} rows",
            response.result_sets.len(),
            response.total_rows()
        );

        let mut rows = 0;
        for set in &response.result_sets {
            rows += self.loader.load(season, label, set).await?;
        }
        Ok(rows)
    }
}

async fn season_worker<T: Transport, C: Clock, L: RowLoader>(
    worker_id: usize,
    pipeline: Arc<SeasonPipeline<T, C, L>>,
    queue: Arc<Mutex<mpsc::Receiver<SeasonToken>>>,
    results: mpsc::Sender<FetchOutcome>,
    game_date: Option<NaiveDate>,
) {
    loop {
        let next = queue.lock().await.recv().await;
        let Some(season) = next else {
            break;
        };
        debug!("Worker {worker_id} starting season {season}");

        let token = season.clone();
        let outcome = match AssertUnwindSafe(pipeline.run_season(season, game_date))
            .catch_unwind()
            .await
        {
            Ok(outcome) => outcome,
            Err(payload) => {
                let error = AppError::season_panicked(token.label(), panic_message(payload.as_ref()));
                error!("Worker {worker_id}: {error}");
                pipeline
                    .log
                    .write_line(&format!("Season {token} failed: {error}"));
                // Rows loaded before the panic are not counted.
                FetchOutcome::failure(token, 0, error)
            }
        };
        if results.send(outcome).await.is_err() {
            warn!("Worker {worker_id}: aggregator stopped, dropping remaining work");
            break;
        }
    }
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        (*message).to_string()
    } else if let Some(message) = payload.downcast_ref::<String>() {
        message.clone()
    } else {
        "non-string panic payload".to_string()
    }
}

/// Runs season pipelines on a bounded pool and aggregates their outcomes.
pub struct SeasonOrchestrator<T, C, L> {
    pipeline: Arc<SeasonPipeline<T, C, L>>,
}

impl<T: Transport, C: Clock, L: RowLoader> SeasonOrchestrator<T, C, L> {
    pub fn new(fetcher: Fetcher<T, C>, loader: L, plan: FetchPlan, log: Arc<dyn RunLog>) -> Self {
        Self {
            pipeline: Arc::new(SeasonPipeline {
                fetcher,
                loader,
                plan,
                log,
            }),
        }
    }

    /// Fetches every season from `start_year` through `end_year`.
    ///
    /// # Errors
    /// `AppError::Range` when `end_year < start_year`; no worker is started.
    /// Season failures are reported in the [`RunReport`], never as an error.
    #[instrument(skip(self))]
    pub async fn run(&self, start_year: i32, end_year: i32) -> Result<RunReport, AppError> {
        let format = season_format_for(&self.pipeline.plan.leagues);
        let seasons = season_range(start_year, end_year, format)?;
        Ok(self.run_seasons(seasons, None).await)
    }

    /// Fetches a single season.
    ///
    /// # Errors
    /// `AppError::SeasonYear` when `start_year` is outside the supported years.
    pub async fn run_season(&self, start_year: i32) -> Result<RunReport, AppError> {
        let format = season_format_for(&self.pipeline.plan.leagues);
        let seasons = season_range(start_year, start_year, format)?;
        Ok(self.run_seasons(seasons, None).await)
    }

    /// Fetches the games played on `date` for the season that contains it.
    #[instrument(skip(self))]
    pub async fn run_daily(&self, date: NaiveDate) -> RunReport {
        let leagues = &self.pipeline.plan.leagues;
        let start_year = if leagues.contains(&League::Nba) {
            League::Nba.season_start_year(date)
        } else {
            date.year()
        };
        let season = SeasonToken::new(start_year, season_format_for(leagues));
        self.run_seasons(vec![season], Some(date)).await
    }

    async fn run_seasons(&self, seasons: Vec<SeasonToken>, game_date: Option<NaiveDate>) -> RunReport {
        let mut report = RunReport::default();
        let (seasons, skipped): (Vec<_>, Vec<_>) = seasons
            .into_iter()
            .partition(|season| self.pipeline.plan.covers(season));
        for season in &skipped {
            info!("Skipping season {season}: no configured league played");
            self.pipeline
                .log
                .write_line(&format!("Skipping season {season}: no configured league played"));
        }
        report.skipped = skipped;

        let season_count = seasons.len();
        if season_count == 0 {
            return report;
        }
        let worker_count = self.pipeline.plan.worker_count(season_count);
        info!("Fetching {season_count} seasons with {worker_count} workers");

        let (work_tx, work_rx) = mpsc::channel(season_count);
        for season in &seasons {
            if work_tx.send(season.clone()).await.is_err() {
                error!("Work queue closed while queueing season {season}");
            }
        }
        drop(work_tx);

        let queue = Arc::new(Mutex::new(work_rx));
        let (result_tx, mut result_rx) = mpsc::channel(season_count);

        let handles: Vec<_> = (0..worker_count)
            .map(|worker_id| {
                tokio::spawn(season_worker(
                    worker_id,
                    Arc::clone(&self.pipeline),
                    Arc::clone(&queue),
                    result_tx.clone(),
                    game_date,
                ))
            })
            .collect();
        drop(result_tx);

        while let Some(outcome) = result_rx.recv().await {
            report.rows_affected += outcome.rows_affected;
            if outcome.success {
                info!("Season {}: {}", outcome.season, outcome.message);
            } else {
                warn!("Season {} failed: {}", outcome.season, outcome.message);
            }
            report.outcomes.push(outcome);
        }

        for result in join_all(handles).await {
            if let Err(e) = result {
                error!("Season worker ended abnormally: {e}");
            }
        }

        let reported: HashSet<SeasonToken> = report
            .outcomes
            .iter()
            .map(|outcome| outcome.season.clone())
            .collect();
        for season in seasons.into_iter().filter(|s| !reported.contains(s)) {
            let error = AppError::season_panicked(season.label(), "season worker ended without reporting");
            self.pipeline
                .log
                .write_line(&format!("Season {season} failed: {error}"));
            report.outcomes.push(FetchOutcome::failure(season, 0, error));
        }

        info!("Run finished: {}", report.summary_message());
        report
    }
}
