use std::sync::Arc;

use chrono::{DateTime, Local};
use tracing::info;

use crate::cli::Args;
use crate::commands::{RunRequest, resolve_leagues, resolve_run};
use crate::config::Config;
use crate::data_fetcher::api::{
    Cooldown, FetchPlan, Fetcher, RetryPolicy, RunReport, SeasonOrchestrator, TokioClock,
    create_http_client_with_timeout, local_today,
};
use crate::data_fetcher::loader::SummaryLoader;
use crate::error::AppError;
use crate::logging::RunLog;

/// Run one ETL pass as described by the arguments and configuration.
///
/// - Resolves the seasons to fetch from the run mode
/// - Builds the HTTP client, fetcher and season pool from the config
/// - Writes the run summary to the run log when the pass completes
pub async fn run_etl(
    args: &Args,
    config: &Config,
    log: Arc<dyn RunLog>,
) -> Result<RunReport, AppError> {
    let request = resolve_run(args, local_today())?;

    let client = create_http_client_with_timeout(config.http_timeout_seconds)?;
    let mut fetcher = Fetcher::new(client, TokioClock, Arc::clone(&log)).with_policy(RetryPolicy {
        max_retries: config.max_retries,
        base_delay: config.retry_base_delay(),
    });
    if let Some(cooldown) = config.rate_limit_cooldown() {
        fetcher = fetcher.with_cooldown(Cooldown::new(cooldown));
    }

    let plan = FetchPlan::from_config(config).with_leagues(resolve_leagues(args));
    let loader = SummaryLoader::new(Arc::clone(&log));
    let orchestrator = SeasonOrchestrator::new(fetcher, loader, plan, Arc::clone(&log));

    let started = Local::now();
    log.write_line(&format!("ETL run started: {request:?}"));
    info!("Starting ETL run: {request:?}");

    let report = match request {
        RunRequest::Range { start, end } => orchestrator.run(start, end).await?,
        RunRequest::Season(year) => orchestrator.run_season(year).await?,
        RunRequest::Daily(date) => orchestrator.run_daily(date).await,
    };

    write_run_summary(log.as_ref(), &report, started, Local::now());
    Ok(report)
}

/// Writes start and completion times, duration, the row total and every
/// failed season with its reason.
pub fn write_run_summary(
    log: &dyn RunLog,
    report: &RunReport,
    started: DateTime<Local>,
    finished: DateTime<Local>,
) {
    let elapsed = (finished - started).to_std().unwrap_or_default();
    log.write_line(&format!("Start time: {}", started.format("%Y-%m-%d %H:%M:%S")));
    log.write_line(&format!(
        "Completion time: {}",
        finished.format("%Y-%m-%d %H:%M:%S")
    ));
    log.write_line(&format!("Duration: {:.1}s", elapsed.as_secs_f64()));
    log.write_line(&format!("Rows affected: {}", report.rows_affected));
    if !report.skipped.is_empty() {
        log.write_line(&format!("Skipped seasons: {}", report.skipped.len()));
    }

    let failures: Vec<_> = report
        .sorted_outcomes()
        .into_iter()
        .filter(|outcome| !outcome.success)
        .collect();
    if failures.is_empty() {
        log.write_line("No failures");
        return;
    }
    log.write_line(&format!("Failures: {}", failures.len()));
    for outcome in failures {
        log.write_line(&format!("  {}: {}", outcome.season, outcome.message));
    }
}
