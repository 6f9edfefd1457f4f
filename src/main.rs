// src/main.rs
use std::process::ExitCode;
use std::sync::Arc;

use bball_etl::app;
use bball_etl::cli::Args;
use bball_etl::commands::{handle_list_config_command, validate_args};
use bball_etl::config::Config;
use bball_etl::error::AppError;
use bball_etl::logging::{RunLog, TracingRunLog, setup_logging};
use clap::Parser;
use tracing::{error, info};

/// Resolves when Ctrl-C arrives. Never resolves if the signal cannot be watched.
async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        error!("Failed to listen for Ctrl-C: {e}");
        std::future::pending::<()>().await;
    }
}

#[tokio::main]
async fn main() -> Result<ExitCode, AppError> {
    let args = Args::parse();
    validate_args(&args)?;

    let config = Config::load().await?;

    if args.list_config {
        handle_list_config_command(&config);
        return Ok(ExitCode::SUCCESS);
    }

    // The guard must be kept alive until exit so buffered log lines are flushed
    let (log_file_path, _guard) = setup_logging(&args, &config).await?;
    info!("Logs are being written to: {log_file_path}");

    let log: Arc<dyn RunLog> = Arc::new(TracingRunLog);

    tokio::select! {
        result = app::run_etl(&args, &config, Arc::clone(&log)) => {
            let report = result?;
            info!("{}", report.summary_message());
            if report.is_success() {
                Ok(ExitCode::SUCCESS)
            } else {
                error!("{} seasons failed", report.failure_count());
                Ok(ExitCode::FAILURE)
            }
        }
        _ = shutdown_signal() => {
            log.write_line("Interrupted, stopping before the run completed");
            Err(AppError::Interrupted)
        }
    }
}
