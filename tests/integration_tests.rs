use std::sync::Arc;
use std::time::Duration;

use bball_etl::{
    AppError, Config, FetchPlan, Fetcher, SeasonOrchestrator,
    app::run_etl,
    cli::Args,
    data_fetcher::api::{League, LogScope, Scheme, SeasonType, create_http_client_with_timeout},
    data_fetcher::loader::SummaryLoader,
    logging::RunLog,
    testing_utils::{ManualClock, MemoryLoader, RecordingLog, game_log_payload},
};
use clap::Parser;
use tempfile::tempdir;
use wiremock::{
    Mock, MockServer, ResponseTemplate,
    matchers::{header, method, path, query_param},
};

fn mock_config(server: &MockServer) -> Config {
    Config {
        api_host: server.address().to_string(),
        plain_http: true,
        retry_base_delay_seconds: 0,
        rate_limit_cooldown_seconds: 0,
        ..Config::default()
    }
}

fn args(argv: &[&str]) -> Args {
    let mut full = vec!["bball_etl"];
    full.extend_from_slice(argv);
    Args::try_parse_from(full).unwrap()
}

fn nba_player_plan(server: &MockServer) -> FetchPlan {
    FetchPlan::new(server.address().to_string())
        .with_scheme(Scheme::Http)
        .with_leagues(vec![League::Nba])
        .with_season_types(vec![SeasonType::RegularSeason])
        .with_scopes(vec![LogScope::Player])
}

/// A season run loads player and team logs for regular season and playoffs
#[tokio::test]
async fn test_season_run_end_to_end() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/stats/leaguegamelog"))
        .and(query_param("LeagueID", "00"))
        .and(query_param("Season", "2024-25"))
        .and(query_param("PlayerOrTeam", "P"))
        .and(header("x-nba-stats-origin", "stats"))
        .respond_with(
            ResponseTemplate::new(200).set_body_string(game_log_payload(3, "2025-01-10")),
        )
        .expect(2)
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/stats/leaguegamelog"))
        .and(query_param("PlayerOrTeam", "T"))
        .respond_with(
            ResponseTemplate::new(200).set_body_string(game_log_payload(2, "2025-01-10")),
        )
        .expect(2)
        .mount(&mock_server)
        .await;

    let log = Arc::new(RecordingLog::default());
    let report = run_etl(
        &args(&["--mode", "season", "--season", "2024", "--league", "nba"]),
        &mock_config(&mock_server),
        log.clone(),
    )
    .await
    .unwrap();

    assert!(report.is_success());
    assert_eq!(report.outcomes.len(), 1);
    assert_eq!(report.rows_affected, 10);
    assert!(log.contains("Rows affected: 10"));
    assert!(log.contains("No failures"));
    assert!(log.contains("2024-25 nba-P-Playoffs: 3 rows in LeagueGameLog"));
}

/// An inverted build range fails before any request is sent
#[tokio::test]
async fn test_inverted_build_range_sends_nothing() {
    let mock_server = MockServer::start().await;
    let log = Arc::new(RecordingLog::default());

    let result = run_etl(
        &args(&["--mode", "build", "--start", "2025", "--end", "2020"]),
        &mock_config(&mock_server),
        log.clone(),
    )
    .await;

    assert!(matches!(
        result,
        Err(AppError::Range {
            start: 2025,
            end: 2020
        })
    ));
    let received = mock_server.received_requests().await.unwrap_or_default();
    assert!(received.is_empty());
    assert!(!log.contains("Rows affected"));
}

/// Rate limiting recovers with the documented backoff schedule
#[tokio::test]
async fn test_rate_limited_season_recovers() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/stats/leaguegamelog"))
        .respond_with(ResponseTemplate::new(429))
        .up_to_n_times(2)
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/stats/leaguegamelog"))
        .respond_with(
            ResponseTemplate::new(200).set_body_string(game_log_payload(4, "2024-03-01")),
        )
        .mount(&mock_server)
        .await;

    let clock = ManualClock::new();
    let log = Arc::new(RecordingLog::default());
    let client = create_http_client_with_timeout(5).unwrap();
    let fetcher = Fetcher::new(client, clock.clone(), log.clone());
    let orchestrator = SeasonOrchestrator::new(
        fetcher,
        MemoryLoader::new(),
        nba_player_plan(&mock_server),
        log.clone(),
    );

    let report = orchestrator.run_season(2023).await.unwrap();

    assert!(report.is_success());
    assert_eq!(report.rows_affected, 4);
    assert_eq!(
        clock.sleeps(),
        vec![Duration::from_secs(5), Duration::from_secs(10)]
    );
    assert_eq!(log.count_containing("429 - retryable response"), 2);
}

/// One season stuck on 503 exhausts its retries while the others load
#[tokio::test]
async fn test_failing_season_is_isolated() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(query_param("Season", "2011-12"))
        .respond_with(ResponseTemplate::new(503))
        .expect(4)
        .mount(&mock_server)
        .await;
    Mock::given(method("GET"))
        .and(path("/stats/leaguegamelog"))
        .respond_with(
            ResponseTemplate::new(200).set_body_string(game_log_payload(5, "2012-02-02")),
        )
        .mount(&mock_server)
        .await;

    let log = Arc::new(RecordingLog::default());
    let client = create_http_client_with_timeout(5).unwrap();
    let orchestrator = SeasonOrchestrator::new(
        Fetcher::new(client, ManualClock::new(), log.clone()),
        MemoryLoader::new(),
        nba_player_plan(&mock_server).with_max_workers(2),
        log.clone(),
    );

    let report = orchestrator.run(2010, 2013).await.unwrap();

    assert_eq!(report.success_count(), 3);
    assert_eq!(report.rows_affected, 15);
    let failed: Vec<_> = report.failures().collect();
    assert_eq!(failed.len(), 1);
    assert_eq!(failed[0].season.label(), "2011-12");
    assert_eq!(failed[0].error.as_ref().and_then(AppError::status), Some(503));
}

/// Daily runs request a single date for both leagues
#[tokio::test]
async fn test_daily_run_requests_one_date() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(query_param("DateFrom", "07/04/2025"))
        .and(query_param("DateTo", "07/04/2025"))
        .respond_with(
            ResponseTemplate::new(200).set_body_string(game_log_payload(1, "2025-07-04")),
        )
        .expect(8)
        .mount(&mock_server)
        .await;

    let log = Arc::new(RecordingLog::default());
    let report = run_etl(
        &args(&["--mode", "daily", "--date", "2025-07-04"]),
        &mock_config(&mock_server),
        log.clone(),
    )
    .await
    .unwrap();

    assert!(report.is_success());
    assert_eq!(report.outcomes[0].season.label(), "2024-25");
    assert_eq!(report.rows_affected, 8);

    let received = mock_server.received_requests().await.unwrap_or_default();
    let wnba_seasons: Vec<String> = received
        .iter()
        .filter(|request| request.url.as_str().contains("LeagueID=10"))
        .filter_map(|request| {
            request
                .url
                .query_pairs()
                .find(|(key, _)| key == "Season")
                .map(|(_, value)| value.into_owned())
        })
        .collect();
    assert_eq!(wnba_seasons, vec!["2025"; 4]);
}

/// A maintenance page instead of JSON is a decode failure, not a crash
#[tokio::test]
async fn test_non_json_body_fails_season() {
    let mock_server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_string("<html>Access Denied</html>"))
        .mount(&mock_server)
        .await;

    let log: Arc<dyn RunLog> = Arc::new(RecordingLog::default());
    let client = create_http_client_with_timeout(5).unwrap();
    let orchestrator = SeasonOrchestrator::new(
        Fetcher::new(client, ManualClock::new(), log.clone()),
        SummaryLoader::new(log.clone()),
        nba_player_plan(&mock_server),
        log,
    );

    let report = orchestrator.run_season(2020).await.unwrap();

    assert_eq!(report.failure_count(), 1);
    assert!(matches!(
        report.outcomes[0].error,
        Some(AppError::Decode { .. })
    ));
    assert!(report.outcomes[0].message.contains("not valid JSON"));
}

/// Config written to disk loads back and validates
#[tokio::test]
async fn test_config_integration() {
    let temp_dir = tempdir().unwrap();
    let config_path = temp_dir.path().join("bball_etl").join("config.toml");
    let config_path_str = config_path.to_string_lossy();

    let config = Config {
        api_host: "stats.example.com".to_string(),
        max_concurrent_seasons: 16,
        rate_limit_cooldown_seconds: 0,
        ..Config::default()
    };
    config.save_to_path(&config_path_str).await.unwrap();

    let loaded = Config::load_from_path(&config_path_str).await.unwrap();
    assert_eq!(loaded, config);
    assert!(loaded.validate().is_ok());
    assert_eq!(loaded.rate_limit_cooldown(), None);

    let plan = FetchPlan::from_config(&loaded);
    assert_eq!(plan.host, "stats.example.com");
    assert_eq!(plan.scheme, Scheme::Https);
    assert_eq!(plan.max_workers, 16);
}
