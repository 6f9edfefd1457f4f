//! Test doubles for the fetch pipeline: a scripted transport, a manual clock,
//! a recording run log and an in-memory row loader.

use std::future::Future;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};

use bytes::Bytes;

use crate::data_fetcher::api::{
    Clock, EndpointRequest, SeasonToken, Transport, TransportError, TransportResponse,
};
use crate::data_fetcher::loader::RowLoader;
use crate::data_fetcher::models::ResultSet;
use crate::error::AppError;
use crate::logging::RunLog;

fn lock<T>(mutex: &Mutex<T>) -> std::sync::MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

/// One scripted reply.
#[derive(Debug, Clone)]
pub enum Step {
    Reply { status: u16, body: Bytes },
    /// No response at all (refused connection, timeout)
    TransportFailure(String),
    /// Status line arrives but the body cannot be read
    UnreadableBody(u16),
}

impl Step {
    pub fn status(status: u16) -> Self {
        Step::Reply {
            status,
            body: Bytes::new(),
        }
    }

    pub fn body(status: u16, body: impl Into<String>) -> Self {
        Step::Reply {
            status,
            body: Bytes::from(body.into()),
        }
    }

    pub fn transport_failure(message: impl Into<String>) -> Self {
        Step::TransportFailure(message.into())
    }

    pub fn unreadable_body(status: u16) -> Self {
        Step::UnreadableBody(status)
    }
}

/// Replays steps in order; the last step repeats once the script runs out.
#[derive(Debug, Default)]
struct Script {
    steps: Vec<Step>,
    next: usize,
}

impl Script {
    fn new(steps: Vec<Step>) -> Self {
        Self { steps, next: 0 }
    }

    fn advance(&mut self) -> Step {
        let index = self.next.min(self.steps.len().saturating_sub(1));
        self.next += 1;
        self.steps
            .get(index)
            .cloned()
            .unwrap_or_else(|| Step::status(404))
    }
}

/// In-memory [`Transport`] answering from per-URL scripts.
///
/// A request is routed to the first script whose pattern is a substring of
/// its URL, otherwise to the fallback script. Without any match it gets a 404.
#[derive(Clone, Default)]
pub struct ScriptedTransport {
    routes: Arc<Mutex<Vec<(String, Script)>>>,
    fallback: Arc<Mutex<Script>>,
    calls: Arc<Mutex<Vec<String>>>,
    in_flight: Arc<AtomicUsize>,
    max_in_flight: Arc<AtomicUsize>,
    latency: Option<Duration>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn route(self, pattern: impl Into<String>, steps: Vec<Step>) -> Self {
        lock(&self.routes).push((pattern.into(), Script::new(steps)));
        self
    }

    pub fn fallback(self, steps: Vec<Step>) -> Self {
        *lock(&self.fallback) = Script::new(steps);
        self
    }

    /// Holds every request open for `latency` of real time.
    pub fn with_latency(mut self, latency: Duration) -> Self {
        self.latency = Some(latency);
        self
    }

    pub fn calls(&self) -> Vec<String> {
        lock(&self.calls).clone()
    }

    pub fn call_count(&self) -> usize {
        lock(&self.calls).len()
    }

    pub fn calls_matching(&self, pattern: &str) -> usize {
        lock(&self.calls)
            .iter()
            .filter(|url| url.contains(pattern))
            .count()
    }

    /// Highest number of requests that were open at the same time.
    pub fn max_in_flight(&self) -> usize {
        self.max_in_flight.load(Ordering::SeqCst)
    }

    fn next_step(&self, url: &str) -> Step {
        let mut routes = lock(&self.routes);
        match routes.iter_mut().find(|(pattern, _)| url.contains(pattern.as_str())) {
            Some((_, script)) => script.advance(),
            None => lock(&self.fallback).advance(),
        }
    }
}

/// Response produced by [`ScriptedTransport`].
#[derive(Debug)]
pub struct ScriptedResponse {
    status: u16,
    body: Result<Bytes, String>,
}

impl TransportResponse for ScriptedResponse {
    fn status(&self) -> u16 {
        self.status
    }

    fn bytes(self) -> impl Future<Output = Result<Bytes, TransportError>> + Send {
        std::future::ready(self.body.map_err(TransportError::new))
    }
}

impl Transport for ScriptedTransport {
    type Response = ScriptedResponse;

    fn send(
        &self,
        request: &EndpointRequest,
    ) -> impl Future<Output = Result<Self::Response, TransportError>> + Send {
        let url = request.url();
        lock(&self.calls).push(url.clone());
        let step = self.next_step(&url);
        let in_flight = Arc::clone(&self.in_flight);
        let max_in_flight = Arc::clone(&self.max_in_flight);
        let latency = self.latency;

        async move {
            let current = in_flight.fetch_add(1, Ordering::SeqCst) + 1;
            max_in_flight.fetch_max(current, Ordering::SeqCst);
            match latency {
                Some(latency) => tokio::time::sleep(latency).await,
                None => tokio::task::yield_now().await,
            }
            in_flight.fetch_sub(1, Ordering::SeqCst);

            match step {
                Step::Reply { status, body } => Ok(ScriptedResponse {
                    status,
                    body: Ok(body),
                }),
                Step::TransportFailure(message) => Err(TransportError::new(message)),
                Step::UnreadableBody(status) => Ok(ScriptedResponse {
                    status,
                    body: Err("connection reset while reading body".to_string()),
                }),
            }
        }
    }
}

#[derive(Debug)]
struct ClockState {
    now: Instant,
    sleeps: Vec<Duration>,
}

/// [`Clock`] that records sleeps and advances its own time instead of waiting.
#[derive(Debug, Clone)]
pub struct ManualClock {
    state: Arc<Mutex<ClockState>>,
}

impl Default for ManualClock {
    fn default() -> Self {
        Self::new()
    }
}

impl ManualClock {
    pub fn new() -> Self {
        Self {
            state: Arc::new(Mutex::new(ClockState {
                now: Instant::now(),
                sleeps: Vec::new(),
            })),
        }
    }

    pub fn sleeps(&self) -> Vec<Duration> {
        lock(&self.state).sleeps.clone()
    }

    pub fn total_slept(&self) -> Duration {
        lock(&self.state).sleeps.iter().sum()
    }
}

impl Clock for ManualClock {
    fn now(&self) -> Instant {
        lock(&self.state).now
    }

    fn sleep(&self, duration: Duration) -> impl Future<Output = ()> + Send {
        {
            let mut state = lock(&self.state);
            state.now += duration;
            state.sleeps.push(duration);
        }
        tokio::task::yield_now()
    }
}

/// [`RunLog`] keeping every line in memory.
#[derive(Debug, Default)]
pub struct RecordingLog {
    lines: Mutex<Vec<String>>,
}

impl RecordingLog {
    pub fn lines(&self) -> Vec<String> {
        lock(&self.lines).clone()
    }

    pub fn count_containing(&self, needle: &str) -> usize {
        lock(&self.lines)
            .iter()
            .filter(|line| line.contains(needle))
            .count()
    }

    pub fn contains(&self, needle: &str) -> bool {
        self.count_containing(needle) > 0
    }
}

impl RunLog for RecordingLog {
    fn write_line(&self, line: &str) {
        lock(&self.lines).push(line.to_string());
    }
}

/// One call to [`MemoryLoader::load`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadRecord {
    pub season: String,
    pub source: String,
    pub set_name: String,
    pub rows: u64,
}

/// [`RowLoader`] that records what it was given and returns the row count.
#[derive(Debug, Clone, Default)]
pub struct MemoryLoader {
    records: Arc<Mutex<Vec<LoadRecord>>>,
    failing_seasons: Arc<Vec<String>>,
}

impl MemoryLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fails every load for the given season labels.
    pub fn failing_for(seasons: &[&str]) -> Self {
        Self {
            records: Arc::default(),
            failing_seasons: Arc::new(seasons.iter().map(|s| s.to_string()).collect()),
        }
    }

    pub fn records(&self) -> Vec<LoadRecord> {
        lock(&self.records).clone()
    }

    pub fn total_rows(&self) -> u64 {
        lock(&self.records).iter().map(|r| r.rows).sum()
    }
}

impl RowLoader for MemoryLoader {
    fn load(
        &self,
        season: &SeasonToken,
        source: &str,
        set: &ResultSet,
    ) -> impl Future<Output = Result<u64, AppError>> + Send {
        let result = if self.failing_seasons.iter().any(|s| s == season.label()) {
            Err(AppError::load(season.label(), "loader rejected rows"))
        } else {
            let rows = set.row_count() as u64;
            lock(&self.records).push(LoadRecord {
                season: season.label().to_string(),
                source: source.to_string(),
                set_name: set.name.clone(),
                rows,
            });
            Ok(rows)
        };
        std::future::ready(result)
    }
}

/// Game log payload with `rows` rows dated `date`.
pub fn game_log_payload(rows: usize, date: &str) -> String {
    let row_set: Vec<String> = (0..rows)
        .map(|i| format!(r#"["00224{i:05}","{date}",{}]"#, 100 + i))
        .collect();
    format!(
        r#"{{"resource":"leaguegamelog","parameters":{{}},"resultSets":[{{"name":"LeagueGameLog","headers":["GAME_ID","GAME_DATE","PTS"],"rowSet":[{}]}}]}}"#,
        row_set.join(",")
    )
}
