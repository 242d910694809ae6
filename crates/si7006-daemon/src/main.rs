//! Si7006 Monitoring Daemon
//!
//! Attaches the sensor and publishes its readings as hwmon-style attribute
//! files over HTTP.

mod config;
mod state;
mod web;

#[cfg(test)]
mod testing;

use anyhow::{Context, Result};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::net::TcpListener;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use config::Config;
use state::AppState;

#[tokio::main]
async fn main() -> Result<()> {
    // Setup logging
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env().add_directive("info".parse()?))
        .init();

    // Load configuration
    let config_path = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "config/default.toml".to_string());

    let config = Config::load(&config_path).context("Failed to load configuration")?;
    info!("Loaded configuration from: {}", config_path);

    // Attach the sensor; without it there is nothing to serve
    let state = Arc::new(AppState::open(&config.device)?);

    // Start reading log loop
    if config.poll > 0 {
        let poll_state = state.clone();
        let poll_interval = config.poll;
        tokio::spawn(async move {
            poll_loop(poll_state, poll_interval).await;
        });
    } else {
        info!("Reading log disabled");
    }

    // Setup Unix signal handlers
    let mut sigterm = tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())?;
    let mut sigint = tokio::signal::unix::signal(tokio::signal::unix::SignalKind::interrupt())?;

    let app = web::create_router(state.clone());
    let addr: SocketAddr = config.listen.parse().context("Invalid listen address")?;
    let listener = TcpListener::bind(addr).await?;
    info!("Serving {} on http://{}/hwmon0", state.name(), addr);

    tokio::select! {
        result = axum::serve(listener, app) => {
            result?;
        }
        _ = sigterm.recv() => {
            info!("Received SIGTERM, shutting down");
        }
        _ = sigint.recv() => {
            info!("Received SIGINT, shutting down");
        }
    }

    Ok(())
}

/// Interval between repeated-error log lines.
const ERROR_LOG_INTERVAL: Duration = Duration::from_secs(60);

/// Rate limit for a loop's error log: the first error of a streak is logged
/// right away, then at most once per [`ERROR_LOG_INTERVAL`] with the number of
/// failures since the previous line.
struct ErrorThrottle {
    consecutive_errors: u32,
    since_last_log: u32,
    last_error_log: Instant,
}

impl ErrorThrottle {
    fn new(now: Instant) -> Self {
        Self {
            consecutive_errors: 0,
            since_last_log: 0,
            last_error_log: now,
        }
    }

    /// Counts a failure. Returns the failures to report if a line is due.
    fn record(&mut self, now: Instant) -> Option<u32> {
        self.consecutive_errors += 1;
        self.since_last_log += 1;

        let elapsed = now.saturating_duration_since(self.last_error_log);
        if self.consecutive_errors == 1 || elapsed >= ERROR_LOG_INTERVAL {
            let count = self.since_last_log;
            self.since_last_log = 0;
            self.last_error_log = now;
            Some(count)
        } else {
            None
        }
    }

    /// Ends the current error streak.
    fn clear(&mut self) {
        self.consecutive_errors = 0;
        self.since_last_log = 0;
    }
}

async fn poll_loop(state: Arc<AppState>, interval_ms: u64) {
    let interval = Duration::from_millis(interval_ms);
    let mut throttle = ErrorThrottle::new(Instant::now());

    loop {
        let poll_state = state.clone();
        let result = tokio::task::spawn_blocking(move || poll_state.poll())
            .await
            .map_err(anyhow::Error::from)
            .and_then(|readings| readings.map_err(anyhow::Error::from));

        match result {
            Ok(readings) => {
                throttle.clear();
                let line: Vec<String> = readings
                    .iter()
                    .map(|(file, value)| format!("{}={}", file, value))
                    .collect();
                info!("{}", line.join(" "));
            }
            Err(e) => {
                let since = throttle.last_error_log.elapsed();
                match throttle.record(Instant::now()) {
                    Some(1) => warn!("Read error: {}", e),
                    Some(count) => warn!(
                        "Read error (repeated {} times in {:?}): {}",
                        count, since, e
                    ),
                    None => {}
                }
            }
        }

        tokio::time::sleep(interval).await;
    }
}
