//! Connection Supervisor
//!
//! Keeps one network side alive:
//! - connects the session and runs it until it fails
//! - logs the failure, waits out the retry delay and connects again
//! - publishes its state on a watch channel
//! - stops promptly when the shutdown signal flips
//!
//! Each side has its own supervisor, so one network failing never stalls the
//! other.

use std::any::Any;
use std::panic::AssertUnwindSafe;
use std::time::Duration;

use duplex_core::{NetworkSide, TransportError, TransportResult};
use futures::FutureExt;
use tokio::sync::watch;
use tracing::{error, info, warn};

use crate::session::SessionDriver;

/// Delay used when no policy is configured
pub const DEFAULT_RETRY_DELAY: Duration = Duration::from_secs(10);

// ----------------------------------------------------------------------------
// State and Policy
// ----------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SupervisorState {
    Connecting,
    Running,
    /// Waiting out the retry delay after a failure
    Failed,
    Stopped,
}

/// How long to wait between a failure and the next connection attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RetryPolicy {
    /// Same delay every time, retrying forever
    FixedDelay(Duration),
}

impl RetryPolicy {
    pub fn delay(&self) -> Duration {
        match self {
            RetryPolicy::FixedDelay(delay) => *delay,
        }
    }
}

impl Default for RetryPolicy {
    fn default() -> Self {
        RetryPolicy::FixedDelay(DEFAULT_RETRY_DELAY)
    }
}

/// Snapshot of a supervisor's progress
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SupervisorStats {
    pub side: NetworkSide,
    pub state: SupervisorState,
    pub connection_attempts: u64,
    pub sessions_started: u64,
    pub failures: u64,
    pub last_error: Option<String>,
}

impl SupervisorStats {
    fn new(side: NetworkSide) -> Self {
        Self {
            side,
            state: SupervisorState::Connecting,
            connection_attempts: 0,
            sessions_started: 0,
            failures: 0,
            last_error: None,
        }
    }
}

// ----------------------------------------------------------------------------
// Supervisor
// ----------------------------------------------------------------------------

pub struct Supervisor<D> {
    driver: D,
    policy: RetryPolicy,
    shutdown: watch::Receiver<bool>,
    status: watch::Sender<SupervisorStats>,
}

impl<D: SessionDriver> Supervisor<D> {
    pub fn new(driver: D, policy: RetryPolicy, shutdown: watch::Receiver<bool>) -> Self {
        let (status, _) = watch::channel(SupervisorStats::new(driver.side()));
        Self {
            driver,
            policy,
            shutdown,
            status,
        }
    }

    /// Follow this supervisor's state
    pub fn subscribe(&self) -> watch::Receiver<SupervisorStats> {
        self.status.subscribe()
    }

    /// Run until shutdown is signalled or the session has nothing left to do
    pub async fn run(mut self) -> SupervisorStats {
        let side = self.driver.side();
        info!("Starting {} supervisor", side);

        loop {
            if *self.shutdown.borrow() {
                break;
            }

            self.status.send_modify(|stats| {
                stats.state = SupervisorState::Connecting;
                stats.connection_attempts += 1;
            });

            // An adapter panic ends the attempt like any other failure.
            let attempt = AssertUnwindSafe(run_session(&mut self.driver, &self.status))
                .catch_unwind()
                .map(|result| result.unwrap_or_else(|panic| Err(panicked(panic))));

            let outcome = tokio::select! {
                result = attempt => Some(result),
                _ = shutdown_signal(&mut self.shutdown) => None,
            };

            self.driver.teardown().await;

            match outcome {
                None => break,
                Some(Ok(())) => {
                    info!("{} session finished", side);
                    break;
                }
                Some(Err(e)) => {
                    error!("{} session failed: {}", side, e);
                    self.status.send_modify(|stats| {
                        stats.state = SupervisorState::Failed;
                        stats.failures += 1;
                        stats.last_error = Some(e.to_string());
                    });
                }
            }

            let delay = self.policy.delay();
            warn!("Reconnecting {} in {:?}", side, delay);

            tokio::select! {
                _ = tokio::time::sleep(delay) => {}
                _ = shutdown_signal(&mut self.shutdown) => break,
            }
        }

        self.status
            .send_modify(|stats| stats.state = SupervisorState::Stopped);
        info!("{} supervisor stopped", side);

        self.status.borrow().clone()
    }
}

async fn run_session<D: SessionDriver>(
    driver: &mut D,
    status: &watch::Sender<SupervisorStats>,
) -> TransportResult<()> {
    driver.connect().await?;

    status.send_modify(|stats| {
        stats.state = SupervisorState::Running;
        stats.sessions_started += 1;
    });
    info!("{} session established", driver.side());

    driver.run().await
}

fn panicked(payload: Box<dyn Any + Send>) -> TransportError {
    let reason = payload
        .downcast_ref::<&str>()
        .map(|s| s.to_string())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| "unknown panic".to_string());
    TransportError::Panicked { reason }
}

/// Resolves once shutdown is requested or the signal sender is gone
async fn shutdown_signal(shutdown: &mut watch::Receiver<bool>) {
    loop {
        if *shutdown.borrow_and_update() {
            return;
        }
        if shutdown.changed().await.is_err() {
            return;
        }
    }
}

// ----------------------------------------------------------------------------
// Tests
// ----------------------------------------------------------------------------
