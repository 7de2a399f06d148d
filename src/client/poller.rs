//! Job completion polling.
//!
//! A job is watched by a single control loop that races three events:
//! the poll tick, the overall deadline and caller cancellation. The status
//! request itself runs inside the tick branch, so a hung status call can
//! never outlive the deadline.

use std::time::Duration;

use serde::de::DeserializeOwned;
use tokio::time::{Instant, MissedTickBehavior, interval_at, sleep};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use super::JobApi;
use crate::error::ClientError;

/// Default interval between status polls.
pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_secs(1);
/// Default overall deadline.
pub const DEFAULT_POLL_TIMEOUT: Duration = Duration::from_secs(60);

/// Polls one job until it reaches a terminal status.
///
/// Outcomes are exactly one of: decoded result, [`ClientError::JobFailed`],
/// [`ClientError::Timeout`] or [`ClientError::Cancelled`]. No status request
/// is issued after the outcome is decided.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompletionPoller {
    interval: Duration,
    timeout: Duration,
}

impl Default for CompletionPoller {
    fn default() -> Self {
        Self::new()
    }
}

impl CompletionPoller {
    /// Creates a poller with a 1s tick and 60s deadline.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            interval: DEFAULT_POLL_INTERVAL,
            timeout: DEFAULT_POLL_TIMEOUT,
        }
    }

    /// Sets the tick interval.
    #[must_use]
    pub const fn interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    /// Sets the overall deadline.
    #[must_use]
    pub const fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Returns the configured deadline.
    #[must_use]
    pub const fn deadline(&self) -> Duration {
        self.timeout
    }

    /// Waits for `job_id` to finish and decodes its result into `T`.
    ///
    /// # Errors
    ///
    /// - [`ClientError::JobFailed`] on `error`/`error(retrying)` or an inline
    ///   error on the status or result endpoint
    /// - [`ClientError::Timeout`] if the deadline fires first
    /// - [`ClientError::Cancelled`] if `cancel` fires first
    /// - transport, status and decode errors from the underlying calls
    pub async fn wait<T, A>(
        &self,
        api: &A,
        job_id: &str,
        cancel: &CancellationToken,
    ) -> Result<T, ClientError>
    where
        T: DeserializeOwned,
        A: JobApi + ?Sized,
    {
        tokio::select! {
            biased;

            () = cancel.cancelled() => {
                info!(job_id, "wait cancelled");
                Err(ClientError::Cancelled { job_id: job_id.to_string() })
            }
            result = self.poll_until_terminal(api, job_id) => result,
            () = sleep(self.timeout) => {
                warn!(job_id, timeout = ?self.timeout, "job timed out");
                Err(ClientError::Timeout {
                    job_id: job_id.to_string(),
                    timeout: self.timeout,
                })
            }
        }
    }

    async fn poll_until_terminal<T, A>(&self, api: &A, job_id: &str) -> Result<T, ClientError>
    where
        T: DeserializeOwned,
        A: JobApi + ?Sized,
    {
        let mut ticker = interval_at(Instant::now() + self.interval, self.interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut polls: usize = 0;

        loop {
            ticker.tick().await;
            polls += 1;

            let response = api.job_status(job_id).await?;
            debug!(job_id, polls, status = %response.status, "polled job status");

            if response.status.is_failure_terminal() || !response.error.is_empty() {
                return Err(ClientError::JobFailed {
                    job_id: job_id.to_string(),
                    status: response.status.to_string(),
                    message: response.error,
                });
            }

            if response.status.is_success_terminal() {
                let payload = api.job_result(job_id).await?;
                debug!(job_id, polls, bytes = payload.body.len(), "fetched job result");
                return payload.decode();
            }
        }
    }
}
