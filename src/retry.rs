use crate::errors::{Classify, ErrorKind};
use std::fmt;
use std::time::Duration;
use tracing::{error, info, warn};

/// Bounded retries with exponential backoff: retry `i` waits `base * 2^i`.
#[derive(Debug, Clone, Copy)]
pub struct RetryPolicy {
    pub retries: u32,
    pub base_delay: Duration,
}

impl RetryPolicy {
    pub fn new(retries: u32, base_delay: Duration) -> Self {
        Self {
            retries,
            base_delay,
        }
    }

    /// Single attempt; failures are logged and returned.
    pub fn once() -> Self {
        Self::new(0, Duration::from_secs(1))
    }

    pub fn backoff(&self, retry: u32) -> Duration {
        self.base_delay.saturating_mul(2u32.saturating_pow(retry))
    }
}

#[derive(Debug, thiserror::Error)]
pub enum RetryError<E: fmt::Display + fmt::Debug> {
    #[error("{name} failed after {attempts} attempt(s): {error}")]
    Exhausted {
        name: String,
        attempts: u32,
        error: E,
    },

    #[error("{name} failed with a non-retryable {kind} error: {error}")]
    Aborted {
        name: String,
        kind: ErrorKind,
        error: E,
    },
}

impl<E: fmt::Display + fmt::Debug> RetryError<E> {
    pub fn into_inner(self) -> E {
        match self {
            RetryError::Exhausted { error, .. } | RetryError::Aborted { error, .. } => error,
        }
    }
}

/// Runs `op` up to `policy.retries + 1` times.
///
/// Every failed attempt is logged. Before each retry a `[RETRYING]` line is
/// logged and the thread sleeps for the backoff. Only transient errors are
/// retried; anything else aborts at once. The final failure is logged once
/// and handed back to the caller.
pub fn with_retry<T, E, F>(name: &str, policy: &RetryPolicy, mut op: F) -> Result<T, RetryError<E>>
where
    F: FnMut() -> Result<T, E>,
    E: Classify + fmt::Display + fmt::Debug,
{
    let mut attempt: u32 = 0;
    loop {
        match op() {
            Ok(value) => return Ok(value),
            Err(err) => {
                attempt += 1;
                let kind = err.kind();
                warn!(op = name, attempt, %kind, "{err}");

                if kind != ErrorKind::Transient {
                    error!(op = name, %kind, "giving up: error is not retryable");
                    return Err(RetryError::Aborted {
                        name: name.to_string(),
                        kind,
                        error: err,
                    });
                }

                if attempt > policy.retries {
                    error!(op = name, attempts = attempt, "giving up after final attempt");
                    return Err(RetryError::Exhausted {
                        name: name.to_string(),
                        attempts: attempt,
                        error: err,
                    });
                }

                info!("[RETRYING] {name}: {attempt}/{}", policy.retries);
                std::thread::sleep(policy.backoff(attempt));
            }
        }
    }
}
