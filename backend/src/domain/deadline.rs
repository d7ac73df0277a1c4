//! Per-request deadline shared by every downstream call.
//!
//! Inbound adapters create one [`Deadline`] per request and hand it to the
//! domain. Each store, cache or network step runs under the remaining
//! budget so a slow dependency cannot hold a request open indefinitely.

use std::future::Future;
use std::time::Duration;

use tokio::time::{Instant, timeout_at};
use tracing::warn;

use super::Error;

/// Absolute point in time by which a request must finish.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Deadline(Instant);

impl Deadline {
    /// Deadline `budget` from now.
    pub fn after(budget: Duration) -> Self {
        Self(Instant::now() + budget)
    }

    /// Deadline at an explicit instant.
    pub fn at(instant: Instant) -> Self {
        Self(instant)
    }

    /// Time left before the deadline, zero once it has passed.
    pub fn remaining(&self) -> Duration {
        self.0.saturating_duration_since(Instant::now())
    }

    pub fn has_elapsed(&self) -> bool {
        Instant::now() >= self.0
    }

    /// Run `operation` under the deadline.
    ///
    /// Elapsing maps to [`Error::timeout`]; the operation label appears in
    /// the log line and the error message.
    ///
    /// # Examples
    /// ```
    /// use std::time::Duration;
    /// use student_records::domain::{Deadline, ErrorCode};
    ///
    /// # tokio::runtime::Runtime::new().expect("runtime").block_on(async {
    /// let expired = Deadline::after(Duration::ZERO);
    /// let err = expired
    ///     .run("lookup", std::future::pending::<Result<(), _>>())
    ///     .await
    ///     .expect_err("deadline elapsed");
    /// assert_eq!(err.code(), ErrorCode::Timeout);
    /// # });
    /// ```
    pub async fn run<T, Fut>(&self, operation: &'static str, fut: Fut) -> Result<T, Error>
    where
        Fut: Future<Output = Result<T, Error>>,
    {
        match timeout_at(self.0, fut).await {
            Ok(result) => result,
            Err(_) => {
                warn!(operation, "request deadline elapsed");
                Err(Error::timeout(format!("{operation} timed out")))
            }
        }
    }
}
