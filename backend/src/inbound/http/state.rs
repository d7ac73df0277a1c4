//! Shared HTTP adapter state.
//!
//! HTTP handlers accept this state via `actix_web::web::Data` so they only
//! depend on the driving port and remain testable without I/O.

use std::sync::Arc;
use std::time::Duration;

use crate::domain::Deadline;
use crate::domain::ports::StudentUseCases;

/// Default budget for one request's store, cache and hashing work.
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_millis(5000);

/// Dependency bundle for HTTP handlers.
#[derive(Clone)]
pub struct HttpState {
    pub students: Arc<dyn StudentUseCases>,
    request_timeout: Duration,
}

impl HttpState {
    /// Construct state around the use-case port.
    ///
    /// # Examples
    /// ```no_run
    /// use std::sync::Arc;
    /// use std::time::Duration;
    ///
    /// use student_records::domain::ports::StudentUseCases;
    /// use student_records::inbound::http::state::HttpState;
    ///
    /// fn build(students: Arc<dyn StudentUseCases>) -> HttpState {
    ///     HttpState::new(students).with_request_timeout(Duration::from_secs(2))
    /// }
    /// ```
    pub fn new(students: Arc<dyn StudentUseCases>) -> Self {
        Self {
            students,
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }

    #[must_use]
    pub fn with_request_timeout(mut self, timeout: Duration) -> Self {
        self.request_timeout = timeout;
        self
    }

    pub fn request_timeout(&self) -> Duration {
        self.request_timeout
    }

    /// Deadline for the request currently being handled.
    pub fn deadline(&self) -> Deadline {
        Deadline::after(self.request_timeout)
    }
}
