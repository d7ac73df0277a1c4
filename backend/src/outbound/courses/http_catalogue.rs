//! Reqwest-backed course catalogue adapter.
//!
//! This adapter owns transport details only: URL building, retries, status
//! mapping, and JSON decoding into `CourseDetails`.

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, StatusCode, Url};
use tracing::{debug, warn};

use crate::domain::StudentId;
use crate::domain::ports::{CourseCatalogue, CourseCatalogueError, CourseDetails};

const DEFAULT_USER_AGENT: &str = "student-records-backend/0.1";

/// Retry policy for idempotent course lookups.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RetryPolicy {
    /// Total attempts, including the first.
    pub attempts: u32,
    /// Delay before attempt `n + 1` is `n * backoff_step`.
    pub backoff_step: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            attempts: 3,
            backoff_step: Duration::from_millis(100),
        }
    }
}

/// Course catalogue reached over HTTP.
pub struct HttpCourseCatalogue {
    client: Client,
    base_url: Url,
    retry: RetryPolicy,
}

impl HttpCourseCatalogue {
    /// Build an adapter using a reqwest client with an explicit request timeout.
    ///
    /// # Errors
    ///
    /// Returns an error when the reqwest client cannot be constructed.
    pub fn new(base_url: Url, timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(DEFAULT_USER_AGENT)
            .build()?;
        Ok(Self {
            client,
            base_url,
            retry: RetryPolicy::default(),
        })
    }

    #[must_use]
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = RetryPolicy {
            attempts: retry.attempts.max(1),
            ..retry
        };
        self
    }

    async fn fetch_once(&self, url: &Url) -> Result<Vec<CourseDetails>, CourseCatalogueError> {
        let response = self
            .client
            .get(url.clone())
            .header(reqwest::header::ACCEPT, "application/json")
            .send()
            .await
            .map_err(map_transport_error)?;

        let status = response.status();
        let body = response.bytes().await.map_err(map_transport_error)?;
        if !status.is_success() {
            return Err(map_status_error(status, body.as_ref()));
        }
        parse_courses(body.as_ref())
    }
}

#[async_trait]
impl CourseCatalogue for HttpCourseCatalogue {
    async fn courses_for_student(
        &self,
        student_id: &StudentId,
    ) -> Result<Vec<CourseDetails>, CourseCatalogueError> {
        let url = courses_url(&self.base_url, student_id)?;
        let mut attempt = 1;
        loop {
            match self.fetch_once(&url).await {
                Ok(courses) => {
                    debug!(student_id = %student_id, count = courses.len(), "course lookup complete");
                    return Ok(courses);
                }
                Err(error) if attempt < self.retry.attempts && is_retryable(&error) => {
                    warn!(student_id = %student_id, attempt, error = %error, "retrying course lookup");
                    tokio::time::sleep(self.retry.backoff_step * attempt).await;
                    attempt += 1;
                }
                Err(error) => return Err(error),
            }
        }
    }
}

fn courses_url(base: &Url, student_id: &StudentId) -> Result<Url, CourseCatalogueError> {
    let id = student_id.to_string();
    let mut url = base.clone();
    url.path_segments_mut()
        .map_err(|()| CourseCatalogueError::transport(format!("base url {base} cannot be a base")))?
        .pop_if_empty()
        .extend(["api", "courses", id.as_str(), "courses"]);
    Ok(url)
}

fn is_retryable(error: &CourseCatalogueError) -> bool {
    match error {
        CourseCatalogueError::Transport { .. } | CourseCatalogueError::Timeout { .. } => true,
        CourseCatalogueError::Status { status, .. } => *status >= 500,
        CourseCatalogueError::Decode { .. } => false,
    }
}

fn parse_courses(body: &[u8]) -> Result<Vec<CourseDetails>, CourseCatalogueError> {
    serde_json::from_slice(body).map_err(|error| {
        CourseCatalogueError::decode(format!("invalid course list payload: {error}"))
    })
}

fn map_transport_error(error: reqwest::Error) -> CourseCatalogueError {
    if error.is_timeout() {
        CourseCatalogueError::timeout(error.to_string())
    } else {
        CourseCatalogueError::transport(error.to_string())
    }
}

fn map_status_error(status: StatusCode, body: &[u8]) -> CourseCatalogueError {
    let preview = body_preview(body);
    let message = if preview.is_empty() {
        status
            .canonical_reason()
            .unwrap_or("unexpected status")
            .to_owned()
    } else {
        preview
    };
    CourseCatalogueError::status(status.as_u16(), message)
}

fn body_preview(body: &[u8]) -> String {
    const PREVIEW_CHAR_LIMIT: usize = 160;

    let compact = String::from_utf8_lossy(body)
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ");
    let preview = compact.chars().take(PREVIEW_CHAR_LIMIT).collect::<String>();
    if compact.chars().count() > PREVIEW_CHAR_LIMIT {
        format!("{preview}...")
    } else {
        preview
    }
}
