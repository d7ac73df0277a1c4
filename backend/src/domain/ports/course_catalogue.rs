//! Port for the external course-lookup service.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::domain::StudentId;

use super::define_port_error;

/// Course details as reported by the course service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CourseDetails {
    pub id: String,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

define_port_error! {
    /// Failures talking to the course service.
    pub enum CourseCatalogueError {
        /// Request exceeded the client timeout.
        Timeout { message: String } => "course service timed out: {message}",
        /// Connection or protocol failure.
        Transport { message: String } => "course service request failed: {message}",
        /// Non-success HTTP status.
        Status { status: u16, message: String } => "course service returned {status}: {message}",
        /// Body did not match the expected shape.
        Decode { message: String } => "course service response was malformed: {message}",
    }
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait CourseCatalogue: Send + Sync {
    /// Course details for every course the student attends.
    async fn courses_for_student(
        &self,
        student_id: &StudentId,
    ) -> Result<Vec<CourseDetails>, CourseCatalogueError>;
}
