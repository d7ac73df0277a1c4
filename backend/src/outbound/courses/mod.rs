//! Course service client.

mod http_catalogue;

pub use http_catalogue::{HttpCourseCatalogue, RetryPolicy};
