//! Student records service library.
//!
//! Layout follows ports and adapters: [`domain`] holds the model, services
//! and port traits; [`inbound`] adapts HTTP requests onto the driving port;
//! [`outbound`] implements the driven ports over PostgreSQL, Redis, Argon2,
//! JWT and the course service.

pub mod doc;
pub mod domain;
pub mod inbound;
pub mod middleware;
pub mod outbound;
#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

/// Public OpenAPI surface used by Swagger UI and tooling.
pub use doc::ApiDoc;
pub use middleware::Trace;
