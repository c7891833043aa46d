//! Medminder backend library.
//!
//! Medication tracking with expiry monitoring, recurring reminder schedules
//! and multi-channel reminder dispatch. The crate follows a ports and adapters
//! layout: `domain` owns entities, services and port traits; `inbound` and
//! `outbound` hold the adapters; the binaries wire them together.

pub mod doc;
pub mod domain;
pub mod inbound;
pub mod middleware;
pub mod outbound;
pub mod settings;
#[cfg(any(test, feature = "test-support"))]
pub mod test_support;

/// Public OpenAPI surface used by Swagger UI and tooling.
pub use doc::ApiDoc;
pub use domain::TraceId;
pub use middleware::Trace;
