//! `jobgate-core`: shared building blocks.
//!
//! Identifiers and the service-wide error taxonomy. No infrastructure concerns.

pub mod error;
pub mod id;

pub use error::{ServiceError, ServiceResult};
pub use id::{IdentityId, JobId};
