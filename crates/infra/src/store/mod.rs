//! Credential and job-posting storage boundary.
//!
//! The traits make no storage assumptions: `InMemoryStore` backs dev/tests,
//! `PostgresStore` backs deployments.

pub mod in_memory;
pub mod postgres;
pub mod r#trait;

pub use in_memory::InMemoryStore;
pub use postgres::PostgresStore;
pub use r#trait::{
    CredentialStore, Identity, JobListing, JobPatch, JobPosting, JobStore, NewIdentity,
    NewJobPosting, OwnerView, StoreError, UniqueKey,
};
