//! Infrastructure layer: credential/job storage, configuration and the
//! services that orchestrate them (registration, login, token resolution,
//! job postings).

pub mod config;
pub mod jobs;
pub mod login;
pub mod registrar;
pub mod resolver;
pub mod store;

pub use config::{AppConfig, ConfigError, Environment};
pub use jobs::{JobDraft, JobService};
pub use login::{LoginOutcome, LoginService};
pub use registrar::{ProfileRegistrar, Registered, Registration};
pub use resolver::IdentityResolver;
pub use store::{
    CredentialStore, Identity, InMemoryStore, JobListing, JobPatch, JobPosting, JobStore,
    NewIdentity, NewJobPosting, OwnerView, PostgresStore, StoreError, UniqueKey,
};

use jobgate_auth::PasswordVerifier;
use jobgate_core::ServiceError;
use std::sync::Arc;

/// Run a CPU-heavy password operation on the blocking pool.
pub(crate) async fn blocking_password<T, F>(
    passwords: &Arc<dyn PasswordVerifier>,
    f: F,
) -> Result<T, ServiceError>
where
    T: Send + 'static,
    F: FnOnce(&dyn PasswordVerifier) -> T + Send + 'static,
{
    let passwords = Arc::clone(passwords);
    tokio::task::spawn_blocking(move || f(passwords.as_ref()))
        .await
        .map_err(|e| ServiceError::internal(format!("password task failed: {e}")))
}
