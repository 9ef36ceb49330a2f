use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use thiserror::Error;

use jobgate_auth::{AccountKind, Profile};
use jobgate_core::{IdentityId, JobId, ServiceError};

/// Stored identity record (the shared login row).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub id: IdentityId,
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub kind: AccountKind,
}

/// Identity plus its kind-matched extension, written as one unit.
#[derive(Debug, Clone)]
pub struct NewIdentity {
    pub id: IdentityId,
    pub username: String,
    pub email: String,
    pub password_hash: String,
    pub profile: Profile,
}

impl NewIdentity {
    pub fn kind(&self) -> AccountKind {
        self.profile.kind()
    }

    pub fn to_identity(&self) -> Identity {
        Identity {
            id: self.id,
            username: self.username.clone(),
            email: self.email.clone(),
            password_hash: self.password_hash.clone(),
            kind: self.kind(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JobPosting {
    pub id: JobId,
    #[serde(rename = "ownerIdentityId")]
    pub owner_id: IdentityId,
    pub title: String,
    pub vacancies: u32,
    pub location: String,
    pub duration: String,
    pub compensation: String,
    pub contact: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct NewJobPosting {
    pub id: JobId,
    pub owner_id: IdentityId,
    pub title: String,
    pub vacancies: u32,
    pub location: String,
    pub duration: String,
    pub compensation: String,
    pub contact: String,
    pub created_at: DateTime<Utc>,
}

impl NewJobPosting {
    pub fn into_posting(self) -> JobPosting {
        JobPosting {
            id: self.id,
            owner_id: self.owner_id,
            title: self.title,
            vacancies: self.vacancies,
            location: self.location,
            duration: self.duration,
            compensation: self.compensation,
            contact: self.contact,
            created_at: self.created_at,
            updated_at: self.created_at,
        }
    }
}

/// Partial update of the mutable posting fields. `None` leaves a field as is.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct JobPatch {
    pub title: Option<String>,
    pub vacancies: Option<u32>,
    pub location: Option<String>,
    pub duration: Option<String>,
    pub compensation: Option<String>,
    pub contact: Option<String>,
}

impl JobPatch {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.vacancies.is_none()
            && self.location.is_none()
            && self.duration.is_none()
            && self.compensation.is_none()
            && self.contact.is_none()
    }

    pub fn apply_to(&self, posting: &mut JobPosting, now: DateTime<Utc>) {
        fn merge(slot: &mut String, value: &Option<String>) {
            if let Some(v) = value {
                slot.clone_from(v);
            }
        }
        merge(&mut posting.title, &self.title);
        merge(&mut posting.location, &self.location);
        merge(&mut posting.duration, &self.duration);
        merge(&mut posting.compensation, &self.compensation);
        merge(&mut posting.contact, &self.contact);
        if let Some(v) = self.vacancies {
            posting.vacancies = v;
        }
        posting.updated_at = now;
    }
}

/// Reduced public view of a posting's owner.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct OwnerView {
    pub email: String,
    pub user_type: AccountKind,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JobListing {
    pub posting: JobPosting,
    pub owner: OwnerView,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum UniqueKey {
    Username,
    Email,
}

impl core::fmt::Display for UniqueKey {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::Username => f.write_str("username"),
            Self::Email => f.write_str("email"),
        }
    }
}

/// Store operation error.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum StoreError {
    #[error("{0} already exists")]
    Conflict(UniqueKey),

    #[error("storage error: {0}")]
    Storage(String),
}

impl StoreError {
    pub fn storage(msg: impl Into<String>) -> Self {
        Self::Storage(msg.into())
    }
}

impl From<StoreError> for ServiceError {
    fn from(value: StoreError) -> Self {
        match value {
            StoreError::Conflict(key) => ServiceError::conflict(format!("{key} already exists")),
            StoreError::Storage(msg) => ServiceError::internal(msg),
        }
    }
}

/// Persistence for identities and their profile extensions.
///
/// Implementations must:
/// - write an identity and its extension atomically (both or neither)
/// - reject a duplicate username or email with `StoreError::Conflict`, even
///   when two registrations race
#[async_trait]
pub trait CredentialStore: Send + Sync {
    /// Report which unique key, if any, is already taken. Username wins ties.
    async fn identity_taken(&self, username: &str, email: &str) -> Result<Option<UniqueKey>, StoreError>;

    /// Create the identity row and its extension row in one transaction.
    async fn create_identity(&self, new: NewIdentity) -> Result<Identity, StoreError>;

    async fn find_identity(&self, id: IdentityId) -> Result<Option<Identity>, StoreError>;

    async fn find_identity_by_email(&self, email: &str) -> Result<Option<Identity>, StoreError>;

    /// Load the extension for `id` from the table matching `kind`.
    async fn find_profile(&self, id: IdentityId, kind: AccountKind) -> Result<Option<Profile>, StoreError>;

    /// Remove an identity together with its extension and postings.
    async fn delete_identity(&self, id: IdentityId) -> Result<bool, StoreError>;
}

/// Persistence for job postings.
///
/// Mutations take the expected owner and must apply the ownership check and
/// the write as one conditional operation.
#[async_trait]
pub trait JobStore: Send + Sync {
    async fn insert_job(&self, new: NewJobPosting) -> Result<JobPosting, StoreError>;

    /// All postings, newest first, each joined with its owner's public view.
    async fn list_jobs(&self) -> Result<Vec<JobListing>, StoreError>;

    /// `None` when no posting matches both `id` and `owner`.
    async fn update_job_owned(
        &self,
        id: JobId,
        owner: IdentityId,
        patch: JobPatch,
        now: DateTime<Utc>,
    ) -> Result<Option<JobPosting>, StoreError>;

    /// `false` when no posting matches both `id` and `owner`.
    async fn delete_job_owned(&self, id: JobId, owner: IdentityId) -> Result<bool, StoreError>;
}
