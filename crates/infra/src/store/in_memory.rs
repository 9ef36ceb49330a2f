use std::collections::HashMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use jobgate_auth::{AccountKind, Profile};
use jobgate_core::{IdentityId, JobId};

use super::r#trait::{
    CredentialStore, Identity, JobListing, JobPatch, JobPosting, JobStore, NewIdentity,
    NewJobPosting, OwnerView, StoreError, UniqueKey,
};

#[derive(Debug, Default)]
struct State {
    identities: HashMap<IdentityId, Identity>,
    profiles: HashMap<IdentityId, Profile>,
    /// Insertion order doubles as creation order.
    jobs: Vec<JobPosting>,
}

impl State {
    fn taken(&self, username: &str, email: &str) -> Option<UniqueKey> {
        if self.identities.values().any(|i| i.username == username) {
            Some(UniqueKey::Username)
        } else if self.identities.values().any(|i| i.email == email) {
            Some(UniqueKey::Email)
        } else {
            None
        }
    }
}

/// In-memory credential + job store for tests/dev.
///
/// Every write runs under a single lock, so a uniqueness check and the insert
/// that follows it cannot interleave with another registration.
#[derive(Debug, Default)]
pub struct InMemoryStore {
    inner: RwLock<State>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> Result<RwLockReadGuard<'_, State>, StoreError> {
        self.inner.read().map_err(|_| StoreError::storage("store lock poisoned"))
    }

    fn write(&self) -> Result<RwLockWriteGuard<'_, State>, StoreError> {
        self.inner.write().map_err(|_| StoreError::storage("store lock poisoned"))
    }
}

#[async_trait]
impl CredentialStore for InMemoryStore {
    async fn identity_taken(&self, username: &str, email: &str) -> Result<Option<UniqueKey>, StoreError> {
        Ok(self.read()?.taken(username, email))
    }

    async fn create_identity(&self, new: NewIdentity) -> Result<Identity, StoreError> {
        let mut state = self.write()?;
        if let Some(key) = state.taken(&new.username, &new.email) {
            return Err(StoreError::Conflict(key));
        }
        let identity = new.to_identity();
        state.identities.insert(identity.id, identity.clone());
        state.profiles.insert(identity.id, new.profile);
        Ok(identity)
    }

    async fn find_identity(&self, id: IdentityId) -> Result<Option<Identity>, StoreError> {
        Ok(self.read()?.identities.get(&id).cloned())
    }

    async fn find_identity_by_email(&self, email: &str) -> Result<Option<Identity>, StoreError> {
        Ok(self
            .read()?
            .identities
            .values()
            .find(|i| i.email == email)
            .cloned())
    }

    async fn find_profile(&self, id: IdentityId, kind: AccountKind) -> Result<Option<Profile>, StoreError> {
        Ok(self
            .read()?
            .profiles
            .get(&id)
            .filter(|p| p.kind() == kind)
            .cloned())
    }

    async fn delete_identity(&self, id: IdentityId) -> Result<bool, StoreError> {
        let mut state = self.write()?;
        let existed = state.identities.remove(&id).is_some();
        state.profiles.remove(&id);
        state.jobs.retain(|j| j.owner_id != id);
        Ok(existed)
    }
}

#[async_trait]
impl JobStore for InMemoryStore {
    async fn insert_job(&self, new: NewJobPosting) -> Result<JobPosting, StoreError> {
        let mut state = self.write()?;
        if !state.identities.contains_key(&new.owner_id) {
            return Err(StoreError::storage(format!("owner {} does not exist", new.owner_id)));
        }
        let posting = new.into_posting();
        state.jobs.push(posting.clone());
        Ok(posting)
    }

    async fn list_jobs(&self) -> Result<Vec<JobListing>, StoreError> {
        let state = self.read()?;
        Ok(state
            .jobs
            .iter()
            .rev()
            .filter_map(|posting| {
                let owner = state.identities.get(&posting.owner_id)?;
                Some(JobListing {
                    posting: posting.clone(),
                    owner: OwnerView {
                        email: owner.email.clone(),
                        user_type: owner.kind,
                    },
                })
            })
            .collect())
    }

    async fn update_job_owned(
        &self,
        id: JobId,
        owner: IdentityId,
        patch: JobPatch,
        now: DateTime<Utc>,
    ) -> Result<Option<JobPosting>, StoreError> {
        let mut state = self.write()?;
        Ok(match state.jobs.iter_mut().find(|j| j.id == id) {
            Some(posting) if posting.owner_id == owner => {
                patch.apply_to(posting, now);
                Some(posting.clone())
            }
            _ => None,
        })
    }

    async fn delete_job_owned(&self, id: JobId, owner: IdentityId) -> Result<bool, StoreError> {
        let mut state = self.write()?;
        match state.jobs.iter().position(|j| j.id == id) {
            Some(idx) if state.jobs[idx].owner_id == owner => {
                state.jobs.remove(idx);
                Ok(true)
            }
            _ => Ok(false),
        }
    }
}
