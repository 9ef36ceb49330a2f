//! Job postings: public listing, owner-gated mutation.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Deserialize;
use tracing::{info, instrument};

use jobgate_auth::{authorize, Actor, JOB_POSTER_KINDS, MAX_COUNT};
use jobgate_core::{JobId, ServiceError, ServiceResult};

use crate::store::{JobListing, JobPatch, JobPosting, JobStore, NewJobPosting};

/// Business fields of a posting as supplied by a caller. Owner and timestamps
/// are never taken from here.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JobDraft {
    pub title: Option<String>,
    pub vacancies: Option<u32>,
    pub location: Option<String>,
    pub duration: Option<String>,
    pub compensation: Option<String>,
    pub contact: Option<String>,
}

fn required(field: &str, value: Option<String>) -> ServiceResult<String> {
    match value.map(|v| v.trim().to_string()) {
        Some(v) if !v.is_empty() => Ok(v),
        _ => Err(ServiceError::validation(format!("{field} is required"))),
    }
}

fn optional(field: &str, value: Option<String>) -> ServiceResult<Option<String>> {
    value.map(|v| required(field, Some(v))).transpose()
}

fn vacancies(value: u32) -> ServiceResult<u32> {
    if value == 0 {
        Err(ServiceError::validation("vacancies must be at least 1"))
    } else if value > MAX_COUNT {
        Err(ServiceError::validation(format!("vacancies must be at most {MAX_COUNT}")))
    } else {
        Ok(value)
    }
}

impl JobDraft {
    fn into_patch(self) -> ServiceResult<JobPatch> {
        Ok(JobPatch {
            title: optional("title", self.title)?,
            vacancies: self.vacancies.map(vacancies).transpose()?,
            location: optional("location", self.location)?,
            duration: optional("duration", self.duration)?,
            compensation: optional("compensation", self.compensation)?,
            contact: optional("contact", self.contact)?,
        })
    }
}

pub struct JobService {
    store: Arc<dyn JobStore>,
}

impl JobService {
    pub fn new(store: Arc<dyn JobStore>) -> Self {
        Self { store }
    }

    fn ensure_poster(actor: &Actor) -> ServiceResult<()> {
        authorize(actor, JOB_POSTER_KINDS).map_err(|_| ServiceError::Forbidden)
    }

    /// Create a posting owned by `actor`.
    #[instrument(skip(self, actor, draft), fields(actor_id = %actor.id), err)]
    pub async fn create(&self, actor: &Actor, draft: JobDraft, now: DateTime<Utc>) -> ServiceResult<JobPosting> {
        Self::ensure_poster(actor)?;

        let new = NewJobPosting {
            id: JobId::new(),
            owner_id: actor.id,
            title: required("title", draft.title)?,
            vacancies: vacancies(
                draft
                    .vacancies
                    .ok_or_else(|| ServiceError::validation("vacancies is required"))?,
            )?,
            location: required("location", draft.location)?,
            duration: required("duration", draft.duration)?,
            compensation: required("compensation", draft.compensation)?,
            contact: required("contact", draft.contact)?,
            created_at: now,
        };

        let posting = self.store.insert_job(new).await?;
        info!(job_id = %posting.id, owner_id = %posting.owner_id, "job posting created");
        Ok(posting)
    }

    pub async fn list(&self) -> ServiceResult<Vec<JobListing>> {
        Ok(self.store.list_jobs().await?)
    }

    /// A posting that does not exist and one owned by someone else fail the same way.
    #[instrument(skip(self, actor, draft), fields(actor_id = %actor.id), err)]
    pub async fn update(
        &self,
        actor: &Actor,
        id: JobId,
        draft: JobDraft,
        now: DateTime<Utc>,
    ) -> ServiceResult<JobPosting> {
        Self::ensure_poster(actor)?;

        let patch = draft.into_patch()?;
        if patch.is_empty() {
            return Err(ServiceError::validation("no fields to update"));
        }

        self.store
            .update_job_owned(id, actor.id, patch, now)
            .await?
            .ok_or(ServiceError::NotFoundOrUnauthorized)
    }

    #[instrument(skip(self, actor), fields(actor_id = %actor.id), err)]
    pub async fn delete(&self, actor: &Actor, id: JobId) -> ServiceResult<()> {
        Self::ensure_poster(actor)?;

        if self.store.delete_job_owned(id, actor.id).await? {
            info!(job_id = %id, "job posting deleted");
            Ok(())
        } else {
            Err(ServiceError::NotFoundOrUnauthorized)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use jobgate_auth::{AccountKind, InstitutionProfile, Profile};
    use jobgate_core::IdentityId;

    use crate::store::{CredentialStore, InMemoryStore, NewIdentity};

    async fn member(store: &InMemoryStore, name: &str) -> Actor {
        let identity = store
            .create_identity(NewIdentity {
                id: IdentityId::new(),
                username: name.to_string(),
                email: format!("{name}@example.com"),
                password_hash: "$argon2id$stub".to_string(),
                profile: Profile::Institution(InstitutionProfile {
                    name: format!("{name} school"),
                    location: "Oslo".to_string(),
                    founding_year: 1990,
                    accreditation: "NEASC".to_string(),
                }),
            })
            .await
            .unwrap();
        Actor::new(identity.id, identity.email, identity.kind)
    }

    fn draft() -> JobDraft {
        JobDraft {
            title: Some("Math teacher".to_string()),
            vacancies: Some(2),
            location: Some("Remote".to_string()),
            duration: Some("6 months".to_string()),
            compensation: Some("$40/h".to_string()),
            contact: Some("jobs@example.com".to_string()),
        }
    }

    fn setup() -> (JobService, Arc<InMemoryStore>) {
        let store = Arc::new(InMemoryStore::new());
        (JobService::new(store.clone()), store)
    }

    #[tokio::test]
    async fn contractors_cannot_post() {
        let (jobs, _) = setup();
        let contractor = Actor::new(IdentityId::new(), "c@example.com", AccountKind::Contractor);
        assert_eq!(
            jobs.create(&contractor, draft(), Utc::now()).await.unwrap_err(),
            ServiceError::Forbidden
        );
    }

    #[tokio::test]
    async fn owner_is_the_actor() {
        let (jobs, store) = setup();
        let actor = member(&store, "north").await;
        let posting = jobs.create(&actor, draft(), Utc::now()).await.unwrap();
        assert_eq!(posting.owner_id, actor.id);

        let listed = jobs.list().await.unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].owner.email, "north@example.com");
        assert_eq!(listed[0].owner.user_type, AccountKind::Institution);
    }

    #[tokio::test]
    async fn create_requires_every_field() {
        let (jobs, store) = setup();
        let actor = member(&store, "north").await;

        let mut blank = draft();
        blank.title = Some("   ".to_string());
        assert!(matches!(jobs.create(&actor, blank, Utc::now()).await, Err(ServiceError::Validation(_))));

        let mut zero = draft();
        zero.vacancies = Some(0);
        assert!(matches!(jobs.create(&actor, zero, Utc::now()).await, Err(ServiceError::Validation(_))));

        let mut missing = draft();
        missing.contact = None;
        assert!(matches!(jobs.create(&actor, missing, Utc::now()).await, Err(ServiceError::Validation(_))));
    }

    #[tokio::test]
    async fn vacancies_beyond_the_storage_range_are_rejected() {
        let (jobs, store) = setup();
        let actor = member(&store, "north").await;

        let mut huge = draft();
        huge.vacancies = Some(3_000_000_000);
        assert!(matches!(jobs.create(&actor, huge, Utc::now()).await, Err(ServiceError::Validation(_))));
        assert!(jobs.list().await.unwrap().is_empty());

        let posting = jobs.create(&actor, draft(), Utc::now()).await.unwrap();
        let patch = JobDraft {
            vacancies: Some(MAX_COUNT + 1),
            ..JobDraft::default()
        };
        assert!(matches!(
            jobs.update(&actor, posting.id, patch, Utc::now()).await,
            Err(ServiceError::Validation(_))
        ));
        assert_eq!(jobs.list().await.unwrap()[0].posting.vacancies, 2);
    }

    #[tokio::test]
    async fn non_owner_and_missing_id_are_indistinguishable() {
        let (jobs, store) = setup();
        let owner = member(&store, "owner").await;
        let other = member(&store, "other").await;
        let posting = jobs.create(&owner, draft(), Utc::now()).await.unwrap();

        let patch = JobDraft {
            title: Some("Hijacked".to_string()),
            ..JobDraft::default()
        };
        let foreign = jobs.update(&other, posting.id, patch.clone(), Utc::now()).await.unwrap_err();
        let missing = jobs.update(&other, JobId::new(), patch, Utc::now()).await.unwrap_err();
        assert_eq!(foreign, ServiceError::NotFoundOrUnauthorized);
        assert_eq!(foreign.to_string(), missing.to_string());

        assert_eq!(
            jobs.delete(&other, posting.id).await.unwrap_err(),
            jobs.delete(&other, JobId::new()).await.unwrap_err()
        );
        assert_eq!(jobs.list().await.unwrap()[0].posting.title, "Math teacher");
    }

    #[tokio::test]
    async fn owner_updates_merge_and_refresh_timestamp() {
        let (jobs, store) = setup();
        let owner = member(&store, "owner").await;
        let created_at = Utc::now();
        let posting = jobs.create(&owner, draft(), created_at).await.unwrap();

        let later = created_at + chrono::Duration::minutes(5);
        let updated = jobs
            .update(
                &owner,
                posting.id,
                JobDraft {
                    vacancies: Some(5),
                    ..JobDraft::default()
                },
                later,
            )
            .await
            .unwrap();
        assert_eq!(updated.vacancies, 5);
        assert_eq!(updated.title, "Math teacher");
        assert_eq!(updated.created_at, created_at);
        assert_eq!(updated.updated_at, later);

        assert!(matches!(
            jobs.update(&owner, posting.id, JobDraft::default(), later).await,
            Err(ServiceError::Validation(_))
        ));

        jobs.delete(&owner, posting.id).await.unwrap();
        assert!(jobs.list().await.unwrap().is_empty());
    }
}
