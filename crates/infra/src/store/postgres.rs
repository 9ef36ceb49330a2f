//! Postgres-backed credential + job store.
//!
//! Layout: one `identities` base table, one extension table per account kind
//! keyed by `identity_id`, and `job_postings`. Extension and posting rows
//! cascade with their identity.
//!
//! ## Error Mapping
//!
//! | SQLx Error | PostgreSQL Code | StoreError |
//! |------------|-----------------|------------|
//! | Database (unique violation) | `23505` | `Conflict(Username \| Email)` by constraint name |
//! | Database (other) | any | `Storage` |
//! | PoolClosed / Io / other | N/A | `Storage` |

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::postgres::PgRow;
use sqlx::{PgPool, Postgres, Row, Transaction};
use tracing::instrument;

use jobgate_auth::{AccountKind, AgencyProfile, ContractorProfile, InstitutionProfile, Profile};
use jobgate_core::{IdentityId, JobId};

use super::r#trait::{
    CredentialStore, Identity, JobListing, JobPatch, JobPosting, JobStore, NewIdentity,
    NewJobPosting, OwnerView, StoreError, UniqueKey,
};

const SCHEMA: &str = r#"
CREATE TABLE IF NOT EXISTS identities (
    id              UUID PRIMARY KEY,
    username        TEXT NOT NULL,
    email           TEXT NOT NULL,
    password_hash   TEXT NOT NULL,
    kind            TEXT NOT NULL CHECK (kind IN ('INSTITUTION', 'AGENCY', 'CONTRACTOR')),
    created_at      TIMESTAMPTZ NOT NULL DEFAULT NOW(),
    CONSTRAINT identities_username_key UNIQUE (username),
    CONSTRAINT identities_email_key UNIQUE (email)
);

CREATE TABLE IF NOT EXISTS institution_profiles (
    identity_id     UUID PRIMARY KEY REFERENCES identities(id) ON DELETE CASCADE,
    name            TEXT NOT NULL,
    location        TEXT NOT NULL,
    founding_year   INTEGER NOT NULL,
    accreditation   TEXT NOT NULL
);

CREATE TABLE IF NOT EXISTS agency_profiles (
    identity_id      UUID PRIMARY KEY REFERENCES identities(id) ON DELETE CASCADE,
    agency_name      TEXT NOT NULL,
    license_number   TEXT NOT NULL,
    specialization   TEXT NOT NULL,
    years_experience INTEGER NOT NULL CHECK (years_experience >= 0)
);

CREATE TABLE IF NOT EXISTS contractor_profiles (
    identity_id      UUID PRIMARY KEY REFERENCES identities(id) ON DELETE CASCADE,
    expertise        TEXT NOT NULL,
    certification    TEXT NOT NULL,
    available_hours  INTEGER NOT NULL CHECK (available_hours >= 0),
    hourly_rate      DOUBLE PRECISION NOT NULL CHECK (hourly_rate >= 0)
);

CREATE TABLE IF NOT EXISTS job_postings (
    id              UUID PRIMARY KEY,
    owner_id        UUID NOT NULL REFERENCES identities(id) ON DELETE CASCADE,
    title           TEXT NOT NULL,
    vacancies       INTEGER NOT NULL CHECK (vacancies > 0),
    location        TEXT NOT NULL,
    duration        TEXT NOT NULL,
    compensation    TEXT NOT NULL,
    contact         TEXT NOT NULL,
    created_at      TIMESTAMPTZ NOT NULL,
    updated_at      TIMESTAMPTZ NOT NULL
);

CREATE INDEX IF NOT EXISTS idx_job_postings_owner ON job_postings (owner_id);
"#;

const JOB_COLUMNS: &str =
    "j.id, j.owner_id, j.title, j.vacancies, j.location, j.duration, j.compensation, j.contact, j.created_at, j.updated_at";

/// Postgres-backed store.
///
/// Uses the SQLx connection pool (`Send + Sync`). Identity creation runs in a
/// transaction; ownership-gated writes are single conditional statements.
#[derive(Debug, Clone)]
pub struct PostgresStore {
    pool: Arc<PgPool>,
}

impl PostgresStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool: Arc::new(pool) }
    }

    /// Connect using a `postgres://` URL.
    pub async fn connect(url: &str) -> Result<Self, StoreError> {
        let pool = PgPool::connect(url)
            .await
            .map_err(|e| map_sqlx_error("connect", e))?;
        Ok(Self::new(pool))
    }

    /// Create tables and indices if they do not exist yet. Idempotent.
    #[instrument(skip(self), err)]
    pub async fn ensure_schema(&self) -> Result<(), StoreError> {
        sqlx::raw_sql(SCHEMA)
            .execute(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("ensure_schema", e))?;
        Ok(())
    }
}

async fn insert_profile(
    tx: &mut Transaction<'_, Postgres>,
    id: IdentityId,
    profile: &Profile,
) -> Result<(), sqlx::Error> {
    match profile {
        Profile::Institution(p) => {
            sqlx::query(
                "INSERT INTO institution_profiles (identity_id, name, location, founding_year, accreditation) \
                 VALUES ($1, $2, $3, $4, $5)",
            )
            .bind(id.as_uuid())
            .bind(&p.name)
            .bind(&p.location)
            .bind(p.founding_year)
            .bind(&p.accreditation)
            .execute(&mut **tx)
            .await?;
        }
        Profile::Agency(p) => {
            sqlx::query(
                "INSERT INTO agency_profiles (identity_id, agency_name, license_number, specialization, years_experience) \
                 VALUES ($1, $2, $3, $4, $5)",
            )
            .bind(id.as_uuid())
            .bind(&p.agency_name)
            .bind(&p.license_number)
            .bind(&p.specialization)
            .bind(to_column(p.years_experience, "years_experience")?)
            .execute(&mut **tx)
            .await?;
        }
        Profile::Contractor(p) => {
            sqlx::query(
                "INSERT INTO contractor_profiles (identity_id, expertise, certification, available_hours, hourly_rate) \
                 VALUES ($1, $2, $3, $4, $5)",
            )
            .bind(id.as_uuid())
            .bind(p.expertise_column())
            .bind(&p.certification)
            .bind(to_column(p.available_hours, "available_hours")?)
            .bind(p.hourly_rate)
            .execute(&mut **tx)
            .await?;
        }
    }
    Ok(())
}

#[async_trait]
impl CredentialStore for PostgresStore {
    #[instrument(skip(self, email), err)]
    async fn identity_taken(&self, username: &str, email: &str) -> Result<Option<UniqueKey>, StoreError> {
        let row = sqlx::query(
            "SELECT (username = $1) AS username_taken FROM identities \
             WHERE username = $1 OR email = $2 \
             ORDER BY (username = $1) DESC LIMIT 1",
        )
        .bind(username)
        .bind(email)
        .fetch_optional(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("identity_taken", e))?;

        match row {
            Some(row) => {
                let username_taken: bool = row
                    .try_get("username_taken")
                    .map_err(|e| map_sqlx_error("identity_taken", e))?;
                Ok(Some(if username_taken { UniqueKey::Username } else { UniqueKey::Email }))
            }
            None => Ok(None),
        }
    }

    #[instrument(skip(self, new), fields(identity_id = %new.id, kind = %new.kind()), err)]
    async fn create_identity(&self, new: NewIdentity) -> Result<Identity, StoreError> {
        let mut tx = self
            .pool
            .begin()
            .await
            .map_err(|e| map_sqlx_error("begin_transaction", e))?;

        sqlx::query(
            "INSERT INTO identities (id, username, email, password_hash, kind) VALUES ($1, $2, $3, $4, $5)",
        )
        .bind(new.id.as_uuid())
        .bind(&new.username)
        .bind(&new.email)
        .bind(&new.password_hash)
        .bind(new.kind().as_str())
        .execute(&mut *tx)
        .await
        .map_err(|e| map_sqlx_error("insert_identity", e))?;

        // Dropping `tx` on error rolls the identity row back.
        insert_profile(&mut tx, new.id, &new.profile)
            .await
            .map_err(|e| map_sqlx_error("insert_profile", e))?;

        tx.commit()
            .await
            .map_err(|e| map_sqlx_error("commit_transaction", e))?;

        Ok(new.to_identity())
    }

    #[instrument(skip(self), err)]
    async fn find_identity(&self, id: IdentityId) -> Result<Option<Identity>, StoreError> {
        let row = sqlx::query("SELECT id, username, email, password_hash, kind FROM identities WHERE id = $1")
            .bind(id.as_uuid())
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("find_identity", e))?;
        row.as_ref().map(identity_from_row).transpose()
    }

    #[instrument(skip(self, email), err)]
    async fn find_identity_by_email(&self, email: &str) -> Result<Option<Identity>, StoreError> {
        let row = sqlx::query("SELECT id, username, email, password_hash, kind FROM identities WHERE email = $1")
            .bind(email)
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("find_identity_by_email", e))?;
        row.as_ref().map(identity_from_row).transpose()
    }

    #[instrument(skip(self), err)]
    async fn find_profile(&self, id: IdentityId, kind: AccountKind) -> Result<Option<Profile>, StoreError> {
        let sql = match kind {
            AccountKind::Institution => {
                "SELECT name, location, founding_year, accreditation FROM institution_profiles WHERE identity_id = $1"
            }
            AccountKind::Agency => {
                "SELECT agency_name, license_number, specialization, years_experience FROM agency_profiles WHERE identity_id = $1"
            }
            AccountKind::Contractor => {
                "SELECT expertise, certification, available_hours, hourly_rate FROM contractor_profiles WHERE identity_id = $1"
            }
        };

        let row = sqlx::query(sql)
            .bind(id.as_uuid())
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("find_profile", e))?;

        match row {
            Some(row) => profile_from_row(kind, &row)
                .map(Some)
                .map_err(|e| map_sqlx_error("find_profile", e)),
            None => Ok(None),
        }
    }

    #[instrument(skip(self), err)]
    async fn delete_identity(&self, id: IdentityId) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM identities WHERE id = $1")
            .bind(id.as_uuid())
            .execute(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("delete_identity", e))?;
        Ok(result.rows_affected() > 0)
    }
}

#[async_trait]
impl JobStore for PostgresStore {
    #[instrument(skip(self, new), fields(job_id = %new.id, owner_id = %new.owner_id), err)]
    async fn insert_job(&self, new: NewJobPosting) -> Result<JobPosting, StoreError> {
        let vacancies = to_column(new.vacancies, "vacancies").map_err(|e| map_sqlx_error("insert_job", e))?;
        sqlx::query(
            "INSERT INTO job_postings \
             (id, owner_id, title, vacancies, location, duration, compensation, contact, created_at, updated_at) \
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $9)",
        )
        .bind(new.id.as_uuid())
        .bind(new.owner_id.as_uuid())
        .bind(&new.title)
        .bind(vacancies)
        .bind(&new.location)
        .bind(&new.duration)
        .bind(&new.compensation)
        .bind(&new.contact)
        .bind(new.created_at)
        .execute(&*self.pool)
        .await
        .map_err(|e| map_sqlx_error("insert_job", e))?;

        Ok(new.into_posting())
    }

    #[instrument(skip(self), err)]
    async fn list_jobs(&self) -> Result<Vec<JobListing>, StoreError> {
        let sql = format!(
            "SELECT {JOB_COLUMNS}, i.email AS owner_email, i.kind AS owner_kind \
             FROM job_postings j JOIN identities i ON i.id = j.owner_id \
             ORDER BY j.created_at DESC, j.id DESC"
        );
        let rows = sqlx::query(&sql)
            .fetch_all(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("list_jobs", e))?;

        let mut listings = Vec::with_capacity(rows.len());
        for row in &rows {
            let posting = posting_from_row(row).map_err(|e| map_sqlx_error("list_jobs", e))?;
            let email: String = row.try_get("owner_email").map_err(|e| map_sqlx_error("list_jobs", e))?;
            let kind: String = row.try_get("owner_kind").map_err(|e| map_sqlx_error("list_jobs", e))?;
            listings.push(JobListing {
                posting,
                owner: OwnerView {
                    email,
                    user_type: parse_kind(&kind)?,
                },
            });
        }
        Ok(listings)
    }

    #[instrument(skip(self, patch), err)]
    async fn update_job_owned(
        &self,
        id: JobId,
        owner: IdentityId,
        patch: JobPatch,
        now: DateTime<Utc>,
    ) -> Result<Option<JobPosting>, StoreError> {
        let vacancies = patch
            .vacancies
            .map(|v| to_column(v, "vacancies"))
            .transpose()
            .map_err(|e| map_sqlx_error("update_job_owned", e))?;
        let sql = format!(
            "UPDATE job_postings j SET \
               title = COALESCE($3, j.title), \
               vacancies = COALESCE($4, j.vacancies), \
               location = COALESCE($5, j.location), \
               duration = COALESCE($6, j.duration), \
               compensation = COALESCE($7, j.compensation), \
               contact = COALESCE($8, j.contact), \
               updated_at = $9 \
             WHERE j.id = $1 AND j.owner_id = $2 \
             RETURNING {JOB_COLUMNS}"
        );
        let row = sqlx::query(&sql)
            .bind(id.as_uuid())
            .bind(owner.as_uuid())
            .bind(patch.title)
            .bind(vacancies)
            .bind(patch.location)
            .bind(patch.duration)
            .bind(patch.compensation)
            .bind(patch.contact)
            .bind(now)
            .fetch_optional(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("update_job_owned", e))?;

        row.as_ref()
            .map(posting_from_row)
            .transpose()
            .map_err(|e| map_sqlx_error("update_job_owned", e))
    }

    #[instrument(skip(self), err)]
    async fn delete_job_owned(&self, id: JobId, owner: IdentityId) -> Result<bool, StoreError> {
        let result = sqlx::query("DELETE FROM job_postings WHERE id = $1 AND owner_id = $2")
            .bind(id.as_uuid())
            .bind(owner.as_uuid())
            .execute(&*self.pool)
            .await
            .map_err(|e| map_sqlx_error("delete_job_owned", e))?;
        Ok(result.rows_affected() > 0)
    }
}

fn parse_kind(raw: &str) -> Result<AccountKind, StoreError> {
    raw.parse()
        .map_err(|e| StoreError::storage(format!("corrupt identity kind: {e}")))
}

fn non_negative(value: i32, column: &str) -> Result<u32, sqlx::Error> {
    u32::try_from(value).map_err(|_| sqlx::Error::ColumnDecode {
        index: column.to_string(),
        source: format!("negative value {value}").into(),
    })
}

/// Counts are `u32` in the domain and `INTEGER` in the schema.
fn to_column(value: u32, column: &str) -> Result<i32, sqlx::Error> {
    i32::try_from(value).map_err(|_| sqlx::Error::Encode(format!("{column} {value} exceeds INTEGER range").into()))
}

fn identity_from_row(row: &PgRow) -> Result<Identity, StoreError> {
    let decode = |e| map_sqlx_error("decode_identity", e);
    let kind: String = row.try_get("kind").map_err(decode)?;
    Ok(Identity {
        id: IdentityId::from_uuid(row.try_get("id").map_err(decode)?),
        username: row.try_get("username").map_err(decode)?,
        email: row.try_get("email").map_err(decode)?,
        password_hash: row.try_get("password_hash").map_err(decode)?,
        kind: parse_kind(&kind)?,
    })
}

fn profile_from_row(kind: AccountKind, row: &PgRow) -> Result<Profile, sqlx::Error> {
    Ok(match kind {
        AccountKind::Institution => Profile::Institution(InstitutionProfile {
            name: row.try_get("name")?,
            location: row.try_get("location")?,
            founding_year: row.try_get("founding_year")?,
            accreditation: row.try_get("accreditation")?,
        }),
        AccountKind::Agency => Profile::Agency(AgencyProfile {
            agency_name: row.try_get("agency_name")?,
            license_number: row.try_get("license_number")?,
            specialization: row.try_get("specialization")?,
            years_experience: non_negative(row.try_get("years_experience")?, "years_experience")?,
        }),
        AccountKind::Contractor => {
            let expertise: String = row.try_get("expertise")?;
            Profile::Contractor(ContractorProfile {
                expertise: ContractorProfile::split_expertise(&expertise),
                certification: row.try_get("certification")?,
                available_hours: non_negative(row.try_get("available_hours")?, "available_hours")?,
                hourly_rate: row.try_get("hourly_rate")?,
            })
        }
    })
}

fn posting_from_row(row: &PgRow) -> Result<JobPosting, sqlx::Error> {
    Ok(JobPosting {
        id: JobId::from_uuid(row.try_get("id")?),
        owner_id: IdentityId::from_uuid(row.try_get("owner_id")?),
        title: row.try_get("title")?,
        vacancies: non_negative(row.try_get("vacancies")?, "vacancies")?,
        location: row.try_get("location")?,
        duration: row.try_get("duration")?,
        compensation: row.try_get("compensation")?,
        contact: row.try_get("contact")?,
        created_at: row.try_get("created_at")?,
        updated_at: row.try_get("updated_at")?,
    })
}

/// Which unique key a `23505` violated. `identities` carries only the
/// username and email constraints.
fn conflict_key(constraint: Option<&str>) -> UniqueKey {
    match constraint {
        Some(c) if c.contains("username") => UniqueKey::Username,
        _ => UniqueKey::Email,
    }
}

/// Map SQLx errors to store errors.
fn map_sqlx_error(operation: &str, err: sqlx::Error) -> StoreError {
    if let sqlx::Error::Database(db_err) = &err {
        if db_err.code().as_deref() == Some("23505") {
            return StoreError::Conflict(conflict_key(db_err.constraint()));
        }
        return StoreError::storage(format!("database error in {operation}: {}", db_err.message()));
    }
    StoreError::storage(format!("{operation}: {err}"))
}
