//! Service wiring: one store instance shared by every service.

use std::sync::Arc;

use tracing::info;

use jobgate_auth::{Argon2Passwords, Hs256TokenCodec, PasswordVerifier, TokenCodec};
use jobgate_infra::{
    AppConfig, CredentialStore, IdentityResolver, InMemoryStore, JobService, JobStore,
    LoginService, PostgresStore, ProfileRegistrar, StoreError,
};

pub struct AppServices {
    pub registrar: ProfileRegistrar,
    pub login: LoginService,
    pub resolver: IdentityResolver,
    pub jobs: JobService,
}

impl AppServices {
    pub fn new<S>(store: Arc<S>, jwt_secret: &[u8]) -> Self
    where
        S: CredentialStore + JobStore + 'static,
    {
        let credentials: Arc<dyn CredentialStore> = store.clone();
        let jobs: Arc<dyn JobStore> = store;
        let passwords: Arc<dyn PasswordVerifier> = Arc::new(Argon2Passwords);
        let codec: Arc<dyn TokenCodec> = Arc::new(Hs256TokenCodec::new(jwt_secret));

        Self {
            registrar: ProfileRegistrar::new(credentials.clone(), passwords.clone()),
            login: LoginService::new(credentials.clone(), passwords, codec.clone()),
            resolver: IdentityResolver::new(codec, credentials),
            jobs: JobService::new(jobs),
        }
    }

    pub fn in_memory(jwt_secret: &str) -> Self {
        Self::new(Arc::new(InMemoryStore::new()), jwt_secret.as_bytes())
    }

    /// Postgres when `DATABASE_URL` is configured, in-memory otherwise.
    pub async fn from_config(config: &AppConfig) -> Result<Self, StoreError> {
        match &config.database_url {
            Some(url) => {
                let store = PostgresStore::connect(url).await?;
                store.ensure_schema().await?;
                info!("using postgres store");
                Ok(Self::new(Arc::new(store), config.jwt_secret.as_bytes()))
            }
            None => {
                info!("DATABASE_URL not set; using in-memory store");
                Ok(Self::in_memory(&config.jwt_secret))
            }
        }
    }
}
