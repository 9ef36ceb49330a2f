use axum::{
    routing::{get, post},
    Router,
};

pub mod auth;
pub mod jobs;
pub mod system;

pub fn router() -> Router {
    Router::new()
        .route("/health", get(system::health))
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
        .route("/auth/me", get(auth::me))
        .route(
            "/jobs",
            get(jobs::list_jobs)
                .post(jobs::create_job)
                .put(jobs::update_job)
                .delete(jobs::delete_job),
        )
}
