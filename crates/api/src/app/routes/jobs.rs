use std::sync::Arc;

use axum::{
    extract::{
        rejection::{JsonRejection, QueryRejection},
        Extension, Query,
    },
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use chrono::Utc;
use serde_json::json;

use jobgate_core::{JobId, ServiceError};
use jobgate_infra::JobDraft;

use crate::app::dto::{JobIdQuery, ListingView, UpdateJobRequest};
use crate::app::errors;
use crate::app::services::AppServices;
use crate::middleware::{Gated, JobPosters};

fn job_id(raw: Option<String>) -> Result<JobId, ServiceError> {
    match raw {
        Some(raw) if !raw.trim().is_empty() => raw.parse(),
        _ => Err(ServiceError::validation("id is required")),
    }
}

pub async fn list_jobs(Extension(services): Extension<Arc<AppServices>>) -> axum::response::Response {
    match services.jobs.list().await {
        Ok(listings) => {
            let views: Vec<ListingView<'_>> = listings.iter().map(ListingView::from).collect();
            Json(views).into_response()
        }
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn create_job(
    Extension(services): Extension<Arc<AppServices>>,
    gate: Gated<JobPosters>,
    body: Result<Json<JobDraft>, JsonRejection>,
) -> axum::response::Response {
    let Json(draft) = match body {
        Ok(body) => body,
        Err(rejection) => return errors::json_rejection(rejection),
    };

    match services.jobs.create(&gate.actor, draft, Utc::now()).await {
        Ok(posting) => (StatusCode::CREATED, Json(posting)).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn update_job(
    Extension(services): Extension<Arc<AppServices>>,
    gate: Gated<JobPosters>,
    body: Result<Json<UpdateJobRequest>, JsonRejection>,
) -> axum::response::Response {
    let Json(req) = match body {
        Ok(body) => body,
        Err(rejection) => return errors::json_rejection(rejection),
    };
    let id = match job_id(req.id) {
        Ok(id) => id,
        Err(e) => return errors::service_error_to_response(e),
    };

    match services.jobs.update(&gate.actor, id, req.fields, Utc::now()).await {
        Ok(posting) => Json(posting).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn delete_job(
    Extension(services): Extension<Arc<AppServices>>,
    gate: Gated<JobPosters>,
    query: Result<Query<JobIdQuery>, QueryRejection>,
) -> axum::response::Response {
    let Query(query) = match query {
        Ok(query) => query,
        Err(rejection) => return errors::query_rejection(rejection),
    };
    let id = match job_id(query.id) {
        Ok(id) => id,
        Err(e) => return errors::service_error_to_response(e),
    };

    match services.jobs.delete(&gate.actor, id).await {
        Ok(()) => Json(json!({ "message": "Job deleted successfully" })).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn job_id_requires_a_uuid() {
        assert!(matches!(job_id(None), Err(ServiceError::Validation(_))));
        assert!(matches!(job_id(Some("  ".to_string())), Err(ServiceError::Validation(_))));
        assert!(matches!(job_id(Some("not-a-uuid".to_string())), Err(ServiceError::Validation(_))));

        let id = JobId::new();
        assert_eq!(job_id(Some(id.to_string())), Ok(id));
    }
}
