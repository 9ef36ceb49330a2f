use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, Extension},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use chrono::Utc;

use jobgate_infra::Registration;

use crate::app::dto::{self, ActorView, LoginRequest};
use crate::app::errors;
use crate::app::services::AppServices;
use crate::middleware::{AnyKind, Gated};

pub async fn register(
    Extension(services): Extension<Arc<AppServices>>,
    body: Result<Json<Registration>, JsonRejection>,
) -> axum::response::Response {
    let Json(reg) = match body {
        Ok(body) => body,
        Err(rejection) => return errors::json_rejection(rejection),
    };

    match services.registrar.register(reg, Utc::now()).await {
        Ok(registered) => (
            StatusCode::CREATED,
            Json(dto::registered_to_json(&registered.identity, &registered.profile)),
        )
            .into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

pub async fn login(
    Extension(services): Extension<Arc<AppServices>>,
    body: Result<Json<LoginRequest>, JsonRejection>,
) -> axum::response::Response {
    let Json(req) = match body {
        Ok(body) => body,
        Err(rejection) => return errors::json_rejection(rejection),
    };

    match services.login.login(&req.email, &req.password, Utc::now()).await {
        Ok(out) => Json(dto::login_to_json(&out.token, &out.identity, &out.profile)).into_response(),
        Err(e) => errors::service_error_to_response(e),
    }
}

/// The caller as the store currently knows it.
pub async fn me(gate: Gated<AnyKind>) -> Json<ActorView> {
    Json(gate.into_actor().into())
}
