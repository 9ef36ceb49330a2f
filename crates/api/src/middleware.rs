//! Access gate.
//!
//! [`Gated<P>`] is an extractor: it reads the bearer token, resolves it to a
//! store-confirmed actor and checks the actor's kind against `P`. Handlers
//! receive the actor as an argument; nothing is written into the request.

use std::marker::PhantomData;
use std::sync::Arc;

use axum::{
    extract::FromRequestParts,
    http::{request::Parts, HeaderMap},
    response::Response,
};
use chrono::Utc;

use jobgate_auth::{authorize, AccountKind, Actor, JOB_POSTER_KINDS};
use jobgate_core::ServiceError;

use crate::app::errors::service_error_to_response;
use crate::app::services::AppServices;

/// Kind allow-list attached to a route at the type level.
pub trait KindPolicy: Send + Sync + 'static {
    /// Empty admits every authenticated kind.
    const ALLOWED: &'static [AccountKind];
}

/// Any authenticated identity.
pub struct AnyKind;

impl KindPolicy for AnyKind {
    const ALLOWED: &'static [AccountKind] = &[];
}

/// Institutions and agencies.
pub struct JobPosters;

impl KindPolicy for JobPosters {
    const ALLOWED: &'static [AccountKind] = JOB_POSTER_KINDS;
}

/// Authenticated actor admitted by policy `P`.
pub struct Gated<P> {
    pub actor: Actor,
    _policy: PhantomData<fn() -> P>,
}

impl<P> Gated<P> {
    pub fn into_actor(self) -> Actor {
        self.actor
    }
}

#[axum::async_trait]
impl<S, P> FromRequestParts<S> for Gated<P>
where
    S: Send + Sync,
    P: KindPolicy,
{
    type Rejection = Response;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let services = parts
            .extensions
            .get::<Arc<AppServices>>()
            .cloned()
            .ok_or_else(|| service_error_to_response(ServiceError::internal("services extension missing")))?;

        let token = extract_bearer(&parts.headers)
            .map_err(|_| service_error_to_response(ServiceError::Unauthenticated))?;

        let actor = services
            .resolver
            .resolve(token, Utc::now())
            .await
            .map_err(service_error_to_response)?
            .ok_or_else(|| service_error_to_response(ServiceError::InvalidToken))?;

        authorize(&actor, P::ALLOWED).map_err(|e| {
            tracing::debug!(actor_id = %actor.id, error = %e, "kind not allowed");
            service_error_to_response(ServiceError::Forbidden)
        })?;

        Ok(Self {
            actor,
            _policy: PhantomData,
        })
    }
}

/// Token from an `Authorization: Bearer <token>` header.
pub fn extract_bearer(headers: &HeaderMap) -> Result<&str, ServiceError> {
    let header = headers
        .get(axum::http::header::AUTHORIZATION)
        .ok_or(ServiceError::Unauthenticated)?;

    let header = header.to_str().map_err(|_| ServiceError::Unauthenticated)?;

    let header = header
        .strip_prefix("Bearer ")
        .ok_or(ServiceError::Unauthenticated)?;

    let token = header.trim();
    if token.is_empty() {
        return Err(ServiceError::Unauthenticated);
    }

    Ok(token)
}
