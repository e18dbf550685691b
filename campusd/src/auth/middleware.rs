//! The access gate: a two-stage middleware pipeline guarding protected routes.
//!
//! Stage one ([`authenticate`]) extracts the bearer token, verifies its
//! signature and expiry, and attaches the claims-derived [`AuthUser`] to the
//! request context. Stage two ([`require_instructor`]/[`require_student`])
//! checks the attached role against the route's allowed set. The stages are
//! ordered: a request with no token never reaches a role check.

use axum::{
    extract::{FromRequestParts, Request, State},
    http::{header::AUTHORIZATION, request::Parts, HeaderMap},
    middleware::Next,
    response::Response,
};
use tracing::{debug, trace};

use crate::{
    api::models::users::{AuthUser, Role},
    auth::session,
    errors::Error,
    AppState,
};

/// Verify stage.
///
/// Fails with 401 when the authorization header is absent, the token's
/// signature is invalid, or its expiry claim has passed. On success the
/// `{id, role}` pair from the token claims is attached to the request
/// context; the identity is not re-fetched from storage.
pub async fn authenticate(State(state): State<AppState>, mut request: Request, next: Next) -> Result<Response, Error> {
    let token = bearer_token(request.headers())?;
    let user = session::verify_session_token(token, &state.config)?;

    trace!("Authenticated identity {} with role {:?}", user.id, user.role);
    request.extensions_mut().insert(user);

    Ok(next.run(request).await)
}

/// Role stage: instructors only.
pub async fn require_instructor(request: Request, next: Next) -> Result<Response, Error> {
    check_role(&request, &[Role::Instructor])?;
    Ok(next.run(request).await)
}

/// Role stage: students only.
pub async fn require_student(request: Request, next: Next) -> Result<Response, Error> {
    check_role(&request, &[Role::Student])?;
    Ok(next.run(request).await)
}

fn bearer_token(headers: &HeaderMap) -> Result<&str, Error> {
    let header = headers.get(AUTHORIZATION).ok_or_else(|| Error::Unauthenticated {
        message: Some("No token, authorization denied".to_string()),
    })?;

    let value = header.to_str().map_err(|_| Error::Unauthenticated {
        message: Some("No token, authorization denied".to_string()),
    })?;

    value.strip_prefix("Bearer ").ok_or_else(|| Error::Unauthenticated {
        message: Some("No token, authorization denied".to_string()),
    })
}

fn check_role(request: &Request, allowed: &[Role]) -> Result<(), Error> {
    // The verify stage runs first and attaches the claims; a missing
    // attachment means the pipeline was assembled out of order.
    let user = request
        .extensions()
        .get::<AuthUser>()
        .ok_or(Error::Unauthenticated { message: None })?;

    if allowed.contains(&user.role) {
        Ok(())
    } else {
        debug!("Role {:?} not in allowed set {:?}", user.role, allowed);
        Err(Error::Forbidden {
            message: "Access denied".to_string(),
        })
    }
}

/// Extractor for handlers running behind the verify stage.
impl<S> FromRequestParts<S> for AuthUser
where
    S: Send + Sync,
{
    type Rejection = Error;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthUser>()
            .copied()
            .ok_or(Error::Unauthenticated { message: None })
    }
}
