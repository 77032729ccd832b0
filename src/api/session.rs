use crate::domain::auth::Identity;
use crate::domain::auth::driving_ports::{AuthError, AuthPort};
use crate::routing_utils::AuthErrorResponse;
use crate::{SharedData, domain, persistence};
use axum::async_trait;
use axum::extract::FromRequestParts;
use axum::http::HeaderMap;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use axum::response::{IntoResponse, Response};
use std::sync::Arc;
use tracing::debug;

/// The user a request was made by, established from the "Authorization: Bearer <token>" header.
/// Handlers which take this extractor reject unauthenticated requests with a 401 before running.
pub struct CurrentUser(pub Identity);

/// Pulls the session token out of the request's Authorization header, if one was sent
fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    headers
        .get(AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

#[async_trait]
impl FromRequestParts<Arc<SharedData>> for CurrentUser {
    type Rejection = Response;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<SharedData>,
    ) -> Result<Self, Self::Rejection> {
        let Some(token) = bearer_token(&parts.headers) else {
            debug!("Request arrived without a session token");
            return Err(AuthErrorResponse::from(AuthError::Unauthenticated("no token")).into_response());
        };

        let mut ext_cxn = state.ext_cxn.clone();
        let user_reader = persistence::db_user_driven_ports::DbReadUsers;
        let auth_service = domain::auth::AuthService {};

        let identity = auth_service
            .authenticate(token, &mut ext_cxn, &user_reader, &state.session_tokens)
            .await
            .map_err(|err| AuthErrorResponse::from(err).into_response())?;

        Ok(CurrentUser(identity))
    }
}
