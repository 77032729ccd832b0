use crate::domain::auth::driven_ports::SessionTokens;
use crate::domain::auth::driving_ports::AuthPort;
use crate::external_connections::ExternalConnectivity;
use crate::routing_utils::{ApiResponse, AuthErrorResponse, BasicErrorResponse, Json};
use crate::{AppState, SharedData, domain, dto, persistence, security};
use axum::Router;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::ErrorResponse;
use axum::routing::post;
use std::sync::Arc;
use tracing::info;
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(paths(register, login))]
/// Defines the OpenAPI documentation for the authentication API
pub struct AuthApi;
/// Constant used to group authentication endpoints in OpenAPI documentation
pub const AUTH_API_GROUP: &str = "Authentication";

/// Builds a router for registering and logging in. These are the only routes which don't need a session.
pub fn auth_routes() -> Router<Arc<SharedData>> {
    Router::new()
        .route(
            "/auth/register",
            post(
                |State(app_state): AppState, Json(new_user): Json<dto::auth::RegisterUser>| async move {
                    let mut ext_cxn = app_state.ext_cxn.clone();
                    let auth_service = domain::auth::AuthService {};

                    register(new_user, &mut ext_cxn, &auth_service, &app_state.session_tokens).await
                },
            ),
        )
        .route(
            "/auth/login",
            post(
                |State(app_state): AppState, Json(credentials): Json<dto::auth::Credentials>| async move {
                    let mut ext_cxn = app_state.ext_cxn.clone();
                    let auth_service = domain::auth::AuthService {};

                    login(credentials, &mut ext_cxn, &auth_service, &app_state.session_tokens).await
                },
            ),
        )
}

#[utoipa::path(
    post,
    path = "/api/auth/register",
    tag = AUTH_API_GROUP,
    request_body = dto::auth::RegisterUser,
    responses(
        (status = 201, description = "Account created, session token issued", body = dto::auth::AuthenticatedUser),
        (status = 400, response = BasicErrorResponse),
        (status = 500, response = BasicErrorResponse),
    ),
)]
#[tracing::instrument(skip_all)]
/// Creates an account and signs the new user in
async fn register(
    new_user: dto::auth::RegisterUser,
    ext_cxn: &mut impl ExternalConnectivity,
    auth_service: &impl AuthPort,
    session_tokens: &impl SessionTokens,
) -> Result<(StatusCode, ApiResponse<dto::auth::AuthenticatedUser>), ErrorResponse> {
    info!("Registering user {new_user}");
    let new_user = domain::user::NewUser::from(new_user);
    let user_detect = persistence::db_user_driven_ports::DbDetectUser;
    let user_write = persistence::db_user_driven_ports::DbWriteUsers;
    let hasher = security::password_driven_ports::Argon2PasswordHasher;

    let session = auth_service
        .register(
            &new_user,
            &mut *ext_cxn,
            &user_detect,
            &user_write,
            &hasher,
            session_tokens,
        )
        .await
        .map_err(AuthErrorResponse::from)?;

    Ok((
        StatusCode::CREATED,
        ApiResponse::of(dto::auth::AuthenticatedUser::from(session)),
    ))
}

#[utoipa::path(
    post,
    path = "/api/auth/login",
    tag = AUTH_API_GROUP,
    request_body = dto::auth::Credentials,
    responses(
        (status = 200, description = "Credentials accepted, session token issued", body = dto::auth::AuthenticatedUser),
        (status = 401, response = BasicErrorResponse),
        (status = 500, response = BasicErrorResponse),
    ),
)]
#[tracing::instrument(skip_all)]
/// Exchanges an email and password for a session token
async fn login(
    credentials: dto::auth::Credentials,
    ext_cxn: &mut impl ExternalConnectivity,
    auth_service: &impl AuthPort,
    session_tokens: &impl SessionTokens,
) -> Result<ApiResponse<dto::auth::AuthenticatedUser>, ErrorResponse> {
    let user_read = persistence::db_user_driven_ports::DbReadUsers;
    let hasher = security::password_driven_ports::Argon2PasswordHasher;

    let session = auth_service
        .login(
            &credentials.email,
            &credentials.password,
            &mut *ext_cxn,
            &user_read,
            &hasher,
            session_tokens,
        )
        .await
        .map_err(AuthErrorResponse::from)?;
    info!(user_id = session.identity.id, "User logged in");

    Ok(ApiResponse::of(dto::auth::AuthenticatedUser::from(session)))
}
