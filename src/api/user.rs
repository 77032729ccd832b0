use crate::api::session::CurrentUser;
use crate::domain::auth::Identity;
use crate::domain::user::driving_ports::UserPort;
use crate::external_connections::ExternalConnectivity;
use crate::routing_utils::{ApiResponse, BasicErrorResponse, DomainErrorResponse};
use crate::{AppState, SharedData, domain, dto, persistence};
use axum::Router;
use axum::extract::State;
use axum::response::ErrorResponse;
use axum::routing::get;
use std::sync::Arc;
use tracing::info;
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(paths(list_employees))]
/// Defines the OpenAPI documentation for the user API
pub struct UsersApi;
/// Constant used to group user endpoints in OpenAPI documentation
pub const USER_API_GROUP: &str = "Users";

/// Builds a router for all the user routes
pub fn user_routes() -> Router<Arc<SharedData>> {
    Router::new().route(
        "/users/employees",
        get(|State(app_state): AppState, CurrentUser(identity): CurrentUser| async move {
            let mut ext_cxn = app_state.ext_cxn.clone();
            let user_service = domain::user::UserService {};

            list_employees(&identity, &mut ext_cxn, &user_service).await
        }),
    )
}

#[utoipa::path(
    get,
    path = "/api/users/employees",
    tag = USER_API_GROUP,
    security(("session_token" = [])),
    responses(
        (status = 200, description = "Every employee, ordered by name", body = [dto::user::Employee]),
        (status = 401, response = BasicErrorResponse),
        (status = 403, response = BasicErrorResponse),
        (status = 500, response = BasicErrorResponse),
    ),
)]
#[tracing::instrument(skip_all, fields(user_id = identity.id))]
/// Lists the employees a manager can assign tasks to
async fn list_employees(
    identity: &Identity,
    ext_cxn: &mut impl ExternalConnectivity,
    user_service: &impl UserPort,
) -> Result<ApiResponse<Vec<dto::user::Employee>>, ErrorResponse> {
    info!("Requested employees");
    let user_read = persistence::db_user_driven_ports::DbReadUsers;

    let employees = user_service
        .list_employees(identity, &mut *ext_cxn, &user_read)
        .await
        .map_err(DomainErrorResponse::from)?;

    Ok(ApiResponse::list(
        employees.into_iter().map(dto::user::Employee::from).collect(),
    ))
}
