use crate::api::session::CurrentUser;
use crate::domain::analytics::driving_ports::AnalyticsPort;
use crate::domain::auth::Identity;
use crate::external_connections::ExternalConnectivity;
use crate::routing_utils::{ApiResponse, BasicErrorResponse, DomainErrorResponse, Path};
use crate::{AppState, SharedData, domain, dto, persistence};
use axum::Router;
use axum::extract::State;
use axum::response::ErrorResponse;
use axum::routing::get;
use std::sync::Arc;
use tracing::info;
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(paths(team_summary, task_progress, employee_summary))]
/// Defines the OpenAPI documentation for the analytics API
pub struct AnalyticsApi;
/// Constant used to group analytics endpoints in OpenAPI documentation
pub const ANALYTICS_API_GROUP: &str = "Analytics";

/// Builds a router for the "/analytics" routes
pub fn analytics_routes() -> Router<Arc<SharedData>> {
    Router::new()
        .route(
            "/analytics/summary",
            get(|State(app_state): AppState, CurrentUser(identity): CurrentUser| async move {
                let mut ext_cxn = app_state.ext_cxn.clone();
                let analytics_service = domain::analytics::AnalyticsService {};

                team_summary(&identity, &mut ext_cxn, &analytics_service).await
            }),
        )
        .route(
            "/analytics/task/:task_id/progress",
            get(
                |State(app_state): AppState,
                 CurrentUser(identity): CurrentUser,
                 Path(task_id): Path<i32>| async move {
                    let mut ext_cxn = app_state.ext_cxn.clone();
                    let analytics_service = domain::analytics::AnalyticsService {};

                    task_progress(&identity, task_id, &mut ext_cxn, &analytics_service).await
                },
            ),
        )
        .route(
            "/analytics/employee/:employee_id",
            get(
                |State(app_state): AppState,
                 CurrentUser(identity): CurrentUser,
                 Path(employee_id): Path<i32>| async move {
                    let mut ext_cxn = app_state.ext_cxn.clone();
                    let analytics_service = domain::analytics::AnalyticsService {};

                    employee_summary(&identity, employee_id, &mut ext_cxn, &analytics_service).await
                },
            ),
        )
}

#[utoipa::path(
    get,
    path = "/api/analytics/summary",
    tag = ANALYTICS_API_GROUP,
    security(("session_token" = [])),
    responses(
        (status = 200, description = "Status breakdown, per-employee totals, and completion across the manager's tasks", body = dto::analytics::TeamSummary),
        (status = 401, response = BasicErrorResponse),
        (status = 403, response = BasicErrorResponse),
        (status = 500, response = BasicErrorResponse),
    ),
)]
#[tracing::instrument(skip_all, fields(user_id = identity.id))]
/// Summarizes every task the current manager owns
async fn team_summary(
    identity: &Identity,
    ext_cxn: &mut impl ExternalConnectivity,
    analytics_service: &impl AnalyticsPort,
) -> Result<ApiResponse<dto::analytics::TeamSummary>, ErrorResponse> {
    info!("Building team summary");
    let analytics_read = persistence::db_analytics_driven_ports::DbAnalyticsReader;

    let summary = analytics_service
        .team_summary(identity, &mut *ext_cxn, &analytics_read)
        .await
        .map_err(DomainErrorResponse::from)?;

    Ok(ApiResponse::of(dto::analytics::TeamSummary::from(summary)))
}

#[utoipa::path(
    get,
    path = "/api/analytics/task/{task_id}/progress",
    tag = ANALYTICS_API_GROUP,
    security(("session_token" = [])),
    params(
        ("task_id" = i32, Path, description = "The task whose progress history is wanted"),
    ),
    responses(
        (status = 200, description = "Reported percentages, oldest first", body = [dto::analytics::ProgressPoint]),
        (status = 400, response = BasicErrorResponse),
        (status = 401, response = BasicErrorResponse),
        (status = 403, response = BasicErrorResponse),
        (status = 404, response = BasicErrorResponse),
        (status = 500, response = BasicErrorResponse),
    ),
)]
#[tracing::instrument(skip_all, fields(user_id = identity.id))]
/// Lists the completion percentages reported on a task over time
async fn task_progress(
    identity: &Identity,
    task_id: i32,
    ext_cxn: &mut impl ExternalConnectivity,
    analytics_service: &impl AnalyticsPort,
) -> Result<ApiResponse<Vec<dto::analytics::ProgressPoint>>, ErrorResponse> {
    info!("Fetching progress history for task {task_id}");
    let task_read = persistence::db_task_driven_ports::DbTaskReader;
    let analytics_read = persistence::db_analytics_driven_ports::DbAnalyticsReader;

    let history = analytics_service
        .task_progress(identity, task_id, &mut *ext_cxn, &task_read, &analytics_read)
        .await
        .map_err(DomainErrorResponse::from)?;

    Ok(ApiResponse::list(
        history
            .into_iter()
            .map(dto::analytics::ProgressPoint::from)
            .collect(),
    ))
}

#[utoipa::path(
    get,
    path = "/api/analytics/employee/{employee_id}",
    tag = ANALYTICS_API_GROUP,
    security(("session_token" = [])),
    params(
        ("employee_id" = i32, Path, description = "The employee to summarize"),
    ),
    responses(
        (status = 200, description = "Status and priority breakdown of the tasks the manager gave this employee", body = dto::analytics::EmployeeSummary),
        (status = 400, response = BasicErrorResponse),
        (status = 401, response = BasicErrorResponse),
        (status = 403, response = BasicErrorResponse),
        (status = 404, response = BasicErrorResponse),
        (status = 500, response = BasicErrorResponse),
    ),
)]
#[tracing::instrument(skip_all, fields(user_id = identity.id))]
/// Summarizes the current manager's tasks assigned to one employee
async fn employee_summary(
    identity: &Identity,
    employee_id: i32,
    ext_cxn: &mut impl ExternalConnectivity,
    analytics_service: &impl AnalyticsPort,
) -> Result<ApiResponse<dto::analytics::EmployeeSummary>, ErrorResponse> {
    info!("Building summary for employee {employee_id}");
    let user_read = persistence::db_user_driven_ports::DbReadUsers;
    let analytics_read = persistence::db_analytics_driven_ports::DbAnalyticsReader;

    let summary = analytics_service
        .employee_summary(
            identity,
            employee_id,
            &mut *ext_cxn,
            &user_read,
            &analytics_read,
        )
        .await
        .map_err(DomainErrorResponse::from)?;

    Ok(ApiResponse::of(dto::analytics::EmployeeSummary::from(summary)))
}
