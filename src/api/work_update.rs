use crate::api::session::CurrentUser;
use crate::domain::auth::Identity;
use crate::domain::work_update::driving_ports::WorkUpdatePort;
use crate::external_connections::ExternalConnectivity;
use crate::routing_utils::{ApiResponse, BasicErrorResponse, DomainErrorResponse, Json, Path};
use crate::{AppState, SharedData, domain, dto, persistence};
use axum::Router;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::ErrorResponse;
use axum::routing::{get, put};
use std::sync::Arc;
use tracing::info;
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(paths(list_updates, add_update, add_remark, acknowledge_remark))]
/// Defines the OpenAPI documentation for the work update API
pub struct WorkUpdateApi;
/// Constant used to group work update endpoints in OpenAPI documentation
pub const WORK_UPDATE_API_GROUP: &str = "Work Updates";

/// Builds a router for posting progress on tasks and the remark/acknowledge exchange on each update
pub fn work_update_routes() -> Router<Arc<SharedData>> {
    Router::new()
        .route(
            "/tasks/:task_id/updates",
            get(
                |State(app_state): AppState,
                 CurrentUser(identity): CurrentUser,
                 Path(task_id): Path<i32>| async move {
                    let mut ext_cxn = app_state.ext_cxn.clone();
                    let update_service = domain::work_update::WorkUpdateService {};

                    list_updates(&identity, task_id, &mut ext_cxn, &update_service).await
                },
            )
            .post(
                |State(app_state): AppState,
                 CurrentUser(identity): CurrentUser,
                 Path(task_id): Path<i32>,
                 Json(new_update): Json<dto::work_update::NewWorkUpdate>| async move {
                    let mut ext_cxn = app_state.ext_cxn.clone();
                    let update_service = domain::work_update::WorkUpdateService {};

                    add_update(&identity, task_id, new_update, &mut ext_cxn, &update_service).await
                },
            ),
        )
        .route(
            "/updates/:update_id/remark",
            put(
                |State(app_state): AppState,
                 CurrentUser(identity): CurrentUser,
                 Path(update_id): Path<i32>,
                 Json(remark): Json<dto::work_update::RemarkBody>| async move {
                    let mut ext_cxn = app_state.ext_cxn.clone();
                    let update_service = domain::work_update::WorkUpdateService {};

                    add_remark(&identity, update_id, remark, &mut ext_cxn, &update_service).await
                },
            ),
        )
        .route(
            "/updates/:update_id/acknowledge",
            put(
                |State(app_state): AppState,
                 CurrentUser(identity): CurrentUser,
                 Path(update_id): Path<i32>| async move {
                    let mut ext_cxn = app_state.ext_cxn.clone();
                    let update_service = domain::work_update::WorkUpdateService {};

                    acknowledge_remark(&identity, update_id, &mut ext_cxn, &update_service).await
                },
            ),
        )
}

#[utoipa::path(
    get,
    path = "/api/tasks/{task_id}/updates",
    tag = WORK_UPDATE_API_GROUP,
    security(("session_token" = [])),
    params(
        ("task_id" = i32, Path, description = "The task whose updates should be listed"),
    ),
    responses(
        (status = 200, description = "The task's work updates, newest first", body = [dto::work_update::WorkUpdate]),
        (status = 400, response = BasicErrorResponse),
        (status = 401, response = BasicErrorResponse),
        (status = 403, response = BasicErrorResponse),
        (status = 404, response = BasicErrorResponse),
        (status = 500, response = BasicErrorResponse),
    ),
)]
#[tracing::instrument(skip_all, fields(user_id = identity.id))]
/// Lists the progress reports posted on a task
async fn list_updates(
    identity: &Identity,
    task_id: i32,
    ext_cxn: &mut impl ExternalConnectivity,
    update_service: &impl WorkUpdatePort,
) -> Result<ApiResponse<Vec<dto::work_update::WorkUpdate>>, ErrorResponse> {
    info!("Listing updates for task {task_id}");
    let task_read = persistence::db_task_driven_ports::DbTaskReader;
    let update_read = persistence::db_work_update_driven_ports::DbWorkUpdateReader;

    let updates = update_service
        .list_updates(identity, task_id, &mut *ext_cxn, &task_read, &update_read)
        .await
        .map_err(DomainErrorResponse::from)?;

    Ok(ApiResponse::list(
        updates
            .into_iter()
            .map(dto::work_update::WorkUpdate::from)
            .collect(),
    ))
}

#[utoipa::path(
    post,
    path = "/api/tasks/{task_id}/updates",
    tag = WORK_UPDATE_API_GROUP,
    security(("session_token" = [])),
    params(
        ("task_id" = i32, Path, description = "The task to report progress on"),
    ),
    request_body = dto::work_update::NewWorkUpdate,
    responses(
        (status = 201, description = "Update posted", body = dto::work_update::WorkUpdate),
        (status = 400, response = BasicErrorResponse),
        (status = 401, response = BasicErrorResponse),
        (status = 403, response = BasicErrorResponse),
        (status = 404, response = BasicErrorResponse),
        (status = 500, response = BasicErrorResponse),
    ),
)]
#[tracing::instrument(skip_all, fields(user_id = identity.id))]
/// Posts a progress report on a task. Only the task's assignee may do this.
async fn add_update(
    identity: &Identity,
    task_id: i32,
    new_update: dto::work_update::NewWorkUpdate,
    ext_cxn: &mut impl ExternalConnectivity,
    update_service: &impl WorkUpdatePort,
) -> Result<(StatusCode, ApiResponse<dto::work_update::WorkUpdate>), ErrorResponse> {
    info!("Adding update to task {task_id}");
    let new_update = domain::work_update::NewWorkUpdate::from(new_update);
    let task_read = persistence::db_task_driven_ports::DbTaskReader;
    let update_read = persistence::db_work_update_driven_ports::DbWorkUpdateReader;
    let update_write = persistence::db_work_update_driven_ports::DbWorkUpdateWriter;

    let update = update_service
        .add_update(
            identity,
            task_id,
            &new_update,
            &mut *ext_cxn,
            &task_read,
            &update_read,
            &update_write,
        )
        .await
        .map_err(DomainErrorResponse::from)?;

    Ok((
        StatusCode::CREATED,
        ApiResponse::of(dto::work_update::WorkUpdate::from(update)),
    ))
}

#[utoipa::path(
    put,
    path = "/api/updates/{update_id}/remark",
    tag = WORK_UPDATE_API_GROUP,
    security(("session_token" = [])),
    params(
        ("update_id" = i32, Path, description = "The work update to remark on"),
    ),
    request_body = dto::work_update::RemarkBody,
    responses(
        (status = 200, description = "Remark saved", body = dto::work_update::WorkUpdate),
        (status = 400, response = BasicErrorResponse),
        (status = 401, response = BasicErrorResponse),
        (status = 403, response = BasicErrorResponse),
        (status = 404, response = BasicErrorResponse),
        (status = 500, response = BasicErrorResponse),
    ),
)]
#[tracing::instrument(skip_all, fields(user_id = identity.id))]
/// Leaves a remark on a work update. Only the manager who owns the update's task may do this.
async fn add_remark(
    identity: &Identity,
    update_id: i32,
    remark: dto::work_update::RemarkBody,
    ext_cxn: &mut impl ExternalConnectivity,
    update_service: &impl WorkUpdatePort,
) -> Result<ApiResponse<dto::work_update::WorkUpdate>, ErrorResponse> {
    info!("Remarking on update {update_id}");
    let remark = domain::work_update::Remark::from(remark);
    let task_read = persistence::db_task_driven_ports::DbTaskReader;
    let update_read = persistence::db_work_update_driven_ports::DbWorkUpdateReader;
    let update_write = persistence::db_work_update_driven_ports::DbWorkUpdateWriter;

    let update = update_service
        .add_remark(
            identity,
            update_id,
            &remark,
            &mut *ext_cxn,
            &task_read,
            &update_read,
            &update_write,
        )
        .await
        .map_err(DomainErrorResponse::from)?;

    Ok(ApiResponse::of(dto::work_update::WorkUpdate::from(update)))
}

#[utoipa::path(
    put,
    path = "/api/updates/{update_id}/acknowledge",
    tag = WORK_UPDATE_API_GROUP,
    security(("session_token" = [])),
    params(
        ("update_id" = i32, Path, description = "The work update whose remark is being acknowledged"),
    ),
    responses(
        (status = 200, description = "Remark acknowledged", body = dto::work_update::WorkUpdate),
        (status = 400, response = BasicErrorResponse),
        (status = 401, response = BasicErrorResponse),
        (status = 403, response = BasicErrorResponse),
        (status = 404, response = BasicErrorResponse),
        (status = 500, response = BasicErrorResponse),
    ),
)]
#[tracing::instrument(skip_all, fields(user_id = identity.id))]
/// Marks the manager's remark on a work update as read. Only the update's author may do this.
async fn acknowledge_remark(
    identity: &Identity,
    update_id: i32,
    ext_cxn: &mut impl ExternalConnectivity,
    update_service: &impl WorkUpdatePort,
) -> Result<ApiResponse<dto::work_update::WorkUpdate>, ErrorResponse> {
    info!("Acknowledging remark on update {update_id}");
    let update_read = persistence::db_work_update_driven_ports::DbWorkUpdateReader;
    let update_write = persistence::db_work_update_driven_ports::DbWorkUpdateWriter;

    let update = update_service
        .acknowledge_remark(
            identity,
            update_id,
            &mut *ext_cxn,
            &update_read,
            &update_write,
        )
        .await
        .map_err(DomainErrorResponse::from)?;

    Ok(ApiResponse::of(dto::work_update::WorkUpdate::from(update)))
}
