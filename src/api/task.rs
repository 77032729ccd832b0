use crate::api::session::CurrentUser;
use crate::domain::auth::Identity;
use crate::domain::task::driving_ports::TaskPort;
use crate::external_connections::ExternalConnectivity;
use crate::routing_utils::{ApiResponse, BasicErrorResponse, DomainErrorResponse, Json, Path};
use crate::{AppState, SharedData, domain, dto, persistence};
use axum::Router;
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::ErrorResponse;
use axum::routing::get;
use serde_json::{Value, json};
use std::sync::Arc;
use tracing::info;
use utoipa::OpenApi;

#[derive(OpenApi)]
#[openapi(paths(list_tasks, create_task, get_task, update_task, delete_task))]
/// Defines the OpenAPI documentation for the task API
pub struct TaskApi;
/// Constant used to group task endpoints in OpenAPI documentation
pub const TASK_API_GROUP: &str = "Tasks";

/// Builds a router for the "/tasks" routes
pub fn task_routes() -> Router<Arc<SharedData>> {
    Router::new()
        .route(
            "/tasks",
            get(|State(app_state): AppState, CurrentUser(identity): CurrentUser| async move {
                let mut ext_cxn = app_state.ext_cxn.clone();
                let task_service = domain::task::TaskService {};

                list_tasks(&identity, &mut ext_cxn, &task_service).await
            })
            .post(
                |State(app_state): AppState,
                 CurrentUser(identity): CurrentUser,
                 Json(new_task): Json<dto::task::NewTask>| async move {
                    let mut ext_cxn = app_state.ext_cxn.clone();
                    let task_service = domain::task::TaskService {};

                    create_task(&identity, new_task, &mut ext_cxn, &task_service).await
                },
            ),
        )
        .route(
            "/tasks/:task_id",
            get(
                |State(app_state): AppState,
                 CurrentUser(identity): CurrentUser,
                 Path(task_id): Path<i32>| async move {
                    let mut ext_cxn = app_state.ext_cxn.clone();
                    let task_service = domain::task::TaskService {};

                    get_task(&identity, task_id, &mut ext_cxn, &task_service).await
                },
            )
            .put(
                |State(app_state): AppState,
                 CurrentUser(identity): CurrentUser,
                 Path(task_id): Path<i32>,
                 Json(update): Json<dto::task::UpdateTask>| async move {
                    let mut ext_cxn = app_state.ext_cxn.clone();
                    let task_service = domain::task::TaskService {};

                    update_task(&identity, task_id, update, &mut ext_cxn, &task_service).await
                },
            )
            .delete(
                |State(app_state): AppState,
                 CurrentUser(identity): CurrentUser,
                 Path(task_id): Path<i32>| async move {
                    let mut ext_cxn = app_state.ext_cxn.clone();
                    let task_service = domain::task::TaskService {};

                    delete_task(&identity, task_id, &mut ext_cxn, &task_service).await
                },
            ),
        )
}

#[utoipa::path(
    get,
    path = "/api/tasks",
    tag = TASK_API_GROUP,
    security(("session_token" = [])),
    responses(
        (status = 200, description = "Tasks the user manages, or for employees the tasks assigned to them", body = [dto::task::Task]),
        (status = 401, response = BasicErrorResponse),
        (status = 500, response = BasicErrorResponse),
    ),
)]
#[tracing::instrument(skip_all, fields(user_id = identity.id))]
/// Lists the tasks visible to the current user
async fn list_tasks(
    identity: &Identity,
    ext_cxn: &mut impl ExternalConnectivity,
    task_service: &impl TaskPort,
) -> Result<ApiResponse<Vec<dto::task::Task>>, ErrorResponse> {
    info!("Listing tasks");
    let task_read = persistence::db_task_driven_ports::DbTaskReader;

    let tasks = task_service
        .list_tasks(identity, &mut *ext_cxn, &task_read)
        .await
        .map_err(DomainErrorResponse::from)?;

    Ok(ApiResponse::list(
        tasks.into_iter().map(dto::task::Task::from).collect(),
    ))
}

#[utoipa::path(
    post,
    path = "/api/tasks",
    tag = TASK_API_GROUP,
    security(("session_token" = [])),
    request_body = dto::task::NewTask,
    responses(
        (status = 201, description = "Task created", body = dto::task::Task),
        (status = 400, response = BasicErrorResponse),
        (status = 401, response = BasicErrorResponse),
        (status = 403, response = BasicErrorResponse),
        (status = 500, response = BasicErrorResponse),
    ),
)]
#[tracing::instrument(skip_all, fields(user_id = identity.id))]
/// Creates a task owned by the current user. Managers only.
async fn create_task(
    identity: &Identity,
    new_task: dto::task::NewTask,
    ext_cxn: &mut impl ExternalConnectivity,
    task_service: &impl TaskPort,
) -> Result<(StatusCode, ApiResponse<dto::task::Task>), ErrorResponse> {
    info!("Creating task \"{}\"", new_task.title);
    let new_task = domain::task::NewTask::from(new_task);
    let user_read = persistence::db_user_driven_ports::DbReadUsers;
    let task_read = persistence::db_task_driven_ports::DbTaskReader;
    let task_write = persistence::db_task_driven_ports::DbTaskWriter;

    let task = task_service
        .create_task(
            identity,
            &new_task,
            &mut *ext_cxn,
            &user_read,
            &task_read,
            &task_write,
        )
        .await
        .map_err(DomainErrorResponse::from)?;

    Ok((
        StatusCode::CREATED,
        ApiResponse::of(dto::task::Task::from(task)),
    ))
}

#[utoipa::path(
    get,
    path = "/api/tasks/{task_id}",
    tag = TASK_API_GROUP,
    security(("session_token" = [])),
    params(
        ("task_id" = i32, Path, description = "The ID of the task to retrieve"),
    ),
    responses(
        (status = 200, description = "The requested task", body = dto::task::Task),
        (status = 400, response = BasicErrorResponse),
        (status = 401, response = BasicErrorResponse),
        (status = 403, response = BasicErrorResponse),
        (status = 404, response = BasicErrorResponse),
        (status = 500, response = BasicErrorResponse),
    ),
)]
#[tracing::instrument(skip_all, fields(user_id = identity.id))]
/// Retrieves a single task the current user owns or is assigned
async fn get_task(
    identity: &Identity,
    task_id: i32,
    ext_cxn: &mut impl ExternalConnectivity,
    task_service: &impl TaskPort,
) -> Result<ApiResponse<dto::task::Task>, ErrorResponse> {
    info!("Getting task {task_id}");
    let task_read = persistence::db_task_driven_ports::DbTaskReader;

    let task = task_service
        .get_task(identity, task_id, &mut *ext_cxn, &task_read)
        .await
        .map_err(DomainErrorResponse::from)?;

    Ok(ApiResponse::of(dto::task::Task::from(task)))
}

#[utoipa::path(
    put,
    path = "/api/tasks/{task_id}",
    tag = TASK_API_GROUP,
    security(("session_token" = [])),
    params(
        ("task_id" = i32, Path, description = "The ID of the task to change"),
    ),
    request_body = dto::task::UpdateTask,
    responses(
        (status = 200, description = "The task after the change", body = dto::task::Task),
        (status = 400, response = BasicErrorResponse),
        (status = 401, response = BasicErrorResponse),
        (status = 403, response = BasicErrorResponse),
        (status = 404, response = BasicErrorResponse),
        (status = 500, response = BasicErrorResponse),
    ),
)]
#[tracing::instrument(skip_all, fields(user_id = identity.id))]
/// Changes a task. The assignee may only move its status.
async fn update_task(
    identity: &Identity,
    task_id: i32,
    update: dto::task::UpdateTask,
    ext_cxn: &mut impl ExternalConnectivity,
    task_service: &impl TaskPort,
) -> Result<ApiResponse<dto::task::Task>, ErrorResponse> {
    info!("Updating task {task_id}");
    let patch = domain::task::TaskPatch::from(update);
    let user_read = persistence::db_user_driven_ports::DbReadUsers;
    let task_read = persistence::db_task_driven_ports::DbTaskReader;
    let task_write = persistence::db_task_driven_ports::DbTaskWriter;

    let task = task_service
        .update_task(
            identity,
            task_id,
            &patch,
            &mut *ext_cxn,
            &user_read,
            &task_read,
            &task_write,
        )
        .await
        .map_err(DomainErrorResponse::from)?;

    Ok(ApiResponse::of(dto::task::Task::from(task)))
}

#[utoipa::path(
    delete,
    path = "/api/tasks/{task_id}",
    tag = TASK_API_GROUP,
    security(("session_token" = [])),
    params(
        ("task_id" = i32, Path, description = "The ID of the task to delete"),
    ),
    responses(
        (status = 200, description = "Task and its work updates were deleted"),
        (status = 400, response = BasicErrorResponse),
        (status = 401, response = BasicErrorResponse),
        (status = 403, response = BasicErrorResponse),
        (status = 404, response = BasicErrorResponse),
        (status = 500, response = BasicErrorResponse),
    ),
)]
#[tracing::instrument(skip_all, fields(user_id = identity.id))]
/// Deletes a task along with its work updates. Only the owning manager may do this.
async fn delete_task(
    identity: &Identity,
    task_id: i32,
    ext_cxn: &mut impl ExternalConnectivity,
    task_service: &impl TaskPort,
) -> Result<ApiResponse<Value>, ErrorResponse> {
    info!("Deleting task {task_id}");
    let task_read = persistence::db_task_driven_ports::DbTaskReader;
    let task_write = persistence::db_task_driven_ports::DbTaskWriter;

    task_service
        .delete_task(identity, task_id, &mut *ext_cxn, &task_read, &task_write)
        .await
        .map_err(DomainErrorResponse::from)?;

    Ok(ApiResponse::of(json!({})))
}
