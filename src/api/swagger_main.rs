use crate::dto;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

#[derive(OpenApi)]
#[openapi(info(
    title = "Workboard API",
    description = "Task assignment and progress tracking between managers and their employees"
))]
struct WorkboardApi;

/// Constructs the route on the API that renders the swagger UI and returns the OpenAPI schema.
/// Merges in OpenAPI definitions from other locations in the app, such as the [dto] package
/// and submodules of [api][crate::api]
pub fn build_documentation() -> SwaggerUi {
    SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", api_document())
}

fn api_document() -> utoipa::openapi::OpenApi {
    let mut api_docs = WorkboardApi::openapi();
    api_docs.merge(dto::OpenApiSchemas::openapi());
    api_docs.merge(super::auth::AuthApi::openapi());
    api_docs.merge(super::user::UsersApi::openapi());
    api_docs.merge(super::task::TaskApi::openapi());
    api_docs.merge(super::work_update::WorkUpdateApi::openapi());
    api_docs.merge(super::analytics::AnalyticsApi::openapi());

    api_docs
}
