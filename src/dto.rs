use crate::routing_utils::{BasicErrorResponse, ExtraInfo, ValidationErrorSchema};
use utoipa::OpenApi;

pub mod analytics;
pub mod auth;
pub mod task;
pub mod user;
pub mod work_update;

/// Collects the schemas of every wire type so they can be merged into the main API document
#[derive(OpenApi)]
#[openapi(
    components(
        schemas(
            auth::RegisterUser,
            auth::Credentials,
            auth::AuthenticatedUser,
            user::UserSummary,
            user::Employee,
            task::NewTask,
            task::UpdateTask,
            task::Task,
            work_update::NewWorkUpdate,
            work_update::RemarkBody,
            work_update::WorkUpdate,
            analytics::StatusCount,
            analytics::PriorityCount,
            analytics::EmployeeTaskTotal,
            analytics::ProgressPoint,
            analytics::TeamSummary,
            analytics::EmployeeSummary,
            ExtraInfo,
            ValidationErrorSchema,
        ),
        responses(BasicErrorResponse),
    ),
    modifiers(&SessionTokenScheme)
)]
pub struct OpenApiSchemas;

/// Registers the bearer token scheme the protected routes reference as "session_token"
struct SessionTokenScheme;

impl utoipa::Modify for SessionTokenScheme {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};

        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "session_token",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}
