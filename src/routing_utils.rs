use crate::domain;
use crate::domain::auth::driving_ports::AuthError;
use axum::extract::rejection::{JsonRejection, PathRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum_macros::{FromRequest, FromRequestParts};
use serde::Serialize;
use tracing::error;
use utoipa::openapi::{RefOr, Schema};
use utoipa::{ToResponse, ToSchema, openapi};
use validator::ValidationErrors;

/// Envelope wrapped around every successful response body
#[derive(Serialize, Debug)]
#[cfg_attr(test, derive(serde::Deserialize))]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: T,
    /// Number of entries in `data` for list responses
    #[serde(skip_serializing_if = "Option::is_none")]
    #[cfg_attr(test, serde(default))]
    pub count: Option<usize>,
}

impl<T> ApiResponse<T> {
    pub fn of(data: T) -> ApiResponse<T> {
        ApiResponse {
            success: true,
            data,
            count: None,
        }
    }
}

impl<T> ApiResponse<Vec<T>> {
    pub fn list(data: Vec<T>) -> ApiResponse<Vec<T>> {
        ApiResponse {
            success: true,
            count: Some(data.len()),
            data,
        }
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        axum::Json(self).into_response()
    }
}

/// Contains diagnostic information about an API failure
#[derive(Serialize, Debug, ToResponse)]
#[serde(rename_all = "camelCase")]
#[response(examples(
    ("Not Found" = (
        summary = "Entity could not be found (404)",
        value = json!({
            "success": false,
            "errorCode": "not_found",
            "error": "The requested task could not be found.",
            "extraInfo": null
        })
    )),

    ("Unauthenticated" = (
        summary = "No valid session token was sent (401)",
        value = json!({
            "success": false,
            "errorCode": "unauthenticated",
            "error": "Not authorized, no token.",
            "extraInfo": null
        })
    )),

    ("Forbidden" = (
        summary = "The session's user may not perform this action (403)",
        value = json!({
            "success": false,
            "errorCode": "forbidden",
            "error": "employees can only update status",
            "extraInfo": null
        })
    )),

    ("Internal Failure" = (
        summary = "Something unexpected went wrong inside the server (500)",
        value = json!({
            "success": false,
            "errorCode": "internal_error",
            "error": "Could not access data to complete your request",
            "extraInfo": null
        })
    )),

    ("Invalid Input" = (
        summary = "Invalid request body was passed (400)",
        value = json!({
            "success": false,
            "errorCode": "invalid_input",
            "error": "Submitted data was invalid.",
            "extraInfo": {
                "percentage_complete": [
                    {
                        "code": "range",
                        "message": null,
                        "params": {
                            "value": 140,
                            "min": 0.0,
                            "max": 100.0
                        }
                    }
                ]
            }
        })
    )),

    ("Malformed JSON" = (
        summary = "Invalid JSON passed to server (400)",
        value = json!({
            "success": false,
            "errorCode": "invalid_json",
            "error": "The passed request body contained malformed or unreadable JSON.",
            "extraInfo": "Failed to parse the request body as JSON: EOF while parsing an object at line 4 column 0"
        })
    ))
))]
pub struct BasicErrorResponse {
    success: bool,
    error_code: String,
    error: String,
    extra_info: Option<ExtraInfo>,
}

impl BasicErrorResponse {
    fn with_status(
        status: StatusCode,
        error_code: &str,
        error: impl Into<String>,
        extra_info: Option<ExtraInfo>,
    ) -> Response {
        (
            status,
            axum::Json(BasicErrorResponse {
                success: false,
                error_code: error_code.to_owned(),
                error: error.into(),
                extra_info,
            }),
        )
            .into_response()
    }
}

#[derive(Serialize, Debug, ToSchema)]
#[serde(untagged)]
pub enum ExtraInfo {
    ValidationIssues(ValidationErrorSchema),
    Message(String),
}

/// Stand-in OpenAPI schema for [ValidationErrors] which just provides an empty object
#[derive(Serialize, Debug)]
#[serde(transparent)]
pub struct ValidationErrorSchema(ValidationErrors);

impl<'schem> ToSchema<'schem> for ValidationErrorSchema {
    fn schema() -> (&'schem str, RefOr<Schema>) {
        (
            "ValidationErrorSchema",
            openapi::ObjectBuilder::new().into(),
        )
    }
}

/// Response type for failures the client can't do anything about. The cause is logged, never sent.
pub struct GenericErrorResponse(pub anyhow::Error);

impl IntoResponse for GenericErrorResponse {
    fn into_response(self) -> Response {
        error!("Request failed: {:#}", self.0);

        BasicErrorResponse::with_status(
            StatusCode::INTERNAL_SERVER_ERROR,
            "internal_error",
            "Could not access data to complete your request",
            None,
        )
    }
}

/// Response type that wraps validation errors and turns them into [BasicErrorResponse]s
pub struct ValidationErrorResponse(ValidationErrors);

impl IntoResponse for ValidationErrorResponse {
    fn into_response(self) -> Response {
        BasicErrorResponse::with_status(
            StatusCode::BAD_REQUEST,
            "invalid_input",
            "Submitted data was invalid.",
            Some(ExtraInfo::ValidationIssues(ValidationErrorSchema(self.0))),
        )
    }
}

impl From<ValidationErrors> for ValidationErrorResponse {
    fn from(value: ValidationErrors) -> Self {
        Self(value)
    }
}

/// Response type that turns [domain::Error]s into [BasicErrorResponse]s
pub struct DomainErrorResponse(domain::Error);

impl From<domain::Error> for DomainErrorResponse {
    fn from(value: domain::Error) -> Self {
        Self(value)
    }
}

impl IntoResponse for DomainErrorResponse {
    fn into_response(self) -> Response {
        match self.0 {
            domain::Error::Invalid(errors) => ValidationErrorResponse(errors).into_response(),
            domain::Error::DoesNotExist(entity) => BasicErrorResponse::with_status(
                StatusCode::NOT_FOUND,
                "not_found",
                format!("The requested {entity} could not be found."),
                None,
            ),
            domain::Error::Forbidden(message) => BasicErrorResponse::with_status(
                StatusCode::FORBIDDEN,
                "forbidden",
                message,
                None,
            ),
            domain::Error::PortError(cause) => GenericErrorResponse(cause).into_response(),
        }
    }
}

/// Response type that turns [AuthError]s into [BasicErrorResponse]s
pub struct AuthErrorResponse(AuthError);

impl From<AuthError> for AuthErrorResponse {
    fn from(value: AuthError) -> Self {
        Self(value)
    }
}

impl IntoResponse for AuthErrorResponse {
    fn into_response(self) -> Response {
        match self.0 {
            AuthError::Invalid(errors) => ValidationErrorResponse(errors).into_response(),
            AuthError::DuplicateEmail => BasicErrorResponse::with_status(
                StatusCode::BAD_REQUEST,
                "user_exists",
                "User already exists.",
                None,
            ),
            AuthError::InvalidCredentials => BasicErrorResponse::with_status(
                StatusCode::UNAUTHORIZED,
                "invalid_credentials",
                "Invalid credentials.",
                None,
            ),
            AuthError::Unauthenticated(reason) => BasicErrorResponse::with_status(
                StatusCode::UNAUTHORIZED,
                "unauthenticated",
                format!("Not authorized, {reason}."),
                None,
            ),
            AuthError::PortError(cause) => GenericErrorResponse(cause).into_response(),
        }
    }
}

/// Wrapper for [axum::Json] which customizes the error response to use our
/// data structure for API errors
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(JsonErrorResponse))]
pub struct Json<T>(pub T);

impl<T: Serialize> IntoResponse for Json<T> {
    fn into_response(self) -> Response {
        axum::Json(self.0).into_response()
    }
}

/// Response type representing JSON parse errors
pub struct JsonErrorResponse {
    parse_problem: String,
}

impl From<JsonRejection> for JsonErrorResponse {
    fn from(value: JsonRejection) -> Self {
        JsonErrorResponse {
            parse_problem: value.body_text(),
        }
    }
}

impl IntoResponse for JsonErrorResponse {
    fn into_response(self) -> Response {
        BasicErrorResponse::with_status(
            StatusCode::BAD_REQUEST,
            "invalid_json",
            "The passed request body contained malformed or unreadable JSON.",
            Some(ExtraInfo::Message(self.parse_problem)),
        )
    }
}

/// Wrapper for [axum::extract::Path] which reports unparseable path segments in our error format
#[derive(FromRequestParts)]
#[from_request(via(axum::extract::Path), rejection(PathErrorResponse))]
pub struct Path<T>(pub T);

/// Response type for path parameters that don't fit the route, like a non-numeric ID
pub struct PathErrorResponse {
    status: StatusCode,
    parse_problem: String,
}

impl From<PathRejection> for PathErrorResponse {
    fn from(value: PathRejection) -> Self {
        PathErrorResponse {
            status: value.status(),
            parse_problem: value.body_text(),
        }
    }
}

impl IntoResponse for PathErrorResponse {
    fn into_response(self) -> Response {
        if self.status.is_server_error() {
            return GenericErrorResponse(anyhow::anyhow!(self.parse_problem)).into_response();
        }

        BasicErrorResponse::with_status(
            StatusCode::BAD_REQUEST,
            "invalid_input",
            "Submitted data was invalid.",
            Some(ExtraInfo::Message(self.parse_problem)),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::api::test_util::deserialize_body;
    use anyhow::anyhow;
    use axum::Router;
    use axum::body::Body;
    use axum::http::Request;
    use axum::routing::get;
    use serde_json::Value;
    use tower::ServiceExt;

    async fn status_and_body(response: Response) -> (StatusCode, Value) {
        let status = response.status();
        (status, deserialize_body(response.into_body()).await)
    }

    #[tokio::test]
    async fn list_envelope_carries_a_count() {
        let (status, body) =
            status_and_body(ApiResponse::list(vec!["a", "b", "c"]).into_response()).await;

        assert_eq!(StatusCode::OK, status);
        assert_eq!(
            serde_json::json!({"success": true, "data": ["a", "b", "c"], "count": 3}),
            body
        );
    }

    #[tokio::test]
    async fn single_envelope_has_no_count() {
        let (_, body) = status_and_body(ApiResponse::of("hello").into_response()).await;

        assert_eq!(serde_json::json!({"success": true, "data": "hello"}), body);
    }

    #[tokio::test]
    async fn domain_errors_map_to_statuses() {
        let cases = [
            (
                domain::Error::forbidden("nope"),
                StatusCode::FORBIDDEN,
                "forbidden",
            ),
            (
                domain::Error::DoesNotExist("task"),
                StatusCode::NOT_FOUND,
                "not_found",
            ),
            (
                domain::Error::invalid_field("assignedTo", "not_an_employee"),
                StatusCode::BAD_REQUEST,
                "invalid_input",
            ),
            (
                domain::Error::PortError(anyhow!("connection refused")),
                StatusCode::INTERNAL_SERVER_ERROR,
                "internal_error",
            ),
        ];

        for (err, expected_status, expected_code) in cases {
            let (status, body) =
                status_and_body(DomainErrorResponse::from(err).into_response()).await;
            assert_eq!(expected_status, status);
            assert_eq!(Value::Bool(false), body["success"]);
            assert_eq!(expected_code, body["errorCode"]);
        }
    }

    #[tokio::test]
    async fn port_failures_do_not_leak_their_cause() {
        let (_, body) = status_and_body(
            DomainErrorResponse::from(domain::Error::PortError(anyhow!("password=hunter2")))
                .into_response(),
        )
        .await;

        assert!(!body.to_string().contains("hunter2"));
    }

    #[tokio::test]
    async fn auth_errors_map_to_statuses() {
        let cases = [
            (AuthError::DuplicateEmail, StatusCode::BAD_REQUEST, "user_exists"),
            (
                AuthError::InvalidCredentials,
                StatusCode::UNAUTHORIZED,
                "invalid_credentials",
            ),
            (
                AuthError::Unauthenticated("no token"),
                StatusCode::UNAUTHORIZED,
                "unauthenticated",
            ),
        ];

        for (err, expected_status, expected_code) in cases {
            let (status, body) =
                status_and_body(AuthErrorResponse::from(err).into_response()).await;
            assert_eq!(expected_status, status);
            assert_eq!(expected_code, body["errorCode"]);
        }
    }

    mod path_extractor {
        use super::*;

        fn numbered_router() -> Router {
            Router::new().route(
                "/items/:item_id",
                get(|Path(item_id): Path<i32>| async move { ApiResponse::of(item_id) }),
            )
        }

        async fn get_item(uri: &str) -> (StatusCode, Value) {
            let response = numbered_router()
                .oneshot(Request::get(uri).body(Body::empty()).expect("request should build"))
                .await
                .expect("router should always produce a response");

            status_and_body(response).await
        }

        #[tokio::test]
        async fn numeric_segment_is_extracted() {
            let (status, body) = get_item("/items/42").await;

            assert_eq!(StatusCode::OK, status);
            assert_eq!(42, body["data"]);
        }

        #[tokio::test]
        async fn non_numeric_segment_is_invalid_input() {
            let (status, body) = get_item("/items/forty-two").await;

            assert_eq!(StatusCode::BAD_REQUEST, status);
            assert_eq!(Value::Bool(false), body["success"]);
            assert_eq!("invalid_input", body["errorCode"]);
            assert!(
                body["extraInfo"]
                    .as_str()
                    .is_some_and(|problem| problem.contains("forty-two"))
            );
        }

        #[tokio::test]
        async fn out_of_range_segment_is_invalid_input() {
            let (status, body) = get_item("/items/99999999999").await;

            assert_eq!(StatusCode::BAD_REQUEST, status);
            assert_eq!("invalid_input", body["errorCode"]);
        }
    }
}
