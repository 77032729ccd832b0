use crate::domain;
use crate::domain::user::Role;
use derive_more::Display;
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// DTO for creating an account via the API
#[derive(Deserialize, Display, ToSchema)]
#[display("{name}")]
#[cfg_attr(test, derive(Serialize, Clone))]
pub struct RegisterUser {
    #[schema(example = "Jane Doe")]
    pub name: String,
    #[schema(example = "jane@example.com")]
    pub email: String,
    #[schema(example = "hunter22")]
    pub password: String,
    /// Defaults to "employee" when left out
    #[serde(default)]
    #[schema(value_type = Option<String>, example = "manager")]
    pub role: Option<Role>,
}

impl From<RegisterUser> for domain::user::NewUser {
    fn from(value: RegisterUser) -> Self {
        domain::user::NewUser {
            name: value.name,
            email: value.email,
            password: value.password,
            role: value.role.unwrap_or_default(),
        }
    }
}

/// DTO for logging in via the API
#[derive(Deserialize, ToSchema)]
#[cfg_attr(test, derive(Serialize))]
pub struct Credentials {
    #[schema(example = "jane@example.com")]
    pub email: String,
    #[schema(example = "hunter22")]
    pub password: String,
}

/// DTO returned after a successful registration or login. The client keeps the token and
/// sends it back as a bearer token on protected routes.
#[derive(Serialize, ToSchema)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(test, derive(Deserialize, Debug, PartialEq, Eq))]
pub struct AuthenticatedUser {
    #[schema(example = 3)]
    pub id: i32,
    #[schema(example = "Jane Doe")]
    pub name: String,
    #[schema(example = "jane@example.com")]
    pub email: String,
    #[schema(value_type = String, example = "employee")]
    pub role: Role,
    pub token: String,
}

impl From<domain::auth::Session> for AuthenticatedUser {
    fn from(value: domain::auth::Session) -> Self {
        AuthenticatedUser {
            id: value.identity.id,
            name: value.identity.name,
            email: value.identity.email,
            role: value.identity.role,
            token: value.token,
        }
    }
}
