use crate::domain;
use serde::Serialize;
use utoipa::ToSchema;

#[cfg(test)]
use serde::Deserialize;

/// A user referenced from another entity, with their display name
#[derive(Serialize, ToSchema)]
#[cfg_attr(test, derive(Deserialize, PartialEq, Eq, Debug))]
pub struct UserSummary {
    #[schema(example = 4)]
    pub id: i32,
    #[schema(example = "Erin Example")]
    pub name: String,
}

impl From<domain::UserRef> for UserSummary {
    fn from(value: domain::UserRef) -> Self {
        UserSummary {
            id: value.id,
            name: value.name,
        }
    }
}

/// DTO for an employee account a manager can assign tasks to
#[derive(Serialize, ToSchema)]
#[cfg_attr(test, derive(Deserialize, PartialEq, Eq, Debug))]
pub struct Employee {
    #[schema(example = 4)]
    pub id: i32,
    #[schema(example = "Erin Example")]
    pub name: String,
    #[schema(example = "erin@example.com")]
    pub email: String,
}

impl From<domain::user::User> for Employee {
    fn from(value: domain::user::User) -> Self {
        Employee {
            id: value.id,
            name: value.name,
            email: value.email,
        }
    }
}
