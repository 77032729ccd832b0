use thiserror::Error;
use validator::{ValidationError, ValidationErrors};

pub mod analytics;
pub mod auth;
pub mod task;
pub mod user;
pub mod work_update;

#[cfg(test)]
pub(crate) mod test_util;

/// Failure modes shared by the task, work update, analytics, and user services
#[derive(Error, Debug)]
pub enum Error {
    #[error("input was invalid: {0}")]
    Invalid(ValidationErrors),
    #[error("the requested {0} does not exist")]
    DoesNotExist(&'static str),
    #[error("{0}")]
    Forbidden(String),
    #[error(transparent)]
    PortError(#[from] anyhow::Error),
}

impl From<ValidationErrors> for Error {
    fn from(value: ValidationErrors) -> Self {
        Self::Invalid(value)
    }
}

impl Error {
    pub(crate) fn forbidden(message: impl Into<String>) -> Self {
        Self::Forbidden(message.into())
    }

    /// Builds a validation failure for a single field, for rules that can't be expressed
    /// as a derive on the input type (such as checks which need a database lookup)
    pub(crate) fn invalid_field(field: &'static str, code: &'static str) -> Self {
        let mut errors = ValidationErrors::new();
        errors.add(field, ValidationError::new(code));
        Self::Invalid(errors)
    }
}


/// A lightweight reference to a user with their display name resolved
#[derive(PartialEq, Eq, Debug, Clone)]
pub struct UserRef {
    pub id: i32,
    pub name: String,
}
