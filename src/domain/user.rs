use crate::domain;
use crate::domain::auth::Identity;
use crate::external_connections::ExternalConnectivity;
use anyhow::{Context, anyhow};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt::{Display, Formatter};
use std::str::FromStr;
use tracing::error;
use validator::Validate;

/// What a user is allowed to do in the system
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Manager,
    #[default]
    Employee,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Manager => "manager",
            Self::Employee => "employee",
        }
    }
}

impl Display for Role {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = anyhow::Error;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "manager" => Ok(Self::Manager),
            "employee" => Ok(Self::Employee),
            other => Err(anyhow!("unknown user role: {other}")),
        }
    }
}

/// A registered user, without any credential material
#[derive(PartialEq, Eq, Debug, Clone)]
pub struct User {
    pub id: i32,
    pub name: String,
    pub email: String,
    pub role: Role,
    pub created_at: DateTime<Utc>,
}

/// A user along with the stored hash of their password, only used while logging in
#[derive(Debug, Clone)]
pub struct UserCredentials {
    pub user: User,
    pub password_hash: String,
}

/// Account details submitted at registration, before the password is hashed
#[derive(Validate, Debug)]
#[cfg_attr(test, derive(Clone))]
pub struct NewUser {
    #[validate(length(min = 1, max = 100))]
    pub name: String,
    #[validate(email)]
    pub email: String,
    #[validate(length(min = 6))]
    pub password: String,
    pub role: Role,
}

/// A user record ready to be written to storage
#[derive(Debug)]
#[cfg_attr(test, derive(Clone))]
pub struct CreateUser {
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub role: Role,
}

/// Emails are compared case-insensitively and without surrounding whitespace
pub fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

pub mod driven_ports {
    use super::*;
    use thiserror::Error;

    pub trait UserReader {
        async fn get_by_id(
            &self,
            id: i32,
            ext_cxn: &mut impl ExternalConnectivity,
        ) -> Result<Option<User>, anyhow::Error>;

        async fn credentials_by_email(
            &self,
            email: &str,
            ext_cxn: &mut impl ExternalConnectivity,
        ) -> Result<Option<UserCredentials>, anyhow::Error>;

        async fn employees(
            &self,
            ext_cxn: &mut impl ExternalConnectivity,
        ) -> Result<Vec<User>, anyhow::Error>;
    }

    #[derive(Debug, Error)]
    pub enum InsertUserError {
        #[error("a user with that email already exists")]
        EmailTaken,
        #[error(transparent)]
        PortError(#[from] anyhow::Error),
    }

    pub trait UserWriter {
        async fn create_user(
            &self,
            user: &CreateUser,
            ext_cxn: &mut impl ExternalConnectivity,
        ) -> Result<i32, InsertUserError>;
    }

    pub trait DetectUser {
        async fn email_exists(
            &self,
            email: &str,
            ext_cxn: &mut impl ExternalConnectivity,
        ) -> Result<bool, anyhow::Error>;
    }
}

pub mod driving_ports {
    use super::*;

    pub trait UserPort {
        async fn list_employees(
            &self,
            identity: &Identity,
            ext_cxn: &mut impl ExternalConnectivity,
            u_reader: &impl driven_ports::UserReader,
        ) -> Result<Vec<User>, domain::Error>;
    }
}

/// Looks up a user and confirms they hold the employee role. Tasks can only be assigned
/// to employees, so this backs the `assignedTo` checks in the task service.
pub(super) async fn verify_employee(
    id: i32,
    ext_cxn: &mut impl ExternalConnectivity,
    u_reader: &impl driven_ports::UserReader,
) -> Result<(), domain::Error> {
    let user = u_reader
        .get_by_id(id, &mut *ext_cxn)
        .await
        .context("looking up assignee")?;

    match user {
        Some(User {
            role: Role::Employee,
            ..
        }) => Ok(()),
        _ => Err(domain::Error::invalid_field(
            "assignedTo",
            "not_an_employee",
        )),
    }
}

pub struct UserService {}

impl driving_ports::UserPort for UserService {
    async fn list_employees(
        &self,
        identity: &Identity,
        ext_cxn: &mut impl ExternalConnectivity,
        u_reader: &impl driven_ports::UserReader,
    ) -> Result<Vec<User>, domain::Error> {
        identity.authorize(&[Role::Manager])?;

        let employees_result = u_reader.employees(&mut *ext_cxn).await;
        if let Err(ref port_err) = employees_result {
            error!("Employee fetch failure: {port_err}");
        }

        Ok(employees_result.context("fetching employees")?)
    }
}
