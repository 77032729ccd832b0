use super::Count;
use crate::domain;
use crate::domain::user::driven_ports::InsertUserError;
use crate::domain::user::{CreateUser, User, UserCredentials};
use crate::external_connections::{ConnectionHandle, ExternalConnectivity};
use anyhow::{Context, Error};
use chrono::{DateTime, Utc};
use sqlx::query_as;

pub struct DbDetectUser;

impl domain::user::driven_ports::DetectUser for DbDetectUser {
    async fn email_exists(
        &self,
        email: &str,
        ext_cxn: &mut impl ExternalConnectivity,
    ) -> Result<bool, Error> {
        let mut cxn = ext_cxn.database_cxn().await.map_err(super::anyhowify)?;

        let users_with_email = query_as::<_, Count>(
            "SELECT count(*) AS count FROM app_user au WHERE au.email = $1",
        )
        .bind(email)
        .fetch_one(cxn.borrow_connection())
        .await
        .context("detecting user via email")?;

        Ok(users_with_email.count() > 0)
    }
}

#[derive(sqlx::FromRow)]
struct AppUserRow {
    id: i32,
    name: String,
    email: String,
    role: String,
    created_at: DateTime<Utc>,
}

impl TryFrom<AppUserRow> for User {
    type Error = anyhow::Error;

    fn try_from(value: AppUserRow) -> Result<Self, Self::Error> {
        Ok(User {
            id: value.id,
            name: value.name,
            email: value.email,
            role: value.role.parse()?,
            created_at: value.created_at,
        })
    }
}

#[derive(sqlx::FromRow)]
struct CredentialsRow {
    #[sqlx(flatten)]
    user: AppUserRow,
    password_hash: String,
}

impl TryFrom<CredentialsRow> for UserCredentials {
    type Error = anyhow::Error;

    fn try_from(value: CredentialsRow) -> Result<Self, Self::Error> {
        Ok(UserCredentials {
            user: User::try_from(value.user)?,
            password_hash: value.password_hash,
        })
    }
}

pub struct DbReadUsers;

impl domain::user::driven_ports::UserReader for DbReadUsers {
    async fn get_by_id(
        &self,
        id: i32,
        ext_cxn: &mut impl ExternalConnectivity,
    ) -> Result<Option<User>, Error> {
        let mut cxn = ext_cxn.database_cxn().await.map_err(super::anyhowify)?;

        let user_row = query_as::<_, AppUserRow>(
            "SELECT au.id, au.name, au.email, au.role, au.created_at FROM app_user au WHERE au.id = $1",
        )
        .bind(id)
        .fetch_optional(cxn.borrow_connection())
        .await
        .context("fetching a user by id")?;

        user_row.map(User::try_from).transpose()
    }

    async fn credentials_by_email(
        &self,
        email: &str,
        ext_cxn: &mut impl ExternalConnectivity,
    ) -> Result<Option<UserCredentials>, Error> {
        let mut cxn = ext_cxn.database_cxn().await.map_err(super::anyhowify)?;

        let credentials_row = query_as::<_, CredentialsRow>(
            "SELECT au.id, au.name, au.email, au.role, au.created_at, au.password_hash FROM app_user au WHERE au.email = $1",
        )
        .bind(email)
        .fetch_optional(cxn.borrow_connection())
        .await
        .context("fetching user credentials by email")?;

        credentials_row.map(UserCredentials::try_from).transpose()
    }

    async fn employees(&self, ext_cxn: &mut impl ExternalConnectivity) -> Result<Vec<User>, Error> {
        let mut cxn = ext_cxn.database_cxn().await.map_err(super::anyhowify)?;

        query_as::<_, AppUserRow>(
            "SELECT au.id, au.name, au.email, au.role, au.created_at FROM app_user au WHERE au.role = 'employee' ORDER BY au.name, au.id",
        )
        .fetch_all(cxn.borrow_connection())
        .await
        .context("fetching employee accounts")?
        .into_iter()
        .map(User::try_from)
        .collect()
    }
}

pub struct DbWriteUsers;

impl domain::user::driven_ports::UserWriter for DbWriteUsers {
    async fn create_user(
        &self,
        user: &CreateUser,
        ext_cxn: &mut impl ExternalConnectivity,
    ) -> Result<i32, InsertUserError> {
        let mut cxn = ext_cxn.database_cxn().await.map_err(super::anyhowify)?;

        let insert_result = query_as::<_, super::NewId>(
            "INSERT INTO app_user(name, email, password_hash, role) VALUES ($1, $2, $3, $4) RETURNING app_user.id",
        )
        .bind(&user.name)
        .bind(&user.email)
        .bind(&user.password_hash)
        .bind(user.role.as_str())
        .fetch_one(cxn.borrow_connection())
        .await;

        match insert_result {
            Ok(new_id) => Ok(new_id.id),
            Err(sqlx::Error::Database(db_err)) if db_err.is_unique_violation() => {
                Err(InsertUserError::EmailTaken)
            }
            Err(err) => Err(Error::new(err).context("inserting new user").into()),
        }
    }
}
