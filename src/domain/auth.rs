//! Registration, login, and the checks which turn a session token back into a user.

use crate::domain;
use crate::domain::user::driven_ports::{DetectUser, InsertUserError, UserReader, UserWriter};
use crate::domain::user::{CreateUser, NewUser, Role, User, normalize_email};
use crate::external_connections::ExternalConnectivity;
use anyhow::Context;
use tracing::{info, warn};
use validator::Validate;

/// The authenticated user a request is being made on behalf of
#[derive(PartialEq, Eq, Debug, Clone)]
pub struct Identity {
    pub id: i32,
    pub name: String,
    pub email: String,
    pub role: Role,
}

impl From<User> for Identity {
    fn from(value: User) -> Self {
        Identity {
            id: value.id,
            name: value.name,
            email: value.email,
            role: value.role,
        }
    }
}

impl Identity {
    /// Fails with [domain::Error::Forbidden] unless this identity holds one of the allowed roles
    pub fn authorize(&self, allowed_roles: &[Role]) -> Result<(), domain::Error> {
        if allowed_roles.contains(&self.role) {
            Ok(())
        } else {
            Err(domain::Error::forbidden(format!(
                "user role '{}' is not authorized to access this route",
                self.role
            )))
        }
    }
}

/// A successfully established session: who logged in, and the token proving it
#[derive(PartialEq, Eq, Debug, Clone)]
pub struct Session {
    pub identity: Identity,
    pub token: String,
}

pub mod driven_ports {
    use thiserror::Error;

    /// Irreversible, salted password hashing
    pub trait PasswordHasher {
        fn hash_password(&self, password: &str) -> Result<String, anyhow::Error>;
        fn password_matches(&self, password: &str, hash: &str) -> Result<bool, anyhow::Error>;
    }

    #[derive(Debug, Error, PartialEq, Eq)]
    pub enum TokenRejection {
        #[error("session token has expired")]
        Expired,
        #[error("session token is invalid")]
        Invalid,
    }

    /// Issues and verifies signed session tokens carrying a user ID
    pub trait SessionTokens {
        fn issue_token(&self, user_id: i32) -> Result<String, anyhow::Error>;
        fn verify_token(&self, token: &str) -> Result<i32, TokenRejection>;
    }
}

pub mod driving_ports {
    use super::*;
    use thiserror::Error;
    use validator::ValidationErrors;

    #[derive(Debug, Error)]
    pub enum AuthError {
        #[error("input was invalid: {0}")]
        Invalid(#[from] ValidationErrors),
        #[error("user already exists")]
        DuplicateEmail,
        #[error("invalid email or password")]
        InvalidCredentials,
        #[error("not authorized, {0}")]
        Unauthenticated(&'static str),
        #[error(transparent)]
        PortError(#[from] anyhow::Error),
    }


    pub trait AuthPort {
        async fn register(
            &self,
            new_user: &NewUser,
            ext_cxn: &mut impl ExternalConnectivity,
            u_detect: &impl DetectUser,
            u_write: &impl UserWriter,
            hasher: &impl driven_ports::PasswordHasher,
            tokens: &impl driven_ports::SessionTokens,
        ) -> Result<Session, AuthError>;

        async fn login(
            &self,
            email: &str,
            password: &str,
            ext_cxn: &mut impl ExternalConnectivity,
            u_read: &impl UserReader,
            hasher: &impl driven_ports::PasswordHasher,
            tokens: &impl driven_ports::SessionTokens,
        ) -> Result<Session, AuthError>;

        async fn authenticate(
            &self,
            token: &str,
            ext_cxn: &mut impl ExternalConnectivity,
            u_read: &impl UserReader,
            tokens: &impl driven_ports::SessionTokens,
        ) -> Result<Identity, AuthError>;
    }
}

use driving_ports::AuthError;

pub struct AuthService {}

impl driving_ports::AuthPort for AuthService {
    async fn register(
        &self,
        new_user: &NewUser,
        ext_cxn: &mut impl ExternalConnectivity,
        u_detect: &impl DetectUser,
        u_write: &impl UserWriter,
        hasher: &impl driven_ports::PasswordHasher,
        tokens: &impl driven_ports::SessionTokens,
    ) -> Result<Session, AuthError> {
        let new_user = NewUser {
            name: new_user.name.trim().to_owned(),
            email: normalize_email(&new_user.email),
            password: new_user.password.clone(),
            role: new_user.role,
        };
        new_user.validate()?;

        let email_taken = u_detect
            .email_exists(&new_user.email, &mut *ext_cxn)
            .await
            .context("checking for an existing account during registration")?;
        if email_taken {
            return Err(AuthError::DuplicateEmail);
        }

        let to_create = CreateUser {
            name: new_user.name,
            email: new_user.email,
            password_hash: hasher
                .hash_password(&new_user.password)
                .context("hashing a new user's password")?,
            role: new_user.role,
        };
        // The storage layer enforces uniqueness too, in case two registrations race each other
        let user_id = match u_write.create_user(&to_create, &mut *ext_cxn).await {
            Ok(id) => id,
            Err(InsertUserError::EmailTaken) => return Err(AuthError::DuplicateEmail),
            Err(InsertUserError::PortError(err)) => {
                return Err(err.context("creating a user during registration").into());
            }
        };
        info!(user_id, "Registered new {} account", to_create.role);

        let token = tokens
            .issue_token(user_id)
            .context("issuing a session token after registration")?;

        Ok(Session {
            identity: Identity {
                id: user_id,
                name: to_create.name,
                email: to_create.email,
                role: to_create.role,
            },
            token,
        })
    }

    async fn login(
        &self,
        email: &str,
        password: &str,
        ext_cxn: &mut impl ExternalConnectivity,
        u_read: &impl UserReader,
        hasher: &impl driven_ports::PasswordHasher,
        tokens: &impl driven_ports::SessionTokens,
    ) -> Result<Session, AuthError> {
        let credentials = u_read
            .credentials_by_email(&normalize_email(email), &mut *ext_cxn)
            .await
            .context("looking up credentials during login")?;
        let Some(credentials) = credentials else {
            return Err(AuthError::InvalidCredentials);
        };

        let password_ok = hasher
            .password_matches(password, &credentials.password_hash)
            .context("comparing password hashes")?;
        if !password_ok {
            return Err(AuthError::InvalidCredentials);
        }

        let token = tokens
            .issue_token(credentials.user.id)
            .context("issuing a session token at login")?;

        Ok(Session {
            identity: Identity::from(credentials.user),
            token,
        })
    }

    async fn authenticate(
        &self,
        token: &str,
        ext_cxn: &mut impl ExternalConnectivity,
        u_read: &impl UserReader,
        tokens: &impl driven_ports::SessionTokens,
    ) -> Result<Identity, AuthError> {
        let user_id = tokens.verify_token(token).map_err(|rejection| {
            warn!("Rejected session token: {rejection}");
            AuthError::Unauthenticated("token failed")
        })?;

        let user = u_read
            .get_by_id(user_id, &mut *ext_cxn)
            .await
            .context("resolving the subject of a session token")?;
        match user {
            Some(user) => Ok(Identity::from(user)),
            None => {
                warn!(user_id, "Session token refers to a user that no longer exists");
                Err(AuthError::Unauthenticated("token failed"))
            }
        }
    }
}
