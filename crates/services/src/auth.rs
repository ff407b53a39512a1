//! Registration, login, and session verification.

use std::sync::Arc;

use chrono::Utc;
use domains::{
    DomainError, NewUser, PasswordHasher, Profile, Result, TokenIssuer, User, UserRepository,
};
use serde::Serialize;
use tracing::{debug, info};
use uuid::Uuid;

pub const MIN_USERNAME_LEN: usize = 3;
pub const MIN_PASSWORD_LEN: usize = 6;

/// A successful login: the signed session token and the public user.
#[derive(Debug, Clone, Serialize)]
pub struct Session {
    pub token: String,
    pub user: Profile,
}

pub struct AuthService {
    users: Arc<dyn UserRepository>,
    hasher: Arc<dyn PasswordHasher>,
    tokens: Arc<dyn TokenIssuer>,
}

impl AuthService {
    pub fn new(
        users: Arc<dyn UserRepository>,
        hasher: Arc<dyn PasswordHasher>,
        tokens: Arc<dyn TokenIssuer>,
    ) -> Self {
        Self { users, hasher, tokens }
    }

    /// Creates an account. The password is hashed before it reaches the store.
    pub async fn register(&self, new_user: NewUser) -> Result<Profile> {
        validate(&new_user)?;

        let password_hash = self.hasher.hash(&new_user.password)?;
        let now = Utc::now();
        let user = User {
            id: Uuid::now_v7(),
            username: new_user.username.trim().to_string(),
            email: new_user.email.trim().to_string(),
            password_hash,
            name: new_user.name,
            mobile: new_user.mobile,
            college_name: new_user.college_name,
            dob: new_user.dob,
            posts: Vec::new(),
            created_at: now,
            updated_at: now,
        };

        let user = self.users.insert(user).await?;
        info!(user_id = %user.id, username = %user.username, "user registered");
        Ok(Profile::from(&user))
    }

    /// Looks the user up by email and checks the password.
    ///
    /// An unknown email and a wrong password are logged differently but both
    /// return `InvalidCredentials`.
    pub async fn login(&self, email: &str, password: &str) -> Result<Session> {
        let Some(user) = self.users.find_by_email(email.trim()).await? else {
            debug!("login failed: no user with that email");
            return Err(DomainError::InvalidCredentials);
        };

        if !self.hasher.verify(password, &user.password_hash)? {
            debug!(user_id = %user.id, "login failed: wrong password");
            return Err(DomainError::InvalidCredentials);
        }

        let token = self.tokens.issue(user.id)?;
        info!(user_id = %user.id, "user logged in");
        Ok(Session { token, user: Profile::from(&user) })
    }

    /// Resolves a session token to the user id it was issued for.
    pub fn authenticate(&self, token: &str) -> Result<Uuid> {
        self.tokens.verify(token).map_err(|e| {
            debug!(error = %e, "rejected session token");
            DomainError::Unauthenticated
        })
    }
}

fn validate(new_user: &NewUser) -> Result<()> {
    let required = [
        ("email", &new_user.email),
        ("name", &new_user.name),
        ("mobile", &new_user.mobile),
        ("collegeName", &new_user.college_name),
    ];
    if let Some((field, _)) = required.iter().find(|(_, v)| v.trim().is_empty()) {
        return Err(DomainError::Validation(format!("{field} is required")));
    }
    if new_user.username.trim().chars().count() < MIN_USERNAME_LEN {
        return Err(DomainError::Validation(format!(
            "username must be at least {MIN_USERNAME_LEN} characters"
        )));
    }
    if !new_user.email.contains('@') {
        return Err(DomainError::Validation("email is invalid".into()));
    }
    if new_user.password.chars().count() < MIN_PASSWORD_LEN {
        return Err(DomainError::Validation(format!(
            "password must be at least {MIN_PASSWORD_LEN} characters"
        )));
    }
    Ok(())
}
