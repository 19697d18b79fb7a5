use super::new_id;
use crate::db::Document;
use crate::error::ApiError;
use crate::validation::Violations;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Admin,
    #[default]
    User,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "admin",
            Role::User => "user",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "admin" => Some(Role::Admin),
            "user" => Some(Role::User),
            _ => None,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Stored credential. `password` always holds a bcrypt digest.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    #[serde(rename = "_id")]
    pub id: String,
    pub username: String,
    pub password: String,
    pub role: Role,
    pub created_at: DateTime<Utc>,
}

impl User {
    pub fn new(username: String, digest: String, role: Role) -> Self {
        Self {
            id: new_id(),
            username,
            password: digest,
            role,
            created_at: Utc::now(),
        }
    }

    /// Apply validated changes. `digest` replaces the stored password only
    /// when the update carried a new plaintext.
    pub fn apply(&mut self, changes: UserChanges, digest: Option<String>) {
        if let Some(username) = changes.username {
            self.username = username;
        }
        if let Some(role) = changes.role {
            self.role = role;
        }
        if let Some(digest) = digest {
            self.password = digest;
        }
    }
}

impl Document for User {
    const COLLECTION: &'static str = "users";

    fn id(&self) -> &str {
        &self.id
    }

    fn unique_keys(&self) -> Vec<(&'static str, String)> {
        vec![("username", self.username.clone())]
    }
}

/// Public shape of a user; never carries the digest.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserView {
    #[serde(rename = "_id")]
    pub id: String,
    pub username: String,
    pub role: Role,
    pub created_at: DateTime<Utc>,
}

impl From<&User> for UserView {
    fn from(user: &User) -> Self {
        Self {
            id: user.id.clone(),
            username: user.username.clone(),
            role: user.role,
            created_at: user.created_at,
        }
    }
}

#[derive(Debug, Default, Deserialize)]
pub struct UserInput {
    pub username: Option<String>,
    pub password: Option<String>,
    pub role: Option<String>,
}

/// Validated create payload; `password` is still plaintext.
#[derive(Debug)]
pub struct NewUser {
    pub username: String,
    pub password: String,
    pub role: Role,
}

/// Validated update payload; `password` is still plaintext.
#[derive(Debug, Default)]
pub struct UserChanges {
    pub username: Option<String>,
    pub password: Option<String>,
    pub role: Option<Role>,
}

impl UserInput {
    fn check(&self, v: &mut Violations) -> Option<Role> {
        v.not_blank("username", self.username.as_ref());
        v.not_blank("password", self.password.as_ref());
        match self.role.as_deref() {
            None => None,
            Some(raw) => {
                let role = Role::parse(raw);
                if role.is_none() {
                    v.push("role", "must be one of: admin, user");
                }
                role
            }
        }
    }

    pub fn into_new(self) -> Result<NewUser, ApiError> {
        let mut v = Violations::new();
        v.required("username", self.username.as_ref());
        v.required("password", self.password.as_ref());
        let role = self.check(&mut v);
        v.into_result()?;

        Ok(NewUser {
            username: self.username.unwrap_or_default(),
            password: self.password.unwrap_or_default(),
            role: role.unwrap_or_default(),
        })
    }

    pub fn into_changes(self) -> Result<UserChanges, ApiError> {
        let mut v = Violations::new();
        let role = self.check(&mut v);
        v.into_result()?;

        Ok(UserChanges {
            username: self.username,
            password: self.password,
            role,
        })
    }
}

#[derive(Deserialize)]
pub struct LoginRequest {
    pub username: Option<String>,
    pub password: Option<String>,
}

impl LoginRequest {
    pub fn into_credentials(self) -> Result<(String, String), ApiError> {
        let mut v = Violations::new();
        v.required("username", self.username.as_ref());
        v.required("password", self.password.as_ref());
        v.into_result()?;
        Ok((
            self.username.unwrap_or_default(),
            self.password.unwrap_or_default(),
        ))
    }
}

#[derive(Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub user: UserView,
}

/// Session assertion carried inside a bearer token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    pub username: String,
    pub role: Role,
    pub iat: i64,
    pub exp: i64,
}

/// Verified caller identity attached to a request by the auth gate.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Identity {
    pub subject_id: String,
    pub username: String,
    pub role: Role,
}

impl From<Claims> for Identity {
    fn from(claims: Claims) -> Self {
        Self {
            subject_id: claims.sub,
            username: claims.username,
            role: claims.role,
        }
    }
}
