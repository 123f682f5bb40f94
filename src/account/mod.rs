/// Account management system
///
/// Handles registration with double opt-in, credential checks, bearer
/// sessions and profile maintenance.
mod manager;
pub mod password;

pub use manager::{AccountManager, Registration, VerifyOutcome};

use crate::{
    db::models::User,
    error::{TrackerError, TrackerResult},
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

/// Registration request
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct RegisterRequest {
    #[validate(length(min = 3, max = 50, message = "Name must be between 3 and 50 characters"))]
    pub name: String,
    #[validate(email(message = "Invalid email address"))]
    pub email: String,
    pub password: String,
}

impl RegisterRequest {
    /// Strip surrounding whitespace from name and email before validation
    pub fn trimmed(self) -> Self {
        Self {
            name: self.name.trim().to_string(),
            email: self.email.trim().to_string(),
            password: self.password,
        }
    }
}

/// Email verification request
#[derive(Debug, Clone, Deserialize)]
pub struct VerifyRequest {
    pub email: String,
    pub code: String,
}

/// Login request
#[derive(Debug, Clone, Deserialize)]
pub struct LoginRequest {
    pub name: String,
    pub password: String,
}

/// Response for register and login
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginSuccess {
    pub success: bool,
    pub token: Option<String>,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

/// Profile update; absent fields stay unchanged
#[derive(Debug, Clone, Default, Deserialize, Validate)]
pub struct UserUpdate {
    #[validate(length(min = 3, max = 50, message = "Name must be between 3 and 50 characters"))]
    pub name: Option<String>,
    #[validate(email(message = "Invalid email address"))]
    pub email: Option<String>,
    pub password: Option<String>,
}

impl UserUpdate {
    pub fn trimmed(self) -> Self {
        Self {
            name: self.name.map(|name| name.trim().to_string()),
            email: self.email.map(|email| email.trim().to_string()),
            password: self.password,
        }
    }
}

/// Registration body of the older `/api` client
#[derive(Debug, Clone, Deserialize)]
pub struct LegacyRegisterRequest {
    pub username: String,
    #[serde(default)]
    pub email: String,
    pub password: String,
}

impl From<LegacyRegisterRequest> for RegisterRequest {
    fn from(req: LegacyRegisterRequest) -> Self {
        Self {
            name: req.username,
            email: req.email,
            password: req.password,
        }
    }
}

/// Login body of the older `/api` client
#[derive(Debug, Clone, Deserialize)]
pub struct LegacyLoginRequest {
    pub username: String,
    pub password: String,
}

/// Login response of the older `/api` client
#[derive(Debug, Clone, Serialize)]
pub struct LegacyLoginSuccess {
    pub success: bool,
    pub token: String,
    pub username: String,
}

/// Public view of a user
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserOut {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub created_at: DateTime<Utc>,
    pub is_active: bool,
}

impl From<&User> for UserOut {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            name: user.name.clone(),
            email: user.email.clone(),
            created_at: user.created_at,
            is_active: user.is_active,
        }
    }
}

/// Run derive-based validation and map failures into a 400
pub(crate) fn validate_request<T: Validate>(request: &T) -> TrackerResult<()> {
    request
        .validate()
        .map_err(|e| TrackerError::Validation(e.to_string()))
}
