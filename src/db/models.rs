/// Database row types
use crate::entries::ValueMap;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::{types::Json, FromRow};

/// User record in the database
#[derive(Debug, Clone, FromRow)]
pub struct User {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub created_at: DateTime<Utc>,
    pub is_active: bool,
    /// Pending double opt-in code, cleared on activation
    pub verification_code: Option<String>,
}

/// Session record in the database
#[derive(Debug, Clone, FromRow, Serialize, Deserialize)]
pub struct Session {
    pub id: i64,
    pub token: String,
    pub user_id: i64,
    pub created_at: DateTime<Utc>,
    pub expires_at: DateTime<Utc>,
}

impl Session {
    /// A session is usable up to and including its expiry instant
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now > self.expires_at
    }
}

/// Category record (without its fields)
#[derive(Debug, Clone, FromRow)]
pub struct CategoryRow {
    pub id: i64,
    pub user_id: i64,
    pub name: String,
    pub description: Option<String>,
    pub is_system_default: bool,
    pub created_at: DateTime<Utc>,
}

/// Category field record
#[derive(Debug, Clone, FromRow)]
pub struct CategoryFieldRow {
    pub id: i64,
    pub category_id: i64,
    pub position: i64,
    pub label: String,
    pub data_type: String,
    pub unit: Option<String>,
}

/// Entry record with its denormalized value map
#[derive(Debug, Clone, FromRow)]
pub struct EntryRow {
    pub id: i64,
    pub user_id: i64,
    pub category_id: i64,
    pub occurred_at: DateTime<Utc>,
    pub created_at: DateTime<Utc>,
    pub note: Option<String>,
    pub data: Json<ValueMap>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_session_expiry_boundary() {
        let expires_at = Utc::now();
        let session = Session {
            id: 1,
            token: "t".to_string(),
            user_id: 1,
            created_at: expires_at - Duration::days(30),
            expires_at,
        };

        assert!(!session.is_expired_at(expires_at - Duration::seconds(1)));
        assert!(!session.is_expired_at(expires_at));
        assert!(session.is_expired_at(expires_at + Duration::milliseconds(1)));
    }
}
