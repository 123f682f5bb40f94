/// Account manager implementation using runtime queries
use super::{
    password::{generate_verification_code, hash_password, validate_password_policy, verify_password},
    validate_request, RegisterRequest, UserUpdate,
};
use crate::{
    config::ServerConfig,
    db::models::{Session, User},
    error::{TrackerError, TrackerResult},
    mailer::VerificationMailer,
    schema::registry::seed_defaults_in,
};
use chrono::{DateTime, Duration, Utc};
use sqlx::{SqliteConnection, SqlitePool};
use std::sync::Arc;
use uuid::Uuid;

const USER_COLUMNS: &str = "id, name, email, password_hash, created_at, is_active, verification_code";
const SESSION_COLUMNS: &str = "id, token, user_id, created_at, expires_at";

/// Result of a successful registration
#[derive(Debug, Clone)]
pub struct Registration {
    pub user: User,
    /// Issued right away only when email verification is disabled
    pub session: Option<Session>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VerifyOutcome {
    Activated,
    AlreadyActive,
}

/// Account manager service
#[derive(Clone)]
pub struct AccountManager {
    db: SqlitePool,
    config: Arc<ServerConfig>,
    mailer: Arc<dyn VerificationMailer>,
}

impl AccountManager {
    /// Create a new account manager
    pub fn new(db: SqlitePool, config: Arc<ServerConfig>, mailer: Arc<dyn VerificationMailer>) -> Self {
        Self { db, config, mailer }
    }

    fn grace_window(&self) -> Duration {
        Duration::minutes(self.config.authentication.registration_grace_minutes)
    }

    /// Register a new user and seed their default categories.
    ///
    /// With verification enabled the user starts inactive and receives a code
    /// by mail; otherwise a session is issued immediately.
    pub async fn register(&self, request: RegisterRequest) -> TrackerResult<Registration> {
        let request = request.trimmed();
        validate_request(&request)?;
        validate_password_policy(&request.password).map_err(TrackerError::Validation)?;

        let name = request.name;
        let email = request.email;
        let password_hash = hash_blocking(request.password).await?;

        let verification = self.config.authentication.email_verification;
        let verification_code = verification.then(generate_verification_code);
        let now = Utc::now();

        let mut tx = self.db.begin().await?;

        self.clear_registration_conflicts(&mut tx, &name, &email, now)
            .await?;

        let user_id = sqlx::query(
            "INSERT INTO users (name, email, password_hash, created_at, is_active, verification_code)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        )
        .bind(&name)
        .bind(&email)
        .bind(&password_hash)
        .bind(now)
        .bind(!verification)
        .bind(&verification_code)
        .execute(&mut *tx)
        .await
        .map_err(|e| map_unique_violation(e, "Name or email address is already taken"))?
        .last_insert_rowid();

        seed_defaults_in(&mut tx, user_id).await?;

        let session = if verification {
            None
        } else {
            Some(self.issue_session_in(&mut tx, user_id).await?)
        };

        tx.commit().await?;

        let user = User {
            id: user_id,
            name,
            email,
            password_hash,
            created_at: now,
            is_active: !verification,
            verification_code,
        };

        if let Some(ref code) = user.verification_code {
            if let Err(e) = self
                .mailer
                .send_verification_code(&user.email, &user.name, code)
                .await
            {
                // Roll the pending account back so the name and email are free again
                sqlx::query("DELETE FROM users WHERE id = ?1 AND is_active = 0")
                    .bind(user.id)
                    .execute(&self.db)
                    .await?;
                tracing::warn!(user_id = user.id, error = %e, "Verification mail failed, registration withdrawn");
                return Err(e);
            }
        }

        tracing::info!(user_id = user.id, pending = verification, "Registered user");

        Ok(Registration { user, session })
    }

    /// Reject registrations that collide with an active or freshly pending
    /// account, and delete pending accounts whose grace window has passed.
    async fn clear_registration_conflicts(
        &self,
        conn: &mut SqliteConnection,
        name: &str,
        email: &str,
        now: DateTime<Utc>,
    ) -> TrackerResult<()> {
        let matches: Vec<User> = sqlx::query_as(&format!(
            "SELECT {} FROM users WHERE name = ?1 OR email = ?2",
            USER_COLUMNS
        ))
        .bind(name)
        .bind(email)
        .fetch_all(&mut *conn)
        .await?;

        let cutoff = now - self.grace_window();
        let mut stale = Vec::new();

        for existing in matches {
            if existing.is_active {
                return Err(TrackerError::Conflict(
                    "Name or email address is already taken".to_string(),
                ));
            }
            if existing.created_at >= cutoff {
                return Err(TrackerError::Conflict(format!(
                    "Registration already started. Check your email or wait {} minutes",
                    self.config.authentication.registration_grace_minutes
                )));
            }
            stale.push(existing.id);
        }

        for user_id in stale {
            sqlx::query("DELETE FROM users WHERE id = ?1 AND is_active = 0")
                .bind(user_id)
                .execute(&mut *conn)
                .await?;
            tracing::info!(user_id, "Removed stale pending registration");
        }

        Ok(())
    }

    /// Activate a pending account with the code from the verification mail
    pub async fn verify(&self, email: &str, code: &str) -> TrackerResult<VerifyOutcome> {
        let user = self
            .get_user_by_email(email.trim())
            .await?
            .ok_or_else(|| TrackerError::NotFound("User not found".to_string()))?;

        if user.is_active {
            return Ok(VerifyOutcome::AlreadyActive);
        }

        if user.verification_code.as_deref() != Some(code.trim()) {
            return Err(TrackerError::InvalidCode);
        }

        sqlx::query(
            "UPDATE users SET is_active = 1, verification_code = NULL
             WHERE id = ?1 AND is_active = 0",
        )
        .bind(user.id)
        .execute(&self.db)
        .await?;

        tracing::info!(user_id = user.id, "Activated account");
        Ok(VerifyOutcome::Activated)
    }

    /// Check credentials and open a new session
    pub async fn login(&self, name: &str, password: &str) -> TrackerResult<(User, Session)> {
        let invalid = || TrackerError::Unauthenticated("Incorrect name or password".to_string());

        let user: User = sqlx::query_as(&format!("SELECT {} FROM users WHERE name = ?1", USER_COLUMNS))
            .bind(name.trim())
            .fetch_optional(&self.db)
            .await?
            .ok_or_else(invalid)?;

        if !verify_blocking(password.to_string(), user.password_hash.clone()).await? {
            tracing::debug!(user_id = user.id, "Rejected login with wrong password");
            return Err(invalid());
        }

        if !user.is_active {
            return Err(TrackerError::Inactive(
                "Account is not activated yet, please complete email verification".to_string(),
            ));
        }

        let session = self.issue_session(user.id).await?;
        Ok((user, session))
    }

    /// Create a session for a user
    pub async fn issue_session(&self, user_id: i64) -> TrackerResult<Session> {
        let mut conn = self.db.acquire().await?;
        self.issue_session_in(&mut conn, user_id).await
    }

    async fn issue_session_in(&self, conn: &mut SqliteConnection, user_id: i64) -> TrackerResult<Session> {
        let token = Uuid::new_v4().to_string();
        let created_at = Utc::now();
        let expires_at = created_at + Duration::days(self.config.authentication.session_ttl_days);

        let id = sqlx::query(
            "INSERT INTO sessions (token, user_id, created_at, expires_at)
             VALUES (?1, ?2, ?3, ?4)",
        )
        .bind(&token)
        .bind(user_id)
        .bind(created_at)
        .bind(expires_at)
        .execute(&mut *conn)
        .await?
        .last_insert_rowid();

        Ok(Session {
            id,
            token,
            user_id,
            created_at,
            expires_at,
        })
    }

    /// Resolve a bearer token to its active user
    pub async fn authenticate(&self, token: &str) -> TrackerResult<User> {
        self.authenticate_at(token, Utc::now()).await
    }

    /// Resolve a bearer token as of a given instant
    pub async fn authenticate_at(&self, token: &str, now: DateTime<Utc>) -> TrackerResult<User> {
        let session: Session = sqlx::query_as(&format!(
            "SELECT {} FROM sessions WHERE token = ?1",
            SESSION_COLUMNS
        ))
        .bind(token)
        .fetch_optional(&self.db)
        .await?
        .ok_or_else(|| TrackerError::Unauthenticated("Invalid or expired token".to_string()))?;

        if session.is_expired_at(now) {
            return Err(TrackerError::Expired);
        }

        let user = self
            .get_user_by_id(session.user_id)
            .await?
            .ok_or_else(|| TrackerError::Unauthenticated("Invalid or expired token".to_string()))?;

        if !user.is_active {
            return Err(TrackerError::Inactive("Account is not activated".to_string()));
        }

        Ok(user)
    }

    /// Delete the session behind a token
    pub async fn logout(&self, token: &str) -> TrackerResult<()> {
        sqlx::query("DELETE FROM sessions WHERE token = ?1")
            .bind(token)
            .execute(&self.db)
            .await?;
        Ok(())
    }

    pub async fn get_user(&self, user_id: i64) -> TrackerResult<User> {
        self.get_user_by_id(user_id)
            .await?
            .ok_or_else(|| TrackerError::NotFound("User not found".to_string()))
    }

    async fn get_user_by_id(&self, user_id: i64) -> TrackerResult<Option<User>> {
        let user = sqlx::query_as(&format!("SELECT {} FROM users WHERE id = ?1", USER_COLUMNS))
            .bind(user_id)
            .fetch_optional(&self.db)
            .await?;
        Ok(user)
    }

    async fn get_user_by_email(&self, email: &str) -> TrackerResult<Option<User>> {
        let user = sqlx::query_as(&format!("SELECT {} FROM users WHERE email = ?1", USER_COLUMNS))
            .bind(email)
            .fetch_optional(&self.db)
            .await?;
        Ok(user)
    }

    /// Change name, email or password of a user
    pub async fn update_user(&self, user_id: i64, update: UserUpdate) -> TrackerResult<User> {
        let update = update.trimmed();
        validate_request(&update)?;

        let password_hash = match update.password {
            Some(password) => {
                validate_password_policy(&password).map_err(TrackerError::Validation)?;
                Some(hash_blocking(password).await?)
            }
            None => None,
        };
        let name = update.name.as_deref();
        let email = update.email.as_deref();

        let mut tx = self.db.begin().await?;

        if let Some(name) = name {
            let taken: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE name = ?1 AND id != ?2")
                .bind(name)
                .bind(user_id)
                .fetch_one(&mut *tx)
                .await?;
            if taken > 0 {
                return Err(TrackerError::Conflict("Name is already taken".to_string()));
            }
        }

        if let Some(email) = email {
            let taken: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM users WHERE email = ?1 AND id != ?2")
                .bind(email)
                .bind(user_id)
                .fetch_one(&mut *tx)
                .await?;
            if taken > 0 {
                return Err(TrackerError::Conflict("Email address is already taken".to_string()));
            }
        }

        let result = sqlx::query(
            "UPDATE users
             SET name = COALESCE(?1, name), email = COALESCE(?2, email),
                 password_hash = COALESCE(?3, password_hash)
             WHERE id = ?4",
        )
        .bind(name)
        .bind(email)
        .bind(&password_hash)
        .bind(user_id)
        .execute(&mut *tx)
        .await
        .map_err(|e| map_unique_violation(e, "Name or email address is already taken"))?;

        if result.rows_affected() == 0 {
            return Err(TrackerError::NotFound("User not found".to_string()));
        }

        let user: User = sqlx::query_as(&format!("SELECT {} FROM users WHERE id = ?1", USER_COLUMNS))
            .bind(user_id)
            .fetch_one(&mut *tx)
            .await?;
        tx.commit().await?;

        Ok(user)
    }

    /// Delete a user with all sessions, categories and entries
    pub async fn delete_user(&self, user_id: i64) -> TrackerResult<()> {
        let result = sqlx::query("DELETE FROM users WHERE id = ?1")
            .bind(user_id)
            .execute(&self.db)
            .await?;

        if result.rows_affected() == 0 {
            return Err(TrackerError::NotFound("User not found".to_string()));
        }

        tracing::info!(user_id, "Deleted user");
        Ok(())
    }

    /// Remove every session whose expiry has passed
    pub async fn cleanup_expired_sessions(&self) -> TrackerResult<u64> {
        let result = sqlx::query("DELETE FROM sessions WHERE julianday(expires_at) < julianday(?1)")
            .bind(Utc::now())
            .execute(&self.db)
            .await?;
        Ok(result.rows_affected())
    }

    /// Remove inactive accounts older than the registration grace window
    pub async fn purge_unverified_users(&self) -> TrackerResult<u64> {
        let cutoff = Utc::now() - self.grace_window();
        let result = sqlx::query(
            "DELETE FROM users WHERE is_active = 0 AND julianday(created_at) < julianday(?1)",
        )
        .bind(cutoff)
        .execute(&self.db)
        .await?;
        Ok(result.rows_affected())
    }
}

async fn hash_blocking(password: String) -> TrackerResult<String> {
    tokio::task::spawn_blocking(move || hash_password(&password))
        .await
        .map_err(|e| TrackerError::Internal(format!("Hashing task failed: {}", e)))?
        .map_err(|e| TrackerError::PasswordHash(e.to_string()))
}

async fn verify_blocking(password: String, hash: String) -> TrackerResult<bool> {
    tokio::task::spawn_blocking(move || verify_password(&password, &hash))
        .await
        .map_err(|e| TrackerError::Internal(format!("Verification task failed: {}", e)))?
        .map_err(|e| TrackerError::PasswordHash(e.to_string()))
}

fn map_unique_violation(error: sqlx::Error, message: &str) -> TrackerError {
    match error {
        sqlx::Error::Database(ref db_error) if db_error.is_unique_violation() => {
            TrackerError::Conflict(message.to_string())
        }
        other => TrackerError::Database(other),
    }
}
