/// Authentication extractor
use crate::{
    api::middleware::extract_bearer_token, context::AppContext, db::models::User,
    error::TrackerError,
};
use axum::{async_trait, extract::FromRequestParts, http::request::Parts};

/// Authenticated user, resolved from the bearer token
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user: User,
    pub token: String,
}

impl AuthUser {
    pub fn id(&self) -> i64 {
        self.user.id
    }
}

#[async_trait]
impl FromRequestParts<AppContext> for AuthUser {
    type Rejection = TrackerError;

    async fn from_request_parts(parts: &mut Parts, state: &AppContext) -> Result<Self, Self::Rejection> {
        let token = extract_bearer_token(&parts.headers).ok_or_else(|| {
            TrackerError::Unauthenticated("Missing authorization header".to_string())
        })?;

        let user = state.account_manager.authenticate(&token).await?;

        Ok(AuthUser { user, token })
    }
}
