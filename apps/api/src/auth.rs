//! Caller identity.
//!
//! Authentication happens upstream; by the time a request reaches this
//! service the gateway has resolved the caller into headers.

use axum::{async_trait, extract::FromRequestParts, http::request::Parts, http::HeaderMap};
use tracing::warn;

use crate::errors::AppError;
use crate::models::user::User;
use crate::state::AppState;

pub const USER_ID_HEADER: &str = "x-user-id";
pub const ADMIN_KEY_HEADER: &str = "x-admin-key";

/// The authenticated end user, loaded fresh for every request.
#[derive(Debug, Clone)]
pub struct CurrentUser(pub User);

/// Marker extractor for admin-only routes.
#[derive(Debug, Clone, Copy)]
pub struct AdminUser;

fn header_str<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get(name)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
}

#[async_trait]
impl FromRequestParts<AppState> for CurrentUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, AppError> {
        let user_id = header_str(&parts.headers, USER_ID_HEADER)
            .and_then(|v| v.parse::<i64>().ok())
            .ok_or(AppError::Unauthorized)?;

        match state.ledger.get_user(user_id).await? {
            Some(user) => Ok(CurrentUser(user)),
            None => {
                warn!("Rejected request for unknown user {user_id}");
                Err(AppError::Unauthorized)
            }
        }
    }
}

#[async_trait]
impl FromRequestParts<AppState> for AdminUser {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, AppError> {
        match header_str(&parts.headers, ADMIN_KEY_HEADER) {
            Some(key) if key == state.config.admin_api_key => Ok(AdminUser),
            Some(_) => {
                warn!("Rejected admin request with a wrong key");
                Err(AppError::Forbidden)
            }
            None => Err(AppError::Forbidden),
        }
    }
}
