use axum::{async_trait, extract::FromRequestParts, http::request::Parts};
use uuid::Uuid;

use crate::errors::AppError;
use crate::state::AppState;
use crate::store::postgres::PgAnalysisStore;

/// Header carrying the authenticated user id, set by the upstream gateway.
pub const CALLER_HEADER: &str = "x-user-id";

/// Request-scoped store acting as the calling user.
/// Rejects the request with 401 when the caller cannot be identified.
pub struct CallerStore(pub PgAnalysisStore);

pub fn caller_id(parts: &Parts) -> Option<Uuid> {
    parts
        .headers
        .get(CALLER_HEADER)
        .and_then(|v| v.to_str().ok())
        .and_then(|v| Uuid::parse_str(v.trim()).ok())
        .filter(|id| !id.is_nil())
}

#[async_trait]
impl FromRequestParts<AppState> for CallerStore {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let user_id = caller_id(parts).ok_or(AppError::Unauthorized)?;
        Ok(CallerStore(state.caller_store(user_id)))
    }
}
