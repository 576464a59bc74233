//! JWT-based current-member extractor for Axum handlers.

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use projectree_core::error::CoreError;
use projectree_core::types::DbId;
use projectree_db::repositories::MemberRepo;

use crate::auth::jwt::verify_member_token;
use crate::error::AppError;
use crate::state::AppState;

/// The authenticated member behind a Bearer token.
///
/// The token must validate and its subject must be a live member; anything
/// else is rejected as unauthorized.
///
/// ```ignore
/// async fn my_handler(user: AuthUser) -> AppResult<Json<()>> {
///     tracing::info!(member_id = user.member_id, "handling request");
///     Ok(Json(()))
/// }
/// ```
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub member_id: DbId,
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let auth_header = parts
            .headers
            .get("authorization")
            .and_then(|v| v.to_str().ok())
            .ok_or_else(|| {
                AppError::Core(CoreError::Unauthorized(
                    "Missing Authorization header".into(),
                ))
            })?;

        let token = auth_header.strip_prefix("Bearer ").ok_or_else(|| {
            AppError::Core(CoreError::Unauthorized(
                "Invalid Authorization format. Expected: Bearer <token>".into(),
            ))
        })?;

        let claims = verify_member_token(token, &state.config.jwt).map_err(|_| {
            AppError::Core(CoreError::Unauthorized("Invalid or expired token".into()))
        })?;

        let member = MemberRepo::find_by_id(&state.pool, claims.sub)
            .await?
            .ok_or_else(|| {
                AppError::Core(CoreError::Unauthorized("Unknown member".into()))
            })?;

        Ok(AuthUser {
            member_id: member.id,
        })
    }
}
