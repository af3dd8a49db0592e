use axum::extract::FromRequestParts;
use axum::http::header::AUTHORIZATION;
use axum::http::request::Parts;
use uuid::Uuid;

use crate::error::AppError;
use crate::models::Role;
use crate::state::AppState;

/// Bearer トークンで認証済みのリクエスト元
///
/// トークンのペイロードはそのまま信頼する（失効リストなし）
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub user_id: Uuid,
    pub email: String,
    pub role: Role,
}

/// 管理者ロールを要求するエクストラクタ
#[derive(Debug, Clone)]
pub struct AdminUser(pub AuthUser);

/// `Authorization: Bearer <token>` からトークンを取り出す
fn bearer_token(parts: &Parts) -> Option<&str> {
    parts
        .headers
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .map(str::trim)
        .filter(|token| !token.is_empty())
}

impl FromRequestParts<AppState> for AuthUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let token = bearer_token(parts).ok_or(AppError::Unauthorized)?;
        let claims = state.token_service.verify(token)?;

        Ok(Self {
            user_id: claims.user_id,
            email: claims.email,
            role: claims.role,
        })
    }
}

impl FromRequestParts<AppState> for AdminUser {
    type Rejection = AppError;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let user = AuthUser::from_request_parts(parts, state).await?;

        if user.role != Role::Admin {
            tracing::warn!(user_id = %user.user_id, "管理者以外のアクセスを拒否");
            return Err(AppError::Forbidden);
        }

        Ok(Self(user))
    }
}
