use axum::{Json, extract::State};
use serde::Serialize;

use crate::error::AppError;
use crate::middleware::AdminUser;
use crate::models::User;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct UserListResponse {
    pub success: bool,
    /// password_hash はシリアライズされない
    pub users: Vec<User>,
}

/// GET /api/contacts/users
///
/// 登録ユーザー一覧（管理者のみ、新しい順）
pub async fn list_users(
    State(state): State<AppState>,
    _admin: AdminUser,
) -> Result<Json<UserListResponse>, AppError> {
    let users = state.user_store.list_all().await?;

    Ok(Json(UserListResponse {
        success: true,
        users,
    }))
}
