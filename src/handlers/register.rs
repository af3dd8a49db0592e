use axum::{Json, extract::State, http::StatusCode};
use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::extract::AppJson;
use crate::state::AppState;

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub password: String, // SecretBox不要（Deserialize後すぐハッシュ化）
}

#[derive(Debug, Serialize)]
pub struct RegisterResponse {
    pub success: bool,
    pub message: String,
}

/// ユーザー登録ハンドラー
///
/// POST /api/auth/register
///
/// # Security
/// - パスワードはログに出力しない
/// - パスワードは即座にハッシュ化
pub async fn register(
    State(state): State<AppState>,
    AppJson(request): AppJson<RegisterRequest>,
) -> Result<(StatusCode, Json<RegisterResponse>), AppError> {
    // バリデーション
    validate_register_request(&request)?;

    state
        .auth_service
        .register(request.name.trim(), &request.email, &request.password)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(RegisterResponse {
            success: true,
            message: "User registered successfully.".to_string(),
        }),
    ))
}

/// 登録リクエストのバリデーション
fn validate_register_request(request: &RegisterRequest) -> Result<(), AppError> {
    if request.name.trim().is_empty() {
        return Err(AppError::Validation("Name is required.".to_string()));
    }
    // email: 必須、メール形式
    if request.email.trim().is_empty() {
        return Err(AppError::Validation("Email is required.".to_string()));
    }
    if !request.email.contains('@') {
        return Err(AppError::Validation(
            "Please enter a valid email address.".to_string(),
        ));
    }
    if request.password.is_empty() {
        return Err(AppError::Validation("Password is required.".to_string()));
    }
    Ok(())
}
