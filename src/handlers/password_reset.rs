use axum::{Json, extract::State};
use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::extract::AppJson;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct PasswordResetResponse {
    pub success: bool,
    pub message: String,
}

// === リセットリクエスト ===

#[derive(Debug, Deserialize)]
pub struct ForgotPasswordRequest {
    #[serde(default)]
    pub email: String,
}

/// POST /api/auth/forgot-password
///
/// # Note
/// 未登録のメールアドレスには 400 を返す
pub async fn forgot_password(
    State(state): State<AppState>,
    AppJson(request): AppJson<ForgotPasswordRequest>,
) -> Result<Json<PasswordResetResponse>, AppError> {
    // バリデーション
    validate_email(&request.email)?;

    state
        .password_reset_service
        .request_reset(&request.email)
        .await?;

    Ok(Json(PasswordResetResponse {
        success: true,
        message: "Password reset link sent to your email".to_string(),
    }))
}

// === パスワードリセット実行 ===

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResetPasswordRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub token: String,
    #[serde(default)]
    pub new_password: String,
}

/// POST /api/auth/reset-password
///
/// # Security
/// - token, new_password はログに出力しない
pub async fn reset_password(
    State(state): State<AppState>,
    AppJson(request): AppJson<ResetPasswordRequest>,
) -> Result<Json<PasswordResetResponse>, AppError> {
    // バリデーション
    validate_reset_password_request(&request)?;

    state
        .password_reset_service
        .reset_password(&request.email, &request.token, &request.new_password)
        .await?;

    Ok(Json(PasswordResetResponse {
        success: true,
        message: "Password has been reset successfully".to_string(),
    }))
}

/// メールアドレスのバリデーション
fn validate_email(email: &str) -> Result<(), AppError> {
    if email.trim().is_empty() {
        return Err(AppError::Validation("Email required".to_string()));
    }
    Ok(())
}

/// リセットパスワードリクエストのバリデーション
fn validate_reset_password_request(request: &ResetPasswordRequest) -> Result<(), AppError> {
    validate_email(&request.email)?;
    if request.token.trim().is_empty() {
        return Err(AppError::Validation("Token is required".to_string()));
    }
    if request.new_password.is_empty() {
        return Err(AppError::Validation("New password is required".to_string()));
    }
    Ok(())
}
