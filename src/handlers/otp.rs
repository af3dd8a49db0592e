use axum::{Json, extract::State};
use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::extract::AppJson;
use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct OtpResponse {
    pub success: bool,
    pub message: String,
}

// === コード送信 ===

#[derive(Debug, Deserialize)]
pub struct SendOtpRequest {
    #[serde(default)]
    pub email: String,
}

/// POST /api/auth/send-otp
///
/// メールアドレス確認用の6桁コードを発行して送信
pub async fn send_otp(
    State(state): State<AppState>,
    AppJson(request): AppJson<SendOtpRequest>,
) -> Result<Json<OtpResponse>, AppError> {
    if request.email.trim().is_empty() {
        return Err(AppError::Validation("Email required".to_string()));
    }

    state.otp_service.issue(&request.email).await?;

    Ok(Json(OtpResponse {
        success: true,
        message: "OTP sent".to_string(),
    }))
}

// === コード検証 ===

#[derive(Debug, Deserialize)]
pub struct VerifyOtpRequest {
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub otp: String,
}

/// POST /api/auth/verify-otp
///
/// # Security
/// - コードはログ出力禁止
pub async fn verify_otp(
    State(state): State<AppState>,
    AppJson(request): AppJson<VerifyOtpRequest>,
) -> Result<Json<OtpResponse>, AppError> {
    state
        .otp_service
        .verify(&request.email, &request.otp)
        .await?;

    Ok(Json(OtpResponse {
        success: true,
        message: "OTP verified".to_string(),
    }))
}
