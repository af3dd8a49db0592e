use axum::{
    Json,
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde::Serialize;

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("バリデーションエラー: {0}")]
    Validation(String),

    #[error("このメールアドレスは既に使用されています")]
    DuplicateEmail,

    #[error("認証エラー")]
    InvalidCredentials,

    #[error("ワンタイムコードが見つかりません")]
    NoOtpFound,

    #[error("ワンタイムコードの有効期限切れ")]
    OtpExpired,

    #[error("ワンタイムコードが一致しません")]
    InvalidOtp,

    #[error("メールアドレスが登録されていません")]
    EmailNotFound,

    #[error("無効または期限切れのリセットトークン")]
    InvalidOrExpiredToken,

    #[error("認証トークンがない、または無効")]
    Unauthorized,

    #[error("管理者権限がありません")]
    Forbidden,

    #[error("リソースが見つかりません: {0}")]
    NotFound(String),

    #[error("メール送信エラー")]
    EmailDelivery(#[source] anyhow::Error),

    #[error("データベースエラー")]
    Database(#[from] sqlx::Error),

    #[error("内部エラー")]
    Internal(#[from] anyhow::Error),
}

#[derive(Serialize)]
struct ErrorResponse {
    success: bool,
    error: String,
}

impl AppError {
    /// HTTP ステータスとクライアント向けメッセージ
    fn status_and_message(&self) -> (StatusCode, String) {
        match self {
            Self::Validation(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            Self::DuplicateEmail => (StatusCode::BAD_REQUEST, "Email already in use.".to_string()),
            // 存在有無・未認証を区別しない
            Self::InvalidCredentials => {
                (StatusCode::BAD_REQUEST, "Invalid credentials.".to_string())
            }
            Self::NoOtpFound => (StatusCode::BAD_REQUEST, "No OTP found".to_string()),
            Self::OtpExpired => (StatusCode::BAD_REQUEST, "OTP expired".to_string()),
            Self::InvalidOtp => (StatusCode::BAD_REQUEST, "Invalid OTP".to_string()),
            Self::EmailNotFound => (StatusCode::BAD_REQUEST, "Email not found".to_string()),
            Self::InvalidOrExpiredToken => (
                StatusCode::BAD_REQUEST,
                "Invalid or expired token".to_string(),
            ),
            Self::Unauthorized => (
                StatusCode::UNAUTHORIZED,
                "Authentication required".to_string(),
            ),
            Self::Forbidden => (StatusCode::FORBIDDEN, "Unauthorized".to_string()),
            Self::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone()),
            Self::EmailDelivery(e) => {
                tracing::error!(error = ?e, "メール送信エラー");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Failed to send email".to_string(),
                )
            }
            Self::Database(e) => {
                tracing::error!(error = ?e, "データベースエラー");
                (StatusCode::INTERNAL_SERVER_ERROR, "Server error.".to_string())
            }
            Self::Internal(e) => {
                tracing::error!(error = ?e, "内部エラー");
                (StatusCode::INTERNAL_SERVER_ERROR, "Server error.".to_string())
            }
        }
    }
}

// 抽出失敗（型不一致・Content-Type 不足・不正なID など）は 400 の JSON にそろえる
impl From<JsonRejection> for AppError {
    fn from(rejection: JsonRejection) -> Self {
        tracing::debug!(status = %rejection.status(), "リクエストボディの抽出に失敗");
        Self::Validation(rejection.body_text())
    }
}

impl From<PathRejection> for AppError {
    fn from(rejection: PathRejection) -> Self {
        tracing::debug!(error = %rejection.body_text(), "パスパラメータの抽出に失敗");
        Self::Validation("Invalid id.".to_string())
    }
}

impl From<QueryRejection> for AppError {
    fn from(rejection: QueryRejection) -> Self {
        Self::Validation(rejection.body_text())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, message) = self.status_and_message();

        (
            status,
            Json(ErrorResponse {
                success: false,
                error: message,
            }),
        )
            .into_response()
    }
}
