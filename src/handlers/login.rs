use axum::{Json, extract::State};
use serde::{Deserialize, Serialize};

use crate::error::AppError;
use crate::extract::AppJson;
use crate::models::PublicUser;
use crate::state::AppState;

/// ログインリクエスト
#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    /// ユーザーのメールアドレス
    #[serde(default)]
    pub email: String,
    /// ユーザーのパスワード
    #[serde(default)]
    pub password: String,
}

/// ログインレスポンス
#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub success: bool,
    pub message: String,
    /// セッショントークン（Bearer）
    pub token: String,
    pub user: PublicUser,
}

/// ログインハンドラー
///
/// POST /api/auth/login
///
/// 処理フロー:
/// 1. リクエストバリデーション
/// 2. ユーザー認証（パスワード照合・確認済みチェック）
/// 3. セッショントークン発行
pub async fn login(
    State(state): State<AppState>,
    AppJson(request): AppJson<LoginRequest>,
) -> Result<Json<LoginResponse>, AppError> {
    // 1. リクエストバリデーション
    validate_login_request(&request)?;

    // 2-3. 認証 + トークン発行
    let outcome = state
        .auth_service
        .login(&request.email, &request.password)
        .await?;

    Ok(Json(LoginResponse {
        success: true,
        message: "Login successful".to_string(),
        token: outcome.token,
        user: PublicUser::from(&outcome.user),
    }))
}

/// ログインリクエストのバリデーション
///
/// 形式の誤りも認証失敗と同じ扱いにする
fn validate_login_request(request: &LoginRequest) -> Result<(), AppError> {
    if request.email.trim().is_empty() || request.password.is_empty() {
        return Err(AppError::InvalidCredentials);
    }
    Ok(())
}
