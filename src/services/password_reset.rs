use std::sync::Arc;

use data_encoding::HEXLOWER;
use rand::RngCore;
use sha2::{Digest, Sha256};
use time::{Duration, OffsetDateTime};

use crate::error::AppError;
use crate::repositories::UserStore;
use crate::services::{EmailService, PasswordService};
use crate::store::{EphemeralStore, Entry};

/// パスワードリセットサービス
#[derive(Clone)]
pub struct PasswordResetService {
    store: Arc<dyn EphemeralStore>,
    user_store: Arc<dyn UserStore>,
    passwords: PasswordService,
    email_service: EmailService,
    reset_url_base: String,
    ttl: Duration,
}

impl PasswordResetService {
    /// 新しい PasswordResetService を作成
    pub fn new(
        store: Arc<dyn EphemeralStore>,
        user_store: Arc<dyn UserStore>,
        passwords: PasswordService,
        email_service: EmailService,
        reset_url_base: String,
        ttl_secs: i64,
    ) -> Self {
        Self {
            store,
            user_store,
            passwords,
            email_service,
            reset_url_base,
            ttl: Duration::seconds(ttl_secs),
        }
    }

    /// ストアのキー
    pub fn key(email: &str) -> String {
        format!("reset:{}", email)
    }

    /// パスワードリセットをリクエスト
    ///
    /// # Security
    /// - トークン（平文）はログに出力しない。ストアにはハッシュのみ保存
    /// - 未登録のメールアドレスは `EmailNotFound` を返す（存在有無が分かる）
    pub async fn request_reset(&self, email: &str) -> Result<(), AppError> {
        tracing::info!(email = %email, "パスワードリセットリクエスト");

        if self.user_store.find_by_email(email).await?.is_none() {
            tracing::warn!(email = %email, "パスワードリセット: ユーザー不在");
            return Err(AppError::EmailNotFound);
        }

        // 32バイトランダムトークン生成
        let token = generate_token();

        // 既存のトークンは上書き
        let expires_at = OffsetDateTime::now_utc() + self.ttl;
        self.store
            .set(
                &Self::key(email),
                Entry {
                    value: hash_token(&token),
                    expires_at,
                },
            )
            .await?;

        let reset_url = self.build_reset_url(email, &token);

        self.email_service
            .send_password_reset(email, &reset_url, self.ttl.whole_minutes())
            .await?;

        tracing::info!(email = %email, "パスワードリセットメール送信完了");
        Ok(())
    }

    /// パスワードをリセット
    ///
    /// 未発行・不一致・期限切れは区別せず `InvalidOrExpiredToken`
    ///
    /// # Security
    /// - トークン・新パスワードはログに出力しない
    pub async fn reset_password(
        &self,
        email: &str,
        token: &str,
        new_password: &str,
    ) -> Result<(), AppError> {
        let key = Self::key(email);

        let record = self.store.get(&key).await?.ok_or_else(|| {
            tracing::warn!(email = %email, "リセットトークン未発行");
            AppError::InvalidOrExpiredToken
        })?;

        if record.value != hash_token(token) {
            tracing::warn!(email = %email, "リセットトークン不一致");
            return Err(AppError::InvalidOrExpiredToken);
        }

        if record.is_expired_at(OffsetDateTime::now_utc()) {
            tracing::warn!(email = %email, "リセットトークン期限切れ");
            return Err(AppError::InvalidOrExpiredToken);
        }

        let password_hash = self.passwords.hash(new_password)?;
        self.user_store.set_password(email, &password_hash).await?;

        // 使い捨て
        self.store.delete(&key).await?;

        tracing::info!(email = %email, "パスワードリセット完了");
        Ok(())
    }

    /// リセットURLを構築
    fn build_reset_url(&self, email: &str, token: &str) -> String {
        format!(
            "{}?token={}&email={}",
            self.reset_url_base,
            token,
            urlencoding::encode(email)
        )
    }
}

/// 256ビットのランダムトークン（16進小文字、64文字）
fn generate_token() -> String {
    let mut bytes = [0u8; 32];
    rand::thread_rng().fill_bytes(&mut bytes);
    HEXLOWER.encode(&bytes)
}

/// トークンをSHA256でハッシュ化
fn hash_token(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    format!("{:x}", hasher.finalize())
}
