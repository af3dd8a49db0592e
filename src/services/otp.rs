use std::sync::Arc;

use rand::Rng;
use time::{Duration, OffsetDateTime};

use crate::error::AppError;
use crate::repositories::UserStore;
use crate::services::EmailService;
use crate::store::{EphemeralStore, Entry};

const OTP_MIN: u32 = 100_000;
const OTP_MAX: u32 = 999_999;

/// メールアドレス確認用ワンタイムコードの発行・検証
///
/// # Security
/// - コードはログに出力しない
#[derive(Clone)]
pub struct OtpService {
    store: Arc<dyn EphemeralStore>,
    user_store: Arc<dyn UserStore>,
    email_service: EmailService,
    ttl: Duration,
}

impl OtpService {
    pub fn new(
        store: Arc<dyn EphemeralStore>,
        user_store: Arc<dyn UserStore>,
        email_service: EmailService,
        ttl_secs: i64,
    ) -> Self {
        Self {
            store,
            user_store,
            email_service,
            ttl: Duration::seconds(ttl_secs),
        }
    }

    /// ストアのキー
    pub fn key(email: &str) -> String {
        format!("otp:{}", email)
    }

    /// 6桁のコードを生成（100000〜999999 の一様乱数）
    pub fn generate_code() -> String {
        rand::thread_rng().gen_range(OTP_MIN..=OTP_MAX).to_string()
    }

    /// コードを発行してメール送信
    ///
    /// 既存のコードは上書きされる。送信に失敗してもコードは保持されたまま
    pub async fn issue(&self, email: &str) -> Result<(), AppError> {
        let code = Self::generate_code();
        let expires_at = OffsetDateTime::now_utc() + self.ttl;

        self.store
            .set(
                &Self::key(email),
                Entry {
                    value: code.clone(),
                    expires_at,
                },
            )
            .await?;

        self.email_service
            .send_verification_code(email, &code, self.ttl.whole_minutes())
            .await
            .inspect_err(|_| tracing::warn!(email = %email, "確認コードのメール送信に失敗"))?;

        tracing::info!(email = %email, "確認コード送信完了");
        Ok(())
    }

    /// コードを検証し、成功したらユーザーを確認済みにする
    ///
    /// 判定順: 未発行 → 期限切れ → 不一致
    pub async fn verify(&self, email: &str, code: &str) -> Result<(), AppError> {
        let key = Self::key(email);

        let record = self.store.get(&key).await?.ok_or_else(|| {
            tracing::warn!(email = %email, "確認コード未発行");
            AppError::NoOtpFound
        })?;

        if record.is_expired_at(OffsetDateTime::now_utc()) {
            tracing::warn!(email = %email, "確認コード期限切れ");
            return Err(AppError::OtpExpired);
        }

        if record.value != code {
            tracing::warn!(email = %email, "確認コード不一致");
            return Err(AppError::InvalidOtp);
        }

        // 使い捨て
        self.store.delete(&key).await?;
        self.user_store.set_verified(email).await?;

        tracing::info!(email = %email, "メールアドレス確認完了");
        Ok(())
    }
}
