use std::sync::Arc;
#[cfg(test)]
use std::sync::Mutex;

use async_trait::async_trait;

use crate::config::Config;
use crate::error::AppError;

/// 送信するメール
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MailMessage {
    pub to: String,
    pub subject: String,
    pub text: String,
    pub html: String,
}

/// メール送信手段
#[async_trait]
pub trait MailTransport: Send + Sync {
    async fn send(&self, message: &MailMessage) -> Result<(), AppError>;
}

/// ログ出力のみ（SMTP未設定の開発環境用）
///
/// 本文はコードやリンクを含むため debug レベルでのみ出力する
#[derive(Clone, Default)]
pub struct LogTransport;

#[async_trait]
impl MailTransport for LogTransport {
    async fn send(&self, message: &MailMessage) -> Result<(), AppError> {
        tracing::info!(to = %message.to, subject = %message.subject, "メール送信（開発モード）");
        tracing::debug!(body = %message.text, "メール本文");
        Ok(())
    }
}

/// 送信内容をメモリに保持するトランスポート（テスト用）
#[cfg(test)]
#[derive(Clone, Default)]
pub struct MemoryTransport {
    sent: Arc<Mutex<Vec<MailMessage>>>,
    fail: bool,
}

#[cfg(test)]
impl MemoryTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// 常に送信失敗するトランスポート
    pub fn failing() -> Self {
        Self {
            sent: Arc::default(),
            fail: true,
        }
    }

    /// 送信済みメール一覧
    pub fn sent(&self) -> Vec<MailMessage> {
        self.sent
            .lock()
            .map(|sent| sent.clone())
            .unwrap_or_default()
    }

    /// 指定宛先への最後のメール
    pub fn last_to(&self, to: &str) -> Option<MailMessage> {
        self.sent().into_iter().rev().find(|m| m.to == to)
    }
}

#[cfg(test)]
#[async_trait]
impl MailTransport for MemoryTransport {
    async fn send(&self, message: &MailMessage) -> Result<(), AppError> {
        if self.fail {
            return Err(AppError::EmailDelivery(anyhow::anyhow!(
                "simulated delivery failure"
            )));
        }
        self.sent
            .lock()
            .map_err(|_| AppError::Internal(anyhow::anyhow!("mail outbox poisoned")))?
            .push(message.clone());
        Ok(())
    }
}

#[cfg(feature = "email")]
pub use smtp::SmtpTransport;

#[cfg(feature = "email")]
mod smtp {
    use async_trait::async_trait;
    use lettre::message::{Mailbox, MultiPart};
    use lettre::transport::smtp::authentication::Credentials;
    use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};

    use super::{MailMessage, MailTransport};
    use crate::error::AppError;

    /// SMTP (STARTTLS) によるメール送信
    #[derive(Clone)]
    pub struct SmtpTransport {
        mailer: AsyncSmtpTransport<Tokio1Executor>,
        from: Mailbox,
    }

    impl SmtpTransport {
        pub fn new(
            host: &str,
            port: u16,
            username: String,
            password: String,
            from: &str,
        ) -> Result<Self, AppError> {
            let from = from.parse::<Mailbox>().map_err(|e| {
                tracing::error!(error = ?e, "送信元アドレスが不正");
                AppError::Internal(anyhow::anyhow!("invalid smtp from address"))
            })?;

            let mailer = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(host)
                .map_err(|e| {
                    tracing::error!(error = ?e, "SMTPトランスポートの初期化エラー");
                    AppError::Internal(anyhow::anyhow!("smtp relay error"))
                })?
                .port(port)
                .credentials(Credentials::new(username, password))
                .build();

            Ok(Self { mailer, from })
        }
    }

    #[async_trait]
    impl MailTransport for SmtpTransport {
        async fn send(&self, message: &MailMessage) -> Result<(), AppError> {
            let to = message.to.parse::<Mailbox>().map_err(|e| {
                AppError::EmailDelivery(anyhow::anyhow!("invalid recipient: {}", e))
            })?;

            let email = Message::builder()
                .from(self.from.clone())
                .to(to)
                .subject(message.subject.clone())
                .multipart(MultiPart::alternative_plain_html(
                    message.text.clone(),
                    message.html.clone(),
                ))
                .map_err(|e| AppError::EmailDelivery(anyhow::Error::new(e)))?;

            self.mailer
                .send(email)
                .await
                .map_err(|e| AppError::EmailDelivery(anyhow::Error::new(e)))?;

            Ok(())
        }
    }
}

/// メール送信サービス（テンプレート組み立て + 送信）
#[derive(Clone)]
pub struct EmailService {
    transport: Arc<dyn MailTransport>,
}

impl EmailService {
    pub fn new(transport: Arc<dyn MailTransport>) -> Self {
        Self { transport }
    }

    /// 設定からトランスポートを選択
    ///
    /// SMTP設定が揃っていない場合はログ出力のみ
    pub fn from_config(config: &Config) -> Result<Self, AppError> {
        match smtp_transport(config)? {
            Some(transport) => Ok(Self::new(transport)),
            None => {
                tracing::info!("SMTP 未使用（メールはログ出力のみ）");
                Ok(Self::new(Arc::new(LogTransport)))
            }
        }
    }

    /// 確認コードメールを送信
    pub async fn send_verification_code(
        &self,
        to: &str,
        code: &str,
        valid_minutes: i64,
    ) -> Result<(), AppError> {
        let message = verification_message(to, code, valid_minutes);
        self.transport.send(&message).await
    }

    /// パスワードリセットメールを送信
    pub async fn send_password_reset(
        &self,
        to: &str,
        reset_url: &str,
        valid_minutes: i64,
    ) -> Result<(), AppError> {
        let message = password_reset_message(to, reset_url, valid_minutes);
        self.transport.send(&message).await
    }
}

#[cfg(feature = "email")]
fn smtp_transport(config: &Config) -> Result<Option<Arc<dyn MailTransport>>, AppError> {
    use secrecy::ExposeSecret;

    let (Some(host), Some(username), Some(password), Some(from)) = (
        &config.smtp_host,
        &config.smtp_username,
        &config.smtp_password,
        &config.smtp_from_address,
    ) else {
        return Ok(None);
    };

    tracing::info!(smtp_host = %host, smtp_port = config.smtp_port, "SMTP送信を有効化");
    let transport: Arc<dyn MailTransport> = Arc::new(SmtpTransport::new(
        host,
        config.smtp_port,
        username.expose_secret().clone(),
        password.expose_secret().clone(),
        from,
    )?);
    Ok(Some(transport))
}

#[cfg(not(feature = "email"))]
fn smtp_transport(config: &Config) -> Result<Option<Arc<dyn MailTransport>>, AppError> {
    if config.smtp_configured() {
        tracing::warn!("email 機能が無効のため SMTP 設定を無視");
    }
    Ok(None)
}

fn verification_message(to: &str, code: &str, valid_minutes: i64) -> MailMessage {
    MailMessage {
        to: to.to_string(),
        subject: "Your OTP Code".to_string(),
        text: format!(
            "Your OTP code is: {}. It is valid for {} minutes.",
            code, valid_minutes
        ),
        html: format!(
            "<p>Your OTP code is: <strong>{}</strong></p><p>It is valid for {} minutes.</p>",
            code, valid_minutes
        ),
    }
}

fn password_reset_message(to: &str, reset_url: &str, valid_minutes: i64) -> MailMessage {
    MailMessage {
        to: to.to_string(),
        subject: "Reset your password".to_string(),
        text: format!(
            "Use the following link to reset your password: {}\nThe link is valid for {} minutes. If you did not request a reset, ignore this email.",
            reset_url, valid_minutes
        ),
        html: format!(
            "<p>Click <a href=\"{}\">here</a> to reset your password.</p><p>The link is valid for {} minutes. If you did not request a reset, ignore this email.</p>",
            reset_url, valid_minutes
        ),
    }
}
