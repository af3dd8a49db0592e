use std::sync::Arc;

use secrecy::ExposeSecret;
use sqlx::PgPool;

use crate::config::Config;
use crate::error::AppError;
use crate::repositories::{
    ContactRepository, ContactStore, ServiceRepository, ServiceStore, UserRepository, UserStore,
};
use crate::services::{
    AuthService, EmailService, OtpService, PasswordResetService, PasswordService, TokenService,
};
use crate::store::{EphemeralStore, InMemoryStore};

/// アプリケーション共有状態
///
/// axum の State として全ハンドラーで共有される。
/// Clone は必須（axum が内部で clone するため）。
#[derive(Clone)]
pub struct AppState {
    /// アプリケーション設定（Arc で共有）
    pub config: Arc<Config>,
    /// 資格情報ストア
    pub user_store: Arc<dyn UserStore>,
    /// 問い合わせストア
    pub contact_store: Arc<dyn ContactStore>,
    /// サービスカタログストア
    pub service_store: Arc<dyn ServiceStore>,
    /// セッショントークン検証
    pub token_service: TokenService,
    /// 登録・ログイン
    pub auth_service: AuthService,
    /// メール確認コード
    pub otp_service: OtpService,
    /// パスワードリセット
    pub password_reset_service: PasswordResetService,
}

/// AppState に注入する永続化・送信手段
pub struct Backends {
    pub user_store: Arc<dyn UserStore>,
    pub contact_store: Arc<dyn ContactStore>,
    pub service_store: Arc<dyn ServiceStore>,
    pub ephemeral_store: Arc<dyn EphemeralStore>,
    pub email_service: EmailService,
}

impl Backends {
    /// 本番構成
    ///
    /// ユーザー・問い合わせ・カタログは PostgreSQL、コード・トークンはプロセス内メモリ
    pub fn postgres(db_pool: PgPool, config: &Config) -> Result<Self, AppError> {
        Ok(Self {
            user_store: Arc::new(UserRepository::new(db_pool.clone())),
            contact_store: Arc::new(ContactRepository::new(db_pool.clone())),
            service_store: Arc::new(ServiceRepository::new(db_pool)),
            ephemeral_store: Arc::new(InMemoryStore::new()),
            email_service: EmailService::from_config(config)?,
        })
    }
}

impl AppState {
    /// 本番構成の AppState を作成
    pub fn new(db_pool: PgPool, config: Config) -> Result<Self, AppError> {
        let backends = Backends::postgres(db_pool, &config)?;
        Self::with_backends(config, backends)
    }

    /// バックエンドを指定して AppState を作成
    pub fn with_backends(config: Config, backends: Backends) -> Result<Self, AppError> {
        let Backends {
            user_store,
            contact_store,
            service_store,
            ephemeral_store,
            email_service,
        } = backends;
        let config = Arc::new(config);

        let passwords = PasswordService::from_config(&config)?;
        let token_service =
            TokenService::new(config.jwt_secret.expose_secret(), config.jwt_ttl_secs);

        let auth_service =
            AuthService::new(user_store.clone(), passwords.clone(), token_service.clone())?;

        let otp_service = OtpService::new(
            ephemeral_store.clone(),
            user_store.clone(),
            email_service.clone(),
            config.otp_ttl_secs,
        );

        let password_reset_service = PasswordResetService::new(
            ephemeral_store,
            user_store.clone(),
            passwords,
            email_service,
            config.reset_url_base(),
            config.password_reset_token_ttl_secs,
        );

        Ok(Self {
            config,
            user_store,
            contact_store,
            service_store,
            token_service,
            auth_service,
            otp_service,
            password_reset_service,
        })
    }
}
