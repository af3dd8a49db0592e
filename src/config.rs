use secrecy::SecretBox;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct Config {
    pub database_url: SecretBox<String>,
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_database_max_connections")]
    pub database_max_connections: u32,

    /// フロントエンドのオリジン（CORS 許可およびリセットリンクの既定ベース）
    #[serde(default)]
    pub client_url: Option<String>,

    // セッショントークン設定
    pub jwt_secret: SecretBox<String>,
    #[serde(default = "default_jwt_ttl_secs")]
    pub jwt_ttl_secs: i64,

    // ワンタイムコード / パスワードリセット設定
    #[serde(default = "default_otp_ttl_secs")]
    pub otp_ttl_secs: i64,
    #[serde(default)]
    pub password_reset_url_base: Option<String>,
    #[serde(default = "default_password_reset_token_ttl_secs")]
    pub password_reset_token_ttl_secs: i64,

    // パスワードハッシュのコスト（argon2id）
    #[serde(default = "default_password_hash_memory_kib")]
    pub password_hash_memory_kib: u32,
    #[serde(default = "default_password_hash_iterations")]
    pub password_hash_iterations: u32,
    #[serde(default = "default_password_hash_parallelism")]
    pub password_hash_parallelism: u32,

    // SMTP設定（未設定ならログ出力のみ）
    #[serde(default)]
    pub smtp_host: Option<String>,
    #[serde(default = "default_smtp_port")]
    pub smtp_port: u16,
    pub smtp_username: Option<SecretBox<String>>,
    pub smtp_password: Option<SecretBox<String>>,
    #[serde(default)]
    pub smtp_from_address: Option<String>,
}

const DEFAULT_HOST: &str = "0.0.0.0";
const DEFAULT_PORT: u16 = 4000;
const DEFAULT_DATABASE_MAX_CONNECTIONS: u32 = 5;
const DEFAULT_JWT_TTL_SECS: i64 = 7 * 24 * 60 * 60;
const DEFAULT_OTP_TTL_SECS: i64 = 10 * 60;
const DEFAULT_PASSWORD_RESET_TOKEN_TTL_SECS: i64 = 10 * 60;
const DEFAULT_PASSWORD_HASH_MEMORY_KIB: u32 = 19_456;
const DEFAULT_PASSWORD_HASH_ITERATIONS: u32 = 2;
const DEFAULT_PASSWORD_HASH_PARALLELISM: u32 = 1;
const DEFAULT_SMTP_PORT: u16 = 587;

fn default_host() -> String {
    DEFAULT_HOST.to_string()
}

fn default_port() -> u16 {
    DEFAULT_PORT
}

fn default_database_max_connections() -> u32 {
    DEFAULT_DATABASE_MAX_CONNECTIONS
}

fn default_jwt_ttl_secs() -> i64 {
    DEFAULT_JWT_TTL_SECS
}

fn default_otp_ttl_secs() -> i64 {
    DEFAULT_OTP_TTL_SECS
}

fn default_password_reset_token_ttl_secs() -> i64 {
    DEFAULT_PASSWORD_RESET_TOKEN_TTL_SECS
}

fn default_password_hash_memory_kib() -> u32 {
    DEFAULT_PASSWORD_HASH_MEMORY_KIB
}

fn default_password_hash_iterations() -> u32 {
    DEFAULT_PASSWORD_HASH_ITERATIONS
}

fn default_password_hash_parallelism() -> u32 {
    DEFAULT_PASSWORD_HASH_PARALLELISM
}

fn default_smtp_port() -> u16 {
    DEFAULT_SMTP_PORT
}

impl Config {
    pub fn load() -> Result<Self, envy::Error> {
        envy::from_env()
    }

    /// SMTP 送信に必要な設定がすべて揃っているか
    pub fn smtp_configured(&self) -> bool {
        self.smtp_host.is_some()
            && self.smtp_username.is_some()
            && self.smtp_password.is_some()
            && self.smtp_from_address.is_some()
    }

    /// リセットリンクのベースURL
    pub fn reset_url_base(&self) -> String {
        match (&self.password_reset_url_base, &self.client_url) {
            (Some(base), _) => base.clone(),
            (None, Some(client)) => format!("{}/reset-password", client.trim_end_matches('/')),
            (None, None) => "http://localhost:5173/reset-password".to_string(),
        }
    }
}
