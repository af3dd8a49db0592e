use argon2::password_hash::SaltString;
use argon2::password_hash::rand_core::OsRng;
use argon2::{Algorithm, Argon2, Params, PasswordHash, PasswordHasher, PasswordVerifier, Version};

use crate::config::Config;
use crate::error::AppError;

/// パスワードハッシュポリシー（argon2id、コスト可変）
///
/// 登録とパスワードリセットで同じインスタンスを使うこと
#[derive(Clone)]
pub struct PasswordService {
    argon2: Argon2<'static>,
}

impl PasswordService {
    /// # Arguments
    /// * `memory_kib` - メモリコスト（KiB）
    /// * `iterations` - 反復回数
    /// * `parallelism` - 並列度
    pub fn new(memory_kib: u32, iterations: u32, parallelism: u32) -> Result<Self, AppError> {
        let params = Params::new(memory_kib, iterations, parallelism, None).map_err(|e| {
            tracing::error!(error = ?e, "argon2 パラメータが不正");
            AppError::Internal(anyhow::anyhow!("invalid argon2 params: {}", e))
        })?;

        Ok(Self {
            argon2: Argon2::new(Algorithm::Argon2id, Version::V0x13, params),
        })
    }

    pub fn from_config(config: &Config) -> Result<Self, AppError> {
        Self::new(
            config.password_hash_memory_kib,
            config.password_hash_iterations,
            config.password_hash_parallelism,
        )
    }

    /// パスワードをハッシュ化（ソルトは毎回生成）
    pub fn hash(&self, password: &str) -> Result<String, AppError> {
        let salt = SaltString::generate(&mut OsRng);
        let hash = self
            .argon2
            .hash_password(password.as_bytes(), &salt)
            .map_err(|e| {
                tracing::error!(error = ?e, "パスワードハッシュ生成エラー");
                AppError::Internal(anyhow::anyhow!("password hash error"))
            })?;
        Ok(hash.to_string())
    }

    /// パスワードを検証
    ///
    /// ハッシュ内のパラメータで検証するため、コスト変更前のハッシュも検証できる
    pub fn verify(&self, password: &str, hash: &str) -> Result<bool, AppError> {
        let parsed_hash = PasswordHash::new(hash).map_err(|e| {
            tracing::error!(error = ?e, "パスワードハッシュのパースエラー");
            AppError::Internal(anyhow::anyhow!("password hash parse error"))
        })?;

        Ok(self
            .argon2
            .verify_password(password.as_bytes(), &parsed_hash)
            .is_ok())
    }
}
