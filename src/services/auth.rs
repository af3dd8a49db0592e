use std::sync::Arc;

use crate::error::AppError;
use crate::models::User;
use crate::repositories::UserStore;
use crate::services::{PasswordService, TokenService};

/// ログイン成功時の結果
#[derive(Debug)]
pub struct LoginOutcome {
    pub token: String,
    pub user: User,
}

/// 登録・ログインサービス
#[derive(Clone)]
pub struct AuthService {
    user_store: Arc<dyn UserStore>,
    passwords: PasswordService,
    tokens: TokenService,
    /// ユーザー不在時の検証に使うダミーハッシュ
    dummy_hash: String,
}

impl AuthService {
    /// 新しい AuthService を作成
    pub fn new(
        user_store: Arc<dyn UserStore>,
        passwords: PasswordService,
        tokens: TokenService,
    ) -> Result<Self, AppError> {
        let dummy_hash = passwords.hash("dummy-password-for-timing")?;
        Ok(Self {
            user_store,
            passwords,
            tokens,
            dummy_hash,
        })
    }

    /// ユーザー登録
    ///
    /// 未認証 (verified = false) で作成する。セッション・OTP は発行しない
    pub async fn register(&self, name: &str, email: &str, password: &str) -> Result<User, AppError> {
        if self.user_store.find_by_email(email).await?.is_some() {
            tracing::warn!(email = %email, "登録失敗: メールアドレス重複");
            return Err(AppError::DuplicateEmail);
        }

        let password_hash = self.passwords.hash(password)?;

        // 同時登録の競合はストア側の一意制約で DuplicateEmail になる
        let user = self.user_store.create(name, email, &password_hash).await?;

        tracing::info!(email = %email, user_id = %user.id, "ユーザー登録成功");
        Ok(user)
    }

    /// ユーザー認証を実行し、セッショントークンを発行
    ///
    /// ユーザー不在・パスワード不一致・未認証はすべて `InvalidCredentials`。
    /// タイミング攻撃対策: ユーザーが存在しない場合もダミーのパスワード検証を実行
    pub async fn login(&self, email: &str, password: &str) -> Result<LoginOutcome, AppError> {
        let user = match self.user_store.find_by_email(email).await? {
            Some(user) => user,
            None => {
                let _ = self.passwords.verify(password, &self.dummy_hash);
                tracing::warn!(email = %email, "認証失敗: ユーザー不在");
                return Err(AppError::InvalidCredentials);
            }
        };

        if !self.passwords.verify(password, &user.password_hash)? {
            tracing::warn!(email = %email, "認証失敗: パスワード不一致");
            return Err(AppError::InvalidCredentials);
        }

        if !user.verified {
            tracing::warn!(email = %email, "認証失敗: メール未確認");
            return Err(AppError::InvalidCredentials);
        }

        let token = self.tokens.issue(&user)?;
        tracing::info!(email = %email, user_id = %user.id, "認証成功");

        Ok(LoginOutcome { token, user })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Role;
    use crate::repositories::InMemoryUserStore;

    fn service(store: &InMemoryUserStore) -> AuthService {
        AuthService::new(
            Arc::new(store.clone()),
            PasswordService::new(8, 1, 1).unwrap(),
            TokenService::new("test-secret", 7 * 24 * 60 * 60),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_register_duplicate_email() {
        let store = InMemoryUserStore::new();
        let auth = service(&store);

        auth.register("A", "a@x.com", "p1").await.unwrap();
        let result = auth.register("A2", "a@x.com", "p2").await;

        assert!(matches!(result, Err(AppError::DuplicateEmail)));
    }

    #[tokio::test]
    async fn test_register_stores_hash_not_plaintext() {
        let store = InMemoryUserStore::new();
        let user = service(&store).register("A", "a@x.com", "p1").await.unwrap();

        assert_ne!(user.password_hash, "p1");
        assert!(!user.verified);
    }

    #[tokio::test]
    async fn test_login_unverified_account_fails() {
        let store = InMemoryUserStore::new();
        let auth = service(&store);
        auth.register("A", "a@x.com", "p1").await.unwrap();

        let result = auth.login("a@x.com", "p1").await;
        assert!(matches!(result, Err(AppError::InvalidCredentials)));
    }

    #[tokio::test]
    async fn test_login_failures_are_uniform() {
        let store = InMemoryUserStore::new();
        let auth = service(&store);
        auth.register("A", "a@x.com", "p1").await.unwrap();
        store.set_verified("a@x.com").await.unwrap();

        let wrong_password = auth.login("a@x.com", "wrong").await;
        let unknown_user = auth.login("missing@x.com", "p1").await;

        assert!(matches!(wrong_password, Err(AppError::InvalidCredentials)));
        assert!(matches!(unknown_user, Err(AppError::InvalidCredentials)));
    }

    #[tokio::test]
    async fn test_login_verified_account_issues_token() {
        let store = InMemoryUserStore::new();
        let auth = service(&store);
        auth.register("A", "a@x.com", "p1").await.unwrap();
        store.set_verified("a@x.com").await.unwrap();
        store.set_role("a@x.com", Role::Admin).await;

        let outcome = auth.login("a@x.com", "p1").await.unwrap();

        let claims = TokenService::new("test-secret", 60)
            .verify(&outcome.token)
            .unwrap();
        assert_eq!(claims.user_id, outcome.user.id);
        assert_eq!(claims.role, Role::Admin);
    }
}
