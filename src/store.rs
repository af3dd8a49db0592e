use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use time::OffsetDateTime;
use tokio::sync::RwLock;

use crate::error::AppError;

/// 有効期限付きの値
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    pub value: String,
    pub expires_at: OffsetDateTime,
}

impl Entry {
    pub fn is_expired_at(&self, now: OffsetDateTime) -> bool {
        now > self.expires_at
    }
}

/// ワンタイムコード・リセットトークン用の一時ストア
///
/// 期限切れのエントリもそのまま返す（期限判定は呼び出し側）。
/// 複数インスタンス構成では共有ストアの実装を注入すること。
#[async_trait]
pub trait EphemeralStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<Entry>, AppError>;

    /// 既存の値は上書きされる
    async fn set(&self, key: &str, entry: Entry) -> Result<(), AppError>;

    async fn delete(&self, key: &str) -> Result<(), AppError>;
}

/// プロセス内メモリのストア
///
/// # Note
/// 掃除処理は無い。エントリは上書き・消費・再起動まで残る
#[derive(Clone, Default)]
pub struct InMemoryStore {
    entries: Arc<RwLock<HashMap<String, Entry>>>,
}

impl InMemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }
}

#[async_trait]
impl EphemeralStore for InMemoryStore {
    async fn get(&self, key: &str) -> Result<Option<Entry>, AppError> {
        Ok(self.entries.read().await.get(key).cloned())
    }

    async fn set(&self, key: &str, entry: Entry) -> Result<(), AppError> {
        self.entries.write().await.insert(key.to_string(), entry);
        Ok(())
    }

    async fn delete(&self, key: &str) -> Result<(), AppError> {
        self.entries.write().await.remove(key);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::Duration;

    fn entry(value: &str, expires_at: OffsetDateTime) -> Entry {
        Entry {
            value: value.to_string(),
            expires_at,
        }
    }

    #[tokio::test]
    async fn test_set_overwrites_previous_entry() {
        let store = InMemoryStore::new();
        let expires_at = OffsetDateTime::now_utc() + Duration::minutes(10);

        store.set("otp:a@x.com", entry("111111", expires_at)).await.unwrap();
        store.set("otp:a@x.com", entry("222222", expires_at)).await.unwrap();

        let stored = store.get("otp:a@x.com").await.unwrap().unwrap();
        assert_eq!(stored.value, "222222");
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn test_expired_entries_are_still_returned() {
        let store = InMemoryStore::new();
        let expired = OffsetDateTime::now_utc() - Duration::seconds(1);

        store.set("reset:a@x.com", entry("digest", expired)).await.unwrap();

        let stored = store.get("reset:a@x.com").await.unwrap().unwrap();
        assert!(stored.is_expired_at(OffsetDateTime::now_utc()));
    }

    #[tokio::test]
    async fn test_delete() {
        let store = InMemoryStore::new();
        let expires_at = OffsetDateTime::now_utc() + Duration::minutes(10);

        store.set("otp:a@x.com", entry("123456", expires_at)).await.unwrap();
        store.delete("otp:a@x.com").await.unwrap();

        assert!(store.get("otp:a@x.com").await.unwrap().is_none());
        // 存在しないキーの削除はエラーにならない
        store.delete("otp:a@x.com").await.unwrap();
    }
}
