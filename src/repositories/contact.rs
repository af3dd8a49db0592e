use async_trait::async_trait;
use sqlx::PgPool;
use uuid::Uuid;

use crate::error::AppError;
use crate::models::{Contact, ContactStatus};

/// 問い合わせ作成時の入力
#[derive(Debug, Clone)]
pub struct NewContact {
    pub name: String,
    pub email: String,
    pub message: String,
    pub phone: String,
    pub service: String,
    pub address: String,
}

/// 問い合わせストア
#[async_trait]
pub trait ContactStore: Send + Sync {
    /// ステータスは new で作成
    async fn create(&self, contact: NewContact) -> Result<Contact, AppError>;

    /// 新しい順に全件取得
    async fn list_all(&self) -> Result<Vec<Contact>, AppError>;

    /// # Returns
    /// 対象が存在しない場合は `None`
    async fn update_status(
        &self,
        id: Uuid,
        status: ContactStatus,
    ) -> Result<Option<Contact>, AppError>;

    /// # Returns
    /// 削除された場合は `true`
    async fn delete(&self, id: Uuid) -> Result<bool, AppError>;
}

#[derive(Clone)]
pub struct ContactRepository {
    pool: PgPool,
}

impl ContactRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ContactStore for ContactRepository {
    async fn create(&self, contact: NewContact) -> Result<Contact, AppError> {
        let contact = sqlx::query_as::<_, Contact>(
            r#"
            INSERT INTO contacts (name, email, message, phone, service, address)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, name, email, message, phone, service, address, status, created_at, updated_at
            "#,
        )
        .bind(contact.name)
        .bind(contact.email)
        .bind(contact.message)
        .bind(contact.phone)
        .bind(contact.service)
        .bind(contact.address)
        .fetch_one(&self.pool)
        .await?;

        Ok(contact)
    }

    async fn list_all(&self) -> Result<Vec<Contact>, AppError> {
        let contacts = sqlx::query_as::<_, Contact>(
            r#"
            SELECT id, name, email, message, phone, service, address, status, created_at, updated_at
            FROM contacts
            ORDER BY created_at DESC
            "#,
        )
        .fetch_all(&self.pool)
        .await?;

        Ok(contacts)
    }

    async fn update_status(
        &self,
        id: Uuid,
        status: ContactStatus,
    ) -> Result<Option<Contact>, AppError> {
        let contact = sqlx::query_as::<_, Contact>(
            r#"
            UPDATE contacts
            SET status = $2, updated_at = NOW()
            WHERE id = $1
            RETURNING id, name, email, message, phone, service, address, status, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(status.as_str())
        .fetch_optional(&self.pool)
        .await?;

        Ok(contact)
    }

    async fn delete(&self, id: Uuid) -> Result<bool, AppError> {
        let result = sqlx::query(
            r#"
            DELETE FROM contacts
            WHERE id = $1
            "#,
        )
        .bind(id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }
}
