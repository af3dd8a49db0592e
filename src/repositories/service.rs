use async_trait::async_trait;
use sqlx::PgPool;
use sqlx::types::Json;
use uuid::Uuid;

use crate::error::AppError;
use crate::models::{Service, ServiceImage};

/// サービス作成時の入力
#[derive(Debug, Clone)]
pub struct NewService {
    pub title: String,
    pub description: String,
    pub features: Vec<String>,
    pub price: f64,
    pub duration: String,
    pub image: Option<ServiceImage>,
}

/// 部分更新（None の項目は変更しない）
#[derive(Debug, Default)]
pub struct ServiceChanges {
    pub title: Option<String>,
    pub description: Option<String>,
    pub features: Option<Vec<String>>,
    pub price: Option<f64>,
    pub duration: Option<String>,
    pub image: Option<ServiceImage>,
}

impl ServiceChanges {
    pub fn is_empty(&self) -> bool {
        self.title.is_none()
            && self.description.is_none()
            && self.features.is_none()
            && self.price.is_none()
            && self.duration.is_none()
            && self.image.is_none()
    }
}

/// サービスカタログのストア
#[async_trait]
pub trait ServiceStore: Send + Sync {
    async fn create(&self, service: NewService) -> Result<Service, AppError>;

    /// 新しい順にページ単位で取得
    async fn list(&self, limit: i64, offset: i64) -> Result<Vec<Service>, AppError>;

    async fn count(&self) -> Result<i64, AppError>;

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Service>, AppError>;

    /// 指定された項目のみ更新
    ///
    /// # Returns
    /// 対象が存在しない場合は `None`
    async fn update(
        &self,
        id: Uuid,
        changes: ServiceChanges,
    ) -> Result<Option<Service>, AppError>;

    /// # Returns
    /// 削除された場合は `true`
    async fn delete(&self, id: Uuid) -> Result<bool, AppError>;
}

#[derive(Clone)]
pub struct ServiceRepository {
    pool: PgPool,
}

impl ServiceRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl ServiceStore for ServiceRepository {
    async fn create(&self, service: NewService) -> Result<Service, AppError> {
        let service = sqlx::query_as::<_, Service>(
            r#"
            INSERT INTO services (title, description, features, price, duration, image)
            VALUES ($1, $2, $3, $4, $5, $6)
            RETURNING id, title, description, features, price, duration, image, created_at, updated_at
            "#,
        )
        .bind(service.title)
        .bind(service.description)
        .bind(service.features)
        .bind(service.price)
        .bind(service.duration)
        .bind(service.image.map(Json))
        .fetch_one(&self.pool)
        .await?;

        Ok(service)
    }

    async fn list(&self, limit: i64, offset: i64) -> Result<Vec<Service>, AppError> {
        let services = sqlx::query_as::<_, Service>(
            r#"
            SELECT id, title, description, features, price, duration, image, created_at, updated_at
            FROM services
            ORDER BY created_at DESC
            LIMIT $1 OFFSET $2
            "#,
        )
        .bind(limit)
        .bind(offset)
        .fetch_all(&self.pool)
        .await?;

        Ok(services)
    }

    async fn count(&self) -> Result<i64, AppError> {
        let total = sqlx::query_scalar::<_, i64>("SELECT COUNT(*) FROM services")
            .fetch_one(&self.pool)
            .await?;

        Ok(total)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Service>, AppError> {
        let service = sqlx::query_as::<_, Service>(
            r#"
            SELECT id, title, description, features, price, duration, image, created_at, updated_at
            FROM services
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(service)
    }

    async fn update(
        &self,
        id: Uuid,
        changes: ServiceChanges,
    ) -> Result<Option<Service>, AppError> {
        let service = sqlx::query_as::<_, Service>(
            r#"
            UPDATE services
            SET title = COALESCE($2, title),
                description = COALESCE($3, description),
                features = COALESCE($4, features),
                price = COALESCE($5, price),
                duration = COALESCE($6, duration),
                image = COALESCE($7, image),
                updated_at = NOW()
            WHERE id = $1
            RETURNING id, title, description, features, price, duration, image, created_at, updated_at
            "#,
        )
        .bind(id)
        .bind(changes.title)
        .bind(changes.description)
        .bind(changes.features)
        .bind(changes.price)
        .bind(changes.duration)
        .bind(changes.image.map(Json))
        .fetch_optional(&self.pool)
        .await?;

        Ok(service)
    }

    async fn delete(&self, id: Uuid) -> Result<bool, AppError> {
        let result = sqlx::query(
            r#"
            DELETE FROM services
            WHERE id = $1
            "#,
        )
        .bind(id)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }
}
