//! テスト用のメモリ上ストア

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use sqlx::types::Json;
use time::OffsetDateTime;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::error::AppError;
use crate::models::{Contact, ContactStatus, Role, Service, User};
use crate::repositories::{
    ContactStore, NewContact, NewService, ServiceChanges, ServiceStore, UserStore,
};

/// メモリ上の資格情報ストア
#[derive(Clone, Default)]
pub struct InMemoryUserStore {
    users: Arc<RwLock<HashMap<String, User>>>,
}

impl InMemoryUserStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// ロールを直接変更する（管理者の作成は公開APIに無いため）
    pub async fn set_role(&self, email: &str, role: Role) {
        if let Some(user) = self.users.write().await.get_mut(email) {
            user.role = role;
        }
    }
}

#[async_trait]
impl UserStore for InMemoryUserStore {
    async fn find_by_email(&self, email: &str) -> Result<Option<User>, AppError> {
        Ok(self.users.read().await.get(email).cloned())
    }

    async fn create(
        &self,
        name: &str,
        email: &str,
        password_hash: &str,
    ) -> Result<User, AppError> {
        let mut users = self.users.write().await;
        if users.contains_key(email) {
            return Err(AppError::DuplicateEmail);
        }

        let now = OffsetDateTime::now_utc();
        let user = User {
            id: Uuid::new_v4(),
            name: name.to_string(),
            email: email.to_string(),
            password_hash: password_hash.to_string(),
            role: Role::User,
            verified: false,
            created_at: now,
            updated_at: now,
        };
        users.insert(email.to_string(), user.clone());

        Ok(user)
    }

    async fn set_verified(&self, email: &str) -> Result<(), AppError> {
        if let Some(user) = self.users.write().await.get_mut(email) {
            user.verified = true;
            user.updated_at = OffsetDateTime::now_utc();
        }
        Ok(())
    }

    async fn set_password(&self, email: &str, password_hash: &str) -> Result<(), AppError> {
        if let Some(user) = self.users.write().await.get_mut(email) {
            user.password_hash = password_hash.to_string();
            user.updated_at = OffsetDateTime::now_utc();
        }
        Ok(())
    }

    async fn list_all(&self) -> Result<Vec<User>, AppError> {
        let mut users: Vec<User> = self.users.read().await.values().cloned().collect();
        users.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(users)
    }
}

/// メモリ上の問い合わせストア（挿入順を保持）
#[derive(Clone, Default)]
pub struct InMemoryContactStore {
    contacts: Arc<RwLock<Vec<Contact>>>,
}

impl InMemoryContactStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ContactStore for InMemoryContactStore {
    async fn create(&self, contact: NewContact) -> Result<Contact, AppError> {
        let now = OffsetDateTime::now_utc();
        let contact = Contact {
            id: Uuid::new_v4(),
            name: contact.name,
            email: contact.email,
            message: contact.message,
            phone: contact.phone,
            service: contact.service,
            address: contact.address,
            status: ContactStatus::New,
            created_at: now,
            updated_at: now,
        };
        self.contacts.write().await.push(contact.clone());
        Ok(contact)
    }

    async fn list_all(&self) -> Result<Vec<Contact>, AppError> {
        Ok(self.contacts.read().await.iter().rev().cloned().collect())
    }

    async fn update_status(
        &self,
        id: Uuid,
        status: ContactStatus,
    ) -> Result<Option<Contact>, AppError> {
        let mut contacts = self.contacts.write().await;
        Ok(contacts.iter_mut().find(|c| c.id == id).map(|contact| {
            contact.status = status;
            contact.updated_at = OffsetDateTime::now_utc();
            contact.clone()
        }))
    }

    async fn delete(&self, id: Uuid) -> Result<bool, AppError> {
        let mut contacts = self.contacts.write().await;
        let before = contacts.len();
        contacts.retain(|c| c.id != id);
        Ok(contacts.len() < before)
    }
}

/// メモリ上のサービスカタログ（挿入順を保持）
#[derive(Clone, Default)]
pub struct InMemoryServiceStore {
    services: Arc<RwLock<Vec<Service>>>,
}

impl InMemoryServiceStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl ServiceStore for InMemoryServiceStore {
    async fn create(&self, service: NewService) -> Result<Service, AppError> {
        let now = OffsetDateTime::now_utc();
        let service = Service {
            id: Uuid::new_v4(),
            title: service.title,
            description: service.description,
            features: service.features,
            price: service.price,
            duration: service.duration,
            image: service.image.map(Json),
            created_at: now,
            updated_at: now,
        };
        self.services.write().await.push(service.clone());
        Ok(service)
    }

    async fn list(&self, limit: i64, offset: i64) -> Result<Vec<Service>, AppError> {
        let skip = usize::try_from(offset).unwrap_or(usize::MAX);
        let take = usize::try_from(limit).unwrap_or(0);
        Ok(self
            .services
            .read()
            .await
            .iter()
            .rev()
            .skip(skip)
            .take(take)
            .cloned()
            .collect())
    }

    async fn count(&self) -> Result<i64, AppError> {
        Ok(self.services.read().await.len() as i64)
    }

    async fn find_by_id(&self, id: Uuid) -> Result<Option<Service>, AppError> {
        Ok(self.services.read().await.iter().find(|s| s.id == id).cloned())
    }

    async fn update(
        &self,
        id: Uuid,
        changes: ServiceChanges,
    ) -> Result<Option<Service>, AppError> {
        let mut services = self.services.write().await;
        let Some(service) = services.iter_mut().find(|s| s.id == id) else {
            return Ok(None);
        };

        if let Some(title) = changes.title {
            service.title = title;
        }
        if let Some(description) = changes.description {
            service.description = description;
        }
        if let Some(features) = changes.features {
            service.features = features;
        }
        if let Some(price) = changes.price {
            service.price = price;
        }
        if let Some(duration) = changes.duration {
            service.duration = duration;
        }
        if let Some(image) = changes.image {
            service.image = Some(Json(image));
        }
        service.updated_at = OffsetDateTime::now_utc();

        Ok(Some(service.clone()))
    }

    async fn delete(&self, id: Uuid) -> Result<bool, AppError> {
        let mut services = self.services.write().await;
        let before = services.len();
        services.retain(|s| s.id != id);
        Ok(services.len() < before)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_create_rejects_duplicate_email() {
        let store = InMemoryUserStore::new();
        store.create("A", "a@x.com", "hash1").await.unwrap();

        let result = store.create("A2", "a@x.com", "hash2").await;
        assert!(matches!(result, Err(AppError::DuplicateEmail)));
    }

    #[tokio::test]
    async fn test_new_user_is_unverified() {
        let store = InMemoryUserStore::new();
        let user = store.create("A", "a@x.com", "hash").await.unwrap();
        assert!(!user.verified);
        assert_eq!(user.role, Role::User);

        store.set_verified("a@x.com").await.unwrap();
        let user = store.find_by_email("a@x.com").await.unwrap().unwrap();
        assert!(user.verified);
    }

    #[tokio::test]
    async fn test_updates_on_unknown_email_are_noops() {
        let store = InMemoryUserStore::new();
        store.set_verified("missing@x.com").await.unwrap();
        store.set_password("missing@x.com", "hash").await.unwrap();
        assert!(store.list_all().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_service_list_skips_past_end() {
        let store = InMemoryServiceStore::new();
        store
            .create(NewService {
                title: "Web".to_string(),
                description: "Sites".to_string(),
                features: vec![],
                price: 1.0,
                duration: "1 week".to_string(),
                image: None,
            })
            .await
            .unwrap();

        assert_eq!(store.list(10, 0).await.unwrap().len(), 1);
        assert!(store.list(10, i64::MAX).await.unwrap().is_empty());
    }
}
