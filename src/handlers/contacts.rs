use axum::{Json, extract::State, http::StatusCode};
use garde::Validate;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::AppError;
use crate::extract::{AppJson, AppPath};
use crate::middleware::AdminUser;
use crate::models::{Contact, ContactStatus};
use crate::repositories::NewContact;
use crate::state::AppState;

const CONTACT_NOT_FOUND: &str = "Contact doesn't exist.";

// === 問い合わせ作成（公開） ===

#[derive(Debug, Deserialize, Validate)]
pub struct CreateContactRequest {
    #[serde(default)]
    #[garde(length(min = 1))]
    pub name: String,
    #[serde(default)]
    #[garde(length(min = 1))]
    pub email: String,
    #[serde(default)]
    #[garde(length(min = 1))]
    pub message: String,
    #[serde(default)]
    #[garde(length(min = 1))]
    pub phone: String,
    #[serde(default)]
    #[garde(length(min = 1))]
    pub service: String,
    #[serde(default)]
    #[garde(length(min = 1))]
    pub address: String,
}

#[derive(Debug, Serialize)]
pub struct ContactResponse {
    pub success: bool,
    pub contact: Contact,
}

/// POST /api/contacts
pub async fn create_contact(
    State(state): State<AppState>,
    AppJson(request): AppJson<CreateContactRequest>,
) -> Result<(StatusCode, Json<ContactResponse>), AppError> {
    request.validate().map_err(|report| {
        tracing::debug!(report = %report, "問い合わせのバリデーションエラー");
        AppError::Validation("All fields are required.".to_string())
    })?;

    let contact = state
        .contact_store
        .create(NewContact {
            name: request.name,
            email: request.email,
            message: request.message,
            phone: request.phone,
            service: request.service,
            address: request.address,
        })
        .await?;

    tracing::info!(contact_id = %contact.id, "問い合わせ受付");

    Ok((
        StatusCode::CREATED,
        Json(ContactResponse {
            success: true,
            contact,
        }),
    ))
}

// === 問い合わせ一覧（管理者） ===

#[derive(Debug, Serialize)]
pub struct ContactListResponse {
    pub success: bool,
    pub contacts: Vec<Contact>,
}

/// GET /api/contacts
pub async fn list_contacts(
    State(state): State<AppState>,
    _admin: AdminUser,
) -> Result<Json<ContactListResponse>, AppError> {
    let contacts = state.contact_store.list_all().await?;

    Ok(Json(ContactListResponse {
        success: true,
        contacts,
    }))
}

// === 問い合わせ削除（管理者） ===

#[derive(Debug, Serialize)]
pub struct DeleteContactResponse {
    pub success: bool,
    pub message: String,
}

/// DELETE /api/contacts/delete/{id}
pub async fn delete_contact(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    AppPath(id): AppPath<Uuid>,
) -> Result<Json<DeleteContactResponse>, AppError> {
    if !state.contact_store.delete(id).await? {
        return Err(AppError::NotFound(CONTACT_NOT_FOUND.to_string()));
    }

    tracing::info!(contact_id = %id, admin_id = %admin.user_id, "問い合わせ削除");

    Ok(Json(DeleteContactResponse {
        success: true,
        message: "Contact deleted.".to_string(),
    }))
}

// === ステータス更新（管理者） ===

#[derive(Debug, Deserialize)]
pub struct UpdateContactStatusRequest {
    #[serde(default)]
    pub status: String,
}

/// PATCH /api/contacts/update/{id}
pub async fn update_contact_status(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    AppPath(id): AppPath<Uuid>,
    AppJson(request): AppJson<UpdateContactStatusRequest>,
) -> Result<Json<ContactResponse>, AppError> {
    let status = parse_status(&request.status)?;

    let contact = state
        .contact_store
        .update_status(id, status)
        .await?
        .ok_or_else(|| AppError::NotFound(CONTACT_NOT_FOUND.to_string()))?;

    tracing::info!(
        contact_id = %id,
        admin_id = %admin.user_id,
        status = status.as_str(),
        "問い合わせステータス更新"
    );

    Ok(Json(ContactResponse {
        success: true,
        contact,
    }))
}

/// ステータス文字列のバリデーション
fn parse_status(status: &str) -> Result<ContactStatus, AppError> {
    if status.trim().is_empty() {
        return Err(AppError::Validation(
            "Contact id and status are required.".to_string(),
        ));
    }
    ContactStatus::try_from(status.to_string())
        .map_err(|_| AppError::Validation("Invalid status value.".to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn request() -> CreateContactRequest {
        CreateContactRequest {
            name: "A".to_string(),
            email: "a@x.com".to_string(),
            message: "Need a website".to_string(),
            phone: "0123456789".to_string(),
            service: "Web design".to_string(),
            address: "1 Main St".to_string(),
        }
    }

    #[test]
    fn test_validate_complete_contact() {
        assert!(request().validate().is_ok());
    }

    #[test]
    fn test_validate_missing_field() {
        let mut request = request();
        request.address = String::new();
        assert!(request.validate().is_err());
    }

    #[test]
    fn test_missing_fields_deserialize_as_empty() {
        let request: CreateContactRequest =
            serde_json::from_str(r#"{"name":"A","email":"a@x.com"}"#).unwrap();
        assert!(request.validate().is_err());
    }

    #[test]
    fn test_parse_status() {
        assert_eq!(parse_status("completed").unwrap(), ContactStatus::Completed);
        assert!(parse_status("").is_err());
        assert!(parse_status("archived").is_err());
    }
}
