use axum::{Json, extract::State, http::StatusCode};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::AppError;
use crate::extract::{AppJson, AppPath, AppQuery};
use crate::middleware::AdminUser;
use crate::models::{Service, ServiceImage};
use crate::repositories::{NewService, ServiceChanges};
use crate::state::AppState;

const SERVICE_NOT_FOUND: &str = "Service doesn't exist.";
const DEFAULT_PAGE: i64 = 1;
const DEFAULT_LIMIT: i64 = 10;
const MAX_LIMIT: i64 = 100;

/// features の入力形式
///
/// 配列、JSON配列の文字列、カンマ区切り文字列のいずれも受け付ける
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum FeaturesInput {
    List(Vec<String>),
    Text(String),
}

impl FeaturesInput {
    pub fn into_list(self) -> Result<Vec<String>, AppError> {
        match self {
            Self::List(list) => Ok(list),
            Self::Text(text) => match serde_json::from_str::<serde_json::Value>(&text) {
                Ok(serde_json::Value::Array(items)) => items
                    .into_iter()
                    .map(|item| match item {
                        serde_json::Value::String(s) => Ok(s),
                        _ => Err(features_must_be_array()),
                    })
                    .collect(),
                Ok(_) => Err(features_must_be_array()),
                Err(_) => Ok(text
                    .split(',')
                    .map(str::trim)
                    .filter(|s| !s.is_empty())
                    .map(str::to_string)
                    .collect()),
            },
        }
    }
}

fn features_must_be_array() -> AppError {
    AppError::Validation("Features must be an array.".to_string())
}

/// price の入力形式（数値または数値文字列）
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum PriceInput {
    Number(f64),
    Text(String),
}

impl PriceInput {
    pub fn into_price(self) -> Result<f64, AppError> {
        let price = match self {
            Self::Number(n) => n,
            Self::Text(text) => text
                .trim()
                .parse::<f64>()
                .map_err(|_| AppError::Validation("Price must be a number.".to_string()))?,
        };
        if !price.is_finite() || price < 0.0 {
            return Err(AppError::Validation(
                "Price must be a non-negative number.".to_string(),
            ));
        }
        Ok(price)
    }
}

// === 一覧（公開） ===

#[derive(Debug, Default, Deserialize)]
pub struct ListServicesQuery {
    pub page: Option<String>,
    pub limit: Option<String>,
}

#[derive(Debug, PartialEq, Eq, Serialize)]
pub struct PageMeta {
    pub total: i64,
    pub page: i64,
    pub limit: i64,
    pub pages: i64,
}

#[derive(Debug, Serialize)]
pub struct ServiceListResponse {
    pub success: bool,
    pub services: Vec<Service>,
    pub meta: PageMeta,
}

/// GET /api/services?page=&limit=
pub async fn list_services(
    State(state): State<AppState>,
    AppQuery(query): AppQuery<ListServicesQuery>,
) -> Result<Json<ServiceListResponse>, AppError> {
    let (page, limit) = pagination(&query);
    let offset = page_offset(page, limit);

    let (services, total) = tokio::try_join!(
        state.service_store.list(limit, offset),
        state.service_store.count()
    )?;

    Ok(Json(ServiceListResponse {
        success: true,
        services,
        meta: page_meta(total, page, limit),
    }))
}

/// ページ番号・件数の解釈（不正値は既定値、1未満は1、件数の上限は MAX_LIMIT）
fn pagination(query: &ListServicesQuery) -> (i64, i64) {
    let parse = |value: &Option<String>, default: i64| {
        value
            .as_deref()
            .and_then(|v| v.trim().parse::<i64>().ok())
            .filter(|v| *v != 0)
            .unwrap_or(default)
            .max(1)
    };
    (
        parse(&query.page, DEFAULT_PAGE),
        parse(&query.limit, DEFAULT_LIMIT).min(MAX_LIMIT),
    )
}

/// 巨大なページ番号でも溢れない（範囲外は空ページになる）
fn page_offset(page: i64, limit: i64) -> i64 {
    (page - 1).saturating_mul(limit)
}

fn page_meta(total: i64, page: i64, limit: i64) -> PageMeta {
    PageMeta {
        total,
        page,
        limit,
        pages: total.saturating_add(limit - 1) / limit,
    }
}

// === 詳細（公開） ===

#[derive(Debug, Serialize)]
pub struct ServiceResponse {
    pub success: bool,
    pub service: Service,
}

/// GET /api/services/{id}
pub async fn get_service(
    State(state): State<AppState>,
    AppPath(id): AppPath<Uuid>,
) -> Result<Json<ServiceResponse>, AppError> {
    let service = state
        .service_store
        .find_by_id(id)
        .await?
        .ok_or_else(|| AppError::NotFound(SERVICE_NOT_FOUND.to_string()))?;

    Ok(Json(ServiceResponse {
        success: true,
        service,
    }))
}

// === 作成（管理者） ===

#[derive(Debug, Deserialize)]
pub struct CreateServiceRequest {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
    pub features: Option<FeaturesInput>,
    pub price: Option<PriceInput>,
    #[serde(default)]
    pub duration: String,
    /// アップロード済み画像のメタデータ
    pub image: Option<ServiceImage>,
}

/// POST /api/services
pub async fn create_service(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    AppJson(request): AppJson<CreateServiceRequest>,
) -> Result<(StatusCode, Json<Service>), AppError> {
    let new_service = validate_create_request(request)?;

    let service = state.service_store.create(new_service).await?;

    tracing::info!(service_id = %service.id, admin_id = %admin.user_id, "サービス作成");

    Ok((StatusCode::CREATED, Json(service)))
}

fn validate_create_request(request: CreateServiceRequest) -> Result<NewService, AppError> {
    let required = |value: &str, field: &str| {
        if value.trim().is_empty() {
            Err(AppError::Validation(format!("{} is required.", field)))
        } else {
            Ok(())
        }
    };
    required(&request.title, "Title")?;
    required(&request.description, "Description")?;
    required(&request.duration, "Duration")?;

    let features = request
        .features
        .ok_or_else(|| AppError::Validation("Features are required.".to_string()))?
        .into_list()?;
    let price = request
        .price
        .ok_or_else(|| AppError::Validation("Price is required.".to_string()))?
        .into_price()?;

    Ok(NewService {
        title: request.title,
        description: request.description,
        features,
        price,
        duration: request.duration,
        image: request.image,
    })
}

// === 更新（管理者） ===

#[derive(Debug, Default, Deserialize)]
pub struct UpdateServiceRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub features: Option<FeaturesInput>,
    pub price: Option<PriceInput>,
    pub duration: Option<String>,
    pub image: Option<ServiceImage>,
}

/// PATCH /api/services/{id}
///
/// 指定された項目のみ更新
pub async fn update_service(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    AppPath(id): AppPath<Uuid>,
    AppJson(request): AppJson<UpdateServiceRequest>,
) -> Result<Json<ServiceResponse>, AppError> {
    let changes = validate_update_request(request)?;

    let service = state
        .service_store
        .update(id, changes)
        .await?
        .ok_or_else(|| AppError::NotFound(SERVICE_NOT_FOUND.to_string()))?;

    tracing::info!(service_id = %id, admin_id = %admin.user_id, "サービス更新");

    Ok(Json(ServiceResponse {
        success: true,
        service,
    }))
}

fn validate_update_request(request: UpdateServiceRequest) -> Result<ServiceChanges, AppError> {
    let changes = ServiceChanges {
        title: request.title,
        description: request.description,
        features: request.features.map(FeaturesInput::into_list).transpose()?,
        price: request.price.map(PriceInput::into_price).transpose()?,
        duration: request.duration,
        image: request.image,
    };

    if changes.is_empty() {
        return Err(AppError::Validation(
            "At least one field must be provided to update.".to_string(),
        ));
    }
    Ok(changes)
}

// === 削除（管理者） ===

#[derive(Debug, Serialize)]
pub struct DeleteServiceResponse {
    pub success: bool,
    pub message: String,
}

/// DELETE /api/services/{id}
pub async fn delete_service(
    State(state): State<AppState>,
    AdminUser(admin): AdminUser,
    AppPath(id): AppPath<Uuid>,
) -> Result<Json<DeleteServiceResponse>, AppError> {
    if !state.service_store.delete(id).await? {
        return Err(AppError::NotFound(SERVICE_NOT_FOUND.to_string()));
    }

    tracing::info!(service_id = %id, admin_id = %admin.user_id, "サービス削除");

    Ok(Json(DeleteServiceResponse {
        success: true,
        message: "Service removed successfully".to_string(),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn query(page: Option<&str>, limit: Option<&str>) -> ListServicesQuery {
        ListServicesQuery {
            page: page.map(str::to_string),
            limit: limit.map(str::to_string),
        }
    }

    #[test]
    fn test_pagination_defaults() {
        assert_eq!(pagination(&query(None, None)), (1, 10));
        assert_eq!(pagination(&query(Some("abc"), Some(""))), (1, 10));
        assert_eq!(pagination(&query(Some("0"), Some("0"))), (1, 10));
    }

    #[test]
    fn test_pagination_clamps_negative() {
        assert_eq!(pagination(&query(Some("-3"), Some("-1"))), (1, 1));
        assert_eq!(pagination(&query(Some("2"), Some("5"))), (2, 5));
    }

    #[test]
    fn test_pagination_extreme_values() {
        let (page, limit) = pagination(&query(Some("9223372036854775807"), Some("10")));
        assert_eq!((page, limit), (i64::MAX, 10));
        assert_eq!(page_offset(page, limit), i64::MAX);

        let (page, limit) = pagination(&query(Some("1"), Some("9223372036854775807")));
        assert_eq!((page, limit), (1, MAX_LIMIT));
        assert_eq!(page_offset(page, limit), 0);

        // 上限を超える数値はパース失敗として既定値
        assert_eq!(
            pagination(&query(Some("99999999999999999999"), None)),
            (1, 10)
        );
    }

    #[test]
    fn test_page_meta_does_not_overflow() {
        assert_eq!(page_meta(5, 1, i64::MAX).pages, 1);
        // 飽和するため切り上げは失われる
        assert_eq!(page_meta(i64::MAX, 1, MAX_LIMIT).pages, i64::MAX / MAX_LIMIT);
    }

    #[test]
    fn test_page_meta_rounds_up() {
        assert_eq!(page_meta(21, 1, 10).pages, 3);
        assert_eq!(page_meta(20, 1, 10).pages, 2);
        assert_eq!(page_meta(0, 1, 10).pages, 0);
    }

    #[test]
    fn test_features_forms() {
        let list: FeaturesInput = serde_json::from_str(r#"["SEO","Hosting"]"#).unwrap();
        assert_eq!(list.into_list().unwrap(), vec!["SEO", "Hosting"]);

        let json_text = FeaturesInput::Text(r#"["SEO","Hosting"]"#.to_string());
        assert_eq!(json_text.into_list().unwrap(), vec!["SEO", "Hosting"]);

        let csv = FeaturesInput::Text(" SEO , Hosting,, ".to_string());
        assert_eq!(csv.into_list().unwrap(), vec!["SEO", "Hosting"]);

        let not_array = FeaturesInput::Text(r#"{"a":1}"#.to_string());
        assert!(not_array.into_list().is_err());
    }

    #[test]
    fn test_price_forms() {
        assert_eq!(PriceInput::Number(499.0).into_price().unwrap(), 499.0);
        assert_eq!(PriceInput::Text(" 250.5 ".to_string()).into_price().unwrap(), 250.5);
        assert!(PriceInput::Text("free".to_string()).into_price().is_err());
        assert!(PriceInput::Number(-1.0).into_price().is_err());
    }

    #[test]
    fn test_validate_create_request() {
        let request: CreateServiceRequest = serde_json::from_str(
            r#"{"title":"Web","description":"Sites","features":"SEO,Hosting","price":"499","duration":"2 weeks"}"#,
        )
        .unwrap();
        let service = validate_create_request(request).unwrap();
        assert_eq!(service.features, vec!["SEO", "Hosting"]);
        assert_eq!(service.price, 499.0);
        assert!(service.image.is_none());

        let missing_price: CreateServiceRequest = serde_json::from_str(
            r#"{"title":"Web","description":"Sites","features":[],"duration":"2 weeks"}"#,
        )
        .unwrap();
        assert!(validate_create_request(missing_price).is_err());
    }

    #[test]
    fn test_validate_update_request_requires_a_field() {
        assert!(validate_update_request(UpdateServiceRequest::default()).is_err());

        let request = UpdateServiceRequest {
            duration: Some("3 weeks".to_string()),
            ..Default::default()
        };
        let changes = validate_update_request(request).unwrap();
        assert_eq!(changes.duration.as_deref(), Some("3 weeks"));
    }
}
