use axum::{
    Router,
    routing::{delete, get, patch, post},
};
use http::{HeaderValue, Method, header};
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::state::AppState;

/// Router の構築
pub fn create_router(state: AppState) -> Router {
    let cors = cors_layer(state.config.client_url.as_deref());

    Router::new()
        .route("/health", get(handlers::health_check))
        // 認証
        .route("/api/auth/register", post(handlers::register))
        .route("/api/auth/login", post(handlers::login))
        .route("/api/auth/send-otp", post(handlers::send_otp))
        .route("/api/auth/verify-otp", post(handlers::verify_otp))
        .route("/api/auth/forgot-password", post(handlers::forgot_password))
        .route("/api/auth/reset-password", post(handlers::reset_password))
        // 問い合わせ
        .route(
            "/api/contacts",
            post(handlers::create_contact).get(handlers::list_contacts),
        )
        .route("/api/contacts/users", get(handlers::list_users))
        .route(
            "/api/contacts/delete/{id}",
            delete(handlers::delete_contact),
        )
        .route(
            "/api/contacts/update/{id}",
            patch(handlers::update_contact_status),
        )
        // サービスカタログ
        .route(
            "/api/services",
            get(handlers::list_services).post(handlers::create_service),
        )
        .route(
            "/api/services/{id}",
            get(handlers::get_service)
                .patch(handlers::update_service)
                .delete(handlers::delete_service),
        )
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .with_state(state)
}

/// CORS 設定
///
/// CLIENT_URL が設定されていればそのオリジンのみ許可（Cookie 等の資格情報付き）
fn cors_layer(client_url: Option<&str>) -> CorsLayer {
    let Some(client_url) = client_url else {
        tracing::info!("CLIENT_URL 未設定（CORS は全オリジン許可、資格情報なし）");
        return CorsLayer::permissive();
    };

    match HeaderValue::from_str(client_url.trim_end_matches('/')) {
        Ok(origin) => CorsLayer::new()
            .allow_origin(origin)
            .allow_credentials(true)
            .allow_methods([
                Method::GET,
                Method::POST,
                Method::PATCH,
                Method::DELETE,
                Method::OPTIONS,
            ])
            .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION]),
        Err(e) => {
            tracing::warn!(error = ?e, client_url = %client_url, "CLIENT_URL が不正（CORS 無効）");
            CorsLayer::new()
        }
    }
}
