use axum::{
    Json,
    extract::{Path, State},
    http::{StatusCode, header},
    response::{Html, IntoResponse, Response},
};
use include_dir::{Dir, include_dir};
use serde_json::json;

use crate::gateway::aggregate_openapi;
use crate::server::AppState;

static STATIC_DIR: Dir<'_> = include_dir!("$CARGO_MANIFEST_DIR/static");

const SWAGGER_PAGE: &str = "html/swagger-ui.html";

/// Root = the unified Swagger UI over the aggregated document.
pub async fn root() -> Response {
    swagger_page()
}

/// Swagger UI alias.
pub async fn swagger() -> Response {
    swagger_page()
}

fn swagger_page() -> Response {
    match STATIC_DIR
        .get_file(SWAGGER_PAGE)
        .and_then(|f| f.contents_utf8())
    {
        Some(page) => Html(page).into_response(),
        None => (
            StatusCode::INTERNAL_SERVER_ERROR,
            "documentation page missing",
        )
            .into_response(),
    }
}

/// Legacy docs path redirects to the Swagger UI.
pub async fn docs_redirect() -> impl IntoResponse {
    (StatusCode::FOUND, [(header::LOCATION, "/")])
}

pub async fn health() -> impl IntoResponse {
    (StatusCode::OK, Json(json!({"status": "ok", "role": "gateway"})))
}

pub async fn info(State(state): State<AppState>) -> impl IntoResponse {
    let services: Vec<&str> = state.registry.names().collect();
    let body = json!({
        "service": "Edge HMI API Gateway",
        "version": env!("CARGO_PKG_VERSION"),
        "status": "running",
        "swagger_ui_url": "/",
        "integrated_api_docs": "/openapi.json",
        "integrated_services_count": services.len(),
        "services": services,
        "available_endpoints": {
            "/": "Swagger UI (main)",
            "/swagger": "Swagger UI (alias)",
            "/docs": "Redirect to Swagger UI",
            "/info": "Service information",
            "/openapi.json": "Aggregated OpenAPI specification",
            "/health": "Health check",
        },
    });
    (StatusCode::OK, Json(body))
}

/// The only OpenAPI source: each table service's document collected and merged.
pub async fn openapi(State(state): State<AppState>) -> impl IntoResponse {
    Json(aggregate_openapi(&state).await)
}

pub async fn favicon() -> impl IntoResponse {
    StatusCode::NO_CONTENT
}

/// Embedded static assets (Swagger UI page and friends).
pub async fn static_asset(Path(path): Path<String>) -> Response {
    match STATIC_DIR.get_file(path.as_str()) {
        Some(file) => {
            let mime = mime_guess::from_path(path.as_str()).first_or_octet_stream();
            (
                [(header::CONTENT_TYPE, mime.as_ref())],
                file.contents(),
            )
                .into_response()
        }
        None => StatusCode::NOT_FOUND.into_response(),
    }
}
