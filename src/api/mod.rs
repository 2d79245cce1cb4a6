//! REST API layer: route handlers, DTOs, extractors and router composition.
//!
//! All booking endpoints are mounted under `/api/v1` and identify the
//! caller through the `X-User-Id` header (see [`extract::Actor`]).

pub mod dto;
pub mod extract;
pub mod handlers;
pub mod openapi;

use axum::Router;

use crate::app_state::AppState;

/// Builds the complete API router with all REST endpoints.
pub fn build_router() -> Router<AppState> {
    Router::new()
        .nest("/api/v1", handlers::routes())
        .merge(handlers::system::routes())
}

/// Builds the router and mounts Swagger UI at `/swagger-ui`.
#[cfg(feature = "swagger-ui")]
pub fn build_router_with_docs() -> Router<AppState> {
    use utoipa::OpenApi;
    use utoipa_swagger_ui::SwaggerUi;

    build_router().merge(
        SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", openapi::ApiDoc::openapi()),
    )
}
