//! # API REST
//!
//! REST API for the LMS content and ordering core.
//!
//! Handles:
//! - HTTP endpoints with axum
//! - OpenAPI/Swagger documentation
//! - REST-specific concerns (JSON request/response shapes, CORS, status codes)
//!
//! All behaviour lives in `lms-core`; handlers only translate between JSON and core types.

#![warn(rust_2018_idioms)]

use axum::{
    extract::State,
    http::StatusCode,
    response::Json,
    routing::{get, post},
    Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use utoipa::{OpenApi, ToSchema};
use utoipa_swagger_ui::SwaggerUi;

use lms_core::{
    plan_swap, ContentRenderer, CoreConfig, Direction, EntityId, OrderPatch, OrderedEntry,
    SwapOutcome,
};

/// Application state shared across REST API handlers.
#[derive(Clone)]
struct AppState {
    renderer: Arc<ContentRenderer>,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct HealthRes {
    pub ok: bool,
    pub message: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct RenderContentReq {
    /// A block document, a stored string (JSON document or plain text), or null.
    #[schema(value_type = Object)]
    #[serde(default)]
    pub content: serde_json::Value,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct RenderContentRes {
    pub html: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct OrderEntryDto {
    /// Entity id. Numeric ids are accepted and treated as strings.
    #[schema(value_type = String)]
    pub id: serde_json::Value,
    pub order: i64,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct PlanReorderReq {
    /// Siblings in their current display order.
    pub siblings: Vec<OrderEntryDto>,
    #[schema(value_type = String)]
    pub target_id: serde_json::Value,
    /// `up` or `down`.
    pub direction: String,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct OrderPatchDto {
    pub id: String,
    pub order: i64,
}

#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct PlanReorderRes {
    /// `swap` or `noop`.
    pub outcome: String,
    /// Exactly two patches for `swap`; empty for `noop`.
    pub patches: Vec<OrderPatchDto>,
    /// `target_not_found`, `at_top` or `at_bottom` for `noop`.
    pub reason: Option<String>,
}

#[derive(OpenApi)]
#[openapi(
    paths(health, render_content, plan_reorder),
    components(schemas(
        HealthRes,
        RenderContentReq,
        RenderContentRes,
        OrderEntryDto,
        PlanReorderReq,
        OrderPatchDto,
        PlanReorderRes,
    ))
)]
pub struct ApiDoc;

/// Builds the REST router.
///
/// The renderer is created once from `cfg` and shared by every request.
pub fn router(cfg: &CoreConfig) -> Router {
    let state = AppState {
        renderer: Arc::new(ContentRenderer::new(cfg)),
    };

    Router::new()
        .route("/health", get(health))
        .route("/content/render", post(render_content))
        .route("/reorder/plan", post(plan_reorder))
        .merge(SwaggerUi::new("/swagger-ui").url("/api-docs/openapi.json", ApiDoc::openapi()))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 200, description = "Health check response", body = HealthRes)
    )
)]
/// Health check endpoint for monitoring and load balancers.
async fn health() -> Json<HealthRes> {
    Json(HealthRes {
        ok: true,
        message: "LMS REST API is alive".into(),
    })
}

#[utoipa::path(
    post,
    path = "/content/render",
    request_body = RenderContentReq,
    responses(
        (status = 200, description = "Sanitised lesson markup", body = RenderContentRes)
    )
)]
/// Render lesson content to sanitised HTML.
///
/// Never fails for well-formed JSON: malformed content renders placeholders or markers.
#[axum::debug_handler]
async fn render_content(
    State(state): State<AppState>,
    Json(req): Json<RenderContentReq>,
) -> Json<RenderContentRes> {
    let html = state.renderer.render_value(Some(&req.content));
    Json(RenderContentRes { html })
}

#[utoipa::path(
    post,
    path = "/reorder/plan",
    request_body = PlanReorderReq,
    responses(
        (status = 200, description = "Swap plan or no-op", body = PlanReorderRes),
        (status = 400, description = "Invalid id or direction")
    )
)]
/// Plan an up/down move within one sibling list.
///
/// The returned patches must be persisted together by the caller.
///
/// # Errors
/// Returns `400 Bad Request` if:
/// - an id is empty or not a string/integer, or
/// - the direction is not `up` or `down`.
#[axum::debug_handler]
async fn plan_reorder(
    Json(req): Json<PlanReorderReq>,
) -> Result<Json<PlanReorderRes>, (StatusCode, &'static str)> {
    let direction: Direction = req.direction.parse().map_err(|e| {
        tracing::warn!("Plan reorder rejected: {}", e);
        (StatusCode::BAD_REQUEST, "direction must be 'up' or 'down'")
    })?;

    let target_id = parse_id(req.target_id)?;
    let siblings = req
        .siblings
        .into_iter()
        .map(|s| parse_id(s.id).map(|id| OrderedEntry::new(id, s.order)))
        .collect::<Result<Vec<_>, _>>()?;

    let res = match plan_swap(&siblings, &target_id, direction) {
        SwapOutcome::Swap(plan) => PlanReorderRes {
            outcome: "swap".into(),
            patches: plan.patches().into_iter().map(patch_dto).collect(),
            reason: None,
        },
        SwapOutcome::NoOp(reason) => PlanReorderRes {
            outcome: "noop".into(),
            patches: Vec::new(),
            reason: serde_json::to_value(reason)
                .ok()
                .and_then(|v| v.as_str().map(str::to_string)),
        },
    };
    Ok(Json(res))
}

fn parse_id(value: serde_json::Value) -> Result<EntityId, (StatusCode, &'static str)> {
    serde_json::from_value::<EntityId>(value).map_err(|e| {
        tracing::warn!("Plan reorder rejected id: {}", e);
        (StatusCode::BAD_REQUEST, "invalid entity id")
    })
}

fn patch_dto(patch: OrderPatch) -> OrderPatchDto {
    OrderPatchDto {
        id: patch.id.to_string(),
        order: patch.order,
    }
}
