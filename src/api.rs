//! REST API for the packing service.
//!
//! Provides HTTP endpoints for packing requests and the API documentation.
//! Uses Axum as the web framework and supports CORS.

use axum::extract::rejection::JsonRejection;
use axum::extract::{Json, State};
use axum::response::sse::{Event, KeepAlive, Sse};
use axum::{
    Router,
    http::StatusCode,
    response::{Html, IntoResponse, Response},
    routing::{get, post},
};
use serde::{Deserialize, Serialize};
#[allow(unused_imports)]
use serde_json::json;
use std::sync::OnceLock;
use tokio::sync::mpsc;
use tokio_stream::StreamExt;
use tokio_stream::wrappers::ReceiverStream;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use utoipa::{OpenApi, ToSchema};

use crate::config::{ApiConfig, OptimizerConfig};
use crate::error::PackError;
use crate::model::{PackReport, PackedRectangle, PackingDiagnostics, RectSpec};
use crate::optimizer::{PackEvent, PackOptions, PackingConfig, pack_async, pack_with_progress};
use crate::types::{Dimension, Margin};

#[derive(Clone)]
struct ApiState {
    optimizer_config: OptimizerConfig,
}

static OPENAPI_DOC: OnceLock<utoipa::openapi::OpenApi> = OnceLock::new();

// Integrity hashes are pinned to swagger-ui-dist 5.17.14; update them with the version.
const SWAGGER_UI_HTML: &str = r##"<!DOCTYPE html>
<html lang="en">
    <head>
        <meta charset="utf-8" />
        <title>rect-packer API Docs</title>
        <link
            rel="stylesheet"
            href="https://unpkg.com/swagger-ui-dist@5.17.14/swagger-ui.css"
            integrity="sha384-wxLW6kwyHktdDGr6Pv1zgm/VGJh99lfUbzSn6HNHBENZlCN7W602k9VkGdxuFvPn"
            crossorigin="anonymous"
        />
    </head>
    <body>
        <div id="swagger-ui"></div>
        <script
            src="https://unpkg.com/swagger-ui-dist@5.17.14/swagger-ui-bundle.js"
            integrity="sha384-wmyclcVGX/WhUkdkATwhaK1X1JtiNrr2EoYJ+diV3vj4v6OC5yCeSu+yW13SYJep"
            crossorigin="anonymous"
        ></script>
        <script>
            window.onload = function () {
                window.ui = SwaggerUIBundle({
                    url: "/docs/openapi.json",
                    dom_id: "#swagger-ui",
                });
            };
        </script>
    </body>
    </html>"##;

fn openapi_doc() -> &'static utoipa::openapi::OpenApi {
    OPENAPI_DOC.get_or_init(ApiDoc::openapi)
}

/// Request structure for the packing endpoints.
#[derive(Deserialize, ToSchema)]
#[schema(
    example = json!({
        "rects": [
            { "id": "a", "w": 20.0, "h": 10.0 },
            { "id": "b", "w": 10.0, "h": 10.0 }
        ],
        "container": { "w": 30.0, "h": 10.0 },
        "padding": 0.0,
        "margin": { "top": 0.0, "right": 0.0, "bottom": 0.0, "left": 0.0 },
        "no_rotation": false
    })
)]
pub struct PackRequest {
    pub rects: Vec<RectSpec>,
    pub container: Dimension,
    #[serde(default)]
    #[schema(nullable = true)]
    pub padding: Option<f64>,
    #[serde(default)]
    #[schema(nullable = true)]
    pub margin: Option<Margin>,
    #[serde(default)]
    #[schema(nullable = true)]
    pub no_rotation: Option<bool>,
}

impl PackRequest {
    fn into_parts(self) -> (Vec<RectSpec>, Dimension, PackOptions) {
        let options = PackOptions {
            padding: self.padding.unwrap_or(0.0),
            margin: self.margin.unwrap_or_default(),
            no_rotation: self.no_rotation.unwrap_or(false),
        };
        (self.rects, self.container, options)
    }
}

#[derive(Serialize, ToSchema)]
struct ErrorResponse {
    error: String,
    details: String,
}

impl ErrorResponse {
    fn new(error: impl Into<String>, details: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            details: details.into(),
        }
    }
}

fn error_response(
    status: StatusCode,
    error: impl Into<String>,
    details: impl Into<String>,
) -> Response {
    (status, Json(ErrorResponse::new(error, details))).into_response()
}

fn json_deserialize_error(err: JsonRejection) -> Response {
    error_response(
        StatusCode::UNPROCESSABLE_ENTITY,
        "Invalid JSON data",
        err.to_string(),
    )
}

fn pack_error_response(err: PackError) -> Response {
    match err {
        PackError::Validation(err) => error_response(
            StatusCode::UNPROCESSABLE_ENTITY,
            "Invalid input data",
            err.to_string(),
        ),
        other => error_response(
            StatusCode::INTERNAL_SERVER_ERROR,
            "Packing failed",
            other.to_string(),
        ),
    }
}

fn parse_pack_request(
    payload: Result<Json<PackRequest>, JsonRejection>,
) -> Result<PackRequest, Response> {
    match payload {
        Ok(Json(payload)) => Ok(payload),
        Err(err) => Err(json_deserialize_error(err)),
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(handle_pack, handle_pack_stream),
    components(
        schemas(
            PackRequest,
            PackReport,
            PackedRectangle,
            PackingDiagnostics,
            PackEvent,
            RectSpec,
            Dimension,
            Margin,
            ErrorResponse
        )
    ),
    tags((name = "packing", description = "Endpoints for rectangle packing"))
)]
struct ApiDoc;

/// Builds the application router.
pub fn router(optimizer_config: OptimizerConfig) -> Router {
    let cors = CorsLayer::new()
        .allow_methods(Any)
        .allow_origin(Any)
        .allow_headers(Any);

    let state = ApiState { optimizer_config };

    Router::new()
        .route("/pack", post(handle_pack))
        .route("/pack_stream", post(handle_pack_stream))
        .route("/docs/openapi.json", get(serve_openapi_json))
        .route("/docs", get(serve_openapi_ui))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Starts the API server.
///
/// Blocks until the server is terminated.
pub async fn start_api_server(config: ApiConfig, optimizer_config: OptimizerConfig) {
    let app = router(optimizer_config);

    let addr = config.socket_addr();
    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(listener) => listener,
        Err(err) => {
            tracing::error!("❌ Could not bind API server to {}: {}", addr, err);
            return;
        }
    };

    let display_host = config.display_host().to_string();
    tracing::info!(
        "🚀 Server running on http://{}:{}",
        display_host,
        config.port()
    );
    if config.binds_to_all_interfaces() && config.uses_default_host() {
        tracing::info!("💡 Local access: http://localhost:{}", config.port());
    }
    tracing::info!("📦 API Endpoints: POST /pack, POST /pack_stream");
    tracing::info!("📑 Documentation: GET /docs, GET /docs/openapi.json");

    if let Err(err) = axum::serve(listener, app).await {
        tracing::error!("❌ API server terminated with an error: {err}");
    }
}

/// Handler for POST /pack endpoint.
///
/// Packs the rectangles into the container on the blocking pool.
#[utoipa::path(
    post,
    path = "/pack",
    request_body = PackRequest,
    responses(
        (status = 200, description = "Packing finished, possibly partial", body = PackReport),
        (
            status = UNPROCESSABLE_ENTITY,
            description = "Invalid request",
            body = ErrorResponse
        )
    ),
    tag = "packing"
)]
async fn handle_pack(
    State(state): State<ApiState>,
    payload: Result<Json<PackRequest>, JsonRejection>,
) -> impl IntoResponse {
    let request = match parse_pack_request(payload) {
        Ok(request) => request,
        Err(response) => return response,
    };

    let (rects, container, options) = request.into_parts();
    tracing::info!(
        "📥 New pack request: {} rectangles, container {}x{}",
        rects.len(),
        container.w,
        container.h
    );
    let config: PackingConfig = state.optimizer_config.packing_config();

    match pack_async(rects, container, options, config).await {
        Ok(report) => {
            tracing::info!(
                "📦 Result: {} packed, {} unpacked",
                report.packed_count(),
                report.unpacked_count()
            );
            (StatusCode::OK, Json(report)).into_response()
        }
        Err(err) => pack_error_response(err),
    }
}

/// Handler for POST /pack_stream endpoint (SSE).
///
/// Streams pack events in real-time as Server-Sent Events (text/event-stream).
#[utoipa::path(
    post,
    path = "/pack_stream",
    request_body = PackRequest,
    responses(
        (
            status = 200,
            description = "Streams pack events in real-time",
            content_type = "text/event-stream",
            body = String
        ),
        (
            status = UNPROCESSABLE_ENTITY,
            description = "Invalid request",
            body = ErrorResponse
        )
    ),
    tag = "packing"
)]
async fn handle_pack_stream(
    State(state): State<ApiState>,
    payload: Result<Json<PackRequest>, JsonRejection>,
) -> impl IntoResponse {
    let request = match parse_pack_request(payload) {
        Ok(request) => request,
        Err(response) => return response,
    };

    let (rects, container, options) = request.into_parts();
    let config = state.optimizer_config.packing_config();
    let (tx, rx) = mpsc::channel::<String>(32);

    tokio::task::spawn_blocking(move || {
        let result = pack_with_progress(rects, container, options, config, |evt| {
            if let Ok(json) = serde_json::to_string(evt) {
                // Receiver has closed the stream; remaining events are discarded.
                let _ = tx.blocking_send(json);
            }
        });
        if let Err(err) = result {
            tracing::warn!("⚠️ Streamed packing failed: {err}");
            let payload = json!({ "type": "Error", "error": err.to_string() }).to_string();
            let _ = tx.blocking_send(payload);
        }
    });

    let stream = ReceiverStream::new(rx)
        .map(|msg| Ok::<_, std::convert::Infallible>(Event::default().data(msg)));
    Sse::new(stream)
        .keep_alive(
            KeepAlive::new()
                .interval(std::time::Duration::from_secs(10))
                .text("keep-alive"),
        )
        .into_response()
}

async fn serve_openapi_json(State(_state): State<ApiState>) -> impl IntoResponse {
    Json(openapi_doc())
}

async fn serve_openapi_ui(State(_state): State<ApiState>) -> impl IntoResponse {
    Html(SWAGGER_UI_HTML)
}
