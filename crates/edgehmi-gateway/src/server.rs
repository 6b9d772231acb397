use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Duration;

use axum::{Router, middleware, routing::get};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use edgehmi_core::ServiceRegistry;

use crate::{
    config::AppConfig, gateway::proxy, handlers, middleware as app_middleware,
};

/// Shared state for all request handlers. Read-only after startup, so every
/// handler clones it freely and no synchronization is needed.
#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<ServiceRegistry>,
    pub http: reqwest::Client,
    pub request_timeout: Duration,
    pub discovery_timeout: Duration,
    pub body_limit: usize,
}

impl AppState {
    pub fn from_config(cfg: &AppConfig) -> anyhow::Result<Self> {
        let registry = cfg.registry()?;
        // Redirects are relayed to the caller, never followed on their behalf.
        let http = reqwest::Client::builder()
            .connect_timeout(cfg.connect_timeout())
            .redirect(reqwest::redirect::Policy::none())
            .build()?;
        Ok(Self {
            registry: Arc::new(registry),
            http,
            request_timeout: cfg.request_timeout(),
            discovery_timeout: cfg.discovery_timeout(),
            body_limit: cfg.server.body_limit_bytes,
        })
    }
}

pub fn build_app(cfg: &AppConfig) -> anyhow::Result<Router> {
    let state = AppState::from_config(cfg)?;
    let body_limit = cfg.server.body_limit_bytes;

    let router = Router::new()
        // Documentation front door
        .route("/", get(handlers::root))
        .route("/swagger", get(handlers::swagger))
        .route("/docs", get(handlers::docs_redirect))
        .route("/openapi.json", get(handlers::openapi))
        .route("/static/{*path}", get(handlers::static_asset))
        // Health and info endpoints
        .route("/health", get(handlers::health))
        .route("/info", get(handlers::info))
        // Browser favicon shortcut
        .route("/favicon.ico", get(handlers::favicon))
        // Table service forwarding: one parameterized handler for every
        // registered service; static routes above always win over these.
        .route(
            "/{service}",
            get(proxy::proxy_root)
                .post(proxy::proxy_root)
                .put(proxy::proxy_root)
                .patch(proxy::proxy_root)
                .delete(proxy::proxy_root),
        )
        .route(
            "/{service}/{*rest}",
            get(proxy::proxy_subpath)
                .post(proxy::proxy_subpath)
                .put(proxy::proxy_subpath)
                .patch(proxy::proxy_subpath)
                .delete(proxy::proxy_subpath),
        )
        // Middleware stack (inner to outer: cors -> trace -> request id -> body limit)
        .layer(CorsLayer::permissive())
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|req: &axum::http::Request<_>| {
                    use tracing::field::Empty;
                    // Skip creating a span for browser favicon requests to avoid noisy logs
                    if req.uri().path() == "/favicon.ico" {
                        return tracing::span!(tracing::Level::TRACE, "noop");
                    }
                    let method = req.method().clone();
                    let uri = req.uri().clone();
                    let req_id = req
                        .extensions()
                        .get::<axum::http::HeaderValue>()
                        .and_then(|v| v.to_str().ok())
                        .unwrap_or("")
                        .to_string();
                    tracing::info_span!(
                        "http.request",
                        http.method = %method,
                        http.target = %uri,
                        http.status_code = Empty,
                        request_id = %req_id
                    )
                })
                .on_response(
                    |res: &axum::http::Response<_>,
                     latency: std::time::Duration,
                     span: &tracing::Span| {
                        span.record(
                            "http.status_code",
                            tracing::field::display(res.status().as_u16()),
                        );
                        if let Some(meta) = span.metadata() {
                            if meta.name() != "noop" {
                                tracing::info!(
                                    http.status = %res.status().as_u16(),
                                    elapsed_ms = %latency.as_millis(),
                                    "request handled"
                                );
                            }
                        }
                    },
                ),
        )
        // request_id sits outside the trace layer so the span can read the injected id
        .layer(middleware::from_fn(app_middleware::request_id))
        .layer(axum::extract::DefaultBodyLimit::max(body_limit))
        .with_state(state);

    Ok(router)
}

pub struct GatewayServer {
    addr: SocketAddr,
    app: Router,
}

pub struct ServerBuilder {
    addr: SocketAddr,
    config: AppConfig,
}

impl ServerBuilder {
    pub fn new() -> Self {
        let cfg = AppConfig::default();
        Self {
            addr: cfg.addr(),
            config: cfg,
        }
    }

    pub fn with_addr(mut self, addr: SocketAddr) -> Self {
        self.addr = addr;
        self
    }

    pub fn with_config(mut self, cfg: AppConfig) -> Self {
        self.addr = cfg.addr();
        self.config = cfg;
        self
    }

    pub fn build(self) -> anyhow::Result<GatewayServer> {
        let app = build_app(&self.config)?;

        Ok(GatewayServer {
            addr: self.addr,
            app,
        })
    }
}

impl Default for ServerBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl GatewayServer {
    pub async fn run(self) -> anyhow::Result<()> {
        let listener = tokio::net::TcpListener::bind(self.addr).await?;
        tracing::info!("listening on {}", self.addr);
        axum::serve(listener, self.app)
            .with_graceful_shutdown(shutdown_signal())
            .await?;
        Ok(())
    }
}

async fn shutdown_signal() {
    // Wait for Ctrl+C
    let _ = tokio::signal::ctrl_c().await;
    tracing::info!("shutdown signal received");
}
