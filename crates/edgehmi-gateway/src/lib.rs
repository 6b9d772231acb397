pub mod config;
pub mod gateway;
pub mod handlers;
pub mod middleware;
pub mod observability;
pub mod server;

pub use config::{AppConfig, GatewayConfig, LoggingConfig, ServerConfig, UpstreamConfig};
pub use gateway::{GatewayError, aggregate_openapi};
pub use observability::{apply_logging_level, init_tracing};
pub use server::{AppState, GatewayServer, ServerBuilder, build_app};
