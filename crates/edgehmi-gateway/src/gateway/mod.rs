//! Gateway core: upstream OpenAPI aggregation and reverse-proxy forwarding.
//!
//! Every table service behind the gateway exposes its own OpenAPI document and
//! accepts the standard verbs under its own path namespace. This module keeps
//! the two halves of the gateway's contract with them:
//!
//! ```text
//! ┌─────────────┐
//! │   Request   │
//! └──────┬──────┘
//!        │
//!        ├─▶ GET /openapi.json   fetch every service's document, merge
//!        │                       (dedup schemas/tags, drop noise paths)
//!        │
//!        └─▶ /{service}[/..]     forward verbatim to the matching backend,
//!                                relay the response unmodified
//! ```
//!
//! The service registry is immutable after startup; both halves read it
//! per request and never share mutable state.

pub mod aggregate;
pub mod error;
pub mod fetch;
pub mod proxy;
pub mod types;

pub use aggregate::aggregate_openapi;
pub use error::GatewayError;
pub use fetch::{DISCOVERY_PATH, FetchError, fetch_openapi};
pub use types::{AggregatedDocument, UpstreamDocument};
