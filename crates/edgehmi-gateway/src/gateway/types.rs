//! Document types for upstream discovery and aggregation.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// OpenAPI document as fetched from one table service.
///
/// Only the parts the aggregator consumes are modeled; everything else a
/// backend puts in its document is ignored on purpose, so a service upgrading
/// its OpenAPI tooling cannot break the gateway.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpstreamDocument {
    #[serde(default)]
    pub paths: IndexMap<String, Value>,
    #[serde(default)]
    pub components: UpstreamComponents,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpstreamComponents {
    #[serde(default)]
    pub schemas: IndexMap<String, Value>,
}

/// The merged document served at `/openapi.json`, built fresh per request.
#[derive(Debug, Clone, Serialize)]
pub struct AggregatedDocument {
    pub openapi: &'static str,
    /// Marks the document as gateway-synthesized rather than backend-served.
    #[serde(rename = "x-source")]
    pub source: &'static str,
    pub info: DocumentInfo,
    pub paths: IndexMap<String, Value>,
    pub tags: Vec<Tag>,
    /// Always empty so relative paths resolve against the gateway itself.
    pub servers: Vec<Value>,
    pub components: AggregatedComponents,
}

#[derive(Debug, Clone, Serialize)]
pub struct DocumentInfo {
    pub title: String,
    pub version: String,
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Tag {
    pub name: String,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct AggregatedComponents {
    pub schemas: IndexMap<String, Value>,
}
