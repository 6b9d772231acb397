//! Merging upstream OpenAPI documents into the gateway-wide document.

use std::collections::HashSet;

use futures_util::future;
use indexmap::IndexMap;
use serde_json::Value;
use tracing::{debug, instrument, warn};

use crate::server::AppState;

use super::fetch::fetch_openapi;
use super::types::{AggregatedComponents, AggregatedDocument, DocumentInfo, Tag, UpstreamDocument};

/// Infrastructure paths every backend exposes that must not leak into the
/// aggregate.
const SKIP_PATHS: [&str; 5] = ["/", "/health", "/openapi.json", "/docs", "/redoc"];

/// Builds the merged OpenAPI document across all registered table services.
///
/// Documents are fetched concurrently but folded in registry order, so
/// first-seen precedence for schema names and tag positions is deterministic.
/// An unreachable or malformed backend contributes nothing and is logged;
/// the result is always a valid document envelope.
#[instrument(skip(state), fields(services = state.registry.len()))]
pub async fn aggregate_openapi(state: &AppState) -> AggregatedDocument {
    let fetches = state.registry.iter().map(|entry| {
        let client = &state.http;
        let timeout = state.discovery_timeout;
        async move {
            (
                entry.name.as_str(),
                fetch_openapi(client, &entry.upstream_base, timeout).await,
            )
        }
    });
    let outcomes = future::join_all(fetches).await;

    let mut merge = Merge::default();
    for (service, outcome) in outcomes {
        match outcome {
            Ok(doc) => merge.add(service, doc),
            Err(err) => {
                warn!(service, error = %err, "table service document unavailable, skipping")
            }
        }
    }

    merge.into_document(env!("CARGO_PKG_VERSION"))
}

/// Accumulator folding per-service documents in registry order.
#[derive(Default)]
struct Merge {
    paths: IndexMap<String, Value>,
    schemas: IndexMap<String, Value>,
    tags: Vec<Tag>,
    seen_tags: HashSet<String>,
}

impl Merge {
    fn add(&mut self, service: &str, doc: UpstreamDocument) {
        // First writer wins: a later service cannot override a merged schema.
        for (name, schema) in doc.components.schemas {
            self.schemas.entry(name).or_insert(schema);
        }

        let namespace = format!("/{service}");
        for (path, item) in doc.paths {
            if SKIP_PATHS.contains(&path.as_str()) || !is_namespaced(&path, &namespace) {
                debug!(service, path, "dropping infrastructure or foreign path");
                continue;
            }
            self.collect_tags(&item);
            // Duplicate paths should not occur between well-behaved backends;
            // if they do, the later service silently overwrites.
            self.paths.insert(path, item);
        }
    }

    fn collect_tags(&mut self, path_item: &Value) {
        let Some(operations) = path_item.as_object() else {
            return;
        };
        for op in operations.values() {
            let Some(tags) = op.get("tags").and_then(Value::as_array) else {
                continue;
            };
            for tag in tags.iter().filter_map(Value::as_str) {
                if self.seen_tags.insert(tag.to_string()) {
                    self.tags.push(Tag {
                        name: tag.to_string(),
                    });
                }
            }
        }
    }

    fn into_document(self, version: &str) -> AggregatedDocument {
        AggregatedDocument {
            openapi: "3.0.3",
            source: "gateway-aggregated",
            info: DocumentInfo {
                title: "Edge HMI API Documentation".to_string(),
                version: version.to_string(),
                description: format!(
                    "Gateway over per-table services. Total {} tables integrated.",
                    self.tags.len()
                ),
            },
            paths: self.paths,
            tags: self.tags,
            servers: Vec::new(),
            components: AggregatedComponents {
                schemas: self.schemas,
            },
        }
    }
}

// A well-behaved backend only advertises paths under its own namespace.
fn is_namespaced(path: &str, namespace: &str) -> bool {
    path.starts_with(namespace)
}
