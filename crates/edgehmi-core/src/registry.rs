//! Immutable registry of the table services behind the gateway.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::error::{CoreError, Result};

/// Placeholder substituted with the service name in the upstream URL template.
pub const SERVICE_PLACEHOLDER: &str = "{service}";

/// One registered table service and its resolved upstream location.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ServiceEntry {
    /// Service name; doubles as the path namespace the service advertises.
    pub name: String,
    /// Base URL of the backend, without a trailing slash.
    pub upstream_base: String,
}

/// Ordered collection of table services, fixed for the process lifetime.
///
/// Order is the aggregation precedence: when two services define a schema or
/// tag with the same name, the earlier entry wins.
#[derive(Debug, Clone, Default)]
pub struct ServiceRegistry {
    entries: Vec<ServiceEntry>,
}

impl ServiceRegistry {
    /// Builds the registry from configured names, resolving each upstream
    /// location from `overrides` or, failing that, from the base-URL template
    /// (docker-compose convention: the service name is the hostname).
    ///
    /// A duplicate or malformed name is a configuration error; the registry
    /// refuses to build rather than letting one route shadow another.
    pub fn from_template(
        names: &[String],
        template: &str,
        overrides: &HashMap<String, String>,
    ) -> Result<Self> {
        if !template.contains(SERVICE_PLACEHOLDER) {
            return Err(CoreError::configuration(format!(
                "upstream base URL template must contain {SERVICE_PLACEHOLDER}"
            )));
        }

        let mut entries: Vec<ServiceEntry> = Vec::with_capacity(names.len());
        for name in names {
            if !is_valid_name(name) {
                return Err(CoreError::invalid_service_name(name));
            }
            if entries.iter().any(|e| e.name == *name) {
                return Err(CoreError::duplicate_service_name(name));
            }

            let upstream_base = overrides
                .get(name)
                .cloned()
                .unwrap_or_else(|| template.replace(SERVICE_PLACEHOLDER, name));
            let upstream_base = upstream_base.trim_end_matches('/').to_string();
            url::Url::parse(&upstream_base)?;

            entries.push(ServiceEntry {
                name: name.clone(),
                upstream_base,
            });
        }

        Ok(Self { entries })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.iter().any(|e| e.name == name)
    }

    /// Service names in registry (precedence) order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|e| e.name.as_str())
    }

    /// Resolved upstream base URL for a service, if registered.
    pub fn upstream_base(&self, name: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|e| e.name == name)
            .map(|e| e.upstream_base.as_str())
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ServiceEntry> {
        self.entries.iter()
    }
}

// Service names double as URL path segments and docker-compose hostnames.
fn is_valid_name(name: &str) -> bool {
    !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_')
}
