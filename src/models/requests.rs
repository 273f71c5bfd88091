//! Request DTOs for the cache admin API

use serde::Deserialize;

use crate::cache::DataChange;

/// Request body for namespace invalidation (POST /cache/invalidate)
///
/// # Fields
/// - `namespaces`: dataset namespaces to clear, e.g. `["stock_levels"]`
/// - `change`: optional mutation kind whose dependent namespaces are also cleared
#[derive(Debug, Clone, Default, Deserialize)]
pub struct InvalidateRequest {
    #[serde(default)]
    pub namespaces: Vec<String>,
    #[serde(default)]
    pub change: Option<DataChange>,
}

impl InvalidateRequest {
    /// Validates the request data
    ///
    /// Returns an error message if validation fails, None if valid.
    pub fn validate(&self) -> Option<String> {
        if self.namespaces.is_empty() && self.change.is_none() {
            return Some("At least one namespace or a change kind is required".to_string());
        }
        if self.namespaces.iter().any(|ns| ns.trim().is_empty()) {
            return Some("Namespace names cannot be empty".to_string());
        }
        None
    }

    /// Explicit namespaces followed by those implied by `change`, without
    /// duplicates.
    pub fn targets(&self) -> Vec<String> {
        let implied = self
            .change
            .map(DataChange::affected_namespaces)
            .unwrap_or_default()
            .iter()
            .map(|ns| ns.as_str().to_string());

        let mut targets: Vec<String> = Vec::new();
        for name in self.namespaces.iter().cloned().chain(implied) {
            if !targets.contains(&name) {
                targets.push(name);
            }
        }
        targets
    }
}
