//! Action metadata for discovery and documentation

use serde::{Deserialize, Serialize};

/// Describes one action as exposed to the flow engine.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActionMetadata {
    /// Canonical identifier, `<connector>.<action>` (e.g. "uipath.add_queue_item")
    pub id: String,

    /// Connector the action belongs to (e.g. "uipath")
    pub connector: String,

    /// Display name (e.g. "Add Queue Item")
    pub display_name: String,

    /// Brief description
    pub description: String,

    /// Alternative names, typically the legacy function names (e.g. "uipath.AddQueueItem")
    #[serde(default)]
    pub aliases: Vec<String>,

    /// Secret fields the action reads
    #[serde(default)]
    pub secret_fields: Vec<String>,

    /// Whether the action writes into the context store
    #[serde(default)]
    pub stores_result: bool,
}

impl ActionMetadata {
    pub fn new(connector: &str, action: &str) -> Self {
        Self {
            id: format!("{connector}.{action}"),
            connector: connector.to_string(),
            display_name: action.to_string(),
            stores_result: true,
            ..Default::default()
        }
    }

    pub fn with_display_name(mut self, name: impl Into<String>) -> Self {
        self.display_name = name.into();
        self
    }

    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    /// Adds `<connector>.<alias>` for every alias.
    pub fn with_aliases(mut self, aliases: &[&str]) -> Self {
        self.aliases.extend(
            aliases
                .iter()
                .map(|alias| format!("{}.{alias}", self.connector)),
        );
        self
    }

    pub fn with_secret_fields(mut self, fields: &[&str]) -> Self {
        self.secret_fields = fields.iter().map(|f| f.to_string()).collect();
        self
    }

    /// Marks an action that only emits output and never touches the context store.
    pub fn output_only(mut self) -> Self {
        self.stores_result = false;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_builder() {
        let meta = ActionMetadata::new("uipath", "add_queue_item")
            .with_display_name("Add Queue Item")
            .with_aliases(&["AddQueueItem"])
            .with_secret_fields(&["client_id", "refresh_token"]);

        assert_eq!(meta.id, "uipath.add_queue_item");
        assert_eq!(meta.aliases, vec!["uipath.AddQueueItem".to_string()]);
        assert_eq!(meta.secret_fields.len(), 2);
        assert!(meta.stores_result);
        assert!(!meta.clone().output_only().stores_result);
    }
}
