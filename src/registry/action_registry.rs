//! Concurrent action registry
//!
//! Actions are looked up by canonical id or alias, case-insensitively. The registry uses
//! DashMap so handlers can resolve actions without a global lock.

use dashmap::DashMap;
use tracing::{info, instrument};

use super::metadata::ActionMetadata;
use crate::connectors::{self, ConnectorContext};
use crate::core::{BoxedAction, ConversationState, Invocation};
use crate::errors::{ActionError, ActionResult};

#[derive(Default)]
pub struct ActionRegistry {
    actions: DashMap<String, BoxedAction>,
    aliases: DashMap<String, String>,
}

impl ActionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry populated with every built-in connector.
    pub fn with_builtin(ctx: &ConnectorContext) -> Self {
        let registry = Self::new();
        for action in connectors::builtin_actions(ctx) {
            registry.register(action);
        }
        info!(count = registry.len(), "Registered built-in actions");
        registry
    }

    pub fn register(&self, action: BoxedAction) {
        let meta = action.metadata();
        let id = meta.id.to_lowercase();
        for alias in &meta.aliases {
            self.aliases.insert(alias.to_lowercase(), id.clone());
        }
        self.actions.insert(id, action);
    }

    /// Canonical id for a name or alias.
    pub fn resolve(&self, name: &str) -> Option<String> {
        let key = name.trim().to_lowercase();
        if self.actions.contains_key(&key) {
            return Some(key);
        }
        self.aliases.get(&key).map(|id| id.value().clone())
    }

    pub fn get(&self, name: &str) -> Option<BoxedAction> {
        let id = self.resolve(name)?;
        self.actions.get(&id).map(|entry| entry.value().clone())
    }

    pub fn contains(&self, name: &str) -> bool {
        self.resolve(name).is_some()
    }

    pub fn len(&self) -> usize {
        self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.actions.is_empty()
    }

    /// Metadata of every action, sorted by id.
    pub fn list(&self) -> Vec<ActionMetadata> {
        let mut all: Vec<ActionMetadata> = self
            .actions
            .iter()
            .map(|entry| entry.value().metadata())
            .collect();
        all.sort_by(|a, b| a.id.cmp(&b.id));
        all
    }

    /// Resolve and run an action.
    #[instrument(skip(self, state, invocation))]
    pub async fn execute(
        &self,
        name: &str,
        state: &mut ConversationState,
        invocation: Invocation,
    ) -> ActionResult<()> {
        let action = self
            .get(name)
            .ok_or_else(|| ActionError::UnknownAction(name.to_string()))?;
        action.execute(state, invocation).await
    }
}
