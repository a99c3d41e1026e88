pub mod action_registry;
pub mod metadata;

pub use action_registry::ActionRegistry;
pub use metadata::ActionMetadata;
