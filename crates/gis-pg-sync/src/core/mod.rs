//! Shared building blocks used by the classifier, registry and orchestrator.

pub mod identifier;

pub use identifier::{normalize_layer_name, qualify_pg, quote_pg, table_name_for};
