//! # gis-pg-sync
//!
//! Moves the local vector layers of a GIS project into PostGIS and points the
//! project at the database copies.
//!
//! A run:
//!
//! - **Normalizes** layer names and refuses to continue on collisions
//! - **Imports** every local spatial vector layer with `ogr2ogr`
//! - **Replaces** each local layer with a database layer carrying its style
//! - **Maintains** the shared `layer_styles` table, including geometry types
//!
//! ## Example
//!
//! ```rust,no_run
//! use gis_pg_sync::{Config, Lifecycle, ProjectDocument};
//!
//! #[tokio::main]
//! async fn main() -> gis_pg_sync::Result<()> {
//!     let config = Config::load("config.yaml")?;
//!     let mut project = ProjectDocument::load("project.yaml")?;
//!     if let Some(report) = Lifecycle::new(config).on_save(&mut project).await? {
//!         println!("Imported {} table(s)", report.imported_tables.len());
//!     }
//!     project.save("project.yaml")?;
//!     Ok(())
//! }
//! ```

pub mod classify;
pub mod config;
pub mod core;
pub mod error;
pub mod import;
pub mod lifecycle;
pub mod notify;
pub mod orchestrator;
pub mod project;
pub mod style;

// Re-exports for convenient access
pub use classify::LayerPartition;
pub use config::{Config, ConnectionConfig, HookConfig, MigrationConfig, TreePlacement};
pub use error::{MigrateError, Result};
pub use import::{BulkImporter, ImportRequest, Ogr2OgrImporter};
pub use lifecycle::{Lifecycle, LifecycleEvent};
pub use notify::{LogNotifier, Notifier};
pub use orchestrator::{Orchestrator, RunReport, SyncPlan};
pub use project::{Layer, LayerId, LayerKind, ProjectDocument, ProjectHost};
pub use style::{PgConnector, RegistryConnector, StyleRegistry};
