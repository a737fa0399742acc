//! Configuration type definitions.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

use super::ConnectionConfig;

/// Root configuration structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Explicit connection. When absent the connection is read from project variables.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub connection: Option<ConnectionConfig>,

    /// Pipeline behavior.
    #[serde(default)]
    pub migration: MigrationConfig,

    /// Bulk import tool settings.
    #[serde(default)]
    pub import: ImportConfig,

    /// Which project lifecycle events trigger a run.
    #[serde(default)]
    pub hooks: HookConfig,
}

/// Pipeline behavior configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MigrationConfig {
    /// Top-level layer tree group that receives database layers (default: "Postgres-layers").
    #[serde(default = "default_group_name")]
    pub group_name: String,

    /// Geometry column of imported tables (default: "geom").
    #[serde(default = "default_geometry_column")]
    pub geometry_column: String,

    /// Prefix of the managed style name (default: "Style-").
    #[serde(default = "default_style_prefix")]
    pub style_prefix: String,

    /// Shared style registry table (default: "layer_styles").
    #[serde(default = "default_style_table")]
    pub style_table: String,

    /// Overwrite existing tables on import (default: true).
    #[serde(default = "default_true")]
    pub overwrite: bool,

    /// Where database layers end up in the layer tree.
    #[serde(default)]
    pub placement: TreePlacement,
}

impl Default for MigrationConfig {
    fn default() -> Self {
        Self {
            group_name: default_group_name(),
            geometry_column: default_geometry_column(),
            style_prefix: default_style_prefix(),
            style_table: default_style_table(),
            overwrite: true,
            placement: TreePlacement::default(),
        }
    }
}

/// Layer tree placement of database layers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TreePlacement {
    /// Collect all database layers in one top-level group.
    #[default]
    Group,

    /// Put each database layer into the group its local layer lived in.
    InPlace,
}

/// ogr2ogr invocation settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ImportConfig {
    /// Path or name of the ogr2ogr executable (default: "ogr2ogr").
    #[serde(default = "default_program")]
    pub program: PathBuf,

    /// Promote single geometries to their multi type (default: true).
    #[serde(default = "default_true")]
    pub promote_to_multi: bool,

    /// Build a spatial index on the imported table (default: true).
    #[serde(default = "default_true")]
    pub spatial_index: bool,

    /// Extra arguments appended verbatim.
    #[serde(default)]
    pub extra_args: Vec<String>,
}

impl Default for ImportConfig {
    fn default() -> Self {
        Self {
            program: default_program(),
            promote_to_multi: true,
            spatial_index: true,
            extra_args: Vec::new(),
        }
    }
}

/// Lifecycle events that run the pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct HookConfig {
    #[serde(default)]
    pub on_open: bool,
    #[serde(default = "default_true")]
    pub on_save: bool,
    #[serde(default = "default_true")]
    pub on_close: bool,
}

impl Default for HookConfig {
    fn default() -> Self {
        Self {
            on_open: false,
            on_save: true,
            on_close: true,
        }
    }
}

// Default value functions for serde
fn default_group_name() -> String {
    "Postgres-layers".to_string()
}

fn default_geometry_column() -> String {
    "geom".to_string()
}

fn default_style_prefix() -> String {
    "Style-".to_string()
}

fn default_style_table() -> String {
    "layer_styles".to_string()
}

fn default_program() -> PathBuf {
    PathBuf::from("ogr2ogr")
}

fn default_true() -> bool {
    true
}
