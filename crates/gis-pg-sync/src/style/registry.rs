//! Style registry trait for the database's shared style table.
//!
//! The registry is optional infrastructure: a database without the table is a
//! valid state, and every maintenance operation is a no-op until the first
//! style is saved.
//!
//! # Design Pattern
//!
//! The orchestrator works with `Box<dyn StyleRegistry>` handed out by a
//! [`RegistryConnector`] once per run, without knowing the concrete backend.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;

/// Geometry family label stored in the registry's `type` column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GeometryFamily {
    Point,
    Line,
    Polygon,
}

impl GeometryFamily {
    pub const ALL: [GeometryFamily; 3] = [
        GeometryFamily::Point,
        GeometryFamily::Line,
        GeometryFamily::Polygon,
    ];

    /// Label written into the registry.
    pub fn label(self) -> &'static str {
        match self {
            GeometryFamily::Point => "Point",
            GeometryFamily::Line => "Line",
            GeometryFamily::Polygon => "Polygon",
        }
    }

    /// `geometry_columns.type` values that belong to this family.
    pub fn catalog_types(self) -> &'static [&'static str] {
        match self {
            GeometryFamily::Point => &["POINT", "MULTIPOINT"],
            GeometryFamily::Line => &["LINESTRING", "MULTILINESTRING"],
            GeometryFamily::Polygon => &["POLYGON", "MULTIPOLYGON"],
        }
    }

    /// Family of a catalog geometry type; `None` for collections and generic geometry.
    pub fn from_catalog_type(geometry_type: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|family| {
            family
                .catalog_types()
                .iter()
                .any(|t| t.eq_ignore_ascii_case(geometry_type))
        })
    }
}

/// One style row to persist.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StyleRecord {
    /// Database name (`f_table_catalog`).
    pub catalog: String,
    pub schema: String,
    pub table: String,
    pub geometry_column: String,
    pub style_name: String,
    /// QML document.
    pub body: String,
    pub use_as_default: bool,
    pub description: String,
    pub owner: String,
}

/// Maintenance operations on the shared style table.
///
/// Each mutating call is its own committed unit of work.
#[async_trait]
pub trait StyleRegistry: Send {
    /// Whether the style table exists in the configured schema.
    async fn style_table_exists(&mut self) -> Result<bool>;

    /// Delete every row carrying this style name. No-op without the table.
    async fn remove_style(&mut self, style_name: &str) -> Result<u64>;

    /// Insert a style row, creating the table if needed. The row becomes the
    /// default style of its table when `use_as_default` is set.
    async fn save_style(&mut self, record: &StyleRecord) -> Result<()>;

    /// Rewrite every row's `type` from the geometry catalog. No-op without the table.
    async fn repair_geometry_types(&mut self) -> Result<u64>;

    /// Backend type name for logging.
    fn backend_type(&self) -> &'static str;
}

/// Hands out a registry session bound to one live connection.
///
/// The connection is released when the returned registry is dropped.
#[async_trait]
pub trait RegistryConnector: Send + Sync {
    async fn open(&self) -> Result<Box<dyn StyleRegistry>>;
}
