//! Layer values as seen by the synchronization core.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::style::StyleManager;
use crate::core::identifier::quote_conninfo;

/// Marker that identifies a database connection string in a source descriptor.
pub const DATABASE_MARKER: &str = "dbname";

/// Stable layer identifier assigned by the host project.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct LayerId(pub String);

impl LayerId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Generate a fresh id derived from a table name, in the host's `<name>_<uuid>` shape.
    pub fn generate(prefix: &str) -> Self {
        Self(format!("{}_{}", prefix, uuid::Uuid::new_v4().simple()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for LayerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Storage backend of a layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Backend {
    /// File on disk (shapefile, GeoTIFF, ...).
    Local,
    /// Table in the PostgreSQL database.
    Database,
}

impl Backend {
    /// Infer the backend from a free-form source descriptor.
    ///
    /// A descriptor that merely happens to contain the marker (e.g. a local
    /// path like `/data/dbname_export.shp`) is classified as database-backed.
    pub fn infer(source: &str) -> Self {
        if source.contains(DATABASE_MARKER) {
            Backend::Database
        } else {
            Backend::Local
        }
    }

    pub fn is_local(self) -> bool {
        self == Backend::Local
    }
}

/// Layer kind, fixed when the layer is constructed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum LayerKind {
    Vector {
        /// False for attribute-only tables.
        #[serde(default = "default_spatial")]
        spatial: bool,
    },
    Raster,
}

fn default_spatial() -> bool {
    true
}

/// A map layer in the host project.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(from = "LayerRecord")]
pub struct Layer {
    pub id: LayerId,
    pub name: String,
    pub source: String,
    pub backend: Backend,
    pub kind: LayerKind,
    pub provider: String,
    pub styles: StyleManager,
}

impl Layer {
    /// Construct a layer, inferring its backend from the source descriptor.
    pub fn new(
        id: LayerId,
        name: impl Into<String>,
        source: impl Into<String>,
        kind: LayerKind,
        provider: impl Into<String>,
    ) -> Self {
        let source = source.into();
        Self {
            id,
            name: name.into(),
            backend: Backend::infer(&source),
            source,
            kind,
            provider: provider.into(),
            styles: StyleManager::default(),
        }
    }

    pub fn with_backend(mut self, backend: Backend) -> Self {
        self.backend = backend;
        self
    }

    pub fn with_styles(mut self, styles: StyleManager) -> Self {
        self.styles = styles;
        self
    }

    pub fn is_vector(&self) -> bool {
        matches!(self.kind, LayerKind::Vector { .. })
    }

    /// True for vector layers with geometry.
    pub fn is_spatial(&self) -> bool {
        matches!(self.kind, LayerKind::Vector { spatial: true })
    }

    pub fn is_local(&self) -> bool {
        self.backend.is_local()
    }

    /// File path part of a local descriptor (`/data/roads.shp|layername=roads` → `/data/roads.shp`).
    pub fn source_path(&self) -> &str {
        self.source.split('|').next().unwrap_or(&self.source)
    }
}

/// On-disk shape of a layer; the backend may be omitted and is then inferred.
#[derive(Deserialize)]
struct LayerRecord {
    id: LayerId,
    name: String,
    source: String,
    #[serde(default)]
    backend: Option<Backend>,
    kind: LayerKind,
    #[serde(default)]
    provider: String,
    #[serde(default)]
    styles: StyleManager,
}

impl From<LayerRecord> for Layer {
    fn from(record: LayerRecord) -> Self {
        let backend = record
            .backend
            .unwrap_or_else(|| Backend::infer(&record.source));
        Self {
            id: record.id,
            name: record.name,
            source: record.source,
            backend,
            kind: record.kind,
            provider: record.provider,
            styles: record.styles,
        }
    }
}

/// Descriptor of a PostGIS table, rendered the way the host writes postgres layer sources.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DataSourceUri {
    pub host: String,
    pub port: u16,
    pub database: String,
    pub user: String,
    pub schema: String,
    pub table: String,
    pub geometry_column: String,
}

impl DataSourceUri {
    /// Render the descriptor. The password is left out; the host resolves it
    /// from its own credential store.
    pub fn to_descriptor(&self) -> String {
        format!(
            "{}={} host={} port={} user={} table=\"{}\".\"{}\" ({})",
            DATABASE_MARKER,
            quote_conninfo(&self.database),
            self.host,
            self.port,
            quote_conninfo(&self.user),
            self.schema.replace('"', "\"\""),
            self.table.replace('"', "\"\""),
            self.geometry_column
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backend_infer() {
        assert_eq!(Backend::infer("/data/roads.shp"), Backend::Local);
        assert_eq!(
            Backend::infer("dbname='gis' host=localhost table=\"public\".\"roads\" (geom)"),
            Backend::Database
        );
        // Accepted heuristic limitation.
        assert_eq!(Backend::infer("/data/dbname_export.shp"), Backend::Database);
    }

    #[test]
    fn test_source_path_strips_layer_options() {
        let layer = Layer::new(
            LayerId::new("roads"),
            "roads",
            "/data/roads.shp|layername=roads",
            LayerKind::Vector { spatial: true },
            "ogr",
        );
        assert_eq!(layer.source_path(), "/data/roads.shp");
        assert!(layer.is_local());
        assert!(layer.is_spatial());
    }

    #[test]
    fn test_explicit_backend_overrides_inference() {
        let yaml = r#"
id: odd
name: odd
source: /data/dbname_export.shp
backend: local
kind: { type: vector }
"#;
        let layer: Layer = serde_yaml::from_str(yaml).unwrap();
        assert_eq!(layer.backend, Backend::Local);
        assert!(layer.is_spatial());
    }

    #[test]
    fn test_descriptor_round_trips_through_inference() {
        let uri = DataSourceUri {
            host: "localhost".into(),
            port: 5432,
            database: "gis".into(),
            user: "postgres".into(),
            schema: "public".into(),
            table: "my_roads".into(),
            geometry_column: "geom".into(),
        };
        let descriptor = uri.to_descriptor();
        assert_eq!(
            descriptor,
            "dbname='gis' host=localhost port=5432 user='postgres' table=\"public\".\"my_roads\" (geom)"
        );
        assert_eq!(Backend::infer(&descriptor), Backend::Database);
    }
}
