//! Bulk import of local vector files into the database.

pub mod ogr2ogr;

pub use ogr2ogr::Ogr2OgrImporter;

use async_trait::async_trait;
use std::path::PathBuf;

use crate::config::ConnectionConfig;
use crate::error::Result;

/// One layer to load into a database table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportRequest {
    /// Layer name, for error reporting.
    pub layer: String,

    /// Input file (the descriptor up to the first `|`).
    pub input: PathBuf,

    /// Target table name. The importer launders it to lower case.
    pub table: String,

    /// Replace an existing table of the same name.
    pub overwrite: bool,

    pub connection: ConnectionConfig,
}

/// Loads a vector file into a table of the target schema.
///
/// Implementations must leave the table readable with the configured
/// geometry column once `import` returns `Ok`.
#[async_trait]
pub trait BulkImporter: Send + Sync {
    async fn import(&self, request: &ImportRequest) -> Result<()>;

    /// Importer name for logging.
    fn name(&self) -> &'static str;
}
