//! Synchronization orchestrator - main workflow coordinator.

#[cfg(test)]
pub(crate) mod fakes;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, info};
use uuid::Uuid;

use crate::classify::LayerPartition;
use crate::config::{Config, ConnectionConfig, MigrationConfig, TreePlacement};
use crate::core::identifier::{normalize_layer_name, table_name_for, validate_identifier};
use crate::error::{MigrateError, Result};
use crate::import::{BulkImporter, ImportRequest, Ogr2OgrImporter};
use crate::notify::{LogNotifier, Notifier};
use crate::project::{
    Backend, DataSourceUri, GroupId, Layer, LayerId, LayerKind, ProjectHost,
};
use crate::style::{self, PgConnector, RegistryConnector, StyleRecord};

/// Title of the duplicate-name notification.
pub const DUPLICATE_TITLE: &str = "Warning!";

const DUPLICATE_MESSAGE: &str = "You have the non-unique layers in the project:\n";

/// Provider name of database-backed shadow layers.
pub const SHADOW_PROVIDER: &str = "postgres";

/// Synchronization orchestrator.
pub struct Orchestrator {
    migration: MigrationConfig,
    connection: ConnectionConfig,
    connector: Arc<dyn RegistryConnector>,
    importer: Arc<dyn BulkImporter>,
    notifier: Arc<dyn Notifier>,
}

/// Result of a synchronization run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunReport {
    /// Unique run identifier.
    pub run_id: String,

    /// Final status.
    pub status: String,

    /// Total duration in seconds.
    pub duration_seconds: f64,

    /// When the run started.
    pub started_at: DateTime<Utc>,

    /// When the run completed.
    pub completed_at: DateTime<Utc>,

    /// Layers renamed to identifier-safe names.
    pub layers_renamed: usize,

    /// Tables loaded by the bulk importer, schema-qualified.
    pub imported_tables: Vec<String>,

    /// Names of the database layers added to the project.
    pub shadow_layers: Vec<String>,

    /// Registry rows whose geometry type was rewritten.
    pub registry_rows_repaired: u64,

    /// Local layers removed from the project.
    pub layers_removed: usize,
}

impl RunReport {
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

/// A pending rename from a layer name to its identifier-safe form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Rename {
    pub id: LayerId,
    pub from: String,
    pub to: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlannedImport {
    pub layer: String,
    pub input: PathBuf,
    pub table: String,
}

/// What a run would do, computed without touching the project or the database.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SyncPlan {
    pub renames: Vec<Rename>,
    /// Non-empty means the run would abort.
    pub duplicates: Vec<String>,
    pub imports: Vec<PlannedImport>,
    /// Local layers that would leave the project.
    pub removals: Vec<String>,
    /// Placement of database layers, `None` when there are none.
    pub target_group: Option<String>,
}

impl SyncPlan {
    pub fn to_json(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}

impl Orchestrator {
    /// Create an orchestrator backed by PostgreSQL and `ogr2ogr`.
    ///
    /// No connection is made until [`run`](Self::run).
    pub fn new(connection: ConnectionConfig, config: &Config) -> Result<Self> {
        let connector = PgConnector::new(&connection, &config.migration.style_table)?;
        let importer = Ogr2OgrImporter::new(&config.import, &config.migration.geometry_column);
        Ok(Self {
            migration: config.migration.clone(),
            connection,
            connector: Arc::new(connector),
            importer: Arc::new(importer),
            notifier: Arc::new(LogNotifier),
        })
    }

    pub fn with_connector(mut self, connector: Arc<dyn RegistryConnector>) -> Self {
        self.connector = connector;
        self
    }

    pub fn with_importer(mut self, importer: Arc<dyn BulkImporter>) -> Self {
        self.importer = importer;
        self
    }

    pub fn with_notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = notifier;
        self
    }

    /// Migrate every local spatial vector layer of the project into the database.
    ///
    /// Nothing is changed when layer names collide, a table name is invalid,
    /// or the database cannot be reached. Later failures abort the run and leave completed steps in place;
    /// running again converges.
    pub async fn run(&self, project: &mut dyn ProjectHost) -> Result<RunReport> {
        let run_id = Uuid::new_v4().to_string();
        let started_at = Utc::now();
        let start = Instant::now();

        info!("Starting synchronization run: {}", run_id);

        // Phase 1: names
        info!("Phase 1: Validating layer names");
        let renames = planned_renames(&project.layers());
        let duplicates = find_duplicates(&project.layers());
        if !duplicates.is_empty() {
            self.notifier
                .information(DUPLICATE_TITLE, &duplicate_message(&duplicates));
            return Err(MigrateError::DuplicateNames(duplicates));
        }
        validate_table_names(&project.layers())?;

        let mut registry = self.connector.open().await?;
        debug!("Opened {} style registry", registry.backend_type());

        for rename in &renames {
            debug!("Renaming '{}' to '{}'", rename.from, rename.to);
            project.rename_layer(&rename.id, &rename.to)?;
        }

        let layers = project.layers();
        let partition = LayerPartition::classify(&layers);
        info!(
            "Found {} local vector layer(s), {} database vector layer(s), {} local raster(s)",
            partition.vector_local.len(),
            partition.vector_db.len(),
            partition.raster_local.len()
        );

        // Phase 2: bulk import
        info!(
            "Phase 2: Importing {} layer(s) with {}",
            partition.vector_local.len(),
            self.importer.name()
        );
        let mut imported_tables = Vec::with_capacity(partition.vector_local.len());
        for layer in &partition.vector_local {
            let request = self.import_request(layer);
            self.importer.import(&request).await?;
            let table = format!("{}.{}", self.connection.schema, table_name_for(&layer.name));
            info!("{}: imported into {}", layer.name, table);
            imported_tables.push(table);
        }

        // Phase 3: shadow layers and styles
        info!("Phase 3: Creating database layers");
        let mut shadows = Vec::with_capacity(partition.vector_local.len());
        for local in &partition.vector_local {
            let mut shadow = self.shadow_for(local)?;
            style::transplant(local, &mut shadow, &self.migration.style_prefix)?;
            shadows.push((shadow, project.parent_group(&local.id)));
        }

        // Phase 4: style registry
        info!("Phase 4: Saving {} style(s) to the database", shadows.len());
        for (shadow, _) in &shadows {
            let record = self.style_record(shadow)?;
            registry.remove_style(&record.style_name).await?;
            registry.save_style(&record).await?;
        }
        let registry_rows_repaired = registry.repair_geometry_types().await?;
        drop(registry);

        // Phase 5: project tree
        info!("Phase 5: Replacing local layers");
        let local_ids: Vec<LayerId> = partition.local_layers().map(|l| l.id.clone()).collect();
        for id in &local_ids {
            project.remove_layer(id)?;
        }
        let shadow_layers: Vec<String> = shadows.iter().map(|(s, _)| s.name.clone()).collect();
        self.rehome(project, shadows)?;

        let duration = start.elapsed();
        info!(
            "Synchronization complete: {} table(s) imported, {} local layer(s) removed in {:.1}s",
            imported_tables.len(),
            local_ids.len(),
            duration.as_secs_f64()
        );

        Ok(RunReport {
            run_id,
            status: "completed".to_string(),
            duration_seconds: duration.as_secs_f64(),
            started_at,
            completed_at: Utc::now(),
            layers_renamed: renames.len(),
            imported_tables,
            shadow_layers,
            registry_rows_repaired,
            layers_removed: local_ids.len(),
        })
    }

    /// Compute what [`run`](Self::run) would do.
    pub fn plan(&self, project: &dyn ProjectHost) -> Result<SyncPlan> {
        let mut layers = project.layers();
        let renames = planned_renames(&layers);
        let duplicates = find_duplicates(&layers);
        for layer in layers.iter_mut() {
            layer.name = normalize_layer_name(&layer.name);
        }

        let partition = LayerPartition::classify(&layers);
        let imports = partition
            .vector_local
            .iter()
            .map(|layer| -> Result<PlannedImport> {
                let table = table_name_for(&layer.name);
                validate_identifier(&table)?;
                Ok(PlannedImport {
                    layer: layer.name.clone(),
                    input: PathBuf::from(layer.source_path()),
                    table,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        let target_group = match (imports.is_empty(), self.migration.placement) {
            (true, _) => None,
            (false, TreePlacement::Group) => Some(self.migration.group_name.clone()),
            (false, TreePlacement::InPlace) => Some("(original groups)".to_string()),
        };

        Ok(SyncPlan {
            renames,
            duplicates,
            imports,
            removals: partition.local_layers().map(|l| l.name.clone()).collect(),
            target_group,
        })
    }

    /// Open a connection and rewrite the geometry type of every registry row.
    pub async fn repair_styles(&self) -> Result<u64> {
        let mut registry = self.connector.open().await?;
        registry.repair_geometry_types().await
    }

    fn import_request(&self, layer: &Layer) -> ImportRequest {
        ImportRequest {
            layer: layer.name.clone(),
            input: PathBuf::from(layer.source_path()),
            table: layer.name.clone(),
            overwrite: self.migration.overwrite,
            connection: self.connection.clone(),
        }
    }

    fn shadow_for(&self, local: &Layer) -> Result<Layer> {
        let table = table_name_for(&local.name);
        validate_identifier(&table)?;
        let uri = DataSourceUri {
            host: self.connection.host.clone(),
            port: self.connection.port,
            database: self.connection.database.clone(),
            user: self.connection.user.clone(),
            schema: self.connection.schema.clone(),
            table: table.clone(),
            geometry_column: self.migration.geometry_column.clone(),
        };
        let shadow = Layer::new(
            LayerId::generate(&table),
            local.name.clone(),
            uri.to_descriptor(),
            LayerKind::Vector { spatial: true },
            SHADOW_PROVIDER,
        )
        .with_backend(Backend::Database);
        debug!("{}: database layer {} -> {}", local.name, shadow.id, shadow.source);
        Ok(shadow)
    }

    fn style_record(&self, shadow: &Layer) -> Result<StyleRecord> {
        let (name, body) = shadow
            .styles
            .current_style()
            .zip(shadow.styles.current_body())
            .ok_or_else(|| MigrateError::style(&shadow.name, "layer has no active style"))?;
        Ok(StyleRecord {
            catalog: self.connection.database.clone(),
            schema: self.connection.schema.clone(),
            table: table_name_for(&shadow.name),
            geometry_column: self.migration.geometry_column.clone(),
            style_name: name.to_string(),
            body: body.to_string(),
            use_as_default: true,
            description: String::new(),
            owner: self.connection.user.clone(),
        })
    }

    fn rehome(
        &self,
        project: &mut dyn ProjectHost,
        shadows: Vec<(Layer, Option<GroupId>)>,
    ) -> Result<()> {
        if shadows.is_empty() {
            return Ok(());
        }

        let shared = match self.migration.placement {
            TreePlacement::Group => Some(
                project
                    .find_group(&self.migration.group_name)
                    .unwrap_or_else(|| project.insert_group(0, &self.migration.group_name)),
            ),
            TreePlacement::InPlace => None,
        };

        for (shadow, parent) in shadows {
            let group = shared
                .clone()
                .or(parent)
                .unwrap_or_else(GroupId::root);
            let id = shadow.id.clone();
            project.add_layer(shadow, false)?;
            project.insert_layer_node(&group, None, &id)?;
            debug!("Placed {} in group {}", id, group);
        }
        Ok(())
    }
}

/// Renames needed to make every layer name identifier-safe.
fn planned_renames(layers: &[Layer]) -> Vec<Rename> {
    layers
        .iter()
        .filter_map(|layer| {
            let to = normalize_layer_name(&layer.name);
            (to != layer.name).then(|| Rename {
                id: layer.id.clone(),
                from: layer.name.clone(),
                to,
            })
        })
        .collect()
}

/// Normalized names that collide, sorted. Layer names must be unique across
/// the project, and migratable layers must not share a table.
fn find_duplicates(layers: &[Layer]) -> Vec<String> {
    let mut counts: BTreeMap<String, usize> = BTreeMap::new();
    for layer in layers {
        *counts.entry(normalize_layer_name(&layer.name)).or_default() += 1;
    }
    let mut duplicates: BTreeSet<String> = counts
        .into_iter()
        .filter(|(_, n)| *n > 1)
        .map(|(name, _)| name)
        .collect();

    let mut tables: BTreeMap<String, BTreeSet<String>> = BTreeMap::new();
    for layer in LayerPartition::classify(layers).vector_local {
        let name = normalize_layer_name(&layer.name);
        tables.entry(table_name_for(&name)).or_default().insert(name);
    }
    for names in tables.into_values().filter(|names| names.len() > 1) {
        duplicates.extend(names);
    }

    duplicates.into_iter().collect()
}

/// Every migratable layer must map to a valid table name.
fn validate_table_names(layers: &[Layer]) -> Result<()> {
    for layer in LayerPartition::classify(layers).vector_local {
        validate_identifier(&table_name_for(&normalize_layer_name(&layer.name)))?;
    }
    Ok(())
}

fn duplicate_message(names: &[String]) -> String {
    format!("{}{}", DUPLICATE_MESSAGE, names.join("\n"))
}
