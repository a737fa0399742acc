//! In-memory stand-ins for the database, the import tool and the host's
//! message box.

use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use crate::error::{MigrateError, Result};
use crate::import::{BulkImporter, ImportRequest};
use crate::notify::Notifier;
use crate::style::{GeometryFamily, RegistryConnector, StyleRecord, StyleRegistry};

/// A registry row plus its repaired `type` column.
#[derive(Debug, Clone)]
pub struct FakeRow {
    pub record: StyleRecord,
    pub geometry_type: Option<&'static str>,
}

#[derive(Debug, Default)]
pub struct RegistryState {
    pub table_exists: bool,
    pub rows: Vec<FakeRow>,
    /// `geometry_columns` catalog: (schema, table) -> type.
    pub catalog: HashMap<(String, String), String>,
    pub repairs: usize,
}

/// Registry over shared in-memory state, one per `open`.
pub struct FakeRegistry {
    state: Arc<Mutex<RegistryState>>,
}

#[async_trait]
impl StyleRegistry for FakeRegistry {
    async fn style_table_exists(&mut self) -> Result<bool> {
        Ok(self.state.lock().unwrap().table_exists)
    }

    async fn remove_style(&mut self, style_name: &str) -> Result<u64> {
        let mut state = self.state.lock().unwrap();
        if !state.table_exists {
            return Ok(0);
        }
        let before = state.rows.len();
        state.rows.retain(|row| row.record.style_name != style_name);
        Ok((before - state.rows.len()) as u64)
    }

    async fn save_style(&mut self, record: &StyleRecord) -> Result<()> {
        let mut state = self.state.lock().unwrap();
        state.table_exists = true;
        if record.use_as_default {
            for row in state.rows.iter_mut() {
                if row.record.schema == record.schema && row.record.table == record.table {
                    row.record.use_as_default = false;
                }
            }
        }
        state.rows.push(FakeRow {
            record: record.clone(),
            geometry_type: None,
        });
        Ok(())
    }

    async fn repair_geometry_types(&mut self) -> Result<u64> {
        let mut state = self.state.lock().unwrap();
        state.repairs += 1;
        if !state.table_exists {
            return Ok(0);
        }
        let catalog = state.catalog.clone();
        for row in state.rows.iter_mut() {
            let key = (row.record.schema.clone(), row.record.table.clone());
            row.geometry_type = catalog
                .get(&key)
                .and_then(|t| GeometryFamily::from_catalog_type(t))
                .map(GeometryFamily::label);
        }
        Ok(state.rows.len() as u64)
    }

    fn backend_type(&self) -> &'static str {
        "fake"
    }
}

#[derive(Default)]
pub struct FakeConnector {
    pub state: Arc<Mutex<RegistryState>>,
    pub unreachable: bool,
    pub opened: Mutex<usize>,
}

impl FakeConnector {
    pub fn unreachable() -> Self {
        Self {
            unreachable: true,
            ..Self::default()
        }
    }

    pub fn rows(&self) -> Vec<FakeRow> {
        self.state.lock().unwrap().rows.clone()
    }

    /// Register a table in the geometry catalog, as a completed import would.
    pub fn add_catalog_entry(&self, schema: &str, table: &str, geometry_type: &str) {
        self.state
            .lock()
            .unwrap()
            .catalog
            .insert((schema.into(), table.into()), geometry_type.into());
    }
}

#[async_trait]
impl RegistryConnector for FakeConnector {
    async fn open(&self) -> Result<Box<dyn StyleRegistry>> {
        if self.unreachable {
            return Err(MigrateError::connection("connection refused", "fake:5432/gis"));
        }
        *self.opened.lock().unwrap() += 1;
        Ok(Box::new(FakeRegistry {
            state: Arc::clone(&self.state),
        }))
    }
}

/// Records every request; optionally fails for one layer.
#[derive(Default)]
pub struct FakeImporter {
    pub requests: Mutex<Vec<ImportRequest>>,
    pub fail_on: Option<String>,
}

impl FakeImporter {
    pub fn failing_on(layer: &str) -> Self {
        Self {
            fail_on: Some(layer.to_string()),
            ..Self::default()
        }
    }

    pub fn requests(&self) -> Vec<ImportRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl BulkImporter for FakeImporter {
    async fn import(&self, request: &ImportRequest) -> Result<()> {
        if self.fail_on.as_deref() == Some(request.layer.as_str()) {
            return Err(MigrateError::import(&request.layer, "Unable to open datasource"));
        }
        self.requests.lock().unwrap().push(request.clone());
        Ok(())
    }

    fn name(&self) -> &'static str {
        "fake"
    }
}

#[derive(Default)]
pub struct RecordingNotifier {
    pub messages: Mutex<Vec<(String, String)>>,
}

impl RecordingNotifier {
    pub fn messages(&self) -> Vec<(String, String)> {
        self.messages.lock().unwrap().clone()
    }
}

impl Notifier for RecordingNotifier {
    fn information(&self, title: &str, message: &str) {
        self.messages
            .lock()
            .unwrap()
            .push((title.to_string(), message.to_string()));
    }
}
