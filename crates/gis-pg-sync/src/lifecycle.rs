//! Project lifecycle entry points.
//!
//! A host calls [`Lifecycle::on_open`], [`Lifecycle::on_save`] and
//! [`Lifecycle::on_close`] from its project events. [`HookConfig`] decides
//! which of them run the synchronization; the rest do nothing.
//!
//! [`HookConfig`]: crate::config::HookConfig

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use tracing::{debug, info};

use crate::config::{Config, ConnectionConfig};
use crate::error::Result;
use crate::import::BulkImporter;
use crate::notify::Notifier;
use crate::orchestrator::{Orchestrator, RunReport};
use crate::project::ProjectHost;
use crate::style::RegistryConnector;

/// Host project event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LifecycleEvent {
    Open,
    Save,
    Close,
}

impl fmt::Display for LifecycleEvent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            LifecycleEvent::Open => "open",
            LifecycleEvent::Save => "save",
            LifecycleEvent::Close => "close",
        };
        f.write_str(name)
    }
}

pub struct Lifecycle {
    config: Config,
    connector: Option<Arc<dyn RegistryConnector>>,
    importer: Option<Arc<dyn BulkImporter>>,
    notifier: Option<Arc<dyn Notifier>>,
}

impl Lifecycle {
    pub fn new(config: Config) -> Self {
        Self {
            config,
            connector: None,
            importer: None,
            notifier: None,
        }
    }

    pub fn with_connector(mut self, connector: Arc<dyn RegistryConnector>) -> Self {
        self.connector = Some(connector);
        self
    }

    pub fn with_importer(mut self, importer: Arc<dyn BulkImporter>) -> Self {
        self.importer = Some(importer);
        self
    }

    pub fn with_notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = Some(notifier);
        self
    }

    pub async fn on_open(&self, project: &mut dyn ProjectHost) -> Result<Option<RunReport>> {
        self.dispatch(LifecycleEvent::Open, project).await
    }

    pub async fn on_save(&self, project: &mut dyn ProjectHost) -> Result<Option<RunReport>> {
        self.dispatch(LifecycleEvent::Save, project).await
    }

    pub async fn on_close(&self, project: &mut dyn ProjectHost) -> Result<Option<RunReport>> {
        self.dispatch(LifecycleEvent::Close, project).await
    }

    /// Run the synchronization if `event` is enabled. Returns `None` otherwise.
    pub async fn dispatch(
        &self,
        event: LifecycleEvent,
        project: &mut dyn ProjectHost,
    ) -> Result<Option<RunReport>> {
        if !self.config.hooks.triggers(event) {
            debug!("Project {} hook is disabled", event);
            return Ok(None);
        }

        info!("Project {} hook triggered", event);
        let orchestrator = self.orchestrator(&*project)?;
        orchestrator.run(project).await.map(Some)
    }

    /// Connection for a project. An explicit `connection` section wins over
    /// project variables.
    pub fn connection(&self, project: &dyn ProjectHost) -> Result<ConnectionConfig> {
        match &self.config.connection {
            Some(connection) => Ok(connection.clone()),
            None => ConnectionConfig::from_environment(project),
        }
    }

    pub fn orchestrator(&self, project: &dyn ProjectHost) -> Result<Orchestrator> {
        let connection = self.connection(project)?;
        let mut orchestrator = Orchestrator::new(connection, &self.config)?;
        if let Some(connector) = &self.connector {
            orchestrator = orchestrator.with_connector(Arc::clone(connector));
        }
        if let Some(importer) = &self.importer {
            orchestrator = orchestrator.with_importer(Arc::clone(importer));
        }
        if let Some(notifier) = &self.notifier {
            orchestrator = orchestrator.with_notifier(Arc::clone(notifier));
        }
        Ok(orchestrator)
    }
}
