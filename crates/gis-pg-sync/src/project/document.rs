//! File-backed project: layers, layer tree and project variables in one YAML document.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::Path;
use tracing::debug;

use super::layer::{Layer, LayerId};
use super::tree::{GroupId, LayerTree, TreeNode};
use super::ProjectHost;
use crate::error::{MigrateError, Result};

/// A project held entirely in memory.
///
/// ```yaml
/// variables: { host: localhost, port: "5432", dbname: gis, user: postgres, password: secret }
/// layers:
///   - id: roads
///     name: My Roads
///     source: /data/roads.shp
///     provider: ogr
///     kind: { type: vector, spatial: true }
///     styles: { current: default, variants: { default: "<qgis/>" } }
/// tree:
///   children:
///     - layer: roads
/// ```
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProjectDocument {
    #[serde(default)]
    pub variables: BTreeMap<String, String>,
    #[serde(default)]
    pub layers: Vec<Layer>,
    #[serde(default)]
    pub tree: LayerTree,
}

impl ProjectDocument {
    /// Load a project from a YAML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Parse a project from YAML. Layers missing from the tree are appended to its root.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let mut doc: ProjectDocument = serde_yaml::from_str(yaml)?;
        let orphans: Vec<LayerId> = doc
            .layers
            .iter()
            .filter(|l| doc.tree.parent_group(&l.id).is_none())
            .map(|l| l.id.clone())
            .collect();
        for id in orphans {
            doc.tree.children.push(TreeNode::Layer(id));
        }
        Ok(doc)
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        std::fs::write(path, serde_yaml::to_string(self)?)?;
        Ok(())
    }

    pub fn with_variable(mut self, name: &str, value: &str) -> Self {
        self.variables.insert(name.to_string(), value.to_string());
        self
    }

    /// Append a layer to the document and to the root of the tree.
    pub fn with_layer(mut self, layer: Layer) -> Self {
        self.tree.children.push(TreeNode::Layer(layer.id.clone()));
        self.layers.push(layer);
        self
    }

    fn layer_mut(&mut self, id: &LayerId) -> Result<&mut Layer> {
        self.layers
            .iter_mut()
            .find(|l| &l.id == id)
            .ok_or_else(|| MigrateError::Host(format!("unknown layer '{}'", id)))
    }
}

impl ProjectHost for ProjectDocument {
    fn layers(&self) -> Vec<Layer> {
        self.layers.clone()
    }

    fn layer(&self, id: &LayerId) -> Option<&Layer> {
        self.layers.iter().find(|l| &l.id == id)
    }

    fn rename_layer(&mut self, id: &LayerId, name: &str) -> Result<()> {
        self.layer_mut(id)?.name = name.to_string();
        Ok(())
    }

    fn add_layer(&mut self, layer: Layer, add_to_tree: bool) -> Result<()> {
        if self.layer(&layer.id).is_some() {
            return Err(MigrateError::Host(format!(
                "layer '{}' is already in the project",
                layer.id
            )));
        }
        if add_to_tree {
            self.tree.children.push(TreeNode::Layer(layer.id.clone()));
        }
        debug!("Added layer {} ({})", layer.name, layer.id);
        self.layers.push(layer);
        Ok(())
    }

    fn remove_layer(&mut self, id: &LayerId) -> Result<()> {
        let before = self.layers.len();
        self.layers.retain(|l| &l.id != id);
        if self.layers.len() == before {
            return Err(MigrateError::Host(format!("unknown layer '{}'", id)));
        }
        self.tree.remove_layer(id);
        Ok(())
    }

    fn variable(&self, name: &str) -> Option<String> {
        self.variables.get(name).cloned()
    }

    fn parent_group(&self, layer: &LayerId) -> Option<GroupId> {
        self.tree.parent_group(layer)
    }

    fn find_group(&self, name: &str) -> Option<GroupId> {
        self.tree.find_group(name)
    }

    fn insert_group(&mut self, index: usize, name: &str) -> GroupId {
        self.tree.insert_group(index, name)
    }

    fn insert_layer_node(
        &mut self,
        group: &GroupId,
        index: Option<usize>,
        layer: &LayerId,
    ) -> Result<()> {
        if self.layer(layer).is_none() {
            return Err(MigrateError::Host(format!("unknown layer '{}'", layer)));
        }
        if !self.tree.insert_layer(group, index, layer) {
            return Err(MigrateError::Host(format!("unknown group '{}'", group)));
        }
        Ok(())
    }
}
