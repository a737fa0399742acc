//! Host project abstraction.
//!
//! The synchronization core never owns the project: it reads and mutates it
//! through [`ProjectHost`]. A GIS host plugs in its own implementation;
//! [`ProjectDocument`] is a file-backed one used by the CLI and the tests.

mod document;
mod layer;
mod style;
mod tree;

pub use document::ProjectDocument;
pub use layer::{Backend, DataSourceUri, Layer, LayerId, LayerKind, DATABASE_MARKER};
pub use style::StyleManager;
pub use tree::{Group, GroupId, LayerTree, TreeNode};

use crate::error::Result;

/// Operations the synchronization core needs from the host project.
///
/// Mutations take effect immediately; there is no transaction over the
/// project state.
pub trait ProjectHost: Send {
    /// Snapshot of all layers, in project order.
    fn layers(&self) -> Vec<Layer>;

    fn layer(&self, id: &LayerId) -> Option<&Layer>;

    fn rename_layer(&mut self, id: &LayerId, name: &str) -> Result<()>;

    /// Register a layer. With `add_to_tree` the layer is also appended to the
    /// root of the layer tree; otherwise the caller places it.
    fn add_layer(&mut self, layer: Layer, add_to_tree: bool) -> Result<()>;

    /// Remove a layer and every tree node that references it.
    fn remove_layer(&mut self, id: &LayerId) -> Result<()>;

    /// Project-scoped variable.
    fn variable(&self, name: &str) -> Option<String>;

    fn parent_group(&self, layer: &LayerId) -> Option<GroupId>;

    /// Top-level group by name.
    fn find_group(&self, name: &str) -> Option<GroupId>;

    /// Insert a top-level group at `index`.
    fn insert_group(&mut self, index: usize, name: &str) -> GroupId;

    /// Insert a node for an already registered layer; `None` appends.
    fn insert_layer_node(
        &mut self,
        group: &GroupId,
        index: Option<usize>,
        layer: &LayerId,
    ) -> Result<()>;
}
