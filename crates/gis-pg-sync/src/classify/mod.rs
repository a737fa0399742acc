//! Partition project layers by kind and storage backend.

use crate::project::{Layer, LayerKind};

/// Disjoint buckets covering every input layer exactly once.
#[derive(Debug, Default)]
pub struct LayerPartition<'a> {
    /// Local vector layers with geometry: the ones that get migrated.
    pub vector_local: Vec<&'a Layer>,
    /// Database-backed vector layers, spatial or not.
    pub vector_db: Vec<&'a Layer>,
    pub raster_local: Vec<&'a Layer>,
    pub raster_db: Vec<&'a Layer>,
    /// Local vector layers without geometry; never migrated.
    pub local_tables: Vec<&'a Layer>,
}

impl<'a> LayerPartition<'a> {
    pub fn classify(layers: &'a [Layer]) -> Self {
        let mut partition = Self::default();
        for layer in layers {
            let bucket = match (layer.kind, layer.is_local()) {
                (LayerKind::Vector { spatial: true }, true) => &mut partition.vector_local,
                (LayerKind::Vector { spatial: false }, true) => &mut partition.local_tables,
                (LayerKind::Vector { .. }, false) => &mut partition.vector_db,
                (LayerKind::Raster, true) => &mut partition.raster_local,
                (LayerKind::Raster, false) => &mut partition.raster_db,
            };
            bucket.push(layer);
        }
        partition
    }

    /// Every non-database layer, migratable or not.
    pub fn local_layers(&self) -> impl Iterator<Item = &'a Layer> + '_ {
        self.vector_local
            .iter()
            .chain(&self.local_tables)
            .chain(&self.raster_local)
            .copied()
    }

    pub fn database_layers(&self) -> impl Iterator<Item = &'a Layer> + '_ {
        self.vector_db.iter().chain(&self.raster_db).copied()
    }

    pub fn len(&self) -> usize {
        self.vector_local.len()
            + self.vector_db.len()
            + self.raster_local.len()
            + self.raster_db.len()
            + self.local_tables.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
