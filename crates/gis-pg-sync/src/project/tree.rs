//! Layer tree: the hierarchical legend of a project.

use serde::{Deserialize, Serialize};
use std::fmt;

use super::layer::LayerId;

const ROOT_GROUP_ID: &str = "root";

/// Stable group identifier. Survives insertions and removals of siblings.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GroupId(pub String);

impl GroupId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Id of the invisible root group.
    pub fn root() -> Self {
        Self(ROOT_GROUP_ID.to_string())
    }

    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    pub fn is_root(&self) -> bool {
        self.0 == ROOT_GROUP_ID
    }
}

impl fmt::Display for GroupId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TreeNode {
    Layer(LayerId),
    Group(Group),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Group {
    #[serde(default = "GroupId::generate")]
    pub id: GroupId,
    pub name: String,
    #[serde(default)]
    pub children: Vec<TreeNode>,
}

impl Group {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            id: GroupId::generate(),
            name: name.into(),
            children: Vec::new(),
        }
    }

    /// Ids of all layers below this group, depth-first.
    pub fn layer_ids(&self) -> Vec<&LayerId> {
        let mut out = Vec::new();
        collect_layers(&self.children, &mut out);
        out
    }
}

fn collect_layers<'a>(nodes: &'a [TreeNode], out: &mut Vec<&'a LayerId>) {
    for node in nodes {
        match node {
            TreeNode::Layer(id) => out.push(id),
            TreeNode::Group(group) => collect_layers(&group.children, out),
        }
    }
}

/// Children of the root group.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LayerTree {
    #[serde(default)]
    pub children: Vec<TreeNode>,
}

impl LayerTree {
    /// Group that directly contains the layer's node.
    pub fn parent_group(&self, layer: &LayerId) -> Option<GroupId> {
        fn walk(nodes: &[TreeNode], owner: &GroupId, layer: &LayerId) -> Option<GroupId> {
            for node in nodes {
                match node {
                    TreeNode::Layer(id) if id == layer => return Some(owner.clone()),
                    TreeNode::Layer(_) => {}
                    TreeNode::Group(group) => {
                        if let Some(found) = walk(&group.children, &group.id, layer) {
                            return Some(found);
                        }
                    }
                }
            }
            None
        }
        walk(&self.children, &GroupId::root(), layer)
    }

    /// Top-level group with the given name.
    pub fn find_group(&self, name: &str) -> Option<GroupId> {
        self.children.iter().find_map(|node| match node {
            TreeNode::Group(group) if group.name == name => Some(group.id.clone()),
            _ => None,
        })
    }

    /// Insert a new top-level group. `index` is clamped to the child count.
    pub fn insert_group(&mut self, index: usize, name: &str) -> GroupId {
        let group = Group::new(name);
        let id = group.id.clone();
        let index = index.min(self.children.len());
        self.children.insert(index, TreeNode::Group(group));
        id
    }

    /// Insert a layer node into a group; `None` appends. Returns false for unknown groups.
    pub fn insert_layer(&mut self, group: &GroupId, index: Option<usize>, layer: &LayerId) -> bool {
        let Some(children) = self.children_mut(group) else {
            return false;
        };
        let node = TreeNode::Layer(layer.clone());
        match index {
            Some(i) if i < children.len() => children.insert(i, node),
            _ => children.push(node),
        }
        true
    }

    /// Remove every node referencing the layer. Returns the number removed.
    pub fn remove_layer(&mut self, layer: &LayerId) -> usize {
        fn prune(nodes: &mut Vec<TreeNode>, layer: &LayerId) -> usize {
            let before = nodes.len();
            nodes.retain(|node| !matches!(node, TreeNode::Layer(id) if id == layer));
            let mut removed = before - nodes.len();
            for node in nodes.iter_mut() {
                if let TreeNode::Group(group) = node {
                    removed += prune(&mut group.children, layer);
                }
            }
            removed
        }
        prune(&mut self.children, layer)
    }

    pub fn group(&self, id: &GroupId) -> Option<&Group> {
        fn walk<'a>(nodes: &'a [TreeNode], id: &GroupId) -> Option<&'a Group> {
            for node in nodes {
                if let TreeNode::Group(group) = node {
                    if &group.id == id {
                        return Some(group);
                    }
                    if let Some(found) = walk(&group.children, id) {
                        return Some(found);
                    }
                }
            }
            None
        }
        walk(&self.children, id)
    }

    fn children_mut(&mut self, id: &GroupId) -> Option<&mut Vec<TreeNode>> {
        fn walk<'a>(nodes: &'a mut Vec<TreeNode>, id: &GroupId) -> Option<&'a mut Vec<TreeNode>> {
            for node in nodes.iter_mut() {
                if let TreeNode::Group(group) = node {
                    if &group.id == id {
                        return Some(&mut group.children);
                    }
                    if let Some(found) = walk(&mut group.children, id) {
                        return Some(found);
                    }
                }
            }
            None
        }
        if id.is_root() {
            return Some(&mut self.children);
        }
        walk(&mut self.children, id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample_tree() -> (LayerTree, GroupId) {
        let mut basemap = Group::new("Basemap");
        basemap.children.push(TreeNode::Layer(LayerId::new("roads")));
        let basemap_id = basemap.id.clone();
        let tree = LayerTree {
            children: vec![
                TreeNode::Layer(LayerId::new("dem")),
                TreeNode::Group(basemap),
            ],
        };
        (tree, basemap_id)
    }

    #[test]
    fn test_parent_group() {
        let (tree, basemap) = sample_tree();
        assert_eq!(tree.parent_group(&LayerId::new("roads")), Some(basemap));
        assert_eq!(tree.parent_group(&LayerId::new("dem")), Some(GroupId::root()));
        assert_eq!(tree.parent_group(&LayerId::new("missing")), None);
    }

    #[test]
    fn test_group_ids_survive_sibling_removal() {
        let (mut tree, basemap) = sample_tree();
        assert_eq!(tree.remove_layer(&LayerId::new("dem")), 1);
        assert!(tree.insert_layer(&basemap, None, &LayerId::new("roads_pg")));
        let group = tree.group(&basemap).unwrap();
        assert_eq!(
            group.layer_ids(),
            vec![&LayerId::new("roads"), &LayerId::new("roads_pg")]
        );
    }

    #[test]
    fn test_insert_group_at_front() {
        let (mut tree, _) = sample_tree();
        let id = tree.insert_group(0, "Postgres-layers");
        assert_eq!(tree.find_group("Postgres-layers"), Some(id));
        assert!(matches!(&tree.children[0], TreeNode::Group(g) if g.name == "Postgres-layers"));
    }

    #[test]
    fn test_insert_into_unknown_group_fails() {
        let (mut tree, _) = sample_tree();
        assert!(!tree.insert_layer(&GroupId::new("nope"), None, &LayerId::new("x")));
    }
}
