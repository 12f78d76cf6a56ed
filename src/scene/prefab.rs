//! Plain-data scene nodes and subtree snapshots.

use crate::artifact::ArtifactMetadata;
use crate::ecs::Visual;
use crate::mesh::Transform;

/// Everything needed to spawn one scene node.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Node {
    pub transform: Transform,
    pub visual: Option<Visual>,
    pub metadata: Option<ArtifactMetadata>,
}

impl Node {
    pub fn new(transform: Transform) -> Self {
        Self {
            transform,
            ..Default::default()
        }
    }

    pub fn with_visual(mut self, visual: Visual) -> Self {
        self.visual = Some(visual);
        self
    }

    pub fn with_metadata(mut self, metadata: ArtifactMetadata) -> Self {
        self.metadata = Some(metadata);
        self
    }
}

/// A detached tree of nodes.
///
/// Prefabs own their data outright, so instantiating one twice yields two
/// unrelated subtrees. Textures are referenced by id and therefore shared.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Prefab {
    pub node: Node,
    pub children: Vec<Prefab>,
}

impl Prefab {
    pub fn new(node: Node) -> Self {
        Self {
            node,
            children: Vec::new(),
        }
    }

    /// A visual-free group node holding `children`.
    pub fn group(transform: Transform, children: Vec<Prefab>) -> Self {
        Self {
            node: Node::new(transform),
            children,
        }
    }

    pub fn with_child(mut self, child: Prefab) -> Self {
        self.children.push(child);
        self
    }

    /// Total number of nodes in the tree, root included.
    pub fn node_count(&self) -> usize {
        1 + self.children.iter().map(Prefab::node_count).sum::<usize>()
    }

    /// Number of nodes carrying artifact metadata.
    pub fn metadata_count(&self) -> usize {
        usize::from(self.node.metadata.is_some())
            + self
                .children
                .iter()
                .map(Prefab::metadata_count)
                .sum::<usize>()
    }

    /// Depth of the tree; a single node has depth 1.
    pub fn depth(&self) -> usize {
        1 + self.children.iter().map(Prefab::depth).max().unwrap_or(0)
    }
}
