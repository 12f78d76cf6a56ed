use hecs::Entity;

use crate::scene::SceneGraph;

/// Ordered set of scene roots that respond to clicks.
///
/// Filled once while the gallery is laid out and only read afterwards. Order
/// matters: it is the pedestal order, and it breaks ties between equally
/// distant hits.
#[derive(Clone, Debug, Default)]
pub struct ClickRegistry {
    roots: Vec<Entity>,
}

impl ClickRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a root. Registering the same root twice is a no-op.
    pub fn register(&mut self, root: Entity) {
        if !self.roots.contains(&root) {
            self.roots.push(root);
        }
    }

    pub fn roots(&self) -> &[Entity] {
        &self.roots
    }

    pub fn get(&self, index: usize) -> Option<Entity> {
        self.roots.get(index).copied()
    }

    pub fn len(&self) -> usize {
        self.roots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.roots.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = Entity> + '_ {
        self.roots.iter().copied()
    }

    /// Registered roots whose subtree carries no artifact metadata.
    ///
    /// Clicks on these resolve to nothing.
    pub fn unlabeled(&self, graph: &SceneGraph) -> Vec<Entity> {
        self.iter()
            .filter(|&root| graph.find_metadata(root).is_none())
            .collect()
    }

    /// Registered roots that are no longer part of `graph`.
    pub fn dangling(&self, graph: &SceneGraph) -> Vec<Entity> {
        self.iter().filter(|&root| !graph.contains(root)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::artifact::ArtifactMetadata;
    use crate::scene::Node;

    #[test]
    fn keeps_registration_order() {
        let mut graph = SceneGraph::new();
        let a = graph.spawn(Node::default());
        let b = graph.spawn(Node::default());
        let mut registry = ClickRegistry::new();
        registry.register(b);
        registry.register(a);
        registry.register(b);
        assert_eq!(registry.roots(), &[b, a]);
        assert_eq!(registry.get(1), Some(a));
        assert_eq!(registry.get(2), None);
    }

    #[test]
    fn reports_unlabeled_and_dangling() {
        let mut graph = SceneGraph::new();
        let labeled = graph.spawn(
            Node::default().with_metadata(ArtifactMetadata::new("A", "", false, "#000000")),
        );
        let bare = graph.spawn(Node::default());
        let gone = graph.spawn(Node::default());
        let mut registry = ClickRegistry::new();
        for root in [labeled, bare, gone] {
            registry.register(root);
        }
        graph.despawn_recursive(gone);

        assert_eq!(registry.unlabeled(&graph), vec![bare, gone]);
        assert_eq!(registry.dangling(&graph), vec![gone]);
    }
}
