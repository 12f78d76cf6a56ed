use glam::Mat4;
use hecs::{Entity, EntityBuilder, World};

use super::prefab::{Node, Prefab};
use crate::artifact::ArtifactMetadata;
use crate::ecs::{Children, EulerAngles, Parent, Visual};
use crate::mesh::Transform;
use crate::picking::Collider;

/// A hierarchy of scene nodes stored in its own ECS world.
///
/// Every node has a local [`Transform`]. Parent links are kept on both sides
/// ([`Parent`] on the child, [`Children`] on the parent) so the graph can be
/// walked downwards for rendering and picking and upwards for metadata lookup.
/// [`SceneGraph::attach`] refuses links that would create a cycle, so every
/// upward walk terminates at a root.
///
/// # Example
///
/// ```
/// use vitrine::{ArtifactMetadata, Node, SceneGraph, Transform, Vec3};
///
/// let mut scene = SceneGraph::new();
/// let root = scene.spawn(
///     Node::new(Transform::from_position(Vec3::new(0.0, 1.0, 0.0)))
///         .with_metadata(ArtifactMetadata::new("Lion Mask", "Carved wood.", false, "#c0392b")),
/// );
/// let ear = scene.spawn(Node::new(Transform::from_position(Vec3::X)));
/// assert!(scene.attach(root, ear));
///
/// // Clicking the ear finds the labeled root above it
/// assert_eq!(scene.metadata_ancestor(ear), Some(root));
/// let p = scene.world_matrix(ear).transform_point3(Vec3::ZERO);
/// assert_eq!(p, Vec3::new(1.0, 1.0, 0.0));
/// ```
#[derive(Default)]
pub struct SceneGraph {
    world: World,
}

impl SceneGraph {
    /// An empty scene with its own ECS world.
    pub fn new() -> Self {
        Self::default()
    }

    /// Read-only access to the underlying ECS world.
    pub fn world(&self) -> &World {
        &self.world
    }

    /// Spawn a parentless node.
    ///
    /// Nodes with a visual also get a [`Collider`] matching its shape.
    pub fn spawn(&mut self, node: Node) -> Entity {
        let mut builder = EntityBuilder::new();
        builder.add(node.transform);
        if let Some(visual) = node.visual {
            builder.add(visual.shape.collider());
            builder.add(visual);
        }
        if let Some(metadata) = node.metadata {
            builder.add(metadata);
        }
        self.world.spawn(builder.build())
    }

    /// Whether `entity` is a live node of this scene.
    pub fn contains(&self, entity: Entity) -> bool {
        self.world.contains(entity)
    }

    /// Number of live nodes.
    pub fn len(&self) -> usize {
        self.world.len() as usize
    }

    /// True when no nodes are alive.
    pub fn is_empty(&self) -> bool {
        self.world.len() == 0
    }

    /// Nodes without a parent.
    ///
    /// Order follows the ECS archetype layout and is not stable across
    /// spawns. Use a [`ClickRegistry`](crate::ClickRegistry) when order matters.
    pub fn roots(&self) -> Vec<Entity> {
        self.world
            .query::<()>()
            .with::<&Transform>()
            .without::<&Parent>()
            .iter()
            .map(|(entity, ())| entity)
            .collect()
    }

    /// Hang `child` beneath `parent`, detaching it from any previous parent.
    ///
    /// Returns `false` and changes nothing if either node is missing or the
    /// link would make a node its own ancestor.
    pub fn attach(&mut self, parent: Entity, child: Entity) -> bool {
        if parent == child || !self.contains(parent) || !self.contains(child) {
            return false;
        }
        if self.ancestors(parent).contains(&child) {
            return false;
        }

        self.detach(child);
        if self.world.insert_one(child, Parent(parent)).is_err() {
            return false;
        }
        if let Ok(children) = self.world.query_one_mut::<&mut Children>(parent) {
            children.0.push(child);
        } else {
            let _ = self.world.insert_one(parent, Children(vec![child]));
        }
        true
    }

    /// Make `child` a root again. No-op for nodes that are already roots.
    pub fn detach(&mut self, child: Entity) {
        let Ok(Parent(parent)) = self.world.remove_one::<Parent>(child) else {
            return;
        };
        if let Ok(children) = self.world.query_one_mut::<&mut Children>(parent) {
            children.0.retain(|&c| c != child);
        }
    }

    /// Direct parent of `entity`, or `None` for roots and missing nodes.
    pub fn parent(&self, entity: Entity) -> Option<Entity> {
        self.world.get::<&Parent>(entity).ok().map(|p| p.0)
    }

    /// Direct children of `entity` in attach order.
    pub fn children(&self, entity: Entity) -> Vec<Entity> {
        self.world
            .get::<&Children>(entity)
            .map(|c| c.0.clone())
            .unwrap_or_default()
    }

    /// Parent chain of `entity`, nearest first, excluding `entity` itself.
    pub fn ancestors(&self, entity: Entity) -> Vec<Entity> {
        let mut chain = Vec::new();
        let mut current = self.parent(entity);
        while let Some(node) = current {
            chain.push(node);
            current = self.parent(node);
        }
        chain
    }

    /// `root` and everything beneath it in pre-order. Empty if `root` is gone.
    pub fn descendants(&self, root: Entity) -> Vec<Entity> {
        if !self.contains(root) {
            return Vec::new();
        }
        let mut out = Vec::new();
        let mut stack = vec![root];
        while let Some(node) = stack.pop() {
            out.push(node);
            // Reversed so the first child is visited first.
            stack.extend(self.children(node).into_iter().rev());
        }
        out
    }

    /// Local transform of `entity`, relative to its parent.
    pub fn transform(&self, entity: Entity) -> Option<Transform> {
        self.world.get::<&Transform>(entity).ok().map(|t| *t)
    }

    /// Mutable local transform.
    ///
    /// Writing the rotation here bypasses any stored [`EulerAngles`]; the next
    /// [`SceneGraph::set_angles`] call overwrites it.
    pub fn transform_mut(&mut self, entity: Entity) -> Option<&mut Transform> {
        self.world.query_one_mut::<&mut Transform>(entity).ok()
    }

    /// What `entity` draws, if anything. Group nodes have no visual.
    pub fn visual(&self, entity: Entity) -> Option<Visual> {
        self.world.get::<&Visual>(entity).ok().map(|v| *v)
    }

    /// Local-space pick volume. Present exactly when the node has a visual.
    pub fn collider(&self, entity: Entity) -> Option<Collider> {
        self.world.get::<&Collider>(entity).ok().map(|c| *c)
    }

    /// Artifact metadata stored directly on `entity`.
    ///
    /// This does not search the hierarchy; see [`SceneGraph::find_metadata`]
    /// and [`SceneGraph::metadata_ancestor`] for that.
    pub fn metadata(&self, entity: Entity) -> Option<hecs::Ref<'_, ArtifactMetadata>> {
        self.world.get::<&ArtifactMetadata>(entity).ok()
    }

    /// Whether `entity` itself carries artifact metadata.
    pub fn has_metadata(&self, entity: Entity) -> bool {
        self.world.satisfies::<&ArtifactMetadata>(entity).unwrap_or(false)
    }

    /// The first metadata-bearing node of the subtree at `root`, in pre-order.
    ///
    /// `root` itself is checked before any traversal, which is where artifacts
    /// normally keep their metadata.
    pub fn find_metadata(&self, root: Entity) -> Option<Entity> {
        if self.has_metadata(root) {
            return Some(root);
        }
        self.descendants(root)
            .into_iter()
            .find(|&node| self.has_metadata(node))
    }

    /// Walk up from `entity` (inclusive) to the nearest node with metadata.
    ///
    /// Returns `None` when `entity` is missing or no node up to its root is
    /// labeled. The walk always ends because [`SceneGraph::attach`] rejects
    /// cycles.
    pub fn metadata_ancestor(&self, entity: Entity) -> Option<Entity> {
        if !self.contains(entity) {
            return None;
        }
        std::iter::once(entity)
            .chain(self.ancestors(entity))
            .find(|&node| self.has_metadata(node))
    }

    /// Spin angles of a node, if it has been given any.
    pub fn angles(&self, entity: Entity) -> Option<EulerAngles> {
        self.world.get::<&EulerAngles>(entity).ok().map(|a| *a)
    }

    /// Store spin angles and write the matching rotation into the transform.
    ///
    /// Does nothing if `entity` has no transform.
    pub fn set_angles(&mut self, entity: Entity, angles: EulerAngles) {
        if let Ok(transform) = self.world.query_one_mut::<&mut Transform>(entity) {
            transform.rotation = angles.to_quat();
        } else {
            return;
        }
        let _ = self.world.insert_one(entity, angles);
    }

    /// Composed model matrix from the root down to `entity`.
    ///
    /// Missing nodes yield the identity matrix.
    pub fn world_matrix(&self, entity: Entity) -> Mat4 {
        let mut matrix = self
            .transform(entity)
            .map(|t| t.matrix())
            .unwrap_or(Mat4::IDENTITY);
        for ancestor in self.ancestors(entity) {
            if let Some(t) = self.transform(ancestor) {
                matrix = t.matrix() * matrix;
            }
        }
        matrix
    }

    /// Every visible node with its world matrix.
    ///
    /// Nodes come back in ECS iteration order, which is fine for a depth-tested
    /// pass.
    pub fn drawables(&self) -> Vec<(Mat4, Visual)> {
        let visible: Vec<(Entity, Visual)> = self
            .world
            .query::<&Visual>()
            .iter()
            .map(|(entity, visual)| (entity, *visual))
            .collect();
        visible
            .into_iter()
            .map(|(entity, visual)| (self.world_matrix(entity), visual))
            .collect()
    }

    /// Snapshot the subtree at `root` into a detached [`Prefab`].
    ///
    /// The snapshot owns copies of every transform, visual and metadata, so it
    /// stays valid after the source scene changes. Returns `None` if `root`
    /// is missing.
    pub fn extract(&self, root: Entity) -> Option<Prefab> {
        let node = Node {
            transform: self.transform(root)?,
            visual: self.visual(root),
            metadata: self.metadata(root).map(|m| ArtifactMetadata::clone(&m)),
        };
        let children = self
            .children(root)
            .into_iter()
            .filter_map(|child| self.extract(child))
            .collect();
        Some(Prefab { node, children })
    }

    /// Spawn a fresh copy of `prefab` as a new root and return it.
    ///
    /// Each call creates new entities; instantiating the same prefab twice
    /// gives two independent subtrees.
    pub fn instantiate(&mut self, prefab: &Prefab) -> Entity {
        let root = self.spawn(prefab.node.clone());
        for child in &prefab.children {
            let spawned = self.instantiate(child);
            self.attach(root, spawned);
        }
        root
    }

    /// Remove `root` and its whole subtree. Returns the number of nodes removed.
    ///
    /// `root` is unlinked from its parent first, so the parent's child list
    /// stays accurate. Calling this on a missing node returns 0.
    pub fn despawn_recursive(&mut self, root: Entity) -> usize {
        let doomed = self.descendants(root);
        self.detach(root);
        let mut removed = 0;
        for entity in doomed {
            if self.world.despawn(entity).is_ok() {
                removed += 1;
            }
        }
        removed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mesh::Shape;
    use crate::ui::Color;
    use glam::{Quat, Vec3};

    fn metadata(title: &str) -> ArtifactMetadata {
        ArtifactMetadata::new(title, "text", false, "#ffffff")
    }

    fn leaf() -> Node {
        Node::new(Transform::new()).with_visual(Visual::new(Shape::sphere(0.5), Color::WHITE))
    }

    #[test]
    fn attach_links_both_sides() {
        let mut graph = SceneGraph::new();
        let a = graph.spawn(Node::default());
        let b = graph.spawn(Node::default());
        assert!(graph.attach(a, b));
        assert_eq!(graph.parent(b), Some(a));
        assert_eq!(graph.children(a), vec![b]);
        assert_eq!(graph.roots(), vec![a]);
    }

    #[test]
    fn attach_rejects_cycles() {
        let mut graph = SceneGraph::new();
        let a = graph.spawn(Node::default());
        let b = graph.spawn(Node::default());
        let c = graph.spawn(Node::default());
        assert!(graph.attach(a, b));
        assert!(graph.attach(b, c));
        assert!(!graph.attach(c, a));
        assert!(!graph.attach(a, a));
        assert_eq!(graph.parent(a), None);
    }

    #[test]
    fn reattach_moves_child() {
        let mut graph = SceneGraph::new();
        let a = graph.spawn(Node::default());
        let b = graph.spawn(Node::default());
        let c = graph.spawn(Node::default());
        graph.attach(a, c);
        graph.attach(b, c);
        assert!(graph.children(a).is_empty());
        assert_eq!(graph.children(b), vec![c]);
    }

    #[test]
    fn descendants_are_pre_order() {
        let mut graph = SceneGraph::new();
        let root = graph.spawn(Node::default());
        let first = graph.spawn(Node::default());
        let nested = graph.spawn(Node::default());
        let second = graph.spawn(Node::default());
        graph.attach(root, first);
        graph.attach(first, nested);
        graph.attach(root, second);
        assert_eq!(graph.descendants(root), vec![root, first, nested, second]);
    }

    #[test]
    fn world_matrix_composes_parents() {
        let mut graph = SceneGraph::new();
        let parent = graph.spawn(Node::new(
            Transform::from_position(Vec3::new(0.0, 2.0, 0.0))
                .rotation(Quat::from_rotation_y(std::f32::consts::FRAC_PI_2)),
        ));
        let child = graph.spawn(Node::new(Transform::from_position(Vec3::X)));
        graph.attach(parent, child);
        let p = graph.world_matrix(child).transform_point3(Vec3::ZERO);
        assert!((p - Vec3::new(0.0, 2.0, -1.0)).length() < 1e-5);
    }

    #[test]
    fn metadata_ancestor_walks_up() {
        let mut graph = SceneGraph::new();
        let root = graph.spawn(Node::default().with_metadata(metadata("Mask")));
        let mid = graph.spawn(Node::default());
        let tip = graph.spawn(leaf());
        graph.attach(root, mid);
        graph.attach(mid, tip);
        assert_eq!(graph.metadata_ancestor(tip), Some(root));
        assert_eq!(graph.metadata_ancestor(root), Some(root));
        assert_eq!(graph.find_metadata(root), Some(root));
    }

    #[test]
    fn metadata_ancestor_none_for_unlabeled() {
        let mut graph = SceneGraph::new();
        let root = graph.spawn(Node::default());
        let tip = graph.spawn(leaf());
        graph.attach(root, tip);
        assert_eq!(graph.metadata_ancestor(tip), None);
        assert_eq!(graph.find_metadata(root), None);
    }

    #[test]
    fn find_metadata_searches_below_an_unlabeled_root() {
        let mut graph = SceneGraph::new();
        let root = graph.spawn(Node::default());
        let first = graph.spawn(Node::default());
        let deep = graph.spawn(Node::default().with_metadata(metadata("Deep")));
        let second = graph.spawn(Node::default().with_metadata(metadata("Second")));
        graph.attach(root, first);
        graph.attach(first, deep);
        graph.attach(root, second);
        assert_eq!(graph.find_metadata(root), Some(deep));

        let labeled = graph.spawn(Node::default().with_metadata(metadata("Root")));
        graph.attach(labeled, root);
        assert_eq!(graph.find_metadata(labeled), Some(labeled));
    }

    #[test]
    fn spawn_derives_collider_from_visual() {
        let mut graph = SceneGraph::new();
        let with = graph.spawn(leaf());
        let without = graph.spawn(Node::default());
        assert_eq!(graph.collider(with), Some(Collider::sphere(0.5)));
        assert_eq!(graph.collider(without), None);
    }

    #[test]
    fn extract_instantiate_is_independent() {
        let mut gallery = SceneGraph::new();
        let root = gallery.spawn(
            Node::new(Transform::from_position(Vec3::new(4.0, 1.0, 0.0)))
                .with_metadata(metadata("Group")),
        );
        for x in [-0.5, 0.5] {
            let part = gallery.spawn(leaf());
            gallery.transform_mut(part).unwrap().position.x = x;
            gallery.attach(root, part);
        }

        let prefab = gallery.extract(root).unwrap();
        assert_eq!(prefab.node_count(), 3);
        assert_eq!(prefab.metadata_count(), 1);

        let mut preview = SceneGraph::new();
        let copy = preview.instantiate(&prefab);
        assert_eq!(preview.len(), 3);
        assert_eq!(preview.descendants(copy).len(), 3);
        assert_eq!(preview.metadata(copy).unwrap().title, "Group");

        preview.transform_mut(copy).unwrap().position = Vec3::ZERO;
        let child = preview.children(copy)[0];
        preview.transform_mut(child).unwrap().scale = Vec3::splat(9.0);

        assert_eq!(gallery.transform(root).unwrap().position, Vec3::new(4.0, 1.0, 0.0));
        let original_child = gallery.children(root)[0];
        assert_eq!(gallery.transform(original_child).unwrap().scale, Vec3::ONE);
    }

    #[test]
    fn despawn_recursive_removes_subtree() {
        let mut graph = SceneGraph::new();
        let keep = graph.spawn(Node::default());
        let root = graph.spawn(Node::default());
        let child = graph.spawn(leaf());
        graph.attach(keep, root);
        graph.attach(root, child);
        assert_eq!(graph.despawn_recursive(root), 2);
        assert_eq!(graph.len(), 1);
        assert!(graph.children(keep).is_empty());
        assert_eq!(graph.despawn_recursive(root), 0);
    }

    #[test]
    fn set_angles_updates_rotation() {
        let mut graph = SceneGraph::new();
        let e = graph.spawn(Node::default());
        graph.set_angles(e, EulerAngles(Vec3::new(0.0, 1.0, 0.0)));
        let rotation = graph.transform(e).unwrap().rotation;
        assert!(rotation.abs_diff_eq(Quat::from_rotation_y(1.0), 1e-6));
        assert_eq!(graph.angles(e), Some(EulerAngles(Vec3::new(0.0, 1.0, 0.0))));
    }
}
