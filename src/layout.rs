//! The gallery room: pedestals, walls and the artifacts placed on them.

use glam::Vec3;
use hecs::Entity;

use crate::artifact::{ArtworkLibrary, factory, floor_tiles, wood_grain};
use crate::camera::Camera;
use crate::ecs::{EulerAngles, Visual};
use crate::mesh::{Shape, Transform};
use crate::registry::ClickRegistry;
use crate::scene::{Node, Prefab, SceneGraph};
use crate::ui::Color;

pub const PEDESTAL_HEIGHT: f32 = 1.0;
/// Height of an artifact's centre above the pedestal top.
pub const ARTIFACT_LIFT: f32 = 0.75;

/// Pedestal centres on the floor, in registry order. The back row is listed
/// first, left to right, then the front row.
pub const PEDESTALS: [Vec3; 6] = [
    Vec3::new(-3.0, 0.0, -4.0),
    Vec3::new(0.0, 0.0, -4.0),
    Vec3::new(3.0, 0.0, -4.0),
    Vec3::new(-3.0, 0.0, 1.0),
    Vec3::new(0.0, 0.0, 1.0),
    Vec3::new(3.0, 0.0, 1.0),
];

/// The populated room, ready to hand to the museum.
pub struct Gallery {
    pub scene: SceneGraph,
    pub registry: ClickRegistry,
    pub artwork: ArtworkLibrary,
    pub camera: Camera,
}

/// Camera overlooking both rows; high enough that the front row never hides the back row.
pub fn gallery_camera() -> Camera {
    Camera::new()
        .at(0.0, 5.0, 8.0)
        .looking_at(0.0, 1.0, -1.0)
        .with_fov(60.0)
}

/// Where the artifact on pedestal `index` is centred.
pub fn artifact_position(index: usize) -> Option<Vec3> {
    PEDESTALS
        .get(index)
        .map(|p| *p + Vec3::Y * (PEDESTAL_HEIGHT + ARTIFACT_LIFT))
}

pub fn build_gallery() -> Gallery {
    let mut scene = SceneGraph::new();
    let mut artwork = ArtworkLibrary::new();
    let mut registry = ClickRegistry::new();

    build_room(&mut scene, &mut artwork);

    let collection = [
        factory::protest_poster(&mut artwork).into_prefab(),
        factory::exclusion_act_paper(&mut artwork).into_prefab(),
        factory::lion_dance_mask(&mut artwork).into_prefab(),
        factory::vincent_chin_article(&mut artwork).into_prefab(),
        factory::railroad_figurines(&mut artwork).into_prefab(),
        factory::placeholder_block(),
    ];

    for (index, prefab) in collection.iter().enumerate() {
        let Some(position) = artifact_position(index) else {
            break;
        };
        let root = place(&mut scene, prefab, position);
        registry.register(root);
    }

    let unlabeled = registry.unlabeled(&scene).len();
    let dangling = registry.dangling(&scene);
    if !dangling.is_empty() {
        log::warn!("{} registered roots are not in the scene: {dangling:?}", dangling.len());
    }
    log::info!(
        "gallery ready: {} clickable objects ({} unlabeled), {} scene nodes, {} textures",
        registry.len(),
        unlabeled,
        scene.len(),
        artwork.len()
    );

    Gallery {
        scene,
        registry,
        artwork,
        camera: gallery_camera(),
    }
}

fn place(scene: &mut SceneGraph, prefab: &Prefab, position: Vec3) -> Entity {
    let root = scene.instantiate(prefab);
    if let Some(transform) = scene.transform_mut(root) {
        transform.position = position;
    }
    let angles = scene
        .transform(root)
        .map(|t| EulerAngles::from_quat(t.rotation))
        .unwrap_or_default();
    scene.set_angles(root, angles);
    root
}

/// Floor, walls and pedestals. None of it is clickable.
fn build_room(scene: &mut SceneGraph, artwork: &mut ArtworkLibrary) {
    let tiles = artwork.add("floor", floor_tiles(42));
    let wood = artwork.add("pedestal top", wood_grain(7));
    let wall = Color::hex(0x6e2f2a);
    let plinth = Color::hex(0xd8d2c4);

    scene.spawn(
        Node::new(Transform::new())
            .with_visual(Visual::with_texture(Shape::plane(30.0), Color::WHITE, tiles)),
    );
    for (position, size) in [
        (Vec3::new(0.0, 4.0, -8.0), Vec3::new(30.0, 8.0, 0.2)),
        (Vec3::new(-10.0, 4.0, 0.0), Vec3::new(0.2, 8.0, 30.0)),
        (Vec3::new(10.0, 4.0, 0.0), Vec3::new(0.2, 8.0, 30.0)),
    ] {
        scene.spawn(
            Node::new(Transform::from_position(position))
                .with_visual(Visual::new(Shape::cuboid(size.x, size.y, size.z), wall)),
        );
    }

    for base in PEDESTALS {
        let column = scene.spawn(
            Node::new(Transform::from_position(base + Vec3::Y * (PEDESTAL_HEIGHT * 0.5)))
                .with_visual(Visual::new(Shape::cuboid(0.9, PEDESTAL_HEIGHT, 0.9), plinth)),
        );
        let cap = scene.spawn(
            Node::new(Transform::from_position(Vec3::Y * (PEDESTAL_HEIGHT * 0.5 + 0.025)))
                .with_visual(Visual::with_texture(
                    Shape::cuboid(1.0, 0.05, 1.0),
                    Color::WHITE,
                    wood,
                )),
        );
        scene.attach(column, cap);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn registers_six_pedestals_in_order() {
        let gallery = build_gallery();
        assert_eq!(gallery.registry.len(), PEDESTALS.len());
        let titles: Vec<Option<String>> = gallery
            .registry
            .iter()
            .map(|root| {
                gallery
                    .scene
                    .find_metadata(root)
                    .and_then(|node| gallery.scene.metadata(node).map(|m| m.title.clone()))
            })
            .collect();
        assert_eq!(titles[1].as_deref(), Some(factory::EXCLUSION_ACT_TITLE));
        assert_eq!(titles[3].as_deref(), Some(factory::VINCENT_CHIN_TITLE));
        assert_eq!(titles[5], None);
    }

    #[test]
    fn artifacts_sit_on_their_pedestals() {
        let gallery = build_gallery();
        for (index, root) in gallery.registry.iter().enumerate() {
            let p = gallery.scene.world_matrix(root).transform_point3(Vec3::ZERO);
            assert_eq!(Some(p), artifact_position(index));
        }
    }

    #[test]
    fn every_registered_root_is_in_the_scene() {
        let gallery = build_gallery();
        assert!(gallery.registry.dangling(&gallery.scene).is_empty());
        assert_eq!(gallery.registry.unlabeled(&gallery.scene).len(), 1);
    }

    #[test]
    fn room_is_not_registered() {
        let gallery = build_gallery();
        let roots = gallery.scene.roots();
        assert!(roots.len() > gallery.registry.len());
        assert!(gallery.registry.iter().all(|r| roots.contains(&r)));
    }

    #[test]
    fn every_artifact_is_in_view() {
        let gallery = build_gallery();
        let mut camera = gallery.camera;
        camera.resize(1280, 720);
        for index in 0..PEDESTALS.len() {
            let p = camera
                .world_to_screen(artifact_position(index).unwrap(), 1280.0, 720.0)
                .unwrap();
            assert!((0.0..1280.0).contains(&p.x) && (0.0..720.0).contains(&p.y));
        }
    }
}
