//! Ray picking against the scene graph.
//!
//! A click becomes a [`Ray`] through the camera, the ray is tested against every
//! node beneath each registered root, and the nearest hit wins. Composite
//! artifacts need no special handling: each child mesh carries its own
//! [`Collider`], and the hit node is mapped back to its artifact afterwards by
//! walking up the parent chain (see [`resolve_click`]).
//!
//! Colliders are defined in the node's local space. Instead of moving the
//! collider into the world, the ray is moved into the node: the inverse world
//! matrix is applied to the origin and the direction, and the direction is
//! deliberately left unnormalized so the hit parameter `t` stays a world-space
//! distance and hits from different nodes compare directly.

use glam::{Mat4, Vec2, Vec3, Vec4};
use hecs::Entity;

use crate::camera::Camera;
use crate::registry::ClickRegistry;
use crate::scene::SceneGraph;

/// A ray in 3D space, used for raycasting and picking.
#[derive(Clone, Copy, Debug)]
pub struct Ray {
    /// The starting point of the ray.
    pub origin: Vec3,
    /// The direction of the ray. Normalized unless produced by [`Ray::transformed`].
    pub direction: Vec3,
}

impl Ray {
    /// Create a new ray with the given origin and direction.
    ///
    /// The direction will be normalized automatically.
    pub fn new(origin: Vec3, direction: Vec3) -> Self {
        Self {
            origin,
            direction: direction.normalize_or_zero(),
        }
    }

    /// Convert pixel coordinates to normalized device coordinates.
    ///
    /// The top-left pixel maps to (-1, 1) and the bottom-right to (1, -1).
    pub fn ndc(screen_x: f32, screen_y: f32, screen_width: f32, screen_height: f32) -> Vec2 {
        Vec2::new(
            (screen_x / screen_width) * 2.0 - 1.0,
            -(screen_y / screen_height) * 2.0 + 1.0,
        )
    }

    /// Create a ray through a point in normalized device coordinates.
    pub fn from_ndc(ndc: Vec2, view_matrix: Mat4, projection_matrix: Mat4) -> Self {
        // Clip-space points on the near and far planes
        let near_clip = Vec4::new(ndc.x, ndc.y, 0.0, 1.0);
        let far_clip = Vec4::new(ndc.x, ndc.y, 1.0, 1.0);

        let inv_view_proj = (projection_matrix * view_matrix).inverse();

        let near_world = inv_view_proj * near_clip;
        let far_world = inv_view_proj * far_clip;

        // Perspective divide
        let near_point = near_world.truncate() / near_world.w;
        let far_point = far_world.truncate() / far_world.w;

        Self::new(near_point, far_point - near_point)
    }

    /// Create a picking ray from a pixel position on a surface of the given size.
    pub fn from_screen(
        screen_x: f32,
        screen_y: f32,
        screen_width: f32,
        screen_height: f32,
        camera: &Camera,
    ) -> Self {
        Self::from_ndc(
            Self::ndc(screen_x, screen_y, screen_width, screen_height),
            camera.view_matrix(),
            camera.projection_matrix(),
        )
    }

    /// Get a point along the ray at the given distance from the origin.
    #[inline]
    pub fn point_at(&self, t: f32) -> Vec3 {
        self.origin + self.direction * t
    }

    /// Map the ray through `matrix` without renormalizing the direction.
    pub fn transformed(&self, matrix: &Mat4) -> Self {
        Self {
            origin: matrix.transform_point3(self.origin),
            direction: matrix.transform_vector3(self.direction),
        }
    }

    /// Test intersection with an axis-aligned bounding box (AABB).
    ///
    /// Returns the ray parameter of the nearest intersection in front of the
    /// origin, or `None` if the ray misses the box.
    pub fn intersect_aabb(&self, min: Vec3, max: Vec3) -> Option<f32> {
        let mut t_min = f32::NEG_INFINITY;
        let mut t_max = f32::INFINITY;

        for i in 0..3 {
            let origin = self.origin[i];
            let dir = self.direction[i];

            if dir.abs() < f32::EPSILON {
                // Ray is parallel to this axis
                if origin < min[i] || origin > max[i] {
                    return None;
                }
            } else {
                let inv_dir = 1.0 / dir;
                let mut t1 = (min[i] - origin) * inv_dir;
                let mut t2 = (max[i] - origin) * inv_dir;

                if t1 > t2 {
                    std::mem::swap(&mut t1, &mut t2);
                }

                t_min = t_min.max(t1);
                t_max = t_max.min(t2);

                if t_min > t_max {
                    return None;
                }
            }
        }

        if t_min > 0.0 {
            Some(t_min)
        } else if t_max > 0.0 {
            Some(t_max)
        } else {
            None
        }
    }

    /// Test intersection with a sphere.
    pub fn intersect_sphere(&self, center: Vec3, radius: f32) -> Option<f32> {
        let oc = self.origin - center;
        let a = self.direction.dot(self.direction);
        if a <= f32::EPSILON {
            return None;
        }
        let b = 2.0 * oc.dot(self.direction);
        let c = oc.dot(oc) - radius * radius;
        let discriminant = b * b - 4.0 * a * c;

        if discriminant < 0.0 {
            return None;
        }

        let sqrt_disc = discriminant.sqrt();
        let t1 = (-b - sqrt_disc) / (2.0 * a);
        let t2 = (-b + sqrt_disc) / (2.0 * a);

        if t1 > 0.0 {
            Some(t1)
        } else if t2 > 0.0 {
            Some(t2)
        } else {
            None
        }
    }
}

/// A collision shape in a node's local space.
///
/// Derived from the node's [`Shape`](crate::Shape); rotation and non-uniform
/// scale come from the node's world matrix at test time.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Collider {
    /// Box centred on the node origin, defined by half-extents.
    Box { half_extents: Vec3 },
    /// Sphere centred on the node origin.
    Sphere { radius: f32 },
}

impl Collider {
    /// Create a box collider from full dimensions.
    pub fn box_collider(size: Vec3) -> Self {
        Self::Box {
            half_extents: size * 0.5,
        }
    }

    pub fn sphere(radius: f32) -> Self {
        Self::Sphere { radius }
    }

    /// Test a ray already expressed in this collider's local space.
    pub fn intersect_local(&self, ray: &Ray) -> Option<f32> {
        match *self {
            Collider::Box { half_extents } => ray.intersect_aabb(-half_extents, half_extents),
            Collider::Sphere { radius } => ray.intersect_sphere(Vec3::ZERO, radius),
        }
    }

    /// Test a world-space ray against this collider placed by `world_matrix`.
    ///
    /// Returns the world-space distance along `ray`, which must be normalized.
    pub fn intersect(&self, ray: &Ray, world_matrix: &Mat4) -> Option<f32> {
        if world_matrix.determinant().abs() < f32::EPSILON {
            return None;
        }
        let local = ray.transformed(&world_matrix.inverse());
        self.intersect_local(&local)
    }
}

/// Information about a ray-collider intersection.
#[derive(Clone, Copy, Debug)]
pub struct RayHit {
    /// The node whose collider was hit (a leaf for composite artifacts).
    pub entity: Entity,
    /// Distance from ray origin to the hit point.
    pub distance: f32,
    /// World-space position of the hit point.
    pub point: Vec3,
}

/// A click that landed on an artifact.
#[derive(Clone, Copy, Debug)]
pub struct ResolvedHit {
    /// The metadata-bearing node of the clicked artifact.
    pub artifact: Entity,
    /// The underlying collider hit.
    pub hit: RayHit,
}

/// Cast a ray through every node beneath `roots` and return the nearest hit.
///
/// Equal distances keep the earlier candidate, so ties go to the root listed
/// first.
pub fn raycast(graph: &SceneGraph, roots: &[Entity], ray: &Ray) -> Option<RayHit> {
    let mut nearest: Option<RayHit> = None;

    for &root in roots {
        for entity in graph.descendants(root) {
            let Some(collider) = graph.collider(entity) else {
                continue;
            };
            let world = graph.world_matrix(entity);
            let Some(distance) = collider.intersect(ray, &world) else {
                continue;
            };
            if nearest.is_none_or(|n| distance < n.distance) {
                nearest = Some(RayHit {
                    entity,
                    distance,
                    point: ray.point_at(distance),
                });
            }
        }
    }

    nearest
}

/// Resolve a click at pixel `(px, py)` to the artifact it landed on.
///
/// `None` covers both a miss and a hit on geometry with no metadata-bearing
/// ancestor. Neither is an error; callers simply do nothing.
pub fn resolve_click(
    graph: &SceneGraph,
    registry: &ClickRegistry,
    camera: &Camera,
    (px, py): (f32, f32),
    (width, height): (f32, f32),
) -> Option<ResolvedHit> {
    if width <= 0.0 || height <= 0.0 {
        return None;
    }
    let ray = Ray::from_screen(px, py, width, height, camera);
    let Some(hit) = raycast(graph, registry.roots(), &ray) else {
        log::debug!("click at ({px}, {py}) hit nothing");
        return None;
    };
    let Some(artifact) = graph.metadata_ancestor(hit.entity) else {
        log::debug!("click at ({px}, {py}) hit {:?} with no artifact metadata", hit.entity);
        return None;
    };
    Some(ResolvedHit { artifact, hit })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ecs::Visual;
    use crate::mesh::{Shape, Transform};
    use crate::scene::Node;
    use crate::ui::Color;
    use glam::Quat;

    fn cube_at(graph: &mut SceneGraph, position: Vec3) -> Entity {
        graph.spawn(
            Node::new(Transform::from_position(position))
                .with_visual(Visual::new(Shape::cuboid(1.0, 1.0, 1.0), Color::WHITE)),
        )
    }

    #[test]
    fn ndc_corners() {
        assert_eq!(Ray::ndc(0.0, 0.0, 800.0, 600.0), Vec2::new(-1.0, 1.0));
        assert_eq!(Ray::ndc(800.0, 600.0, 800.0, 600.0), Vec2::new(1.0, -1.0));
        assert_eq!(Ray::ndc(400.0, 300.0, 800.0, 600.0), Vec2::ZERO);
    }

    #[test]
    fn centre_ray_points_at_target() {
        let camera = Camera::new().at(0.0, 0.0, 5.0).looking_at(0.0, 0.0, 0.0);
        let ray = Ray::from_screen(400.0, 400.0, 800.0, 800.0, &camera);
        assert!((ray.direction - Vec3::NEG_Z).length() < 1e-4);

        let wide = Ray::from_screen(400.0, 300.0, 800.0, 600.0, &camera);
        assert!((wide.direction - Vec3::NEG_Z).length() < 1e-4);

        let above = Ray::from_screen(400.0, 300.0, 800.0, 800.0, &camera);
        assert!(above.direction.y > 0.0);
    }

    #[test]
    fn aabb_hit_distance() {
        let ray = Ray::new(Vec3::new(0.0, 0.0, 5.0), Vec3::NEG_Z);
        let t = ray.intersect_aabb(Vec3::splat(-0.5), Vec3::splat(0.5)).unwrap();
        assert!((t - 4.5).abs() < 1e-5);
        assert!(ray.intersect_aabb(Vec3::new(2.0, 2.0, -1.0), Vec3::new(3.0, 3.0, 1.0)).is_none());
    }

    #[test]
    fn sphere_hit_distance() {
        let ray = Ray::new(Vec3::new(0.0, 0.0, 5.0), Vec3::NEG_Z);
        let t = ray.intersect_sphere(Vec3::ZERO, 1.0).unwrap();
        assert!((t - 4.0).abs() < 1e-5);
    }

    #[test]
    fn scaled_and_rotated_collider_keeps_world_distance() {
        let ray = Ray::new(Vec3::new(0.0, 0.0, 10.0), Vec3::NEG_Z);
        let world = Transform::new()
            .rotation(Quat::from_rotation_y(std::f32::consts::FRAC_PI_2))
            .scale(Vec3::new(4.0, 1.0, 1.0))
            .matrix();
        // Scaled along local X, which the rotation turns onto world Z.
        let t = Collider::box_collider(Vec3::ONE).intersect(&ray, &world).unwrap();
        assert!((t - 8.0).abs() < 1e-4);
    }

    #[test]
    fn nearest_hit_wins() {
        let mut graph = SceneGraph::new();
        let far = cube_at(&mut graph, Vec3::new(0.0, 0.0, -5.0));
        let near = cube_at(&mut graph, Vec3::new(0.0, 0.0, 0.0));
        let ray = Ray::new(Vec3::new(0.0, 0.0, 5.0), Vec3::NEG_Z);
        let hit = raycast(&graph, &[far, near], &ray).unwrap();
        assert_eq!(hit.entity, near);
    }

    #[test]
    fn ties_go_to_first_root() {
        let mut graph = SceneGraph::new();
        let a = cube_at(&mut graph, Vec3::ZERO);
        let b = cube_at(&mut graph, Vec3::ZERO);
        let ray = Ray::new(Vec3::new(0.0, 0.0, 5.0), Vec3::NEG_Z);
        assert_eq!(raycast(&graph, &[a, b], &ray).unwrap().entity, a);
        assert_eq!(raycast(&graph, &[b, a], &ray).unwrap().entity, b);
    }

    #[test]
    fn children_are_tested_individually() {
        let mut graph = SceneGraph::new();
        let group = graph.spawn(Node::new(Transform::from_position(Vec3::new(3.0, 0.0, 0.0))));
        let child = cube_at(&mut graph, Vec3::new(0.0, 1.0, 0.0));
        graph.attach(group, child);

        let through_child = Ray::new(Vec3::new(3.0, 1.0, 5.0), Vec3::NEG_Z);
        assert_eq!(raycast(&graph, &[group], &through_child).unwrap().entity, child);

        // The group itself has no collider.
        let through_group = Ray::new(Vec3::new(3.0, -1.0, 5.0), Vec3::NEG_Z);
        assert!(raycast(&graph, &[group], &through_group).is_none());
    }

    #[test]
    fn unregistered_geometry_is_ignored() {
        let mut graph = SceneGraph::new();
        let registered = cube_at(&mut graph, Vec3::new(0.0, 0.0, -5.0));
        let _wall = cube_at(&mut graph, Vec3::ZERO);
        let ray = Ray::new(Vec3::new(0.0, 0.0, 5.0), Vec3::NEG_Z);
        assert_eq!(raycast(&graph, &[registered], &ray).unwrap().entity, registered);
    }
}
