//! ECS components carried by scene nodes.
//!
//! A scene node is a `hecs` entity with a [`Transform`](crate::Transform) and
//! any of the components below. Hierarchy is expressed with [`Parent`] and
//! [`Children`]; both are maintained by [`SceneGraph`](crate::SceneGraph) and
//! should not be inserted by hand.

use glam::{EulerRot, Quat, Vec3};
use hecs::Entity;

use crate::mesh::Shape;
use crate::ui::Color;

/// Type-safe handle to a procedurally generated texture.
///
/// Handed out by [`ArtworkLibrary`](crate::artifact::ArtworkLibrary) and resolved
/// to a GPU texture by the renderer.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct TextureId(pub(crate) usize);

impl TextureId {
    pub fn index(self) -> usize {
        self.0
    }
}

/// Drawable surface of a node: a procedural shape with a colour tint and an
/// optional texture.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Visual {
    pub shape: Shape,
    pub color: Color,
    pub texture: Option<TextureId>,
}

impl Visual {
    pub fn new(shape: Shape, color: Color) -> Self {
        Self {
            shape,
            color,
            texture: None,
        }
    }

    pub fn with_texture(shape: Shape, color: Color, texture: TextureId) -> Self {
        Self {
            shape,
            color,
            texture: Some(texture),
        }
    }
}

/// The node this entity hangs from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Parent(pub Entity);

/// Direct children, in insertion order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Children(pub Vec<Entity>);

/// Per-axis rotation angles in radians (XYZ order) for nodes that spin.
///
/// Quaternions do not expose individual axes, so idle animation keeps its own
/// angles here and writes the composed rotation back into the transform.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct EulerAngles(pub Vec3);

impl EulerAngles {
    pub fn from_quat(rotation: Quat) -> Self {
        let (x, y, z) = rotation.to_euler(EulerRot::XYZ);
        Self(Vec3::new(x, y, z))
    }

    pub fn to_quat(self) -> Quat {
        Quat::from_euler(EulerRot::XYZ, self.0.x, self.0.y, self.0.z)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn euler_round_trip_is_stable() {
        let angles = EulerAngles(Vec3::new(0.3, -1.1, 0.2));
        let back = EulerAngles::from_quat(angles.to_quat());
        assert!((back.0 - angles.0).length() < 1e-5);
    }

    #[test]
    fn visual_texture_is_optional() {
        let plain = Visual::new(Shape::sphere(1.0), Color::WHITE);
        assert!(plain.texture.is_none());
        let textured = Visual::with_texture(Shape::sphere(1.0), Color::WHITE, TextureId(3));
        assert_eq!(textured.texture.map(TextureId::index), Some(3));
    }
}
