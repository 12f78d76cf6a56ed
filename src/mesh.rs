//! Procedural geometry, GPU meshes and spatial transforms.
//!
//! Geometry in the museum is never loaded from files. Every visible surface is
//! described by a [`Shape`], expanded on the CPU into [`MeshData`], and uploaded
//! once into a GPU [`Mesh`]. Keeping the shape description separate from the
//! GPU buffers lets the scene graph, picking and cloning run without a device.
//!
//! # Vertex Layout
//!
//! The [`Vertex3d`] struct uses the following GPU layout (32 bytes per vertex):
//!
//! | Attribute | Format    | Offset | Shader Location |
//! |-----------|-----------|--------|-----------------|
//! | position  | Float32x3 | 0      | 0               |
//! | normal    | Float32x3 | 12     | 1               |
//! | uv        | Float32x2 | 24     | 2               |

use std::f32::consts::{PI, TAU};

use glam::{Mat4, Quat, Vec3};

use crate::gpu::GpuContext;
use crate::picking::Collider;

/// A vertex for 3D mesh rendering with position, normal, and texture coordinates.
///
/// `#[repr(C)]` keeps the field order fixed for GPU upload, and the
/// [`bytemuck::Pod`] derive lets vertex slices be cast straight to bytes.
///
/// # Example
///
/// ```
/// use vitrine::Vertex3d;
///
/// // A vertex on top of a unit sphere, normal pointing up
/// let vertex = Vertex3d::new([0.0, 1.0, 0.0], [0.0, 1.0, 0.0], [0.5, 0.0]);
/// assert_eq!(std::mem::size_of_val(&vertex), 32);
/// ```
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct Vertex3d {
    /// The 3D position of this vertex in model space.
    pub position: [f32; 3],
    /// The surface normal vector (normalized for correct lighting).
    pub normal: [f32; 3],
    /// Texture coordinates, typically in the range [0, 1].
    pub uv: [f32; 2],
}

impl Vertex3d {
    /// The wgpu vertex buffer layout descriptor for this vertex type.
    ///
    /// 32-byte stride, stepped per vertex, with position, normal and uv at
    /// shader locations 0, 1 and 2. Both mesh pipelines bind it as their only
    /// vertex buffer.
    pub const LAYOUT: wgpu::VertexBufferLayout<'static> = wgpu::VertexBufferLayout {
        array_stride: std::mem::size_of::<Vertex3d>() as u64,
        step_mode: wgpu::VertexStepMode::Vertex,
        attributes: &[
            // position
            wgpu::VertexAttribute {
                offset: 0,
                shader_location: 0,
                format: wgpu::VertexFormat::Float32x3,
            },
            // normal
            wgpu::VertexAttribute {
                offset: 12,
                shader_location: 1,
                format: wgpu::VertexFormat::Float32x3,
            },
            // uv
            wgpu::VertexAttribute {
                offset: 24,
                shader_location: 2,
                format: wgpu::VertexFormat::Float32x2,
            },
        ],
    };

    /// Creates a vertex from a model-space position, a unit normal and texture coordinates.
    pub fn new(position: [f32; 3], normal: [f32; 3], uv: [f32; 2]) -> Self {
        Self {
            position,
            normal,
            uv,
        }
    }
}

/// Procedural description of a piece of geometry, centred at the origin.
///
/// Shapes are small `Copy` values stored on scene nodes. Cloning a node clones
/// the description; the renderer shares one GPU mesh per distinct shape.
///
/// # Example
///
/// ```
/// use vitrine::{MeshData, Shape};
///
/// let pedestal = Shape::cuboid(0.9, 1.2, 0.9);
/// let data = MeshData::from_shape(&pedestal);
/// assert_eq!(data.vertices.len(), 24);
/// assert_eq!(data.indices.len(), 36);
///
/// // Equal shapes share a cache key, so they share a GPU mesh
/// assert_eq!(pedestal.key(), Shape::cuboid(0.9, 1.2, 0.9).key());
/// ```
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Shape {
    /// Axis-aligned box with the given full extents.
    Cuboid { size: Vec3 },
    /// UV sphere.
    Sphere { radius: f32 },
    /// Capped cylinder along the Y axis.
    Cylinder { radius: f32, height: f32 },
    /// Horizontal square on the XZ plane, facing +Y.
    Plane { size: f32 },
}

impl Shape {
    /// Box with full extents `x`, `y` and `z`.
    pub fn cuboid(x: f32, y: f32, z: f32) -> Self {
        Self::Cuboid {
            size: Vec3::new(x, y, z),
        }
    }

    pub fn sphere(radius: f32) -> Self {
        Self::Sphere { radius }
    }

    /// Upright cylinder, `height` measured along Y and centred on the origin.
    pub fn cylinder(radius: f32, height: f32) -> Self {
        Self::Cylinder { radius, height }
    }

    pub fn plane(size: f32) -> Self {
        Self::Plane { size }
    }

    /// Stable key for caching GPU meshes by shape.
    ///
    /// Dimensions are compared bit for bit, so `0.5` and `0.5000001` make two
    /// meshes. Factory shapes use literal sizes, which keeps the cache small.
    pub fn key(&self) -> (u8, [u32; 3]) {
        match *self {
            Shape::Cuboid { size } => (0, [size.x.to_bits(), size.y.to_bits(), size.z.to_bits()]),
            Shape::Sphere { radius } => (1, [radius.to_bits(), 0, 0]),
            Shape::Cylinder { radius, height } => (2, [radius.to_bits(), height.to_bits(), 0]),
            Shape::Plane { size } => (3, [size.to_bits(), 0, 0]),
        }
    }

    /// Local-space collider enclosing this shape.
    ///
    /// Spheres get an exact sphere. Everything else gets its bounding box, with
    /// planes given a sliver of thickness so grazing rays still register.
    pub fn collider(&self) -> Collider {
        match *self {
            Shape::Cuboid { size } => Collider::box_collider(size),
            Shape::Sphere { radius } => Collider::sphere(radius),
            Shape::Cylinder { radius, height } => {
                Collider::box_collider(Vec3::new(radius * 2.0, height, radius * 2.0))
            }
            Shape::Plane { size } => Collider::box_collider(Vec3::new(size, 0.001, size)),
        }
    }
}

/// CPU-side triangle geometry produced from a [`Shape`].
///
/// Nothing here needs a GPU, so generators can be tested on their own.
#[derive(Clone, Debug, Default)]
pub struct MeshData {
    /// Vertex list referenced by `indices`.
    pub vertices: Vec<Vertex3d>,
    /// Triangle list, three indices per triangle.
    pub indices: Vec<u32>,
}

impl MeshData {
    /// Tessellation used for round shapes.
    const SEGMENTS: u32 = 32;
    const RINGS: u32 = 16;

    /// Tessellate `shape` at the standard detail level.
    pub fn from_shape(shape: &Shape) -> Self {
        match *shape {
            Shape::Cuboid { size } => Self::cuboid(size),
            Shape::Sphere { radius } => Self::sphere(radius, Self::SEGMENTS, Self::RINGS),
            Shape::Cylinder { radius, height } => Self::cylinder(radius, height, Self::SEGMENTS),
            Shape::Plane { size } => Self::plane(size),
        }
    }

    /// Box with per-face vertices so every face maps the full texture.
    pub fn cuboid(size: Vec3) -> Self {
        let h = size * 0.5;
        #[rustfmt::skip]
        let faces: [([f32; 3], [[f32; 3]; 4]); 6] = [
            // Front face (Z+)
            ([0.0, 0.0, 1.0], [[-h.x, -h.y, h.z], [h.x, -h.y, h.z], [h.x, h.y, h.z], [-h.x, h.y, h.z]]),
            // Back face (Z-)
            ([0.0, 0.0, -1.0], [[h.x, -h.y, -h.z], [-h.x, -h.y, -h.z], [-h.x, h.y, -h.z], [h.x, h.y, -h.z]]),
            // Top face (Y+)
            ([0.0, 1.0, 0.0], [[-h.x, h.y, h.z], [h.x, h.y, h.z], [h.x, h.y, -h.z], [-h.x, h.y, -h.z]]),
            // Bottom face (Y-)
            ([0.0, -1.0, 0.0], [[-h.x, -h.y, -h.z], [h.x, -h.y, -h.z], [h.x, -h.y, h.z], [-h.x, -h.y, h.z]]),
            // Right face (X+)
            ([1.0, 0.0, 0.0], [[h.x, -h.y, h.z], [h.x, -h.y, -h.z], [h.x, h.y, -h.z], [h.x, h.y, h.z]]),
            // Left face (X-)
            ([-1.0, 0.0, 0.0], [[-h.x, -h.y, -h.z], [-h.x, -h.y, h.z], [-h.x, h.y, h.z], [-h.x, h.y, -h.z]]),
        ];
        // Image rows run top to bottom, so v is flipped against the face's up axis.
        let uvs = [[0.0, 1.0], [1.0, 1.0], [1.0, 0.0], [0.0, 0.0]];

        let mut data = Self::default();
        for (normal, corners) in faces {
            let base = data.vertices.len() as u32;
            for (corner, uv) in corners.iter().zip(uvs) {
                data.vertices.push(Vertex3d::new(*corner, normal, uv));
            }
            data.indices
                .extend_from_slice(&[base, base + 1, base + 2, base + 2, base + 3, base]);
        }
        data
    }

    /// UV sphere with `segments` slices around Y and `rings` stacks pole to pole.
    ///
    /// The seam column is duplicated so u runs cleanly from 0 to 1.
    pub fn sphere(radius: f32, segments: u32, rings: u32) -> Self {
        let mut data = Self::default();

        for ring in 0..=rings {
            let phi = PI * ring as f32 / rings as f32;
            let y = phi.cos();
            let ring_radius = phi.sin();

            for seg in 0..=segments {
                let theta = TAU * seg as f32 / segments as f32;
                let x = ring_radius * theta.cos();
                let z = ring_radius * theta.sin();

                data.vertices.push(Vertex3d::new(
                    [x * radius, y * radius, z * radius],
                    [x, y, z],
                    [seg as f32 / segments as f32, ring as f32 / rings as f32],
                ));
            }
        }

        for ring in 0..rings {
            for seg in 0..segments {
                let current = ring * (segments + 1) + seg;
                let next = current + segments + 1;
                data.indices
                    .extend_from_slice(&[current, current + 1, next, current + 1, next + 1, next]);
            }
        }

        data
    }

    /// Capped cylinder along Y. The side and both caps have separate vertices
    /// so the caps light flat.
    pub fn cylinder(radius: f32, height: f32, segments: u32) -> Self {
        let mut data = Self::default();
        let half = height * 0.5;

        // Side wall
        for seg in 0..=segments {
            let theta = TAU * seg as f32 / segments as f32;
            let (s, c) = theta.sin_cos();
            let u = seg as f32 / segments as f32;
            data.vertices
                .push(Vertex3d::new([c * radius, -half, s * radius], [c, 0.0, s], [u, 1.0]));
            data.vertices
                .push(Vertex3d::new([c * radius, half, s * radius], [c, 0.0, s], [u, 0.0]));
        }
        for seg in 0..segments {
            let b = seg * 2;
            data.indices
                .extend_from_slice(&[b, b + 1, b + 2, b + 2, b + 1, b + 3]);
        }

        // Caps
        for (y, ny) in [(half, 1.0f32), (-half, -1.0f32)] {
            let center = data.vertices.len() as u32;
            data.vertices
                .push(Vertex3d::new([0.0, y, 0.0], [0.0, ny, 0.0], [0.5, 0.5]));
            for seg in 0..=segments {
                let theta = TAU * seg as f32 / segments as f32;
                let (s, c) = theta.sin_cos();
                data.vertices.push(Vertex3d::new(
                    [c * radius, y, s * radius],
                    [0.0, ny, 0.0],
                    [0.5 + c * 0.5, 0.5 + s * 0.5],
                ));
            }
            for seg in 0..segments {
                let a = center + 1 + seg;
                if ny > 0.0 {
                    data.indices.extend_from_slice(&[center, a + 1, a]);
                } else {
                    data.indices.extend_from_slice(&[center, a, a + 1]);
                }
            }
        }

        data
    }

    /// Square of side `size` on the XZ plane, facing +Y.
    pub fn plane(size: f32) -> Self {
        let half = size * 0.5;
        Self {
            vertices: vec![
                Vertex3d::new([-half, 0.0, -half], [0.0, 1.0, 0.0], [0.0, 0.0]),
                Vertex3d::new([-half, 0.0, half], [0.0, 1.0, 0.0], [0.0, 1.0]),
                Vertex3d::new([half, 0.0, half], [0.0, 1.0, 0.0], [1.0, 1.0]),
                Vertex3d::new([half, 0.0, -half], [0.0, 1.0, 0.0], [1.0, 0.0]),
            ],
            indices: vec![0, 1, 2, 2, 3, 0],
        }
    }

    /// Axis-aligned bounds of all vertex positions.
    pub fn bounds(&self) -> (Vec3, Vec3) {
        let mut min = Vec3::splat(f32::MAX);
        let mut max = Vec3::splat(f32::MIN);
        for v in &self.vertices {
            let p = Vec3::from(v.position);
            min = min.min(p);
            max = max.max(p);
        }
        (min, max)
    }
}

/// GPU-resident 3D mesh geometry with vertex and index buffers.
///
/// Meshes are immutable once uploaded. The renderer keeps one per distinct
/// [`Shape::key`] and draws it as many times as scene nodes reference it.
#[derive(Debug)]
pub struct Mesh {
    pub(crate) vertex_buffer: wgpu::Buffer,
    pub(crate) index_buffer: wgpu::Buffer,
    pub(crate) index_count: u32,
}

impl Mesh {
    /// Uploads vertex and index data into fresh GPU buffers.
    pub fn new(gpu: &GpuContext, vertices: &[Vertex3d], indices: &[u32]) -> Self {
        use wgpu::util::DeviceExt;

        let vertex_buffer = gpu
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("Mesh Vertex Buffer"),
                contents: bytemuck::cast_slice(vertices),
                usage: wgpu::BufferUsages::VERTEX,
            });

        let index_buffer = gpu
            .device
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some("Mesh Index Buffer"),
                contents: bytemuck::cast_slice(indices),
                usage: wgpu::BufferUsages::INDEX,
            });

        Self {
            vertex_buffer,
            index_buffer,
            index_count: indices.len() as u32,
        }
    }

    /// Tessellate `shape` with [`MeshData::from_shape`] and upload the result.
    pub fn from_shape(gpu: &GpuContext, shape: &Shape) -> Self {
        let data = MeshData::from_shape(shape);
        Self::new(gpu, &data.vertices, &data.indices)
    }
}

/// Local position, rotation and scale of a scene node.
///
/// # Transformation Order
///
/// [`Transform::matrix()`] applies **Scale → Rotate → Translate** (SRT).
///
/// # Example
///
/// ```
/// use vitrine::{Quat, Transform, Vec3};
///
/// let t = Transform::from_position(Vec3::new(0.0, 1.0, 0.0))
///     .rotation(Quat::from_rotation_y(std::f32::consts::FRAC_PI_2))
///     .uniform_scale(2.0);
///
/// // Scaled to 2, turned onto -Z, then lifted by 1
/// let p = t.matrix().transform_point3(Vec3::X);
/// assert!((p - Vec3::new(0.0, 1.0, -2.0)).length() < 1e-5);
/// ```
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Transform {
    /// Translation relative to the parent node.
    pub position: Vec3,
    /// Rotation as a unit quaternion.
    pub rotation: Quat,
    /// Scale factors for each axis.
    pub scale: Vec3,
}

impl Default for Transform {
    fn default() -> Self {
        Self {
            position: Vec3::ZERO,
            rotation: Quat::IDENTITY,
            scale: Vec3::ONE,
        }
    }
}

impl Transform {
    /// The identity transform.
    pub fn new() -> Self {
        Self::default()
    }

    /// Identity rotation and unit scale at `position`.
    pub fn from_position(position: Vec3) -> Self {
        Self {
            position,
            ..Default::default()
        }
    }

    pub fn position(mut self, position: Vec3) -> Self {
        self.position = position;
        self
    }

    pub fn rotation(mut self, rotation: Quat) -> Self {
        self.rotation = rotation;
        self
    }

    pub fn scale(mut self, scale: Vec3) -> Self {
        self.scale = scale;
        self
    }

    /// Set the same scale on all three axes.
    pub fn uniform_scale(mut self, scale: f32) -> Self {
        self.scale = Vec3::splat(scale);
        self
    }

    /// The local-to-parent matrix.
    pub fn matrix(&self) -> Mat4 {
        Mat4::from_scale_rotation_translation(self.scale, self.rotation, self.position)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cuboid_bounds_match_size() {
        let data = MeshData::cuboid(Vec3::new(2.0, 1.0, 0.5));
        assert_eq!(data.vertices.len(), 24);
        assert_eq!(data.indices.len(), 36);
        let (min, max) = data.bounds();
        assert_eq!(min, Vec3::new(-1.0, -0.5, -0.25));
        assert_eq!(max, Vec3::new(1.0, 0.5, 0.25));
    }

    #[test]
    fn sphere_radius() {
        let data = MeshData::sphere(0.75, 16, 8);
        assert_eq!(data.vertices.len(), 17 * 9);
        assert_eq!(data.indices.len(), (16 * 8 * 6) as usize);
        for v in &data.vertices {
            assert!((Vec3::from(v.position).length() - 0.75).abs() < 1e-5);
        }
    }

    #[test]
    fn cylinder_indices_in_range() {
        let data = MeshData::cylinder(0.3, 1.2, 12);
        let (min, max) = data.bounds();
        assert!((max.y - 0.6).abs() < 1e-6);
        assert!((min.y + 0.6).abs() < 1e-6);
        assert!(data.indices.iter().all(|&i| (i as usize) < data.vertices.len()));
        assert_eq!(data.indices.len() % 3, 0);
    }

    #[test]
    fn shape_keys_distinguish_shapes() {
        assert_eq!(Shape::sphere(1.0).key(), Shape::sphere(1.0).key());
        assert_ne!(Shape::sphere(1.0).key(), Shape::sphere(2.0).key());
        assert_ne!(Shape::sphere(1.0).key(), Shape::plane(1.0).key());
    }

    #[test]
    fn transform_matrix_applies_srt() {
        let t = Transform::new()
            .position(Vec3::new(1.0, 0.0, 0.0))
            .rotation(Quat::from_rotation_y(std::f32::consts::FRAC_PI_2))
            .uniform_scale(2.0);
        let p = t.matrix().transform_point3(Vec3::new(1.0, 0.0, 0.0));
        assert!((p - Vec3::new(1.0, 0.0, -2.0)).length() < 1e-5);
    }
}
