use glam::{Mat4, Vec2, Vec3};

/// A perspective camera looking at a fixed target.
///
/// Both the gallery view and the popup preview use one of these. The aspect
/// ratio is kept in sync with the surface it renders to through [`Camera::resize`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Camera {
    pub position: Vec3,
    pub target: Vec3,
    pub up: Vec3,
    pub fov: f32, // radians, vertical
    pub aspect: f32,
    pub near: f32,
    pub far: f32,
}

impl Default for Camera {
    fn default() -> Self {
        Self {
            position: Vec3::new(0.0, 0.0, 5.0),
            target: Vec3::ZERO,
            up: Vec3::Y,
            fov: 75f32.to_radians(),
            aspect: 1.0,
            near: 0.1,
            far: 1000.0,
        }
    }
}

impl Camera {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn at(mut self, x: f32, y: f32, z: f32) -> Self {
        self.position = Vec3::new(x, y, z);
        self
    }

    pub fn looking_at(mut self, x: f32, y: f32, z: f32) -> Self {
        self.target = Vec3::new(x, y, z);
        self
    }

    pub fn with_fov(mut self, fov_degrees: f32) -> Self {
        self.fov = fov_degrees.to_radians();
        self
    }

    pub fn with_aspect(mut self, aspect: f32) -> Self {
        self.aspect = aspect;
        self
    }

    /// Match the aspect ratio to a surface of `width` x `height` pixels.
    ///
    /// A zero-sized surface (minimised window) leaves the aspect untouched.
    pub fn resize(&mut self, width: u32, height: u32) {
        if width > 0 && height > 0 {
            self.aspect = width as f32 / height as f32;
        }
    }

    pub fn forward(&self) -> Vec3 {
        (self.target - self.position).normalize_or_zero()
    }

    pub fn view_matrix(&self) -> Mat4 {
        Mat4::look_at_rh(self.position, self.target, self.up)
    }

    pub fn projection_matrix(&self) -> Mat4 {
        Mat4::perspective_rh(self.fov, self.aspect, self.near, self.far)
    }

    pub fn view_projection(&self) -> Mat4 {
        self.projection_matrix() * self.view_matrix()
    }

    /// Project a world-space point to pixel coordinates on a `width` x `height`
    /// surface. Returns `None` for points behind the camera.
    pub fn world_to_screen(&self, point: Vec3, width: f32, height: f32) -> Option<Vec2> {
        let clip = self.view_projection() * point.extend(1.0);
        if clip.w <= 0.0 {
            return None;
        }
        let ndc = clip.truncate() / clip.w;
        Some(Vec2::new(
            (ndc.x + 1.0) * 0.5 * width,
            (1.0 - ndc.y) * 0.5 * height,
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn resize_updates_aspect() {
        let mut camera = Camera::new();
        camera.resize(1600, 900);
        assert!((camera.aspect - 16.0 / 9.0).abs() < 1e-6);
        camera.resize(0, 900);
        assert!((camera.aspect - 16.0 / 9.0).abs() < 1e-6);
    }

    #[test]
    fn target_projects_to_centre() {
        let camera = Camera::new().at(0.0, 2.0, 8.0).looking_at(0.0, 1.0, 0.0);
        let p = camera
            .world_to_screen(Vec3::new(0.0, 1.0, 0.0), 800.0, 600.0)
            .unwrap();
        assert!((p.x - 400.0).abs() < 1e-3);
        assert!((p.y - 300.0).abs() < 1e-3);
    }

    #[test]
    fn behind_camera_is_not_projected() {
        let camera = Camera::new();
        assert!(camera
            .world_to_screen(Vec3::new(0.0, 0.0, 10.0), 800.0, 600.0)
            .is_none());
    }
}
