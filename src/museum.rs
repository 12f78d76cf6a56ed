//! The museum: click routing and the per-frame driver.
//!
//! [`Museum`] ties the gallery scene, the click registry and the popup session
//! together. It has no GPU state; drawing goes through the [`FrameRenderer`]
//! trait so the whole interaction loop can run headless.

use std::f32::consts::TAU;

use hecs::Entity;

use crate::artifact::ArtworkLibrary;
use crate::camera::Camera;
use crate::layout::{self, Gallery};
use crate::picking::resolve_click;
use crate::popup::{PopupSession, PopupText};
use crate::registry::ClickRegistry;
use crate::scene::SceneGraph;
use crate::ui::PopupLayout;

/// Idle animation rates, in radians per frame.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SpinConfig {
    /// Spin around the vertical axis, applied to every registered object.
    pub yaw: f32,
    /// Extra spin around X for objects that are not paper.
    pub tumble: f32,
    /// Spin of the clone inside the popup.
    pub turntable: f32,
}

impl Default for SpinConfig {
    fn default() -> Self {
        Self {
            yaw: 0.01,
            tumble: 0.01,
            turntable: 0.005,
        }
    }
}

/// What a click did.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ClickOutcome {
    /// The popup now shows this gallery node.
    Opened(Entity),
    /// The close button was hit.
    Closed,
    /// The click landed on the open popup panel.
    Swallowed,
    /// Nothing clickable was hit; state is unchanged.
    Ignored,
}

/// Popup content handed to the renderer for the overlay.
#[derive(Clone, Copy, Debug)]
pub struct PopupOverlay<'a> {
    pub layout: PopupLayout,
    pub text: &'a PopupText,
}

/// Receives draw calls from [`Museum::frame`].
///
/// Within a frame `render_preview` (when called) always comes before
/// `render_primary`. `viewport` is the pixel size of the preview image.
pub trait FrameRenderer {
    fn render_preview(&mut self, scene: &SceneGraph, camera: &Camera, viewport: (u32, u32));
    fn render_primary(
        &mut self,
        scene: &SceneGraph,
        camera: &Camera,
        overlay: Option<PopupOverlay<'_>>,
    );
}

pub struct Museum {
    scene: SceneGraph,
    registry: ClickRegistry,
    artwork: ArtworkLibrary,
    camera: Camera,
    popup: PopupSession,
    spin: SpinConfig,
    size: (u32, u32),
}

impl Museum {
    pub fn new(width: u32, height: u32, spin: SpinConfig) -> Self {
        Self::from_gallery(layout::build_gallery(), width, height, spin)
    }

    pub fn from_gallery(gallery: Gallery, width: u32, height: u32, spin: SpinConfig) -> Self {
        let Gallery {
            scene,
            registry,
            artwork,
            mut camera,
        } = gallery;
        camera.resize(width, height);
        Self {
            scene,
            registry,
            artwork,
            camera,
            popup: PopupSession::new(),
            spin,
            size: (width, height),
        }
    }

    pub fn scene(&self) -> &SceneGraph {
        &self.scene
    }

    pub fn registry(&self) -> &ClickRegistry {
        &self.registry
    }

    pub fn artwork(&self) -> &ArtworkLibrary {
        &self.artwork
    }

    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    pub fn popup(&self) -> &PopupSession {
        &self.popup
    }

    pub fn popup_mut(&mut self) -> &mut PopupSession {
        &mut self.popup
    }

    pub fn size(&self) -> (u32, u32) {
        self.size
    }

    pub fn layout(&self) -> PopupLayout {
        PopupLayout::for_window(self.size.0, self.size.1)
    }

    /// Track a new window size. The popup camera is refitted on its next open.
    pub fn resize(&mut self, width: u32, height: u32) {
        if width == 0 || height == 0 {
            return;
        }
        self.size = (width, height);
        self.camera.resize(width, height);
    }

    /// Handle a left click at pixel `(px, py)`.
    pub fn click(&mut self, px: f32, py: f32) -> ClickOutcome {
        let layout = self.layout();
        if self.popup.is_visible() {
            if layout.close_button.contains(px, py) {
                self.popup.close();
                return ClickOutcome::Closed;
            }
            if layout.panel.contains(px, py) {
                return ClickOutcome::Swallowed;
            }
        }

        let size = (self.size.0 as f32, self.size.1 as f32);
        let Some(resolved) = resolve_click(&self.scene, &self.registry, &self.camera, (px, py), size)
        else {
            return ClickOutcome::Ignored;
        };
        if self
            .popup
            .open(&self.scene, resolved.artifact, layout.preview_size())
        {
            ClickOutcome::Opened(resolved.artifact)
        } else {
            ClickOutcome::Ignored
        }
    }

    /// Close the popup. Returns `false` if it was not open.
    pub fn close_popup(&mut self) -> bool {
        let was_open = self.popup.is_visible();
        self.popup.close();
        was_open
    }

    /// Advance idle animation by one frame.
    pub fn advance(&mut self) {
        let spin = self.spin;
        for root in self.registry.iter() {
            let Some(mut angles) = self.scene.angles(root) else {
                continue;
            };
            angles.0.y = (angles.0.y + spin.yaw).rem_euclid(TAU);
            if self.is_paper(root) {
                // Applied after the yaw step so paper always faces front.
                angles.0.x = 0.0;
                angles.0.z = 0.0;
            } else {
                angles.0.x = (angles.0.x + spin.tumble).rem_euclid(TAU);
            }
            self.scene.set_angles(root, angles);
        }
        self.popup.turntable(spin.turntable);
    }

    /// Run one frame: animate, draw the preview if shown, then draw the gallery.
    pub fn frame<R: FrameRenderer>(&mut self, renderer: &mut R) {
        self.advance();
        if let Some((scene, camera, viewport)) = self.popup.visible_preview() {
            renderer.render_preview(scene, camera, viewport);
        }
        let overlay = self.popup.is_visible().then(|| PopupOverlay {
            layout: self.layout(),
            text: self.popup.text(),
        });
        renderer.render_primary(&self.scene, &self.camera, overlay);
    }

    fn is_paper(&self, root: Entity) -> bool {
        // Factory artifacts carry their metadata on the root.
        if let Some(meta) = self.scene.metadata(root) {
            return meta.is_floating_paper;
        }
        self.scene
            .find_metadata(root)
            .and_then(|node| self.scene.metadata(node).map(|m| m.is_floating_paper))
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::artifact::factory;
    use crate::ecs::EulerAngles;
    use crate::popup::PopupState;
    use glam::{Vec2, Vec3};

    const W: u32 = 1280;
    const H: u32 = 720;

    #[derive(Debug, PartialEq)]
    enum Call {
        Preview {
            nodes: usize,
            aspect: f32,
            viewport: (u32, u32),
        },
        Primary { overlay: Option<String> },
    }

    #[derive(Default)]
    struct Recorder {
        calls: Vec<Call>,
    }

    impl FrameRenderer for Recorder {
        fn render_preview(&mut self, scene: &SceneGraph, camera: &Camera, viewport: (u32, u32)) {
            self.calls.push(Call::Preview {
                nodes: scene.len(),
                aspect: camera.aspect,
                viewport,
            });
        }

        fn render_primary(
            &mut self,
            _scene: &SceneGraph,
            _camera: &Camera,
            overlay: Option<PopupOverlay<'_>>,
        ) {
            self.calls.push(Call::Primary {
                overlay: overlay.map(|o| o.text.title.clone()),
            });
        }
    }

    fn museum() -> Museum {
        Museum::new(W, H, SpinConfig::default())
    }

    /// Pixel position of the artifact on pedestal `index`.
    fn pixel_of(museum: &Museum, index: usize) -> Vec2 {
        let root = museum.registry().get(index).unwrap();
        let centre = museum.scene().world_matrix(root).transform_point3(Vec3::ZERO);
        museum
            .camera()
            .world_to_screen(centre, W as f32, H as f32)
            .unwrap()
    }

    fn click_pedestal(museum: &mut Museum, index: usize) -> ClickOutcome {
        let p = pixel_of(museum, index);
        museum.click(p.x, p.y)
    }

    fn title(museum: &Museum) -> &str {
        &museum.popup().text().title
    }

    #[test]
    fn opening_the_exclusion_act() {
        let mut museum = museum();
        let outcome = click_pedestal(&mut museum, 1);
        assert!(matches!(outcome, ClickOutcome::Opened(_)));
        assert_eq!(title(&museum), "Chinese Exclusion Act");
        assert_eq!(museum.popup().text().description, factory::EXCLUSION_ACT_TEXT);
        assert!(museum.popup().is_visible());
        assert_eq!(museum.popup().scene().roots().len(), 1);
    }

    #[test]
    fn clicking_another_artifact_replaces_preview() {
        let mut museum = museum();
        click_pedestal(&mut museum, 1);
        let old = museum.popup().preview().unwrap();

        let outcome = click_pedestal(&mut museum, 3);
        assert!(matches!(outcome, ClickOutcome::Opened(_)));
        assert_eq!(title(&museum), "Who Killed Vincent Chin News Article");
        assert_eq!(museum.popup().scene().roots().len(), 1);
        assert!(!museum.popup().scene().contains(old));
    }

    #[test]
    fn empty_click_keeps_popup_hidden() {
        let mut museum = museum();
        assert_eq!(museum.click(5.0, 5.0), ClickOutcome::Ignored);
        assert!(!museum.popup().is_visible());
        assert_eq!(*museum.popup().text(), PopupText::default());
        assert!(museum.popup().scene().is_empty());
    }

    #[test]
    fn close_empties_preview_scene() {
        let mut museum = museum();
        click_pedestal(&mut museum, 1);
        let close = museum.layout().close_button;
        let outcome = museum.click(close.x + close.width * 0.5, close.y + close.height * 0.5);
        assert_eq!(outcome, ClickOutcome::Closed);
        assert!(museum.popup().scene().is_empty());
        assert!(!museum.popup().is_visible());
        assert_eq!(museum.popup().state(), PopupState::Closed);
    }

    #[test]
    fn miss_while_open_keeps_state() {
        let mut museum = museum();
        click_pedestal(&mut museum, 1);
        let before = museum.popup().state();
        let text = museum.popup().text().clone();
        assert_eq!(museum.click(5.0, 5.0), ClickOutcome::Ignored);
        assert_eq!(museum.popup().state(), before);
        assert_eq!(*museum.popup().text(), text);
    }

    #[test]
    fn clicks_on_the_panel_are_swallowed() {
        let mut museum = museum();
        click_pedestal(&mut museum, 1);
        let text = museum.layout().text;
        let outcome = museum.click(text.x + 10.0, text.y + 10.0);
        assert_eq!(outcome, ClickOutcome::Swallowed);
        assert!(museum.popup().is_visible());
    }

    #[test]
    fn unlabeled_block_is_ignored() {
        let mut museum = museum();
        assert_eq!(click_pedestal(&mut museum, 5), ClickOutcome::Ignored);
        assert!(!museum.popup().is_visible());
    }

    #[test]
    fn group_artifacts_resolve_to_their_root() {
        let mut museum = museum();
        for (index, expected) in [(2, factory::LION_DANCE_TITLE), (4, factory::RAILROAD_TITLE)] {
            museum.close_popup();
            let root = museum.registry().get(index).unwrap();
            assert_eq!(click_pedestal(&mut museum, index), ClickOutcome::Opened(root));
            assert_eq!(title(&museum), expected);
            let nodes = museum.scene().descendants(root).len();
            assert_eq!(museum.popup().scene().len(), nodes);
        }
    }

    #[test]
    fn same_artifact_twice_keeps_one_preview() {
        let mut museum = museum();
        click_pedestal(&mut museum, 1);
        click_pedestal(&mut museum, 1);
        assert_eq!(museum.popup().scene().roots().len(), 1);
        assert_eq!(museum.popup().scene().len(), 1);
    }

    #[test]
    fn every_registered_part_reaches_metadata() {
        let museum = museum();
        for root in museum.registry().iter() {
            let Some(labeled) = museum.scene().find_metadata(root) else {
                continue;
            };
            assert_eq!(labeled, root);
            let depth = museum.scene().descendants(root).len();
            for node in museum.scene().descendants(root) {
                let steps = museum.scene().ancestors(node).len();
                assert!(steps <= depth);
                assert_eq!(museum.scene().metadata_ancestor(node), Some(root));
            }
        }
    }

    #[test]
    fn preview_is_isolated_from_pedestal() {
        let mut museum = museum();
        click_pedestal(&mut museum, 2);
        let root = museum.registry().get(2).unwrap();
        let before = museum.scene().transform(root).unwrap();

        let t = museum.popup_mut().preview_transform_mut().unwrap();
        t.position = Vec3::new(5.0, 5.0, 5.0);
        assert_eq!(museum.scene().transform(root).unwrap(), before);

        let preview = museum.popup().preview().unwrap();
        let preview_before = museum.popup().scene().transform(preview).unwrap();
        museum.advance();
        assert_ne!(museum.scene().transform(root).unwrap(), before);
        let preview_after = museum.popup().scene().transform(preview).unwrap();
        assert_eq!(preview_after.position, preview_before.position);
    }

    #[test]
    fn paper_stays_upright() {
        let mut museum = museum();
        for _ in 0..700 {
            museum.advance();
        }
        for index in [0, 1, 3] {
            let root = museum.registry().get(index).unwrap();
            let angles = museum.scene().angles(root).unwrap();
            assert_eq!(angles.0.x, 0.0);
            assert_eq!(angles.0.z, 0.0);
            let rotation = museum.scene().transform(root).unwrap().rotation;
            let upright = EulerAngles(Vec3::new(0.0, angles.0.y, 0.0)).to_quat();
            assert!((rotation.dot(upright).abs() - 1.0).abs() < 1e-6);
        }
    }

    #[test]
    fn solids_tumble_at_a_steady_rate() {
        let spin = SpinConfig::default();
        let mut museum = Museum::new(W, H, spin);
        let n = 50;
        for _ in 0..n {
            museum.advance();
        }
        for index in [2, 4, 5] {
            let root = museum.registry().get(index).unwrap();
            let angles = museum.scene().angles(root).unwrap();
            assert!((angles.0.y - n as f32 * spin.yaw).abs() < 1e-4);
            assert!((angles.0.x - n as f32 * spin.tumble).abs() < 1e-4);
        }
    }

    #[test]
    fn yaw_wraps_around() {
        let spin = SpinConfig {
            yaw: 1.0,
            ..SpinConfig::default()
        };
        let mut museum = Museum::new(W, H, spin);
        for _ in 0..7 {
            museum.advance();
        }
        let root = museum.registry().get(1).unwrap();
        let yaw = museum.scene().angles(root).unwrap().0.y;
        assert!((yaw - (7.0 - TAU)).abs() < 1e-4);
    }

    #[test]
    fn frame_skips_preview_while_closed() {
        let mut museum = museum();
        let mut recorder = Recorder::default();
        museum.frame(&mut recorder);
        assert_eq!(recorder.calls, vec![Call::Primary { overlay: None }]);
    }

    #[test]
    fn frame_draws_preview_before_gallery() {
        let mut museum = museum();
        click_pedestal(&mut museum, 1);
        let (w, h) = museum.layout().preview_size();
        let mut recorder = Recorder::default();
        museum.frame(&mut recorder);
        assert_eq!(
            recorder.calls,
            vec![
                Call::Preview {
                    nodes: 1,
                    aspect: w as f32 / h as f32,
                    viewport: (w, h),
                },
                Call::Primary {
                    overlay: Some("Chinese Exclusion Act".to_string()),
                },
            ]
        );

        museum.close_popup();
        recorder.calls.clear();
        museum.frame(&mut recorder);
        assert_eq!(recorder.calls, vec![Call::Primary { overlay: None }]);
    }

    #[test]
    fn resize_updates_primary_camera_only() {
        let mut museum = museum();
        click_pedestal(&mut museum, 1);
        let preview_aspect = museum.popup().camera().aspect;
        museum.resize(800, 800);
        assert!((museum.camera().aspect - 1.0).abs() < 1e-6);
        assert_eq!(museum.popup().camera().aspect, preview_aspect);
        museum.resize(0, 0);
        assert_eq!(museum.size(), (800, 800));
    }
}
