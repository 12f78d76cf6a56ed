//! The artifact popup: its state machine and its private preview scene.
//!
//! The popup owns a second [`SceneGraph`] and [`Camera`] that nothing else
//! touches. Opening the popup snapshots the clicked artifact out of the gallery
//! and instantiates the copy here, so spinning or repositioning the preview can
//! never disturb the original on its pedestal. At most one preview exists at a
//! time; every open removes the previous one first.

use std::f32::consts::TAU;

use glam::{Quat, Vec3};
use hecs::Entity;

use crate::camera::Camera;
use crate::ecs::EulerAngles;
use crate::mesh::Transform;
use crate::scene::SceneGraph;
use crate::ui::Color;

/// Where the popup is in its lifecycle.
///
/// `Open` always names a live preview root; closing removes it before the
/// state returns to `Closed`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum PopupState {
    /// Hidden, with an empty preview scene.
    #[default]
    Closed,
    /// Showing one artifact.
    Open {
        /// Metadata-bearing node in the gallery scene.
        artifact: Entity,
        /// Root of the clone in the preview scene.
        preview: Entity,
    },
}

/// Text shown in the popup panel.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PopupText {
    /// Artifact title, drawn in the accent colour.
    pub title: String,
    /// Body text, word-wrapped to the panel width.
    pub description: String,
    /// Parsed accent colour. `None` when the metadata held no valid hex.
    pub accent: Option<Color>,
    /// Whether the panel is shown at all.
    pub visible: bool,
}

/// The popup: current state, panel text and an isolated preview scene.
///
/// # Example
///
/// ```
/// use vitrine::{ArtifactMetadata, Node, PopupSession, SceneGraph, Transform, Vec3};
///
/// let mut gallery = SceneGraph::new();
/// let poster = gallery.spawn(
///     Node::new(Transform::from_position(Vec3::new(2.0, 1.5, -3.0)))
///         .with_metadata(ArtifactMetadata::new("Poster", "Ink on paper.", true, "#f1c40f")),
/// );
///
/// let mut popup = PopupSession::new();
/// assert!(popup.open(&gallery, poster, (400, 300)));
/// assert_eq!(popup.text().title, "Poster");
/// assert_eq!(popup.scene().len(), 1);
///
/// // The clone sits at the preview origin; the original has not moved
/// let clone = popup.preview().unwrap();
/// assert_eq!(popup.scene().transform(clone).unwrap().position, Vec3::ZERO);
/// assert_eq!(gallery.transform(poster).unwrap().position, Vec3::new(2.0, 1.5, -3.0));
///
/// popup.close();
/// assert!(popup.scene().is_empty());
/// ```
pub struct PopupSession {
    state: PopupState,
    scene: SceneGraph,
    camera: Camera,
    viewport: (u32, u32),
    text: PopupText,
}

impl Default for PopupSession {
    fn default() -> Self {
        Self::new()
    }
}

impl PopupSession {
    /// A closed popup with an empty preview scene and its camera a short way
    /// back from the origin.
    pub fn new() -> Self {
        Self {
            state: PopupState::Closed,
            scene: SceneGraph::new(),
            camera: Camera::new()
                .at(0.0, 0.15, 2.4)
                .looking_at(0.0, 0.0, 0.0)
                .with_fov(45.0),
            viewport: (1, 1),
            text: PopupText::default(),
        }
    }

    /// Current lifecycle state.
    pub fn state(&self) -> PopupState {
        self.state
    }

    /// Whether the panel should be drawn.
    pub fn is_visible(&self) -> bool {
        self.text.visible
    }

    /// Gallery node whose details are on display.
    pub fn artifact(&self) -> Option<Entity> {
        match self.state {
            PopupState::Open { artifact, .. } => Some(artifact),
            PopupState::Closed => None,
        }
    }

    /// Root of the preview clone.
    pub fn preview(&self) -> Option<Entity> {
        match self.state {
            PopupState::Open { preview, .. } => Some(preview),
            PopupState::Closed => None,
        }
    }

    /// The preview scene. Holds at most one artifact subtree.
    pub fn scene(&self) -> &SceneGraph {
        &self.scene
    }

    /// Camera used to render the preview scene.
    pub fn camera(&self) -> &Camera {
        &self.camera
    }

    /// Panel text of the current, or most recently shown, artifact.
    pub fn text(&self) -> &PopupText {
        &self.text
    }

    /// Pixel size the preview camera was last fitted to.
    pub fn viewport(&self) -> (u32, u32) {
        self.viewport
    }

    /// The preview scene, camera and target size, only while there is something to draw.
    pub fn visible_preview(&self) -> Option<(&SceneGraph, &Camera, (u32, u32))> {
        if self.is_visible() && self.preview().is_some() {
            Some((&self.scene, &self.camera, self.viewport))
        } else {
            None
        }
    }

    /// Show `artifact` from `gallery`, replacing whatever was shown before.
    ///
    /// `artifact` must carry metadata; otherwise nothing changes and `false`
    /// is returned. The clone keeps its scale but is moved to the origin with
    /// no rotation, and the preview camera is refitted to `viewport`.
    pub fn open(&mut self, gallery: &SceneGraph, artifact: Entity, viewport: (u32, u32)) -> bool {
        let Some(metadata) = gallery.metadata(artifact).map(|m| (*m).clone()) else {
            return false;
        };
        let Some(mut prefab) = gallery.extract(artifact) else {
            return false;
        };

        let replaced = self.remove_preview();

        prefab.node.transform.position = Vec3::ZERO;
        prefab.node.transform.rotation = Quat::IDENTITY;
        let preview = self.scene.instantiate(&prefab);
        self.scene.set_angles(preview, EulerAngles::default());

        self.text = PopupText {
            accent: metadata.accent(),
            title: metadata.title,
            description: metadata.description,
            visible: true,
        };

        self.viewport = (viewport.0.max(1), viewport.1.max(1));
        self.camera.resize(self.viewport.0, self.viewport.1);

        self.state = PopupState::Open { artifact, preview };
        if replaced {
            log::info!("popup replaced with '{}'", self.text.title);
        } else {
            log::info!("popup opened for '{}'", self.text.title);
        }
        true
    }

    /// Hide the popup and drop the preview clone. No-op when already closed.
    pub fn close(&mut self) {
        if self.remove_preview() {
            log::info!("popup closed");
        }
        self.state = PopupState::Closed;
        self.text.visible = false;
    }

    /// Turn the preview clone around its vertical axis.
    ///
    /// The yaw wraps into `[0, 2π)`. No-op while closed.
    pub fn turntable(&mut self, increment: f32) {
        let Some(preview) = self.preview() else {
            return;
        };
        let mut angles = self.scene.angles(preview).unwrap_or_default();
        angles.0.y = (angles.0.y + increment).rem_euclid(TAU);
        self.scene.set_angles(preview, angles);
    }

    /// Mutable access to the clone's root transform.
    ///
    /// Changes here only affect the preview scene.
    pub fn preview_transform_mut(&mut self) -> Option<&mut Transform> {
        let preview = self.preview()?;
        self.scene.transform_mut(preview)
    }

    fn remove_preview(&mut self) -> bool {
        match self.preview() {
            Some(preview) => {
                self.scene.despawn_recursive(preview);
                true
            }
            None => false,
        }
    }
}
