//! # Vitrine
//!
//! **A small virtual museum: procedural artifacts on pedestals, click one to see it up close.**
//!
//! The gallery is a 3D room with six pedestals. Clicking an artifact opens a
//! popup with its title, a description and a rotating preview. The preview is a
//! deep copy living in its own scene with its own camera, so nothing done to it
//! reaches the original.
//!
//! ## Quick Start
//!
//! ```no_run
//! use vitrine::{AppConfig, run};
//!
//! fn main() -> vitrine::Result<()> {
//!     env_logger::init();
//!     run(AppConfig::new().title("Vitrine").size(1280, 720))
//! }
//! ```
//!
//! ## Headless use
//!
//! Everything except drawing runs without a GPU. [`Museum`] takes clicks in
//! pixel coordinates and hands each frame to a [`FrameRenderer`]:
//!
//! ```
//! use vitrine::{ClickOutcome, Museum, SpinConfig};
//!
//! let mut museum = Museum::new(1280, 720, SpinConfig::default());
//! assert_eq!(museum.click(2.0, 2.0), ClickOutcome::Ignored);
//! assert!(!museum.popup().is_visible());
//! ```

mod app;
pub mod artifact;
mod assets;
mod camera;
mod draw2d;
mod ecs;
mod error;
mod gpu;
mod input;
pub mod layout;
mod mesh;
mod mesh_pass;
mod museum;
mod picking;
mod popup;
mod registry;
mod renderer;
pub mod scene;
mod texture;
mod ui;

pub use app::{AppConfig, run};
pub use artifact::{Artifact, ArtifactMetadata, ArtworkLibrary};
pub use assets::{FONT_ENV, FontAtlas, GlyphInfo, load_font, locate_font};
pub use camera::Camera;
pub use draw2d::{Draw2d, Vertex2d};
pub use ecs::{Children, EulerAngles, Parent, TextureId, Visual};
pub use error::{Result, VitrineError};
pub use gpu::GpuContext;
pub use input::{Command, Input};
pub use layout::{Gallery, build_gallery};
pub use mesh::{Mesh, MeshData, Shape, Transform, Vertex3d};
pub use mesh_pass::{DrawCall, MeshPass};
pub use museum::{ClickOutcome, FrameRenderer, Museum, PopupOverlay, SpinConfig};
pub use picking::{Collider, Ray, RayHit, ResolvedHit, raycast, resolve_click};
pub use popup::{PopupSession, PopupState, PopupText};
pub use registry::ClickRegistry;
pub use renderer::GpuRenderer;
pub use scene::{Node, Prefab, SceneGraph};
pub use texture::Texture;
pub use ui::{Color, PopupLayout, Rect, wrap_text};

pub use glam::{Mat4, Quat, Vec2, Vec3};
pub use hecs::Entity;
