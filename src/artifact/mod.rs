//! Museum artifacts: display metadata plus procedurally built geometry.
//!
//! An [`Artifact`] pairs a node tree with the [`ArtifactMetadata`] shown when it
//! is clicked. The metadata is attached to exactly one node (the root) when the
//! artifact is turned into a [`Prefab`], and is never modified afterwards.

mod artwork;
pub mod factory;

pub use artwork::{
    ArtworkLibrary, aged_paper, floor_tiles, lion_scales, newspaper, protest_poster,
    typed_document, wood_grain,
};

use crate::scene::Prefab;

/// What the popup shows for an artifact, and how the artifact idles.
#[derive(Clone, Debug, PartialEq)]
pub struct ArtifactMetadata {
    pub title: String,
    pub description: String,
    /// Paper-like artifacts spin upright around the vertical axis only.
    pub is_floating_paper: bool,
    /// Accent colour as a CSS-style hex string, e.g. `"#c8102e"`.
    pub image_color: String,
}

impl ArtifactMetadata {
    pub fn new(
        title: impl Into<String>,
        description: impl Into<String>,
        is_floating_paper: bool,
        image_color: impl Into<String>,
    ) -> Self {
        Self {
            title: title.into(),
            description: description.into(),
            is_floating_paper,
            image_color: image_color.into(),
        }
    }

    /// Parse [`image_color`](Self::image_color) as `#rrggbb`.
    pub fn accent(&self) -> Option<crate::ui::Color> {
        let hex = self.image_color.strip_prefix('#')?;
        if hex.len() != 6 {
            return None;
        }
        u32::from_str_radix(hex, 16).ok().map(crate::ui::Color::hex)
    }
}

/// A clickable object tree together with its metadata.
#[derive(Clone, Debug)]
pub struct Artifact {
    pub object: Prefab,
    pub metadata: ArtifactMetadata,
}

impl Artifact {
    pub fn new(object: Prefab, metadata: ArtifactMetadata) -> Self {
        Self { object, metadata }
    }

    pub fn title(&self) -> &str {
        &self.metadata.title
    }

    /// Attach the metadata to the root node.
    pub fn into_prefab(self) -> Prefab {
        let mut prefab = self.object;
        prefab.node.metadata = Some(self.metadata);
        prefab
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::Node;

    #[test]
    fn accent_parses_hex() {
        let m = ArtifactMetadata::new("t", "d", false, "#ff0000");
        assert_eq!(m.accent(), Some(crate::ui::Color::rgb(1.0, 0.0, 0.0)));
        assert_eq!(ArtifactMetadata::new("t", "d", false, "red").accent(), None);
    }

    #[test]
    fn into_prefab_tags_root_only() {
        let artifact = Artifact::new(
            Prefab::new(Node::default()).with_child(Prefab::new(Node::default())),
            ArtifactMetadata::new("Title", "Body", true, "#000000"),
        );
        let prefab = artifact.into_prefab();
        assert_eq!(prefab.metadata_count(), 1);
        assert_eq!(prefab.node.metadata.as_ref().unwrap().title, "Title");
    }
}
