//! Builders for each artifact in the collection.
//!
//! Every builder is a pure function of the artwork library it registers its
//! textures in. Local origins sit at the centre of each object so the idle
//! spin turns it in place.

use glam::{Quat, Vec3};

use super::artwork::{self, ArtworkLibrary};
use super::{Artifact, ArtifactMetadata};
use crate::ecs::{TextureId, Visual};
use crate::mesh::{Shape, Transform};
use crate::scene::{Node, Prefab};
use crate::ui::Color;

pub const POSTER_TITLE: &str = "Yellow Peril Supports Black Power";
pub const EXCLUSION_ACT_TITLE: &str = "Chinese Exclusion Act";
pub const LION_DANCE_TITLE: &str = "Lion Dance Mask";
pub const VINCENT_CHIN_TITLE: &str = "Who Killed Vincent Chin News Article";
pub const RAILROAD_TITLE: &str = "Transcontinental Railroad Workers";

pub const POSTER_TEXT: &str = include_str!("descriptions/yellow_peril.txt");
pub const EXCLUSION_ACT_TEXT: &str = include_str!("descriptions/exclusion_act.txt");
pub const LION_DANCE_TEXT: &str = include_str!("descriptions/lion_dance.txt");
pub const VINCENT_CHIN_TEXT: &str = include_str!("descriptions/vincent_chin.txt");
pub const RAILROAD_TEXT: &str = include_str!("descriptions/railroad_workers.txt");

fn part(shape: Shape, color: Color, position: Vec3) -> Prefab {
    Prefab::new(Node::new(Transform::from_position(position)).with_visual(Visual::new(shape, color)))
}

/// A single flat textured sheet.
fn sheet(width: f32, height: f32, thickness: f32, texture: TextureId) -> Prefab {
    Prefab::new(Node::new(Transform::new()).with_visual(Visual::with_texture(
        Shape::cuboid(width, height, thickness),
        Color::WHITE,
        texture,
    )))
}

pub fn protest_poster(library: &mut ArtworkLibrary) -> Artifact {
    let texture = library.add("poster", artwork::protest_poster(11));
    Artifact::new(
        sheet(1.0, 1.25, 0.03, texture),
        ArtifactMetadata::new(POSTER_TITLE, POSTER_TEXT, true, "#f4ce26"),
    )
}

pub fn exclusion_act_paper(library: &mut ArtworkLibrary) -> Artifact {
    let texture = library.add("exclusion act", artwork::typed_document(1882));
    Artifact::new(
        sheet(0.9, 1.26, 0.01, texture),
        ArtifactMetadata::new(EXCLUSION_ACT_TITLE, EXCLUSION_ACT_TEXT, true, "#e8d6ac"),
    )
}

pub fn vincent_chin_article(library: &mut ArtworkLibrary) -> Artifact {
    let texture = library.add("vincent chin article", artwork::newspaper(1982));
    Artifact::new(
        sheet(0.9, 1.2, 0.01, texture),
        ArtifactMetadata::new(VINCENT_CHIN_TITLE, VINCENT_CHIN_TEXT, true, "#dedcd2"),
    )
}

/// Southern lion head: scaled head, nested eye group, horn, mirror, mouth, beard.
pub fn lion_dance_mask(library: &mut ArtworkLibrary) -> Artifact {
    let scales = library.add("lion scales", artwork::lion_scales(8));
    let gold = Color::hex(0xe8b628);

    let head = Prefab::new(
        Node::new(Transform::new().scale(Vec3::new(1.0, 0.85, 0.9)))
            .with_visual(Visual::with_texture(Shape::sphere(0.45), Color::WHITE, scales)),
    );
    let eye = |x: f32| {
        part(Shape::sphere(0.09), Color::WHITE, Vec3::new(x, 0.0, 0.0))
            .with_child(part(Shape::sphere(0.04), Color::BLACK, Vec3::new(0.0, 0.0, 0.07)))
    };
    let eyes = Prefab::group(
        Transform::from_position(Vec3::new(0.0, 0.12, 0.36)),
        vec![eye(-0.17), eye(0.17)],
    );
    let horn = Prefab::new(
        Node::new(
            Transform::from_position(Vec3::new(0.0, 0.42, 0.08))
                .rotation(Quat::from_rotation_x(-0.4)),
        )
        .with_visual(Visual::new(Shape::cylinder(0.05, 0.24), gold)),
    );
    let mirror = part(Shape::sphere(0.05), Color::hex(0xd8dde2), Vec3::new(0.0, 0.28, 0.34));
    let mouth = part(Shape::cuboid(0.5, 0.12, 0.22), Color::hex(0x7a0e14), Vec3::new(0.0, -0.2, 0.3));
    let beard = part(Shape::cuboid(0.32, 0.16, 0.05), Color::WHITE, Vec3::new(0.0, -0.34, 0.32));

    Artifact::new(
        Prefab::group(Transform::new(), vec![head, eyes, horn, mirror, mouth, beard]),
        ArtifactMetadata::new(LION_DANCE_TITLE, LION_DANCE_TEXT, false, "#c41e24"),
    )
}

/// Three workers standing on a short stretch of track.
pub fn railroad_figurines(library: &mut ArtworkLibrary) -> Artifact {
    let wood = library.add("railroad ties", artwork::wood_grain(1869));
    let iron = Color::hex(0x4a4a50);

    let ties = Prefab::new(
        Node::new(Transform::from_position(Vec3::new(0.0, -0.42, 0.0)))
            .with_visual(Visual::with_texture(Shape::cuboid(1.2, 0.06, 0.5), Color::WHITE, wood)),
    );
    let rail = |z: f32| part(Shape::cuboid(1.2, 0.04, 0.04), iron, Vec3::new(0.0, -0.37, z));

    let figure = |x: f32, tunic: u32| {
        Prefab::group(
            Transform::from_position(Vec3::new(x, -0.1, 0.0)),
            vec![
                part(Shape::cylinder(0.09, 0.5), Color::hex(tunic), Vec3::ZERO),
                part(Shape::sphere(0.08), Color::hex(0xd9a877), Vec3::new(0.0, 0.33, 0.0)),
                part(Shape::cylinder(0.15, 0.03), Color::hex(0xc9b27a), Vec3::new(0.0, 0.41, 0.0)),
            ],
        )
    };

    Artifact::new(
        Prefab::group(
            Transform::new(),
            vec![
                ties,
                rail(-0.15),
                rail(0.15),
                figure(-0.35, 0x2f4a6d),
                figure(0.0, 0x5b3a29),
                figure(0.35, 0x3d5a40),
            ],
        ),
        ArtifactMetadata::new(RAILROAD_TITLE, RAILROAD_TEXT, false, "#5b3a29"),
    )
}

/// Unlabeled stand-in block. Clickable but carries no metadata.
pub fn placeholder_block() -> Prefab {
    part(Shape::cuboid(0.6, 0.6, 0.6), Color::hex(0x8a8580), Vec3::ZERO)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn all(library: &mut ArtworkLibrary) -> Vec<Artifact> {
        vec![
            protest_poster(library),
            exclusion_act_paper(library),
            lion_dance_mask(library),
            vincent_chin_article(library),
            railroad_figurines(library),
        ]
    }

    #[test]
    fn titles_are_unique_and_non_empty() {
        let mut library = ArtworkLibrary::new();
        let artifacts = all(&mut library);
        let mut titles: Vec<&str> = artifacts.iter().map(Artifact::title).collect();
        assert!(titles.iter().all(|t| !t.is_empty()));
        titles.sort();
        titles.dedup();
        assert_eq!(titles.len(), 5);
    }

    #[test]
    fn each_artifact_has_one_metadata_node() {
        let mut library = ArtworkLibrary::new();
        for artifact in all(&mut library) {
            assert_eq!(artifact.object.metadata_count(), 0);
            assert_eq!(artifact.into_prefab().metadata_count(), 1);
        }
        assert_eq!(placeholder_block().metadata_count(), 0);
    }

    #[test]
    fn paper_flag_matches_kind() {
        let mut library = ArtworkLibrary::new();
        assert!(exclusion_act_paper(&mut library).metadata.is_floating_paper);
        assert!(vincent_chin_article(&mut library).metadata.is_floating_paper);
        assert!(!lion_dance_mask(&mut library).metadata.is_floating_paper);
        assert!(!railroad_figurines(&mut library).metadata.is_floating_paper);
    }

    #[test]
    fn groups_are_composite() {
        let mut library = ArtworkLibrary::new();
        let mask = lion_dance_mask(&mut library).object;
        assert!(mask.node.visual.is_none());
        assert!(mask.depth() >= 3);
        let railroad = railroad_figurines(&mut library).object;
        assert_eq!(railroad.children.len(), 6);
    }

    #[test]
    fn descriptions_are_loaded() {
        for text in [POSTER_TEXT, EXCLUSION_ACT_TEXT, LION_DANCE_TEXT, VINCENT_CHIN_TEXT, RAILROAD_TEXT] {
            assert!(text.len() > 100);
        }
        assert!(EXCLUSION_ACT_TEXT.contains("1882"));
    }

    #[test]
    fn textures_are_registered() {
        let mut library = ArtworkLibrary::new();
        let artifact = exclusion_act_paper(&mut library);
        let id = artifact.object.node.visual.unwrap().texture.unwrap();
        assert_eq!(library.label(id), Some("exclusion act"));
    }
}
