//! Scene graphs for the gallery and the popup preview.
//!
//! # Overview
//!
//! The museum runs two fully independent scenes: the gallery room and the
//! isolated preview shown inside the artifact popup. Each is a [`SceneGraph`]
//! backed by its own `hecs::World`, so entities, transforms and hierarchy never
//! leak between them.
//!
//! Moving content between scenes goes through [`Prefab`], a plain-data snapshot
//! of a subtree. [`SceneGraph::extract`] captures a subtree and
//! [`SceneGraph::instantiate`] spawns a fresh copy, which is how the popup gets
//! a deep clone of the clicked artifact:
//!
//! ```
//! use vitrine::{Node, SceneGraph, Transform, Vec3};
//!
//! let mut gallery = SceneGraph::new();
//! let original = gallery.spawn(Node::new(Transform::from_position(Vec3::X)));
//!
//! let mut preview = SceneGraph::new();
//! let prefab = gallery.extract(original).unwrap();
//! let copy = preview.instantiate(&prefab);
//!
//! preview.transform_mut(copy).unwrap().position = Vec3::ZERO;
//! assert_eq!(gallery.transform(original).unwrap().position, Vec3::X);
//! ```

mod graph;
mod prefab;

pub use graph::SceneGraph;
pub use prefab::{Node, Prefab};
