//! Scene graph for the tile world: transform nodes, draw-mode tags, and
//! ground-plane hit boxes.
//!
//! # Invariants
//! - World matrices are recomputed from the matrix stack on every query;
//!   nothing here caches derived transforms.
//! - Parents are inserted before their children and outlive them; parent
//!   links are plain ids, never owning references.

pub mod hitbox;
pub mod node;

pub use hitbox::HitBox2d;
pub use node::{DrawMode, NodeId, SceneGraph, TransformNode};
