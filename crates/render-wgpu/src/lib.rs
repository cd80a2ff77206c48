//! wgpu render backend for the walking world.
//!
//! Draws the resident tiles, trees, and player as instanced cubes, terrain
//! meshes as height-tinted triangle lists, and the axes gizmo as lines.
//! Lighting follows the day cycle.
//!
//! # Invariants
//! - The renderer never mutates grid state; it reads and draws.
//! - Terrain GPU residency belongs to the caller: meshes are uploaded into
//!   [`TerrainBuffers`] explicitly, never implicitly per frame.

mod camera;
mod daylight;
mod gpu;
mod shaders;
mod timing;

pub use camera::FollowCamera;
pub use daylight::DayCycle;
pub use gpu::{TerrainBuffers, WgpuRenderer};
pub use timing::FrameTimer;
