//! The walking world: a 3x3 toroidal window of ground tiles kept resident
//! around the player, with collision-gated movement and knockback.
//!
//! # Invariants
//! - Exactly nine tiles are resident at all times, one per toroidal slot.
//! - A blocked step never leaves the player inside an obstacle; the exact
//!   pre-step position is restored.
//! - Tile layouts are a pure function of coordinate and seed, so a tile that
//!   scrolls out and back in regrows identically.

pub mod config;
pub mod grid;
pub mod player;
pub mod scenery;
pub mod tile;

pub use config::{ConfigError, ForestConfig, WorldConfig};
pub use grid::{slot_coord, tile_slot, EntityKind, GridStats, TileCoord, WorldGrid};
pub use player::{Direction, Player, RecoilState, VerticalSpan};
pub use scenery::{ObstacleLayout, SeededForest, TreeSite};
pub use tile::{Obstacle, WorldTile, TRUNK_HEIGHT, TRUNK_RADIUS};
