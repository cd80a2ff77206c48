//! Obstacle layouts: what grows on a tile.

use glam::Vec2;

use crate::config::ForestConfig;
use crate::grid::TileCoord;

/// A tree site in tile-local coordinates.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TreeSite {
    /// Offset from the tile's anchor corner, inside the unit square.
    pub offset: Vec2,
    /// Uniform scale for the trunk.
    pub scale: f32,
}

/// Source of obstacle sites for a tile.
///
/// The grid treats layouts as opaque; anything deterministic per coordinate
/// works, and tests substitute fixed layouts through this seam.
pub trait ObstacleLayout {
    fn sites(&self, coord: TileCoord) -> Vec<TreeSite>;
}

/// Hash-seeded forest. The same coordinate and seed always grow the same
/// trees, so a tile that scrolls out of residency and back in looks
/// unchanged.
#[derive(Debug, Clone)]
pub struct SeededForest {
    config: ForestConfig,
}

impl SeededForest {
    pub fn new(config: ForestConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &ForestConfig {
        &self.config
    }
}

impl ObstacleLayout for SeededForest {
    fn sites(&self, coord: TileCoord) -> Vec<TreeSite> {
        let cfg = &self.config;
        let mut state = splitmix64(
            cfg.seed
                ^ (coord.x as i64 as u64).wrapping_mul(0x9e37_79b9_7f4a_7c15)
                ^ (coord.z as i64 as u64).wrapping_mul(0xc2b2_ae3d_27d4_eb4f),
        );

        let spread = u64::from(cfg.trees_max.saturating_sub(cfg.trees_min)) + 1;
        state = splitmix64(state);
        let count = cfg.trees_min + (state % spread) as u32;

        let span = (1.0 - 2.0 * cfg.edge_margin).max(0.0);
        let mut sites = Vec::with_capacity(count as usize);
        for _ in 0..count {
            state = splitmix64(state);
            let x = cfg.edge_margin + unit_f32(state) * span;
            state = splitmix64(state);
            let z = cfg.edge_margin + unit_f32(state) * span;
            state = splitmix64(state);
            let jitter = 1.0 + cfg.size_variation * (2.0 * unit_f32(state) - 1.0);
            sites.push(TreeSite {
                offset: Vec2::new(x, z),
                scale: cfg.trunk_scale * jitter,
            });
        }
        sites
    }
}

/// splitmix64 mix; stable across platforms.
fn splitmix64(mut state: u64) -> u64 {
    state = state.wrapping_add(0x9e37_79b9_7f4a_7c15);
    let mut z = state;
    z = (z ^ (z >> 30)).wrapping_mul(0xbf58_476d_1ce4_e5b9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94d0_49bb_1331_11eb);
    z ^ (z >> 31)
}

/// Map the high bits of a hash to [0, 1).
fn unit_f32(hash: u64) -> f32 {
    (hash >> 40) as f32 / (1u64 << 24) as f32
}

#[cfg(test)]
mod tests {
    use super::*;

    fn forest() -> SeededForest {
        SeededForest::new(ForestConfig::default())
    }

    #[test]
    fn same_coordinate_grows_the_same_trees() {
        let a = forest().sites(TileCoord::new(3, -7));
        let b = forest().sites(TileCoord::new(3, -7));
        assert_eq!(a, b);
    }

    #[test]
    fn neighboring_coordinates_differ() {
        let here = forest().sites(TileCoord::new(0, 0));
        let there = forest().sites(TileCoord::new(1, 0));
        assert_ne!(here, there);
    }

    #[test]
    fn seed_changes_the_layout() {
        let a = forest().sites(TileCoord::new(5, 5));
        let reseeded = SeededForest::new(ForestConfig {
            seed: 43,
            ..ForestConfig::default()
        });
        assert_ne!(a, reseeded.sites(TileCoord::new(5, 5)));
    }

    #[test]
    fn tree_count_stays_within_bounds() {
        let cfg = ForestConfig::default();
        for x in -4..4 {
            for z in -4..4 {
                let count = forest().sites(TileCoord::new(x, z)).len() as u32;
                assert!(count >= cfg.trees_min && count <= cfg.trees_max);
            }
        }
    }

    #[test]
    fn sites_keep_the_edge_margin() {
        let cfg = ForestConfig::default();
        for x in -4..4 {
            for z in -4..4 {
                for site in forest().sites(TileCoord::new(x, z)) {
                    assert!(site.offset.x >= cfg.edge_margin - 1e-6);
                    assert!(site.offset.x <= 1.0 - cfg.edge_margin + 1e-6);
                    assert!(site.offset.y >= cfg.edge_margin - 1e-6);
                    assert!(site.offset.y <= 1.0 - cfg.edge_margin + 1e-6);
                    assert!(site.scale > 0.0);
                }
            }
        }
    }

    #[test]
    fn fixed_tree_count_collapses_the_range() {
        let pinned = SeededForest::new(ForestConfig {
            trees_min: 3,
            trees_max: 3,
            ..ForestConfig::default()
        });
        for x in -2..2 {
            assert_eq!(pinned.sites(TileCoord::new(x, 0)).len(), 3);
        }
    }
}
