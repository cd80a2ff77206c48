//! A resident ground tile and the obstacles standing on it.

use glam::Vec3;
use tilescroll_scene::{DrawMode, HitBox2d, NodeId, SceneGraph, TransformNode};

use crate::grid::TileCoord;
use crate::player::VerticalSpan;
use crate::scenery::TreeSite;

/// Trunk hull half-width on the ground plane, before per-site scale.
pub const TRUNK_RADIUS: f32 = 0.15;
/// Trunk hull height, before per-site scale.
pub const TRUNK_HEIGHT: f32 = 1.2;

/// Corner-anchored unit ground quad at y = 0.
pub fn tile_quad() -> Vec<Vec3> {
    vec![
        Vec3::new(0.0, 0.0, 0.0),
        Vec3::new(1.0, 0.0, 0.0),
        Vec3::new(1.0, 0.0, 1.0),
        Vec3::new(0.0, 0.0, 1.0),
    ]
}

/// Up-facing triangles for [`tile_quad`], wound counter-clockwise seen from
/// above.
pub fn tile_indices() -> Vec<u32> {
    vec![0, 2, 1, 0, 3, 2]
}

/// Trunk hull: a thin box rooted at y = 0.
pub fn trunk_hull() -> Vec<Vec3> {
    let r = TRUNK_RADIUS;
    let h = TRUNK_HEIGHT;
    vec![
        Vec3::new(-r, 0.0, -r),
        Vec3::new(r, 0.0, -r),
        Vec3::new(r, 0.0, r),
        Vec3::new(-r, 0.0, r),
        Vec3::new(-r, h, -r),
        Vec3::new(r, h, -r),
        Vec3::new(r, h, r),
        Vec3::new(-r, h, r),
    ]
}

/// A placed tree: its scene node and cached ground-plane hit box.
#[derive(Debug, Clone, Copy)]
pub struct Obstacle {
    pub node: NodeId,
    pub hit_box: HitBox2d,
}

/// One resident ground tile: a quad node plus the trees standing on it.
pub struct WorldTile {
    coord: TileCoord,
    node: NodeId,
    obstacles: Vec<Obstacle>,
}

impl WorldTile {
    /// Build the tile at `coord` under `root`: the ground quad, then one tree
    /// per site. A site whose hull would overlap `player_box` is dropped; a
    /// freshly placed tile must never trap the player.
    pub fn spawn(
        scene: &mut SceneGraph,
        root: NodeId,
        coord: TileCoord,
        sites: &[TreeSite],
        player_box: &HitBox2d,
        player_span: VerticalSpan,
    ) -> Self {
        let mut quad = TransformNode::new(Some(root));
        quad.set_draw_mode(DrawMode::Triangles);
        quad.set_position(Vec3::new(coord.x as f32, 0.0, coord.z as f32));
        let node = scene.insert(quad);

        let hull = trunk_hull();
        let mut obstacles = Vec::with_capacity(sites.len());
        let mut skipped = 0usize;
        for site in sites {
            // Trunks always reach past the player's slab, whatever the
            // jittered scale says.
            let scale = site.scale.max(player_span.max_y / TRUNK_HEIGHT);
            let mut tree = TransformNode::new(Some(node));
            tree.set_draw_mode(DrawMode::Triangles);
            tree.set_position(Vec3::new(site.offset.x, 0.0, site.offset.y));
            tree.scale(scale);
            let tree_node = scene.insert(tree);

            let hit_box = HitBox2d::from_points(&scene.world_matrix(tree_node), &hull);
            if hit_box.intersects(player_box) {
                scene.remove_subtree(tree_node);
                skipped += 1;
                continue;
            }
            obstacles.push(Obstacle {
                node: tree_node,
                hit_box,
            });
        }
        if skipped > 0 {
            tracing::debug!(?coord, skipped, "dropped tree sites overlapping the player");
        }

        Self {
            coord,
            node,
            obstacles,
        }
    }

    pub fn coord(&self) -> TileCoord {
        self.coord
    }

    pub fn node(&self) -> NodeId {
        self.node
    }

    pub fn obstacles(&self) -> &[Obstacle] {
        &self.obstacles
    }

    /// True when any obstacle on this tile intersects `hit_box`.
    pub fn collides_with(&self, hit_box: &HitBox2d) -> bool {
        self.obstacles.iter().any(|o| o.hit_box.intersects(hit_box))
    }

    /// Remove the tile's whole scene subtree. Consumes the tile, so each
    /// placement is released exactly once.
    pub fn despawn(self, scene: &mut SceneGraph) {
        scene.remove_subtree(self.node);
    }
}
