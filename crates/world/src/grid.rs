//! The 3x3 toroidal residency window and the movement protocol.
//!
//! # Invariants
//! - Exactly nine tiles are resident after construction and after every
//!   recenter, one per toroidal slot.
//! - A blocked step restores the exact pre-step position; the window center
//!   never moves on a collision.
//! - Recentering steps the center at most one tile per axis per call.

use std::collections::BTreeMap;

use glam::{Mat4, Vec3};
use tilescroll_scene::{DrawMode, HitBox2d, NodeId, SceneGraph, TransformNode};

use crate::config::WorldConfig;
use crate::player::{Direction, Player, RecoilState, VerticalSpan};
use crate::scenery::{ObstacleLayout, SeededForest};
use crate::tile::WorldTile;

/// Integer coordinate of a ground tile; tile (x, z) covers the unit square
/// [x, x+1) by [z, z+1).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct TileCoord {
    pub x: i32,
    pub z: i32,
}

impl TileCoord {
    pub fn new(x: i32, z: i32) -> Self {
        Self { x, z }
    }

    /// Tile containing a ground position.
    pub fn containing(x: f32, z: f32) -> Self {
        Self {
            x: x.floor() as i32,
            z: z.floor() as i32,
        }
    }
}

/// Toroidal slot of a coordinate in the nine-element residency array.
pub fn tile_slot(coord: TileCoord) -> usize {
    (coord.z.rem_euclid(3) * 3 + coord.x.rem_euclid(3)) as usize
}

/// Inverse of [`tile_slot`] within the 3x3 neighborhood of `center`. Every
/// slot matches exactly one neighbor.
pub fn slot_coord(slot: usize, center: TileCoord) -> TileCoord {
    for z in center.z - 1..=center.z + 1 {
        for x in center.x - 1..=center.x + 1 {
            let coord = TileCoord::new(x, z);
            if tile_slot(coord) == slot {
                return coord;
            }
        }
    }
    unreachable!("slot {slot} has no coordinate near {center:?}");
}

/// What a scene node stands for, for rendering and inspection.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    Tile,
    Tree,
    Player,
    Axes,
}

/// Counters accumulated over the life of a grid.
#[derive(Debug, Clone, Copy, Default)]
pub struct GridStats {
    pub tiles_placed: u64,
    pub collisions: u64,
    pub recoil_frames: u64,
    pub recenters: u64,
}

/// The walking world: scene graph, player, and the nine resident tiles.
pub struct WorldGrid {
    scene: SceneGraph,
    root: NodeId,
    axes: NodeId,
    /// Dense storage indexed by [`tile_slot`]; always nine entries.
    tiles: Vec<WorldTile>,
    center: TileCoord,
    player: Player,
    player_span: VerticalSpan,
    recoil: RecoilState,
    kinds: BTreeMap<NodeId, EntityKind>,
    layout: Box<dyn ObstacleLayout>,
    config: WorldConfig,
    stats: GridStats,
}

impl WorldGrid {
    /// Build the starting world with the default seeded forest.
    pub fn new(config: WorldConfig) -> Self {
        let layout = Box::new(SeededForest::new(config.forest.clone()));
        Self::with_layout(config, layout)
    }

    /// Build the starting world with a caller-chosen obstacle layout: the
    /// player over its configured start, nine tiles around the containing
    /// coordinate.
    pub fn with_layout(config: WorldConfig, layout: Box<dyn ObstacleLayout>) -> Self {
        let _span = tracing::info_span!("world_spawn").entered();
        let mut scene = SceneGraph::new();
        let root = scene.insert(TransformNode::new(None));

        let center = TileCoord::containing(config.player_start[0], config.player_start[1]);
        let player = Player::spawn(&mut scene, root, config.player_scale);
        player.set_position(
            &mut scene,
            Vec3::new(center.x as f32, config.hover_height, center.z as f32),
        );
        let player_span = player.vertical_span(&scene);
        let player_box = player.hit_box(&scene);

        let axes = spawn_axes(&mut scene, root);

        let mut kinds = BTreeMap::new();
        kinds.insert(player.node(), EntityKind::Player);
        kinds.insert(axes, EntityKind::Axes);

        let mut grid = Self {
            scene,
            root,
            axes,
            tiles: Vec::with_capacity(9),
            center,
            player,
            player_span,
            recoil: RecoilState::new(config.recoil_frames),
            kinds,
            layout,
            config,
            stats: GridStats::default(),
        };
        for slot in 0..9 {
            let coord = slot_coord(slot, center);
            let tile = grid.build_tile(coord, &player_box);
            grid.tiles.push(tile);
        }
        tracing::info!(?center, "world grid spawned");
        grid
    }

    /// One directional step through the collision protocol. Cardinal steps
    /// are dropped while a knockback is in flight; diagonals never are.
    pub fn move_player(&mut self, direction: Direction, view: Vec3, up: Vec3, units: f32) {
        if direction.is_cardinal() && self.recoil.is_active() {
            return;
        }
        let snapshot = self.player.position(&self.scene);
        let step = direction.ground_vector(view, up);
        self.player.step(&mut self.scene, step, units);

        let moved_box = self.player.hit_box(&self.scene);
        if self.collides(&moved_box) {
            self.player.set_position(&mut self.scene, snapshot);
            self.stats.collisions += 1;
            if direction.is_cardinal() {
                self.recoil.engage(direction);
            }
            tracing::debug!(?direction, "step blocked");
        } else {
            self.check_position();
        }
    }

    /// Per-frame knockback pump. While a knockback is in flight the player
    /// slides opposite the blocked direction; returns whether that happened,
    /// in which case directional input should be dropped this frame.
    pub fn poll_recoil(&mut self, view: Vec3, up: Vec3, units: f32) -> bool {
        let Some(bounce) = self.recoil.tick() else {
            return false;
        };
        let step = bounce.ground_vector(view, up);
        self.player.step(&mut self.scene, step, units);
        self.stats.recoil_frames += 1;
        true
    }

    /// Re-center the residency window once the player has crossed into a
    /// neighboring tile. Steps at most one tile per axis per call.
    pub fn check_position(&mut self) {
        let position = self.player.position(&self.scene);
        let here = TileCoord::containing(position.x, position.z);
        let diff_x = (here.x - self.center.x).clamp(-1, 1);
        let diff_z = (here.z - self.center.z).clamp(-1, 1);
        if diff_x == 0 && diff_z == 0 {
            return;
        }

        let _span = tracing::info_span!("recenter", diff_x, diff_z).entered();
        let player_box = self.player.hit_box(&self.scene);

        if diff_x != 0 {
            let column = self.center.x + 2 * diff_x;
            for z in self.center.z - 1..=self.center.z + 1 {
                self.place_tile(TileCoord::new(column, z), &player_box);
            }
            self.center.x += diff_x;
        }
        if diff_z != 0 {
            let row = self.center.z + 2 * diff_z;
            for x in self.center.x - 1..=self.center.x + 1 {
                self.place_tile(TileCoord::new(x, row), &player_box);
            }
            self.center.z += diff_z;
        }
        self.stats.recenters += 1;
        debug_assert_eq!(self.tiles.len(), 9);
        tracing::debug!(center = ?self.center, "recentered");
    }

    /// True when any resident tile's obstacles intersect `hit_box`.
    pub fn collides(&self, hit_box: &HitBox2d) -> bool {
        self.tiles.iter().any(|tile| tile.collides_with(hit_box))
    }

    pub fn toggle_axes(&mut self) {
        self.scene
            .get_mut(self.axes)
            .expect("axes node alive")
            .toggle_hidden();
    }

    /// Hide or show the player model, for first-person views.
    pub fn set_player_hidden(&mut self, hidden: bool) {
        let node = self
            .scene
            .get_mut(self.player.node())
            .expect("player node alive");
        if hidden {
            node.hide();
        } else {
            node.show();
        }
    }

    pub fn player(&self) -> &Player {
        &self.player
    }

    pub fn player_position(&self) -> Vec3 {
        self.player.position(&self.scene)
    }

    pub fn player_world_matrix(&self) -> Mat4 {
        self.scene.world_matrix(self.player.node())
    }

    pub fn center(&self) -> TileCoord {
        self.center
    }

    pub fn tiles(&self) -> &[WorldTile] {
        &self.tiles
    }

    pub fn scene(&self) -> &SceneGraph {
        &self.scene
    }

    pub fn kinds(&self) -> &BTreeMap<NodeId, EntityKind> {
        &self.kinds
    }

    pub fn axes_node(&self) -> NodeId {
        self.axes
    }

    pub fn recoil(&self) -> &RecoilState {
        &self.recoil
    }

    pub fn config(&self) -> &WorldConfig {
        &self.config
    }

    pub fn stats(&self) -> GridStats {
        self.stats
    }

    fn build_tile(&mut self, coord: TileCoord, player_box: &HitBox2d) -> WorldTile {
        let sites = self.layout.sites(coord);
        let tile = WorldTile::spawn(
            &mut self.scene,
            self.root,
            coord,
            &sites,
            player_box,
            self.player_span,
        );
        self.kinds.insert(tile.node(), EntityKind::Tile);
        for obstacle in tile.obstacles() {
            self.kinds.insert(obstacle.node, EntityKind::Tree);
        }
        self.stats.tiles_placed += 1;
        tile
    }

    /// Replace whatever occupies `coord`'s slot with a fresh tile there.
    fn place_tile(&mut self, coord: TileCoord, player_box: &HitBox2d) {
        let slot = tile_slot(coord);
        let fresh = self.build_tile(coord, player_box);
        let old = std::mem::replace(&mut self.tiles[slot], fresh);
        tracing::debug!(from = ?old.coord(), to = ?coord, slot, "replaced tile");
        self.forget_tile(&old);
        old.despawn(&mut self.scene);
    }

    fn forget_tile(&mut self, tile: &WorldTile) {
        self.kinds.remove(&tile.node());
        for obstacle in tile.obstacles() {
            self.kinds.remove(&obstacle.node);
        }
    }
}

/// Axes gizmo anchor at the world origin, hidden until toggled.
fn spawn_axes(scene: &mut SceneGraph, root: NodeId) -> NodeId {
    let mut node = TransformNode::new(Some(root));
    node.set_draw_mode(DrawMode::Lines);
    node.hide();
    scene.insert(node)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scenery::TreeSite;
    use glam::Vec2;
    use std::collections::{HashMap, HashSet};

    const VIEW: Vec3 = Vec3::new(0.0, 0.0, -1.0);

    /// No trees anywhere; movement tests need open ground.
    struct BareGround;

    impl ObstacleLayout for BareGround {
        fn sites(&self, _coord: TileCoord) -> Vec<TreeSite> {
            Vec::new()
        }
    }

    /// One tree at a fixed tile-local offset on every tile.
    struct TreeEverywhere(Vec2);

    impl ObstacleLayout for TreeEverywhere {
        fn sites(&self, _coord: TileCoord) -> Vec<TreeSite> {
            vec![TreeSite {
                offset: self.0,
                scale: 1.0,
            }]
        }
    }

    fn open_world() -> WorldGrid {
        WorldGrid::with_layout(WorldConfig::default(), Box::new(BareGround))
    }

    fn resident_coords(world: &WorldGrid) -> HashSet<(i32, i32)> {
        world
            .tiles()
            .iter()
            .map(|tile| (tile.coord().x, tile.coord().z))
            .collect()
    }

    fn resident_nodes(world: &WorldGrid) -> HashMap<(i32, i32), NodeId> {
        world
            .tiles()
            .iter()
            .map(|tile| ((tile.coord().x, tile.coord().z), tile.node()))
            .collect()
    }

    fn block(
        xs: std::ops::RangeInclusive<i32>,
        zs: std::ops::RangeInclusive<i32>,
    ) -> HashSet<(i32, i32)> {
        let mut coords = HashSet::new();
        for z in zs {
            for x in xs.clone() {
                coords.insert((x, z));
            }
        }
        coords
    }

    #[test]
    fn slots_repeat_every_three_tiles() {
        for x in -7..=7 {
            for z in -7..=7 {
                let here = tile_slot(TileCoord::new(x, z));
                assert!(here < 9);
                assert_eq!(here, tile_slot(TileCoord::new(x + 3, z)));
                assert_eq!(here, tile_slot(TileCoord::new(x, z - 3)));
                assert_eq!(here, tile_slot(TileCoord::new(x - 6, z + 9)));
            }
        }
    }

    #[test]
    fn slot_coord_inverts_tile_slot_around_any_center() {
        for center in [
            TileCoord::new(0, 0),
            TileCoord::new(-5, 3),
            TileCoord::new(17, -29),
            TileCoord::new(-1, -1),
        ] {
            let mut seen = HashSet::new();
            for z in center.z - 1..=center.z + 1 {
                for x in center.x - 1..=center.x + 1 {
                    let coord = TileCoord::new(x, z);
                    let slot = tile_slot(coord);
                    assert_eq!(slot_coord(slot, center), coord);
                    seen.insert(slot);
                }
            }
            assert_eq!(seen.len(), 9);
        }
    }

    #[test]
    fn spawn_places_nine_tiles_around_the_start() {
        let world = open_world();
        assert_eq!(world.tiles().len(), 9);
        assert_eq!(world.center(), TileCoord::new(0, 0));
        assert_eq!(resident_coords(&world), block(-1..=1, -1..=1));
        assert_eq!(world.stats().tiles_placed, 9);
    }

    #[test]
    fn player_spawns_over_the_center_anchor() {
        let world = open_world();
        let position = world.player_position();
        assert_eq!(position, Vec3::new(0.0, 0.01, 0.0));
    }

    #[test]
    fn crossing_an_edge_replaces_one_row() {
        let mut world = open_world();
        let before = resident_nodes(&world);

        world.move_player(Direction::Forward, VIEW, Vec3::Y, 1.2);

        assert_eq!(world.center(), TileCoord::new(0, -1));
        assert_eq!(world.tiles().len(), 9);
        assert_eq!(resident_coords(&world), block(-1..=1, -2..=0));
        assert_eq!(world.stats().tiles_placed, 12);
        assert_eq!(world.stats().recenters, 1);

        let after = resident_nodes(&world);
        for z in -1..=0 {
            for x in -1..=1 {
                assert_eq!(after[&(x, z)], before[&(x, z)], "surviving tile rebuilt");
            }
        }
        for x in -1..=1 {
            assert!(!before.contains_key(&(x, -2)));
        }
    }

    #[test]
    fn diagonal_crossing_replaces_column_then_row() {
        let mut world = open_world();
        world.move_player(Direction::ForwardLeft, VIEW, Vec3::Y, 1.6);

        assert_eq!(world.center(), TileCoord::new(-1, -1));
        assert_eq!(resident_coords(&world), block(-2..=0, -2..=0));
        // Three column placements, three row placements, one of which lands
        // in the slot a column tile just took.
        assert_eq!(world.stats().tiles_placed, 15);
        assert_eq!(world.stats().recenters, 1);
    }

    #[test]
    fn long_walk_keeps_nine_tiles_resident() {
        let mut world = open_world();
        for _ in 0..40 {
            world.move_player(Direction::Back, VIEW, Vec3::Y, 0.35);
            assert_eq!(world.tiles().len(), 9);
            let center = world.center();
            assert_eq!(
                resident_coords(&world),
                block(center.x - 1..=center.x + 1, center.z - 1..=center.z + 1)
            );
        }
        assert!(world.center().z > 2);
    }

    #[test]
    fn blocked_cardinal_step_reverts_exactly() {
        let layout = TreeEverywhere(Vec2::new(0.5, 0.0));
        let mut world = WorldGrid::with_layout(WorldConfig::default(), Box::new(layout));
        let before = world.player_position();
        let center = world.center();

        world.move_player(Direction::Right, VIEW, Vec3::Y, 0.3);

        assert_eq!(world.player_position(), before);
        assert_eq!(world.center(), center);
        assert_eq!(world.stats().collisions, 1);
        assert_eq!(world.stats().recenters, 0);
        assert!(world.recoil().is_active());
    }

    #[test]
    fn blocked_diagonal_reverts_without_recoil() {
        let layout = TreeEverywhere(Vec2::new(0.35, 0.0));
        let mut world = WorldGrid::with_layout(WorldConfig::default(), Box::new(layout));
        let before = world.player_position();

        world.move_player(Direction::ForwardRight, VIEW, Vec3::Y, 0.3);

        assert_eq!(world.player_position(), before);
        assert_eq!(world.stats().collisions, 1);
        assert!(!world.recoil().is_active());
    }

    #[test]
    fn recoil_bounces_back_then_releases_input() {
        let layout = TreeEverywhere(Vec2::new(0.5, 0.0));
        let mut world = WorldGrid::with_layout(WorldConfig::default(), Box::new(layout));
        world.move_player(Direction::Right, VIEW, Vec3::Y, 0.3);
        assert!(world.recoil().is_active());

        // Gated: cardinal input is dropped while the knockback runs.
        let held = world.player_position();
        world.move_player(Direction::Right, VIEW, Vec3::Y, 0.3);
        assert_eq!(world.player_position(), held);

        let frames = world.config().recoil_frames;
        let mut polled = 0;
        while world.poll_recoil(VIEW, Vec3::Y, 0.05) {
            polled += 1;
            assert!(polled <= frames, "knockback never went idle");
        }
        assert_eq!(polled, frames);
        assert!(!world.recoil().is_active());
        assert_eq!(world.stats().recoil_frames, u64::from(frames));

        // Blocked Right, so the bounce drifted left.
        let after = world.player_position();
        assert!(after.x < held.x - 0.3);
    }

    #[test]
    fn diagonals_ignore_the_recoil_gate() {
        let layout = TreeEverywhere(Vec2::new(0.5, 0.0));
        let mut world = WorldGrid::with_layout(WorldConfig::default(), Box::new(layout));
        world.move_player(Direction::Right, VIEW, Vec3::Y, 0.3);
        assert!(world.recoil().is_active());

        let held = world.player_position();
        world.move_player(Direction::BackLeft, VIEW, Vec3::Y, 0.1);
        assert_ne!(world.player_position(), held);
    }

    #[test]
    fn seeded_layouts_rebuild_identically() {
        let a = WorldGrid::new(WorldConfig::default());
        let b = WorldGrid::new(WorldConfig::default());
        for (left, right) in a.tiles().iter().zip(b.tiles().iter()) {
            assert_eq!(left.coord(), right.coord());
            assert_eq!(left.obstacles().len(), right.obstacles().len());
            for (lo, ro) in left.obstacles().iter().zip(right.obstacles().iter()) {
                assert_eq!(lo.hit_box, ro.hit_box);
            }
        }
    }

    #[test]
    fn toggle_axes_flips_visibility() {
        let mut world = open_world();
        let axes = world.axes_node();
        assert!(world.scene().get(axes).unwrap().is_hidden());
        world.toggle_axes();
        assert!(!world.scene().get(axes).unwrap().is_hidden());
        assert_eq!(world.kinds()[&axes], EntityKind::Axes);
    }

    #[test]
    fn kinds_track_tile_replacement() {
        let mut world = open_world();
        let tile_nodes: Vec<NodeId> = world.tiles().iter().map(|t| t.node()).collect();
        world.move_player(Direction::Forward, VIEW, Vec3::Y, 1.2);

        let kinds = world.kinds();
        let tile_count = kinds
            .values()
            .filter(|kind| **kind == EntityKind::Tile)
            .count();
        assert_eq!(tile_count, 9);
        for node in world.tiles().iter().map(|t| t.node()) {
            assert_eq!(kinds[&node], EntityKind::Tile);
        }
        let dropped: Vec<NodeId> = tile_nodes
            .into_iter()
            .filter(|node| !world.tiles().iter().any(|t| t.node() == *node))
            .collect();
        assert_eq!(dropped.len(), 3);
        for node in dropped {
            assert!(!kinds.contains_key(&node));
        }
    }
}
