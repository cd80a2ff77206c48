use tilescroll_scene::NodeId;
use tilescroll_world::{EntityKind, WorldGrid};

/// World inspector for developer tooling.
///
/// Provides read-only queries against the grid state for debugging and
/// development UI.
pub struct WorldInspector;

impl WorldInspector {
    /// Produce a summary of the grid state.
    pub fn summary(world: &WorldGrid) -> WorldSummary {
        let position = world.player_position();
        let stats = world.stats();
        WorldSummary {
            center: (world.center().x, world.center().z),
            tiles: world
                .tiles()
                .iter()
                .map(|tile| (tile.coord().x, tile.coord().z))
                .collect(),
            player_position: [position.x, position.y, position.z],
            nodes: world.scene().len(),
            trees: Self::list_by_kind(world, EntityKind::Tree).len(),
            tiles_placed: stats.tiles_placed,
            collisions: stats.collisions,
            recenters: stats.recenters,
            recoil_active: world.recoil().is_active(),
        }
    }

    /// Describe a single scene node, if it is still alive.
    pub fn inspect_node(world: &WorldGrid, id: NodeId) -> Option<NodeInfo> {
        world.scene().get(id).map(|node| {
            let position = world.scene().world_matrix(id).w_axis.truncate();
            NodeInfo {
                id,
                kind: world.kinds().get(&id).copied(),
                position: [position.x, position.y, position.z],
                hidden: node.is_hidden(),
            }
        })
    }

    /// List all node ids registered with the given kind.
    pub fn list_by_kind(world: &WorldGrid, kind: EntityKind) -> Vec<NodeId> {
        world
            .kinds()
            .iter()
            .filter(|(_, k)| **k == kind)
            .map(|(id, _)| *id)
            .collect()
    }
}

/// Summary of grid state for the inspector.
#[derive(Debug, Clone)]
pub struct WorldSummary {
    pub center: (i32, i32),
    /// Coordinates of the nine resident tiles, in slot order.
    pub tiles: Vec<(i32, i32)>,
    pub player_position: [f32; 3],
    pub nodes: usize,
    pub trees: usize,
    pub tiles_placed: u64,
    pub collisions: u64,
    pub recenters: u64,
    pub recoil_active: bool,
}

impl std::fmt::Display for WorldSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "World: center=({}, {}) player=({:.2}, {:.2}, {:.2}) nodes={} trees={} \
             placed={} collisions={} recenters={}{}",
            self.center.0,
            self.center.1,
            self.player_position[0],
            self.player_position[1],
            self.player_position[2],
            self.nodes,
            self.trees,
            self.tiles_placed,
            self.collisions,
            self.recenters,
            if self.recoil_active { " (recoiling)" } else { "" },
        )
    }
}

/// Detailed info about a single scene node.
#[derive(Debug, Clone)]
pub struct NodeInfo {
    pub id: NodeId,
    pub kind: Option<EntityKind>,
    pub position: [f32; 3],
    pub hidden: bool,
}

impl std::fmt::Display for NodeInfo {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Node [{}] kind={} pos=({:.2}, {:.2}, {:.2}){}",
            self.id.0,
            match self.kind {
                Some(kind) => format!("{kind:?}"),
                None => "?".to_string(),
            },
            self.position[0],
            self.position[1],
            self.position[2],
            if self.hidden { " hidden" } else { "" },
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tilescroll_world::{Direction, ObstacleLayout, TileCoord, TreeSite, WorldConfig};

    const VIEW: glam::Vec3 = glam::Vec3::new(0.0, 0.0, -1.0);

    struct OpenGround;

    impl ObstacleLayout for OpenGround {
        fn sites(&self, _coord: TileCoord) -> Vec<TreeSite> {
            Vec::new()
        }
    }

    #[test]
    fn summary_counts_the_fresh_world() {
        let world = WorldGrid::new(WorldConfig::default());
        let summary = WorldInspector::summary(&world);
        assert_eq!(summary.center, (0, 0));
        assert_eq!(summary.tiles_placed, 9);
        assert_eq!(summary.collisions, 0);
        assert_eq!(summary.trees, WorldInspector::list_by_kind(&world, EntityKind::Tree).len());
        // root + player + axes + 9 quads + one node per tree
        assert_eq!(summary.nodes, 3 + 9 + summary.trees);
        assert_eq!(summary.tiles.len(), 9);
        assert!(summary.tiles.contains(&(0, 0)));
        assert!(summary.tiles.contains(&(-1, -1)));
        assert!(summary.tiles.contains(&(1, 1)));
    }

    #[test]
    fn summary_tracks_movement() {
        let mut world = WorldGrid::with_layout(WorldConfig::default(), Box::new(OpenGround));
        world.move_player(Direction::Back, VIEW, glam::Vec3::Y, 1.2);
        let summary = WorldInspector::summary(&world);
        assert_eq!(summary.center, (0, 1));
        assert_eq!(summary.recenters, 1);
        assert!(summary.player_position[2] > 1.0);
    }

    #[test]
    fn inspect_node_reports_kind_and_position() {
        let world = WorldGrid::new(WorldConfig::default());
        let tile = &world.tiles()[0];
        let info = WorldInspector::inspect_node(&world, tile.node()).unwrap();
        assert_eq!(info.kind, Some(EntityKind::Tile));
        assert_eq!(info.position[0], tile.coord().x as f32);
        assert_eq!(info.position[2], tile.coord().z as f32);
    }

    #[test]
    fn inspect_node_missing_id() {
        let world = WorldGrid::new(WorldConfig::default());
        assert!(WorldInspector::inspect_node(&world, NodeId(9_999)).is_none());
    }

    #[test]
    fn list_by_kind_finds_the_player() {
        let world = WorldGrid::new(WorldConfig::default());
        let players = WorldInspector::list_by_kind(&world, EntityKind::Player);
        assert_eq!(players, vec![world.player().node()]);
    }

    #[test]
    fn summary_display_is_one_line() {
        let world = WorldGrid::new(WorldConfig::default());
        let line = format!("{}", WorldInspector::summary(&world));
        assert!(line.contains("center=(0, 0)"));
        assert!(!line.contains('\n'));
    }
}
