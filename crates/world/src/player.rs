//! The player avatar and the directions it can step in.

use glam::{Mat4, Vec3};
use tilescroll_scene::{DrawMode, HitBox2d, NodeId, SceneGraph, TransformNode};

/// The eight ground directions a step can take, relative to the view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Forward,
    Back,
    Left,
    Right,
    ForwardLeft,
    ForwardRight,
    BackLeft,
    BackRight,
}

impl Direction {
    /// Cardinal steps participate in the knockback protocol; diagonals never
    /// do.
    pub fn is_cardinal(self) -> bool {
        matches!(self, Self::Forward | Self::Back | Self::Left | Self::Right)
    }

    /// The direction a knockback travels after a blocked step.
    pub fn opposite(self) -> Self {
        match self {
            Self::Forward => Self::Back,
            Self::Back => Self::Forward,
            Self::Left => Self::Right,
            Self::Right => Self::Left,
            Self::ForwardLeft => Self::BackRight,
            Self::ForwardRight => Self::BackLeft,
            Self::BackLeft => Self::ForwardRight,
            Self::BackRight => Self::ForwardLeft,
        }
    }

    /// Unit ground vector for this direction under the viewer's basis.
    ///
    /// Forward is the view vector flattened onto the ground plane; diagonals
    /// are the normalized sum of their cardinals, so a diagonal step covers
    /// the same distance as a cardinal one.
    pub fn ground_vector(self, view: Vec3, up: Vec3) -> Vec3 {
        let forward = ground_forward(view, up);
        let left = up.normalize().cross(forward).normalize();
        match self {
            Self::Forward => forward,
            Self::Back => -forward,
            Self::Left => left,
            Self::Right => -left,
            Self::ForwardLeft => (forward + left).normalize(),
            Self::ForwardRight => (forward - left).normalize(),
            Self::BackLeft => (-forward + left).normalize(),
            Self::BackRight => (-forward - left).normalize(),
        }
    }
}

/// Project the view vector onto the ground plane defined by `up`.
fn ground_forward(view: Vec3, up: Vec3) -> Vec3 {
    let up = up.normalize();
    (view - up * view.dot(up)).normalize()
}

/// Yaw that carries the model's +X face onto a ground direction.
fn facing_angle(direction: Vec3) -> f32 {
    (-direction.z).atan2(direction.x)
}

/// World-space vertical extent of the player hull.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VerticalSpan {
    pub min_y: f32,
    pub max_y: f32,
}

/// Dead-time counter for the collision knockback.
///
/// `dead_time == dead_max` means idle. A blocked cardinal step zeroes the
/// counter; each tick bounces one frame and counts back up.
#[derive(Debug, Clone)]
pub struct RecoilState {
    dead_time: u32,
    dead_max: u32,
    blocked: Option<Direction>,
}

impl RecoilState {
    pub fn new(dead_max: u32) -> Self {
        Self {
            dead_time: dead_max,
            dead_max,
            blocked: None,
        }
    }

    pub fn is_active(&self) -> bool {
        self.dead_time != self.dead_max
    }

    pub fn frames_left(&self) -> u32 {
        self.dead_max - self.dead_time
    }

    /// Start a knockback away from `blocked`.
    pub fn engage(&mut self, blocked: Direction) {
        self.dead_time = 0;
        self.blocked = Some(blocked);
    }

    /// Advance one frame. Returns the bounce direction while the knockback
    /// is in flight.
    pub fn tick(&mut self) -> Option<Direction> {
        if !self.is_active() {
            return None;
        }
        self.dead_time += 1;
        let bounce = self.blocked.map(Direction::opposite);
        if !self.is_active() {
            self.blocked = None;
        }
        bounce
    }
}

/// The player avatar: a uniformly scaled cube hull hovering over the tiles.
pub struct Player {
    node: NodeId,
    hull: Vec<Vec3>,
}

impl Player {
    /// Insert the player node under `parent` at the given uniform scale.
    pub fn spawn(scene: &mut SceneGraph, parent: NodeId, scale: f32) -> Self {
        let mut node = TransformNode::new(Some(parent));
        node.set_draw_mode(DrawMode::Triangles);
        node.scale(scale);
        let node = scene.insert(node);
        Self {
            node,
            hull: cube_hull(),
        }
    }

    pub fn node(&self) -> NodeId {
        self.node
    }

    pub fn hull(&self) -> &[Vec3] {
        &self.hull
    }

    /// Local position of the player node.
    pub fn position(&self, scene: &SceneGraph) -> Vec3 {
        scene.get(self.node).expect("player node alive").position()
    }

    pub fn set_position(&self, scene: &mut SceneGraph, position: Vec3) {
        scene
            .get_mut(self.node)
            .expect("player node alive")
            .set_position(position);
    }

    /// Step along a world-space ground direction and face that way.
    pub fn step(&self, scene: &mut SceneGraph, direction: Vec3, units: f32) {
        let node = scene.get_mut(self.node).expect("player node alive");
        node.translate(direction * units);
        node.set_rotation(Mat4::from_rotation_y(facing_angle(direction)));
    }

    /// Ground-plane hit box of the transformed hull.
    pub fn hit_box(&self, scene: &SceneGraph) -> HitBox2d {
        HitBox2d::from_points(&scene.world_matrix(self.node), &self.hull)
    }

    /// World-space vertical extent of the transformed hull.
    pub fn vertical_span(&self, scene: &SceneGraph) -> VerticalSpan {
        let world = scene.world_matrix(self.node);
        let mut min_y = f32::MAX;
        let mut max_y = f32::MIN;
        for point in &self.hull {
            let y = world.transform_point3(*point).y;
            min_y = min_y.min(y);
            max_y = max_y.max(y);
        }
        VerticalSpan { min_y, max_y }
    }
}

/// Corners of the unit cube centered on the origin.
fn cube_hull() -> Vec<Vec3> {
    let p = 0.5;
    vec![
        Vec3::new(-p, -p, -p),
        Vec3::new(p, -p, -p),
        Vec3::new(p, -p, p),
        Vec3::new(-p, -p, p),
        Vec3::new(-p, p, -p),
        Vec3::new(p, p, -p),
        Vec3::new(p, p, p),
        Vec3::new(-p, p, p),
    ]
}
