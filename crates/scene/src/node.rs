use std::collections::BTreeMap;
use std::f32::consts::{FRAC_PI_2, PI};

use glam::{Mat4, Vec3};

/// Handle to a node in a [`SceneGraph`].
///
/// Ids are allocated monotonically and never reused, so a stale handle can
/// be detected instead of silently aliasing a newer node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(pub u32);

/// Primitive topology a node's mesh is drawn with.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DrawMode {
    /// Line-list geometry (gizmos). The default for a fresh node.
    #[default]
    Lines,
    /// Triangle-list geometry (everything solid).
    Triangles,
}

/// A transform node: separate scale, rotation and translation matrices
/// composed against an optional parent.
///
/// Keeping the three matrices apart is what makes `orient` (replace the
/// rotation) and `reset_rotation` possible without touching position or
/// size.
#[derive(Debug, Clone)]
pub struct TransformNode {
    scaling: Mat4,
    rotation: Mat4,
    translation: Mat4,
    parent: Option<NodeId>,
    hidden: bool,
    draw_mode: DrawMode,
}

impl Default for TransformNode {
    fn default() -> Self {
        Self::new(None)
    }
}

impl TransformNode {
    /// Create an identity node, optionally attached under a parent.
    pub fn new(parent: Option<NodeId>) -> Self {
        Self {
            scaling: Mat4::IDENTITY,
            rotation: Mat4::IDENTITY,
            translation: Mat4::IDENTITY,
            parent,
            hidden: false,
            draw_mode: DrawMode::default(),
        }
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    /// Local matrix: translation * rotation * scale.
    pub fn local_matrix(&self) -> Mat4 {
        self.translation * self.rotation * self.scaling
    }

    /// Post-multiply the scale matrix by a uniform scale.
    pub fn scale(&mut self, factor: f32) {
        self.scaling *= Mat4::from_scale(Vec3::splat(factor));
    }

    /// Post-multiply the rotation matrix by a rotation of `angle` radians
    /// around `axis`.
    pub fn rotate(&mut self, angle: f32, axis: Vec3) {
        self.rotation *= Mat4::from_axis_angle(axis.normalize(), angle);
    }

    /// Drop all accumulated rotation.
    pub fn reset_rotation(&mut self) {
        self.rotation = Mat4::IDENTITY;
    }

    /// Replace the rotation with a single rotation of `angle` radians about
    /// the z axis. Unlike [`rotate`](Self::rotate) this does not accumulate.
    pub fn orient(&mut self, angle: f32) {
        self.rotation = Mat4::from_rotation_z(angle);
    }

    /// Replace the rotation matrix wholesale.
    pub fn set_rotation(&mut self, rotation: Mat4) {
        self.rotation = rotation;
    }

    /// Post-multiply the translation matrix by a translation of `delta`.
    pub fn translate(&mut self, delta: Vec3) {
        self.translation *= Mat4::from_translation(delta);
    }

    /// Replace the translation with an absolute position.
    pub fn set_position(&mut self, position: Vec3) {
        self.translation = Mat4::from_translation(position);
    }

    /// Local position: the translation column of the translation matrix.
    /// Parent transforms are not applied.
    pub fn position(&self) -> Vec3 {
        self.translation.w_axis.truncate()
    }

    /// Step `units` along +y and face up (z-rotation of pi/2).
    pub fn move_up(&mut self, units: f32) {
        self.translate(Vec3::new(0.0, units, 0.0));
        self.orient(FRAC_PI_2);
    }

    /// Step `units` along -y and face down (z-rotation of 3*pi/2).
    pub fn move_down(&mut self, units: f32) {
        self.translate(Vec3::new(0.0, -units, 0.0));
        self.orient(1.5 * PI);
    }

    /// Step `units` along -x and face left (z-rotation of pi).
    pub fn move_left(&mut self, units: f32) {
        self.translate(Vec3::new(-units, 0.0, 0.0));
        self.orient(PI);
    }

    /// Step `units` along +x and face right (zero z-rotation).
    pub fn move_right(&mut self, units: f32) {
        self.translate(Vec3::new(units, 0.0, 0.0));
        self.orient(0.0);
    }

    pub fn hide(&mut self) {
        self.hidden = true;
    }

    pub fn show(&mut self) {
        self.hidden = false;
    }

    pub fn toggle_hidden(&mut self) {
        self.hidden = !self.hidden;
    }

    pub fn is_hidden(&self) -> bool {
        self.hidden
    }

    pub fn draw_mode(&self) -> DrawMode {
        self.draw_mode
    }

    pub fn set_draw_mode(&mut self, mode: DrawMode) {
        self.draw_mode = mode;
    }
}

/// Arena of transform nodes keyed by monotonically allocated ids.
///
/// Uses BTreeMap for deterministic iteration order. Because ids grow
/// monotonically and a child is always inserted after its parent, every
/// descendant of a node has a larger id than the node itself; subtree
/// removal relies on that ordering.
#[derive(Debug, Default)]
pub struct SceneGraph {
    nodes: BTreeMap<NodeId, TransformNode>,
    next_id: u32,
}

impl SceneGraph {
    pub fn new() -> Self {
        Self::default()
    }

    /// Insert a node and return its handle. The parent, if any, must already
    /// be present.
    pub fn insert(&mut self, node: TransformNode) -> NodeId {
        if let Some(parent) = node.parent() {
            assert!(
                self.nodes.contains_key(&parent),
                "parent node must be inserted before its child"
            );
        }
        let id = NodeId(self.next_id);
        self.next_id += 1;
        self.nodes.insert(id, node);
        id
    }

    pub fn get(&self, id: NodeId) -> Option<&TransformNode> {
        self.nodes.get(&id)
    }

    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut TransformNode> {
        self.nodes.get_mut(&id)
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.nodes.contains_key(&id)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (NodeId, &TransformNode)> {
        self.nodes.iter().map(|(id, node)| (*id, node))
    }

    /// World matrix of a node: the parent chain's world matrix times the
    /// node's local matrix, identity at the root. Recomputed on every call.
    pub fn world_matrix(&self, id: NodeId) -> Mat4 {
        let mut matrix = Mat4::IDENTITY;
        let mut current = Some(id);
        while let Some(node_id) = current {
            let node = self
                .get(node_id)
                .expect("scene node referenced after removal");
            matrix = node.local_matrix() * matrix;
            current = node.parent();
        }
        matrix
    }

    /// Remove a node and every descendant. Returns how many nodes were
    /// dropped; zero if the handle was already gone.
    pub fn remove_subtree(&mut self, root: NodeId) -> usize {
        if !self.nodes.contains_key(&root) {
            return 0;
        }
        let mut doomed = vec![root];
        // Ordered iteration visits parents before children, so one pass
        // finds the whole subtree.
        for (id, node) in &self.nodes {
            if let Some(parent) = node.parent() {
                if doomed.contains(&parent) && !doomed.contains(id) {
                    doomed.push(*id);
                }
            }
        }
        for id in &doomed {
            self.nodes.remove(id);
        }
        tracing::trace!(removed = doomed.len(), "removed scene subtree");
        doomed.len()
    }
}
