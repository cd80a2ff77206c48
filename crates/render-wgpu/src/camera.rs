use glam::{Mat4, Vec3};

const INITIAL_YAW: f32 = -90.0;
const INITIAL_PITCH: f32 = -65.0;
const MIN_PITCH: f32 = -89.0;
const MAX_PITCH: f32 = 89.0;
const FIRST_PERSON_PITCH: f32 = 45.0;

/// Third-person follow camera.
///
/// Yaw and pitch are stored in degrees. The tether length shrinks as the
/// pitch rises: at `FIRST_PERSON_PITCH` and above it collapses to zero and
/// the camera turns first-person. The length also scales with the player's
/// scale so the avatar keeps the same screen proportion.
pub struct FollowCamera {
    pub target: Vec3,
    pub yaw: f32,
    pub pitch: f32,
    pub max_follow_distance: f32,
    pub follow_scale: f32,
    pub sensitivity: f32,
    pub fov: f32,
    pub aspect: f32,
    pub near: f32,
    pub far: f32,
}

impl Default for FollowCamera {
    fn default() -> Self {
        Self {
            target: Vec3::ZERO,
            yaw: INITIAL_YAW,
            pitch: INITIAL_PITCH,
            max_follow_distance: 12.0,
            follow_scale: 0.25,
            sensitivity: 0.1,
            fov: 45.0_f32.to_radians(),
            aspect: 16.0 / 9.0,
            near: 0.05,
            far: 200.0,
        }
    }
}

impl FollowCamera {
    /// Unit view direction from yaw and pitch.
    pub fn view_direction(&self) -> Vec3 {
        let yaw = self.yaw.to_radians();
        let pitch = self.pitch.to_radians();
        Vec3::new(
            yaw.cos() * pitch.cos(),
            pitch.sin(),
            yaw.sin() * pitch.cos(),
        )
        .normalize()
    }

    /// Tether length for the current pitch: the full scaled distance at the
    /// lowest pitch, zero at the first-person threshold.
    pub fn follow_distance(&self) -> f32 {
        let ratio = (self.pitch - MIN_PITCH) / (FIRST_PERSON_PITCH - MIN_PITCH);
        self.max_follow_distance * self.follow_scale * (1.0 - ratio).max(0.0)
    }

    pub fn is_first_person(&self) -> bool {
        self.pitch >= FIRST_PERSON_PITCH
    }

    pub fn set_target(&mut self, target: Vec3) {
        self.target = target;
    }

    /// Mouse-delta look. Positive `dy` (cursor moving down) lowers the pitch.
    pub fn rotate(&mut self, dx: f32, dy: f32) {
        self.yaw += dx * self.sensitivity;
        self.pitch = (self.pitch - dy * self.sensitivity).clamp(MIN_PITCH, MAX_PITCH);
    }

    /// Restore the initial angles; target and projection are untouched.
    pub fn reset(&mut self) {
        self.yaw = INITIAL_YAW;
        self.pitch = INITIAL_PITCH;
    }

    pub fn eye_position(&self) -> Vec3 {
        self.target - self.view_direction() * self.follow_distance()
    }

    pub fn view_matrix(&self) -> Mat4 {
        let eye = self.eye_position();
        Mat4::look_at_rh(eye, eye + self.view_direction(), Vec3::Y)
    }

    pub fn projection_matrix(&self) -> Mat4 {
        Mat4::perspective_rh(self.fov, self.aspect, self.near, self.far)
    }

    pub fn view_projection(&self) -> Mat4 {
        self.projection_matrix() * self.view_matrix()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_camera_is_valid() {
        let cam = FollowCamera::default();
        assert!(!cam.is_first_person());
        assert!((cam.view_direction().length() - 1.0).abs() < 1e-6);
        let vp = cam.view_projection();
        assert!(!vp.col(0).x.is_nan());
    }

    #[test]
    fn follow_distance_shrinks_as_pitch_rises() {
        let mut cam = FollowCamera::default();
        cam.pitch = MIN_PITCH;
        let longest = cam.follow_distance();
        assert!((longest - cam.max_follow_distance * cam.follow_scale).abs() < 1e-5);

        cam.pitch = -40.0;
        let mid = cam.follow_distance();
        cam.pitch = 0.0;
        let short = cam.follow_distance();
        assert!(longest > mid && mid > short && short > 0.0);
    }

    #[test]
    fn follow_distance_scales_with_the_player() {
        let mut cam = FollowCamera::default();
        let base = cam.follow_distance();
        cam.follow_scale *= 2.0;
        assert!((cam.follow_distance() - base * 2.0).abs() < 1e-5);
    }

    #[test]
    fn high_pitch_turns_first_person() {
        let mut cam = FollowCamera::default();
        cam.set_target(Vec3::new(3.0, 0.5, -1.0));

        cam.pitch = FIRST_PERSON_PITCH - 0.1;
        assert!(!cam.is_first_person());
        assert!(cam.follow_distance() > 0.0);

        cam.pitch = FIRST_PERSON_PITCH;
        assert!(cam.is_first_person());
        assert_eq!(cam.follow_distance(), 0.0);
        assert_eq!(cam.eye_position(), cam.target);
        assert!(!cam.view_matrix().col(0).x.is_nan());
    }

    #[test]
    fn eye_hangs_behind_and_above_the_target() {
        let mut cam = FollowCamera::default();
        cam.set_target(Vec3::new(4.0, 0.1, -2.0));
        let eye = cam.eye_position();
        assert!(((eye - cam.target).length() - cam.follow_distance()).abs() < 1e-5);
        // Initial pitch looks down, so the eye sits above the player.
        assert!(eye.y > cam.target.y);
    }

    #[test]
    fn rotation_clamps_pitch_at_the_vertical_limits() {
        let mut cam = FollowCamera::default();
        cam.rotate(0.0, -1.0e6);
        assert_eq!(cam.pitch, MAX_PITCH);
        cam.rotate(0.0, 1.0e6);
        assert_eq!(cam.pitch, MIN_PITCH);
    }

    #[test]
    fn view_direction_follows_the_yaw() {
        let mut cam = FollowCamera::default();
        cam.pitch = 0.0;
        cam.yaw = -90.0;
        assert!(cam.view_direction().abs_diff_eq(Vec3::new(0.0, 0.0, -1.0), 1e-6));
        cam.yaw = 0.0;
        assert!(cam.view_direction().abs_diff_eq(Vec3::new(1.0, 0.0, 0.0), 1e-6));
    }

    #[test]
    fn reset_restores_the_initial_angles() {
        let mut cam = FollowCamera::default();
        cam.set_target(Vec3::new(7.0, 0.0, 7.0));
        cam.rotate(123.0, -456.0);
        cam.reset();
        assert_eq!(cam.yaw, INITIAL_YAW);
        assert_eq!(cam.pitch, INITIAL_PITCH);
        assert_eq!(cam.target, Vec3::new(7.0, 0.0, 7.0));
    }
}
