//! Orbiting third-person camera.
//!
//! Presentation-rate only: smooths a focus point around the player, orbits
//! from look input, realigns behind the movement heading once the player
//! stops steering it, and pulls in along the view line when static geometry
//! would block the shot.

use nalgebra::{UnitQuaternion, Vector2, Vector3};

use crate::config::CameraConfig;

use super::constants::physics as consts;
use super::physics::PhysicsWorld;

pub struct OrbitCamera {
    config: CameraConfig,
    focus: Vector3<f32>,
    previous_focus: Vector3<f32>,
    /// Orbit angles in degrees, stored as (vertical, horizontal).
    orbit_angles: Vector2<f32>,
    look_input: Vector2<f32>,
    since_manual_rotation: f32,
    position: Vector3<f32>,
    orientation: UnitQuaternion<f32>,
}

impl OrbitCamera {
    pub fn new(config: &CameraConfig, focus: Vector3<f32>) -> Self {
        let orbit_angles = Vector2::new(45.0, 0.0);
        let orientation = orbit_orientation(orbit_angles);
        let position = focus - orientation * Vector3::z() * config.distance;
        Self {
            config: config.clone(),
            focus,
            previous_focus: focus,
            orbit_angles,
            look_input: Vector2::zeros(),
            since_manual_rotation: 0.0,
            position,
            orientation,
        }
    }

    pub fn position(&self) -> Vector3<f32> {
        self.position
    }

    pub fn orientation(&self) -> UnitQuaternion<f32> {
        self.orientation
    }

    pub fn focus(&self) -> Vector3<f32> {
        self.focus
    }

    /// Horizontal orbit angle in degrees; the player's input reference frame.
    pub fn yaw(&self) -> f32 {
        self.orbit_angles.y
    }

    /// Latch the latest 2D look vector.
    pub fn on_look(&mut self, look: [f32; 2]) {
        self.look_input = Vector2::new(look[0], look[1]);
    }

    pub fn update(&mut self, dt: f32, focus_target: Vector3<f32>, physics: &PhysicsWorld) {
        self.since_manual_rotation += dt;
        self.update_focus(focus_target, dt);

        // Ordered so manual input takes priority over auto-alignment.
        if self.manual_rotation(dt) || self.automatic_rotation(dt) {
            self.constrain_angles();
            self.orientation = orbit_orientation(self.orbit_angles);
        }

        let look_direction = self.orientation * Vector3::z();
        let mut look_position = self.focus - look_direction * self.config.distance;

        // Sweep the near-plane box from the player; on a hit the camera sits
        // at the obstruction instead of behind it.
        let rect_offset = look_direction * self.config.near_plane;
        let rect_position = look_position + rect_offset;
        let cast_line = rect_position - focus_target;
        let cast_distance = cast_line.norm();
        if cast_distance > consts::EPSILON {
            let cast_direction = cast_line / cast_distance;
            if let Some(hit_distance) = physics.cast_obstruction(
                focus_target,
                cast_direction,
                cast_distance,
                self.half_extents(),
                self.orientation,
            ) {
                let rect_position = focus_target + cast_direction * hit_distance;
                look_position = rect_position - rect_offset;
            }
        }

        self.position = look_position;
    }

    /// Pull the focus point toward the target: a hard clamp at the focus
    /// radius, and an exponential centering crawl inside it.
    fn update_focus(&mut self, target: Vector3<f32>, dt: f32) {
        self.previous_focus = self.focus;
        if self.config.focus_radius > 0.0 {
            let distance = (target - self.focus).norm();
            let mut t = 1.0;
            if distance > 0.01 && self.config.focus_centering > 0.0 {
                t = (1.0 - self.config.focus_centering).powf(dt);
            }
            if distance > self.config.focus_radius {
                t = t.min(self.config.focus_radius / distance);
            }
            self.focus = target.lerp(&self.focus, t);
        } else {
            self.focus = target;
        }
    }

    fn manual_rotation(&mut self, dt: f32) -> bool {
        if self.look_input == Vector2::zeros() {
            return false;
        }
        // Look x spins the orbit, look y tilts it.
        self.orbit_angles.x += self.config.rotation_speed * dt * self.look_input.y;
        self.orbit_angles.y -= self.config.rotation_speed * dt * self.look_input.x;
        self.since_manual_rotation = 0.0;
        true
    }

    /// Swing the orbit behind the focus heading, easing off as the headings
    /// converge (and near a full reversal, so walking toward the camera does
    /// not whip it around).
    fn automatic_rotation(&mut self, dt: f32) -> bool {
        if self.since_manual_rotation < self.config.align_delay {
            return false;
        }

        let movement = Vector2::new(
            self.focus.x - self.previous_focus.x,
            self.focus.z - self.previous_focus.z,
        );
        let movement_sq = movement.norm_squared();
        if movement_sq < 0.0001 {
            return false;
        }

        let heading = heading_degrees(Vector3::new(movement.x, 0.0, movement.y) / movement_sq.sqrt());
        let delta_abs = delta_angle(self.orbit_angles.y, heading).abs();
        let mut rotation_change = self.config.rotation_speed * dt.min(movement_sq);
        if delta_abs < self.config.align_smooth_range {
            rotation_change *= delta_abs / self.config.align_smooth_range;
        } else if 180.0 - delta_abs < self.config.align_smooth_range {
            rotation_change *= (180.0 - delta_abs) / self.config.align_smooth_range;
        }
        self.orbit_angles.y = move_towards_angle(self.orbit_angles.y, heading, rotation_change);
        true
    }

    fn constrain_angles(&mut self) {
        self.orbit_angles.x = self
            .orbit_angles
            .x
            .clamp(self.config.min_vertical_angle, self.config.max_vertical_angle);
        self.orbit_angles.y = self.orbit_angles.y.rem_euclid(360.0);
    }

    /// Half extents of the near-plane rectangle, for the obstruction sweep.
    fn half_extents(&self) -> Vector3<f32> {
        let half_y =
            self.config.near_plane * (0.5 * self.config.field_of_view.to_radians()).tan();
        Vector3::new(half_y * self.config.aspect, half_y, 0.0)
    }
}

/// Orientation for (vertical, horizontal) orbit angles in degrees.
fn orbit_orientation(angles: Vector2<f32>) -> UnitQuaternion<f32> {
    UnitQuaternion::from_axis_angle(&Vector3::y_axis(), angles.y.to_radians())
        * UnitQuaternion::from_axis_angle(&Vector3::x_axis(), angles.x.to_radians())
}

/// Heading angle in degrees of a horizontal direction: 0 along +z,
/// increasing toward +x.
pub fn heading_degrees(direction: Vector3<f32>) -> f32 {
    direction.x.atan2(direction.z).to_degrees()
}

/// Flattened (right, forward) axes for a yaw angle in degrees.
pub fn yaw_axes(yaw_degrees: f32) -> (Vector3<f32>, Vector3<f32>) {
    let yaw = yaw_degrees.to_radians();
    let (sin, cos) = yaw.sin_cos();
    (
        Vector3::new(cos, 0.0, -sin),
        Vector3::new(sin, 0.0, cos),
    )
}

/// Shortest signed difference between two angles, in (-180, 180].
pub fn delta_angle(from_degrees: f32, to_degrees: f32) -> f32 {
    let delta = (to_degrees - from_degrees).rem_euclid(360.0);
    if delta > 180.0 {
        delta - 360.0
    } else {
        delta
    }
}

/// Move an angle toward a target by at most `max_delta` degrees, taking the
/// short way around.
pub fn move_towards_angle(current: f32, target: f32, max_delta: f32) -> f32 {
    let delta = delta_angle(current, target);
    if delta.abs() <= max_delta {
        current + delta
    } else {
        current + max_delta.copysign(delta)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CameraConfig;

    #[test]
    fn test_heading_degrees() {
        assert!((heading_degrees(Vector3::new(0.0, 0.0, 1.0)) - 0.0).abs() < 1.0e-4);
        assert!((heading_degrees(Vector3::new(1.0, 0.0, 0.0)) - 90.0).abs() < 1.0e-4);
        assert!((heading_degrees(Vector3::new(-1.0, 0.0, 0.0)) + 90.0).abs() < 1.0e-4);
    }

    #[test]
    fn test_delta_angle_wraps() {
        assert!((delta_angle(350.0, 10.0) - 20.0).abs() < 1.0e-4);
        assert!((delta_angle(10.0, 350.0) + 20.0).abs() < 1.0e-4);
        assert!((delta_angle(0.0, 180.0) - 180.0).abs() < 1.0e-4);
    }

    #[test]
    fn test_move_towards_angle_caps_the_step() {
        assert!((move_towards_angle(0.0, 90.0, 30.0) - 30.0).abs() < 1.0e-4);
        assert!((move_towards_angle(350.0, 10.0, 30.0) - 370.0).abs() < 1.0e-4);
        assert!((move_towards_angle(0.0, 20.0, 30.0) - 20.0).abs() < 1.0e-4);
    }

    #[test]
    fn test_yaw_axes_are_flat_and_orthogonal() {
        let (right, forward) = yaw_axes(37.0);
        assert!(right.y.abs() < 1.0e-6 && forward.y.abs() < 1.0e-6);
        assert!(right.dot(&forward).abs() < 1.0e-5);
        assert!((heading_degrees(forward) - 37.0).abs() < 1.0e-3);
    }

    #[test]
    fn test_focus_stays_within_focus_radius() {
        let config = CameraConfig::default();
        let physics = PhysicsWorld::new();
        let mut camera = OrbitCamera::new(&config, Vector3::zeros());

        let target = Vector3::new(10.0, 0.0, 0.0);
        camera.update(1.0 / 60.0, target, &physics);

        let gap = (target - camera.focus()).norm();
        assert!(
            (gap - config.focus_radius).abs() < 1.0e-3,
            "Focus should be clamped to the focus radius, gap={}",
            gap
        );
    }

    #[test]
    fn test_vertical_angle_clamped_by_look_input() {
        let config = CameraConfig::default();
        let physics = PhysicsWorld::new();
        let mut camera = OrbitCamera::new(&config, Vector3::zeros());

        camera.on_look([0.0, 10.0]);
        camera.update(1.0, Vector3::zeros(), &physics);
        assert!(camera.orbit_angles.x <= config.max_vertical_angle + 1.0e-4);

        camera.on_look([0.0, -10.0]);
        camera.update(1.0, Vector3::zeros(), &physics);
        assert!(camera.orbit_angles.x >= config.min_vertical_angle - 1.0e-4);
    }

    #[test]
    fn test_camera_sits_behind_focus_at_distance() {
        let config = CameraConfig::default();
        let physics = PhysicsWorld::new();
        let mut camera = OrbitCamera::new(&config, Vector3::zeros());

        camera.update(1.0 / 60.0, Vector3::zeros(), &physics);
        let gap = (camera.position() - camera.focus()).norm();
        assert!((gap - config.distance).abs() < 1.0e-3, "gap={}", gap);
        // 45° starting tilt puts the camera above and behind.
        assert!(camera.position().y > 0.0);
        assert!(camera.position().z < 0.0);
    }
}
