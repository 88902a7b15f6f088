//! Grounded locomotion shared by the player and enemy agents.
//!
//! One physics step runs: classify the step's accumulated contact normals,
//! resolve whether the body is grounded / on a steep wall / airborne, steer
//! the in-plane velocity toward the movement intent, consume a buffered jump
//! if one is pending, and hand the final velocity back for write-back to the
//! body. Counters persist across steps; contact sums do not.

use nalgebra::Vector3;

use super::constants::physics as consts;
use super::contacts::ContactAccumulator;

/// Tuning scalars for one locomotion agent. The last three are derived from
/// designer-facing values at configuration load, never at step time.
#[derive(Debug, Clone, Copy)]
pub struct LocomotionTuning {
    pub max_speed: f32,
    pub acceleration: f32,
    pub air_acceleration: f32,
    /// Grace window during which a jump request stays valid, in seconds.
    pub jump_buffer: f32,
    /// Above this speed the body is launching too fast to snap back down.
    pub max_snap_speed: f32,
    /// Length of the downward ground probe.
    pub probe_distance: f32,
    /// Take-off speed: 2 * jump_height / time_to_apex.
    pub jump_speed: f32,
    /// Gravity while airborne: jump_speed / time_to_apex.
    pub jump_gravity: f32,
    /// Cosine of the max slope angle still classified as ground.
    pub min_ground_dot: f32,
}

/// Result of the downward ground probe.
#[derive(Debug, Clone, Copy)]
pub struct ProbeHit {
    pub distance: f32,
    pub normal: Vector3<f32>,
}

/// Contact state resolved for one physics step.
#[derive(Debug, Clone, Copy)]
pub struct GroundState {
    pub grounded: bool,
    pub on_steep: bool,
    /// Effective contact plane normal; up when airborne.
    pub contact_normal: Vector3<f32>,
    /// Unit aggregate of the step's steep contacts, when any.
    pub steep_normal: Option<Vector3<f32>>,
}

impl GroundState {
    fn airborne() -> Self {
        Self {
            grounded: false,
            on_steep: false,
            contact_normal: Vector3::y(),
            steep_normal: None,
        }
    }
}

pub struct LocomotionController {
    tuning: LocomotionTuning,
    contacts: ContactAccumulator,
    state: GroundState,
    steps_since_grounded: u32,
    steps_since_jump: u32,
    jump_buffer_remaining: f32,
    jump_direction: Vector3<f32>,
}

impl LocomotionController {
    pub fn new(tuning: LocomotionTuning) -> Self {
        Self {
            tuning,
            contacts: ContactAccumulator::new(),
            state: GroundState::airborne(),
            steps_since_grounded: 0,
            steps_since_jump: 0,
            jump_buffer_remaining: 0.0,
            jump_direction: Vector3::y(),
        }
    }

    pub fn tuning(&self) -> &LocomotionTuning {
        &self.tuning
    }

    /// Contact state resolved by the most recent physics step.
    pub fn state(&self) -> &GroundState {
        &self.state
    }

    pub fn is_grounded(&self) -> bool {
        self.state.grounded
    }

    /// Direction of the most recent take-off, for jump-cancel.
    pub fn jump_direction(&self) -> Vector3<f32> {
        self.jump_direction
    }

    /// Feed one collision-contact normal reported by the engine this step.
    /// Order of arrival does not matter; duplicates from the same body are
    /// tolerated by summation.
    pub fn record_contact(&mut self, normal: Vector3<f32>) {
        self.contacts.record(normal, self.tuning.min_ground_dot);
    }

    /// Drop any contacts accumulated for the current step without resolving
    /// them. Used when an agent sits a step out (post-attack rest, teleport).
    pub fn clear_contacts(&mut self) {
        self.contacts.clear();
    }

    /// Arm the jump buffer. Called from input; the jump itself happens on a
    /// later physics step, whenever a qualifying surface is under the body.
    pub fn request_jump(&mut self) {
        self.jump_buffer_remaining = self.tuning.jump_buffer;
    }

    /// Presentation-rate countdown. An expired buffer simply never fires.
    pub fn frame_tick(&mut self, dt: f32) {
        self.jump_buffer_remaining -= dt;
    }

    /// Run one physics step and return the velocity to write back to the
    /// body. `plan_velocity` is false while an external impulse (dash) owns
    /// the horizontal velocity; ground resolution and jumping still run.
    pub fn physics_tick(
        &mut self,
        mut velocity: Vector3<f32>,
        desired_velocity: Vector3<f32>,
        plan_velocity: bool,
        dt: f32,
        probe: impl FnOnce() -> Option<ProbeHit>,
    ) -> Vector3<f32> {
        self.steps_since_grounded = self.steps_since_grounded.saturating_add(1);
        self.steps_since_jump = self.steps_since_jump.saturating_add(1);

        // Our own gravity, only on steps without a direct ground contact.
        // Grounded bodies get none, so they rest on slopes instead of creeping.
        if self.contacts.ground_count() == 0 {
            velocity.y -= self.tuning.jump_gravity * dt;
        }

        self.state = self.resolve_ground(&mut velocity, probe);
        if self.state.grounded {
            self.steps_since_grounded = 0;
        }

        if plan_velocity {
            velocity = self.plan_velocity(velocity, desired_velocity, dt);
        }

        if self.jump_buffer_remaining > 0.0 && (self.state.grounded || self.state.on_steep) {
            velocity = self.consume_jump(velocity);
        }

        self.contacts.clear();
        velocity
    }

    /// Decide grounded / steep / airborne for this step. Direct ground
    /// contacts win; otherwise try snapping back onto a surface just below;
    /// otherwise two steep contacts may seam into walkable ground.
    fn resolve_ground(
        &mut self,
        velocity: &mut Vector3<f32>,
        probe: impl FnOnce() -> Option<ProbeHit>,
    ) -> GroundState {
        let steep_normal = self.contacts.steep_aggregate();
        let on_steep = self.contacts.steep_count() > 0;

        if self.contacts.ground_count() > 0 {
            let contact_normal = self.contacts.ground_aggregate().unwrap_or_else(Vector3::y);
            return GroundState {
                grounded: true,
                on_steep,
                contact_normal,
                steep_normal,
            };
        }

        if let Some(contact_normal) = self.snap_to_ground(velocity, probe) {
            return GroundState {
                grounded: true,
                on_steep,
                contact_normal,
                steep_normal,
            };
        }

        // A V-shaped groove: no single walkable surface, but the combined
        // steep normals clear the ground threshold.
        if self.contacts.steep_count() > 1 {
            if let Some(seam) = steep_normal {
                if seam.y >= self.tuning.min_ground_dot {
                    return GroundState {
                        grounded: true,
                        on_steep,
                        contact_normal: seam,
                        steep_normal,
                    };
                }
            }
        }

        GroundState {
            on_steep,
            steep_normal,
            ..GroundState::airborne()
        }
    }

    /// A body that was grounded a step ago and is not launching or fresh off
    /// a jump gets pulled back onto a surface found just below it, with its
    /// velocity re-projected along that surface so speed is preserved.
    fn snap_to_ground(
        &mut self,
        velocity: &mut Vector3<f32>,
        probe: impl FnOnce() -> Option<ProbeHit>,
    ) -> Option<Vector3<f32>> {
        if self.steps_since_grounded > 1 || self.steps_since_jump <= 3 {
            return None;
        }
        let speed = velocity.norm();
        if speed > self.tuning.max_snap_speed {
            return None;
        }

        let hit = probe()?;
        if hit.normal.y < self.tuning.min_ground_dot {
            return None;
        }

        let dot = velocity.dot(&hit.normal);
        if dot > 0.0 {
            // Moving away from the surface: keep the speed, bend the
            // direction back into the surface plane.
            if let Some(tangent) = (*velocity - hit.normal * dot).try_normalize(consts::EPSILON) {
                *velocity = tangent * speed;
            }
        }
        Some(hit.normal)
    }

    /// Steer the in-plane velocity toward the desired velocity, bounded by
    /// the per-step acceleration. The component along the contact normal is
    /// left untouched.
    fn plan_velocity(
        &self,
        velocity: Vector3<f32>,
        desired_velocity: Vector3<f32>,
        dt: f32,
    ) -> Vector3<f32> {
        let normal = self.state.contact_normal;
        let x_axis = project_on_plane(Vector3::x(), normal);
        let z_axis = project_on_plane(Vector3::z(), normal);

        let current_x = velocity.dot(&x_axis);
        let current_z = velocity.dot(&z_axis);

        let acceleration = if self.state.grounded {
            self.tuning.acceleration
        } else {
            self.tuning.air_acceleration
        };

        let current = Vector3::new(current_x, 0.0, current_z);
        let planned = move_towards(current, desired_velocity, acceleration * dt);

        velocity + x_axis * (planned.x - current_x) + z_axis * (planned.z - current_z)
    }

    /// Fire the buffered jump against the step's resolved surface. Jumping
    /// off an incline pushes partially along its tilt, and speed already
    /// carried along the jump direction is not stacked twice.
    fn consume_jump(&mut self, velocity: Vector3<f32>) -> Vector3<f32> {
        self.jump_buffer_remaining = 0.0;
        self.steps_since_jump = 0;

        let surface = if self.state.grounded {
            self.state.contact_normal
        } else {
            self.state.steep_normal.unwrap_or_else(Vector3::y)
        };
        let direction = (surface + Vector3::y())
            .try_normalize(consts::EPSILON)
            .unwrap_or_else(Vector3::y);

        let aligned_speed = velocity.dot(&direction);
        let jump_speed = if aligned_speed > 0.0 {
            (self.tuning.jump_speed - aligned_speed).max(0.0)
        } else {
            self.tuning.jump_speed
        };

        self.jump_direction = direction;
        velocity + direction * jump_speed
    }
}

/// Move `current` toward `target` by at most `max_delta`, without overshoot.
pub fn move_towards(
    current: Vector3<f32>,
    target: Vector3<f32>,
    max_delta: f32,
) -> Vector3<f32> {
    let delta = target - current;
    let distance = delta.norm();
    if distance <= max_delta || distance < consts::EPSILON {
        target
    } else {
        current + delta * (max_delta / distance)
    }
}

/// Remove the component of `vector` along `normal`.
pub fn project_on_plane(vector: Vector3<f32>, normal: Vector3<f32>) -> Vector3<f32> {
    vector - normal * vector.dot(&normal)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_move_towards_caps_the_step() {
        let from = Vector3::zeros();
        let to = Vector3::new(10.0, 0.0, 0.0);

        let step = move_towards(from, to, 1.5);
        assert!((step - Vector3::new(1.5, 0.0, 0.0)).norm() < 1.0e-6);

        let done = move_towards(from, to, 20.0);
        assert_eq!(done, to);
    }

    #[test]
    fn test_project_on_plane_removes_normal_component() {
        let normal = Vector3::new(0.0, 0.8, 0.6);
        let projected = project_on_plane(Vector3::x(), normal);
        assert!(projected.dot(&normal).abs() < 1.0e-6);
    }
}
