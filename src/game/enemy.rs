//! The pursuing enemy agent.
//!
//! Shares the player's locomotion controller: it walks the same slopes and
//! falls under the same rules, but never jumps: its jump buffer is zero, so
//! the arbiter never fires. Pursuit plans a horizontal chase velocity toward
//! the player inside the follow radius and idles outside it.

use nalgebra::Vector3;

use crate::config::EnemyConfig;

use super::constants::physics as consts;
use super::locomotion::LocomotionController;
use super::physics::PhysicsWorld;

/// Feedback color at full health.
pub const FULL_HEALTH_COLOR: [f32; 3] = [1.0, 1.0, 0.0];
/// Feedback color at zero health.
pub const NO_HEALTH_COLOR: [f32; 3] = [1.0, 0.0, 0.0];

pub struct Enemy {
    id: u64,
    config: EnemyConfig,
    locomotion: LocomotionController,
    health: f32,
    color: [f32; 3],
    /// True while touching the player; pursuit pauses so the enemy does not
    /// grind into the body it already reached.
    target_reached: bool,
    attack_rest_remaining: f32,
}

impl Enemy {
    pub fn new(id: u64, config: &EnemyConfig) -> Self {
        Self {
            id,
            config: config.clone(),
            locomotion: LocomotionController::new(config.locomotion()),
            health: config.max_health,
            color: FULL_HEALTH_COLOR,
            target_reached: false,
            attack_rest_remaining: 0.0,
        }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn health(&self) -> f32 {
        self.health
    }

    /// Current feedback color, yellow fading to red as health drains.
    pub fn color(&self) -> [f32; 3] {
        self.color
    }

    pub fn is_dead(&self) -> bool {
        self.health <= 0.0
    }

    pub fn locomotion(&self) -> &LocomotionController {
        &self.locomotion
    }

    pub fn record_contact(&mut self, normal: Vector3<f32>) {
        self.locomotion.record_contact(normal);
    }

    /// Touched the player: deal a hit, then rest before chasing again.
    /// Returns the damage to apply.
    pub fn begin_player_touch(&mut self) -> f32 {
        self.target_reached = true;
        self.attack_rest_remaining = self.config.delay_after_attack;
        self.config.damage
    }

    pub fn end_player_touch(&mut self) {
        self.target_reached = false;
    }

    /// Struck by a bullet.
    pub fn on_shot(&mut self, damage: f32) {
        self.health -= damage;
        let t = (self.health / self.config.max_health).clamp(0.0, 1.0);
        for i in 0..3 {
            self.color[i] = t * FULL_HEALTH_COLOR[i] + (1.0 - t) * NO_HEALTH_COLOR[i];
        }
    }

    pub fn frame_tick(&mut self, dt: f32) {
        self.attack_rest_remaining -= dt;
        self.locomotion.frame_tick(dt);
    }

    /// One physics step: freeze during the post-attack rest, otherwise chase
    /// the player on the horizontal plane through the shared locomotion.
    pub fn physics_tick(
        &mut self,
        physics: &mut PhysicsWorld,
        player_position: Option<Vector3<f32>>,
        dt: f32,
    ) {
        if self.attack_rest_remaining > 0.0 {
            self.locomotion.clear_contacts();
            physics.set_velocity(self.id, Vector3::zeros());
            return;
        }

        let Some(position) = physics.position(self.id) else {
            return;
        };

        let desired_velocity = match player_position {
            Some(target) => {
                let mut delta = target - position;
                delta.y = 0.0;
                let distance = delta.norm();
                if distance > self.config.follow_radius
                    || self.target_reached
                    || distance < consts::EPSILON
                {
                    Vector3::zeros()
                } else {
                    delta * (self.config.max_speed / distance)
                }
            }
            None => Vector3::zeros(),
        };

        let Some(velocity) = physics.velocity(self.id) else {
            return;
        };

        let id = self.id;
        let probe_distance = self.locomotion.tuning().probe_distance;
        let new_velocity = self.locomotion.physics_tick(
            velocity,
            desired_velocity,
            true,
            dt,
            || physics.ground_probe(id, probe_distance),
        );
        physics.set_velocity(id, new_velocity);
    }
}
