//! The player agent: locomotion plus dash, ranged attack, jump-cancel and
//! hit reaction.

use nalgebra::{Vector2, Vector3};

use crate::config::PlayerConfig;

use super::bullet::BulletSpawn;
use super::camera::{heading_degrees, move_towards_angle, yaw_axes};
use super::constants::{combat, physics as consts};
use super::locomotion::LocomotionController;
use super::physics::PhysicsWorld;

pub struct Player {
    id: u64,
    config: PlayerConfig,
    locomotion: LocomotionController,
    /// Raw 2D input, latched from the most recent Move event.
    move_input: Vector2<f32>,
    /// Movement intent in world space, recomputed every physics step from
    /// the latched input and the current reference frame.
    movement: Vector3<f32>,
    /// Facing of the visual model in degrees, chased toward the heading.
    model_yaw: f32,
    health: f32,
    attack_delay_remaining: f32,
    dash_cooldown_remaining: f32,
    dash_remaining: f32,
    dashing: bool,
    input_lock_remaining: f32,
}

impl Player {
    pub fn new(id: u64, config: &PlayerConfig) -> Self {
        Self {
            id,
            config: config.clone(),
            locomotion: LocomotionController::new(config.locomotion()),
            move_input: Vector2::zeros(),
            movement: Vector3::zeros(),
            model_yaw: 0.0,
            health: config.max_health,
            attack_delay_remaining: 0.0,
            dash_cooldown_remaining: 0.0,
            dash_remaining: 0.0,
            dashing: false,
            input_lock_remaining: 0.0,
        }
    }

    pub fn id(&self) -> u64 {
        self.id
    }

    pub fn health(&self) -> f32 {
        self.health
    }

    pub fn is_dashing(&self) -> bool {
        self.dashing
    }

    /// True while the post-hit shock still suppresses input.
    pub fn input_locked(&self) -> bool {
        self.input_lock_remaining > 0.0
    }

    pub fn locomotion(&self) -> &LocomotionController {
        &self.locomotion
    }

    pub fn model_forward(&self) -> Vector3<f32> {
        yaw_axes(self.model_yaw).1
    }

    pub fn record_contact(&mut self, normal: Vector3<f32>) {
        self.locomotion.record_contact(normal);
    }

    pub fn on_move(&mut self, input: [f32; 2]) {
        self.move_input = Vector2::new(input[0], input[1]);
    }

    pub fn on_jump(&mut self) {
        self.locomotion.request_jump();
    }

    /// Releasing jump early trims a rising jump: shave half a unit of
    /// velocity off the take-off direction, airborne only.
    pub fn on_jump_canceled(&mut self, physics: &mut PhysicsWorld) {
        let Some(velocity) = physics.velocity(self.id) else {
            return;
        };
        let direction = self.locomotion.jump_direction();
        if !self.locomotion.is_grounded() && velocity.dot(&direction) > 0.0 {
            physics.add_velocity(self.id, -0.5 * direction);
        }
    }

    /// Fire toward the closest enemy in range when it sits inside the aim
    /// cone, straight ahead otherwise. Returns the bullet to spawn, or None
    /// while the attack delay is still running.
    pub fn on_attack(
        &mut self,
        physics: &PhysicsWorld,
        enemy_positions: &[Vector3<f32>],
    ) -> Option<BulletSpawn> {
        if self.attack_delay_remaining > 0.0 {
            return None;
        }
        let position = physics.position(self.id)?;
        let forward = self.model_forward();

        let mut direction = forward;
        let nearest = enemy_positions
            .iter()
            .map(|target| (target, (target - position).norm()))
            .filter(|(_, distance)| *distance <= self.config.shoot_radius)
            .min_by(|a, b| a.1.total_cmp(&b.1));
        if let Some((target, distance)) = nearest {
            if distance > consts::EPSILON {
                let to_enemy = (target - position) / distance;
                let half_cone_cos = (0.5 * self.config.field_of_shooting).to_radians().cos();
                if forward.dot(&to_enemy) >= half_cone_cos {
                    direction = to_enemy;
                }
            }
        }

        self.attack_delay_remaining = self.config.attack_delay;
        Some(BulletSpawn {
            position: position
                + direction * combat::MUZZLE_FORWARD
                + Vector3::y() * combat::MUZZLE_UP,
            velocity: direction * self.config.bullet_speed,
        })
    }

    /// Burst of speed along the current movement intent (or facing when
    /// idle). While it lasts, velocity planning is suspended so the planner
    /// does not immediately bleed the burst back down to max speed.
    pub fn on_dash(&mut self, physics: &mut PhysicsWorld) {
        if self.dash_cooldown_remaining > 0.0 || self.dashing {
            return;
        }
        self.dashing = true;
        self.dash_remaining = self.config.dash_duration;

        let direction = if self.movement.norm_squared() > consts::EPSILON * consts::EPSILON {
            self.movement
        } else {
            self.model_forward()
        };
        physics.add_velocity(self.id, direction * self.config.dash_speed);
    }

    /// Hit by an enemy: lose health, get knocked up and away, and drop
    /// input on the floor until the shock wears off.
    pub fn on_damaged(
        &mut self,
        away_from_enemy: Vector3<f32>,
        damage: f32,
        physics: &mut PhysicsWorld,
    ) {
        if self.health > 0.0 {
            self.health -= damage;
        }
        let shock = (Vector3::y() + away_from_enemy)
            .try_normalize(consts::EPSILON)
            .unwrap_or_else(Vector3::y);
        physics.add_velocity(self.id, shock * self.config.shock_speed);

        self.input_lock_remaining = self.config.shock_time;
        self.move_input = Vector2::zeros();
    }

    /// Presentation-rate bookkeeping: countdowns and model facing.
    pub fn frame_tick(&mut self, dt: f32) {
        self.attack_delay_remaining -= dt;
        self.dash_cooldown_remaining -= dt;
        self.input_lock_remaining -= dt;
        self.locomotion.frame_tick(dt);

        if self.dashing {
            self.dash_remaining -= dt;
            if self.dash_remaining <= 0.0 {
                self.dashing = false;
                self.dash_cooldown_remaining = self.config.dash_cooldown;
            }
        }

        if !self.dashing && self.movement.norm_squared() > consts::EPSILON * consts::EPSILON {
            let target = heading_degrees(self.movement);
            self.model_yaw = move_towards_angle(
                self.model_yaw,
                target,
                self.config.rotation_speed * dt,
            );
        }
    }

    /// One physics step: rebuild the movement intent in the reference frame,
    /// run locomotion, write the velocity back.
    pub fn physics_tick(
        &mut self,
        physics: &mut PhysicsWorld,
        reference_yaw: Option<f32>,
        dt: f32,
    ) {
        let (right, forward) = match reference_yaw {
            Some(yaw) => yaw_axes(yaw),
            None => (Vector3::x(), Vector3::z()),
        };
        self.movement = right * self.move_input.x + forward * self.move_input.y;
        let desired_velocity = self.movement * self.config.max_speed;

        let Some(velocity) = physics.velocity(self.id) else {
            return;
        };

        let id = self.id;
        let probe_distance = self.locomotion.tuning().probe_distance;
        let new_velocity = self.locomotion.physics_tick(
            velocity,
            desired_velocity,
            !self.dashing,
            dt,
            || physics.ground_probe(id, probe_distance),
        );
        physics.set_velocity(id, new_velocity);
    }
}
