//! World orchestration: entity lifecycles and the two tick rates.
//!
//! A [`GameWorld`] runs a variable-rate presentation frame (input draining,
//! countdown timers, model facing, the camera) around a fixed 60 Hz physics
//! tick (contact resolution, locomotion, jump consumption). The two rates
//! are never conflated; see `tick_pipeline` for the per-step phase order.

pub mod bullet;
pub mod camera;
pub mod constants;
pub mod contact_events;
pub mod contacts;
pub mod enemy;
pub mod input;
pub mod locomotion;
pub mod physics;
pub mod player;
mod tick_pipeline;

use std::collections::HashMap;

use log::{debug, info};
use nalgebra::{UnitQuaternion, Vector3};

use crate::config::GameConfig;

use bullet::Bullet;
use camera::OrbitCamera;
use constants::physics as consts;
use contact_events::ContactSet;
use enemy::Enemy;
use input::{InputEvent, InputHandle, InputQueue};
use physics::PhysicsWorld;
use player::Player;

/// Half extent of the square demo arena.
pub const ARENA_HALF_EXTENT: f32 = 25.0;
const WALL_HEIGHT: f32 = 3.0;

pub struct GameWorld {
    pub config: GameConfig,
    pub physics: PhysicsWorld,
    pub player: Player,
    pub enemies: HashMap<u64, Enemy>,
    pub bullets: Vec<Bullet>,
    pub camera: OrbitCamera,
    pub tick: u64,
    input_handle: InputHandle,
    input_queue: InputQueue,
    contacts: ContactSet,
    previous_contacts: ContactSet,
    step_accumulator: f32,
    next_id: u64,
}

impl GameWorld {
    pub fn new(config: GameConfig) -> Self {
        let (input_handle, input_queue) = input::channel();
        let mut physics = PhysicsWorld::new();

        let player_id = 1;
        let player_spawn = Vector3::new(0.0, 2.0, 0.0);
        physics.add_agent(player_id, player_spawn);
        let player = Player::new(player_id, &config.player);
        let camera = OrbitCamera::new(&config.camera, player_spawn);

        Self {
            config,
            physics,
            player,
            enemies: HashMap::new(),
            bullets: Vec::new(),
            camera,
            tick: 0,
            input_handle,
            input_queue,
            contacts: ContactSet::new(),
            previous_contacts: ContactSet::new(),
            step_accumulator: 0.0,
            next_id: player_id,
        }
    }

    /// Handle for whatever owns the input devices.
    pub fn input_handle(&self) -> InputHandle {
        self.input_handle.clone()
    }

    pub fn spawn_enemy(&mut self, position: Vector3<f32>) -> u64 {
        let id = self.allocate_id();
        self.physics.add_agent(id, position);
        self.enemies.insert(id, Enemy::new(id, &self.config.enemy));
        info!("enemy {} spawned at ({:.1}, {:.1}, {:.1})", id, position.x, position.y, position.z);
        id
    }

    /// Build the demo scene: a floor slab, boundary walls, a walkable ramp,
    /// a too-steep wedge, and a pillar that can block the camera.
    pub fn spawn_arena(&mut self) {
        let flat = UnitQuaternion::identity();
        let ground = self.allocate_id();
        self.physics.add_static_box(
            ground,
            Vector3::new(0.0, -0.5, 0.0),
            Vector3::new(ARENA_HALF_EXTENT, 0.5, ARENA_HALF_EXTENT),
            flat,
        );

        let wall_poses = [
            (Vector3::new(ARENA_HALF_EXTENT, WALL_HEIGHT / 2.0, 0.0), Vector3::new(0.5, WALL_HEIGHT / 2.0, ARENA_HALF_EXTENT)),
            (Vector3::new(-ARENA_HALF_EXTENT, WALL_HEIGHT / 2.0, 0.0), Vector3::new(0.5, WALL_HEIGHT / 2.0, ARENA_HALF_EXTENT)),
            (Vector3::new(0.0, WALL_HEIGHT / 2.0, ARENA_HALF_EXTENT), Vector3::new(ARENA_HALF_EXTENT, WALL_HEIGHT / 2.0, 0.5)),
            (Vector3::new(0.0, WALL_HEIGHT / 2.0, -ARENA_HALF_EXTENT), Vector3::new(ARENA_HALF_EXTENT, WALL_HEIGHT / 2.0, 0.5)),
        ];
        for (position, half_extents) in wall_poses {
            let id = self.allocate_id();
            self.physics.add_static_box(id, position, half_extents, flat);
        }

        // 25° is inside the 40° ground angle: walkable.
        let ramp = self.allocate_id();
        self.physics.add_static_box(
            ramp,
            Vector3::new(12.0, 2.0, 8.0),
            Vector3::new(6.0, 0.5, 4.0),
            UnitQuaternion::from_axis_angle(&Vector3::z_axis(), 25.0_f32.to_radians()),
        );

        // 55° is past it: a steep wall the controller must not stand on.
        let wedge = self.allocate_id();
        self.physics.add_static_box(
            wedge,
            Vector3::new(-12.0, 2.0, 8.0),
            Vector3::new(4.0, 0.5, 4.0),
            UnitQuaternion::from_axis_angle(&Vector3::z_axis(), 55.0_f32.to_radians()),
        );

        let pillar = self.allocate_id();
        self.physics.add_static_box(
            pillar,
            Vector3::new(-8.0, 3.0, -8.0),
            Vector3::new(1.0, 3.0, 1.0),
            flat,
        );

        info!("arena spawned");
    }

    /// Run one presentation frame of `dt` seconds: drain input, advance as
    /// many fixed physics steps as `dt` covers, then the frame-rate systems.
    pub fn frame(&mut self, dt: f32) {
        self.drain_input();

        self.step_accumulator += dt;
        while self.step_accumulator >= consts::TIMESTEP {
            self.step_accumulator -= consts::TIMESTEP;
            tick_pipeline::run_tick_phases(self, consts::TIMESTEP);
        }

        self.presentation_tick(dt);

        let focus = self
            .physics
            .position(self.player.id())
            .unwrap_or_else(|| self.camera.focus());
        self.camera.update(dt, focus, &self.physics);
    }

    fn allocate_id(&mut self) -> u64 {
        self.next_id += 1;
        self.next_id
    }

    fn drain_input(&mut self) {
        let events: Vec<InputEvent> = self.input_queue.drain().collect();
        for event in events {
            match event {
                InputEvent::Look(look) => self.camera.on_look(look),
                // Shock lock: the player drops its signals on the floor.
                _ if self.player.input_locked() => {}
                InputEvent::Move(input) => self.player.on_move(input),
                InputEvent::Jump => self.player.on_jump(),
                InputEvent::JumpCanceled => self.player.on_jump_canceled(&mut self.physics),
                InputEvent::Attack => self.attack(),
                InputEvent::Dash => self.player.on_dash(&mut self.physics),
            }
        }
    }

    fn attack(&mut self) {
        let enemy_positions: Vec<Vector3<f32>> = self
            .enemies
            .keys()
            .filter_map(|&id| self.physics.position(id))
            .collect();

        if let Some(spawn) = self.player.on_attack(&self.physics, &enemy_positions) {
            let id = self.allocate_id();
            self.physics.add_bullet(id, spawn.position, spawn.velocity);
            self.bullets.push(Bullet::new(id, self.config.bullet.life_span));
            debug!("bullet {} fired", id);
        }
    }

    /// Pull this step's contact manifolds out of the narrow phase: every
    /// pair goes into the step's contact set, and normals against static
    /// geometry feed the locomotion accumulators.
    fn collect_contacts(&mut self) {
        std::mem::swap(&mut self.previous_contacts, &mut self.contacts);
        self.contacts.clear();

        for report in self.physics.contact_reports() {
            self.contacts.record(report.a, report.b, report.normal_toward_a);

            if self.physics.is_static(report.b) {
                self.record_agent_contact(report.a, report.normal_toward_a);
            }
            if self.physics.is_static(report.a) {
                self.record_agent_contact(report.b, -report.normal_toward_a);
            }
        }
    }

    fn record_agent_contact(&mut self, id: u64, normal: Vector3<f32>) {
        if id == self.player.id() {
            self.player.record_contact(normal);
        } else if let Some(enemy) = self.enemies.get_mut(&id) {
            enemy.record_contact(normal);
        }
    }

    fn update_locomotion(&mut self, dt: f32) {
        let player_position = self.physics.position(self.player.id());
        let camera_yaw = self.camera.yaw();

        self.player.physics_tick(&mut self.physics, Some(camera_yaw), dt);
        for enemy in self.enemies.values_mut() {
            enemy.physics_tick(&mut self.physics, player_position, dt);
        }
    }

    /// Turn this step's contact set against the previous one into gameplay:
    /// an enemy reaching the player deals damage once per touch, and bullets
    /// die on their first contact. Repeated manifolds within one touch never
    /// double-fire.
    fn fire_contact_events(&mut self) {
        let transitions = self.contacts.transitions(&self.previous_contacts);

        for &(a, b) in &transitions.began {
            if let Some((enemy_id, player_id)) = self.enemy_player_pair(a, b) {
                let toward_player = self
                    .contacts
                    .normal_toward(player_id, enemy_id)
                    .unwrap_or_else(Vector3::y);
                if let Some(enemy) = self.enemies.get_mut(&enemy_id) {
                    let damage = enemy.begin_player_touch();
                    self.player.on_damaged(toward_player, damage, &mut self.physics);
                    debug!("enemy {} hit the player for {}", enemy_id, damage);
                }
            }

            self.resolve_bullet_impact(a, b);
            self.resolve_bullet_impact(b, a);
        }

        for &(a, b) in &transitions.ended {
            if let Some((enemy_id, _)) = self.enemy_player_pair(a, b) {
                if let Some(enemy) = self.enemies.get_mut(&enemy_id) {
                    enemy.end_player_touch();
                }
            }
        }
    }

    fn enemy_player_pair(&self, a: u64, b: u64) -> Option<(u64, u64)> {
        let player_id = self.player.id();
        if a == player_id && self.enemies.contains_key(&b) {
            Some((b, a))
        } else if b == player_id && self.enemies.contains_key(&a) {
            Some((a, b))
        } else {
            None
        }
    }

    fn resolve_bullet_impact(&mut self, bullet_id: u64, other: u64) {
        if !self.bullets.iter().any(|b| b.id == bullet_id) {
            return;
        }
        if let Some(enemy) = self.enemies.get_mut(&other) {
            enemy.on_shot(self.config.bullet.damage);
            debug!("bullet {} struck enemy {}", bullet_id, other);
        }
        self.despawn_bullet(bullet_id);
    }

    fn despawn_bullet(&mut self, id: u64) {
        self.physics.remove(id);
        self.bullets.retain(|b| b.id != id);
    }

    /// Frame-rate systems: countdowns, model facing, bullet lifetimes, and
    /// removal of spent entities.
    fn presentation_tick(&mut self, dt: f32) {
        self.player.frame_tick(dt);
        for enemy in self.enemies.values_mut() {
            enemy.frame_tick(dt);
        }

        let expired: Vec<u64> = self
            .bullets
            .iter_mut()
            .filter_map(|b| b.frame_tick(dt).then_some(b.id))
            .collect();
        for id in expired {
            self.despawn_bullet(id);
        }

        let dead: Vec<u64> = self
            .enemies
            .iter()
            .filter(|(_, enemy)| enemy.is_dead())
            .map(|(&id, _)| id)
            .collect();
        for id in dead {
            self.enemies.remove(&id);
            self.physics.remove(id);
            info!("enemy {} destroyed", id);
        }
    }
}
