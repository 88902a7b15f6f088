//! Wrapper around the rapier3d physics world.
//!
//! Owns the rigid-body and collider sets plus the query pipeline, maps game
//! entity ids to handles, and exposes the narrow slice of the engine the
//! gameplay code needs: velocity read/write, per-step contact enumeration,
//! the downward ground probe, and the camera's obstruction cast.

use std::collections::HashMap;

use nalgebra::{Isometry3, Translation3, UnitQuaternion, Vector3};
use rapier3d::parry::query::ShapeCastOptions;
use rapier3d::prelude::*;

use super::constants::physics as consts;
use super::locomotion::ProbeHit;

// Static geometry is group 1 so scene queries (ground probe, camera cast)
// can ignore agents and bullets.
const GROUP_STATIC: Group = Group::GROUP_1;
const GROUP_AGENT: Group = Group::GROUP_2;
const GROUP_BULLET: Group = Group::GROUP_3;

/// One contact manifold between two entities observed this step.
/// `normal_toward_a` is the world-space surface normal oriented toward `a`.
#[derive(Debug, Clone, Copy)]
pub struct ContactReport {
    pub a: u64,
    pub b: u64,
    pub normal_toward_a: Vector3<f32>,
}

pub struct PhysicsWorld {
    pub gravity: Vector<Real>,
    pub rigid_body_set: RigidBodySet,
    pub collider_set: ColliderSet,
    pub integration_parameters: IntegrationParameters,
    pub physics_pipeline: PhysicsPipeline,
    pub island_manager: IslandManager,
    pub broad_phase: DefaultBroadPhase,
    pub narrow_phase: NarrowPhase,
    pub impulse_joint_set: ImpulseJointSet,
    pub multibody_joint_set: MultibodyJointSet,
    pub ccd_solver: CCDSolver,
    pub query_pipeline: QueryPipeline,

    entity_to_body: HashMap<u64, RigidBodyHandle>,
    collider_to_entity: HashMap<ColliderHandle, u64>,
}

impl PhysicsWorld {
    pub fn new() -> Self {
        Self {
            gravity: vector![0.0, -consts::WORLD_GRAVITY, 0.0],
            rigid_body_set: RigidBodySet::new(),
            collider_set: ColliderSet::new(),
            integration_parameters: IntegrationParameters::default(),
            physics_pipeline: PhysicsPipeline::new(),
            island_manager: IslandManager::new(),
            broad_phase: DefaultBroadPhase::new(),
            narrow_phase: NarrowPhase::new(),
            impulse_joint_set: ImpulseJointSet::new(),
            multibody_joint_set: MultibodyJointSet::new(),
            ccd_solver: CCDSolver::new(),
            query_pipeline: QueryPipeline::new(),
            entity_to_body: HashMap::new(),
            collider_to_entity: HashMap::new(),
        }
    }

    /// Steps the physics simulation forward by dt seconds
    pub fn step(&mut self, dt: f32) {
        self.integration_parameters.dt = dt;
        self.physics_pipeline.step(
            &self.gravity,
            &self.integration_parameters,
            &mut self.island_manager,
            &mut self.broad_phase,
            &mut self.narrow_phase,
            &mut self.rigid_body_set,
            &mut self.collider_set,
            &mut self.impulse_joint_set,
            &mut self.multibody_joint_set,
            &mut self.ccd_solver,
            Some(&mut self.query_pipeline),
            &(),
            &(),
        );
    }

    /// Refresh the query pipeline so probes and casts see current colliders.
    pub fn update_queries(&mut self) {
        self.query_pipeline.update(&self.collider_set);
    }

    /// Adds an immovable box (floor slab, wall, ramp) to the scene.
    pub fn add_static_box(
        &mut self,
        id: u64,
        position: Vector3<f32>,
        half_extents: Vector3<f32>,
        rotation: UnitQuaternion<f32>,
    ) -> RigidBodyHandle {
        let body = RigidBodyBuilder::fixed()
            .translation(position)
            .rotation(rotation.scaled_axis())
            .build();
        let handle = self.rigid_body_set.insert(body);

        let collider = ColliderBuilder::cuboid(half_extents.x, half_extents.y, half_extents.z)
            .collision_groups(InteractionGroups::new(GROUP_STATIC, Group::ALL))
            .build();
        let collider_handle =
            self.collider_set
                .insert_with_parent(collider, handle, &mut self.rigid_body_set);

        self.entity_to_body.insert(id, handle);
        self.collider_to_entity.insert(collider_handle, id);
        handle
    }

    /// Adds a locomotion agent: a dynamic capsule with rotations locked and
    /// engine gravity disabled; the controller integrates its own gravity.
    /// Zero friction keeps the velocity-driven movement from sticking.
    pub fn add_agent(&mut self, id: u64, position: Vector3<f32>) -> RigidBodyHandle {
        let body = RigidBodyBuilder::dynamic()
            .translation(position)
            .gravity_scale(0.0)
            .lock_rotations()
            .build();
        let handle = self.rigid_body_set.insert(body);

        let half_height = (consts::AGENT_HEIGHT - 2.0 * consts::AGENT_RADIUS).max(0.0) / 2.0;
        let collider = ColliderBuilder::capsule_y(half_height, consts::AGENT_RADIUS)
            .friction(0.0)
            .collision_groups(InteractionGroups::new(GROUP_AGENT, Group::ALL))
            .build();
        let collider_handle =
            self.collider_set
                .insert_with_parent(collider, handle, &mut self.rigid_body_set);

        self.entity_to_body.insert(id, handle);
        self.collider_to_entity.insert(collider_handle, id);
        handle
    }

    /// Adds a bullet: a small fast dynamic ball under engine gravity, with
    /// CCD so it cannot tunnel through walls between steps.
    pub fn add_bullet(
        &mut self,
        id: u64,
        position: Vector3<f32>,
        velocity: Vector3<f32>,
    ) -> RigidBodyHandle {
        let body = RigidBodyBuilder::dynamic()
            .translation(position)
            .linvel(velocity)
            .ccd_enabled(true)
            .build();
        let handle = self.rigid_body_set.insert(body);

        let collider = ColliderBuilder::ball(consts::BULLET_RADIUS)
            .collision_groups(InteractionGroups::new(GROUP_BULLET, Group::ALL))
            .build();
        let collider_handle =
            self.collider_set
                .insert_with_parent(collider, handle, &mut self.rigid_body_set);

        self.entity_to_body.insert(id, handle);
        self.collider_to_entity.insert(collider_handle, id);
        handle
    }

    /// Removes an entity and its body from the world.
    pub fn remove(&mut self, id: u64) -> bool {
        if let Some(handle) = self.entity_to_body.remove(&id) {
            if let Some(body) = self.rigid_body_set.get(handle) {
                for &collider_handle in body.colliders() {
                    self.collider_to_entity.remove(&collider_handle);
                }
            }
            self.rigid_body_set.remove(
                handle,
                &mut self.island_manager,
                &mut self.collider_set,
                &mut self.impulse_joint_set,
                &mut self.multibody_joint_set,
                true,
            );
            true
        } else {
            false
        }
    }

    pub fn contains(&self, id: u64) -> bool {
        self.entity_to_body.contains_key(&id)
    }

    /// True when the entity's body is immovable scene geometry.
    pub fn is_static(&self, id: u64) -> bool {
        self.entity_to_body
            .get(&id)
            .and_then(|h| self.rigid_body_set.get(*h))
            .map(|body| body.is_fixed())
            .unwrap_or(false)
    }

    pub fn position(&self, id: u64) -> Option<Vector3<f32>> {
        let body = self.body(id)?;
        Some(*body.translation())
    }

    pub fn velocity(&self, id: u64) -> Option<Vector3<f32>> {
        let body = self.body(id)?;
        Some(*body.linvel())
    }

    /// Writes the authoritative velocity for the step.
    pub fn set_velocity(&mut self, id: u64, velocity: Vector3<f32>) {
        if let Some(handle) = self.entity_to_body.get(&id) {
            if let Some(body) = self.rigid_body_set.get_mut(*handle) {
                body.set_linvel(velocity, true);
            }
        }
    }

    /// Applies a velocity-change impulse (dash, knockback) on top of
    /// whatever the controller wrote this step.
    pub fn add_velocity(&mut self, id: u64, delta: Vector3<f32>) {
        if let Some(handle) = self.entity_to_body.get(&id) {
            if let Some(body) = self.rigid_body_set.get_mut(*handle) {
                let new_velocity = *body.linvel() + delta;
                body.set_linvel(new_velocity, true);
            }
        }
    }

    /// Every contact manifold between tracked entities this step, one report
    /// per manifold so multiple touch points accumulate like repeated
    /// collision callbacks would.
    pub fn contact_reports(&self) -> Vec<ContactReport> {
        let mut reports = Vec::new();
        for pair in self.narrow_phase.contact_pairs() {
            if !pair.has_any_active_contact {
                continue;
            }
            let (Some(&first), Some(&second)) = (
                self.collider_to_entity.get(&pair.collider1),
                self.collider_to_entity.get(&pair.collider2),
            ) else {
                continue;
            };

            for manifold in &pair.manifolds {
                if manifold.points.is_empty() {
                    continue;
                }
                // Manifold normals point out of the pair's first collider,
                // so they already face the second entity.
                reports.push(ContactReport {
                    a: second,
                    b: first,
                    normal_toward_a: manifold.data.normal,
                });
            }
        }
        reports
    }

    /// Casts a ray straight down from the agent's center against static
    /// geometry, for the ground-snap probe.
    pub fn ground_probe(&self, id: u64, max_distance: f32) -> Option<ProbeHit> {
        let handle = *self.entity_to_body.get(&id)?;
        let body = self.rigid_body_set.get(handle)?;
        let origin = body.translation();

        let ray = Ray::new(
            point![origin.x, origin.y, origin.z],
            vector![0.0, -1.0, 0.0],
        );
        let filter = QueryFilter::default()
            .exclude_rigid_body(handle)
            .exclude_sensors()
            .groups(InteractionGroups::new(GROUP_AGENT, GROUP_STATIC));

        let (_, hit) = self.query_pipeline.cast_ray_and_get_normal(
            &self.rigid_body_set,
            &self.collider_set,
            &ray,
            max_distance,
            true,
            filter,
        )?;

        Some(ProbeHit {
            distance: hit.time_of_impact,
            normal: hit.normal,
        })
    }

    /// Sweeps the camera's near-plane box from the focus toward the desired
    /// camera position. Returns the hit distance when static geometry would
    /// obstruct the view.
    pub fn cast_obstruction(
        &self,
        from: Vector3<f32>,
        direction: Vector3<f32>,
        max_distance: f32,
        half_extents: Vector3<f32>,
        rotation: UnitQuaternion<f32>,
    ) -> Option<f32> {
        let shape = Cuboid::new(vector![
            half_extents.x,
            half_extents.y,
            half_extents.z.max(0.01)
        ]);
        let pose = Isometry3::from_parts(Translation3::from(from), rotation);
        let options = ShapeCastOptions {
            max_time_of_impact: max_distance,
            target_distance: 0.0,
            stop_at_penetration: true,
            compute_impact_geometry_on_penetration: false,
        };
        let filter = QueryFilter::default()
            .exclude_sensors()
            .groups(InteractionGroups::new(GROUP_AGENT, GROUP_STATIC));

        let (_, hit) = self.query_pipeline.cast_shape(
            &self.rigid_body_set,
            &self.collider_set,
            &pose,
            &direction,
            &shape,
            options,
            filter,
        )?;
        Some(hit.time_of_impact)
    }

    fn body(&self, id: u64) -> Option<&RigidBody> {
        self.entity_to_body
            .get(&id)
            .and_then(|h| self.rigid_body_set.get(*h))
    }
}

impl Default for PhysicsWorld {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn flat_floor(world: &mut PhysicsWorld) {
        world.add_static_box(
            1,
            Vector3::new(0.0, -0.5, 0.0),
            Vector3::new(50.0, 0.5, 50.0),
            UnitQuaternion::identity(),
        );
    }

    #[test]
    fn test_agent_settles_on_floor_with_upward_contact() {
        let mut world = PhysicsWorld::new();
        flat_floor(&mut world);
        world.add_agent(10, Vector3::new(0.0, 1.05, 0.0));

        // Engine gravity is off for agents; push down explicitly to land.
        for _ in 0..30 {
            world.set_velocity(10, Vector3::new(0.0, -2.0, 0.0));
            world.step(consts::TIMESTEP);
        }

        let reports = world.contact_reports();
        let toward_agent: Vec<_> = reports
            .iter()
            .map(|r| {
                if r.a == 10 {
                    r.normal_toward_a
                } else {
                    -r.normal_toward_a
                }
            })
            .collect();
        assert!(
            !toward_agent.is_empty(),
            "Agent resting on the floor should report contacts"
        );
        assert!(
            toward_agent.iter().all(|n| n.y > 0.9),
            "Floor contact normals should point up toward the agent, got {:?}",
            toward_agent
        );

        let pos = world.position(10).unwrap();
        assert!(pos.y > 0.8 && pos.y < 1.2, "Agent should rest near y=1, got {}", pos.y);
    }

    #[test]
    fn test_ground_probe_reports_distance_and_normal() {
        let mut world = PhysicsWorld::new();
        flat_floor(&mut world);
        world.add_agent(10, Vector3::new(0.0, 3.0, 0.0));

        world.step(consts::TIMESTEP);
        world.update_queries();

        let hit = world.ground_probe(10, 10.0).expect("Probe should find the floor");
        assert!((hit.distance - 3.0).abs() < 0.1, "got {}", hit.distance);
        assert!(hit.normal.y > 0.99);
    }

    #[test]
    fn test_bullet_falls_under_engine_gravity() {
        let mut world = PhysicsWorld::new();
        world.add_bullet(20, Vector3::new(0.0, 10.0, 0.0), Vector3::new(5.0, 0.0, 0.0));

        for _ in 0..30 {
            world.step(consts::TIMESTEP);
        }

        let pos = world.position(20).unwrap();
        assert!(pos.y < 10.0, "Bullet should drop, got y={}", pos.y);
        assert!(pos.x > 1.0, "Bullet should travel, got x={}", pos.x);
    }

    #[test]
    fn test_remove_clears_entity() {
        let mut world = PhysicsWorld::new();
        world.add_agent(10, Vector3::new(0.0, 1.0, 0.0));

        assert!(world.contains(10));
        assert!(world.remove(10));
        assert!(!world.contains(10));
        assert!(!world.remove(10));
        assert!(world.position(10).is_none());
    }
}
