//! Simulation and entity constants.
//! Centralizing these prevents bugs from duplicated hardcoded values.

/// Physics constants
pub mod physics {
    /// Fixed timestep for physics simulation (60 Hz)
    pub const TIMESTEP: f32 = 1.0 / 60.0;

    /// World gravity in m/s², applied by the engine to free bodies (bullets).
    /// Locomotion agents integrate their own airborne gravity instead.
    pub const WORLD_GRAVITY: f32 = 9.81;

    /// Agent capsule radius
    pub const AGENT_RADIUS: f32 = 0.5;

    /// Agent capsule total height
    pub const AGENT_HEIGHT: f32 = 2.0;

    /// Bullet collider radius
    pub const BULLET_RADIUS: f32 = 0.15;

    /// Small epsilon for float comparisons and safe normalization
    pub const EPSILON: f32 = 1.0e-4;

    /// Contact normals with a vertical component at or below this are
    /// ceiling-like and irrelevant to locomotion.
    pub const STEEP_MIN_DOT: f32 = -0.01;
}

/// Attack and projectile constants
pub mod combat {
    use super::physics;

    /// Forward offset of the muzzle from the agent center, past the capsule.
    pub const MUZZLE_FORWARD: f32 = physics::AGENT_RADIUS + physics::BULLET_RADIUS + 0.2;

    /// Vertical offset of the muzzle from the agent center.
    pub const MUZZLE_UP: f32 = 0.5;
}
