//! Projectiles fired by the player's attack.

use nalgebra::Vector3;

/// A spawn request produced by an attack, consumed by the world.
#[derive(Debug, Clone, Copy)]
pub struct BulletSpawn {
    pub position: Vector3<f32>,
    pub velocity: Vector3<f32>,
}

/// A live bullet. It dies on its first collision contact or when its
/// lifetime runs out, whichever comes first.
#[derive(Debug, Clone, Copy)]
pub struct Bullet {
    pub id: u64,
    life_remaining: f32,
}

impl Bullet {
    pub fn new(id: u64, life_span: f32) -> Self {
        Self {
            id,
            life_remaining: life_span,
        }
    }

    /// Presentation-rate countdown; true once the lifetime is spent.
    pub fn frame_tick(&mut self, dt: f32) -> bool {
        self.life_remaining -= dt;
        self.life_remaining <= 0.0
    }
}
