//! Pair-wise contact lifecycle across physics steps.
//!
//! The engine reports which collider pairs touch during a step; gameplay
//! wants edges (enemy reached the player, bullet struck something) plus the
//! contact direction for knockback. Pairs are keyed (low id, high id) and
//! carry the step's summed manifold normal oriented toward the lower id, so
//! several simultaneous manifolds from one pair collapse into a single event.

use std::collections::HashMap;

use nalgebra::Vector3;

/// Contacting pairs observed in one physics step, with aggregate normals.
#[derive(Debug, Default, Clone)]
pub struct ContactSet {
    pairs: HashMap<(u64, u64), Vector3<f32>>,
}

impl ContactSet {
    pub fn new() -> Self {
        Self {
            pairs: HashMap::new(),
        }
    }

    /// Add one manifold between two entities. `normal_toward_a` is the
    /// world-space contact normal oriented toward entity `a`.
    pub fn record(&mut self, a: u64, b: u64, normal_toward_a: Vector3<f32>) {
        let (key, oriented) = if a <= b {
            ((a, b), normal_toward_a)
        } else {
            ((b, a), -normal_toward_a)
        };
        *self.pairs.entry(key).or_insert_with(Vector3::zeros) += oriented;
    }

    pub fn touching(&self, a: u64, b: u64) -> bool {
        self.pairs.contains_key(&ordered(a, b))
    }

    /// Summed contact normal oriented toward `toward`, if the pair touched.
    pub fn normal_toward(&self, toward: u64, other: u64) -> Option<Vector3<f32>> {
        let normal = self.pairs.get(&ordered(toward, other))?;
        Some(if toward <= other { *normal } else { -*normal })
    }

    pub fn clear(&mut self) {
        self.pairs.clear();
    }

    /// Pairs that started or stopped touching since the previous step.
    pub fn transitions(&self, previous: &ContactSet) -> ContactTransitions {
        let began = self
            .pairs
            .keys()
            .filter(|pair| !previous.pairs.contains_key(pair))
            .copied()
            .collect();

        let ended = previous
            .pairs
            .keys()
            .filter(|pair| !self.pairs.contains_key(pair))
            .copied()
            .collect();

        ContactTransitions { began, ended }
    }
}

/// Pair-wise contact begin/end edges for one step.
#[derive(Debug, Default, Clone)]
pub struct ContactTransitions {
    pub began: Vec<(u64, u64)>,
    pub ended: Vec<(u64, u64)>,
}

fn ordered(a: u64, b: u64) -> (u64, u64) {
    if a <= b {
        (a, b)
    } else {
        (b, a)
    }
}
