//! Step-scoped classification of collision-contact normals.
//!
//! Every contact the engine reports for an agent during one physics step is
//! classified by the vertical component of its normal: walkable ground, a
//! steep wall, or an overhang that locomotion ignores. The sums live only for
//! the step that produced them.

use nalgebra::Vector3;

use super::constants::physics as consts;

/// Classified contact-normal sums for the current physics step.
#[derive(Debug, Clone)]
pub struct ContactAccumulator {
    ground_count: u32,
    steep_count: u32,
    ground_sum: Vector3<f32>,
    steep_sum: Vector3<f32>,
}

impl ContactAccumulator {
    pub fn new() -> Self {
        Self {
            ground_count: 0,
            steep_count: 0,
            ground_sum: Vector3::zeros(),
            steep_sum: Vector3::zeros(),
        }
    }

    /// Record one contact normal, classifying it against the ground threshold.
    /// An agent touching several bodies (or one body at several points) calls
    /// this once per reported contact; the sums tolerate duplicates.
    pub fn record(&mut self, normal: Vector3<f32>, min_ground_dot: f32) {
        if normal.y >= min_ground_dot {
            self.ground_count += 1;
            self.ground_sum += normal;
        } else if normal.y > consts::STEEP_MIN_DOT {
            self.steep_count += 1;
            self.steep_sum += normal;
        }
    }

    pub fn ground_count(&self) -> u32 {
        self.ground_count
    }

    pub fn steep_count(&self) -> u32 {
        self.steep_count
    }

    /// Unit aggregate of the ground contacts, if any and non-degenerate.
    pub fn ground_aggregate(&self) -> Option<Vector3<f32>> {
        aggregate(self.ground_sum, self.ground_count)
    }

    /// Unit aggregate of the steep contacts, if any and non-degenerate.
    pub fn steep_aggregate(&self) -> Option<Vector3<f32>> {
        aggregate(self.steep_sum, self.steep_count)
    }

    /// Reset for the next step. Called exactly once per physics step, after
    /// ground-state resolution has consumed the sums.
    pub fn clear(&mut self) {
        self.ground_count = 0;
        self.steep_count = 0;
        self.ground_sum = Vector3::zeros();
        self.steep_sum = Vector3::zeros();
    }
}

impl Default for ContactAccumulator {
    fn default() -> Self {
        Self::new()
    }
}

/// A single unit normal passes through unchanged; two or more are normalized.
/// Opposing normals can sum to nearly zero, which is no plane at all.
fn aggregate(sum: Vector3<f32>, count: u32) -> Option<Vector3<f32>> {
    match count {
        0 => None,
        1 => Some(sum),
        _ => sum.try_normalize(consts::EPSILON),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const GROUND_DOT: f32 = 0.766; // cos(40°)

    #[test]
    fn test_classifies_by_vertical_component() {
        let mut acc = ContactAccumulator::new();
        acc.record(Vector3::new(0.0, 1.0, 0.0), GROUND_DOT);
        acc.record(Vector3::new(0.995, 0.0995, 0.0), GROUND_DOT);
        acc.record(Vector3::new(0.0, -1.0, 0.0), GROUND_DOT); // ceiling, ignored

        assert_eq!(acc.ground_count(), 1);
        assert_eq!(acc.steep_count(), 1);
        assert_eq!(acc.ground_aggregate(), Some(Vector3::new(0.0, 1.0, 0.0)));
    }

    #[test]
    fn test_multiple_ground_normals_are_normalized() {
        let mut acc = ContactAccumulator::new();
        let slope = Vector3::new(1.0, 2.0, 0.0).normalize();
        acc.record(Vector3::y(), GROUND_DOT);
        acc.record(slope, GROUND_DOT);

        let aggregate = acc.ground_aggregate().unwrap();
        assert!((aggregate.norm() - 1.0).abs() < 1.0e-5);
        let expected = (Vector3::y() + slope).normalize();
        assert!((aggregate - expected).norm() < 1.0e-5);
    }

    #[test]
    fn test_opposing_steep_normals_have_no_aggregate() {
        let mut acc = ContactAccumulator::new();
        acc.record(Vector3::new(1.0, 0.0, 0.0), GROUND_DOT);
        acc.record(Vector3::new(-1.0, 0.0, 0.0), GROUND_DOT);

        assert_eq!(acc.steep_count(), 2);
        assert_eq!(acc.steep_aggregate(), None);
    }

    #[test]
    fn test_clear_resets_everything() {
        let mut acc = ContactAccumulator::new();
        acc.record(Vector3::y(), GROUND_DOT);
        acc.clear();

        assert_eq!(acc.ground_count(), 0);
        assert_eq!(acc.ground_aggregate(), None);
    }
}
