//! Property tests for the locomotion core, exercised without a physics
//! world: contacts are fed directly and the ground probe is a closure, so
//! every assertion is exact.

use nalgebra::Vector3;

use skirmish::config::PlayerConfig;
use skirmish::game::constants::physics::TIMESTEP;
use skirmish::game::locomotion::{LocomotionController, ProbeHit};

fn controller() -> LocomotionController {
    LocomotionController::new(PlayerConfig::default().locomotion())
}

#[test]
fn test_ground_contacts_resolve_to_normalized_aggregate() {
    let mut c = controller();
    let slope = Vector3::new(1.0, 2.0, 0.0).normalize();
    c.record_contact(Vector3::y());
    c.record_contact(slope);

    c.physics_tick(Vector3::zeros(), Vector3::zeros(), true, TIMESTEP, || None);

    let state = c.state();
    assert!(state.grounded);
    let expected = (Vector3::y() + slope).normalize();
    assert!((state.contact_normal - expected).norm() < 1.0e-5);
    assert!((state.contact_normal.norm() - 1.0).abs() < 1.0e-5);
}

#[test]
fn test_single_steep_contact_is_not_ground() {
    let mut c = controller();
    let steep = Vector3::new(1.0, 0.1, 0.0).normalize();
    c.record_contact(steep);

    c.physics_tick(Vector3::zeros(), Vector3::zeros(), true, TIMESTEP, || None);

    assert!(!c.is_grounded());
    assert!(c.state().on_steep);
    // Airborne projection falls back to the up plane.
    assert_eq!(c.state().contact_normal, Vector3::y());
}

#[test]
fn test_two_steep_contacts_promote_to_walkable_seam() {
    let mut c = controller();
    c.record_contact(Vector3::new(1.0, 1.0, 0.0).normalize());
    c.record_contact(Vector3::new(-1.0, 1.0, 0.0).normalize());

    c.physics_tick(Vector3::zeros(), Vector3::zeros(), true, TIMESTEP, || None);

    assert!(c.is_grounded());
    assert!((c.state().contact_normal - Vector3::y()).norm() < 1.0e-5);
}

#[test]
fn test_snap_is_suppressed_right_after_a_jump() {
    let mut c = controller();
    c.record_contact(Vector3::y());
    c.request_jump();
    let velocity = c.physics_tick(Vector3::zeros(), Vector3::zeros(), true, TIMESTEP, || None);
    assert!(velocity.y > 20.0, "jump should have fired, got {}", velocity.y);

    // A perfectly good floor sits below, but the jump is 1 step old.
    let mut probe_called = false;
    c.physics_tick(velocity, Vector3::zeros(), true, TIMESTEP, || {
        probe_called = true;
        Some(ProbeHit {
            distance: 0.1,
            normal: Vector3::y(),
        })
    });

    assert!(!probe_called, "the probe must not even be consulted");
    assert!(!c.is_grounded());
}

#[test]
fn test_snap_reprojects_velocity_and_preserves_speed() {
    let mut c = controller();
    // Walk long enough that the last jump is stale.
    for _ in 0..5 {
        c.record_contact(Vector3::y());
        c.physics_tick(Vector3::zeros(), Vector3::zeros(), true, TIMESTEP, || None);
    }

    // Launching off a slope edge: no contacts this step, floor just below.
    let launch = Vector3::new(5.0, 2.0, 0.0);
    let velocity = c.physics_tick(launch, Vector3::zeros(), false, TIMESTEP, || {
        Some(ProbeHit {
            distance: 0.5,
            normal: Vector3::y(),
        })
    });

    assert!(c.is_grounded(), "snap should reattach the body");
    // Gravity applied on the contactless step, then the upward component is
    // bent back into the plane with speed preserved.
    let after_gravity = Vector3::new(5.0, 2.0 - c.tuning().jump_gravity * TIMESTEP, 0.0);
    let expected = Vector3::new(after_gravity.norm(), 0.0, 0.0);
    assert!(
        (velocity - expected).norm() < 1.0e-4,
        "expected {:?}, got {:?}",
        expected,
        velocity
    );
}

#[test]
fn test_snap_refuses_above_max_snap_speed() {
    let config = PlayerConfig {
        max_snap_speed: 10.0,
        ..Default::default()
    };
    let mut c = LocomotionController::new(config.locomotion());
    for _ in 0..5 {
        c.record_contact(Vector3::y());
        c.physics_tick(Vector3::zeros(), Vector3::zeros(), true, TIMESTEP, || None);
    }

    let mut probe_called = false;
    c.physics_tick(
        Vector3::new(20.0, 0.0, 0.0),
        Vector3::zeros(),
        false,
        TIMESTEP,
        || {
            probe_called = true;
            Some(ProbeHit {
                distance: 0.1,
                normal: Vector3::y(),
            })
        },
    );

    assert!(!probe_called);
    assert!(!c.is_grounded());
}

#[test]
fn test_planner_never_touches_the_normal_component() {
    let mut c = controller();
    let normal = Vector3::new(0.0, 4.0, 3.0).normalize();
    c.record_contact(normal);

    let before = Vector3::new(1.0, 0.5, -2.0);
    let after = c.physics_tick(before, Vector3::new(3.0, 0.0, 0.0), true, TIMESTEP, || None);

    assert!(
        (after.dot(&normal) - before.dot(&normal)).abs() < 1.0e-5,
        "component along the contact normal must be preserved"
    );
    assert!((after - before).norm() > 1.0e-4, "the in-plane part should move");
}

#[test]
fn test_planner_acceleration_is_bounded_per_step() {
    let mut c = controller();
    c.record_contact(Vector3::y());
    let desired = Vector3::new(15.0, 0.0, 0.0);
    let velocity = c.physics_tick(Vector3::zeros(), desired, true, TIMESTEP, || None);

    // Grounded acceleration is 100: one step moves exactly accel * dt.
    assert!((velocity.x - 100.0 * TIMESTEP).abs() < 1.0e-4);
    assert!(velocity.y.abs() < 1.0e-6);

    // Airborne control is weaker (25) and gravity pulls down.
    let mut c = controller();
    let velocity = c.physics_tick(Vector3::zeros(), desired, true, TIMESTEP, || None);
    assert!((velocity.x - 25.0 * TIMESTEP).abs() < 1.0e-4);
    assert!(velocity.y < 0.0);
}

#[test]
fn test_jump_speed_compensates_for_aligned_velocity() {
    let jump_with_initial = |vertical: f32| -> f32 {
        let mut c = controller();
        c.record_contact(Vector3::y());
        c.request_jump();
        let velocity = c.physics_tick(
            Vector3::new(0.0, vertical, 0.0),
            Vector3::zeros(),
            true,
            TIMESTEP,
            || None,
        );
        velocity.y
    };

    let jump_speed = PlayerConfig::default().locomotion().jump_speed;
    // From rest the full take-off speed is added.
    assert!((jump_with_initial(0.0) - jump_speed).abs() < 1.0e-3);
    // Already rising at half speed: topped up, not stacked.
    assert!((jump_with_initial(jump_speed / 2.0) - jump_speed).abs() < 1.0e-3);
    // Rising faster than the take-off speed: nothing added.
    assert!((jump_with_initial(2.0 * jump_speed) - 2.0 * jump_speed).abs() < 1.0e-3);
}

#[test]
fn test_jump_off_a_steep_wall_blends_with_the_slope() {
    let mut c = controller();
    let steep = Vector3::new(1.0, 0.1, 0.0).normalize();
    c.record_contact(steep);
    c.request_jump();

    let velocity = c.physics_tick(Vector3::zeros(), Vector3::zeros(), true, TIMESTEP, || None);

    let start = Vector3::new(0.0, -c.tuning().jump_gravity * TIMESTEP, 0.0);
    let direction = (steep + Vector3::y()).normalize();
    let expected = start + direction * c.tuning().jump_speed;
    assert!(
        (velocity - expected).norm() < 1.0e-3,
        "expected {:?}, got {:?}",
        expected,
        velocity
    );
}

#[test]
fn test_jump_buffer_fires_inside_the_window_only() {
    // Buffered at t=0, grounded at t=0.15: still fires.
    let mut c = controller();
    c.request_jump();
    for _ in 0..3 {
        c.frame_tick(0.05);
    }
    c.record_contact(Vector3::y());
    let velocity = c.physics_tick(Vector3::zeros(), Vector3::zeros(), true, TIMESTEP, || None);
    assert!(velocity.y > 20.0);

    // Grounded at t=0.25: the 0.2 s window has lapsed, no jump.
    let mut c = controller();
    c.request_jump();
    for _ in 0..5 {
        c.frame_tick(0.05);
    }
    c.record_contact(Vector3::y());
    let velocity = c.physics_tick(Vector3::zeros(), Vector3::zeros(), true, TIMESTEP, || None);
    assert!(velocity.y.abs() < 1.0e-4);
}

#[test]
fn test_take_off_then_one_airborne_step_of_gravity() {
    let mut c = controller();
    c.record_contact(Vector3::y());
    c.request_jump();
    let after_jump = c.physics_tick(Vector3::zeros(), Vector3::zeros(), true, TIMESTEP, || None);
    let tuning = *c.tuning();
    assert!((after_jump.y - tuning.jump_speed).abs() < 1.0e-3);

    // Next step has no contacts: exactly one step of jump gravity comes off.
    let airborne = c.physics_tick(after_jump, Vector3::zeros(), true, TIMESTEP, || None);
    let expected = tuning.jump_speed - tuning.jump_gravity * TIMESTEP;
    assert!((airborne.y - expected).abs() < 1.0e-3);
}
