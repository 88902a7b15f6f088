use super::GameWorld;

/// Executes simulation phases for one fixed physics step.
/// Ordered so every contact the engine produced for the step has arrived
/// before any ground-state resolution consumes it:
/// step -> collect contacts -> locomotion -> contact events.
pub(super) fn run_tick_phases(world: &mut GameWorld, dt: f32) {
    // Integrate the velocities written last step and rebuild the narrow
    // phase; scene queries refresh so the ground probe sees this step.
    world.physics.step(dt);
    world.physics.update_queries();

    // All contacts for the step land in the accumulators and the pair set.
    world.collect_contacts();

    // Per agent: resolve ground state, plan velocity, consume a buffered
    // jump, write the velocity back. Step-scoped contact sums clear here.
    world.update_locomotion(dt);

    // Contact edges against the previous step: touch damage, bullet impacts.
    world.fire_contact_events();

    world.tick += 1;
}
