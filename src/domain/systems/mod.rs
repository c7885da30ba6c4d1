// Per-tick simulation systems.

pub mod casualties;
pub mod flight;

use super::events::SimEvent;
use super::state::World;
use super::tuning::missile::MissileTuning;
use rand::Rng;

/// Advances the world by one tick and returns every event it produced.
///
/// Runs to completion without awaiting; impacts are listed before the casualties they caused.
pub fn advance<R: Rng + ?Sized>(
    world: &mut World,
    rng: &mut R,
    tuning: &MissileTuning,
) -> Vec<SimEvent> {
    world.advance_tick();
    let mut events = flight::tick_missiles(world, tuning);
    let casualties =
        casualties::apply_impacts(world, &events, rng, tuning.max_casualties_per_impact);
    events.extend(casualties);
    events
}
