use crate::domain::events::SimEvent;
use crate::domain::state::World;
use rand::Rng;
use tracing::{info, warn};

/// Applies a random population loss for each impact in `events`.
///
/// Loss is uniform in `0..=max_per_impact`; the draw order follows the impact order so a
/// seeded RNG replays identically.
pub fn apply_impacts<R: Rng + ?Sized>(
    world: &mut World,
    events: &[SimEvent],
    rng: &mut R,
    max_per_impact: u64,
) -> Vec<SimEvent> {
    let mut casualties = Vec::new();

    for event in events {
        let SimEvent::Impact { target, .. } = event else {
            continue;
        };
        let Some(region) = world.region_mut(target) else {
            warn!(faction = %target.faction, region = %target.region, "impact on unknown region");
            continue;
        };

        let loss = rng.random_range(0..=max_per_impact);
        let (before, after) = region.apply_casualties(loss);
        info!(
            region = %region.name,
            before_strike_population = before,
            after_strike_population = after,
            "region hit by missile"
        );
        casualties.push(SimEvent::Casualties {
            region: target.clone(),
            before,
            after,
        });
    }

    casualties
}
