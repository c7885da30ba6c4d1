use crate::domain::events::SimEvent;
use crate::domain::geo::{self, Coordinate};
use crate::domain::state::World;
use crate::domain::tuning::missile::MissileTuning;
use tracing::{info, warn};

/// Moves every active missile one step and reports the ones that arrived.
pub fn tick_missiles(world: &mut World, tuning: &MissileTuning) -> Vec<SimEvent> {
    let mut impacts = Vec::new();
    let (missiles, factions) = world.missiles_and_factions_mut();

    for missile in missiles.iter_mut().filter(|m| m.is_active()) {
        let Some(target) = factions
            .get(&missile.target.faction)
            .and_then(|faction| faction.region(&missile.target.region))
        else {
            warn!(
                missile_id = missile.id,
                faction = %missile.target.faction,
                region = %missile.target.region,
                "missile target no longer resolves; skipping"
            );
            continue;
        };
        let target_location = target.location;

        let step = missile.speed_mach * tuning.degrees_per_mach;
        missile.position = geo::bearing_step(missile.position, target_location, step);
        missile.altitude_meters =
            display_altitude(missile.origin, missile.position, target_location, tuning);

        let dlat = (missile.position.latitude - target_location.latitude).abs();
        let dlon = (missile.position.longitude - target_location.longitude).abs();
        // Box test on raw degrees, not a radius check.
        if dlat < tuning.arrival_epsilon_lat && dlon < tuning.arrival_epsilon_lon && missile.deactivate()
        {
            info!(
                missile_id = missile.id,
                origin = %missile.origin_faction,
                target_faction = %missile.target.faction,
                target_region = %missile.target.region,
                "missile reached its target"
            );
            impacts.push(SimEvent::Impact {
                missile_id: missile.id,
                origin_faction: missile.origin_faction.clone(),
                target: missile.target.clone(),
            });
        }
    }

    impacts
}

// Parabolic profile over the travelled fraction of the path, peaking halfway.
fn display_altitude(
    origin: Coordinate,
    position: Coordinate,
    target: Coordinate,
    tuning: &MissileTuning,
) -> f64 {
    let path = geo::planar_distance(origin, target);
    if path == 0.0 {
        return 0.0;
    }
    let remaining = geo::planar_distance(position, target);
    let travelled = (1.0 - remaining / path).clamp(0.0, 1.0);
    let peak = (geo::distance(origin, target) * tuning.apogee_ratio).min(tuning.max_apogee_meters);
    peak * 4.0 * travelled * (1.0 - travelled)
}
