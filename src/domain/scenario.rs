// Built-in starting geography used when no scenario file is configured.

use super::geo::Coordinate;
use super::state::{Faction, LaunchSite, Region};

const CITY_RADIUS: u32 = 10;

pub fn default_factions() -> Vec<Faction> {
    let new_york = Coordinate::new(40.7128, -74.0060);
    let los_angeles = Coordinate::new(34.0522, -118.2437);
    let moscow = Coordinate::new(55.7558, 37.6176);
    let saint_petersburg = Coordinate::new(59.9343, 30.3351);

    vec![
        Faction::new("USA")
            .with_region(Region::new("New York", 50_000_000, new_york, CITY_RADIUS))
            .with_region(Region::new("Los Angeles", 7_000_000, los_angeles, CITY_RADIUS))
            .with_launch_site(LaunchSite::new(new_york, 10))
            .with_launch_site(LaunchSite::new(los_angeles, 5)),
        Faction::new("Russia")
            .with_region(Region::new("Moscow", 9_500_000, moscow, CITY_RADIUS))
            .with_region(Region::new(
                "Saint Petersburg",
                8_000_000,
                saint_petersburg,
                CITY_RADIUS,
            ))
            // Russia starts with an empty silo.
            .with_launch_site(LaunchSite::new(moscow, 0)),
    ]
}
