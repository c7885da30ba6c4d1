// Authoritative world model: factions, regions, launch sites and missiles.

use super::errors::LaunchError;
use super::events::SimEvent;
use super::geo::{self, Coordinate};
use super::tuning::missile::MissileTuning;
use std::collections::BTreeMap;
use uuid::Uuid;

/// Key pair pointing at a region inside the world's faction tree.
///
/// Regions are never removed, so a reference stays resolvable for the life of the world.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct RegionRef {
    pub faction: String,
    pub region: String,
}

impl RegionRef {
    pub fn new(faction: impl Into<String>, region: impl Into<String>) -> Self {
        Self {
            faction: faction.into(),
            region: region.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Region {
    pub name: String,
    pub starting_population: u64,
    population: u64,
    pub location: Coordinate,
    pub radius: u32,
}

impl Region {
    pub fn new(name: impl Into<String>, population: u64, location: Coordinate, radius: u32) -> Self {
        Self {
            name: name.into(),
            starting_population: population,
            population,
            location,
            radius,
        }
    }

    pub fn population(&self) -> u64 {
        self.population
    }

    /// Removes up to `loss` people and returns the population before and after.
    pub fn apply_casualties(&mut self, loss: u64) -> (u64, u64) {
        let before = self.population;
        self.population = before.saturating_sub(loss);
        (before, self.population)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct LaunchSite {
    pub location: Coordinate,
    missiles: u32,
    // Maximum reach in meters; zero means unlimited.
    pub range_meters: f64,
}

impl LaunchSite {
    pub fn new(location: Coordinate, missiles: u32) -> Self {
        Self {
            location,
            missiles,
            range_meters: 0.0,
        }
    }

    pub fn with_range(mut self, range_meters: f64) -> Self {
        self.range_meters = range_meters;
        self
    }

    pub fn missiles(&self) -> u32 {
        self.missiles
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Faction {
    pub name: String,
    regions: BTreeMap<String, Region>,
    launch_sites: Vec<LaunchSite>,
}

impl Faction {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            regions: BTreeMap::new(),
            launch_sites: Vec::new(),
        }
    }

    /// Adds a region; a region with the same name is replaced.
    pub fn with_region(mut self, region: Region) -> Self {
        self.regions.insert(region.name.clone(), region);
        self
    }

    pub fn with_launch_site(mut self, site: LaunchSite) -> Self {
        self.launch_sites.push(site);
        self
    }

    pub fn regions(&self) -> &BTreeMap<String, Region> {
        &self.regions
    }

    pub fn region(&self, name: &str) -> Option<&Region> {
        self.regions.get(name)
    }

    pub fn launch_sites(&self) -> &[LaunchSite] {
        &self.launch_sites
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Missile {
    pub id: u64,
    pub origin: Coordinate,
    pub target: RegionRef,
    pub position: Coordinate,
    pub altitude_meters: f64,
    pub speed_mach: f64,
    pub origin_faction: String,
    pub estimated_flight_secs: f64,
    active: bool,
}

impl Missile {
    pub fn is_active(&self) -> bool {
        self.active
    }

    /// Marks the missile as arrived. Returns false if it had already arrived.
    pub(crate) fn deactivate(&mut self) -> bool {
        std::mem::replace(&mut self.active, false)
    }
}

/// Outcome of an accepted launch.
#[derive(Debug, Clone, PartialEq)]
pub struct LaunchReceipt {
    pub missile_id: u64,
    pub missiles_remaining: u32,
    pub eta_secs: f64,
}

/// Point-in-time copy of the world handed to the broadcaster.
#[derive(Debug, Clone)]
pub struct WorldSnapshot {
    pub session_id: Uuid,
    pub tick: u64,
    pub factions: Vec<Faction>,
    pub missiles: Vec<Missile>,
    pub events: Vec<SimEvent>,
}

pub struct World {
    session_id: Uuid,
    tick: u64,
    factions: BTreeMap<String, Faction>,
    missiles: Vec<Missile>,
    next_missile_id: u64,
}

impl World {
    /// Creates a world with a fresh session id.
    pub fn new(factions: impl IntoIterator<Item = Faction>) -> Self {
        Self {
            session_id: Uuid::new_v4(),
            tick: 0,
            factions: factions
                .into_iter()
                .map(|faction| (faction.name.clone(), faction))
                .collect(),
            missiles: Vec::new(),
            next_missile_id: 1,
        }
    }

    pub fn session_id(&self) -> Uuid {
        self.session_id
    }

    pub fn tick(&self) -> u64 {
        self.tick
    }

    pub fn factions(&self) -> &BTreeMap<String, Faction> {
        &self.factions
    }

    pub fn faction(&self, name: &str) -> Option<&Faction> {
        self.factions.get(name)
    }

    pub fn region(&self, target: &RegionRef) -> Option<&Region> {
        self.factions
            .get(&target.faction)
            .and_then(|faction| faction.regions.get(&target.region))
    }

    pub fn missiles(&self) -> &[Missile] {
        &self.missiles
    }

    pub(crate) fn region_mut(&mut self, target: &RegionRef) -> Option<&mut Region> {
        self.factions
            .get_mut(&target.faction)
            .and_then(|faction| faction.regions.get_mut(&target.region))
    }

    // Split borrow so systems can read regions while moving missiles.
    pub(crate) fn missiles_and_factions_mut(
        &mut self,
    ) -> (&mut Vec<Missile>, &BTreeMap<String, Faction>) {
        (&mut self.missiles, &self.factions)
    }

    pub(crate) fn advance_tick(&mut self) -> u64 {
        self.tick += 1;
        self.tick
    }

    /// Launches one missile from `site_index` of `faction` toward `target`.
    ///
    /// Every precondition is checked before anything is mutated, so a rejected launch
    /// leaves the world untouched.
    pub fn launch(
        &mut self,
        faction: &str,
        site_index: usize,
        target: &RegionRef,
        tuning: &MissileTuning,
    ) -> Result<LaunchReceipt, LaunchError> {
        let target_location = self
            .region(target)
            .map(|region| region.location)
            .ok_or_else(|| LaunchError::UnknownTarget {
                faction: target.faction.clone(),
                region: target.region.clone(),
            })?;

        let owner = self
            .factions
            .get_mut(faction)
            .ok_or_else(|| LaunchError::UnknownFaction {
                faction: faction.to_string(),
            })?;
        let site = owner
            .launch_sites
            .get_mut(site_index)
            .ok_or_else(|| LaunchError::UnknownLaunchSite {
                faction: faction.to_string(),
                site_index,
            })?;

        if site.missiles == 0 {
            return Err(LaunchError::Exhausted { site_index });
        }

        let path_meters = geo::distance(site.location, target_location);
        if site.range_meters > 0.0 && path_meters > site.range_meters {
            return Err(LaunchError::OutOfRange {
                distance_meters: path_meters,
                range_meters: site.range_meters,
            });
        }

        let eta_secs = geo::time_of_flight(path_meters, tuning.speed_mach)
            .map_err(|_| LaunchError::InvalidSpeed)?;

        site.missiles -= 1;
        let missiles_remaining = site.missiles;
        let origin = site.location;

        let missile_id = self.next_missile_id;
        self.next_missile_id += 1;
        self.missiles.push(Missile {
            id: missile_id,
            origin,
            target: target.clone(),
            position: origin,
            altitude_meters: tuning.launch_altitude_meters,
            speed_mach: tuning.speed_mach,
            origin_faction: faction.to_string(),
            estimated_flight_secs: eta_secs,
            active: true,
        });

        Ok(LaunchReceipt {
            missile_id,
            missiles_remaining,
            eta_secs,
        })
    }

    /// Copies the current state together with the events of the last tick.
    pub fn snapshot(&self, events: Vec<SimEvent>) -> WorldSnapshot {
        WorldSnapshot {
            session_id: self.session_id,
            tick: self.tick,
            factions: self.factions.values().cloned().collect(),
            missiles: self.missiles.clone(),
            events,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::scenario::default_factions;

    fn usa_site_count(world: &World, index: usize) -> u32 {
        world.faction("USA").expect("usa").launch_sites()[index].missiles()
    }

    #[test]
    fn when_site_has_ordnance_then_launch_decrements_and_registers_missile() {
        let mut world = World::new(default_factions());
        let target = RegionRef::new("Russia", "Moscow");

        let receipt = world
            .launch("USA", 1, &target, &MissileTuning::default())
            .expect("launch should succeed");

        assert_eq!(receipt.missile_id, 1);
        assert_eq!(receipt.missiles_remaining, 4);
        assert_eq!(usa_site_count(&world, 1), 4);
        assert_eq!(world.missiles().len(), 1);
        let missile = &world.missiles()[0];
        assert!(missile.is_active());
        assert_eq!(missile.target, target);
        assert_eq!(missile.position, missile.origin);
        assert!(receipt.eta_secs > 0.0);
    }

    #[test]
    fn when_site_is_exhausted_then_launch_fails_and_world_is_unchanged() {
        let mut world = World::new(default_factions());
        let target = RegionRef::new("USA", "New York");
        let tuning = MissileTuning::default();

        // Russia's only site starts empty.
        let before = world.faction("Russia").cloned();
        let result = world.launch("Russia", 0, &target, &tuning);

        assert_eq!(result, Err(LaunchError::Exhausted { site_index: 0 }));
        assert_eq!(world.faction("Russia").cloned(), before);
        assert!(world.missiles().is_empty());
    }

    #[test]
    fn when_every_missile_is_spent_then_further_launches_are_exhausted() {
        let mut world = World::new(default_factions());
        let target = RegionRef::new("Russia", "Moscow");
        let tuning = MissileTuning::default();

        for expected in (0..5).rev() {
            let receipt = world.launch("USA", 1, &target, &tuning).expect("launch");
            assert_eq!(receipt.missiles_remaining, expected);
        }
        assert_eq!(
            world.launch("USA", 1, &target, &tuning),
            Err(LaunchError::Exhausted { site_index: 1 })
        );
        assert_eq!(usa_site_count(&world, 1), 0);
        assert_eq!(world.missiles().len(), 5);
    }

    #[test]
    fn when_references_are_unknown_then_launch_reports_validation_errors() {
        let mut world = World::new(default_factions());
        let tuning = MissileTuning::default();
        let moscow = RegionRef::new("Russia", "Moscow");

        let err = world.launch("France", 0, &moscow, &tuning).unwrap_err();
        assert!(matches!(err, LaunchError::UnknownFaction { .. }));
        assert!(err.is_validation());

        let err = world.launch("USA", 9, &moscow, &tuning).unwrap_err();
        assert!(matches!(err, LaunchError::UnknownLaunchSite { site_index: 9, .. }));

        let err = world
            .launch("USA", 0, &RegionRef::new("Russia", "Atlantis"), &tuning)
            .unwrap_err();
        assert!(matches!(err, LaunchError::UnknownTarget { .. }));

        assert_eq!(usa_site_count(&world, 0), 10);
        assert!(world.missiles().is_empty());
    }

    #[test]
    fn when_target_is_beyond_site_range_then_launch_is_rejected() {
        let faction = Faction::new("Blue")
            .with_region(Region::new("Home", 10, Coordinate::new(0.0, 0.0), 10))
            .with_launch_site(LaunchSite::new(Coordinate::new(0.0, 0.0), 3).with_range(1_000.0));
        let far = Faction::new("Red").with_region(Region::new(
            "Far",
            10,
            Coordinate::new(10.0, 10.0),
            10,
        ));
        let mut world = World::new([faction, far]);

        let err = world
            .launch("Blue", 0, &RegionRef::new("Red", "Far"), &MissileTuning::default())
            .unwrap_err();

        assert!(matches!(err, LaunchError::OutOfRange { .. }));
        assert_eq!(world.faction("Blue").expect("blue").launch_sites()[0].missiles(), 3);
    }

    #[test]
    fn when_speed_is_not_positive_then_launch_is_rejected_without_spending() {
        let mut world = World::new(default_factions());
        let tuning = MissileTuning {
            speed_mach: 0.0,
            ..MissileTuning::default()
        };

        let err = world
            .launch("USA", 0, &RegionRef::new("Russia", "Moscow"), &tuning)
            .unwrap_err();

        assert_eq!(err, LaunchError::InvalidSpeed);
        assert_eq!(usa_site_count(&world, 0), 10);
    }

    #[test]
    fn when_casualties_exceed_population_then_population_floors_at_zero() {
        let mut region = Region::new("Town", 100, Coordinate::new(0.0, 0.0), 1);
        assert_eq!(region.apply_casualties(40), (100, 60));
        assert_eq!(region.apply_casualties(500), (60, 0));
        assert_eq!(region.population(), 0);
    }

    #[test]
    fn when_two_worlds_are_created_then_session_ids_differ() {
        let a = World::new(default_factions());
        let b = World::new(default_factions());
        assert_ne!(a.session_id(), b.session_id());
    }
}
