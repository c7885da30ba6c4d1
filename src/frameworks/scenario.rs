// Scenario files: starting factions described in TOML.

use crate::domain::{Coordinate, Faction, LaunchSite, Region};
use serde::Deserialize;
use std::collections::HashSet;
use std::path::Path;

#[derive(Debug)]
pub enum ScenarioError {
    Io(std::io::Error),
    Parse(toml::de::Error),
    Empty,
    DuplicateCountry(String),
    DuplicateCity { country: String, city: String },
    InvalidCoordinate { latitude: f64, longitude: f64 },
    InvalidRange(f64),
}

#[derive(Debug, Deserialize)]
struct ScenarioFile {
    countries: Vec<CountryEntry>,
}

#[derive(Debug, Deserialize)]
struct CountryEntry {
    name: String,
    #[serde(default)]
    cities: Vec<CityEntry>,
    #[serde(default)]
    missile_batteries: Vec<BatteryEntry>,
}

#[derive(Debug, Deserialize)]
struct CityEntry {
    name: String,
    population: u64,
    latitude: f64,
    longitude: f64,
    #[serde(default = "default_radius")]
    radius: u32,
}

#[derive(Debug, Deserialize)]
struct BatteryEntry {
    latitude: f64,
    longitude: f64,
    #[serde(default)]
    missile_count: u32,
    // Meters; zero means unlimited.
    #[serde(default)]
    range: f64,
}

fn default_radius() -> u32 {
    10
}

fn coordinate(latitude: f64, longitude: f64) -> Result<Coordinate, ScenarioError> {
    let valid = (-90.0..=90.0).contains(&latitude) && (-180.0..=180.0).contains(&longitude);
    if !valid {
        return Err(ScenarioError::InvalidCoordinate {
            latitude,
            longitude,
        });
    }
    Ok(Coordinate::new(latitude, longitude))
}

pub fn load_factions(path: &Path) -> Result<Vec<Faction>, ScenarioError> {
    let raw = std::fs::read_to_string(path).map_err(ScenarioError::Io)?;
    parse_factions(&raw)
}

pub fn parse_factions(raw: &str) -> Result<Vec<Faction>, ScenarioError> {
    let file: ScenarioFile = toml::from_str(raw).map_err(ScenarioError::Parse)?;
    if file.countries.is_empty() {
        return Err(ScenarioError::Empty);
    }

    let mut seen = HashSet::new();
    let mut factions = Vec::with_capacity(file.countries.len());
    for country in file.countries {
        if !seen.insert(country.name.clone()) {
            return Err(ScenarioError::DuplicateCountry(country.name));
        }

        let mut faction = Faction::new(country.name.clone());
        for city in country.cities {
            if faction.region(&city.name).is_some() {
                return Err(ScenarioError::DuplicateCity {
                    country: country.name,
                    city: city.name,
                });
            }
            let location = coordinate(city.latitude, city.longitude)?;
            faction = faction.with_region(Region::new(
                city.name,
                city.population,
                location,
                city.radius,
            ));
        }
        for battery in country.missile_batteries {
            if !battery.range.is_finite() || battery.range < 0.0 {
                return Err(ScenarioError::InvalidRange(battery.range));
            }
            let location = coordinate(battery.latitude, battery.longitude)?;
            faction = faction.with_launch_site(
                LaunchSite::new(location, battery.missile_count).with_range(battery.range),
            );
        }
        factions.push(faction);
    }

    Ok(factions)
}
