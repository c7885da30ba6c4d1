// Wire protocol DTOs and conversions for WebSocket messages.

use crate::domain::{
    Coordinate, Faction, LaunchReceipt, LaunchSite, Missile, Region, RegionRef, SimEvent,
    WorldSnapshot,
};
use crate::use_cases::{LaunchCommand, SnapshotEncoder};
use axum::extract::ws::{Message, Utf8Bytes};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Messages the server sends to connected clients over the WebSocket.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ServerMessage {
    // First message on every connection.
    Welcome(WelcomeDto),
    // Full world snapshot, once per tick.
    GameStateBroadcast(GameStateDto),
    LaunchAccepted(LaunchAcceptedDto),
    LaunchRejected { reason: String },
}

impl ServerMessage {
    pub fn to_text(&self) -> Result<Utf8Bytes, serde_json::Error> {
        serde_json::to_string(self).map(Utf8Bytes::from)
    }
}

/// Messages clients send to the server.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum ClientMessage {
    MissileLaunch { missile: MissileLaunchDto },
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MissileLaunchDto {
    // Index into the sender's own launch sites.
    pub launch_site: usize,
    pub target: TargetDto,
}

impl MissileLaunchDto {
    pub fn into_command(self, faction: &str) -> LaunchCommand {
        LaunchCommand {
            faction: faction.to_string(),
            site_index: self.launch_site,
            target: self.target.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TargetDto {
    pub country: String,
    pub city: String,
}

impl From<TargetDto> for RegionRef {
    fn from(target: TargetDto) -> Self {
        RegionRef::new(target.country, target.city)
    }
}

impl From<&RegionRef> for TargetDto {
    fn from(target: &RegionRef) -> Self {
        Self {
            country: target.faction.clone(),
            city: target.region.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct WelcomeDto {
    pub subscriber_id: String,
    pub faction: String,
    pub session_id: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LaunchAcceptedDto {
    pub missile_id: u64,
    pub missiles_remaining: u32,
    pub eta_seconds: f64,
}

impl From<LaunchReceipt> for LaunchAcceptedDto {
    fn from(receipt: LaunchReceipt) -> Self {
        Self {
            missile_id: receipt.missile_id,
            missiles_remaining: receipt.missiles_remaining,
            eta_seconds: receipt.eta_secs,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize)]
pub struct CoordinatesDto {
    pub latitude: f64,
    pub longitude: f64,
}

impl From<Coordinate> for CoordinatesDto {
    fn from(c: Coordinate) -> Self {
        Self {
            latitude: c.latitude,
            longitude: c.longitude,
        }
    }
}

/// Snapshot of the world sent to clients on each tick.
#[derive(Debug, Clone, Serialize)]
pub struct GameStateDto {
    pub id: String,
    pub tick: u64,
    pub countries: BTreeMap<String, CountryDto>,
    pub missiles: Vec<MissileDto>,
    pub events: Vec<EventDto>,
}

impl From<&WorldSnapshot> for GameStateDto {
    fn from(snapshot: &WorldSnapshot) -> Self {
        Self {
            id: snapshot.session_id.to_string(),
            tick: snapshot.tick,
            countries: snapshot
                .factions
                .iter()
                .map(|faction| (faction.name.clone(), CountryDto::from(faction)))
                .collect(),
            missiles: snapshot.missiles.iter().map(MissileDto::from).collect(),
            events: snapshot.events.iter().map(EventDto::from).collect(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CountryDto {
    pub name: String,
    pub cities: BTreeMap<String, CityDto>,
    pub missile_batteries: Vec<MissileBatteryDto>,
}

impl From<&Faction> for CountryDto {
    fn from(faction: &Faction) -> Self {
        Self {
            name: faction.name.clone(),
            cities: faction
                .regions()
                .iter()
                .map(|(name, region)| (name.clone(), CityDto::from(region)))
                .collect(),
            missile_batteries: faction
                .launch_sites()
                .iter()
                .map(MissileBatteryDto::from)
                .collect(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CityDto {
    pub name: String,
    pub starting_population: u64,
    pub population: u64,
    pub coordinates: CoordinatesDto,
    pub radius: u32,
}

impl From<&Region> for CityDto {
    fn from(region: &Region) -> Self {
        Self {
            name: region.name.clone(),
            starting_population: region.starting_population,
            population: region.population(),
            coordinates: region.location.into(),
            radius: region.radius,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MissileBatteryDto {
    pub coordinates: CoordinatesDto,
    pub range: f64,
    pub missile_count: u32,
}

impl From<&LaunchSite> for MissileBatteryDto {
    fn from(site: &LaunchSite) -> Self {
        Self {
            coordinates: site.location.into(),
            range: site.range_meters,
            missile_count: site.missiles(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MissileDto {
    pub id: u64,
    pub launch_site: CoordinatesDto,
    pub destination: TargetDto,
    pub altitude: f64,
    pub speed_mach: f64,
    pub country_of_origin: String,
    pub position_in_flight: CoordinatesDto,
    pub active: bool,
    pub eta_seconds: f64,
}

impl From<&Missile> for MissileDto {
    fn from(missile: &Missile) -> Self {
        Self {
            id: missile.id,
            launch_site: missile.origin.into(),
            destination: (&missile.target).into(),
            altitude: missile.altitude_meters,
            speed_mach: missile.speed_mach,
            country_of_origin: missile.origin_faction.clone(),
            position_in_flight: missile.position.into(),
            active: missile.is_active(),
            eta_seconds: missile.estimated_flight_secs,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(tag = "kind", rename_all = "camelCase", rename_all_fields = "camelCase")]
pub enum EventDto {
    Impact {
        missile_id: u64,
        country_of_origin: String,
        target: TargetDto,
    },
    Casualties {
        target: TargetDto,
        before_population: u64,
        after_population: u64,
    },
}

impl From<&SimEvent> for EventDto {
    fn from(event: &SimEvent) -> Self {
        match event {
            SimEvent::Impact {
                missile_id,
                origin_faction,
                target,
            } => EventDto::Impact {
                missile_id: *missile_id,
                country_of_origin: origin_faction.clone(),
                target: target.into(),
            },
            SimEvent::Casualties {
                region,
                before,
                after,
            } => EventDto::Casualties {
                target: region.into(),
                before_population: *before,
                after_population: *after,
            },
        }
    }
}

/// Serializes each tick's snapshot once into a shared WebSocket text frame.
#[derive(Debug, Clone, Copy, Default)]
pub struct JsonSnapshotEncoder;

impl SnapshotEncoder for JsonSnapshotEncoder {
    type Frame = Message;
    type Error = serde_json::Error;

    fn encode(&self, snapshot: &WorldSnapshot) -> Result<Message, serde_json::Error> {
        let msg = ServerMessage::GameStateBroadcast(GameStateDto::from(snapshot));
        msg.to_text().map(Message::Text)
    }
}
