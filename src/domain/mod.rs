// Domain layer: core simulation types and rules.

pub mod errors;
pub mod events;
pub mod geo;
pub mod scenario;
pub mod state;
pub mod systems;
pub mod tuning;

pub use errors::LaunchError;
pub use events::SimEvent;
pub use geo::Coordinate;
pub use state::{
    Faction, LaunchReceipt, LaunchSite, Missile, Region, RegionRef, World, WorldSnapshot,
};
pub use tuning::missile::MissileTuning;
