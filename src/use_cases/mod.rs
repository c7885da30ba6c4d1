// Use cases layer: application workflows for the simulation server.

pub mod broadcast;
pub mod command;
pub mod game;
pub mod subscribers;
pub mod types;

pub use broadcast::{Broadcaster, DeliveryOutcome, SnapshotEncoder, deliver, finish_delivery};
pub use command::{LaunchCommand, LaunchUseCase};
pub use subscribers::{FanOutStats, Subscriber, SubscriberId, SubscriberRegistry};
pub use types::{SharedWorld, TickSettings, shared_world};
