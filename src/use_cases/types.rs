// Shared handles and settings for the game loop.

use crate::domain::{MissileTuning, World};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;

/// The single mutual-exclusion domain over world state.
///
/// The tick loop and command intake both mutate through this lock.
pub type SharedWorld = Arc<Mutex<World>>;

pub fn shared_world(world: World) -> SharedWorld {
    Arc::new(Mutex::new(world))
}

/// Fixed settings for one world task, read once at startup.
#[derive(Debug, Clone, Copy)]
pub struct TickSettings {
    pub tick_interval: Duration,
    pub tuning: MissileTuning,
    // Seed for casualty rolls.
    pub seed: u64,
}
