use crate::use_cases::{LaunchUseCase, SharedWorld, SubscriberRegistry};
use axum::extract::ws::Message;
use std::sync::Arc;

#[derive(Clone)]
pub struct AppState {
    // Authoritative world, shared with the tick loop.
    pub world: SharedWorld,
    // Live subscribers fed by the broadcaster.
    pub registry: Arc<SubscriberRegistry<Message>>,
    // Launch intake used by every connection's reader.
    pub launcher: LaunchUseCase,
    // Faction assigned when the client does not ask for one.
    pub default_faction: Arc<str>,
    // Per-subscriber delivery queue capacity.
    pub queue_capacity: usize,
}
