use super::broadcast::{Broadcaster, SnapshotEncoder};
use super::types::{SharedWorld, TickSettings};
use crate::domain::systems;
use rand::SeedableRng;
use rand_pcg::Pcg32;
use std::sync::Arc;
use tokio::sync::Notify;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info};

/// Fixed-step world loop: advance the simulation, then publish a snapshot.
///
/// The world lock is held only while advancing and copying the snapshot; publishing
/// happens after it is released so launches are never queued behind fan-out.
pub async fn world_task<E: SnapshotEncoder>(
    world: SharedWorld,
    broadcaster: Arc<Broadcaster<E>>,
    settings: TickSettings,
    shutdown: Arc<Notify>,
) {
    let mut rng = Pcg32::seed_from_u64(settings.seed);
    let mut interval = tokio::time::interval(settings.tick_interval);
    // A late tick is skipped rather than bursting to catch up.
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);

    info!(
        tick_interval_ms = settings.tick_interval.as_millis() as u64,
        seed = settings.seed,
        "world task started"
    );

    loop {
        tokio::select! {
            _ = shutdown.notified() => {
                break;
            }
            _ = interval.tick() => {}
        }

        let snapshot = {
            let mut world = world.lock().await;
            let events = systems::advance(&mut world, &mut rng, &settings.tuning);
            world.snapshot(events)
        };

        let stats = broadcaster.publish(&snapshot).await;
        if !snapshot.events.is_empty() {
            debug!(
                tick = snapshot.tick,
                events = snapshot.events.len(),
                delivered = stats.delivered,
                "tick produced events"
            );
        }
    }

    info!("world task stopped");
}
