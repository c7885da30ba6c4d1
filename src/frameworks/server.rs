// Framework bootstrap for the simulation server runtime.

use crate::domain::{MissileTuning, World, scenario};
use crate::frameworks::config;
use crate::frameworks::scenario::load_factions;
use crate::interface_adapters::net::{health_handler, ws_handler};
use crate::interface_adapters::protocol::JsonSnapshotEncoder;
use crate::interface_adapters::state::AppState;
use crate::use_cases::game::world_task;
use crate::use_cases::{Broadcaster, LaunchUseCase, SubscriberRegistry, TickSettings, shared_world};

use axum::{Router, routing::get};
use std::net::SocketAddr;
use std::{io::Result, sync::Arc};
use tokio::sync::Notify;

fn init_runtime() {
    let _ = dotenvy::dotenv();

    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));

    let json = matches!(std::env::var("LOG_FORMAT").as_deref(), Ok("json"));
    if json {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .json()
            .with_current_span(true)
            .init();
    } else {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .compact()
            .init();
    }

    std::panic::set_hook(Box::new(|info| {
        let backtrace = std::backtrace::Backtrace::capture();
        tracing::error!(%info, ?backtrace, "panic");
    }));
}

pub async fn run(listener: tokio::net::TcpListener) -> Result<()> {
    let address = listener.local_addr()?;
    let shutdown = Arc::new(Notify::new());
    // build state and start the world loop
    let state = build_state(shutdown.clone())?;

    let app = Router::new()
        .route("/ws", get(ws_handler))
        .route("/health", get(health_handler))
        .with_state(state);

    tracing::info!(%address, "listening");

    // Serve app and report errors rather than panicking
    let served = axum::serve(listener, app).await.inspect_err(|e| {
        tracing::error!(error = %e, "server error");
    });
    shutdown.notify_one();
    served
}

pub async fn run_with_config() -> Result<()> {
    init_runtime();

    let address = SocketAddr::from(([127, 0, 0, 1], config::http_port()));

    // Bind TCP listener with error handling
    let listener = tokio::net::TcpListener::bind(address)
        .await
        .inspect_err(|e| {
            tracing::error!(%address, error = %e, "failed to bind");
        })?;

    run(listener).await
}

fn build_state(shutdown: Arc<Notify>) -> Result<Arc<AppState>> {
    let factions = match config::scenario_path() {
        Some(path) => {
            let factions = load_factions(&path).map_err(|e| {
                std::io::Error::other(format!("failed to load scenario {}: {e:?}", path.display()))
            })?;
            tracing::info!(path = %path.display(), factions = factions.len(), "scenario loaded");
            factions
        }
        None => scenario::default_factions(),
    };

    let world = World::new(factions);
    let default_faction = config::default_faction();
    if world.faction(&default_faction).is_none() {
        return Err(std::io::Error::other(format!(
            "default faction '{default_faction}' is not part of the scenario"
        )));
    }
    tracing::info!(session_id = %world.session_id(), %default_faction, "world created");

    let tuning = MissileTuning::default();
    let world = shared_world(world);
    let registry = Arc::new(SubscriberRegistry::new());
    let broadcaster = Arc::new(Broadcaster::new(registry.clone(), JsonSnapshotEncoder));

    // Spawn the Game Loop (World Task)
    // This is the only place that advances the simulation.
    tokio::spawn(world_task(
        world.clone(),
        broadcaster,
        TickSettings {
            tick_interval: config::TICK_INTERVAL,
            tuning,
            seed: config::sim_seed(),
        },
        shutdown,
    ));

    Ok(Arc::new(AppState {
        world: world.clone(),
        registry,
        launcher: LaunchUseCase { world, tuning },
        default_faction: Arc::from(default_faction.as_str()),
        queue_capacity: config::SUBSCRIBER_QUEUE_CAPACITY,
    }))
}
