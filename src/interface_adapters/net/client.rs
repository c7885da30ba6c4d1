use crate::interface_adapters::http::ErrorResponse;
use crate::interface_adapters::protocol::{ClientMessage, ServerMessage, WelcomeDto};
use crate::interface_adapters::state::AppState;
use crate::use_cases::{
    DeliveryOutcome, LaunchUseCase, Subscriber, SubscriberId, SubscriberRegistry, deliver,
    finish_delivery,
};

use axum::{
    Error, Json,
    extract::{
        Query, State,
        ws::{CloseFrame, Message, WebSocket, WebSocketUpgrade, close_code},
    },
    http::StatusCode,
    response::IntoResponse,
};
use futures::StreamExt;
use futures::stream::SplitStream;
use std::{
    fmt,
    sync::Arc,
    time::{Duration, Instant},
};
use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{Notify, mpsc};
use tokio::task::JoinHandle;
use tracing::{Instrument, debug, info, info_span, warn};

#[derive(Debug)]
enum NetError {
    // Categorizes connection lifecycle failures so callers can decide policy.
    Serialization(serde_json::Error),
    // Our own delivery queue is gone; the writer has already stopped.
    QueueClosed,
}

impl fmt::Display for NetError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NetError::Serialization(e) => write!(f, "failed to serialize message: {e}"),
            NetError::QueueClosed => write!(f, "delivery queue closed"),
        }
    }
}

#[derive(Debug, serde::Deserialize)]
pub struct FactionQuery {
    // The faction the client wants to command.
    #[serde(default)]
    faction: Option<String>,
}

enum LoopControl {
    Continue,
    Disconnect,
}

const LOG_THROTTLE: Duration = Duration::from_secs(2);
const MAX_INVALID_JSON: u32 = 10;
// How long a closing connection may keep flushing before its writer is cancelled.
const CLOSE_GRACE: Duration = Duration::from_secs(2);

struct ConnCtx {
    pub subscriber_id: SubscriberId,
    pub faction: Arc<str>,
    pub registry: Arc<SubscriberRegistry<Message>>,
    pub launcher: LaunchUseCase,
    // Sender onto this connection's own delivery queue, for replies.
    pub outbound: mpsc::Sender<Message>,

    pub msgs_in: u64,
    pub bytes_in: u64,
    pub launches_accepted: u64,
    pub launches_rejected: u64,

    // Consecutive undecodable messages; reset by any valid command.
    pub invalid_json: u32,

    pub last_invalid_input_log: Instant,
    pub last_queue_full_log: Instant,

    pub close_frame: Option<CloseFrame>,
}

pub async fn ws_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
    Query(query): Query<FactionQuery>,
) -> impl IntoResponse {
    // Explicit faction if requested, the configured default otherwise.
    let faction = query
        .faction
        .unwrap_or_else(|| state.default_faction.to_string());

    let known = state.world.lock().await.faction(&faction).is_some();
    if !known {
        return (
            StatusCode::NOT_FOUND,
            Json(ErrorResponse::new("faction not found")),
        )
            .into_response();
    }

    let faction: Arc<str> = Arc::from(faction);
    ws.on_upgrade(move |socket| handle_socket(socket, state, faction))
}

async fn handle_socket(socket: WebSocket, state: Arc<AppState>, faction: Arc<str>) {
    let subscriber_id = state.registry.next_id();
    let span = info_span!("conn", subscriber_id, faction = %faction);
    run_connection(socket, state, faction, subscriber_id)
        .instrument(span)
        .await
}

async fn run_connection(
    socket: WebSocket,
    state: Arc<AppState>,
    faction: Arc<str>,
    subscriber_id: SubscriberId,
) {
    let (subscriber, queue) =
        Subscriber::new(subscriber_id, faction.clone(), state.queue_capacity);
    let outbound = subscriber.sender();

    // Queue the greeting before registering so it always precedes the first broadcast.
    let session_id = state.world.lock().await.session_id();
    let welcome = ServerMessage::Welcome(WelcomeDto {
        subscriber_id: subscriber_id.to_string(),
        faction: faction.to_string(),
        session_id: session_id.to_string(),
    });
    if let Err(e) = enqueue(&outbound, &welcome) {
        warn!(error = %e, "failed to queue welcome message");
        return;
    }

    if !state.registry.add(subscriber).await {
        warn!("subscriber id already registered; dropping connection");
        return;
    }

    // Writer half goes to the delivery worker; this task keeps reading.
    let (sink, stream) = socket.split();
    let shutdown = Arc::new(Notify::new());
    let cancel = Arc::new(Notify::new());
    let worker = tokio::spawn(
        deliver(
            subscriber_id,
            queue,
            sink,
            state.registry.clone(),
            shutdown.clone(),
            cancel.clone(),
        )
        .in_current_span(),
    );
    info!("client connected");

    let now = Instant::now() - LOG_THROTTLE;
    let mut ctx = ConnCtx {
        subscriber_id,
        faction,
        registry: state.registry.clone(),
        launcher: state.launcher.clone(),
        outbound,

        msgs_in: 0,
        bytes_in: 0,
        launches_accepted: 0,
        launches_rejected: 0,

        invalid_json: 0,

        last_invalid_input_log: now,
        last_queue_full_log: now,

        close_frame: None,
    };

    if let Err(e) = run_client_loop(stream, shutdown, &mut ctx).await {
        warn!(error = %e, "client loop exited with error");
    }

    disconnect_cleanup(ctx, worker, cancel).await;
}

fn should_log(last: &mut Instant) -> bool {
    if last.elapsed() >= LOG_THROTTLE {
        *last = Instant::now();
        true
    } else {
        false
    }
}

// Returns Ok(false) when the frame was dropped because the queue is full.
fn enqueue(outbound: &mpsc::Sender<Message>, msg: &ServerMessage) -> Result<bool, NetError> {
    let text = msg.to_text().map_err(NetError::Serialization)?;
    match outbound.try_send(Message::Text(text)) {
        Ok(()) => Ok(true),
        Err(TrySendError::Full(_)) => Ok(false),
        Err(TrySendError::Closed(_)) => Err(NetError::QueueClosed),
    }
}

fn reply(ctx: &mut ConnCtx, msg: &ServerMessage) -> Result<(), NetError> {
    if !enqueue(&ctx.outbound, msg)? && should_log(&mut ctx.last_queue_full_log) {
        warn!("delivery queue full; dropping reply");
    }
    Ok(())
}

async fn run_client_loop(
    mut stream: SplitStream<WebSocket>,
    shutdown: Arc<Notify>,
    ctx: &mut ConnCtx,
) -> Result<(), NetError> {
    loop {
        let control = tokio::select! {
            // Incoming message from the client.
            incoming = stream.next() => handle_incoming_ws(incoming, ctx).await?,

            // The delivery worker lost the transport.
            _ = shutdown.notified() => {
                info!("delivery stopped; closing reader");
                LoopControl::Disconnect
            }
        };

        if let LoopControl::Disconnect = control {
            return Ok(());
        }
    }
}

async fn handle_incoming_ws(
    incoming: Option<Result<Message, Error>>,
    ctx: &mut ConnCtx,
) -> Result<LoopControl, NetError> {
    match incoming {
        Some(Ok(msg)) => match msg {
            Message::Text(text) => {
                ctx.msgs_in += 1;
                ctx.bytes_in += text.len() as u64;

                match serde_json::from_str::<ClientMessage>(&text) {
                    Ok(ClientMessage::MissileLaunch { missile }) => {
                        ctx.invalid_json = 0;
                        let command = missile.into_command(&ctx.faction);
                        let response = match ctx.launcher.execute(command).await {
                            Ok(receipt) => {
                                ctx.launches_accepted += 1;
                                ServerMessage::LaunchAccepted(receipt.into())
                            }
                            Err(e) => {
                                ctx.launches_rejected += 1;
                                ServerMessage::LaunchRejected {
                                    reason: e.to_string(),
                                }
                            }
                        };
                        reply(ctx, &response)?;
                        Ok(LoopControl::Continue)
                    }
                    Err(parse_err) => {
                        ctx.invalid_json += 1;
                        if should_log(&mut ctx.last_invalid_input_log) {
                            warn!(
                                bytes = text.len(),
                                error = %parse_err,
                                "failed to parse client message"
                            );
                        }

                        if ctx.invalid_json > MAX_INVALID_JSON {
                            ctx.close_frame = Some(CloseFrame {
                                code: close_code::POLICY,
                                reason: "too many invalid messages".into(),
                            });
                            return Ok(LoopControl::Disconnect);
                        }

                        Ok(LoopControl::Continue)
                    }
                }
            }
            Message::Binary(_) => {
                ctx.close_frame = Some(CloseFrame {
                    code: close_code::UNSUPPORTED,
                    reason: "binary messages not supported".into(),
                });
                Ok(LoopControl::Disconnect)
            }
            Message::Ping(_) | Message::Pong(_) => Ok(LoopControl::Continue),
            Message::Close(_) => Ok(LoopControl::Disconnect),
        },
        Some(Err(e)) => {
            warn!(error = %e, "websocket recv error");
            Ok(LoopControl::Disconnect)
        }
        None => {
            info!("websocket closed");
            Ok(LoopControl::Disconnect)
        }
    }
}

async fn disconnect_cleanup(
    ctx: ConnCtx,
    worker: JoinHandle<DeliveryOutcome>,
    cancel: Arc<Notify>,
) {
    let ConnCtx {
        subscriber_id,
        registry,
        outbound,
        msgs_in,
        bytes_in,
        launches_accepted,
        launches_rejected,
        invalid_json,
        close_frame,
        ..
    } = ctx;

    // The delivery worker may have removed us already; only one path wins.
    let unregistered_here = registry.remove(subscriber_id).await.is_some();

    if let Some(frame) = close_frame {
        // Best effort: the queue may be full or already closed.
        let _ = outbound.try_send(Message::Close(Some(frame)));
    }
    // Dropping the last sender lets the delivery worker drain and exit; a peer that
    // stopped reading gets cancelled once the grace period runs out.
    drop(outbound);
    let delivery = finish_delivery(worker, &cancel, CLOSE_GRACE).await;

    debug!(
        msgs_in,
        bytes_in,
        launches_accepted,
        launches_rejected,
        invalid_json,
        unregistered_here,
        ?delivery,
        "connection stats"
    );
    info!("client disconnected");
}

#[cfg(test)]
mod tests {
    use super::*;

    fn rejected() -> ServerMessage {
        ServerMessage::LaunchRejected {
            reason: "launch site 0 has no missiles left".to_string(),
        }
    }

    #[test]
    fn when_queue_has_room_then_enqueue_writes_a_text_frame() {
        let (outbound, mut rx) = mpsc::channel(1);

        assert!(matches!(enqueue(&outbound, &rejected()), Ok(true)));
        let Ok(Message::Text(text)) = rx.try_recv() else {
            panic!("expected a queued text frame");
        };
        assert!(text.as_str().contains("launchRejected"));
    }

    #[test]
    fn when_queue_is_full_then_enqueue_drops_the_frame() {
        let (outbound, _rx) = mpsc::channel(1);

        assert!(matches!(enqueue(&outbound, &rejected()), Ok(true)));
        assert!(matches!(enqueue(&outbound, &rejected()), Ok(false)));
    }

    #[test]
    fn when_queue_is_closed_then_enqueue_reports_it() {
        let (outbound, rx) = mpsc::channel(1);
        drop(rx);

        let err = enqueue(&outbound, &rejected()).unwrap_err();

        assert!(matches!(err, NetError::QueueClosed));
        assert_eq!(err.to_string(), "delivery queue closed");
    }

    #[test]
    fn when_serialization_fails_then_error_names_the_cause() {
        let cause = serde_json::from_str::<u32>("nope").unwrap_err();
        let err = NetError::Serialization(cause);

        assert!(err.to_string().starts_with("failed to serialize message:"));
    }
}
