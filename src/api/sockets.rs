//! WebSocket handlers for page subscriptions and clock synchronization

use std::sync::Arc;

use axum::{
    extract::{
        ws::{close_code, CloseFrame, Message, WebSocket, WebSocketUpgrade},
        Path, State,
    },
    response::Response,
};
use futures::{sink::SinkExt, stream::StreamExt, Sink, Stream};
use tokio::{
    sync::mpsc::UnboundedReceiver,
    time::{interval_at, Instant, MissedTickBehavior},
};
use tracing::{debug, info, warn};

use crate::{
    services::{clock_sync, BroadcastRegistry, Connection},
    state::{AppState, Page, SharedPage},
};

/// Handle GET /subscribe/:link - Push page snapshots to the client
pub async fn subscribe_handler(
    ws: WebSocketUpgrade,
    Path(link): Path<String>,
    State(state): State<Arc<AppState>>,
) -> Response {
    ws.on_upgrade(move |socket| async move {
        match state.find_page(&link) {
            Some((page, _)) => {
                let (sink, stream) = socket.split();
                run_subscription(state, page, sink, stream).await;
            }
            None => close_unknown(socket).await,
        }
    })
}

/// Handle GET /time_sync - Answer clock-sync requests until the client leaves
pub async fn time_sync_handler(ws: WebSocketUpgrade) -> Response {
    ws.on_upgrade(|socket| async move {
        let (sink, stream) = socket.split();
        run_clock_sync(sink, stream).await;
    })
}

async fn close_unknown(mut socket: WebSocket) {
    debug!("Closing subscription to unknown page");
    let frame = CloseFrame {
        code: close_code::NORMAL,
        reason: "Page not found".into(),
    };
    if let Err(e) = socket.send(Message::Close(Some(frame))).await {
        debug!("Failed to close subscription: {}", e);
    }
}

/// Keeps a connection registered for as long as it is alive
struct Registration<'a> {
    registry: &'a BroadcastRegistry,
    connection: Connection,
    public_link: String,
}

impl Drop for Registration<'_> {
    fn drop(&mut self) {
        self.registry.disconnect(&self.connection, &self.public_link);
    }
}

fn snapshot_message(page: &Page) -> Option<Message> {
    match serde_json::to_string(&page.snapshot()) {
        Ok(payload) => Some(Message::Text(payload)),
        Err(e) => {
            warn!("Failed to serialize page snapshot: {}", e);
            None
        }
    }
}

/// Current snapshot of `page`, superseding every update already queued
///
/// Commits enqueue while holding the page lock, so anything queued before the
/// lock is taken here is older than the snapshot and is dropped.
async fn fresh_snapshot(page: &SharedPage, updates: &mut UnboundedReceiver<Arc<str>>) -> Option<Message> {
    let page = page.lock().await;
    while updates.try_recv().is_ok() {}
    snapshot_message(&page)
}

/// Serve one subscriber until either side goes away
///
/// The subscriber receives the current snapshot on open, every committed
/// update, and a heartbeat snapshot every `settings.heartbeat`. Messages from
/// the client are ignored. The registration is dropped on every exit path.
pub async fn run_subscription<Tx, Rx, E>(
    state: Arc<AppState>,
    page: SharedPage,
    mut sink: Tx,
    mut stream: Rx,
) where
    Tx: Sink<Message> + Unpin,
    Rx: Stream<Item = Result<Message, E>> + Unpin,
    E: std::fmt::Display,
{
    let public_link = page.lock().await.public_link.clone();
    let (connection, mut updates) = Connection::channel();
    state.registry.connect(connection.clone(), &public_link);
    let _registration = Registration {
        registry: &state.registry,
        connection,
        public_link: public_link.clone(),
    };
    info!("Subscriber joined page {}", public_link);

    let period = state.settings.heartbeat;
    let mut heartbeat = interval_at(Instant::now() + period, period);
    heartbeat.set_missed_tick_behavior(MissedTickBehavior::Delay);

    let mut outgoing = fresh_snapshot(&page, &mut updates).await;
    loop {
        if let Some(message) = outgoing.take() {
            if sink.send(message).await.is_err() {
                debug!("Subscriber of page {} unreachable", public_link);
                break;
            }
        }

        tokio::select! {
            Some(payload) = updates.recv() => {
                outgoing = Some(Message::Text(payload.to_string()));
            }
            _ = heartbeat.tick() => {
                outgoing = fresh_snapshot(&page, &mut updates).await;
            }
            incoming = stream.next() => match incoming {
                Some(Ok(Message::Close(_))) | None => break,
                Some(Err(e)) => {
                    debug!("Subscription to page {} failed: {}", public_link, e);
                    break;
                }
                Some(Ok(_)) => {}
            },
        }
    }

    info!("Subscriber left page {}", public_link);
}

/// Answer `{t1}` with `{t1, t2, t3}` until the client leaves
pub async fn run_clock_sync<Tx, Rx, E>(mut sink: Tx, mut stream: Rx)
where
    Tx: Sink<Message> + Unpin,
    Rx: Stream<Item = Result<Message, E>> + Unpin,
    E: std::fmt::Display,
{
    while let Some(incoming) = stream.next().await {
        match incoming {
            Ok(Message::Text(text)) => match clock_sync::respond(&text) {
                Some(reply) => {
                    if sink.send(Message::Text(reply)).await.is_err() {
                        break;
                    }
                }
                None => debug!("Ignoring malformed clock-sync message"),
            },
            Ok(Message::Close(_)) => break,
            Ok(_) => {}
            Err(e) => {
                debug!("Clock-sync connection failed: {}", e);
                break;
            }
        }
    }
}
