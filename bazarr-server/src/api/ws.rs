//! Websocket push channel
//!
//! Every connected client receives every hub event as one JSON text frame.
//! A client that falls behind the broadcast buffer skips the oldest events
//! and keeps going. Frames sent by the client are ignored apart from close.

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        State,
    },
    response::Response,
};
use bazarr_common::UiEvent;
use futures::{Sink, SinkExt, Stream, StreamExt};
use tokio::sync::broadcast::{self, error::RecvError};
use tokio::sync::watch;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::AppState;

/// GET /api/ws - websocket upgrade
pub async fn websocket(ws: WebSocketUpgrade, State(state): State<AppState>) -> Response {
    // Subscribe before the handshake so nothing emitted meanwhile is missed
    let events = state.hub.subscribe();
    let shutdown = state.shutdown_receiver();
    ws.on_upgrade(move |socket| handle_socket(socket, events, shutdown))
}

async fn handle_socket(
    socket: WebSocket,
    events: broadcast::Receiver<UiEvent>,
    shutdown: watch::Receiver<bool>,
) {
    let client_id = Uuid::new_v4();
    info!(%client_id, "Websocket client connected");

    let (mut sender, receiver) = socket.split();
    pump_events(&mut sender, receiver, events, shutdown, client_id).await;
    let _ = sender.close().await;

    info!(%client_id, "Websocket client disconnected");
}

/// Forward hub events to the client until either side goes away or the
/// server shuts down
async fn pump_events<Tx, Rx, E>(
    mut sender: Tx,
    mut receiver: Rx,
    mut events: broadcast::Receiver<UiEvent>,
    mut shutdown: watch::Receiver<bool>,
    client_id: Uuid,
) where
    Tx: Sink<Message> + Unpin,
    Rx: Stream<Item = Result<Message, E>> + Unpin,
    E: std::fmt::Display,
{
    loop {
        if *shutdown.borrow() {
            break;
        }
        tokio::select! {
            changed = shutdown.changed() => {
                if changed.is_err() {
                    break;
                }
            },
            received = events.recv() => match received {
                Ok(event) => {
                    let json = match serde_json::to_string(&event) {
                        Ok(json) => json,
                        Err(e) => {
                            warn!(%client_id, "Failed to serialize {} event: {}", event.event_name(), e);
                            continue;
                        }
                    };
                    if sender.send(Message::Text(json)).await.is_err() {
                        debug!(%client_id, "Websocket send failed");
                        break;
                    }
                }
                Err(RecvError::Lagged(skipped)) => {
                    warn!(%client_id, "Websocket client lagging, skipped {} events", skipped);
                }
                Err(RecvError::Closed) => break,
            },
            incoming = receiver.next() => match incoming {
                Some(Ok(Message::Close(_))) | None => break,
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    debug!(%client_id, "Websocket receive error: {}", e);
                    break;
                }
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bazarr_common::{EventHub, EventType};
    use futures::channel::mpsc;
    use std::time::Duration;

    fn no_shutdown() -> (watch::Sender<bool>, watch::Receiver<bool>) {
        watch::channel(false)
    }

    fn text_of(message: Message) -> serde_json::Value {
        match message {
            Message::Text(text) => serde_json::from_str(&text).expect("valid JSON frame"),
            other => panic!("expected text frame, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_events_forwarded_as_json_frames() {
        let hub = EventHub::default();
        let (out_tx, mut out_rx) = mpsc::unbounded::<Message>();
        let (in_tx, in_rx) = mpsc::unbounded::<Result<Message, axum::Error>>();

        let (_stop, shutdown) = no_shutdown();
        let pump = tokio::spawn(pump_events(out_tx, in_rx, hub.subscribe(), shutdown, Uuid::new_v4()));

        hub.emit(UiEvent::new(EventType::Episode).series(1).episode(2));
        hub.show_message("hello");

        let first = tokio::time::timeout(Duration::from_secs(1), out_rx.next())
            .await
            .expect("first frame")
            .expect("stream open");
        let first = text_of(first);
        assert_eq!(first["type"], "episode");
        assert_eq!(first["episode"], 2);

        let second = tokio::time::timeout(Duration::from_secs(1), out_rx.next())
            .await
            .expect("second frame")
            .expect("stream open");
        let second = text_of(second);
        assert_eq!(second["type"], "message");
        assert_eq!(second["payload"]["message"], "hello");

        in_tx
            .unbounded_send(Ok(Message::Close(None)))
            .expect("send close");
        tokio::time::timeout(Duration::from_secs(1), pump)
            .await
            .expect("pump should stop on close")
            .expect("pump task should not panic");
    }

    #[tokio::test]
    async fn test_pump_stops_when_client_stream_ends() {
        let hub = EventHub::default();
        let (out_tx, _out_rx) = mpsc::unbounded::<Message>();
        let (in_tx, in_rx) = mpsc::unbounded::<Result<Message, axum::Error>>();

        let (_stop, shutdown) = no_shutdown();
        let pump = tokio::spawn(pump_events(out_tx, in_rx, hub.subscribe(), shutdown, Uuid::new_v4()));
        assert_eq!(hub.subscriber_count(), 1);

        drop(in_tx);
        tokio::time::timeout(Duration::from_secs(1), pump)
            .await
            .expect("pump should stop")
            .expect("pump task should not panic");
        assert_eq!(hub.subscriber_count(), 0);
    }

    #[tokio::test]
    async fn test_lagging_client_continues_with_newest() {
        let hub = EventHub::new(2, 2);
        let events = hub.subscribe();

        for id in 0..5 {
            hub.emit(UiEvent::new(EventType::Movie).movie(id));
        }

        let (out_tx, mut out_rx) = mpsc::unbounded::<Message>();
        let (in_tx, in_rx) = mpsc::unbounded::<Result<Message, axum::Error>>();
        let (_stop, shutdown) = no_shutdown();
        let pump = tokio::spawn(pump_events(out_tx, in_rx, events, shutdown, Uuid::new_v4()));

        let mut movies = Vec::new();
        for _ in 0..2 {
            let frame = tokio::time::timeout(Duration::from_secs(1), out_rx.next())
                .await
                .expect("frame")
                .expect("stream open");
            movies.push(text_of(frame)["movie"].as_i64());
        }
        assert_eq!(movies, vec![Some(3), Some(4)]);

        drop(in_tx);
        let _ = tokio::time::timeout(Duration::from_secs(1), pump).await;
    }

    #[tokio::test]
    async fn test_pump_stops_on_shutdown() {
        let hub = EventHub::default();
        let (out_tx, _out_rx) = mpsc::unbounded::<Message>();
        let (_in_tx, in_rx) = mpsc::unbounded::<Result<Message, axum::Error>>();
        let (stop, shutdown) = no_shutdown();

        let pump = tokio::spawn(pump_events(out_tx, in_rx, hub.subscribe(), shutdown, Uuid::new_v4()));

        stop.send_replace(true);
        tokio::time::timeout(Duration::from_secs(1), pump)
            .await
            .expect("pump should stop on shutdown")
            .expect("pump task should not panic");
    }
}
