//! WebSocket session lifecycle, from upgrade through disconnect.

use axum::extract::ws::{Message, WebSocket};
use futures::{SinkExt, StreamExt};
use medflow::connections::{ChannelSink, ConnectionHandle};
use medflow::transcription::TranscriptionService;
use std::error::Error as StdError;
use std::io::ErrorKind;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::mpsc;
use tokio_tungstenite::tungstenite::error::ProtocolError;
use tokio_tungstenite::tungstenite::Error as WsError;
use tracing::{debug, info, info_span, Instrument};

/// Shortest ping interval a session will use.
const MIN_PING_INTERVAL: Duration = Duration::from_secs(1);

/// Per-connection transport settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionSettings {
    /// Outbound messages buffered before a slow peer is dropped.
    pub outbound_capacity: usize,
    /// Time between server-initiated pings.
    pub ping_interval: Duration,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            outbound_capacity: 256,
            ping_interval: Duration::from_secs(30),
        }
    }
}

/// Runs one client session.
///
/// The peer is registered before the first frame is read. Each text frame,
/// or binary frame holding UTF-8, goes through the transcription flow and
/// its reply is written back before the next frame is read. When the peer
/// closes, or drops the connection without a close frame, the remaining
/// peers are notified it left; when the socket hits a protocol fault, they
/// receive the error instead.
pub async fn run_session(
    socket: WebSocket,
    service: TranscriptionService,
    settings: SessionSettings,
) {
    let (sink, outbound_rx) = ChannelSink::new(settings.outbound_capacity.max(1));
    let (handle, total) = service.connect(Arc::new(sink));
    let span = info_span!("ws.session", connection_id = %handle.id());

    async move {
        info!(total, "Session started");
        drive(socket, &service, settings, handle, outbound_rx).await;
    }
    .instrument(span)
    .await;
}

async fn drive(
    socket: WebSocket,
    service: &TranscriptionService,
    settings: SessionSettings,
    handle: ConnectionHandle,
    mut outbound_rx: mpsc::Receiver<Arc<str>>,
) {
    let id = handle.id();
    let (mut ws_tx, mut ws_rx) = socket.split();

    let ping_every = settings.ping_interval.max(MIN_PING_INTERVAL);
    let writer = tokio::spawn(
        async move {
            let mut ping = tokio::time::interval(ping_every);
            // The first tick fires immediately.
            ping.tick().await;

            loop {
                tokio::select! {
                    msg = outbound_rx.recv() => {
                        let Some(text) = msg else { break };
                        if ws_tx.send(Message::Text(text.to_string().into())).await.is_err() {
                            break;
                        }
                    }
                    _ = ping.tick() => {
                        if ws_tx.send(Message::Ping(Vec::new().into())).await.is_err() {
                            break;
                        }
                    }
                }
            }
            debug!("Writer stopped");
        }
        .in_current_span(),
    );

    let mut failure = None;
    while let Some(frame) = ws_rx.next().await {
        let text = match frame {
            Ok(Message::Text(text)) => text.to_string(),
            Ok(Message::Binary(data)) => match std::str::from_utf8(&data) {
                Ok(text) => text.to_string(),
                Err(_) => {
                    debug!(len = data.len(), "Skipping non-UTF-8 binary frame");
                    continue;
                }
            },
            Ok(Message::Close(_)) => {
                debug!("Client sent close frame");
                break;
            }
            Ok(Message::Ping(_) | Message::Pong(_)) => continue,
            Err(e) if is_abrupt_close(&e) => {
                debug!(error = %e, "Client dropped without a close frame");
                break;
            }
            Err(e) => {
                failure = Some(e.to_string());
                break;
            }
        };

        let outcome = service.handle_message(id, &text).await;
        debug!(?outcome, "Message handled");
    }

    let remaining = match failure {
        Some(reason) => service.connection_error(id, &reason).await,
        None => service.disconnect(id).await,
    };
    info!(remaining, "Session ended");

    drop(handle);
    writer.abort();
}

/// Returns true if `err` means the peer simply went away: a dropped TCP
/// connection or a missing closing handshake. Those count as a normal
/// disconnect rather than a protocol fault.
fn is_abrupt_close(err: &(dyn StdError + 'static)) -> bool {
    let mut innermost = err;
    let mut current = Some(err);
    while let Some(e) = current {
        if let Some(ws) = e.downcast_ref::<WsError>() {
            return match ws {
                WsError::ConnectionClosed
                | WsError::AlreadyClosed
                | WsError::Protocol(ProtocolError::ResetWithoutClosingHandshake) => true,
                WsError::Io(io) => is_dropped_io(io),
                _ => false,
            };
        }
        if let Some(io) = e.downcast_ref::<std::io::Error>() {
            return is_dropped_io(io);
        }
        innermost = e;
        current = e.source();
    }

    // axum may link a different tungstenite release than ours, in which case
    // the downcast misses and only the message is comparable.
    let message = innermost.to_string();
    [
        WsError::ConnectionClosed,
        WsError::AlreadyClosed,
        WsError::Protocol(ProtocolError::ResetWithoutClosingHandshake),
    ]
    .iter()
    .any(|known| known.to_string() == message)
}

fn is_dropped_io(err: &std::io::Error) -> bool {
    matches!(
        err.kind(),
        ErrorKind::ConnectionReset
            | ErrorKind::ConnectionAborted
            | ErrorKind::BrokenPipe
            | ErrorKind::UnexpectedEof
    )
}
