//! Connection supervisor and session event loop.
//!
//! One supervisor task per started adapter. It serializes every channel
//! event (open, message, error, close) through a single `select!` loop, so
//! no two events for one instance are ever processed concurrently. Outbound
//! commands from the dispatcher arrive over an mpsc queue attached while a
//! session is live.
//!
//! Reconnect policy: fixed delay, one pending sleep at most (the supervisor
//! owns it), no backoff. The shutdown signal wins every race via biased
//! select, which is what makes `stop()` guarantee zero further attempts.

// ============================================================================
// Imports
// ============================================================================

use std::sync::Arc;
use std::time::Duration;

use futures_util::stream::SplitSink;
use futures_util::{SinkExt, StreamExt};
use tokio::net::TcpStream;
use tokio::sync::{broadcast, mpsc};
use tokio::task::JoinHandle;
use tokio::time::sleep;
use tokio_tungstenite::tungstenite::client::IntoClientRequest;
use tokio_tungstenite::tungstenite::http::HeaderValue;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{connect_async, MaybeTlsStream, WebSocketStream};
use tracing::{debug, error, info};

use crate::adapter::{AdapterInner, ConnectionState, Status};
use crate::auth::AuthSession;
use crate::catalog;
use crate::config::ConnectionConfig;
use crate::error::Result;
use crate::protocol::handshake::{Handshake, HandshakeAction};
use crate::protocol::message::Outbound;
use crate::protocol::SUBPROTOCOL;

// ============================================================================
// Constants
// ============================================================================

/// Fixed delay between a lost channel and the next connection attempt.
pub const RECONNECT_DELAY: Duration = Duration::from_secs(5);

// ============================================================================
// Types
// ============================================================================

type WsStream = WebSocketStream<MaybeTlsStream<TcpStream>>;
type WsSink = SplitSink<WsStream, Message>;

/// Why a session ended.
enum SessionEnd {
    /// Shutdown was requested; do not reconnect.
    Stopped,
    /// Channel closed (by the server, or after an auth rejection).
    Closed,
    /// Transport error with a reportable message.
    Lost(String),
}

// ============================================================================
// Supervisor
// ============================================================================

/// Spawns the connection supervisor for one adapter instance.
pub(crate) fn spawn(
    inner: Arc<AdapterInner>,
    config: ConnectionConfig,
    shutdown_rx: broadcast::Receiver<()>,
) -> JoinHandle<()> {
    tokio::spawn(run(inner, config, shutdown_rx))
}

async fn run(
    inner: Arc<AdapterInner>,
    config: ConnectionConfig,
    mut shutdown_rx: broadcast::Receiver<()>,
) {
    loop {
        let attempt = tokio::select! {
            biased;
            _ = shutdown_rx.recv() => return,
            result = connect(&config) => result,
        };

        match attempt {
            Ok(stream) => {
                inner.set_state(ConnectionState::Authenticating);
                inner.report_status(Status::Ok);

                match drive_session(&inner, stream, &mut shutdown_rx).await {
                    SessionEnd::Stopped => return,
                    SessionEnd::Closed => {
                        debug!("channel closed, reconnect scheduled");
                        inner.set_state(ConnectionState::Disconnected);
                    }
                    SessionEnd::Lost(message) => {
                        error!(error = %message, "channel lost");
                        inner.set_state(ConnectionState::Failed);
                        inner.report_status(Status::connection_failure(message));
                    }
                }
            }

            Err(e) => {
                error!(error = %e, "channel open failed");
                inner.set_state(ConnectionState::Failed);
                inner.report_status(Status::connection_failure(e.to_string()));
            }
        }

        // The one pending reconnect timer; shutdown cancels it.
        tokio::select! {
            biased;
            _ = shutdown_rx.recv() => return,
            () = sleep(RECONNECT_DELAY) => {}
        }

        inner.set_state(ConnectionState::Connecting);
        inner.report_status(Status::Connecting);
    }
}

// ============================================================================
// Connect
// ============================================================================

/// Opens the channel, advertising the fixed sub-protocol.
async fn connect(config: &ConnectionConfig) -> Result<WsStream> {
    let url = config.ws_url();
    debug!(%url, "opening channel");

    let mut request = url.into_client_request()?;
    request.headers_mut().insert(
        "Sec-WebSocket-Protocol",
        HeaderValue::from_static(SUBPROTOCOL),
    );

    let (stream, _response) = connect_async(request).await?;
    Ok(stream)
}

// ============================================================================
// Session Loop
// ============================================================================

/// Drives one open channel until it ends.
///
/// Handles inbound frames through the handshake machine, forwards queued
/// outbound commands, and reacts to the shutdown signal. The catalog refresh
/// is spawned off so a close/error arriving mid-fetch is still handled here
/// immediately.
async fn drive_session(
    inner: &Arc<AdapterInner>,
    stream: WsStream,
    shutdown_rx: &mut broadcast::Receiver<()>,
) -> SessionEnd {
    let (mut ws_write, mut ws_read) = stream.split();
    let (command_tx, mut command_rx) = mpsc::unbounded_channel::<Outbound>();
    inner.attach_link(command_tx.clone());

    // The auth history lives only as long as its connection.
    inner.record_session(AuthSession::default());
    let mut handshake = Handshake::new();

    let end = loop {
        tokio::select! {
            biased;

            _ = shutdown_rx.recv() => {
                let _ = ws_write.close().await;
                break SessionEnd::Stopped;
            }

            frame = ws_read.next() => match frame {
                Some(Ok(Message::Text(text))) => match handshake.on_text(&text) {
                    HandshakeAction::Send(message) => {
                        inner.record_session(handshake.session().clone());
                        if let Err(e) = send_frame(&mut ws_write, &message).await {
                            break SessionEnd::Lost(e.to_string());
                        }
                    }
                    HandshakeAction::AuthSucceeded => {
                        inner.set_state(ConnectionState::Ready);
                        info!("authenticated, starting discovery");
                        tokio::spawn(catalog::refresh(Arc::clone(inner)));
                    }
                    HandshakeAction::Close => {
                        let _ = ws_write.close().await;
                        break SessionEnd::Closed;
                    }
                    HandshakeAction::Ignore => {}
                },

                Some(Ok(Message::Close(_))) => {
                    debug!("channel closed by server");
                    break SessionEnd::Closed;
                }

                Some(Err(e)) => break SessionEnd::Lost(e.to_string()),

                None => break SessionEnd::Closed,

                // Binary, Ping, Pong carry nothing in this protocol.
                _ => {}
            },

            command = command_rx.recv() => {
                if let Some(message) = command
                    && let Err(e) = send_frame(&mut ws_write, &message).await
                {
                    break SessionEnd::Lost(e.to_string());
                }
            }
        }
    };

    inner.detach_link(&command_tx);
    end
}

/// Serializes and sends one outbound frame.
async fn send_frame(sink: &mut WsSink, message: &Outbound) -> Result<()> {
    let json = serde_json::to_string(message)?;
    sink.send(Message::Text(json.into())).await?;
    Ok(())
}
