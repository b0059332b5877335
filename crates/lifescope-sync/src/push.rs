//! The push adapter: WebSocket frame stream and keepalive.
//!
//! One task owns the socket for the whole session: connect, request an
//! immediate update, then fan incoming frames out to the store and the
//! dispatcher until the link dies, and reconnect on a fixed delay. The
//! adapter never writes state itself; update frames are *offered* to
//! the store under a receipt-time mark and the store's freshness gate
//! decides, exactly as it does for poll responses.

use std::sync::Arc;
use std::time::Duration;

use futures::stream::SplitSink;
use futures::{SinkExt, StreamExt};
use lifescope_types::{ClientMessage, ServerMessage};
use tokio::net::TcpStream;
use tokio::sync::watch;
use tokio::time::MissedTickBehavior;
use tokio_tungstenite::tungstenite::Message;
use tokio_tungstenite::{MaybeTlsStream, WebSocketStream, connect_async};
use tracing::{debug, info, warn};

use crate::clock::FreshnessClock;
use crate::dispatch::CommandDispatcher;
use crate::error::SyncError;
use crate::monitor::ConnectionMonitor;
use crate::store::WorldStore;

/// Fixed delay between reconnect attempts.
const RECONNECT_DELAY: Duration = Duration::from_secs(3);

/// Cadence of client-side keepalive pings.
const KEEPALIVE_INTERVAL: Duration = Duration::from_secs(20);

/// Write half of the client socket.
type WsSink = SplitSink<WebSocketStream<MaybeTlsStream<TcpStream>>, Message>;

/// Why a socket stopped being driven.
enum SocketEnd {
    /// Session shutdown was requested; do not reconnect.
    Shutdown,
    /// The link failed or the backend closed it; reconnect.
    Lost,
}

/// Wiring for the push adapter task.
pub(crate) struct PushAdapter {
    /// WebSocket endpoint, for example `ws://127.0.0.1:8000/ws`.
    pub(crate) ws_url: String,
    /// Store to offer update bundles to.
    pub(crate) store: WorldStore,
    /// Session freshness clock.
    pub(crate) clock: Arc<FreshnessClock>,
    /// Health sink.
    pub(crate) monitor: Arc<ConnectionMonitor>,
    /// Receives command echoes from the broadcast stream.
    pub(crate) dispatcher: Arc<CommandDispatcher>,
}

impl PushAdapter {
    /// Drive connect/stream/reconnect until shutdown.
    pub(crate) async fn run(self, mut shutdown: watch::Receiver<bool>) {
        loop {
            match connect_async(self.ws_url.as_str()).await {
                Ok((socket, _response)) => {
                    info!(url = %self.ws_url, "push socket connected");
                    self.monitor.push_connected().await;
                    let end = self.drive_socket(socket, &mut shutdown).await;
                    self.monitor.push_lost().await;
                    if matches!(end, SocketEnd::Shutdown) {
                        return;
                    }
                    info!(
                        retry_in_secs = RECONNECT_DELAY.as_secs(),
                        "push socket lost, reconnecting"
                    );
                }
                Err(error) => {
                    warn!(
                        url = %self.ws_url,
                        error = %error,
                        retry_in_secs = RECONNECT_DELAY.as_secs(),
                        "push connect failed"
                    );
                }
            }

            tokio::select! {
                () = tokio::time::sleep(RECONNECT_DELAY) => {}
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        return;
                    }
                }
            }
        }
    }

    /// Pump one live socket until it ends.
    async fn drive_socket(
        &self,
        socket: WebSocketStream<MaybeTlsStream<TcpStream>>,
        shutdown: &mut watch::Receiver<bool>,
    ) -> SocketEnd {
        let (mut sink, mut source) = socket.split();

        // Ask for a full update now instead of waiting out the
        // backend's broadcast cadence.
        if let Err(error) = send_client_frame(&mut sink, ClientMessage::RequestUpdate).await {
            warn!(error = %error, "initial update request failed");
            return SocketEnd::Lost;
        }

        let mut keepalive = tokio::time::interval(KEEPALIVE_INTERVAL);
        keepalive.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The first interval tick fires immediately; the handshake
        // traffic above already proves the link, so push it out.
        keepalive.reset();

        loop {
            tokio::select! {
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        let _ = sink.send(Message::Close(None)).await;
                        return SocketEnd::Shutdown;
                    }
                }
                _ = keepalive.tick() => {
                    if let Err(error) = send_client_frame(&mut sink, ClientMessage::Ping).await {
                        warn!(error = %error, "keepalive send failed");
                        return SocketEnd::Lost;
                    }
                }
                frame = source.next() => {
                    match frame {
                        Some(Ok(Message::Text(text))) => self.handle_frame(text.as_str()).await,
                        Some(Ok(Message::Ping(payload))) => {
                            if sink.send(Message::Pong(payload)).await.is_err() {
                                return SocketEnd::Lost;
                            }
                        }
                        Some(Ok(Message::Close(_))) => {
                            debug!("push socket closed by the backend");
                            return SocketEnd::Lost;
                        }
                        // Binary and pong frames are not part of the protocol.
                        Some(Ok(_)) => {}
                        Some(Err(error)) => {
                            warn!(error = %error, "push socket stream error");
                            return SocketEnd::Lost;
                        }
                        None => {
                            debug!("push socket stream ended");
                            return SocketEnd::Lost;
                        }
                    }
                }
            }
        }
    }

    /// Decode and route one text frame. Undecodable frames are dropped
    /// with a log line; one bad frame must not cost the connection.
    async fn handle_frame(&self, text: &str) {
        let message: ServerMessage = match serde_json::from_str(text) {
            Ok(message) => message,
            Err(error) => {
                debug!(error = %error, "undecodable push frame dropped");
                return;
            }
        };

        match message {
            ServerMessage::SimulationUpdate { data } => {
                // Receipt-stamped: the frame is current as of now, so
                // it outranks every request issued before this moment.
                let mark = self.clock.next();
                let applied = self.store.apply_bundle(data, mark).await;
                debug!(mark = %mark, applied = ?applied, "push update offered");
            }
            ServerMessage::SimulationControl { action } => {
                self.dispatcher.confirm_echo(&action).await;
            }
            ServerMessage::SpeedChange { speed } => {
                self.dispatcher.confirm_speed_echo(speed).await;
            }
            ServerMessage::Error { message } => {
                warn!(message = %message, "backend reported an error");
            }
            ServerMessage::Connected { message } => {
                debug!(message = %message, "push handshake greeting");
            }
            ServerMessage::Pong => {}
            ServerMessage::Unknown => {
                debug!("ignoring unknown push frame type");
            }
        }
    }
}

/// Serialize and send one client frame.
async fn send_client_frame(sink: &mut WsSink, frame: ClientMessage) -> Result<(), SyncError> {
    let text = serde_json::to_string(&frame)?;
    sink.send(Message::text(text))
        .await
        .map_err(|e| SyncError::WebSocket(e.to_string()))
}
