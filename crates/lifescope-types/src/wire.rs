//! Envelope and frame types for the backend's REST and WebSocket wire.
//!
//! REST collection endpoints wrap their payloads in single-key envelopes
//! (`{"agents": [...]}`); the WebSocket speaks tagged JSON frames with a
//! `"type"` discriminant. Everything here is shape only, no behavior.

use serde::{Deserialize, Serialize};

use crate::structs::{Agent, ExtendedStats, WorldEvent, WorldSnapshot};

// ---------------------------------------------------------------------------
// REST envelopes
// ---------------------------------------------------------------------------

/// Envelope for the agents collection endpoint.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AgentsEnvelope {
    /// All living agents.
    #[serde(default)]
    pub agents: Vec<Agent>,
}

/// Envelope for the recent-events endpoint.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EventsEnvelope {
    /// Recent events, newest first.
    #[serde(default)]
    pub events: Vec<WorldEvent>,
}

/// Envelope for the deep-life statistics endpoint.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct StatsEnvelope {
    /// The statistics record itself.
    #[serde(rename = "phase10_systems", default)]
    pub systems: ExtendedStats,
}

/// Reply body of the control endpoints.
///
/// The backend reports command failures as HTTP 200 with
/// `"status": "error"`, so callers must check [`ControlReply::is_error`]
/// rather than trusting the status code.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ControlReply {
    /// Outcome label (`"started"`, `"paused"`, `"step_complete"`, ...).
    #[serde(default)]
    pub status: String,
    /// Run flag after the command, when the backend reports it.
    #[serde(rename = "isRunning", default)]
    pub is_running: Option<bool>,
    /// Day counter after a step, when the backend reports it.
    #[serde(default)]
    pub day: Option<u64>,
    /// Speed multiplier after a speed change, when the backend reports it.
    #[serde(default)]
    pub speed: Option<f64>,
    /// Human-readable failure reason on error replies.
    #[serde(default)]
    pub message: Option<String>,
}

impl ControlReply {
    /// Whether this reply reports a command failure.
    pub fn is_error(&self) -> bool {
        self.status == "error"
    }

    /// The failure reason, when this is an error reply.
    pub fn failure_reason(&self) -> Option<&str> {
        if self.is_error() {
            Some(self.message.as_deref().unwrap_or("backend rejected command"))
        } else {
            None
        }
    }
}

// ---------------------------------------------------------------------------
// WebSocket frames
// ---------------------------------------------------------------------------

/// The data body of a `simulation_update` frame.
///
/// Each slice is optional so a partial frame still applies what it
/// carries; in practice the backend always sends all three.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UpdateBundle {
    /// Snapshot slice.
    #[serde(default)]
    pub simulation: Option<WorldSnapshot>,
    /// Agents slice, wrapped like the REST endpoint wraps it.
    #[serde(default)]
    pub agents: Option<AgentsEnvelope>,
    /// Events slice, wrapped like the REST endpoint wraps it.
    #[serde(default)]
    pub events: Option<EventsEnvelope>,
}

/// Frames the backend sends over the WebSocket.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    /// Greeting sent once right after the socket opens.
    Connected {
        /// Human-readable greeting text.
        #[serde(default)]
        message: String,
    },
    /// Reply to a client ping.
    Pong,
    /// Periodic full-state broadcast.
    SimulationUpdate {
        /// The state slices carried by this frame.
        data: UpdateBundle,
    },
    /// Echo of a control command some client issued.
    SimulationControl {
        /// Raw action label as the backend spells it.
        action: String,
    },
    /// Echo of a speed change some client issued.
    SpeedChange {
        /// The new speed multiplier.
        speed: f64,
    },
    /// Server-side failure report.
    Error {
        /// Human-readable failure text.
        message: String,
    },
    /// Any frame type this client does not know; ignored on receipt.
    #[serde(other)]
    Unknown,
}

/// Frames this client sends over the WebSocket.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    /// Keepalive probe; the backend answers with `pong`.
    Ping,
    /// Ask for an immediate `simulation_update` outside the broadcast
    /// cadence.
    RequestUpdate,
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn update_frame_decodes_with_nested_envelopes() {
        let json = r#"{
            "type": "simulation_update",
            "data": {
                "simulation": {"day": 12, "isRunning": true},
                "agents": {"agents": [{"id": "aedan", "name": "Aedan"}]},
                "events": {"events": []}
            }
        }"#;
        let msg: ServerMessage = serde_json::from_str(json).unwrap();
        let ServerMessage::SimulationUpdate { data } = msg else {
            panic!("expected an update frame");
        };
        assert_eq!(data.simulation.unwrap().day, 12);
        assert_eq!(data.agents.unwrap().agents.len(), 1);
        assert!(data.events.unwrap().events.is_empty());
    }

    #[test]
    fn control_echo_and_greeting_decode() {
        let echo: ServerMessage =
            serde_json::from_str(r#"{"type": "simulation_control", "action": "pause"}"#).unwrap();
        assert_eq!(
            echo,
            ServerMessage::SimulationControl {
                action: String::from("pause")
            }
        );

        let hello: ServerMessage =
            serde_json::from_str(r#"{"type": "connected", "message": "hi"}"#).unwrap();
        assert_eq!(
            hello,
            ServerMessage::Connected {
                message: String::from("hi")
            }
        );
    }

    #[test]
    fn unknown_frame_types_decode_to_unknown() {
        let msg: ServerMessage =
            serde_json::from_str(r#"{"type": "telemetry_v2", "payload": {"x": 1}}"#).unwrap();
        assert_eq!(msg, ServerMessage::Unknown);
    }

    #[test]
    fn client_frames_encode_with_type_tags() {
        let ping = serde_json::to_string(&ClientMessage::Ping).unwrap();
        assert_eq!(ping, r#"{"type":"ping"}"#);
        let req = serde_json::to_string(&ClientMessage::RequestUpdate).unwrap();
        assert_eq!(req, r#"{"type":"request_update"}"#);
    }

    #[test]
    fn error_reply_detected_despite_http_success() {
        let reply: ControlReply = serde_json::from_str(
            r#"{"status": "error", "message": "Cannot step while the simulation is running"}"#,
        )
        .unwrap();
        assert!(reply.is_error());
        assert_eq!(
            reply.failure_reason(),
            Some("Cannot step while the simulation is running")
        );

        let ok: ControlReply =
            serde_json::from_str(r#"{"status": "started", "isRunning": true}"#).unwrap();
        assert!(!ok.is_error());
        assert_eq!(ok.failure_reason(), None);
        assert_eq!(ok.is_running, Some(true));
    }

    #[test]
    fn step_reply_carries_day() {
        let reply: ControlReply =
            serde_json::from_str(r#"{"status": "step_complete", "day": 348}"#).unwrap();
        assert_eq!(reply.day, Some(348));
    }
}
