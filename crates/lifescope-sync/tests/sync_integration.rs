//! Integration tests for the sync layer against a mock backend.
//!
//! A small Axum app stands in for the simulation backend: the REST read
//! endpoints, the control endpoints, and the `/ws` stream, all served
//! from one shared world record on an ephemeral local port. Tests drive
//! the real adapters against it over real sockets.

#![allow(clippy::unwrap_used)]

use std::sync::Arc;
use std::time::Duration;

use axum::Json;
use axum::Router;
use axum::extract::ws::{Message, WebSocket, WebSocketUpgrade};
use axum::extract::{Path, State};
use axum::response::IntoResponse;
use axum::routing::{any, get, post};
use lifescope_sync::{
    CommandDispatcher, FreshnessClock, RestClient, SyncConfig, SyncSession, WorldStore,
};
use lifescope_types::{CommandState, ConnectionState, ControlAction, WorldView};
use serde_json::{Value, json};
use tokio::net::TcpListener;
use tokio::sync::{Mutex, broadcast};

// =========================================================================
// Mock backend
// =========================================================================

/// Mutable world record behind the mock endpoints.
#[derive(Debug)]
struct MockWorld {
    day: u64,
    running: bool,
    speed: f64,
    reject_controls: bool,
    agents: Vec<Value>,
    events: Vec<Value>,
}

impl Default for MockWorld {
    fn default() -> Self {
        Self {
            day: 7,
            running: true,
            speed: 1.0,
            reject_controls: false,
            agents: vec![
                json!({"id": "aedan", "name": "Aedan", "tribe": "Storm Tribe", "age": 31}),
                json!({"id": "kara", "name": "Kara", "tribe": "River Folk", "age": 26}),
            ],
            events: vec![
                json!({"id": "e2", "type": "discovery", "description": "Kara found a cave"}),
                json!({"id": "e1", "type": "birth", "description": "A child was born"}),
            ],
        }
    }
}

impl MockWorld {
    fn simulation_json(&self) -> Value {
        json!({
            "day": self.day,
            "population": self.agents.len(),
            "isRunning": self.running,
            "speed": self.speed,
            "phase": "Deep Life",
        })
    }
}

#[derive(Clone)]
struct MockState {
    world: Arc<Mutex<MockWorld>>,
    frames: broadcast::Sender<String>,
}

impl MockState {
    async fn update_frame(&self) -> String {
        let world = self.world.lock().await;
        json!({
            "type": "simulation_update",
            "data": {
                "simulation": world.simulation_json(),
                "agents": {"agents": world.agents.clone()},
                "events": {"events": world.events.clone()},
            }
        })
        .to_string()
    }
}

async fn get_simulation(State(state): State<MockState>) -> Json<Value> {
    Json(state.world.lock().await.simulation_json())
}

async fn get_agents(State(state): State<MockState>) -> Json<Value> {
    let world = state.world.lock().await;
    Json(json!({"agents": world.agents.clone()}))
}

async fn get_events(State(state): State<MockState>) -> Json<Value> {
    let world = state.world.lock().await;
    Json(json!({"events": world.events.clone()}))
}

async fn get_phase10(State(state): State<MockState>) -> Json<Value> {
    let world = state.world.lock().await;
    Json(json!({
        "phase10_systems": {
            "love_romance": {
                "active_relationships": if world.running { 3 } else { 0 },
                "total_events": 12,
            },
        }
    }))
}

async fn post_control(State(state): State<MockState>, Path(verb): Path<String>) -> Json<Value> {
    let mut world = state.world.lock().await;
    if world.reject_controls {
        return Json(json!({"status": "error", "message": "backend is in maintenance"}));
    }
    match verb.as_str() {
        "start" => {
            world.running = true;
            Json(json!({"status": "started", "isRunning": true}))
        }
        "pause" => {
            world.running = false;
            Json(json!({"status": "paused", "isRunning": false}))
        }
        "stop" => {
            world.running = false;
            Json(json!({"status": "stopped", "isRunning": false}))
        }
        "step" => {
            if world.running {
                Json(json!({
                    "status": "error",
                    "message": "Cannot step while the simulation is running"
                }))
            } else {
                world.day = world.day.saturating_add(1);
                Json(json!({"status": "step_complete", "day": world.day}))
            }
        }
        other => Json(json!({"status": "error", "message": format!("unknown action {other}")})),
    }
}

async fn post_speed(State(state): State<MockState>, Path(speed): Path<f64>) -> Json<Value> {
    let mut world = state.world.lock().await;
    world.speed = speed.clamp(0.1, 10.0);
    Json(json!({"status": "speed_changed", "speed": world.speed}))
}

async fn ws_route(State(state): State<MockState>, upgrade: WebSocketUpgrade) -> impl IntoResponse {
    upgrade.on_upgrade(move |socket| drive_mock_socket(socket, state))
}

async fn drive_mock_socket(mut socket: WebSocket, state: MockState) {
    let greeting = json!({"type": "connected", "message": "welcome"}).to_string();
    if socket.send(Message::Text(greeting.into())).await.is_err() {
        return;
    }
    let mut frames = state.frames.subscribe();
    loop {
        tokio::select! {
            injected = frames.recv() => {
                let Ok(frame) = injected else { break };
                if socket.send(Message::Text(frame.into())).await.is_err() {
                    break;
                }
            }
            incoming = socket.recv() => {
                let Some(Ok(message)) = incoming else { break };
                let Message::Text(text) = message else { continue };
                let value: Value = serde_json::from_str(text.as_str()).unwrap_or_default();
                match value["type"].as_str() {
                    Some("ping") => {
                        let pong = json!({"type": "pong"}).to_string();
                        if socket.send(Message::Text(pong.into())).await.is_err() {
                            break;
                        }
                    }
                    Some("request_update") => {
                        let frame = state.update_frame().await;
                        if socket.send(Message::Text(frame.into())).await.is_err() {
                            break;
                        }
                    }
                    _ => {}
                }
            }
        }
    }
}

/// A running mock backend plus the handles tests poke it through.
struct MockBackend {
    rest_url: String,
    ws_url: String,
    world: Arc<Mutex<MockWorld>>,
    frames: broadcast::Sender<String>,
}

async fn spawn_mock_backend() -> MockBackend {
    let world = Arc::new(Mutex::new(MockWorld::default()));
    let (frames, _) = broadcast::channel(16);
    let state = MockState {
        world: Arc::clone(&world),
        frames: frames.clone(),
    };

    let app = Router::new()
        .route("/api/simulation", get(get_simulation))
        .route("/api/agents", get(get_agents))
        .route("/api/events", get(get_events))
        .route("/api/phase10", get(get_phase10))
        .route("/api/control/speed/{speed}", post(post_speed))
        .route("/api/control/{verb}", post(post_control))
        .route("/ws", any(ws_route))
        .with_state(state);

    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    MockBackend {
        rest_url: format!("http://{addr}/api"),
        ws_url: format!("ws://{addr}/ws"),
        world,
        frames,
    }
}

/// Fast poll cadences so tests converge quickly.
fn test_config(backend: &MockBackend) -> SyncConfig {
    let mut config = SyncConfig {
        rest_url: backend.rest_url.clone(),
        ws_url: backend.ws_url.clone(),
        ..SyncConfig::default()
    };
    config.poll.snapshot = Duration::from_millis(50);
    config.poll.agents = Duration::from_millis(50);
    config.poll.events = Duration::from_millis(50);
    config.poll.stats = Duration::from_millis(100);
    config
}

/// Wait until the store's view satisfies `predicate`, or fail the test.
async fn wait_for_view<F>(store: &WorldStore, mut predicate: F) -> WorldView
where
    F: FnMut(&WorldView) -> bool,
{
    // Inner loop only ever exits by returning a matching view, so a
    // timeout here is the test failing.
    tokio::time::timeout(Duration::from_secs(5), async {
        loop {
            let view = store.view().await;
            if predicate(&view) {
                return view;
            }
            tokio::time::sleep(Duration::from_millis(20)).await;
        }
    })
    .await
    .unwrap()
}

// =========================================================================
// Tests
// =========================================================================

#[tokio::test]
async fn test_rest_client_round_trips_all_read_endpoints() {
    let backend = spawn_mock_backend().await;
    let rest = RestClient::new(&backend.rest_url).unwrap();

    let snapshot = rest.fetch_snapshot().await.unwrap();
    assert_eq!(snapshot.day, 7);
    assert!(snapshot.is_running);
    assert_eq!(snapshot.population, 2);

    let agents = rest.fetch_agents().await.unwrap();
    assert_eq!(agents.len(), 2);
    assert!(agents.iter().any(|a| a.name == "Kara"));

    let events = rest.fetch_events(10).await.unwrap();
    assert_eq!(events.len(), 2);
    assert_eq!(events.first().unwrap().id.as_str(), "e2");

    let stats = rest.fetch_stats().await.unwrap();
    assert_eq!(stats.love_romance.active_relationships, 3);
    assert_eq!(stats.love_romance.total_events, 12);
}

#[tokio::test]
async fn test_control_errors_surface_despite_http_200() {
    let backend = spawn_mock_backend().await;
    let rest = RestClient::new(&backend.rest_url).unwrap();

    // The world is running, so stepping is rejected in the reply body.
    let result = rest.send_control(ControlAction::Step).await;
    assert!(matches!(
        result,
        Err(lifescope_sync::SyncError::CommandRejected { .. })
    ));

    let reply = rest.send_control(ControlAction::Pause).await.unwrap();
    assert_eq!(reply.is_running, Some(false));

    let reply = rest.send_control(ControlAction::Step).await.unwrap();
    assert_eq!(reply.status, "step_complete");
    assert_eq!(reply.day, Some(8));

    let reply = rest
        .send_control(ControlAction::SetSpeed(50.0))
        .await
        .unwrap();
    assert_eq!(reply.speed, Some(10.0), "backend clamps the speed");
}

#[tokio::test]
async fn test_session_syncs_store_from_live_backend() {
    let backend = spawn_mock_backend().await;
    let session = SyncSession::start(test_config(&backend)).unwrap();

    let view = wait_for_view(session.store(), |v| {
        v.has_ever_synced && v.agents.len() == 2 && v.connection == ConnectionState::Connected
    })
    .await;

    assert_eq!(view.snapshot.day, 7);
    assert!(view.snapshot.is_running);
    assert_eq!(view.events.len(), 2);
    assert!(!view.group_names().is_empty());

    session.shutdown().await;
}

#[tokio::test]
async fn test_injected_push_frame_updates_the_view() {
    let backend = spawn_mock_backend().await;
    let session = SyncSession::start(test_config(&backend)).unwrap();

    wait_for_view(session.store(), |v| {
        v.connection == ConnectionState::Connected && v.has_ever_synced
    })
    .await;
    // The mock handler subscribes to the frame channel during its
    // setup; the client can report connected slightly before that.
    while backend.frames.receiver_count() == 0 {
        tokio::time::sleep(Duration::from_millis(5)).await;
    }

    // Advance the world and broadcast the new state over the socket.
    {
        let mut world = backend.world.lock().await;
        world.day = 99;
    }
    let frame = json!({
        "type": "simulation_update",
        "data": {"simulation": {"day": 99, "isRunning": true}}
    })
    .to_string();
    backend.frames.send(frame).unwrap();

    let view = wait_for_view(session.store(), |v| v.snapshot.day == 99).await;
    assert!(view.snapshot.is_running);

    session.shutdown().await;
}

#[tokio::test]
async fn test_dispatch_confirms_and_applies_optimism() {
    let backend = spawn_mock_backend().await;
    let store = WorldStore::new();
    let rest = Arc::new(RestClient::new(&backend.rest_url).unwrap());
    let clock = FreshnessClock::new();

    // Seed the authoritative snapshot the overlay composes over.
    let snapshot = rest.fetch_snapshot().await.unwrap();
    store.apply_snapshot(snapshot, clock.next()).await;
    assert!(store.view().await.snapshot.is_running);

    let dispatcher = Arc::new(CommandDispatcher::new(Arc::clone(&rest), store.clone()));
    let mut outcomes = dispatcher.subscribe_outcomes();

    let id = dispatcher.dispatch(ControlAction::Pause).await;
    // Optimism is visible before the backend answers.
    assert!(!store.view().await.snapshot.is_running);

    let outcome = outcomes.recv().await.unwrap();
    assert_eq!(outcome.id, id);
    assert_eq!(outcome.state, CommandState::Confirmed);

    // The confirmed overlay holds until authority catches up.
    assert!(!store.view().await.snapshot.is_running);
    let snapshot = rest.fetch_snapshot().await.unwrap();
    assert!(!snapshot.is_running, "mock world actually paused");
    store.apply_snapshot(snapshot, clock.next()).await;
    assert!(!store.view().await.snapshot.is_running);
}

#[tokio::test]
async fn test_rejected_dispatch_rolls_back_optimism() {
    let backend = spawn_mock_backend().await;
    let store = WorldStore::new();
    let rest = Arc::new(RestClient::new(&backend.rest_url).unwrap());
    let clock = FreshnessClock::new();

    let snapshot = rest.fetch_snapshot().await.unwrap();
    store.apply_snapshot(snapshot, clock.next()).await;

    backend.world.lock().await.reject_controls = true;

    let dispatcher = Arc::new(CommandDispatcher::new(rest, store.clone()));
    let mut outcomes = dispatcher.subscribe_outcomes();

    dispatcher.dispatch(ControlAction::Pause).await;
    assert!(!store.view().await.snapshot.is_running, "optimism first");

    let outcome = outcomes.recv().await.unwrap();
    let CommandState::Failed { reason } = outcome.state else {
        panic!("expected a failed outcome");
    };
    assert!(reason.contains("maintenance"));

    // Rollback restored the authoritative running state.
    assert!(store.view().await.snapshot.is_running);
}

#[tokio::test]
async fn test_degraded_when_push_is_unreachable() {
    let backend = spawn_mock_backend().await;
    let mut config = test_config(&backend);
    // REST stays live; the socket points at a port nothing listens on.
    config.ws_url = String::from("ws://127.0.0.1:9/ws");

    let session = SyncSession::start(config).unwrap();
    let view = wait_for_view(session.store(), |v| {
        v.has_ever_synced && v.connection == ConnectionState::Degraded
    })
    .await;
    assert!(view.snapshot.day > 0, "pull path still delivers data");

    session.shutdown().await;
}

#[tokio::test]
async fn test_push_only_backend_still_connects() {
    let backend = spawn_mock_backend().await;
    let mut config = test_config(&backend);
    // Poll lanes point at a dead port; only the socket is real.
    config.rest_url = String::from("http://127.0.0.1:9/api");

    let session = SyncSession::start(config).unwrap();
    let view = wait_for_view(session.store(), |v| {
        v.connection == ConnectionState::Connected && v.has_ever_synced
    })
    .await;
    assert_eq!(view.snapshot.day, 7, "update arrived over the socket");

    session.shutdown().await;
}
