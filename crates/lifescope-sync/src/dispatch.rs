//! Command dispatch: optimistic control with confirmation tracking.
//!
//! Dispatching a command installs its optimistic overlay, records a
//! pending entry, and transmits the POST in a background task; the call
//! returns the correlation id immediately. A command leaves the pending
//! set exactly once, through whichever verdict lands first: the POST
//! reply, a matching broadcast echo from the push socket, or the grace
//! sweeper declaring it unconfirmed. Later verdicts for the same id are
//! logged and ignored.
//!
//! Rollback is ownership-checked: a failing command drops the overlay
//! only while it still owns the overlay slot, so a stale failure can
//! never revert the optimism of a newer command. Commands are never
//! retried on the operator's behalf.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use chrono::{DateTime, Utc};
use lifescope_types::{CommandId, CommandOutcome, CommandState, ControlAction};
use tokio::sync::{Mutex, broadcast, watch};
use tokio::time::{Instant, MissedTickBehavior};
use tracing::{debug, info, warn};

use crate::rest::RestClient;
use crate::store::WorldStore;

/// How long a pending command may wait for any verdict.
const CONFIRMATION_GRACE: Duration = Duration::from_secs(2);

/// Cadence of the expired-command sweep.
const SWEEP_INTERVAL: Duration = Duration::from_millis(500);

/// Capacity of the outcome broadcast channel.
const OUTCOME_CAPACITY: usize = 64;

/// A dispatched command awaiting its verdict.
#[derive(Debug, Clone)]
struct PendingCommand {
    action: ControlAction,
    issued_at: DateTime<Utc>,
    sent: Instant,
}

/// Mutable dispatcher state behind one lock.
#[derive(Debug, Default)]
struct DispatchState {
    pending: BTreeMap<CommandId, PendingCommand>,
    /// Which pending command installed the current overlay, if any.
    overlay_owner: Option<CommandId>,
}

/// Issues control commands and tracks them to resolution.
#[derive(Debug)]
pub struct CommandDispatcher {
    rest: Arc<RestClient>,
    store: WorldStore,
    state: Mutex<DispatchState>,
    outcomes: broadcast::Sender<CommandOutcome>,
}

impl CommandDispatcher {
    /// Create a dispatcher sending through `rest` and composing
    /// optimism into `store`.
    pub fn new(rest: Arc<RestClient>, store: WorldStore) -> Self {
        let (outcomes, _) = broadcast::channel(OUTCOME_CAPACITY);
        Self {
            rest,
            store,
            state: Mutex::new(DispatchState::default()),
            outcomes,
        }
    }

    /// Subscribe to command outcomes.
    pub fn subscribe_outcomes(&self) -> broadcast::Receiver<CommandOutcome> {
        self.outcomes.subscribe()
    }

    /// Number of commands currently awaiting a verdict.
    pub async fn pending_count(&self) -> usize {
        self.state.lock().await.pending.len()
    }

    /// Dispatch a control command.
    ///
    /// Installs the action's optimistic overlay (when it has one) and
    /// returns the correlation id immediately; the POST happens in a
    /// background task. Dispatching an action identical to one already
    /// pending returns the in-flight command's id instead of stacking
    /// a second request.
    pub async fn dispatch(self: &Arc<Self>, action: ControlAction) -> CommandId {
        let mut state = self.state.lock().await;
        if let Some(existing) = state
            .pending
            .iter()
            .find_map(|(id, entry)| (entry.action == action).then_some(*id))
        {
            debug!(action = %action, id = %existing, "identical command already pending");
            return existing;
        }

        let id = CommandId::new();
        if let Some(patch) = action.optimistic_patch() {
            self.store.install_overlay(patch).await;
            state.overlay_owner = Some(id);
        }
        state.pending.insert(
            id,
            PendingCommand {
                action,
                issued_at: Utc::now(),
                sent: Instant::now(),
            },
        );
        drop(state);

        info!(action = %action, id = %id, "command dispatched");
        let dispatcher = Arc::clone(self);
        tokio::spawn(async move {
            dispatcher.transmit(id, action).await;
        });
        id
    }

    /// Send the POST and resolve the command from its reply.
    async fn transmit(&self, id: CommandId, action: ControlAction) {
        match self.rest.send_control(action).await {
            Ok(reply) => {
                debug!(id = %id, status = %reply.status, "command acknowledged");
                self.resolve(id, CommandState::Confirmed).await;
            }
            Err(error) => {
                self.resolve(
                    id,
                    CommandState::Failed {
                        reason: error.to_string(),
                    },
                )
                .await;
            }
        }
    }

    /// Confirm the oldest pending command matching an echoed action
    /// label from the push socket. Unmatched echoes (commands from
    /// other clients, or already-resolved ones) are ignored.
    pub async fn confirm_echo(&self, label: &str) {
        let matched = {
            let state = self.state.lock().await;
            state
                .pending
                .iter()
                .find_map(|(id, entry)| (entry.action.label() == label).then_some(*id))
        };
        if let Some(id) = matched {
            debug!(id = %id, label = label, "confirmed by broadcast echo");
            self.resolve(id, CommandState::Confirmed).await;
        }
    }

    /// Confirm the oldest pending speed change from a `speed_change`
    /// echo. Matched by kind, not value: the backend clamps speeds, so
    /// the echoed value may differ from the requested one.
    pub async fn confirm_speed_echo(&self, speed: f64) {
        let matched = {
            let state = self.state.lock().await;
            state
                .pending
                .iter()
                .find_map(|(id, entry)| {
                    matches!(entry.action, ControlAction::SetSpeed(_)).then_some(*id)
                })
        };
        if let Some(id) = matched {
            debug!(id = %id, speed = speed, "speed change confirmed by echo");
            self.resolve(id, CommandState::Confirmed).await;
        }
    }

    /// Move a pending command to a terminal state.
    ///
    /// The first verdict wins; anything arriving after the pending
    /// entry is gone is logged and dropped. A failure rolls back the
    /// overlay only while this command still owns it.
    async fn resolve(&self, id: CommandId, state: CommandState) {
        let mut guard = self.state.lock().await;
        let Some(pending) = guard.pending.remove(&id) else {
            debug!(id = %id, "verdict for already-resolved command");
            return;
        };

        if matches!(state, CommandState::Failed { .. }) && guard.overlay_owner == Some(id) {
            guard.overlay_owner = None;
            // Rollback happens under the dispatch lock so a concurrent
            // dispatch cannot slip a new overlay in between the
            // ownership check and the clear.
            self.store.clear_overlay().await;
        }
        drop(guard);

        match &state {
            CommandState::Confirmed => {
                info!(id = %id, action = %pending.action, "command confirmed");
            }
            CommandState::Failed { reason } => {
                warn!(id = %id, action = %pending.action, reason = %reason, "command failed");
            }
            CommandState::Pending => {}
        }

        let outcome = CommandOutcome {
            id,
            action: pending.action,
            state,
            issued_at: pending.issued_at,
        };
        let _ = self.outcomes.send(outcome);
    }

    /// Fail every pending command older than the grace period.
    async fn sweep_expired(&self) {
        let expired: Vec<CommandId> = {
            let state = self.state.lock().await;
            state
                .pending
                .iter()
                .filter(|(_, entry)| entry.sent.elapsed() >= CONFIRMATION_GRACE)
                .map(|(id, _)| *id)
                .collect()
        };
        for id in expired {
            self.resolve(
                id,
                CommandState::Failed {
                    reason: String::from("no confirmation within the grace period"),
                },
            )
            .await;
        }
    }

    /// Drive the grace sweeper until shutdown.
    pub(crate) async fn run_sweeper(self: Arc<Self>, mut shutdown: watch::Receiver<bool>) {
        let mut ticker = tokio::time::interval(SWEEP_INTERVAL);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            tokio::select! {
                _ = ticker.tick() => {
                    self.sweep_expired().await;
                }
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
            }
        }
    }
}
