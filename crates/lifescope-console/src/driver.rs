//! Render loop driver: samples the store, projects frames, feeds a sink.
//!
//! The loop ticks on a fixed interval. Per tick it reads the current
//! world view, reprojects the scene base only when the store revision
//! has moved, animates the base into a frame, and hands the frame to a
//! [`FrameSink`]. Between revisions only the time-driven animation
//! changes, so the per-revision projection work is reused.

use std::time::{Duration, Instant};

use lifescope_scene::{FrameBase, Projector, SceneFrame};
use lifescope_sync::WorldStore;
use tokio::sync::watch;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

/// Error a [`FrameSink`] can surface for one frame.
///
/// The render loop logs these and keeps going.
#[derive(Debug, thiserror::Error)]
#[error("{message}")]
pub struct SinkError {
    message: String,
}

impl SinkError {
    /// Build a sink error from a displayable message.
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Receives composed frames from the render loop.
///
/// Implementations present the scene: log it, hand it to a renderer,
/// record it. A returned error is logged by the loop and otherwise
/// ignored; the loop never halts on a sink failure.
pub trait FrameSink: Send {
    /// Called once per composed frame.
    fn on_frame(&mut self, frame: &SceneFrame) -> Result<(), SinkError>;
}

/// Logs a one-line scene summary at a fixed cadence.
///
/// The full frame stream is far too chatty for a log; this sink keeps
/// a heartbeat visible without drowning everything else out. The first
/// frame is always logged.
pub struct SummarySink {
    cadence: Duration,
    last_logged: Option<Instant>,
    frames: u64,
}

impl SummarySink {
    /// Create a sink that logs at most once per `cadence`.
    pub const fn new(cadence: Duration) -> Self {
        Self {
            cadence,
            last_logged: None,
            frames: 0,
        }
    }
}

impl FrameSink for SummarySink {
    fn on_frame(&mut self, frame: &SceneFrame) -> Result<(), SinkError> {
        self.frames = self.frames.saturating_add(1);
        if self
            .last_logged
            .is_some_and(|at| at.elapsed() < self.cadence)
        {
            return Ok(());
        }
        self.last_logged = Some(Instant::now());
        info!(
            day = frame.hud.day,
            population = frame.hud.population,
            figures = frame.figures.len(),
            territories = frame.territories.len(),
            feed_lines = frame.feed.len(),
            connection = %frame.hud.connection,
            running = frame.hud.is_running,
            awaiting_first_sync = frame.hud.awaiting_first_sync,
            frames = self.frames,
            "scene summary"
        );
        Ok(())
    }
}

/// Drives frame composition at a fixed cadence.
pub struct RenderLoop {
    store: WorldStore,
    projector: Projector,
    sink: Box<dyn FrameSink>,
    frame_interval: Duration,
    base: Option<FrameBase>,
    started: Instant,
}

impl RenderLoop {
    /// Build a render loop over a store and projector.
    ///
    /// The frame interval is floored at one millisecond.
    pub fn new(
        store: WorldStore,
        projector: Projector,
        sink: Box<dyn FrameSink>,
        frame_interval: Duration,
    ) -> Self {
        Self {
            store,
            projector,
            sink,
            frame_interval: frame_interval.max(Duration::from_millis(1)),
            base: None,
            started: Instant::now(),
        }
    }

    /// Run until the shutdown flag flips or its sender is dropped.
    ///
    /// Missed ticks are skipped, not bunched; a slow frame never causes
    /// a burst of catch-up frames.
    pub async fn run(mut self, mut shutdown: watch::Receiver<bool>) {
        let mut ticker = tokio::time::interval(self.frame_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);

        info!(
            frame_interval_ms = u64::try_from(self.frame_interval.as_millis()).unwrap_or(u64::MAX),
            "render loop started"
        );

        loop {
            tokio::select! {
                _ = ticker.tick() => self.render_frame().await,
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
            }
        }

        debug!("render loop stopped");
    }

    /// Compose and deliver one frame.
    async fn render_frame(&mut self) {
        let view = self.store.view().await;
        if self.base.as_ref().map(FrameBase::revision) != Some(view.revision) {
            self.base = Some(self.projector.project_base(&view));
        }

        let clock_secs = self.started.elapsed().as_secs_f64();
        if let Some(base) = self.base.as_ref() {
            let frame = self.projector.animate(base, clock_secs);
            if let Err(error) = self.sink.on_frame(&frame) {
                warn!(error = %error, "frame sink failed");
            }
        }
    }
}
