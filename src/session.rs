//! Session controller: startup sequencing, the position poll loop and
//! pointer-driven route requests.
//!
//! Startup is strictly ordered: the window reports that the background
//! image has settled (loaded or not), the beacons are fetched once, and only
//! then does the poll timer start. Pointer clicks are handled on their own
//! task and never hold up a poll tick.

use std::sync::Arc;
use std::time::Duration;

use indoor_map_geometry::{PixelPoint, Point, ViewTransform};
use tokio::sync::broadcast::{self, error::RecvError};
use tokio::time::{self, Instant, MissedTickBehavior};
use tracing::{debug, error, info, warn};

use crate::blackboard::{
    Blackboard, Frame, SessionPhase, frame, raise_alert, set_beacons, set_position, set_route,
    snapshot,
};
use crate::bus::Topic;
use crate::client::Backend;

pub const BEACONS_UNAVAILABLE: &str =
    "Could not load beacon data. Make sure the backend is running.";

/// Outcome of loading the floor-plan image. Either way startup continues.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BackgroundStatus {
    Loaded,
    Unavailable,
}

pub struct SessionController<B> {
    backend: B,
    board: Blackboard,
    view: ViewTransform,
    frames: Topic<Frame>,
    poll_interval: Duration,
}

impl<B: Backend> SessionController<B> {
    pub fn new(
        backend: B,
        board: Blackboard,
        view: ViewTransform,
        frames: Topic<Frame>,
        poll_interval: Duration,
    ) -> Self {
        Self {
            backend,
            board,
            view,
            frames,
            poll_interval,
        }
    }

    /// Runs the one-shot beacon fetch.
    ///
    /// Precondition: phase is `Loading`; calls in any other phase are ignored.
    /// Postcondition: `Running` with the fetched beacons, or `Degraded` with
    /// no beacons and a single alert raised.
    pub async fn on_background_settled(&self, background: BackgroundStatus) -> SessionPhase {
        let phase = snapshot(&self.board).phase;
        if phase != SessionPhase::Loading {
            warn!(?phase, "Background settled twice, ignoring.");
            return phase;
        }

        info!(?background, "Background settled, fetching beacons.");
        let settled = match self.backend.fetch_beacons().await {
            Ok(beacons) => {
                info!(count = beacons.len(), "Beacons loaded.");
                set_beacons(&self.board, beacons, SessionPhase::Running)
            }
            Err(e) => {
                error!(error = %e, kind = e.kind(), "Failed to load beacons, continuing without them.");
                let first = set_beacons(&self.board, Vec::new(), SessionPhase::Degraded);
                if first {
                    raise_alert(&self.board, BEACONS_UNAVAILABLE);
                }
                first
            }
        };
        // A concurrent settle may have won while this fetch was in flight.
        let phase = snapshot(&self.board).phase;
        if !settled {
            warn!(?phase, "Beacons already settled, discarding this fetch.");
        }
        self.present();
        phase
    }

    /// One poll cycle: fetch the position, then hand a fresh frame to the renderer.
    /// A failed fetch keeps the previous position.
    pub async fn on_tick(&self) {
        match self.backend.fetch_position().await {
            Ok(position) if position.is_finite() => {
                debug!(x = position.x, y = position.y, "Position updated.");
                set_position(&self.board, position);
            }
            Ok(position) => {
                warn!(%position, "Backend sent a non-finite position, keeping the previous one.");
            }
            Err(e) => {
                warn!(error = %e, kind = e.kind(), "Failed to fetch position.");
            }
        }
        self.present();
    }

    /// Requests a route to the world point under `pixel`.
    /// A failed request keeps the previous route.
    pub async fn on_pointer(&self, pixel: PixelPoint) {
        let destination = self.destination_for(pixel);
        info!(%pixel, x = destination.x, y = destination.y, "Route requested.");
        match self.backend.request_route(destination).await {
            Ok(route) => {
                debug!(points = route.len(), "Route received.");
                set_route(&self.board, route);
            }
            Err(e) => {
                warn!(error = %e, kind = e.kind(), "Failed to fetch route.");
            }
        }
    }

    /// World point under a surface pixel.
    pub fn destination_for(&self, pixel: PixelPoint) -> Point {
        self.view.to_world(pixel)
    }

    fn present(&self) {
        self.frames.publish(frame(&self.board));
    }

    /// Startup sequence followed by the poll and pointer tasks. Only returns
    /// on error; the pointer task ends quietly once the window is gone.
    pub async fn run(
        self: Arc<Self>,
        background: BackgroundStatus,
        pointer_rx: broadcast::Receiver<Arc<PixelPoint>>,
    ) -> anyhow::Result<()> {
        self.on_background_settled(background).await;
        info!(interval = ?self.poll_interval, "Session running.");
        tokio::try_join!(
            Arc::clone(&self).poll_task(),
            Arc::clone(&self).pointer_task(pointer_rx),
        )?;
        Ok(())
    }

    // Ticks never overlap: each one awaits its fetch, and ticks missed while
    // waiting are skipped rather than bunched up.
    async fn poll_task(self: Arc<Self>) -> anyhow::Result<()> {
        let mut ticker = time::interval_at(Instant::now() + self.poll_interval, self.poll_interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Skip);
        loop {
            ticker.tick().await;
            self.on_tick().await;
        }
    }

    async fn pointer_task(
        self: Arc<Self>,
        mut pointer_rx: broadcast::Receiver<Arc<PixelPoint>>,
    ) -> anyhow::Result<()> {
        loop {
            match pointer_rx.recv().await {
                Ok(pixel) => {
                    // Fire and forget; the last response to land wins.
                    let controller = Arc::clone(&self);
                    tokio::spawn(async move { controller.on_pointer(*pixel).await });
                }
                Err(RecvError::Lagged(skipped)) => {
                    warn!(skipped, "Pointer receiver lagged.");
                }
                Err(RecvError::Closed) => {
                    info!("Pointer channel closed.");
                    return Ok(());
                }
            }
        }
    }
}
