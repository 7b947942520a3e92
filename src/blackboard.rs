use parking_lot::RwLock;
use std::sync::Arc;

use indoor_map_geometry::{Beacon, Point};

/// Where the session is in its startup sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SessionPhase {
    /// Waiting for the background image to settle and the beacons to arrive.
    #[default]
    Loading,
    /// Beacons loaded; polling.
    Running,
    /// Beacon fetch failed; polling with an empty beacon set.
    Degraded,
}

#[derive(Clone, Debug, Default)]
pub struct State {
    pub phase: SessionPhase,
    pub beacons: Arc<[Beacon]>,
    pub user_position: Point,
    pub route: Arc<[Point]>,
    /// Blocking user-facing message, shown until dismissed.
    pub alert: Option<String>,
}

/// Everything the renderer needs for one redraw.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Frame {
    pub beacons: Arc<[Beacon]>,
    pub user_position: Point,
    pub route: Arc<[Point]>,
}

impl From<&State> for Frame {
    fn from(state: &State) -> Self {
        Frame {
            beacons: Arc::clone(&state.beacons),
            user_position: state.user_position,
            route: Arc::clone(&state.route),
        }
    }
}

pub type Blackboard = Arc<RwLock<State>>;

pub fn snapshot(bb: &Blackboard) -> State {
    (*bb.read()).clone()
}

pub fn frame(bb: &Blackboard) -> Frame {
    Frame::from(&*bb.read())
}

/// Beacons are set at most once per session; later calls are refused.
pub fn set_beacons(bb: &Blackboard, beacons: Vec<Beacon>, phase: SessionPhase) -> bool {
    let mut g = bb.write();
    if g.phase != SessionPhase::Loading {
        return false;
    }
    g.beacons = Arc::from(beacons);
    g.phase = phase;
    true
}

pub fn set_position(bb: &Blackboard, position: Point) {
    bb.write().user_position = position;
}

pub fn set_route(bb: &Blackboard, route: Vec<Point>) {
    bb.write().route = Arc::from(route);
}

pub fn raise_alert(bb: &Blackboard, msg: &str) {
    let mut g = bb.write();
    if g.alert.is_none() {
        g.alert = Some(msg.to_string());
    }
}

pub fn dismiss_alert(bb: &Blackboard) -> Option<String> {
    bb.write().alert.take()
}
