use portable_atomic::{AtomicBool, Ordering};
use waypoint_nmea::GeoFix;

use crate::store::FixStore;
use crate::watchdog::Reachability;

/// Everything the tasks share. Lives in a `static` and is handed out by
/// reference.
pub struct WaypointState {
    pub fixes: FixStore,
    pub backend: Reachability,
    connected: AtomicBool,
}

impl Default for WaypointState {
    fn default() -> Self {
        Self::new()
    }
}

impl WaypointState {
    pub const fn new() -> Self {
        Self {
            fixes: FixStore::new(),
            backend: Reachability::new(),
            connected: AtomicBool::new(false),
        }
    }

    /// Latest known position. Never blocks for more than the store's read
    /// bound.
    pub async fn get_current_fix(&self) -> GeoFix {
        self.fixes.current().await
    }

    pub fn is_reachable(&self) -> bool {
        self.backend.is_reachable()
    }

    /// A phone is connected to the GPS service.
    pub fn is_connected(&self) -> bool {
        self.connected.load(Ordering::Acquire)
    }

    pub(crate) fn set_connected(&self, connected: bool) {
        self.connected.store(connected, Ordering::Release);
    }
}
