use core::cell::Cell;

use embassy_sync::blocking_mutex::{raw::CriticalSectionRawMutex, Mutex as BlockingMutex};
use embassy_sync::mutex::Mutex;
use embassy_sync::signal::Signal;
use embassy_time::{with_timeout, Duration};
use waypoint_nmea::GeoFix;

use crate::consts::FIX_READ_TIMEOUT;

/// The reader gave up waiting for the slot lock.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct StoreTimeout;

/// Single-slot cache for the most recent fix.
///
/// Writers overwrite the slot under the lock. Readers wait at most
/// `read_timeout` for the lock; when that runs out they get the last fix
/// that was completely published instead. A stale fix is acceptable, a stalled
/// navigation loop is not.
pub struct FixStore {
    slot: Mutex<CriticalSectionRawMutex, GeoFix>,
    cached: BlockingMutex<CriticalSectionRawMutex, Cell<GeoFix>>,
    updated: Signal<CriticalSectionRawMutex, ()>,
    read_timeout: Duration,
}

impl Default for FixStore {
    fn default() -> Self {
        Self::new()
    }
}

impl FixStore {
    pub const fn new() -> Self {
        Self::with_read_timeout(FIX_READ_TIMEOUT)
    }

    pub const fn with_read_timeout(read_timeout: Duration) -> Self {
        Self {
            slot: Mutex::new(GeoFix::NONE),
            cached: BlockingMutex::new(Cell::new(GeoFix::NONE)),
            updated: Signal::new(),
            read_timeout,
        }
    }

    pub async fn publish(&self, fix: GeoFix) {
        {
            // scoped so the lock is only held for the copy
            let mut slot = self.slot.lock().await;
            *slot = fix;
        }
        // fully written, so a reader that times out may fall back to it
        self.cached.lock(|cached| cached.set(fix));
        self.updated.signal(());
    }

    pub async fn try_current(&self) -> Result<GeoFix, StoreTimeout> {
        let fix = {
            let slot = with_timeout(self.read_timeout, self.slot.lock())
                .await
                .map_err(|_| StoreTimeout)?;
            *slot
        };
        self.cached.lock(|cached| cached.set(fix));
        Ok(fix)
    }

    /// Latest fix, or the last completely published one if the slot stays locked.
    pub async fn current(&self) -> GeoFix {
        match self.try_current().await {
            Ok(fix) => fix,
            Err(StoreTimeout) => {
                log::warn!("fix store busy, returning cached fix");
                self.cached.lock(|cached| cached.get())
            }
        }
    }

    /// Resolves after the next publish. Meant for a single consumer.
    pub async fn wait_update(&self) {
        self.updated.wait().await
    }
}
