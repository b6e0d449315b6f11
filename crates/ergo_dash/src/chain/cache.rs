//! Single-slot, time-windowed cache for the ERG/USD price.

use std::time::Duration;
use tokio::sync::{Mutex, MutexGuard};
use tokio::time::Instant;

/// Default freshness window: five minutes.
pub const PRICE_WINDOW: Duration = Duration::from_secs(300);

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PriceSnapshot {
    pub price: f64,
    /// Monotonic; wall-clock jumps do not move it.
    pub captured_at: Instant,
}

impl PriceSnapshot {
    /// True when the snapshot is older than `window` at `now`.
    pub fn is_stale(&self, now: Instant, window: Duration) -> bool {
        now.saturating_duration_since(self.captured_at) > window
    }
}

/// Holds the last good price. Callers lock the slot for the whole
/// check-refresh-store sequence so concurrent requests see one refresh.
pub struct PriceCache {
    window: Duration,
    slot: Mutex<Option<PriceSnapshot>>,
}

impl PriceCache {
    pub fn new(window: Duration) -> Self {
        Self {
            window,
            slot: Mutex::new(None),
        }
    }

    pub fn window(&self) -> Duration {
        self.window
    }

    /// Lock the slot. The guard must be held until any refresh is stored.
    pub async fn lock(&self) -> MutexGuard<'_, Option<PriceSnapshot>> {
        self.slot.lock().await
    }

    /// Copy of the current snapshot, fresh or not.
    pub async fn snapshot(&self) -> Option<PriceSnapshot> {
        *self.slot.lock().await
    }
}

impl Default for PriceCache {
    fn default() -> Self {
        Self::new(PRICE_WINDOW)
    }
}
