//! Process-wide "work in progress" indicator.
//!
//! The batch run raises it while it works; the fault sink clears it whenever a
//! fault is recorded so nothing is left looking busy after a failure.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, OnceLock};

static GLOBAL_BUSY: OnceLock<BusyIndicator> = OnceLock::new();

/// Shared busy flag. Clones observe the same flag.
#[derive(Debug, Clone, Default)]
pub struct BusyIndicator {
    flag: Arc<AtomicBool>,
}

impl BusyIndicator {
    /// A fresh, unshared indicator (tests, embedded use).
    pub fn new() -> Self {
        Self::default()
    }

    /// The process-wide indicator.
    pub fn global() -> BusyIndicator {
        GLOBAL_BUSY.get_or_init(BusyIndicator::default).clone()
    }

    pub fn is_busy(&self) -> bool {
        self.flag.load(Ordering::SeqCst)
    }

    pub fn set_busy(&self) {
        self.flag.store(true, Ordering::SeqCst);
    }

    pub fn clear(&self) {
        self.flag.store(false, Ordering::SeqCst);
    }

    /// Raise the flag until the returned guard drops.
    pub fn begin(&self) -> BusyGuard {
        self.set_busy();
        BusyGuard {
            indicator: self.clone(),
        }
    }
}

/// Clears the busy flag on drop, on every exit path.
#[derive(Debug)]
pub struct BusyGuard {
    indicator: BusyIndicator,
}

impl Drop for BusyGuard {
    fn drop(&mut self) {
        self.indicator.clear();
    }
}
