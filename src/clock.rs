//! Injected time source.

use crate::domain::TimeMs;
use std::fmt;
use std::sync::atomic::{AtomicI64, Ordering};
use std::sync::Arc;

pub trait Clock: Send + Sync + fmt::Debug {
    fn now(&self) -> TimeMs;
}

/// Wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> TimeMs {
        TimeMs::now()
    }
}

/// Manually driven clock for deterministic accrual in tests and demos.
///
/// Clones share the same underlying instant.
#[derive(Debug, Clone)]
pub struct ManualClock {
    now_ms: Arc<AtomicI64>,
}

impl ManualClock {
    pub fn new(start: TimeMs) -> Self {
        Self {
            now_ms: Arc::new(AtomicI64::new(start.as_ms())),
        }
    }

    pub fn set(&self, at: TimeMs) {
        self.now_ms.store(at.as_ms(), Ordering::SeqCst);
    }

    pub fn advance_ms(&self, ms: i64) {
        self.now_ms.fetch_add(ms, Ordering::SeqCst);
    }

    pub fn advance_days(&self, days: i64) {
        self.advance_ms(days * crate::domain::MS_PER_DAY);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> TimeMs {
        TimeMs::new(self.now_ms.load(Ordering::SeqCst))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_manual_clock_clones_share_time() {
        let clock = ManualClock::new(TimeMs::new(1_000));
        let other = clock.clone();
        clock.advance_days(1);
        assert_eq!(other.now(), TimeMs::new(1_000 + crate::domain::MS_PER_DAY));
        other.set(TimeMs::new(5));
        assert_eq!(clock.now(), TimeMs::new(5));
    }
}
