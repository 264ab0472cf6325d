//! Time abstraction so exports can be tested with a fixed clock.

use chrono::{DateTime, Utc};

// ==================== Clock Trait ====================

/// Source of the current time.
pub trait Clock: Send + Sync {
    /// Get the current time in UTC.
    fn now_utc(&self) -> DateTime<Utc>;
}

/// Wall clock.
#[derive(Debug, Clone, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now_utc(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// Clock fixed at the time it was created with.
#[derive(Debug, Clone, Copy)]
pub struct MockClock {
    utc_time: DateTime<Utc>,
}

impl MockClock {
    pub fn new(time: DateTime<Utc>) -> Self {
        Self { utc_time: time }
    }
}

impl Clock for MockClock {
    fn now_utc(&self) -> DateTime<Utc> {
        self.utc_time
    }
}
