//! Wall-clock source for time-derived secrets.
//!
//! The daily GM password depends on the local weekday and hour. Reading
//! time through a trait lets tests pin "Tuesday 14:59" and "Tuesday 15:00"
//! instead of waiting for them.

use std::sync::{Arc, RwLock};

use chrono::{Local, NaiveDateTime};

/// A source of local wall-clock time.
pub trait Clock: Send + Sync + 'static {
    /// The current local date and time.
    fn now(&self) -> NaiveDateTime;
}

/// The process's real local clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> NaiveDateTime {
        Local::now().naive_local()
    }
}

/// A clock that only moves when told to.
#[derive(Debug)]
pub struct FixedClock {
    now: RwLock<NaiveDateTime>,
}

impl FixedClock {
    pub fn new(now: NaiveDateTime) -> Self {
        Self {
            now: RwLock::new(now),
        }
    }

    /// Moves the clock to `now`.
    pub fn set(&self, now: NaiveDateTime) {
        // A poisoned lock still holds a valid timestamp.
        let mut guard = self.now.write().unwrap_or_else(|p| p.into_inner());
        *guard = now;
    }

    /// Moves the clock forward (or backward, for a negative delta).
    pub fn advance(&self, by: chrono::TimeDelta) {
        let mut guard = self.now.write().unwrap_or_else(|p| p.into_inner());
        *guard += by;
    }
}

impl Clock for FixedClock {
    fn now(&self) -> NaiveDateTime {
        *self.now.read().unwrap_or_else(|p| p.into_inner())
    }
}

/// Lets a test keep a handle on the clock it gave away.
impl<C: Clock> Clock for Arc<C> {
    fn now(&self) -> NaiveDateTime {
        (**self).now()
    }
}
