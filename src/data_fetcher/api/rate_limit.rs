//! Process-wide cooldown after rate limiting
//!
//! A 429 from any worker arms the cooldown; every fetch attempt checks it
//! before sending and waits out the remainder.

use std::sync::{Arc, Mutex, PoisonError};
use std::time::{Duration, Instant};

/// Upper bound on a cooldown when the configured one cannot be represented.
const MAX_HOLD: Duration = Duration::from_secs(crate::constants::retry::MAX_DELAY_SECONDS);

/// Shared signal that holds back new attempts after a 429.
#[derive(Debug, Clone)]
pub struct Cooldown {
    duration: Duration,
    until: Arc<Mutex<Option<Instant>>>,
}

impl Cooldown {
    pub fn new(duration: Duration) -> Self {
        Self {
            duration,
            until: Arc::new(Mutex::new(None)),
        }
    }

    pub fn duration(&self) -> Duration {
        self.duration
    }

    /// Arms the cooldown from `now`. An already later deadline is kept.
    /// A duration past the clock's range holds until `now + MAX_HOLD`.
    pub fn trigger(&self, now: Instant) -> Instant {
        let mut until = self.until.lock().unwrap_or_else(PoisonError::into_inner);
        let candidate = now
            .checked_add(self.duration)
            .or_else(|| now.checked_add(MAX_HOLD))
            .unwrap_or(now);
        let deadline = match *until {
            Some(existing) if existing > candidate => existing,
            _ => candidate,
        };
        *until = Some(deadline);
        deadline
    }

    /// Time left before attempts may proceed. Clears the signal once passed.
    pub fn remaining(&self, now: Instant) -> Option<Duration> {
        let mut until = self.until.lock().unwrap_or_else(PoisonError::into_inner);
        match *until {
            Some(deadline) if deadline > now => Some(deadline - now),
            Some(_) => {
                *until = None;
                None
            }
            None => None,
        }
    }
}
