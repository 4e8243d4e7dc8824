//! Countdown timeout driven by a periodic tick
//!
//! A tick interrupt (typically the watchdog in interval mode) calls
//! [`Countdown::count_down`]; blocking calls poll the countdown through
//! [`TimeoutGuard`].

use portable_atomic::{AtomicBool, AtomicU16, Ordering};
use sleepwire_hal::TimeoutGuard;

use crate::idle::Idle;

/// One-shot tick countdown
///
/// Disarmed until [`start`](Self::start) is called. Once it reaches zero it
/// stays triggered until armed again.
#[derive(Debug)]
pub struct Countdown {
    remaining: AtomicU16,
    armed: AtomicBool,
}

impl Default for Countdown {
    fn default() -> Self {
        Self::new()
    }
}

impl Countdown {
    pub const fn new() -> Self {
        Self {
            remaining: AtomicU16::new(0),
            armed: AtomicBool::new(false),
        }
    }

    /// Arm for `ticks` ticks
    ///
    /// Zero ticks triggers immediately.
    pub fn start(&self, ticks: u16) -> &Self {
        self.remaining.store(ticks, Ordering::Release);
        self.armed.store(true, Ordering::Release);
        self
    }

    /// Disarm without triggering
    pub fn cancel(&self) {
        self.armed.store(false, Ordering::Release);
    }

    /// Ticks left before the countdown triggers
    pub fn remaining(&self) -> u16 {
        self.remaining.load(Ordering::Acquire)
    }

    /// Advance by one tick
    ///
    /// Returns `true` on the tick that makes the countdown expire; the tick
    /// handler should turn that into a wake request.
    pub fn count_down(&self) -> bool {
        if !self.armed.load(Ordering::Acquire) {
            return false;
        }
        let previous = self
            .remaining
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |n| n.checked_sub(1));
        matches!(previous, Ok(1))
    }

    /// Arm for `ticks` and sleep until it expires
    pub fn set_and_wait<I: Idle>(&self, ticks: u16, idle: &mut I) {
        self.start(ticks);
        idle.idle_while(|| !self.triggered());
    }
}

impl TimeoutGuard for Countdown {
    fn triggered(&self) -> bool {
        self.armed.load(Ordering::Acquire) && self.remaining.load(Ordering::Acquire) == 0
    }
}
