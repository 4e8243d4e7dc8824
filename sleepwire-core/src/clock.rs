//! Clock domain with hold counting
//!
//! Drivers claim the clock feeding their peripheral for as long as they
//! need it. The domain counts holders; power management may only stop the
//! clock while the count is zero.

use portable_atomic::{AtomicU8, Ordering};
use sleepwire_hal::{ClockSource, ClockType};

/// A clock signal shared by several peripherals
#[derive(Debug)]
pub struct ClockDomain {
    frequency: u32,
    clock_type: ClockType,
    holds: AtomicU8,
}

impl ClockDomain {
    pub const fn new(clock_type: ClockType, frequency: u32) -> Self {
        Self {
            frequency,
            clock_type,
            holds: AtomicU8::new(0),
        }
    }

    /// Number of outstanding claims
    pub fn claims(&self) -> u8 {
        self.holds.load(Ordering::Acquire)
    }

    /// Whether anyone currently needs this clock running
    pub fn is_active(&self) -> bool {
        self.claims() > 0
    }
}

impl ClockSource for ClockDomain {
    fn frequency(&self) -> u32 {
        self.frequency
    }

    fn clock_type(&self) -> ClockType {
        self.clock_type
    }

    fn claim(&self) {
        // Saturate instead of wrapping back to "unused"
        let _ = self
            .holds
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |n| n.checked_add(1));
    }

    fn release(&self) {
        let _ = self
            .holds
            .fetch_update(Ordering::AcqRel, Ordering::Acquire, |n| n.checked_sub(1));
    }
}
