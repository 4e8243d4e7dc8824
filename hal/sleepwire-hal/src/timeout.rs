//! Bounded waits
//!
//! Every blocking driver call takes a guard. The call gives up as soon as
//! the guard reports it has triggered.

/// One-shot expiry predicate
///
/// Driven by an external periodic tick; once `triggered` returns `true` it
/// keeps doing so until the guard is re-armed.
pub trait TimeoutGuard {
    /// Has the bound expired?
    fn triggered(&self) -> bool;
}

impl<T: TimeoutGuard + ?Sized> TimeoutGuard for &T {
    fn triggered(&self) -> bool {
        (**self).triggered()
    }
}

/// Guard that never expires
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Never;

impl TimeoutGuard for Never {
    fn triggered(&self) -> bool {
        false
    }
}
