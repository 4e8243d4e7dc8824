//! CPU sleep and wake
//!
//! Every blocking driver call parks the CPU through [`Idle::idle_while`].
//! Interrupt handlers request a wake with [`WakeSignal::request`]; the idle
//! implementation consumes it and re-evaluates its predicate.

use portable_atomic::{AtomicBool, Ordering};

/// Pending wake request
///
/// Set from interrupt context, consumed by the sleeping foreground. Each
/// request resumes the sleeper once.
#[derive(Debug)]
pub struct WakeSignal {
    pending: AtomicBool,
}

impl Default for WakeSignal {
    fn default() -> Self {
        Self::new()
    }
}

impl WakeSignal {
    pub const fn new() -> Self {
        Self {
            pending: AtomicBool::new(false),
        }
    }

    /// Ask the sleeping foreground to resume
    pub fn request(&self) {
        self.pending.store(true, Ordering::Release);
    }

    /// Consume a pending request
    pub fn take(&self) -> bool {
        self.pending.swap(false, Ordering::AcqRel)
    }

    /// Check without consuming
    pub fn is_pending(&self) -> bool {
        self.pending.load(Ordering::Acquire)
    }
}

/// Blocking wait primitive
pub trait Idle {
    /// Sleep until `keep_sleeping` returns `false`
    ///
    /// The predicate is re-checked after every wake. It reads state that
    /// interrupt handlers update, so it must lock that state itself.
    fn idle_while<F: FnMut() -> bool>(&mut self, keep_sleeping: F);
}

impl<T: Idle + ?Sized> Idle for &mut T {
    fn idle_while<F: FnMut() -> bool>(&mut self, keep_sleeping: F) {
        (**self).idle_while(keep_sleeping)
    }
}

/// Busy-wait, never sleeping
#[derive(Debug, Default, Clone, Copy)]
pub struct SpinIdle;

impl Idle for SpinIdle {
    fn idle_while<F: FnMut() -> bool>(&mut self, mut keep_sleeping: F) {
        while keep_sleeping() {
            core::hint::spin_loop();
        }
    }
}

/// Sleep with `wfi` between interrupts
///
/// The predicate is checked with interrupts masked. `wfi` still wakes on a
/// pending interrupt while masked, and the handler runs as soon as the mask
/// is lifted, so a wake raised between the check and the sleep is not lost.
#[cfg(feature = "cortex-m")]
#[derive(Debug, Clone, Copy)]
pub struct WfiIdle<'a> {
    wake: &'a WakeSignal,
}

#[cfg(feature = "cortex-m")]
impl<'a> WfiIdle<'a> {
    pub const fn new(wake: &'a WakeSignal) -> Self {
        Self { wake }
    }
}

#[cfg(feature = "cortex-m")]
impl Idle for WfiIdle<'_> {
    fn idle_while<F: FnMut() -> bool>(&mut self, mut keep_sleeping: F) {
        loop {
            let done = cortex_m::interrupt::free(|_| {
                if !keep_sleeping() {
                    return true;
                }
                if !self.wake.take() {
                    cortex_m::asm::wfi();
                }
                false
            });
            if done {
                // Drop a request that raced the final check
                self.wake.take();
                return;
            }
        }
    }
}
