//! Clock source abstractions
//!
//! A serial peripheral is clocked from one of the chip's clock domains.
//! Drivers read the domain's frequency to derive bit timing and hold a
//! claim on it while bytes are moving so a low-power mode cannot stop the
//! clock underneath a transfer.

/// Clock domain tag
///
/// The USCI clock-select field only distinguishes the auxiliary clock from
/// the sub-main clock; the tag decides which tap a driver programs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ClockType {
    /// Auxiliary clock (usually a 32 kHz crystal or the VLO)
    Aclk,
    /// Sub-main clock (usually the DCO)
    Smclk,
    /// Main CPU clock
    Mclk,
}

/// Clock source with claim/release arbitration
///
/// `claim` and `release` must always be paired. Use [`ClockClaim`] rather
/// than calling them directly so early returns cannot leak a hold.
pub trait ClockSource {
    /// Frequency in Hz
    fn frequency(&self) -> u32;

    /// Which clock domain this is
    fn clock_type(&self) -> ClockType;

    /// Keep the domain running until the matching `release`
    fn claim(&self);

    /// Drop one hold taken by `claim`
    fn release(&self);
}

impl<T: ClockSource + ?Sized> ClockSource for &T {
    fn frequency(&self) -> u32 {
        (**self).frequency()
    }

    fn clock_type(&self) -> ClockType {
        (**self).clock_type()
    }

    fn claim(&self) {
        (**self).claim()
    }

    fn release(&self) {
        (**self).release()
    }
}

/// Scoped clock hold
///
/// Claims the clock on creation and releases it when dropped, including
/// when a transfer is abandoned by timeout.
#[must_use = "the clock is released as soon as the claim is dropped"]
pub struct ClockClaim<'a, C: ClockSource + ?Sized> {
    clock: &'a C,
}

impl<'a, C: ClockSource + ?Sized> ClockClaim<'a, C> {
    /// Claim `clock` for the lifetime of the returned guard
    pub fn new(clock: &'a C) -> Self {
        clock.claim();
        Self { clock }
    }
}

impl<C: ClockSource + ?Sized> Drop for ClockClaim<'_, C> {
    fn drop(&mut self) {
        self.clock.release();
    }
}
