//! Free-running counter abstraction
//!
//! The software UART measures bit periods against a timer that counts up
//! continuously and wraps at 16 bits (a Timer_A in continuous mode, for
//! example).

/// Free-running 16-bit counter
pub trait FreeRunningCounter {
    /// Tick rate in Hz
    fn frequency(&self) -> u32;

    /// Current counter value
    ///
    /// Wraps from `u16::MAX` to zero; callers compare values with
    /// `wrapping_sub`.
    fn counter(&self) -> u16;
}

impl<T: FreeRunningCounter + ?Sized> FreeRunningCounter for &T {
    fn frequency(&self) -> u32 {
        (**self).frequency()
    }

    fn counter(&self) -> u16 {
        (**self).counter()
    }
}
