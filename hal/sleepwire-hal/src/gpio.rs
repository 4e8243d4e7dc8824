//! GPIO line abstractions
//!
//! The serial drivers only need a handful of operations on a
//! software-driven line: drive it, read it back, toggle it. Port and pin
//! function setup happens elsewhere, before the line is handed over.

use core::convert::Infallible;

use embedded_hal::digital as eh;

/// Digital output line
///
/// Implementations handle the actual register manipulation for the chip.
pub trait OutputPin {
    /// Drive the line high (logic 1)
    fn set_high(&mut self);

    /// Drive the line low (logic 0)
    fn set_low(&mut self);

    /// Toggle the line
    fn toggle(&mut self) {
        if self.is_set_high() {
            self.set_low();
        } else {
            self.set_high();
        }
    }

    /// Drive the line to a specific level
    fn set_state(&mut self, high: bool) {
        if high {
            self.set_high();
        } else {
            self.set_low();
        }
    }

    /// Check if the line is currently driven high
    fn is_set_high(&self) -> bool;

    /// Check if the line is currently driven low
    fn is_set_low(&self) -> bool {
        !self.is_set_high()
    }
}

/// Digital input line
///
/// Takes `&mut self` to match embedded-hal 1.0 inputs, where sampling a pin
/// may touch driver state.
pub trait InputPin {
    /// Check if the line reads high (logic 1)
    fn is_high(&mut self) -> bool;

    /// Check if the line reads low (logic 0)
    fn is_low(&mut self) -> bool {
        !self.is_high()
    }
}

/// Adapter for infallible embedded-hal 1.0 pins
///
/// Chip HALs built on `embedded-hal` hand out pins whose error type is
/// [`Infallible`]; wrapping one in `EhPin` lets it drive a software UART.
/// The driven level is tracked locally so [`OutputPin::is_set_high`] does
/// not need a stateful pin.
pub struct EhPin<P> {
    pin: P,
    high: bool,
}

impl<P> EhPin<P> {
    /// Wrap a pin, assuming it currently drives low
    pub fn new(pin: P) -> Self {
        Self { pin, high: false }
    }

    /// Release the wrapped pin
    pub fn into_inner(self) -> P {
        self.pin
    }
}

impl<P> OutputPin for EhPin<P>
where
    P: eh::OutputPin + eh::ErrorType<Error = Infallible>,
{
    fn set_high(&mut self) {
        match self.pin.set_high() {
            Ok(()) => self.high = true,
            Err(never) => match never {},
        }
    }

    fn set_low(&mut self) {
        match self.pin.set_low() {
            Ok(()) => self.high = false,
            Err(never) => match never {},
        }
    }

    fn is_set_high(&self) -> bool {
        self.high
    }
}

impl<P> InputPin for EhPin<P>
where
    P: eh::InputPin + eh::ErrorType<Error = Infallible>,
{
    fn is_high(&mut self) -> bool {
        match self.pin.is_high() {
            Ok(level) => level,
            Err(never) => match never {},
        }
    }
}
