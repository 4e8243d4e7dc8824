//! Shared interrupt vector dispatch
//!
//! Each USCI instance has one transmit vector and one receive vector shared
//! by its A and B blocks. The vector handler calls every driver registered
//! on the pair; each driver checks its own flag bits and reports whether
//! the foreground should wake.
//!
//! Handlers must be `Sync` so a populated table can sit in a `static` that
//! the interrupt entry points reach:
//!
//! ```ignore
//! static USCIAB0: IrqCell<Option<VectorTable<'static, 2>>> = IrqCell::new(None);
//!
//! #[interrupt]
//! fn USCIAB0TX() {
//!     USCIAB0.lock(|table| table.as_ref().map(|t| t.on_vector(Vector::Tx)));
//! }
//! ```

use heapless::Vec;

use crate::idle::WakeSignal;

/// Interrupt half of a serial driver
pub trait SerialInterrupt {
    /// Handle the transmit vector
    ///
    /// Returns `true` if the sleeping foreground should resume.
    fn handle_tx_irq(&self) -> bool;

    /// Handle the receive vector
    ///
    /// Returns `true` if the sleeping foreground should resume.
    fn handle_rx_irq(&self) -> bool;
}

impl<T: SerialInterrupt + ?Sized> SerialInterrupt for &T {
    fn handle_tx_irq(&self) -> bool {
        (**self).handle_tx_irq()
    }

    fn handle_rx_irq(&self) -> bool {
        (**self).handle_rx_irq()
    }
}

/// Which shared vector fired
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Vector {
    Tx,
    Rx,
}

/// Dispatch errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum DispatchError {
    /// No room for another handler
    TableFull,
}

/// Handlers sharing one vector pair
pub struct VectorTable<'a, const N: usize> {
    handlers: Vec<&'a (dyn SerialInterrupt + Sync), N>,
    wake: Option<&'a WakeSignal>,
}

impl<'a, const N: usize> Default for VectorTable<'a, N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'a, const N: usize> VectorTable<'a, N> {
    pub const fn new() -> Self {
        Self {
            handlers: Vec::new(),
            wake: None,
        }
    }

    /// Table that raises `wake` whenever a handler asks for it
    pub const fn with_wake(wake: &'a WakeSignal) -> Self {
        Self {
            handlers: Vec::new(),
            wake: Some(wake),
        }
    }

    /// Add a handler; handlers run in registration order
    pub fn register(
        &mut self,
        handler: &'a (dyn SerialInterrupt + Sync),
    ) -> Result<(), DispatchError> {
        self.handlers
            .push(handler)
            .map_err(|_| DispatchError::TableFull)
    }

    /// Number of registered handlers
    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }

    /// Run every handler for `vector`
    ///
    /// All handlers run even after one has asked for a wake, since both
    /// blocks of the pair may have work pending. Returns the combined wake
    /// request.
    pub fn on_vector(&self, vector: Vector) -> bool {
        let mut wake = false;
        for handler in &self.handlers {
            wake |= match vector {
                Vector::Tx => handler.handle_tx_irq(),
                Vector::Rx => handler.handle_rx_irq(),
            };
        }
        if wake {
            if let Some(signal) = self.wake {
                signal.request();
            }
        }
        wake
    }
}
