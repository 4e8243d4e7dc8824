//! UART serial communication abstractions
//!
//! Blocking serial traits implemented by both the hardware-assisted and the
//! bit-banged drivers. Frames are always 8N1.

/// UART transmitter
pub trait UartTx {
    /// Error type for transmit operations
    type Error;

    /// Write data to the UART
    ///
    /// Blocks until all data has been handed to the line or an error occurs.
    fn write_blocking(&mut self, data: &[u8]) -> Result<(), Self::Error>;

    /// Wait until the last byte has left the shift register
    fn flush(&mut self) -> Result<(), Self::Error>;
}

/// UART receiver
pub trait UartRx {
    /// Error type for receive operations
    type Error;

    /// Read data from the UART
    ///
    /// Blocks until the buffer is filled or an error occurs. Returns the
    /// number of bytes read.
    fn read_blocking(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error>;

    /// Read a single byte from the UART
    fn read_byte(&mut self) -> Result<u8, Self::Error> {
        let mut buf = [0u8; 1];
        self.read_blocking(&mut buf)?;
        Ok(buf[0])
    }
}

/// Sticky receive status
///
/// Set by the receive path, read and cleared by the caller. Neither flag is
/// reset automatically except `rx_available`, which every receive call
/// recomputes.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct UartStatus {
    /// A stop bit was sampled low
    pub framing_error: bool,
    /// The last receive call produced a byte
    pub rx_available: bool,
}

/// Hardware UART configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct UartConfig {
    /// Baud rate in bits per second
    pub baudrate: u32,
}

impl Default for UartConfig {
    fn default() -> Self {
        Self { baudrate: 9600 }
    }
}

impl UartConfig {
    /// Configuration for a given baud rate
    pub const fn new(baudrate: u32) -> Self {
        Self { baudrate }
    }
}

/// Software UART configuration
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SoftUartConfig {
    /// Baud rate in bits per second
    pub baudrate: u32,
}

impl Default for SoftUartConfig {
    fn default() -> Self {
        Self { baudrate: 9600 }
    }
}
