//! Driver errors

/// UART errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum UartError {
    /// Baud rate cannot be generated from the clock
    InvalidBaudRate,
    /// Timeout guard fired before the transfer finished
    Timeout {
        /// Bytes handed to the hardware before giving up
        transferred: usize,
    },
    /// Stop bit sampled low
    ///
    /// Only [`UartRx::read_byte`](sleepwire_hal::UartRx::read_byte) reports
    /// this as an error; the other receive calls set the sticky
    /// `framing_error` status flag and return the byte.
    Framing,
}

impl embedded_io::Error for UartError {
    fn kind(&self) -> embedded_io::ErrorKind {
        match self {
            UartError::InvalidBaudRate => embedded_io::ErrorKind::InvalidInput,
            UartError::Timeout { .. } => embedded_io::ErrorKind::TimedOut,
            UartError::Framing => embedded_io::ErrorKind::InvalidData,
        }
    }
}

/// I2C errors
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum I2cError {
    /// Slave did not acknowledge, retries exhausted
    Nack,
    /// Another master won the bus
    ArbitrationLost,
    /// Timeout guard fired before the transfer finished
    Timeout {
        /// Bytes moved before giving up
        transferred: usize,
    },
    /// Bus stayed busy after STOP
    BusBusy,
    /// Transfer does not fit in the session buffer
    BufferTooLarge,
    /// Zero-length read
    InvalidLength,
    /// Peripheral is configured as a slave
    NotMaster,
    /// Bus frequency cannot be generated from the clock
    InvalidFrequency,
}
