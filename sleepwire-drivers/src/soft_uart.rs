//! Bit-banged UART
//!
//! 8N1 framing timed against a free-running 16-bit counter. Both
//! directions block the CPU for the whole frame; there are no interrupts
//! involved.
//!
//! Each bit deadline is the previous deadline plus one bit time, so
//! rounding never accumulates across a frame. Elapsed time is measured as
//! `counter.wrapping_sub(mark)`, which stays correct across counter
//! overflow as long as one bit time fits in 16 bits.

use sleepwire_hal::{
    FreeRunningCounter, InputPin, OutputPin, SoftUartConfig, TimeoutGuard, UartRx, UartStatus,
    UartTx,
};

use crate::error::UartError;

/// Software UART on a TX and an RX pin
pub struct SoftUart<T, TX, RX> {
    counter: T,
    tx: TX,
    rx: RX,
    bit_time: u16,
    status: UartStatus,
}

impl<T, TX, RX> SoftUart<T, TX, RX>
where
    T: FreeRunningCounter,
    TX: OutputPin,
    RX: InputPin,
{
    /// Create a software UART
    ///
    /// Fails if one bit would last less than two counter ticks (no room for
    /// the half-bit start check) or more than the counter can measure.
    pub fn new(counter: T, tx: TX, rx: RX, config: SoftUartConfig) -> Result<Self, UartError> {
        if config.baudrate == 0 {
            return Err(UartError::InvalidBaudRate);
        }
        let bit_time = counter.frequency() / config.baudrate;
        if bit_time < 2 || bit_time > u32::from(u16::MAX) {
            return Err(UartError::InvalidBaudRate);
        }

        Ok(Self {
            counter,
            tx,
            rx,
            bit_time: bit_time as u16,
            status: UartStatus::default(),
        })
    }

    /// Counter ticks per bit
    pub fn bit_time(&self) -> u16 {
        self.bit_time
    }

    /// Drive the line idle
    pub fn init(&mut self) {
        self.tx.set_high();
    }

    /// Leave the line idle
    pub fn disable(&mut self) {
        self.tx.set_high();
    }

    /// Sticky receive status
    pub fn status(&self) -> UartStatus {
        self.status
    }

    pub fn clear_status(&mut self) {
        self.status = UartStatus::default();
    }

    /// A start bit is on the RX line
    pub fn ready(&mut self) -> bool {
        self.rx.is_low()
    }

    /// Send one frame
    pub fn putc(&mut self, byte: u8) {
        let mut mark = self.counter.counter();

        self.tx.set_low();
        self.wait_bit(&mut mark);

        for bit in 0..8 {
            self.tx.set_state((byte >> bit) & 1 != 0);
            self.wait_bit(&mut mark);
        }

        self.tx.set_high();
        self.wait_bit(&mut mark);
    }

    /// Send a string, stopping at the first NUL
    pub fn puts(&mut self, s: &str) {
        for byte in s.bytes().take_while(|&b| b != 0) {
            self.putc(byte);
        }
    }

    /// Send every byte of `data`
    pub fn transfer(&mut self, data: &[u8]) {
        for &byte in data {
            self.putc(byte);
        }
    }

    /// Receive one frame
    ///
    /// Waits for a start bit until `timeout` triggers. A low stop bit sets
    /// the sticky `framing_error` flag; the byte is still returned.
    pub fn getc(&mut self, timeout: impl TimeoutGuard) -> Result<u8, UartError> {
        self.receive(&timeout).map(|(byte, _)| byte)
    }

    fn receive(&mut self, timeout: &impl TimeoutGuard) -> Result<(u8, bool), UartError> {
        self.status.rx_available = false;
        let half = self.bit_time / 2;

        loop {
            while self.rx.is_high() {
                if timeout.triggered() {
                    return Err(UartError::Timeout { transferred: 0 });
                }
            }

            let mut mark = self.counter.counter();
            self.wait_until(mark, half);
            if self.rx.is_high() {
                // Glitch shorter than half a bit
                continue;
            }
            mark = mark.wrapping_add(half);

            let mut byte = 0u8;
            for bit in 0..8 {
                self.wait_bit(&mut mark);
                if self.rx.is_high() {
                    byte |= 1 << bit;
                }
            }

            self.wait_bit(&mut mark);
            let stop_ok = self.rx.is_high();
            if !stop_ok {
                self.status.framing_error = true;
            }
            self.status.rx_available = true;

            return Ok((byte, stop_ok));
        }
    }

    fn wait_until(&self, mark: u16, ticks: u16) {
        while self.counter.counter().wrapping_sub(mark) < ticks {}
    }

    fn wait_bit(&self, mark: &mut u16) {
        self.wait_until(*mark, self.bit_time);
        *mark = mark.wrapping_add(self.bit_time);
    }
}

impl<T, TX, RX> UartTx for SoftUart<T, TX, RX>
where
    T: FreeRunningCounter,
    TX: OutputPin,
    RX: InputPin,
{
    type Error = UartError;

    fn write_blocking(&mut self, data: &[u8]) -> Result<(), Self::Error> {
        self.transfer(data);
        Ok(())
    }

    fn flush(&mut self) -> Result<(), Self::Error> {
        // putc returns after the stop bit
        Ok(())
    }
}

impl<T, TX, RX> UartRx for SoftUart<T, TX, RX>
where
    T: FreeRunningCounter,
    TX: OutputPin,
    RX: InputPin,
{
    type Error = UartError;

    fn read_blocking(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error> {
        for slot in buf.iter_mut() {
            *slot = self.getc(sleepwire_hal::Never)?;
        }
        Ok(buf.len())
    }

    fn read_byte(&mut self) -> Result<u8, Self::Error> {
        match self.receive(&sleepwire_hal::Never)? {
            (byte, true) => Ok(byte),
            (_, false) => Err(UartError::Framing),
        }
    }
}
