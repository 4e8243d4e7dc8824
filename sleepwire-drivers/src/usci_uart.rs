//! Interrupt-driven UART on a USCI_A block
//!
//! The driver is split in two halves that share a [`UartShared`]:
//!
//! ```text
//! foreground                         interrupt
//! ----------                         ---------
//! UsciUart::transfer                 UsciUartIrq::handle_tx_irq
//!   load session, seed TXBUF  ---->    feed TXBUF from session
//!   sleep until complete      <----    complete + wake on last byte
//!
//! UsciUart::getc                     UsciUartIrq::handle_rx_irq
//!   reset slot, sleep         <----    RXBUF + UCFE into slot, wake
//! ```
//!
//! Transmit data is copied into the session buffer in chunks of the
//! session capacity, so the interrupt half never borrows caller memory.

use sleepwire_core::{
    BaudRate, CapacityExceeded, Idle, IrqCell, SerialInterrupt, TransferSession,
};
use sleepwire_hal::{
    ClockClaim, ClockSource, ClockType, Never, TimeoutGuard, UartConfig, UartRx, UartStatus,
    UartTx,
};
use sleepwire_hal_usci::bits::{ctl1, mctl, uart_stat};
use sleepwire_hal_usci::{Reg, UsciRegisters};

use crate::error::UartError;

/// One-byte receive slot
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
struct RxSlot {
    byte: u8,
    count: u8,
    framing_error: bool,
}

impl RxSlot {
    const EMPTY: Self = Self {
        byte: 0,
        count: 0,
        framing_error: false,
    };
}

/// State shared by [`UsciUart`] and [`UsciUartIrq`]
///
/// `N` is the transmit chunk size.
pub struct UartShared<const N: usize> {
    tx: IrqCell<TransferSession<N>>,
    rx: IrqCell<RxSlot>,
}

impl<const N: usize> Default for UartShared<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> UartShared<N> {
    pub const fn new() -> Self {
        Self {
            tx: IrqCell::new(TransferSession::new()),
            rx: IrqCell::new(RxSlot::EMPTY),
        }
    }

    fn reset(&self) {
        self.tx.lock(|session| session.reset());
        self.rx.lock(|slot| *slot = RxSlot::EMPTY);
    }
}

/// Foreground half of the UART
pub struct UsciUart<'a, R, C: ?Sized, I, const N: usize> {
    regs: R,
    clock: &'a C,
    idle: I,
    shared: &'a UartShared<N>,
    baud: BaudRate,
    status: UartStatus,
    clock_held: bool,
}

impl<'a, R, C, I, const N: usize> UsciUart<'a, R, C, I, N>
where
    R: UsciRegisters,
    C: ClockSource + ?Sized,
    I: Idle,
{
    /// Create the driver; nothing is touched until [`init`](Self::init)
    pub fn new(
        regs: R,
        clock: &'a C,
        idle: I,
        shared: &'a UartShared<N>,
        config: UartConfig,
    ) -> Result<Self, UartError> {
        let baud = BaudRate::compute(clock.frequency(), config.baudrate)
            .map_err(|_| UartError::InvalidBaudRate)?;

        Ok(Self {
            regs,
            clock,
            idle,
            shared,
            baud,
            status: UartStatus::default(),
            clock_held: false,
        })
    }

    /// Baud generator settings in use
    pub fn baud(&self) -> BaudRate {
        self.baud
    }

    /// Configure the block and enable its interrupts
    ///
    /// Safe to call again: registers end up identical and the clock is
    /// still held once.
    pub fn init(&mut self) {
        self.enable();

        let regs = &self.regs;
        regs.set_bits(Reg::Ctl1, ctl1::UCSWRST);
        regs.write(Reg::Br0, self.baud.br0());
        regs.write(Reg::Br1, self.baud.br1());
        regs.write(Reg::Mctl, self.baud.mctl() & mctl::UCBRS_MASK);

        let source = match self.clock.clock_type() {
            ClockType::Aclk => ctl1::UCSSEL_1,
            ClockType::Smclk | ClockType::Mclk => ctl1::UCSSEL_2,
        };
        regs.write(Reg::Ctl1, source | ctl1::UCSWRST);
        regs.clear_bits(Reg::Ctl1, ctl1::UCSWRST);

        self.shared.reset();
        regs.enable_rx_tx_irq();

        debug!(
            "uart init: br={} mctl={=u8:#x}",
            self.baud.divisor,
            self.baud.mctl()
        );
    }

    /// Keep the clock running while the driver is idle
    pub fn enable(&mut self) {
        if !self.clock_held {
            self.clock.claim();
            self.clock_held = true;
        }
    }

    /// Let the clock stop while the driver is idle
    pub fn disable(&mut self) {
        if self.clock_held {
            self.clock.release();
            self.clock_held = false;
        }
    }

    /// Sticky receive status
    pub fn status(&self) -> UartStatus {
        self.status
    }

    pub fn clear_status(&mut self) {
        self.status = UartStatus::default();
    }

    /// Send `data`, sleeping while the interrupt moves it
    ///
    /// Returns the number of bytes sent. On timeout the remaining bytes are
    /// dropped and the error reports how many reached the transmit buffer.
    pub fn transfer(
        &mut self,
        data: &[u8],
        timeout: impl TimeoutGuard,
    ) -> Result<usize, UartError> {
        let _claim = ClockClaim::new(self.clock);
        let shared = self.shared;
        let regs = &self.regs;
        let mut sent = 0;

        for chunk in data.chunks(N.max(1)) {
            // First byte goes out under the same lock that opens the session
            let loaded = shared.tx.lock(|session| {
                session.begin_send(chunk)?;
                if let Some(byte) = session.take_next() {
                    regs.write(Reg::TxBuf, byte);
                }
                Ok::<(), CapacityExceeded>(())
            });
            if loaded.is_err() {
                return Err(UartError::Timeout { transferred: sent });
            }

            self.idle
                .idle_while(|| !timeout.triggered() && shared.tx.lock(|s| s.is_active()));

            let outcome = shared.tx.lock(|session| {
                let timed_out = session.abort();
                (timed_out, session.transferred())
            });
            match outcome {
                (true, moved) => {
                    debug!("uart tx timeout after {} bytes", sent + moved);
                    return Err(UartError::Timeout {
                        transferred: sent + moved,
                    });
                }
                (false, moved) => sent += moved,
            }
        }

        Ok(sent)
    }

    /// Send one byte
    pub fn putc(&mut self, byte: u8) -> Result<(), UartError> {
        self.transfer(&[byte], Never).map(|_| ())
    }

    /// Send a string, stopping at the first NUL
    pub fn puts(&mut self, s: &str) -> Result<(), UartError> {
        let bytes = s.as_bytes();
        let end = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());
        self.transfer(&bytes[..end], Never).map(|_| ())
    }

    /// Wait until the shifter is empty
    pub fn flush(&mut self) {
        while self.regs.is_set(Reg::Stat, uart_stat::UCBUSY) {
            self.regs.relax();
        }
    }

    /// Receive one byte, sleeping until it arrives
    ///
    /// A byte that arrived before the call is discarded. A framing error
    /// sets the sticky status flag; the byte is still returned.
    pub fn getc(&mut self, timeout: impl TimeoutGuard) -> Result<u8, UartError> {
        self.status.rx_available = false;
        let shared = self.shared;
        shared.rx.lock(|slot| *slot = RxSlot::EMPTY);

        let _claim = ClockClaim::new(self.clock);
        self.idle
            .idle_while(|| !timeout.triggered() && shared.rx.lock(|slot| slot.count == 0));

        let slot = shared.rx.lock(|slot| core::mem::replace(slot, RxSlot::EMPTY));
        if slot.count == 0 {
            return Err(UartError::Timeout { transferred: 0 });
        }

        self.status.rx_available = true;
        if slot.framing_error {
            self.status.framing_error = true;
        }
        Ok(slot.byte)
    }

    fn receive(&mut self) -> Result<(u8, bool), UartError> {
        let before = self.status.framing_error;
        self.status.framing_error = false;
        let byte = self.getc(Never);
        let framing = self.status.framing_error;
        self.status.framing_error |= before;
        byte.map(|b| (b, !framing))
    }
}

/// Interrupt half of the UART
pub struct UsciUartIrq<'a, R, const N: usize> {
    regs: R,
    shared: &'a UartShared<N>,
}

impl<'a, R: UsciRegisters, const N: usize> UsciUartIrq<'a, R, N> {
    pub const fn new(regs: R, shared: &'a UartShared<N>) -> Self {
        Self { regs, shared }
    }
}

impl<R: UsciRegisters, const N: usize> SerialInterrupt for UsciUartIrq<'_, R, N> {
    fn handle_tx_irq(&self) -> bool {
        if !self.regs.tx_pending() {
            return false;
        }

        self.shared.tx.lock(|session| match session.take_next() {
            Some(byte) => {
                self.regs.write(Reg::TxBuf, byte);
                false
            }
            None => {
                self.regs.clear_tx_irq();
                let woke = session.finish();
                if woke {
                    trace!("uart tx done: {} bytes", session.transferred());
                }
                woke
            }
        })
    }

    fn handle_rx_irq(&self) -> bool {
        if !self.regs.rx_pending() {
            return false;
        }

        let framing_error = self.regs.is_set(Reg::Stat, uart_stat::UCFE);
        let byte = self.regs.read(Reg::RxBuf);
        self.shared.rx.lock(|slot| {
            *slot = RxSlot {
                byte,
                count: 1,
                framing_error,
            }
        });
        trace!("uart rx {=u8:#x}", byte);
        true
    }
}

impl<R, C, I, const N: usize> UartTx for UsciUart<'_, R, C, I, N>
where
    R: UsciRegisters,
    C: ClockSource + ?Sized,
    I: Idle,
{
    type Error = UartError;

    fn write_blocking(&mut self, data: &[u8]) -> Result<(), Self::Error> {
        self.transfer(data, Never).map(|_| ())
    }

    fn flush(&mut self) -> Result<(), Self::Error> {
        UsciUart::flush(self);
        Ok(())
    }
}

impl<R, C, I, const N: usize> UartRx for UsciUart<'_, R, C, I, N>
where
    R: UsciRegisters,
    C: ClockSource + ?Sized,
    I: Idle,
{
    type Error = UartError;

    fn read_blocking(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error> {
        for slot in buf.iter_mut() {
            *slot = self.getc(Never)?;
        }
        Ok(buf.len())
    }

    fn read_byte(&mut self) -> Result<u8, Self::Error> {
        match self.receive()? {
            (byte, true) => Ok(byte),
            (_, false) => Err(UartError::Framing),
        }
    }
}

impl<R, C, I, const N: usize> embedded_io::ErrorType for UsciUart<'_, R, C, I, N>
where
    C: ?Sized,
{
    type Error = UartError;
}

impl<R, C, I, const N: usize> embedded_io::Write for UsciUart<'_, R, C, I, N>
where
    R: UsciRegisters,
    C: ClockSource + ?Sized,
    I: Idle,
{
    fn write(&mut self, buf: &[u8]) -> Result<usize, Self::Error> {
        self.transfer(buf, Never)
    }

    fn flush(&mut self) -> Result<(), Self::Error> {
        UsciUart::flush(self);
        Ok(())
    }
}

impl<R, C, I, const N: usize> embedded_io::Read for UsciUart<'_, R, C, I, N>
where
    R: UsciRegisters,
    C: ClockSource + ?Sized,
    I: Idle,
{
    fn read(&mut self, buf: &mut [u8]) -> Result<usize, Self::Error> {
        let Some(first) = buf.first_mut() else {
            return Ok(0);
        };
        *first = self.getc(Never)?;
        Ok(1)
    }
}
