//! I2C master on a USCI_B block
//!
//! Interrupt-driven transfers go through [`I2cMaster::transfer`]: the
//! foreground loads a session, issues START and sleeps. [`I2cIrq`] moves the
//! data on the transmit vector and handles NACK and arbitration loss on the
//! receive (status) vector:
//!
//! ```text
//! TX vector  RXIFG  store byte; STOP once two or fewer remain
//!            TXIFG  next byte, or STOP + complete when none left
//! RX vector  NACK   re-issue START, up to `address_retries`, then STOP + Nack
//!            AL     complete with ArbitrationLost
//! ```
//!
//! A NACKed address phase discards the data byte already loaded for it, so
//! a retried write starts over from its first byte.
//!
//! The polled calls ([`send`](I2cMaster::send), [`receive`](I2cMaster::receive),
//! [`stop`](I2cMaster::stop)) mask the block's interrupts for their duration
//! and poll the flags directly; `send` without STOP followed by `receive`
//! gives a repeated START. A failed polled call always leaves the bus
//! released. Zero-length writes only address the slave and are polled as well.

use sleepwire_core::{Direction, Idle, IrqCell, SerialInterrupt, TransferSession};
use sleepwire_hal::{
    ClockClaim, ClockSource, ClockType, I2cBus, I2cConfig, I2cRole, Never, TimeoutGuard,
};
use sleepwire_hal_usci::bits::{ctl0, ctl1, i2c_ie, i2c_stat};
use sleepwire_hal_usci::{Reg, UsciRegisters};

use crate::error::I2cError;

/// Direction and data of one interrupt-driven transfer
#[derive(Debug)]
pub enum Transfer<'b> {
    Write(&'b [u8]),
    Read(&'b mut [u8]),
}

struct I2cSession<const N: usize> {
    transfer: TransferSession<N>,
    stop_sent: bool,
    retries: u8,
    max_retries: u8,
    fault: Option<I2cError>,
}

impl<const N: usize> I2cSession<N> {
    const fn new() -> Self {
        Self {
            transfer: TransferSession::new(),
            stop_sent: false,
            retries: 0,
            max_retries: 0,
            fault: None,
        }
    }

    fn clear(&mut self, max_retries: u8) {
        self.transfer.reset();
        self.stop_sent = false;
        self.retries = 0;
        self.max_retries = max_retries;
        self.fault = None;
    }

    fn fail(&mut self, fault: I2cError) -> bool {
        self.fault = Some(fault);
        self.transfer.finish()
    }
}

/// State shared by [`I2cMaster`] and [`I2cIrq`]
///
/// `N` bounds the length of one interrupt-driven transfer.
pub struct I2cShared<const N: usize> {
    session: IrqCell<I2cSession<N>>,
}

impl<const N: usize> Default for I2cShared<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> I2cShared<N> {
    pub const fn new() -> Self {
        Self {
            session: IrqCell::new(I2cSession::new()),
        }
    }
}

/// Masks a block's interrupts, restoring them on drop
struct IrqMask<'r, R: UsciRegisters> {
    regs: &'r R,
    ie: u8,
    i2cie: u8,
}

impl<'r, R: UsciRegisters> IrqMask<'r, R> {
    fn new(regs: &'r R) -> Self {
        let module = regs.module();
        let ie = regs.read(Reg::Ie) & (module.rx_bit() | module.tx_bit());
        let i2cie = regs.read(Reg::I2cIe);
        regs.disable_rx_tx_irq();
        regs.write(Reg::I2cIe, 0);
        Self { regs, ie, i2cie }
    }
}

impl<R: UsciRegisters> Drop for IrqMask<'_, R> {
    fn drop(&mut self) {
        self.regs.write(Reg::I2cIe, self.i2cie);
        self.regs.set_bits(Reg::Ie, self.ie);
    }
}

/// Foreground half of the I2C master
pub struct I2cMaster<'a, R, C: ?Sized, I, const N: usize> {
    regs: R,
    clock: &'a C,
    idle: I,
    shared: &'a I2cShared<N>,
    config: I2cConfig,
    divider: u16,
}

impl<'a, R, C, I, const N: usize> I2cMaster<'a, R, C, I, N>
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
        shared: &'a I2cShared<N>,
        config: I2cConfig,
    ) -> Result<Self, I2cError> {
        if config.frequency == 0 {
            return Err(I2cError::InvalidFrequency);
        }
        let divider = clock.frequency() / config.frequency;
        if divider == 0 || divider > u32::from(u16::MAX) {
            return Err(I2cError::InvalidFrequency);
        }

        Ok(Self {
            regs,
            clock,
            idle,
            shared,
            config,
            divider: divider as u16,
        })
    }

    pub fn config(&self) -> &I2cConfig {
        &self.config
    }

    /// Configure the block and enable its interrupts
    pub fn init(&mut self) {
        let regs = &self.regs;
        regs.set_bits(Reg::Ctl1, ctl1::UCSWRST);

        let role = match self.config.role {
            I2cRole::Master => ctl0::UCMST,
            I2cRole::Slave => 0,
        };
        regs.write(Reg::Ctl0, role | ctl0::UCMODE_3 | ctl0::UCSYNC);
        regs.write(Reg::Br0, (self.divider & 0xFF) as u8);
        regs.write(Reg::Br1, (self.divider >> 8) as u8);

        let source = match self.clock.clock_type() {
            ClockType::Aclk => ctl1::UCSSEL_1,
            ClockType::Smclk | ClockType::Mclk => ctl1::UCSSEL_2,
        };
        // Leaves UCSWRST clear
        regs.write(Reg::Ctl1, source);

        let retries = self.config.address_retries;
        self.shared.session.lock(|s| s.clear(retries));

        regs.write(Reg::I2cIe, i2c_ie::UCNACKIE | i2c_ie::UCALIE);
        regs.enable_rx_tx_irq();

        debug!("i2c init: div={} role={}", self.divider, self.config.role);
    }

    /// Program the slave address used by the next START
    pub fn set_slave_address(&mut self, address: u8) {
        self.regs.write(Reg::I2cSa, address);
    }

    /// Program the address this block answers to in slave mode
    pub fn set_own_address(&mut self, address: u8) {
        self.regs.write(Reg::I2cOa, address);
    }

    fn ensure_master(&self) -> Result<(), I2cError> {
        match self.config.role {
            I2cRole::Master => Ok(()),
            I2cRole::Slave => Err(I2cError::NotMaster),
        }
    }

    /// Run one interrupt-driven transfer
    ///
    /// A zero-length write only checks that the address is acknowledged.
    /// The clock is held for the duration of the call and released on every
    /// exit path. On a failed read the bytes that did arrive are still
    /// copied into `buf`.
    pub fn transfer(
        &mut self,
        address: u8,
        transfer: Transfer<'_>,
        timeout: impl TimeoutGuard,
    ) -> Result<(), I2cError> {
        self.ensure_master()?;

        let (len, direction) = match &transfer {
            Transfer::Write(data) => (data.len(), Direction::Send),
            Transfer::Read(buf) => (buf.len(), Direction::Receive),
        };
        if len > N {
            return Err(I2cError::BufferTooLarge);
        }
        if direction == Direction::Receive && len == 0 {
            return Err(I2cError::InvalidLength);
        }

        let _claim = ClockClaim::new(self.clock);
        if direction == Direction::Send && len == 0 {
            return self.address_only(address, &timeout);
        }
        let shared = self.shared;
        let regs = &self.regs;
        let max_retries = self.config.address_retries;

        let loaded = shared.session.lock(|s| {
            s.clear(max_retries);
            match &transfer {
                Transfer::Write(data) => s.transfer.begin_send(data),
                Transfer::Read(buf) => s.transfer.begin_receive(buf.len()),
            }
        });
        loaded.map_err(|_| I2cError::BufferTooLarge)?;

        match direction {
            Direction::Send => regs.set_bits(Reg::Ctl1, ctl1::UCTR),
            Direction::Receive => regs.clear_bits(Reg::Ctl1, ctl1::UCTR),
        }
        regs.write(Reg::I2cSa, address);
        regs.set_bits(Reg::Ctl1, ctl1::UCTXSTT);

        if direction == Direction::Receive && len == 1 {
            // A single byte needs STOP queued before it arrives
            while regs.is_set(Reg::Ctl1, ctl1::UCTXSTT) && !timeout.triggered() {
                regs.relax();
            }
            regs.set_bits(Reg::Ctl1, ctl1::UCTXSTP);
            shared.session.lock(|s| s.stop_sent = true);
        }

        let active = || shared.session.lock(|s| s.transfer.is_active());
        self.idle.idle_while(|| !timeout.triggered() && active());

        let outcome = shared.session.lock(|s| {
            if s.transfer.abort() {
                if !s.stop_sent {
                    regs.set_bits(Reg::Ctl1, ctl1::UCTXSTP);
                    s.stop_sent = true;
                }
                return Err(I2cError::Timeout {
                    transferred: s.transfer.transferred(),
                });
            }
            match s.fault {
                Some(fault) => Err(fault),
                None => Ok(()),
            }
        });

        let drained = self.drain();

        if let Transfer::Read(buf) = transfer {
            shared.session.lock(|s| {
                let received = s.transfer.received();
                buf[..received.len()].copy_from_slice(received);
            });
        }

        if let Err(err) = outcome {
            debug!("i2c transfer to {=u8:#x} failed: {}", address, err);
            return Err(err);
        }
        drained
    }

    /// Address-only write with START and STOP queued together
    fn address_only(&self, address: u8, timeout: &impl TimeoutGuard) -> Result<(), I2cError> {
        let _mask = IrqMask::new(&self.regs);
        let regs = &self.regs;

        regs.set_bits(Reg::Ctl1, ctl1::UCTR);
        regs.write(Reg::I2cSa, address);
        for attempt in 0..=self.config.address_retries {
            if attempt > 0 {
                trace!("i2c address nack, retry {}", attempt);
            }
            regs.set_bits(Reg::Ctl1, ctl1::UCTXSTT | ctl1::UCTXSTP);
            while regs.is_set(Reg::Ctl1, ctl1::UCTXSTP) {
                if timeout.triggered() {
                    return self.recover(Err(I2cError::Timeout { transferred: 0 }));
                }
                regs.relax();
            }
            regs.clear_tx_irq();
            if !regs.is_set(Reg::Stat, i2c_stat::UCNACKIFG) {
                return self.drain();
            }
            regs.clear_bits(Reg::Stat, i2c_stat::UCNACKIFG);
        }
        debug!("i2c address {=u8:#x} not acknowledged", address);
        Err(I2cError::Nack)
    }

    /// Wait for the bus to go idle after STOP
    fn drain(&self) -> Result<(), I2cError> {
        for _ in 0..self.config.drain_spins {
            if !self.regs.is_set(Reg::Stat, i2c_stat::UCBBUSY) {
                return Ok(());
            }
            self.regs.relax();
        }
        if self.regs.is_set(Reg::Stat, i2c_stat::UCBBUSY) {
            warn!("i2c bus still busy after {} spins", self.config.drain_spins);
            return Err(I2cError::BusBusy);
        }
        Ok(())
    }

    /// Release the bus after a failed polled step
    ///
    /// Arbitration loss leaves the bus to the winning master and a bus that
    /// never went idle cannot be drained again, so neither gets a STOP.
    fn recover<T>(&self, result: Result<T, I2cError>) -> Result<T, I2cError> {
        if let Err(err) = &result {
            if !matches!(err, I2cError::ArbitrationLost | I2cError::BusBusy) {
                self.regs.set_bits(Reg::Ctl1, ctl1::UCTXSTP);
                self.regs.clear_tx_irq();
                let _ = self.drain();
            }
        }
        result
    }

    /// Poll until `ready`, failing on NACK, arbitration loss or timeout
    fn poll(
        &self,
        timeout: &impl TimeoutGuard,
        transferred: usize,
        ready: impl Fn(&R) -> bool,
    ) -> Result<(), I2cError> {
        loop {
            let stat = self.regs.read(Reg::Stat);
            if stat & i2c_stat::UCNACKIFG != 0 {
                self.regs.clear_bits(Reg::Stat, i2c_stat::UCNACKIFG);
                return Err(I2cError::Nack);
            }
            if stat & i2c_stat::UCALIFG != 0 {
                self.regs.clear_bits(Reg::Stat, i2c_stat::UCALIFG);
                return Err(I2cError::ArbitrationLost);
            }
            if ready(&self.regs) {
                return Ok(());
            }
            if timeout.triggered() {
                return Err(I2cError::Timeout { transferred });
            }
            self.regs.relax();
        }
    }

    /// Polled write
    ///
    /// Without `stop` the bus is left held so a following
    /// [`receive`](Self::receive) issues a repeated START.
    pub fn send(
        &mut self,
        address: u8,
        data: &[u8],
        stop: bool,
        timeout: impl TimeoutGuard,
    ) -> Result<(), I2cError> {
        self.ensure_master()?;
        let _claim = ClockClaim::new(self.clock);
        let _mask = IrqMask::new(&self.regs);
        let result = self.send_polled(address, data, stop, &timeout);
        self.recover(result)
    }

    fn send_polled(
        &self,
        address: u8,
        data: &[u8],
        stop: bool,
        timeout: &impl TimeoutGuard,
    ) -> Result<(), I2cError> {
        let regs = &self.regs;

        regs.set_bits(Reg::Ctl1, ctl1::UCTR);
        regs.write(Reg::I2cSa, address);
        regs.set_bits(Reg::Ctl1, ctl1::UCTXSTT);

        for (sent, &byte) in data.iter().enumerate() {
            self.poll(timeout, sent, |r| r.tx_pending())?;
            regs.write(Reg::TxBuf, byte);
        }
        self.poll(timeout, data.len(), |r| {
            r.tx_pending() && !r.is_set(Reg::Ctl1, ctl1::UCTXSTT)
        })?;

        if stop {
            regs.set_bits(Reg::Ctl1, ctl1::UCTXSTP);
            regs.clear_tx_irq();
            self.drain()?;
        }
        Ok(())
    }

    /// Polled read
    ///
    /// STOP is queued while the last byte is on the wire so it gets a NACK.
    pub fn receive(
        &mut self,
        address: u8,
        buf: &mut [u8],
        timeout: impl TimeoutGuard,
    ) -> Result<(), I2cError> {
        self.ensure_master()?;
        if buf.is_empty() {
            return Err(I2cError::InvalidLength);
        }
        let _claim = ClockClaim::new(self.clock);
        let _mask = IrqMask::new(&self.regs);
        let result = self.receive_polled(address, buf, &timeout);
        self.recover(result)
    }

    fn receive_polled(
        &self,
        address: u8,
        buf: &mut [u8],
        timeout: &impl TimeoutGuard,
    ) -> Result<(), I2cError> {
        let regs = &self.regs;
        let len = buf.len();

        regs.clear_bits(Reg::Ctl1, ctl1::UCTR);
        regs.write(Reg::I2cSa, address);
        regs.set_bits(Reg::Ctl1, ctl1::UCTXSTT);

        if len == 1 {
            self.poll(timeout, 0, |r| !r.is_set(Reg::Ctl1, ctl1::UCTXSTT))?;
            regs.set_bits(Reg::Ctl1, ctl1::UCTXSTP);
        }

        for index in 0..len {
            self.poll(timeout, index, |r| r.rx_pending())?;
            buf[index] = regs.read(Reg::RxBuf);
            if len - index == 2 {
                regs.set_bits(Reg::Ctl1, ctl1::UCTXSTP);
            }
        }

        self.drain()
    }

    /// Issue STOP and wait for the bus to go idle
    pub fn stop(&mut self) -> Result<(), I2cError> {
        self.regs.set_bits(Reg::Ctl1, ctl1::UCTXSTP);
        self.drain()
    }
}

impl<R, C, I, const N: usize> I2cBus for I2cMaster<'_, R, C, I, N>
where
    R: UsciRegisters,
    C: ClockSource + ?Sized,
    I: Idle,
{
    type Error = I2cError;

    fn write(&mut self, address: u8, data: &[u8]) -> Result<(), Self::Error> {
        self.transfer(address, Transfer::Write(data), Never)
    }

    fn read(&mut self, address: u8, buf: &mut [u8]) -> Result<(), Self::Error> {
        self.transfer(address, Transfer::Read(buf), Never)
    }

    fn write_read(
        &mut self,
        address: u8,
        write_data: &[u8],
        read_buf: &mut [u8],
    ) -> Result<(), Self::Error> {
        // An empty read would leave the write half holding the bus
        if read_buf.is_empty() {
            return Err(I2cError::InvalidLength);
        }
        let _claim = ClockClaim::new(self.clock);
        self.send(address, write_data, false, Never)?;
        self.receive(address, read_buf, Never)
    }
}

/// Interrupt half of the I2C master
pub struct I2cIrq<'a, R, const N: usize> {
    regs: R,
    shared: &'a I2cShared<N>,
}

impl<'a, R: UsciRegisters, const N: usize> I2cIrq<'a, R, N> {
    pub const fn new(regs: R, shared: &'a I2cShared<N>) -> Self {
        Self { regs, shared }
    }

    fn on_rx(&self, session: &mut I2cSession<N>) -> bool {
        let byte = self.regs.read(Reg::RxBuf);
        if !session.transfer.is_active() || session.transfer.direction() != Direction::Receive {
            return false;
        }
        if session.transfer.remaining() <= 2 && !session.stop_sent {
            self.regs.set_bits(Reg::Ctl1, ctl1::UCTXSTP);
            session.stop_sent = true;
        }
        session.transfer.push(byte);
        session.transfer.is_complete()
    }

    fn on_tx(&self, session: &mut I2cSession<N>) -> bool {
        if !session.transfer.is_active() || session.transfer.direction() != Direction::Send {
            self.regs.clear_tx_irq();
            return false;
        }
        match session.transfer.take_next() {
            Some(byte) => {
                self.regs.write(Reg::TxBuf, byte);
                false
            }
            None => {
                self.regs.set_bits(Reg::Ctl1, ctl1::UCTXSTP);
                session.stop_sent = true;
                self.regs.clear_tx_irq();
                session.transfer.finish()
            }
        }
    }

    fn on_nack(&self, session: &mut I2cSession<N>) -> bool {
        if !session.transfer.is_active() {
            return false;
        }
        if session.retries < session.max_retries {
            session.retries += 1;
            trace!("i2c nack, retry {}", session.retries);
            session.transfer.rewind();
            let single_read = session.transfer.direction() == Direction::Receive
                && session.transfer.remaining() == 1;
            if single_read {
                self.regs.set_bits(Reg::Ctl1, ctl1::UCTXSTT | ctl1::UCTXSTP);
                session.stop_sent = true;
            } else {
                self.regs.set_bits(Reg::Ctl1, ctl1::UCTXSTT);
                session.stop_sent = false;
            }
            return false;
        }

        self.regs.set_bits(Reg::Ctl1, ctl1::UCTXSTP);
        session.stop_sent = true;
        session.fail(I2cError::Nack)
    }
}

impl<R: UsciRegisters, const N: usize> SerialInterrupt for I2cIrq<'_, R, N> {
    /// Data vector: RXIFG and TXIFG of this block
    fn handle_tx_irq(&self) -> bool {
        let mut wake = false;
        if self.regs.rx_pending() {
            wake |= self.shared.session.lock(|s| self.on_rx(s));
        }
        if self.regs.tx_pending() {
            wake |= self.shared.session.lock(|s| self.on_tx(s));
        }
        wake
    }

    /// Status vector: NACK and arbitration loss
    fn handle_rx_irq(&self) -> bool {
        let stat = self.regs.read(Reg::Stat);
        let mut wake = false;

        if stat & i2c_stat::UCNACKIFG != 0 {
            self.regs.clear_bits(Reg::Stat, i2c_stat::UCNACKIFG);
            wake |= self.shared.session.lock(|s| self.on_nack(s));
        }
        if stat & i2c_stat::UCALIFG != 0 {
            self.regs.clear_bits(Reg::Stat, i2c_stat::UCALIFG);
            warn!("i2c arbitration lost");
            wake |= self
                .shared
                .session
                .lock(|s| s.fail(I2cError::ArbitrationLost));
        }
        wake
    }
}
