//! USCI instance model
//!
//! Models one USCI_A/USCI_B pair closely enough to run the drivers on the
//! host: the shared IE/IFG registers, the UART transmit buffer and shifter,
//! a receive queue with framing-error injection, and an I2C bus with one
//! slave whose address NACKs can be scripted. Hardware progresses one step
//! per [`SimUsci::tick`].
//!
//! As on the real block, a master transmitter gets UCBTXIFG as soon as
//! START goes out. The address is answered one step later, which is when
//! UCTXSTT clears; a NACK discards whatever was loaded into TXBUF meanwhile.

use heapless::{Deque, Vec};
use sleepwire_core::IrqCell;
use sleepwire_hal_usci::bits::{ctl1, i2c_stat, irq, uart_stat};
use sleepwire_hal_usci::{Module, Reg, UsciRegisters};

const REGS: usize = 13;

const fn index(reg: Reg) -> usize {
    match reg {
        Reg::Ctl0 => 0,
        Reg::Ctl1 => 1,
        Reg::Br0 => 2,
        Reg::Br1 => 3,
        Reg::Mctl => 4,
        Reg::I2cIe => 5,
        Reg::Stat => 6,
        Reg::RxBuf => 7,
        Reg::TxBuf => 8,
        Reg::I2cOa => 9,
        Reg::I2cSa => 10,
        Reg::Ie => 11,
        Reg::Ifg => 12,
    }
}

const fn slot(module: Module) -> usize {
    match module {
        Module::A => 0,
        Module::B => 1,
    }
}

/// Something that happened on the I2C bus
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum I2cEvent {
    Start { address: u8, read: bool },
    RepeatedStart { address: u8, read: bool },
    AddressAck,
    AddressNack,
    Write { byte: u8 },
    Read { byte: u8, ack: bool },
    Stop,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Bus {
    Idle,
    /// START and address sent, waiting for the slave's answer
    Addressing { address: u8, read: bool },
    Transmitting,
    Receiving,
    /// Address NACKed, SCL held until START or STOP
    Held,
}

struct Slave {
    address: u8,
    present: bool,
    nacks: u8,
    data: Deque<u8, 64>,
    received: Vec<u8, 64>,
}

struct State {
    regs: [[u8; REGS]; 2],
    ie: u8,
    ifg: u8,

    uart_txbuf: Option<u8>,
    uart_shifter: Option<u8>,
    uart_stalled: bool,
    uart_rx: Deque<(u8, bool), 32>,
    wire: Vec<u8, 256>,

    bus: Bus,
    i2c_txbuf: Option<u8>,
    i2c_stalled: bool,
    lose_arbitration: bool,
    bus_jammed: bool,
    slave: Slave,
    events: Vec<I2cEvent, 128>,
}

/// One USCI instance (A and B block)
///
/// `Sync` like the real peripheral, so driver halves built on it can be
/// registered in a [`VectorTable`](sleepwire_core::VectorTable).
pub struct SimUsci {
    state: IrqCell<State>,
}

impl SimUsci {
    pub fn new() -> Self {
        Self {
            state: IrqCell::new(State {
                regs: [[0; REGS]; 2],
                ie: 0,
                ifg: 0,
                uart_txbuf: None,
                uart_shifter: None,
                uart_stalled: false,
                uart_rx: Deque::new(),
                wire: Vec::new(),
                bus: Bus::Idle,
                i2c_txbuf: None,
                i2c_stalled: false,
                lose_arbitration: false,
                bus_jammed: false,
                slave: Slave {
                    address: 0x48,
                    present: true,
                    nacks: 0,
                    data: Deque::new(),
                    received: Vec::new(),
                },
                events: Vec::new(),
            }),
        }
    }

    /// Register handle for the UART block
    pub fn port_a(&self) -> SimPort<'_> {
        SimPort {
            sim: self,
            module: Module::A,
        }
    }

    /// Register handle for the I2C block
    pub fn port_b(&self) -> SimPort<'_> {
        SimPort {
            sim: self,
            module: Module::B,
        }
    }

    /// Raw register value, no side effects
    pub fn peek(&self, module: Module, reg: Reg) -> u8 {
        self.state.lock(|state| match reg {
            Reg::Ie => state.ie,
            Reg::Ifg => state.ifg,
            _ => state.regs[slot(module)][index(reg)],
        })
    }

    /// All registers of a block, for before/after comparisons
    pub fn snapshot(&self, module: Module) -> [u8; REGS] {
        self.state.lock(|state| {
            let mut regs = state.regs[slot(module)];
            regs[index(Reg::Ie)] = state.ie;
            regs[index(Reg::Ifg)] = state.ifg;
            regs
        })
    }

    pub fn stall_uart(&self, stalled: bool) {
        self.state.lock(|state| state.uart_stalled = stalled);
    }

    pub fn stall_i2c(&self, stalled: bool) {
        self.state.lock(|state| state.i2c_stalled = stalled);
    }

    /// Another master wins the bus on the next START
    pub fn lose_arbitration(&self) {
        self.state.lock(|state| state.lose_arbitration = true);
    }

    /// Hold UCBBUSY set whatever the bus does
    pub fn jam_bus(&self, jammed: bool) {
        self.state.lock(|state| state.bus_jammed = jammed);
    }

    /// UCBBUSY as the driver would read it
    pub fn i2c_busy(&self) -> bool {
        self.state.lock(|state| state.bus_jammed || state.bus != Bus::Idle)
    }

    /// Queue a byte arriving on the UART RX line
    pub fn inject_rx(&self, byte: u8, framing_error: bool) {
        self.state.lock(|state| {
            let _ = state.uart_rx.push_back((byte, framing_error));
        });
    }

    /// Bytes that left the UART shifter
    pub fn wire(&self) -> Vec<u8, 256> {
        self.state.lock(|state| state.wire.clone())
    }

    pub fn set_slave(&self, address: u8, present: bool) {
        self.state.lock(|state| {
            state.slave.address = address;
            state.slave.present = present;
        });
    }

    /// NACK the next `count` address phases
    pub fn nack_address(&self, count: u8) {
        self.state.lock(|state| state.slave.nacks = count);
    }

    /// Bytes the slave returns on reads
    pub fn load_slave(&self, data: &[u8]) {
        self.state.lock(|state| {
            for &byte in data {
                let _ = state.slave.data.push_back(byte);
            }
        });
    }

    /// Bytes the slave has been written
    pub fn slave_received(&self) -> Vec<u8, 64> {
        self.state.lock(|state| state.slave.received.clone())
    }

    pub fn events(&self) -> Vec<I2cEvent, 128> {
        self.state.lock(|state| state.events.clone())
    }

    /// Transmit vector would fire
    pub fn tx_vector_pending(&self) -> bool {
        self.state.lock(|state| {
            state.ie & state.ifg & (irq::UCATXIFG | irq::UCBTXIFG | irq::UCBRXIFG) != 0
        })
    }

    /// Receive vector would fire
    pub fn rx_vector_pending(&self) -> bool {
        self.state.lock(|state| {
            let b = slot(Module::B);
            let status = state.regs[b][index(Reg::I2cIe)] & state.regs[b][index(Reg::Stat)];
            state.ie & state.ifg & irq::UCARXIFG != 0
                || status & (i2c_stat::UCNACKIFG | i2c_stat::UCALIFG) != 0
        })
    }

    /// Advance the hardware by one step
    pub fn tick(&self) {
        self.state.lock(|state| {
            state.tick_uart();
            state.tick_i2c();
        });
    }

    fn read(&self, module: Module, reg: Reg) -> u8 {
        self.state.lock(|state| state.read(module, reg))
    }

    fn write(&self, module: Module, reg: Reg, value: u8) {
        self.state.lock(|state| state.write(module, reg, value));
    }
}

impl State {
    fn read(&mut self, module: Module, reg: Reg) -> u8 {
        let m = slot(module);
        match reg {
            Reg::Ie => self.ie,
            Reg::Ifg => self.ifg,
            Reg::Stat => {
                let stored = self.regs[m][index(Reg::Stat)];
                match module {
                    Module::A if self.uart_txbuf.is_some() || self.uart_shifter.is_some() => {
                        stored | uart_stat::UCBUSY
                    }
                    Module::B if self.bus_jammed || self.bus != Bus::Idle => {
                        stored | i2c_stat::UCBBUSY
                    }
                    _ => stored,
                }
            }
            Reg::RxBuf => {
                self.ifg &= !module.rx_bit();
                if module == Module::A {
                    self.regs[m][index(Reg::Stat)] &= !uart_stat::UCFE;
                }
                self.regs[m][index(Reg::RxBuf)]
            }
            _ => self.regs[m][index(reg)],
        }
    }

    fn write(&mut self, module: Module, reg: Reg, value: u8) {
        let m = slot(module);
        match reg {
            Reg::Ie => self.ie = value,
            Reg::Ifg => self.ifg = value,
            Reg::Stat => {
                // Busy bits are computed on read
                let busy = match module {
                    Module::A => uart_stat::UCBUSY,
                    Module::B => i2c_stat::UCBBUSY,
                };
                self.regs[m][index(Reg::Stat)] = value & !busy;
            }
            Reg::TxBuf => {
                self.regs[m][index(Reg::TxBuf)] = value;
                self.ifg &= !module.tx_bit();
                match module {
                    Module::A => self.uart_txbuf = Some(value),
                    Module::B => self.i2c_txbuf = Some(value),
                }
            }
            Reg::Ctl1 => {
                let was_reset = self.regs[m][index(Reg::Ctl1)] & ctl1::UCSWRST != 0;
                self.regs[m][index(Reg::Ctl1)] = value;
                if value & ctl1::UCSWRST != 0 && !was_reset {
                    self.enter_reset(module);
                }
            }
            _ => self.regs[m][index(reg)] = value,
        }
    }

    fn in_reset(&self, module: Module) -> bool {
        self.regs[slot(module)][index(Reg::Ctl1)] & ctl1::UCSWRST != 0
    }

    fn enter_reset(&mut self, module: Module) {
        let bits = module.rx_bit() | module.tx_bit();
        self.ie &= !bits;
        self.ifg &= !bits;
        self.regs[slot(module)][index(Reg::Stat)] = 0;
        match module {
            Module::A => {
                // UART reset leaves the transmitter ready
                self.ifg |= module.tx_bit();
                self.uart_txbuf = None;
                self.uart_shifter = None;
            }
            Module::B => {
                self.bus = Bus::Idle;
                self.i2c_txbuf = None;
            }
        }
    }

    fn tick_uart(&mut self) {
        if self.in_reset(Module::A) {
            return;
        }
        let a = slot(Module::A);

        if !self.uart_stalled {
            if let Some(byte) = self.uart_shifter.take() {
                let _ = self.wire.push(byte);
            }
            if let Some(byte) = self.uart_txbuf.take() {
                self.uart_shifter = Some(byte);
                self.ifg |= irq::UCATXIFG;
            }
        }

        if self.ifg & irq::UCARXIFG == 0 {
            if let Some((byte, framing)) = self.uart_rx.pop_front() {
                self.regs[a][index(Reg::RxBuf)] = byte;
                if framing {
                    self.regs[a][index(Reg::Stat)] |= uart_stat::UCFE;
                }
                self.ifg |= irq::UCARXIFG;
            }
        }
    }

    fn ctl1_b(&self) -> u8 {
        self.regs[slot(Module::B)][index(Reg::Ctl1)]
    }

    fn clear_ctl1_b(&mut self, mask: u8) {
        self.regs[slot(Module::B)][index(Reg::Ctl1)] &= !mask;
    }

    fn event(&mut self, event: I2cEvent) {
        let _ = self.events.push(event);
    }

    fn stop(&mut self) {
        self.event(I2cEvent::Stop);
        self.clear_ctl1_b(ctl1::UCTXSTP);
        self.bus = Bus::Idle;
    }

    fn tick_i2c(&mut self) {
        if self.in_reset(Module::B) || self.i2c_stalled {
            return;
        }
        let b = slot(Module::B);
        let control = self.ctl1_b();

        let addressing = matches!(self.bus, Bus::Addressing { .. });
        if control & ctl1::UCTXSTT != 0 && !addressing {
            let address = self.regs[b][index(Reg::I2cSa)];
            let read = control & ctl1::UCTR == 0;
            if self.lose_arbitration {
                self.lose_arbitration = false;
                self.clear_ctl1_b(ctl1::UCTXSTT);
                self.regs[b][index(Reg::Stat)] |= i2c_stat::UCALIFG;
                self.bus = Bus::Idle;
                return;
            }
            if self.bus == Bus::Idle {
                self.event(I2cEvent::Start { address, read });
            } else {
                self.event(I2cEvent::RepeatedStart { address, read });
            }
            self.ifg &= !(irq::UCBTXIFG | irq::UCBRXIFG);
            self.i2c_txbuf = None;
            self.bus = Bus::Addressing { address, read };
            if !read {
                self.ifg |= irq::UCBTXIFG;
            }
            return;
        }

        let stop_requested = control & ctl1::UCTXSTP != 0;
        match self.bus {
            Bus::Addressing { address, read } => {
                // UCTXSTT stays set until the slave answers
                self.clear_ctl1_b(ctl1::UCTXSTT);
                let slave = &self.slave;
                let acked = slave.present && slave.address == address && slave.nacks == 0;
                if acked {
                    self.event(I2cEvent::AddressAck);
                    self.bus = if read {
                        Bus::Receiving
                    } else {
                        Bus::Transmitting
                    };
                } else {
                    self.slave.nacks = self.slave.nacks.saturating_sub(1);
                    self.event(I2cEvent::AddressNack);
                    self.i2c_txbuf = None;
                    self.ifg &= !irq::UCBTXIFG;
                    self.regs[b][index(Reg::Stat)] |= i2c_stat::UCNACKIFG;
                    self.bus = Bus::Held;
                }
            }
            Bus::Transmitting => {
                if let Some(byte) = self.i2c_txbuf.take() {
                    let _ = self.slave.received.push(byte);
                    self.event(I2cEvent::Write { byte });
                    self.ifg |= irq::UCBTXIFG;
                } else if stop_requested {
                    self.stop();
                }
            }
            Bus::Receiving => {
                if self.ifg & irq::UCBRXIFG == 0 {
                    let byte = self.slave.data.pop_front().unwrap_or(0xFF);
                    let ack = !stop_requested;
                    self.regs[b][index(Reg::RxBuf)] = byte;
                    self.ifg |= irq::UCBRXIFG;
                    self.event(I2cEvent::Read { byte, ack });
                    if !ack {
                        self.stop();
                    }
                }
            }
            Bus::Held => {
                if stop_requested {
                    self.stop();
                }
            }
            Bus::Idle => {
                if stop_requested {
                    self.clear_ctl1_b(ctl1::UCTXSTP);
                }
            }
        }
    }
}

/// Register handle for one block of a [`SimUsci`]
#[derive(Clone, Copy)]
pub struct SimPort<'a> {
    sim: &'a SimUsci,
    module: Module,
}

impl UsciRegisters for SimPort<'_> {
    fn module(&self) -> Module {
        self.module
    }

    fn read(&self, reg: Reg) -> u8 {
        self.sim.read(self.module, reg)
    }

    fn write(&self, reg: Reg, value: u8) {
        self.sim.write(self.module, reg, value);
    }

    fn relax(&self) {
        self.sim.tick();
    }
}
