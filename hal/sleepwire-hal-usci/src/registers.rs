//! Register access trait
//!
//! Drivers never touch addresses directly. They go through
//! [`UsciRegisters`], which the memory-mapped blocks implement for real
//! hardware and test doubles implement for host runs.

use crate::bits::irq;

/// Which half of a USCI instance
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Module {
    /// UART/SPI block
    A,
    /// SPI/I2C block
    B,
}

impl Module {
    /// This block's receive bit in the shared IE/IFG registers
    pub const fn rx_bit(self) -> u8 {
        match self {
            Module::A => irq::UCARXIFG,
            Module::B => irq::UCBRXIFG,
        }
    }

    /// This block's transmit bit in the shared IE/IFG registers
    pub const fn tx_bit(self) -> u8 {
        match self {
            Module::A => irq::UCATXIFG,
            Module::B => irq::UCBTXIFG,
        }
    }
}

/// Block registers
///
/// `Ie` and `Ifg` are the interrupt enable/flag registers shared by both
/// blocks of the instance. `Mctl` only exists on USCI_A; `I2cIe`, `I2cOa`
/// and `I2cSa` only on USCI_B.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Reg {
    Ctl0,
    Ctl1,
    Br0,
    Br1,
    Mctl,
    I2cIe,
    Stat,
    RxBuf,
    TxBuf,
    I2cOa,
    I2cSa,
    Ie,
    Ifg,
}

/// Access to one USCI block
///
/// Handles are cheap to copy: the foreground driver and its interrupt half
/// each hold one.
pub trait UsciRegisters {
    /// Which block this handle addresses
    fn module(&self) -> Module;

    /// Read a register
    fn read(&self, reg: Reg) -> u8;

    /// Write a register
    ///
    /// `I2cOa` and `I2cSa` are 16-bit registers; the value lands in the low
    /// byte with the high byte cleared.
    fn write(&self, reg: Reg, value: u8);

    /// Read-modify-write
    fn modify(&self, reg: Reg, f: impl FnOnce(u8) -> u8) {
        let value = self.read(reg);
        self.write(reg, f(value));
    }

    /// Set bits in a register
    fn set_bits(&self, reg: Reg, mask: u8) {
        self.modify(reg, |v| v | mask);
    }

    /// Clear bits in a register
    fn clear_bits(&self, reg: Reg, mask: u8) {
        self.modify(reg, |v| v & !mask);
    }

    /// Check whether any bit of `mask` is set
    fn is_set(&self, reg: Reg, mask: u8) -> bool {
        self.read(reg) & mask != 0
    }

    /// Called once per iteration of every polling loop
    fn relax(&self) {
        core::hint::spin_loop();
    }

    /// Is this block's receive flag set?
    fn rx_pending(&self) -> bool {
        self.is_set(Reg::Ifg, self.module().rx_bit())
    }

    /// Is this block's transmit flag set?
    fn tx_pending(&self) -> bool {
        self.is_set(Reg::Ifg, self.module().tx_bit())
    }

    /// Enable both of this block's interrupt sources
    fn enable_rx_tx_irq(&self) {
        let module = self.module();
        self.set_bits(Reg::Ie, module.rx_bit() | module.tx_bit());
    }

    /// Disable both of this block's interrupt sources
    fn disable_rx_tx_irq(&self) {
        let module = self.module();
        self.clear_bits(Reg::Ie, module.rx_bit() | module.tx_bit());
    }

    /// Clear this block's transmit flag
    fn clear_tx_irq(&self) {
        self.clear_bits(Reg::Ifg, self.module().tx_bit());
    }

    /// Clear this block's receive flag
    fn clear_rx_irq(&self) {
        self.clear_bits(Reg::Ifg, self.module().rx_bit());
    }
}

impl<T: UsciRegisters + ?Sized> UsciRegisters for &T {
    fn module(&self) -> Module {
        (**self).module()
    }

    fn read(&self, reg: Reg) -> u8 {
        (**self).read(reg)
    }

    fn write(&self, reg: Reg, value: u8) {
        (**self).write(reg, value)
    }

    fn relax(&self) {
        (**self).relax()
    }
}
