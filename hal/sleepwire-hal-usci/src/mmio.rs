//! Memory-mapped USCI blocks
//!
//! Addresses follow the MSP430x2xx family: instance 0 lives at
//! 0x0060-0x006F with IE2/IFG2 as the shared interrupt registers, instance 1
//! at 0x00D0-0x00DF with UC1IE/UC1IFG.

use core::ptr;

use crate::registers::{Module, Reg, UsciRegisters};

/// Register addresses of one block
///
/// Zero marks a register the block does not have.
#[derive(Debug, Clone, Copy)]
pub struct Layout {
    pub ctl0: usize,
    pub ctl1: usize,
    pub br0: usize,
    pub br1: usize,
    pub mctl: usize,
    pub i2cie: usize,
    pub stat: usize,
    pub rxbuf: usize,
    pub txbuf: usize,
    pub i2coa: usize,
    pub i2csa: usize,
    pub ie: usize,
    pub ifg: usize,
}

impl Layout {
    const fn address(&self, reg: Reg) -> usize {
        match reg {
            Reg::Ctl0 => self.ctl0,
            Reg::Ctl1 => self.ctl1,
            Reg::Br0 => self.br0,
            Reg::Br1 => self.br1,
            Reg::Mctl => self.mctl,
            Reg::I2cIe => self.i2cie,
            Reg::Stat => self.stat,
            Reg::RxBuf => self.rxbuf,
            Reg::TxBuf => self.txbuf,
            Reg::I2cOa => self.i2coa,
            Reg::I2cSa => self.i2csa,
            Reg::Ie => self.ie,
            Reg::Ifg => self.ifg,
        }
    }
}

const fn is_word(reg: Reg) -> bool {
    matches!(reg, Reg::I2cOa | Reg::I2cSa)
}

macro_rules! usci_block {
    ($(#[$doc:meta])* $name:ident, $module:expr, $layout:expr) => {
        $(#[$doc])*
        #[derive(Debug, Clone, Copy)]
        pub struct $name {
            _private: (),
        }

        impl $name {
            /// Register layout of this block
            pub const LAYOUT: Layout = $layout;

            /// Take a handle to the block
            ///
            /// # Safety
            ///
            /// The caller must make sure only one driver (its foreground
            /// half and its interrupt half) uses this block.
            pub const unsafe fn steal() -> Self {
                Self { _private: () }
            }
        }

        impl UsciRegisters for $name {
            fn module(&self) -> Module {
                $module
            }

            fn read(&self, reg: Reg) -> u8 {
                let addr = Self::LAYOUT.address(reg);
                if addr == 0 {
                    return 0;
                }
                // SAFETY: `addr` is a peripheral register of this block from
                // the device memory map; volatile access has no other
                // side effects than the documented hardware ones.
                unsafe {
                    if is_word(reg) {
                        ptr::read_volatile(addr as *const u16) as u8
                    } else {
                        ptr::read_volatile(addr as *const u8)
                    }
                }
            }

            fn write(&self, reg: Reg, value: u8) {
                let addr = Self::LAYOUT.address(reg);
                if addr == 0 {
                    return;
                }
                // SAFETY: see `read`.
                unsafe {
                    if is_word(reg) {
                        ptr::write_volatile(addr as *mut u16, u16::from(value));
                    } else {
                        ptr::write_volatile(addr as *mut u8, value);
                    }
                }
            }
        }
    };
}

usci_block!(
    /// USCI_A0 (UART)
    UsciA0,
    Module::A,
    Layout {
        ctl0: 0x60,
        ctl1: 0x61,
        br0: 0x62,
        br1: 0x63,
        mctl: 0x64,
        i2cie: 0,
        stat: 0x65,
        rxbuf: 0x66,
        txbuf: 0x67,
        i2coa: 0,
        i2csa: 0,
        ie: 0x01,
        ifg: 0x03,
    }
);

usci_block!(
    /// USCI_B0 (I2C)
    UsciB0,
    Module::B,
    Layout {
        ctl0: 0x68,
        ctl1: 0x69,
        br0: 0x6A,
        br1: 0x6B,
        mctl: 0,
        i2cie: 0x6C,
        stat: 0x6D,
        rxbuf: 0x6E,
        txbuf: 0x6F,
        i2coa: 0x118,
        i2csa: 0x11A,
        ie: 0x01,
        ifg: 0x03,
    }
);

usci_block!(
    /// USCI_A1 (UART)
    UsciA1,
    Module::A,
    Layout {
        ctl0: 0xD0,
        ctl1: 0xD1,
        br0: 0xD2,
        br1: 0xD3,
        mctl: 0xD4,
        i2cie: 0,
        stat: 0xD5,
        rxbuf: 0xD6,
        txbuf: 0xD7,
        i2coa: 0,
        i2csa: 0,
        ie: 0x06,
        ifg: 0x07,
    }
);

usci_block!(
    /// USCI_B1 (I2C)
    UsciB1,
    Module::B,
    Layout {
        ctl0: 0xD8,
        ctl1: 0xD9,
        br0: 0xDA,
        br1: 0xDB,
        mctl: 0,
        i2cie: 0xDC,
        stat: 0xDD,
        rxbuf: 0xDE,
        txbuf: 0xDF,
        i2coa: 0x17C,
        i2csa: 0x17E,
        ie: 0x06,
        ifg: 0x07,
    }
);
