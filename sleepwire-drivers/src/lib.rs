//! Serial drivers
//!
//! Concrete implementations of the sleepwire-hal traits:
//!
//! - [`SoftUart`]: bit-banged 8N1 UART on two GPIO pins and a free-running
//!   counter, fully blocking
//! - [`UsciUart`]: USCI_A UART driven by its TX/RX interrupts, the CPU
//!   sleeping while bytes move
//! - [`I2cMaster`]: USCI_B I2C master, interrupt-driven with a polled
//!   fallback
//!
//! The interrupt halves ([`UsciUartIrq`], [`I2cIrq`]) are registered in a
//! [`VectorTable`](sleepwire_core::VectorTable) that the board's shared
//! USCI vectors call into.

#![no_std]
#![deny(unsafe_code)]

#[macro_use]
mod fmt;

pub mod error;
pub mod soft_uart;
pub mod usci_i2c;
pub mod usci_uart;

#[cfg(test)]
mod sim;

pub use error::{I2cError, UartError};
pub use soft_uart::SoftUart;
pub use usci_i2c::{I2cIrq, I2cMaster, I2cShared, Transfer};
pub use usci_uart::{UartShared, UsciUart, UsciUartIrq};
