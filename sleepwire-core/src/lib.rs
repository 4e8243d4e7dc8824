//! Board-agnostic core of the sleepwire serial drivers
//!
//! This crate contains everything the drivers share that does not depend on
//! a particular peripheral:
//!
//! - Baud-rate generator arithmetic
//! - Transfer session state and the cell that shares it with interrupts
//! - Clock domain hold counting
//! - Countdown timeout guards
//! - CPU sleep/wake primitives
//! - Interrupt vector dispatch

#![no_std]
#![deny(unsafe_code)]

pub mod baud;
pub mod clock;
pub mod dispatch;
pub mod idle;
pub mod session;
pub mod timeout;

pub use baud::{BaudError, BaudRate};
pub use clock::ClockDomain;
pub use dispatch::{DispatchError, SerialInterrupt, Vector, VectorTable};
pub use idle::{Idle, SpinIdle, WakeSignal};
pub use session::{CapacityExceeded, Direction, IrqCell, TransferSession};
pub use timeout::Countdown;

#[cfg(feature = "cortex-m")]
pub use idle::WfiIdle;
