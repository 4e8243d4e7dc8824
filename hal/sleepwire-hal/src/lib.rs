//! Sleepwire Hardware Abstraction Layer
//!
//! This crate defines the collaborators the serial drivers lean on but do
//! not own: digital lines, clock sources, free-running counters and timeout
//! guards, plus the serial traits the drivers expose to applications.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────┐
//! │  Application                            │
//! └─────────────────────────────────────────┘
//!                     │
//!                     ▼
//! ┌─────────────────────────────────────────┐
//! │  sleepwire-drivers (UART, I2C, soft)    │
//! └─────────────────────────────────────────┘
//!          │                      │
//!          ▼                      ▼
//! ┌─────────────────┐   ┌───────────────────┐
//! │ sleepwire-core  │   │ sleepwire-hal-usci│
//! └─────────────────┘   └───────────────────┘
//!          │                      │
//!          └──────────┬───────────┘
//!                     ▼
//! ┌─────────────────────────────────────────┐
//! │  sleepwire-hal (this crate - traits)    │
//! └─────────────────────────────────────────┘
//! ```
//!
//! # Traits
//!
//! - [`gpio::OutputPin`], [`gpio::InputPin`] - Software-driven lines
//! - [`clock::ClockSource`] - Frequency, type tag and claim/release
//! - [`counter::FreeRunningCounter`] - Time base for bit-banging
//! - [`timeout::TimeoutGuard`] - Bounded waits
//! - [`uart::UartTx`], [`uart::UartRx`] - Serial communication
//! - [`i2c::I2cBus`] - I2C bus operations

#![no_std]
#![deny(unsafe_code)]

pub mod clock;
pub mod counter;
pub mod gpio;
pub mod i2c;
pub mod timeout;
pub mod uart;

// Re-export key traits at crate root for convenience
pub use clock::{ClockClaim, ClockSource, ClockType};
pub use counter::FreeRunningCounter;
pub use gpio::{InputPin, OutputPin};
pub use i2c::{I2cBus, I2cConfig, I2cRole};
pub use timeout::{Never, TimeoutGuard};
pub use uart::{SoftUartConfig, UartConfig, UartRx, UartStatus, UartTx};
