//! USCI register map for the sleepwire serial drivers
//!
//! The Universal Serial Communication Interface comes in pairs: a USCI_A
//! block (UART/SPI) and a USCI_B block (SPI/I2C) that share one interrupt
//! enable register, one interrupt flag register and two interrupt vectors.
//! This crate provides:
//!
//! - [`bits`] - Control/status bit constants
//! - [`UsciRegisters`] - Register access trait the drivers are generic over
//! - [`mmio`] - Memory-mapped blocks for USCI_A0/B0/A1/B1
//!
//! # Features
//!
//! - `defmt` - Enable debug formatting support

#![no_std]

pub mod bits;
pub mod mmio;
pub mod registers;

pub use mmio::{UsciA0, UsciA1, UsciB0, UsciB1};
pub use registers::{Module, Reg, UsciRegisters};
