//! Host-side hardware models for driver tests

pub mod line;
pub mod usci;

use core::cell::Cell;

use sleepwire_core::{Countdown, Idle, Vector, VectorTable};

pub use usci::{I2cEvent, SimUsci};

/// Sleeping foreground
///
/// Each "sleep" advances the hardware one step, advances the optional
/// countdown one tick and then runs the shared vectors until nothing is
/// pending, the way the CPU would be woken by the interrupt.
pub struct SimIdle<'a, 't> {
    sim: &'a SimUsci,
    table: &'a VectorTable<'t, 2>,
    countdown: Option<&'a Countdown>,
    sleeps: &'a Cell<u32>,
}

impl<'a, 't> SimIdle<'a, 't> {
    pub fn new(sim: &'a SimUsci, table: &'a VectorTable<'t, 2>, sleeps: &'a Cell<u32>) -> Self {
        Self {
            sim,
            table,
            countdown: None,
            sleeps,
        }
    }

    pub fn with_countdown(mut self, countdown: &'a Countdown) -> Self {
        self.countdown = Some(countdown);
        self
    }
}

impl Idle for SimIdle<'_, '_> {
    fn idle_while<F: FnMut() -> bool>(&mut self, mut keep_sleeping: F) {
        while keep_sleeping() {
            self.sleeps.set(self.sleeps.get() + 1);
            assert!(self.sleeps.get() < 100_000, "simulation never woke");

            self.sim.tick();
            if let Some(countdown) = self.countdown {
                countdown.count_down();
            }

            for _ in 0..16 {
                let tx = self.sim.tx_vector_pending();
                let rx = self.sim.rx_vector_pending();
                if !tx && !rx {
                    break;
                }
                if tx {
                    self.table.on_vector(Vector::Tx);
                }
                if rx {
                    self.table.on_vector(Vector::Rx);
                }
            }
        }
    }
}
