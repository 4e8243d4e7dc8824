//! Bit-level serial line model
//!
//! Time is a tick count. Every counter read and every RX pin read costs one
//! tick, so polling loops make progress without a real clock. Writes to the
//! TX pin are recorded with their timestamp; the RX pin plays back a list
//! of level changes.

use core::cell::{Cell, RefCell};

use heapless::Vec;
use sleepwire_hal::{FreeRunningCounter, InputPin, OutputPin, TimeoutGuard};

const EDGES: usize = 4096;

/// A pin write or a level change
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Edge {
    pub at: u32,
    pub high: bool,
}

pub struct SimLine {
    now: Cell<u32>,
    frequency: u32,
    tx: RefCell<Vec<Edge, EDGES>>,
    tx_level: Cell<bool>,
    rx: RefCell<Vec<Edge, EDGES>>,
    rx_cursor: Cell<usize>,
    rx_level: Cell<bool>,
}

impl SimLine {
    pub fn new(start: u32, frequency: u32) -> Self {
        Self {
            now: Cell::new(start),
            frequency,
            tx: RefCell::new(Vec::new()),
            tx_level: Cell::new(true),
            rx: RefCell::new(Vec::new()),
            rx_cursor: Cell::new(0),
            rx_level: Cell::new(true),
        }
    }

    pub fn now(&self) -> u32 {
        self.now.get()
    }

    pub fn advance(&self, ticks: u32) {
        self.now.set(self.now.get() + ticks);
    }

    pub fn counter(&self) -> SimCounter<'_> {
        SimCounter { line: self }
    }

    pub fn tx_pin(&self) -> SimTxPin<'_> {
        SimTxPin { line: self }
    }

    pub fn rx_pin(&self) -> SimRxPin<'_> {
        SimRxPin { line: self }
    }

    /// Every TX pin write so far
    pub fn tx_edges(&self) -> Vec<Edge, EDGES> {
        self.tx.borrow().clone()
    }

    pub fn tx_levels(&self) -> Vec<bool, EDGES> {
        self.tx.borrow().iter().map(|e| e.high).collect()
    }

    /// Schedule a level change on RX
    ///
    /// Changes must be scheduled in time order.
    pub fn drive(&self, at: u32, high: bool) {
        self.rx
            .borrow_mut()
            .push(Edge { at, high })
            .expect("rx waveform full");
    }

    /// Schedule a complete 8N1 frame starting at `at`
    pub fn drive_frame(&self, at: u32, byte: u8, bit_time: u32, stop_high: bool) {
        self.drive(at, false);
        for bit in 0..8 {
            self.drive(at + bit_time * (bit + 1), (byte >> bit) & 1 != 0);
        }
        self.drive(at + bit_time * 9, stop_high);
        if !stop_high {
            self.drive(at + bit_time * 10, true);
        }
    }

    /// Schedule a low pulse of `width` ticks
    pub fn drive_pulse(&self, at: u32, width: u32) {
        self.drive(at, false);
        self.drive(at + width, true);
    }

    /// Replay recorded edges on RX, `lead` ticks from now
    pub fn play(&self, edges: &[Edge], lead: u32) {
        let Some(first) = edges.first() else {
            return;
        };
        let base = self.now() + lead;
        for edge in edges {
            self.drive(base + (edge.at - first.at), edge.high);
        }
    }

    fn tick(&self) -> u32 {
        let now = self.now.get();
        self.now.set(now + 1);
        now
    }

    fn rx_level_at(&self, now: u32) -> bool {
        let rx = self.rx.borrow();
        let mut cursor = self.rx_cursor.get();
        while let Some(edge) = rx.get(cursor) {
            if edge.at > now {
                break;
            }
            self.rx_level.set(edge.high);
            cursor += 1;
        }
        self.rx_cursor.set(cursor);
        self.rx_level.get()
    }
}

pub struct SimCounter<'a> {
    line: &'a SimLine,
}

impl FreeRunningCounter for SimCounter<'_> {
    fn frequency(&self) -> u32 {
        self.line.frequency
    }

    fn counter(&self) -> u16 {
        self.line.tick() as u16
    }
}

pub struct SimTxPin<'a> {
    line: &'a SimLine,
}

impl OutputPin for SimTxPin<'_> {
    fn set_high(&mut self) {
        self.record(true);
    }

    fn set_low(&mut self) {
        self.record(false);
    }

    fn is_set_high(&self) -> bool {
        self.line.tx_level.get()
    }
}

impl SimTxPin<'_> {
    fn record(&self, high: bool) {
        self.line.tx_level.set(high);
        self.line
            .tx
            .borrow_mut()
            .push(Edge {
                at: self.line.now(),
                high,
            })
            .expect("tx log full");
    }
}

pub struct SimRxPin<'a> {
    line: &'a SimLine,
}

impl InputPin for SimRxPin<'_> {
    fn is_high(&mut self) -> bool {
        let now = self.line.tick();
        self.line.rx_level_at(now)
    }
}

/// Triggers once the line reaches a point in time
pub struct Deadline<'a> {
    line: &'a SimLine,
    at: u32,
}

impl<'a> Deadline<'a> {
    pub fn new(line: &'a SimLine, at: u32) -> Self {
        Self { line, at }
    }
}

impl TimeoutGuard for Deadline<'_> {
    fn triggered(&self) -> bool {
        self.line.now() >= self.at
    }
}
