//! Transfer session shared between a driver and its interrupt handler
//!
//! A session is loaded by the foreground call, drained or filled by the
//! interrupt handler one byte at a time, and completed exactly once: when
//! the byte count runs out, when the protocol says so (`finish`), or when
//! the foreground gives up (`abort`). Once complete the buffer is frozen.

use core::cell::RefCell;

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::blocking_mutex::Mutex;
use heapless::Vec;

/// Transfer direction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Direction {
    /// Bytes flow from the buffer to the peripheral
    Send,
    /// Bytes flow from the peripheral into the buffer
    Receive,
}

/// Requested length does not fit in the session buffer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct CapacityExceeded {
    pub requested: usize,
    pub capacity: usize,
}

/// One in-flight transfer
#[derive(Debug)]
pub struct TransferSession<const N: usize> {
    direction: Direction,
    buffer: Vec<u8, N>,
    cursor: usize,
    total: usize,
    remaining: usize,
    complete: bool,
    aborted: bool,
}

impl<const N: usize> Default for TransferSession<N> {
    fn default() -> Self {
        Self::new()
    }
}

impl<const N: usize> TransferSession<N> {
    /// An idle session
    ///
    /// Idle sessions count as complete, so an interrupt that fires with no
    /// transfer loaded finds nothing to do.
    pub const fn new() -> Self {
        Self {
            direction: Direction::Send,
            buffer: Vec::new(),
            cursor: 0,
            total: 0,
            remaining: 0,
            complete: true,
            aborted: false,
        }
    }

    /// Session buffer capacity
    pub const fn capacity(&self) -> usize {
        N
    }

    /// Load bytes to send
    ///
    /// An empty slice loads a session with nothing left to send; it stays
    /// active until the protocol finishes it.
    pub fn begin_send(&mut self, data: &[u8]) -> Result<(), CapacityExceeded> {
        if data.len() > N {
            return Err(CapacityExceeded {
                requested: data.len(),
                capacity: N,
            });
        }
        self.buffer.clear();
        // Length checked above
        let _ = self.buffer.extend_from_slice(data);
        self.start(Direction::Send, data.len());
        Ok(())
    }

    /// Prepare to receive `len` bytes
    pub fn begin_receive(&mut self, len: usize) -> Result<(), CapacityExceeded> {
        if len > N {
            return Err(CapacityExceeded {
                requested: len,
                capacity: N,
            });
        }
        self.buffer.clear();
        self.start(Direction::Receive, len);
        Ok(())
    }

    fn start(&mut self, direction: Direction, len: usize) {
        self.direction = direction;
        self.cursor = 0;
        self.total = len;
        self.remaining = len;
        self.complete = false;
        self.aborted = false;
    }

    /// Take the next byte to send
    ///
    /// Counts the byte as transferred. Returns `None` when nothing is left,
    /// when the session is complete, or for a receive session.
    pub fn take_next(&mut self) -> Option<u8> {
        if !self.is_active() || self.direction != Direction::Send || self.remaining == 0 {
            return None;
        }
        let byte = self.buffer.get(self.cursor).copied()?;
        self.cursor += 1;
        self.remaining -= 1;
        Some(byte)
    }

    /// Store a received byte
    ///
    /// Completes the session when the last expected byte arrives. Returns
    /// `false` and drops the byte if the session does not expect one.
    pub fn push(&mut self, byte: u8) -> bool {
        if !self.is_active() || self.direction != Direction::Receive || self.remaining == 0 {
            return false;
        }
        if self.buffer.push(byte).is_err() {
            return false;
        }
        self.remaining -= 1;
        if self.remaining == 0 {
            self.complete = true;
        }
        true
    }

    /// Complete the session normally
    ///
    /// Returns `false` if it was already complete.
    pub fn finish(&mut self) -> bool {
        if self.complete {
            return false;
        }
        self.complete = true;
        true
    }

    /// Complete the session because the transfer was given up
    ///
    /// Returns `false` if it was already complete.
    pub fn abort(&mut self) -> bool {
        if self.complete {
            return false;
        }
        self.complete = true;
        self.aborted = true;
        true
    }

    /// Start an active session over from its first byte
    ///
    /// Used when the peer rejects a transfer that is then retried: bytes
    /// already taken are sent again, bytes already received are dropped.
    /// Returns `false` and does nothing once the session is complete.
    pub fn rewind(&mut self) -> bool {
        if !self.is_active() {
            return false;
        }
        self.cursor = 0;
        self.remaining = self.total;
        if self.direction == Direction::Receive {
            self.buffer.clear();
        }
        true
    }

    /// Back to idle, forgetting any data
    pub fn reset(&mut self) {
        *self = Self::new();
    }

    /// Loaded and not yet complete
    pub fn is_active(&self) -> bool {
        !self.complete
    }

    pub fn is_complete(&self) -> bool {
        self.complete
    }

    pub fn is_aborted(&self) -> bool {
        self.aborted
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    /// Bytes still to move
    pub fn remaining(&self) -> usize {
        self.remaining
    }

    /// Bytes already moved
    pub fn transferred(&self) -> usize {
        self.total - self.remaining
    }

    /// Bytes received so far
    pub fn received(&self) -> &[u8] {
        match self.direction {
            Direction::Receive => self.buffer.as_slice(),
            Direction::Send => &[],
        }
    }
}

/// State shared with an interrupt handler
///
/// Every access runs inside a critical section, so the handler never sees
/// a half-updated value and the foreground never races the handler.
pub struct IrqCell<T> {
    inner: Mutex<CriticalSectionRawMutex, RefCell<T>>,
}

impl<T> IrqCell<T> {
    pub const fn new(value: T) -> Self {
        Self {
            inner: Mutex::new(RefCell::new(value)),
        }
    }

    /// Run `f` with exclusive access
    ///
    /// `f` must not lock the same cell again.
    pub fn lock<R>(&self, f: impl FnOnce(&mut T) -> R) -> R {
        self.inner.lock(|cell| f(&mut cell.borrow_mut()))
    }
}
