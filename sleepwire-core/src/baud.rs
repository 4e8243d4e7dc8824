//! Baud-rate generator arithmetic
//!
//! The USCI baud generator divides the clock by a 16-bit integer divisor
//! and spreads the fractional part over eight bit periods with a
//! modulation pattern (UCBRSx). The modulation value is the fraction
//! scaled by eight, rounded on the first decimal digit of the residue:
//!
//! ```text
//! divisor   = clock / speed
//! remainder = clock - divisor * speed
//! frac_x8   = remainder * 8 / speed
//! residual  = (remainder * 8 - frac_x8 * speed) * 10 / speed
//! UCBRSx    = frac_x8      if residual < 5
//!             frac_x8 + 1  otherwise
//! MCTL      = UCBRSx << 1
//! ```
//!
//! All intermediates are computed in 64 bits so high bit rates on fast
//! clocks do not wrap.

/// Errors from baud-rate computation
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum BaudError {
    /// Requested speed is zero
    ZeroSpeed,
    /// Clock is slower than the requested speed, or so fast the divisor
    /// does not fit in 16 bits
    DivisorOutOfRange,
}

/// Baud generator register values
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct BaudRate {
    /// Integer clock divisor
    pub divisor: u16,
    /// Clock cycles left over per second after integer division
    pub remainder: u32,
    /// Modulation in register encoding (UCBRSx already shifted left by one)
    pub modulation: u8,
}

impl BaudRate {
    /// Compute divisor, remainder and modulation for a clock and bit rate
    pub const fn compute(clock_hz: u32, speed: u32) -> Result<Self, BaudError> {
        if speed == 0 {
            return Err(BaudError::ZeroSpeed);
        }

        let divisor = clock_hz / speed;
        if divisor == 0 || divisor > u16::MAX as u32 {
            return Err(BaudError::DivisorOutOfRange);
        }

        let remainder = clock_hz - divisor * speed;
        let speed_wide = speed as u64;
        let frac_num_x8 = remainder as u64 * 8;
        let frac_x8 = frac_num_x8 / speed_wide;
        let residual = ((frac_num_x8 - frac_x8 * speed_wide) * 10) / speed_wide;

        let brs = if residual < 5 { frac_x8 } else { frac_x8 + 1 };

        Ok(Self {
            divisor: divisor as u16,
            remainder,
            modulation: (brs << 1) as u8,
        })
    }

    /// Low byte of the divisor (UCxBR0)
    pub const fn br0(&self) -> u8 {
        (self.divisor & 0x00FF) as u8
    }

    /// High byte of the divisor (UCxBR1)
    pub const fn br1(&self) -> u8 {
        (self.divisor >> 8) as u8
    }

    /// Modulation control register value (UCAxMCTL)
    pub const fn mctl(&self) -> u8 {
        self.modulation
    }

    /// Second-stage modulation count (UCBRSx, unshifted)
    pub const fn brs(&self) -> u8 {
        self.modulation >> 1
    }
}
