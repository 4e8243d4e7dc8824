//! USCI control and status bits

/// UCxCTL0 bits (I2C mode)
pub mod ctl0 {
    /// Master mode select
    pub const UCMST: u8 = 0x08;
    /// I2C mode
    pub const UCMODE_3: u8 = 0x06;
    /// Synchronous mode
    pub const UCSYNC: u8 = 0x01;
}

/// UCxCTL1 bits
pub mod ctl1 {
    /// Clock source: ACLK
    pub const UCSSEL_1: u8 = 0x40;
    /// Clock source: SMCLK
    pub const UCSSEL_2: u8 = 0x80;
    /// Transmitter/receiver select (I2C)
    pub const UCTR: u8 = 0x10;
    /// Transmit STOP condition
    pub const UCTXSTP: u8 = 0x04;
    /// Transmit START condition
    pub const UCTXSTT: u8 = 0x02;
    /// Software reset enable
    pub const UCSWRST: u8 = 0x01;
}

/// UCAxSTAT bits (UART mode)
pub mod uart_stat {
    /// Framing error
    pub const UCFE: u8 = 0x40;
    /// Overrun error
    pub const UCOE: u8 = 0x20;
    /// Parity error
    pub const UCPE: u8 = 0x10;
    /// Break detect
    pub const UCBRK: u8 = 0x08;
    /// Receive error
    pub const UCRXERR: u8 = 0x04;
    /// Transmit or receive operation in progress
    pub const UCBUSY: u8 = 0x01;
}

/// UCBxSTAT bits (I2C mode)
pub mod i2c_stat {
    /// SCL held low
    pub const UCSCLLOW: u8 = 0x40;
    /// General call address received
    pub const UCGC: u8 = 0x20;
    /// Bus busy
    pub const UCBBUSY: u8 = 0x10;
    /// Not-acknowledge received
    pub const UCNACKIFG: u8 = 0x08;
    /// STOP condition detected (slave)
    pub const UCSTPIFG: u8 = 0x04;
    /// START condition detected (slave)
    pub const UCSTTIFG: u8 = 0x02;
    /// Arbitration lost
    pub const UCALIFG: u8 = 0x01;
}

/// UCBxI2CIE bits
pub mod i2c_ie {
    /// Not-acknowledge interrupt enable
    pub const UCNACKIE: u8 = 0x08;
    /// STOP interrupt enable
    pub const UCSTPIE: u8 = 0x04;
    /// START interrupt enable
    pub const UCSTTIE: u8 = 0x02;
    /// Arbitration lost interrupt enable
    pub const UCALIE: u8 = 0x01;
}

/// Shared IE/IFG register bits
///
/// One register pair serves both blocks of a USCI instance; each block owns
/// two bits.
pub mod irq {
    /// USCI_A receive
    pub const UCARXIFG: u8 = 0x01;
    /// USCI_A transmit
    pub const UCATXIFG: u8 = 0x02;
    /// USCI_B receive
    pub const UCBRXIFG: u8 = 0x04;
    /// USCI_B transmit
    pub const UCBTXIFG: u8 = 0x08;
}

/// UCAxMCTL fields
///
/// Only the second modulation stage is used; oversampling stays off.
pub mod mctl {
    /// Second modulation stage field (already shifted)
    pub const UCBRS_MASK: u8 = 0x0E;
}
