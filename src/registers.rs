//! Register map definitions for the AS7263 and AS7265x sensors.
//!
//! Only [`PHYSICAL_REGISTERS`] is reachable through native bus addressing. All
//! `VREG_*` addresses live in the virtual register file behind the handshake.
#![allow(unused_parens)]

use modular_bitfield::prelude::*;

use crate::params::{As7263Gain, As7265xGain, BulbCurrent, BulbSelect};

/// Physical register address of `STATUS`.
pub const REG_STATUS: u8 = 0x00;
/// Physical register address of `WRITE`.
pub const REG_WRITE: u8 = 0x01;
/// Physical register address of `READ`.
pub const REG_READ: u8 = 0x02;

/// Addresses of the three physical registers backing the virtual register file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct RegisterMap {
    /// Status register (`TX_VALID` / `RX_VALID` flags).
    pub status: u8,
    /// Write register, receives virtual addresses and values.
    pub write: u8,
    /// Read register, holds the byte of the last requested virtual address.
    pub read: u8,
}

/// Physical register map shared by both device families.
pub const PHYSICAL_REGISTERS: RegisterMap = RegisterMap {
    status: REG_STATUS,
    write: REG_WRITE,
    read: REG_READ,
};

// ----------------------------------------------------------------------
// AS7263 virtual registers
// ----------------------------------------------------------------------

/// Virtual address of the AS7263 `DEVICE_TYPE` register.
pub const AS7263_VREG_DEVICE_TYPE: u8 = 0x00;
/// Virtual address of the AS7263 `HW_VERSION` register.
pub const AS7263_VREG_HW_VERSION: u8 = 0x01;
/// Virtual address of the AS7263 `CONTROL_SETUP` register.
pub const AS7263_VREG_CONTROL_SETUP: u8 = 0x04;
/// Virtual address of the AS7263 `INT_T` (integration time) register.
pub const AS7263_VREG_INT_T: u8 = 0x05;
/// Virtual address of the AS7263 `DEVICE_TEMP` register.
pub const AS7263_VREG_TEMPERATURE: u8 = 0x06;
/// Virtual address of the AS7263 `LED_CONTROL` register.
pub const AS7263_VREG_LED_CONTROL: u8 = 0x07;
/// Virtual address of the first AS7263 channel count (R, low byte).
pub const AS7263_VREG_R_DATA: u8 = 0x08;

/// Expected `DEVICE_TYPE` value of an AS7263.
pub const AS7263_EXPECTED_DEVICE_TYPE: u8 = 0x3E;

// ----------------------------------------------------------------------
// AS7265x virtual registers
// ----------------------------------------------------------------------

/// Virtual address of the AS7265x `HW_VERSION` register.
pub const AS7265X_VREG_HW_VERSION: u8 = 0x01;
/// Virtual address of the AS7265x `FW_VERSION_H` register.
pub const AS7265X_VREG_FW_VERSION_H: u8 = 0x02;
/// Virtual address of the AS7265x `FW_VERSION_L` register.
pub const AS7265X_VREG_FW_VERSION_L: u8 = 0x03;
/// Virtual address of the AS7265x `CONFIG` register.
pub const AS7265X_VREG_CONFIG: u8 = 0x04;
/// Virtual address of the AS7265x `INTEG_TIME` register.
pub const AS7265X_VREG_INTEG_TIME: u8 = 0x05;
/// Virtual address of the AS7265x `DEVICE_TEMP` register.
pub const AS7265X_VREG_DEVICE_TEMP: u8 = 0x06;
/// Virtual address of the AS7265x `LED_CONFIG` register.
pub const AS7265X_VREG_LED_CONFIG: u8 = 0x07;
/// Virtual address of the first channel count of every bank (low byte).
pub const AS7265X_VREG_DATA: u8 = 0x08;
/// Virtual address of the AS7265x `DEV_SEL` register, shared by all banks.
pub const AS7265X_VREG_DEV_SELECT: u8 = 0x4F;

/// Number of co-packaged chips reachable through bank selection.
pub const AS7265X_BANK_COUNT: u8 = 3;
/// Channels served by each AS7265x bank.
pub const AS7265X_CHANNELS_PER_BANK: u8 = 6;

/// Virtual register backed by a one-byte bitfield type.
pub trait Register: Copy + From<u8> + Into<u8> {
    /// Virtual address of the register.
    const ADDRESS: u8;
}

/// Bitfield representation of the physical `STATUS` register (address `0x00`).
#[allow(unused_parens)]
#[bitfield]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Status {
    // Read buffer full: the `READ` register holds fresh data (bit 0).
    pub rx_valid: bool,
    // Write buffer busy: the last byte written to `WRITE` is not consumed yet (bit 1).
    pub tx_valid: bool,
    #[skip]
    __: B6,
}

impl From<u8> for Status {
    fn from(value: u8) -> Self {
        Self::from_bytes([value])
    }
}

impl From<Status> for u8 {
    fn from(value: Status) -> Self {
        value.into_bytes()[0]
    }
}

/// Bitfield representation of the AS7263 `CONTROL_SETUP` register (virtual `0x04`).
#[allow(unused_parens)]
#[bitfield]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ControlSetup {
    // One-shot measurement trigger (bit 0).
    pub one_shot: bool,
    // Data ready flag; also the bit written by the measurement mode setter (bit 1).
    pub data_ready: bool,
    #[skip]
    __: B2,
    // Gain selection (bits 5:4).
    pub gain: As7263Gain,
    #[skip]
    __: B2,
}

impl From<u8> for ControlSetup {
    fn from(value: u8) -> Self {
        Self::from_bytes([value])
    }
}

impl From<ControlSetup> for u8 {
    fn from(value: ControlSetup) -> Self {
        value.into_bytes()[0]
    }
}

/// Bitfield representation of the AS7263 `LED_CONTROL` register (virtual `0x07`).
#[allow(unused_parens)]
#[bitfield]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LedControl {
    // Bulb drive level, zero keeps the bulb dark (bits 1:0).
    pub level: B2,
    #[skip]
    __: B6,
}

impl From<u8> for LedControl {
    fn from(value: u8) -> Self {
        Self::from_bytes([value])
    }
}

impl From<LedControl> for u8 {
    fn from(value: LedControl) -> Self {
        value.into_bytes()[0]
    }
}

/// Bitfield representation of the AS7265x `CONFIG` register (virtual `0x04`).
#[allow(unused_parens)]
#[bitfield]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConfigRegister {
    // Measurement trigger (bit 0).
    pub trigger: bool,
    // Conversion in progress; cleared once data is ready (bit 1).
    pub busy: bool,
    #[skip]
    __: B2,
    // Gain selection shared by all three chips (bits 5:4).
    pub gain: As7265xGain,
    #[skip]
    __: B2,
}

impl From<u8> for ConfigRegister {
    fn from(value: u8) -> Self {
        Self::from_bytes([value])
    }
}

impl From<ConfigRegister> for u8 {
    fn from(value: ConfigRegister) -> Self {
        value.into_bytes()[0]
    }
}

/// Bitfield representation of the AS7265x `LED_CONFIG` register (virtual `0x07`).
#[allow(unused_parens)]
#[bitfield]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LedConfig {
    // White bulb drive current (bits 1:0).
    pub white_current: BulbCurrent,
    // IR bulb drive current (bits 3:2).
    pub ir_current: BulbCurrent,
    // UV bulb drive current (bits 5:4).
    pub uv_current: BulbCurrent,
    // Active bulb selection (bits 7:6).
    pub bulb: BulbSelect,
}

impl From<u8> for LedConfig {
    fn from(value: u8) -> Self {
        Self::from_bytes([value])
    }
}

impl From<LedConfig> for u8 {
    fn from(value: LedConfig) -> Self {
        value.into_bytes()[0]
    }
}

impl Register for ControlSetup {
    const ADDRESS: u8 = AS7263_VREG_CONTROL_SETUP;
}

impl Register for LedControl {
    const ADDRESS: u8 = AS7263_VREG_LED_CONTROL;
}

impl Register for ConfigRegister {
    const ADDRESS: u8 = AS7265X_VREG_CONFIG;
}

impl Register for LedConfig {
    const ADDRESS: u8 = AS7265X_VREG_LED_CONFIG;
}

/// Resolves an AS7263 channel index to the virtual address of its low byte.
pub const fn as7263_channel_register(index: u8) -> Option<u8> {
    if index < 6 {
        Some(AS7263_VREG_R_DATA + index * 2)
    } else {
        None
    }
}

/// Resolves an AS7265x channel index to its `(bank, register)` pair.
pub const fn as7265x_channel_location(index: u8) -> Option<(u8, u8)> {
    if index >= AS7265X_BANK_COUNT * AS7265X_CHANNELS_PER_BANK {
        return None;
    }

    let bank = index / AS7265X_CHANNELS_PER_BANK;
    let offset = index % AS7265X_CHANNELS_PER_BANK;
    Some((bank, AS7265X_VREG_DATA + offset * 2))
}
