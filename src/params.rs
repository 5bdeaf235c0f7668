//! Strongly typed parameter enumerations for the AS726x drivers.
//!
//! These enums map directly to the register field encodings used by
//! [`registers`](crate::registers) and the device facades. Prefer them over
//! raw integers to keep configuration values valid and explicit.
//!
//! # Examples
//!
//! ```rust
//! use as726x::params::{As7265xChannel, As7265xGain, BulbType};
//!
//! let gain = As7265xGain::X16;
//! let bulb = BulbType::Uv;
//! assert_eq!(As7265xChannel::I.index(), 8);
//! assert_eq!(As7265xChannel::I.wavelength_nm(), 610);
//! let _ = (gain, bulb);
//! ```

use modular_bitfield::prelude::Specifier;

/// Duration of one integration time tick, in microseconds.
pub const INTEGRATION_TICK_US: u32 = 2_800;

/// Returns the integration period programmed by `value` ticks, in microseconds.
pub const fn integration_time_us(value: u8) -> u32 {
    value as u32 * INTEGRATION_TICK_US
}

/// Gain selections of the AS7263 (`CONTROL_SETUP[5:4]`).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Specifier)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
#[bits = 2]
pub enum As7263Gain {
    /// 1x gain.
    X1 = 0b00,
    /// 3.7x gain.
    X3_7 = 0b01,
    /// 16x gain.
    X16 = 0b10,
    /// 64x gain.
    X64 = 0b11,
}

impl Default for As7263Gain {
    fn default() -> Self {
        Self::X1
    }
}

/// Gain selections of the AS7265x (`CONFIG[5:4]`), applied to all three chips.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Specifier)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
#[bits = 2]
pub enum As7265xGain {
    /// 1x gain.
    X1 = 0b00,
    /// 4x gain.
    X4 = 0b01,
    /// 16x gain.
    X16 = 0b10,
    /// 64x gain.
    X64 = 0b11,
}

impl Default for As7265xGain {
    fn default() -> Self {
        Self::X1
    }
}

/// Measurement modes of the AS7263.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum MeasurementMode {
    /// Free-running sampling (clears `CONTROL_SETUP[1]`).
    Continuous,
    /// Trigger-per-measurement sampling (sets `CONTROL_SETUP[1]`).
    OneShot,
}

/// Bulb drive current encoded in the AS7265x `LED_CONFIG` current fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Specifier)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
#[bits = 2]
pub enum BulbCurrent {
    /// 12.5 mA.
    Ma12_5 = 0b00,
    /// 25 mA.
    Ma25 = 0b01,
    /// 50 mA.
    Ma50 = 0b10,
    /// 100 mA.
    Ma100 = 0b11,
}

impl BulbCurrent {
    /// Maps a raw level to a current, clamping anything above 3 to [`BulbCurrent::Ma100`].
    pub const fn from_level(level: u8) -> Self {
        match level {
            0 => Self::Ma12_5,
            1 => Self::Ma25,
            2 => Self::Ma50,
            _ => Self::Ma100,
        }
    }
}

/// Bulb selection field of the AS7265x `LED_CONFIG[7:6]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Specifier)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
#[bits = 2]
pub enum BulbSelect {
    /// All bulbs off.
    Off = 0b00,
    /// White bulb on.
    White = 0b01,
    /// UV bulb on.
    Uv = 0b10,
    /// IR bulb on.
    Ir = 0b11,
}

/// Bulb types of the AS7265x module.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum BulbType {
    /// White LED.
    #[default]
    White,
    /// Ultraviolet LED.
    Uv,
    /// Infrared LED.
    Ir,
}

impl From<BulbType> for BulbSelect {
    fn from(value: BulbType) -> Self {
        match value {
            BulbType::White => Self::White,
            BulbType::Uv => Self::Uv,
            BulbType::Ir => Self::Ir,
        }
    }
}

/// The three chips of the AS7265x module, by bank index.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum Bank {
    /// Channels A to F.
    Uv = 0,
    /// Channels G to L.
    Visible = 1,
    /// Channels M to R.
    Nir = 2,
}

impl From<Bank> for u8 {
    fn from(value: Bank) -> Self {
        value as u8
    }
}

/// Channels of the AS7263, in index order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum As7263Channel {
    /// 610 nm.
    R = 0,
    /// 680 nm.
    S = 1,
    /// 730 nm.
    T = 2,
    /// 760 nm.
    U = 3,
    /// 810 nm.
    V = 4,
    /// 860 nm.
    W = 5,
}

impl As7263Channel {
    /// All channels in index order.
    pub const ALL: [Self; 6] = [Self::R, Self::S, Self::T, Self::U, Self::V, Self::W];

    /// Returns the channel index.
    pub const fn index(self) -> u8 {
        self as u8
    }

    /// Returns the single-letter channel label.
    pub const fn label(self) -> char {
        (b'R' + self as u8) as char
    }

    /// Returns the nominal center wavelength in nanometres.
    pub const fn wavelength_nm(self) -> u16 {
        match self {
            Self::R => 610,
            Self::S => 680,
            Self::T => 730,
            Self::U => 760,
            Self::V => 810,
            Self::W => 860,
        }
    }
}

/// Channels of the AS7265x, in index order.
///
/// Labels M to R are the module's own names for the NIR chip. The AS7263
/// compatible names are available through [`As7265xChannel::as7263_alias`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[repr(u8)]
pub enum As7265xChannel {
    /// 410 nm.
    A = 0,
    /// 435 nm.
    B = 1,
    /// 460 nm.
    C = 2,
    /// 485 nm.
    D = 3,
    /// 510 nm.
    E = 4,
    /// 535 nm.
    F = 5,
    /// 560 nm.
    G = 6,
    /// 585 nm.
    H = 7,
    /// 610 nm.
    I = 8,
    /// 645 nm.
    J = 9,
    /// 680 nm.
    K = 10,
    /// 705 nm.
    L = 11,
    /// 730 nm.
    M = 12,
    /// 760 nm.
    N = 13,
    /// 810 nm.
    O = 14,
    /// 860 nm.
    P = 15,
    /// 900 nm.
    Q = 16,
    /// 940 nm.
    R = 17,
}

impl As7265xChannel {
    /// All channels in index order.
    pub const ALL: [Self; 18] = [
        Self::A,
        Self::B,
        Self::C,
        Self::D,
        Self::E,
        Self::F,
        Self::G,
        Self::H,
        Self::I,
        Self::J,
        Self::K,
        Self::L,
        Self::M,
        Self::N,
        Self::O,
        Self::P,
        Self::Q,
        Self::R,
    ];

    /// Returns the channel for `index`, if it exists.
    pub const fn from_index(index: u8) -> Option<Self> {
        if (index as usize) < Self::ALL.len() {
            Some(Self::ALL[index as usize])
        } else {
            None
        }
    }

    /// Returns the channel index.
    pub const fn index(self) -> u8 {
        self as u8
    }

    /// Returns the single-letter channel label.
    pub const fn label(self) -> char {
        (b'A' + self as u8) as char
    }

    /// Returns the bank serving this channel.
    pub const fn bank(self) -> Bank {
        match self as u8 / 6 {
            0 => Bank::Uv,
            1 => Bank::Visible,
            _ => Bank::Nir,
        }
    }

    /// Returns the nominal center wavelength in nanometres.
    pub const fn wavelength_nm(self) -> u16 {
        const WAVELENGTHS: [u16; 18] = [
            410, 435, 460, 485, 510, 535, 560, 585, 610, 645, 680, 705, 730, 760, 810, 860, 900,
            940,
        ];
        WAVELENGTHS[self as usize]
    }

    /// Returns the AS7265x channel read by the AS7263-compatible getter for `channel`.
    pub const fn as7263_alias(channel: As7263Channel) -> Self {
        match channel {
            As7263Channel::R => Self::I,
            As7263Channel::S => Self::K,
            As7263Channel::T => Self::M,
            As7263Channel::U => Self::N,
            As7263Channel::V => Self::O,
            As7263Channel::W => Self::P,
        }
    }
}
