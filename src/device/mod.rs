//! High-level device drivers.
//!
//! [`As7263`] drives the single-chip NIR sensor, [`As7265x`] the three-chip
//! module. Both sit on one [`VirtualRegisterChannel`](crate::channel::VirtualRegisterChannel)
//! and differ only in register layout and bank routing.

mod as7263;
mod as7265x;

pub use as7263::As7263;
pub use as7265x::As7265x;

/// Highest bulb drive level accepted by the bulb setters.
pub const MAX_BULB_LEVEL: u8 = 3;

// Raw counts are reported as-is; no calibration is applied.
#[inline]
pub(crate) fn counts_to_f32(raw: u16) -> f32 {
    raw as f32
}
