#![no_std]
//! Driver for the ams AS7263 and AS7265x spectral sensors.
//!
//! Both families expose a virtual register file behind three physical
//! registers. [`channel::VirtualRegisterChannel`] implements that handshake,
//! [`As7263`] and [`As7265x`] build measurement control and readout on top.
//!
//! # Compatibility
//!
//! The AS7265x chip index is written to the `DEV_SEL` register (`0x4F`).
//! Drivers that write it into `CONFIG` (`0x04`) overwrite the gain and
//! trigger bits on every banked access; code ported from them will see a
//! different register trace but keeps its gain setting.

#[cfg(test)]
extern crate std;

#[macro_use]
mod log;

mod error;

pub mod channel;
pub mod config;
pub mod device;
pub mod interface;
pub mod params;
pub mod poller;
pub mod registers;

#[cfg(test)]
mod sim;

pub use crate::config::{As7263Config, As7265xConfig, Polling};
pub use crate::device::{As7263, As7265x};
pub use crate::error::{Error, Result};
pub use crate::interface::As726xInterface;
pub use crate::interface::i2c::I2cInterface;
