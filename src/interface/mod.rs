//! Bus interface abstraction for the AS726x drivers.

pub mod i2c;

/// Abstraction over the physical register access required by the driver.
///
/// Only the three physical registers (status, write, read) are ever addressed
/// through this trait; the virtual register file sits on top of it in
/// [`VirtualRegisterChannel`](crate::channel::VirtualRegisterChannel).
pub trait As726xInterface {
    /// Error type produced by the concrete bus implementation.
    type Error;

    /// Writes a single physical register.
    fn write_register(&mut self, register: u8, value: u8) -> core::result::Result<(), Self::Error>;

    /// Reads a single physical register.
    fn read_register(&mut self, register: u8) -> core::result::Result<u8, Self::Error>;
}
