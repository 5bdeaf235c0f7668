//! I2C interface implementation built on top of `embedded-hal` `I2c`.

use embedded_hal::i2c::I2c;

use super::As726xInterface;

/// Default 7-bit bus address shared by the AS7263 and the AS7265x master.
pub const DEFAULT_ADDRESS: u8 = 0x49;

/// I2C-based interface implementation for the AS726x drivers.
pub struct I2cInterface<I2C> {
    i2c: I2C,
    address: u8,
}

impl<I2C> I2cInterface<I2C> {
    /// Creates a new interface talking to the device at `address`.
    pub const fn new(i2c: I2C, address: u8) -> Self {
        Self { i2c, address }
    }

    /// Creates a new interface using [`DEFAULT_ADDRESS`].
    pub const fn default_address(i2c: I2C) -> Self {
        Self::new(i2c, DEFAULT_ADDRESS)
    }

    /// Returns the 7-bit device address in use.
    pub const fn address(&self) -> u8 {
        self.address
    }

    /// Provides mutable access to the wrapped I2C bus.
    pub fn i2c_mut(&mut self) -> &mut I2C {
        &mut self.i2c
    }

    /// Consumes the interface and returns the owned I2C bus.
    pub fn release(self) -> I2C {
        self.i2c
    }
}

impl<I2C> As726xInterface for I2cInterface<I2C>
where
    I2C: I2c,
{
    type Error = I2C::Error;

    fn write_register(&mut self, register: u8, value: u8) -> core::result::Result<(), Self::Error> {
        self.i2c.write(self.address, &[register, value])
    }

    fn read_register(&mut self, register: u8) -> core::result::Result<u8, Self::Error> {
        // The sensor firmware expects a stopped pointer write before the read,
        // not a repeated start.
        self.i2c.write(self.address, &[register])?;

        let mut value = [0u8; 1];
        self.i2c.read(self.address, &mut value)?;
        Ok(value[0])
    }
}
