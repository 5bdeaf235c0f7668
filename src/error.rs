//! Error handling primitives for the AS726x drivers.

/// Crate-wide result type alias.
pub type Result<T, E> = core::result::Result<T, Error<E>>;

/// Error variants produced by the driver.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Error<E> {
    /// Any error reported by the underlying bus interface.
    Interface(E),
    /// The identification registers did not match the expected device.
    DeviceNotFound,
    /// A status bit never reached the state the virtual register handshake waits for.
    HandshakeTimeout,
    /// The device did not report data ready within the polling budget.
    MeasurementTimeout,
    /// The provided configuration parameters are invalid.
    InvalidConfig,
}

impl<E> From<E> for Error<E> {
    fn from(err: E) -> Self {
        Self::Interface(err)
    }
}
