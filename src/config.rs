//! Configuration primitives for the AS726x drivers.

use crate::params::{As7263Gain, As7265xGain};

/// Integration time applied by `begin()` unless configured otherwise (50 × 2.8 ms = 140 ms).
pub const DEFAULT_INTEGRATION_TIME: u8 = 50;

/// Retry budgets for the bounded wait loops.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Polling {
    /// Status reads allowed per handshake step before giving up.
    pub handshake_attempts: u16,
    /// Data-ready checks performed after a measurement trigger.
    pub data_ready_attempts: u16,
    /// Sleep between two data-ready checks, in milliseconds.
    pub data_ready_interval_ms: u32,
}

impl Default for Polling {
    fn default() -> Self {
        Self {
            handshake_attempts: 1_000,
            data_ready_attempts: 100,
            data_ready_interval_ms: 10,
        }
    }
}

/// User-facing configuration, generic over the device gain encoding.
///
/// Use [`As7263Config`] or [`As7265xConfig`] rather than naming `G` directly.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Config<G> {
    /// Gain applied to every channel.
    pub gain: G,
    /// Integration time in 2.8 ms ticks.
    pub integration_time: u8,
    /// Retry budgets for the handshake and data-ready loops.
    pub polling: Polling,
}

/// Configuration of the single-chip AS7263.
pub type As7263Config = Config<As7263Gain>;
/// Configuration of the three-chip AS7265x.
pub type As7265xConfig = Config<As7265xGain>;

impl<G: Copy + Default> Config<G> {
    /// Begins building a [`Config`] using the builder pattern.
    pub fn new() -> ConfigBuilder<G> {
        ConfigBuilder::new()
    }
}

impl<G> Config<G> {
    /// Checks whether this configuration is usable.
    pub fn validate(&self) -> core::result::Result<(), ConfigError> {
        if self.polling.handshake_attempts == 0 || self.polling.data_ready_attempts == 0 {
            return Err(ConfigError::ZeroAttempts);
        }

        Ok(())
    }
}

impl<G: Default> Default for Config<G> {
    fn default() -> Self {
        Self {
            gain: G::default(),
            integration_time: DEFAULT_INTEGRATION_TIME,
            polling: Polling::default(),
        }
    }
}

/// Builder for [`Config`] allowing piecemeal construction.
#[derive(Debug, Clone, Copy)]
pub struct ConfigBuilder<G> {
    config: Config<G>,
}

impl<G: Copy + Default> ConfigBuilder<G> {
    /// Creates a new builder seeded with [`Config::default()`].
    pub fn new() -> Self {
        Self {
            config: Config::default(),
        }
    }

    /// Overrides the gain.
    pub fn gain(mut self, gain: G) -> Self {
        self.config.gain = gain;
        self
    }

    /// Overrides the integration time (2.8 ms ticks).
    pub fn integration_time(mut self, ticks: u8) -> Self {
        self.config.integration_time = ticks;
        self
    }

    /// Sets the number of status reads allowed per handshake step.
    pub fn handshake_attempts(mut self, attempts: u16) -> Self {
        self.config.polling.handshake_attempts = attempts;
        self
    }

    /// Sets the data-ready retry budget.
    pub fn data_ready_polling(mut self, attempts: u16, interval_ms: u32) -> Self {
        self.config.polling.data_ready_attempts = attempts;
        self.config.polling.data_ready_interval_ms = interval_ms;
        self
    }

    /// Finalizes the builder and returns the [`Config`].
    pub fn build(self) -> Config<G> {
        self.config
    }
}

impl<G: Copy + Default> Default for ConfigBuilder<G> {
    fn default() -> Self {
        Self::new()
    }
}

/// Validation errors generated while verifying a [`Config`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum ConfigError {
    /// A retry budget of zero would never query the device.
    ZeroAttempts,
}
