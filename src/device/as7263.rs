//! Driver for the single-chip AS7263 6-channel NIR sensor.

use embedded_hal::delay::DelayNs;
use embedded_hal::i2c::I2c;

use super::{MAX_BULB_LEVEL, counts_to_f32};
use crate::channel::{SingleBank, VirtualRegisterChannel};
use crate::config::As7263Config;
use crate::error::{Error, Result};
use crate::interface::As726xInterface;
use crate::interface::i2c::{DEFAULT_ADDRESS, I2cInterface};
use crate::params::{As7263Channel, As7263Gain, MeasurementMode};
use crate::poller::{PollOutcome, wait_for_data_ready};
use crate::registers::{
    AS7263_EXPECTED_DEVICE_TYPE, AS7263_VREG_DEVICE_TYPE, AS7263_VREG_HW_VERSION,
    AS7263_VREG_INT_T, AS7263_VREG_TEMPERATURE, ControlSetup, LedControl, PHYSICAL_REGISTERS,
    as7263_channel_register,
};

/// High-level synchronous driver for the AS7263.
pub struct As7263<IFACE> {
    channel: VirtualRegisterChannel<IFACE, SingleBank>,
    config: As7263Config,
}

impl<IFACE> As7263<IFACE> {
    // ==================================================================
    // == Driver Construction & Ownership ===============================
    // ==================================================================
    /// Creates a new driver instance from the provided bus interface.
    pub fn new(interface: IFACE, config: As7263Config) -> Self {
        let channel = VirtualRegisterChannel::single(
            interface,
            PHYSICAL_REGISTERS,
            config.polling.handshake_attempts,
        );
        Self { channel, config }
    }

    /// Consumes the driver and returns the owned interface.
    pub fn release(self) -> (IFACE, As7263Config) {
        (self.channel.release(), self.config)
    }

    /// Provides mutable access to the underlying interface.
    pub fn interface_mut(&mut self) -> &mut IFACE {
        self.channel.interface_mut()
    }

    /// Returns a shared reference to the active configuration.
    pub fn config(&self) -> &As7263Config {
        &self.config
    }
}

impl<I2C> As7263<I2cInterface<I2C>>
where
    I2C: I2c,
{
    /// Convenience constructor for I2C transports at the default address.
    pub fn new_i2c(i2c: I2C, config: As7263Config) -> Self {
        Self::new_i2c_with_address(i2c, DEFAULT_ADDRESS, config)
    }

    /// Convenience constructor for I2C transports at a custom address.
    pub fn new_i2c_with_address(i2c: I2C, address: u8, config: As7263Config) -> Self {
        Self::new(I2cInterface::new(i2c, address), config)
    }

    /// Releases the driver, returning the I2C bus and configuration.
    pub fn release_i2c(self) -> (I2C, As7263Config) {
        let (iface, config) = self.release();
        (iface.release(), config)
    }
}

impl<IFACE, CommE> As7263<IFACE>
where
    IFACE: As726xInterface<Error = CommE>,
{
    // ==================================================================
    // == Initialization & Identification ===============================
    // ==================================================================
    /// Verifies the device identity and applies the stored configuration.
    ///
    /// The bulb is switched off as part of the setup.
    pub fn begin(&mut self) -> Result<(), CommE> {
        if !self.is_connected()? {
            warn!("AS7263 not found");
            return Err(Error::DeviceNotFound);
        }

        self.configure(self.config)?;
        self.disable_bulb()?;
        info!("AS7263 ready");
        Ok(())
    }

    /// Applies a new configuration to the device.
    pub fn configure(&mut self, config: As7263Config) -> Result<(), CommE> {
        config.validate().map_err(|_| Error::InvalidConfig)?;

        self.set_integration_time(config.integration_time)?;
        self.set_gain(config.gain)?;
        self.channel
            .set_handshake_attempts(config.polling.handshake_attempts);

        self.config = config;
        Ok(())
    }

    /// Returns `true` when `DEVICE_TYPE` identifies an AS7263.
    pub fn is_connected(&mut self) -> Result<bool, CommE> {
        let device_type = self.device_type()?;
        let hw_version = self.hardware_version()?;
        debug!("AS7263 device type {=u8:#x}, hw version {=u8:#x}", device_type, hw_version);

        Ok(device_type == AS7263_EXPECTED_DEVICE_TYPE)
    }

    /// Reads the `DEVICE_TYPE` register.
    pub fn device_type(&mut self) -> Result<u8, CommE> {
        self.channel.read(AS7263_VREG_DEVICE_TYPE)
    }

    /// Reads the `HW_VERSION` register.
    pub fn hardware_version(&mut self) -> Result<u8, CommE> {
        self.channel.read(AS7263_VREG_HW_VERSION)
    }

    // ==================================================================
    // == Measurement Control ===========================================
    // ==================================================================
    /// Triggers a one-shot measurement and waits for its completion.
    ///
    /// The data-ready flag is cleared in the same write that sets the trigger,
    /// so only the new conversion can end the wait. Fails with
    /// [`Error::MeasurementTimeout`] when the flag does not show up within the
    /// configured polling budget; channel registers then still hold the
    /// previous measurement.
    pub fn take_measurements(&mut self, delay: &mut impl DelayNs) -> Result<(), CommE> {
        self.update_control(|control| {
            control.set_data_ready(false);
            control.set_one_shot(true);
        })?;
        debug!("AS7263 measurement triggered");

        let polling = self.config.polling;
        let channel = &mut self.channel;
        let outcome = wait_for_data_ready(delay, &polling, || {
            channel
                .read_reg::<ControlSetup>()
                .map(|control| control.data_ready())
        })?;

        match outcome {
            PollOutcome::Ready { .. } => Ok(()),
            PollOutcome::TimedOut => Err(Error::MeasurementTimeout),
        }
    }

    /// Measures with the bulb at full drive level.
    ///
    /// The bulb is switched off again on every exit path, including timeouts.
    pub fn take_measurements_with_bulb(&mut self, delay: &mut impl DelayNs) -> Result<(), CommE> {
        self.enable_bulb(MAX_BULB_LEVEL)?;
        let measured = self.take_measurements(delay);
        let released = self.disable_bulb();
        measured.and(released)
    }

    /// Returns the live data-ready flag (`CONTROL_SETUP[1]` set).
    pub fn data_ready(&mut self) -> Result<bool, CommE> {
        Ok(self.channel.read_reg::<ControlSetup>()?.data_ready())
    }

    /// Clears the data-ready flag.
    pub fn clear_data_ready(&mut self) -> Result<(), CommE> {
        self.update_control(|control| control.set_data_ready(false))
    }

    // ==================================================================
    // == Readout =======================================================
    // ==================================================================
    /// Reads the die temperature, uncalibrated.
    pub fn get_temperature(&mut self) -> Result<f32, CommE> {
        let raw = self.channel.read(AS7263_VREG_TEMPERATURE)?;
        Ok(raw as f32)
    }

    /// Reads the raw 16-bit count of channel `index` (0 = R … 5 = W).
    ///
    /// An unknown index yields `0` and does not touch the bus.
    pub fn get_channel_raw(&mut self, index: u8) -> Result<u16, CommE> {
        match as7263_channel_register(index) {
            Some(register) => self.channel.read_u16(register),
            None => {
                warn!("AS7263 channel {} does not exist", index);
                Ok(0)
            }
        }
    }

    /// Reads channel `index` as a float. An unknown index yields `0.0`.
    pub fn get_channel(&mut self, index: u8) -> Result<f32, CommE> {
        self.get_channel_raw(index).map(counts_to_f32)
    }

    /// Reads `channel` as a float.
    pub fn channel(&mut self, channel: As7263Channel) -> Result<f32, CommE> {
        self.get_channel(channel.index())
    }

    /// Channel R (610 nm).
    pub fn get_r(&mut self) -> Result<f32, CommE> {
        self.channel(As7263Channel::R)
    }

    /// Channel S (680 nm).
    pub fn get_s(&mut self) -> Result<f32, CommE> {
        self.channel(As7263Channel::S)
    }

    /// Channel T (730 nm).
    pub fn get_t(&mut self) -> Result<f32, CommE> {
        self.channel(As7263Channel::T)
    }

    /// Channel U (760 nm).
    pub fn get_u(&mut self) -> Result<f32, CommE> {
        self.channel(As7263Channel::U)
    }

    /// Channel V (810 nm).
    pub fn get_v(&mut self) -> Result<f32, CommE> {
        self.channel(As7263Channel::V)
    }

    /// Channel W (860 nm).
    pub fn get_w(&mut self) -> Result<f32, CommE> {
        self.channel(As7263Channel::W)
    }

    // ==================================================================
    // == Configuration Setters =========================================
    // ==================================================================
    /// Turns the bulb on at `level`, clamped to [`MAX_BULB_LEVEL`].
    pub fn enable_bulb(&mut self, level: u8) -> Result<(), CommE> {
        let level = level.min(MAX_BULB_LEVEL);
        self.update_led(|led| led.set_level(level))
    }

    /// Turns the bulb off.
    pub fn disable_bulb(&mut self) -> Result<(), CommE> {
        self.update_led(|led| led.set_level(0))
    }

    /// Selects the gain (`CONTROL_SETUP[5:4]`).
    pub fn set_gain(&mut self, gain: As7263Gain) -> Result<(), CommE> {
        self.update_control(|control| control.set_gain(gain))?;
        self.config.gain = gain;
        Ok(())
    }

    /// Programs the integration time in 2.8 ms ticks.
    pub fn set_integration_time(&mut self, ticks: u8) -> Result<(), CommE> {
        self.channel.write(AS7263_VREG_INT_T, ticks)?;
        self.config.integration_time = ticks;
        Ok(())
    }

    /// Selects continuous or one-shot sampling (`CONTROL_SETUP[1]`).
    pub fn set_measurement_mode(&mut self, mode: MeasurementMode) -> Result<(), CommE> {
        self.update_control(|control| {
            control.set_data_ready(matches!(mode, MeasurementMode::OneShot))
        })
    }

    // ==================================================================
    // == Internal Helpers ==============================================
    // ==================================================================
    fn update_control<F>(&mut self, mutate: F) -> Result<(), CommE>
    where
        F: FnOnce(&mut ControlSetup),
    {
        self.channel.update_reg::<ControlSetup, _>(mutate)?;
        Ok(())
    }

    fn update_led<F>(&mut self, mutate: F) -> Result<(), CommE>
    where
        F: FnOnce(&mut LedControl),
    {
        self.channel.update_reg::<LedControl, _>(mutate)?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::registers::{AS7263_VREG_CONTROL_SETUP, AS7263_VREG_LED_CONTROL};
    use crate::sim::{CountingDelay, SimulatedDevice, StdDelay};

    fn sensor(device: SimulatedDevice) -> As7263<SimulatedDevice> {
        As7263::new(device, As7263Config::default())
    }

    fn connected() -> SimulatedDevice {
        let mut device = SimulatedDevice::new();
        device.set(0, AS7263_VREG_DEVICE_TYPE, AS7263_EXPECTED_DEVICE_TYPE);
        device.set(0, AS7263_VREG_HW_VERSION, 0x40);
        device
    }

    #[test]
    fn begin_applies_power_on_defaults() {
        let mut device = connected();
        device.set(0, AS7263_VREG_CONTROL_SETUP, 0b1011_0100);
        device.set(0, AS7263_VREG_LED_CONTROL, 0b0000_0011);
        let mut sensor = sensor(device);

        sensor.begin().unwrap();

        let device = sensor.interface_mut();
        assert_eq!(device.get(0, AS7263_VREG_INT_T), 50);
        assert_eq!(device.get(0, AS7263_VREG_CONTROL_SETUP), 0b1000_0100);
        assert_eq!(device.get(0, AS7263_VREG_LED_CONTROL), 0);
        assert_eq!(device.violations(), 0);
    }

    #[test]
    fn begin_rejects_unknown_device() {
        let mut device = SimulatedDevice::new();
        device.set(0, AS7263_VREG_DEVICE_TYPE, 0x41);
        let mut sensor = sensor(device);

        assert_eq!(sensor.begin(), Err(Error::DeviceNotFound));
        assert_eq!(sensor.interface_mut().writes_to(AS7263_VREG_INT_T), 0);
    }

    #[test]
    fn begin_rejects_zero_attempt_budget() {
        let config = As7263Config::new().data_ready_polling(0, 10).build();
        let mut sensor = As7263::new(connected(), config);

        assert_eq!(sensor.begin(), Err(Error::InvalidConfig));
    }

    #[test]
    fn is_connected_checks_device_type() {
        let mut sensor = sensor(connected());
        assert!(sensor.is_connected().unwrap());

        let mut other = self::sensor(SimulatedDevice::new());
        assert!(!other.is_connected().unwrap());
    }

    #[test]
    fn set_gain_only_touches_bits_4_and_5() {
        let gains = [As7263Gain::X1, As7263Gain::X3_7, As7263Gain::X16, As7263Gain::X64];
        for initial in [0x00u8, 0xFF, 0b1010_0101, 0b0101_1010] {
            for (code, gain) in gains.iter().enumerate() {
                let mut device = SimulatedDevice::new();
                device.set(0, AS7263_VREG_CONTROL_SETUP, initial);
                let mut sensor = sensor(device);

                sensor.set_gain(*gain).unwrap();

                let after = sensor.interface_mut().get(0, AS7263_VREG_CONTROL_SETUP);
                assert_eq!((after ^ initial) & !0x30, 0);
                assert_eq!((after >> 4) & 0x03, code as u8);
            }
        }
    }

    #[test]
    fn measurement_mode_flips_bit_1_only() {
        let mut device = SimulatedDevice::new();
        device.set(0, AS7263_VREG_CONTROL_SETUP, 0b1111_0001);
        let mut sensor = sensor(device);

        sensor.set_measurement_mode(MeasurementMode::OneShot).unwrap();
        assert_eq!(sensor.interface_mut().get(0, AS7263_VREG_CONTROL_SETUP), 0b1111_0011);

        sensor.set_measurement_mode(MeasurementMode::Continuous).unwrap();
        assert_eq!(sensor.interface_mut().get(0, AS7263_VREG_CONTROL_SETUP), 0b1111_0001);
    }

    #[test]
    fn enable_bulb_clamps_level() {
        let mut device = SimulatedDevice::new();
        device.set(0, AS7263_VREG_LED_CONTROL, 0b1010_0000);
        let mut sensor = sensor(device);

        sensor.enable_bulb(5).unwrap();
        assert_eq!(sensor.interface_mut().get(0, AS7263_VREG_LED_CONTROL), 0b1010_0011);

        sensor.enable_bulb(1).unwrap();
        assert_eq!(sensor.interface_mut().get(0, AS7263_VREG_LED_CONTROL), 0b1010_0001);

        sensor.disable_bulb().unwrap();
        assert_eq!(sensor.interface_mut().get(0, AS7263_VREG_LED_CONTROL), 0b1010_0000);
    }

    #[test]
    fn integration_time_is_written_verbatim() {
        let mut sensor = sensor(SimulatedDevice::new());
        sensor.set_integration_time(0xC8).unwrap();
        assert_eq!(sensor.interface_mut().get(0, AS7263_VREG_INT_T), 0xC8);
        assert_eq!(sensor.config().integration_time, 0xC8);
    }

    #[test]
    fn take_measurements_triggers_and_waits_for_ready() {
        // Read 1 is the trigger read-modify-write; the flag appears on read 4.
        let device = SimulatedDevice::new()
            .with_busy_polls(2)
            .with_flip(AS7263_VREG_CONTROL_SETUP, 0x02, 3);
        let mut sensor = sensor(device);
        let mut delay = CountingDelay::default();

        sensor.take_measurements(&mut delay).unwrap();

        assert_eq!(delay.calls, 2);
        let device = sensor.interface_mut();
        assert_eq!(device.get(0, AS7263_VREG_CONTROL_SETUP) & 0x01, 0x01);
        assert_eq!(device.violations(), 0);
    }

    #[test]
    fn stale_ready_flag_does_not_satisfy_the_next_measurement() {
        // The device signals completion exactly once.
        let device = SimulatedDevice::new().with_flip(AS7263_VREG_CONTROL_SETUP, 0x02, 1);
        let mut sensor = sensor(device);

        let mut first = CountingDelay::default();
        sensor.take_measurements(&mut first).unwrap();
        assert_eq!(first.calls, 0);

        let mut second = CountingDelay::default();
        assert_eq!(sensor.take_measurements(&mut second), Err(Error::MeasurementTimeout));
        assert_eq!(second.calls, 100);
    }

    #[test]
    fn one_shot_mode_bit_is_cleared_by_the_trigger() {
        let mut sensor = sensor(SimulatedDevice::new());
        sensor.set_measurement_mode(MeasurementMode::OneShot).unwrap();

        let mut delay = CountingDelay::default();
        assert_eq!(sensor.take_measurements(&mut delay), Err(Error::MeasurementTimeout));
        assert_eq!(delay.calls, 100);
        assert_eq!(sensor.interface_mut().get(0, AS7263_VREG_CONTROL_SETUP), 0x01);
    }

    #[test]
    fn take_measurements_reports_timeout_after_budget() {
        let mut sensor = sensor(SimulatedDevice::new());
        let mut delay = CountingDelay::default();

        assert_eq!(sensor.take_measurements(&mut delay), Err(Error::MeasurementTimeout));
        assert_eq!(delay.calls, 100);
        assert_eq!(delay.total_ns, 1_000_000_000);
    }

    #[test]
    fn take_measurements_timeout_is_bounded_in_wall_time() {
        let mut sensor = sensor(SimulatedDevice::new());

        let start = std::time::Instant::now();
        let result = sensor.take_measurements(&mut StdDelay);
        let elapsed = start.elapsed();

        assert_eq!(result, Err(Error::MeasurementTimeout));
        assert!(elapsed >= std::time::Duration::from_millis(1_000));
        assert!(elapsed < std::time::Duration::from_millis(2_000), "took {:?}", elapsed);
    }

    #[test]
    fn failed_configure_keeps_the_previous_handshake_budget() {
        let mut sensor = sensor(SimulatedDevice::new().with_stuck_tx());
        let config = As7263Config::new().handshake_attempts(5).build();

        assert_eq!(sensor.configure(config), Err(Error::HandshakeTimeout));
        assert_eq!(sensor.config().polling.handshake_attempts, 1_000);
        assert_eq!(sensor.interface_mut().transactions(), 1_000);

        assert_eq!(sensor.device_type(), Err(Error::HandshakeTimeout));
        assert_eq!(sensor.interface_mut().transactions(), 2_000);
    }

    #[test]
    fn bulb_is_released_when_measurement_times_out() {
        let mut sensor = sensor(SimulatedDevice::new());
        let mut delay = CountingDelay::default();

        let result = sensor.take_measurements_with_bulb(&mut delay);

        assert_eq!(result, Err(Error::MeasurementTimeout));
        let device = sensor.interface_mut();
        assert_eq!(device.get(0, AS7263_VREG_LED_CONTROL), 0);
        assert_eq!(device.writes_to(AS7263_VREG_LED_CONTROL), 2);
    }

    #[test]
    fn bulb_is_switched_off_after_measurement() {
        let device = SimulatedDevice::new().with_flip(AS7263_VREG_CONTROL_SETUP, 0x02, 1);
        let mut sensor = sensor(device);

        sensor.take_measurements_with_bulb(&mut CountingDelay::default()).unwrap();

        let device = sensor.interface_mut();
        assert_eq!(device.writes_to(AS7263_VREG_LED_CONTROL), 2);
        assert_eq!(device.get(0, AS7263_VREG_LED_CONTROL), 0);
    }

    #[test]
    fn channel_getters_assemble_little_endian_counts() {
        let mut device = SimulatedDevice::new();
        for (index, register) in (0x08u8..0x14).step_by(2).enumerate() {
            device.set(0, register, 0x10 + index as u8);
            device.set(0, register + 1, 0x01);
        }
        let mut sensor = sensor(device);

        assert_eq!(sensor.get_r().unwrap(), 0x0110 as f32);
        assert_eq!(sensor.get_s().unwrap(), 0x0111 as f32);
        assert_eq!(sensor.get_t().unwrap(), 0x0112 as f32);
        assert_eq!(sensor.get_u().unwrap(), 0x0113 as f32);
        assert_eq!(sensor.get_v().unwrap(), 0x0114 as f32);
        assert_eq!(sensor.get_w().unwrap(), 0x0115 as f32);
        assert_eq!(sensor.get_channel_raw(5).unwrap(), 0x0115);
    }

    #[test]
    fn unknown_channel_is_zero_and_off_the_bus() {
        let mut sensor = sensor(SimulatedDevice::new());

        assert_eq!(sensor.get_channel(6).unwrap(), 0.0);
        assert_eq!(sensor.get_channel(255).unwrap(), 0.0);
        assert_eq!(sensor.interface_mut().transactions(), 0);
    }

    #[test]
    fn temperature_is_an_identity_cast() {
        let mut device = SimulatedDevice::new();
        device.set(0, AS7263_VREG_TEMPERATURE, 27);
        let mut sensor = sensor(device);

        assert_eq!(sensor.get_temperature().unwrap(), 27.0);
    }

    #[test]
    fn clear_data_ready_keeps_other_bits() {
        let mut device = SimulatedDevice::new();
        device.set(0, AS7263_VREG_CONTROL_SETUP, 0b0011_0011);
        let mut sensor = sensor(device);

        assert!(sensor.data_ready().unwrap());
        sensor.clear_data_ready().unwrap();
        assert_eq!(sensor.interface_mut().get(0, AS7263_VREG_CONTROL_SETUP), 0b0011_0001);
        assert!(!sensor.data_ready().unwrap());
    }
}
