//! Driver for the three-chip AS7265x 18-channel spectral module.
//!
//! The master chip (UV, channels A–F) is bank 0, the visible chip (G–L) bank 1
//! and the NIR chip (M–R) bank 2. Configuration registers are shared; the
//! channel data and the temperature exist once per chip.
//!
//! Banks are selected through `DEV_SEL` (`0x4F`), not through `CONFIG`.
//! This breaks register-trace compatibility with drivers that reuse
//! `CONFIG` for the chip index.

use embedded_hal::delay::DelayNs;
use embedded_hal::i2c::I2c;

use super::{MAX_BULB_LEVEL, counts_to_f32};
use crate::channel::{RegisterBanks, VirtualRegisterChannel};
use crate::config::As7265xConfig;
use crate::error::{Error, Result};
use crate::interface::As726xInterface;
use crate::interface::i2c::{DEFAULT_ADDRESS, I2cInterface};
use crate::params::{As7263Channel, As7265xChannel, As7265xGain, BulbCurrent, BulbSelect, BulbType};
use crate::poller::{PollOutcome, wait_for_data_ready};
use crate::registers::{
    AS7265X_BANK_COUNT, AS7265X_VREG_DEV_SELECT, AS7265X_VREG_DEVICE_TEMP,
    AS7265X_VREG_FW_VERSION_H, AS7265X_VREG_FW_VERSION_L, AS7265X_VREG_HW_VERSION,
    AS7265X_VREG_INTEG_TIME, ConfigRegister, LedConfig, PHYSICAL_REGISTERS,
    as7265x_channel_location,
};

/// High-level synchronous driver for the AS7265x.
pub struct As7265x<IFACE> {
    channel: VirtualRegisterChannel<IFACE, RegisterBanks>,
    config: As7265xConfig,
}

impl<IFACE> As7265x<IFACE> {
    /// Creates a new driver instance from the provided bus interface.
    pub fn new(interface: IFACE, config: As7265xConfig) -> Self {
        let channel = VirtualRegisterChannel::new(
            interface,
            PHYSICAL_REGISTERS,
            RegisterBanks::new(AS7265X_VREG_DEV_SELECT, AS7265X_BANK_COUNT),
            config.polling.handshake_attempts,
        );
        Self { channel, config }
    }

    /// Consumes the driver and returns the owned interface.
    pub fn release(self) -> (IFACE, As7265xConfig) {
        (self.channel.release(), self.config)
    }

    /// Provides mutable access to the underlying interface.
    pub fn interface_mut(&mut self) -> &mut IFACE {
        self.channel.interface_mut()
    }

    /// Returns a shared reference to the active configuration.
    pub fn config(&self) -> &As7265xConfig {
        &self.config
    }
}

impl<I2C> As7265x<I2cInterface<I2C>>
where
    I2C: I2c,
{
    /// Convenience constructor for I2C transports at the default address.
    pub fn new_i2c(i2c: I2C, config: As7265xConfig) -> Self {
        Self::new_i2c_with_address(i2c, DEFAULT_ADDRESS, config)
    }

    /// Convenience constructor for I2C transports at a custom address.
    pub fn new_i2c_with_address(i2c: I2C, address: u8, config: As7265xConfig) -> Self {
        Self::new(I2cInterface::new(i2c, address), config)
    }

    /// Releases the driver, returning the I2C bus and configuration.
    pub fn release_i2c(self) -> (I2C, As7265xConfig) {
        let (iface, config) = self.release();
        (iface.release(), config)
    }
}

impl<IFACE, CommE> As7265x<IFACE>
where
    IFACE: As726xInterface<Error = CommE>,
{
    // ==================================================================
    // == Initialization & Identification ===============================
    // ==================================================================
    /// Verifies the module responds and applies the stored configuration.
    ///
    /// The bulb is switched off as part of the setup.
    pub fn begin(&mut self) -> Result<(), CommE> {
        if !self.is_connected()? {
            warn!("AS7265x not found");
            return Err(Error::DeviceNotFound);
        }

        self.configure(self.config)?;
        self.disable_bulb()?;
        info!("AS7265x ready");
        Ok(())
    }

    /// Applies a new configuration to all three chips.
    pub fn configure(&mut self, config: As7265xConfig) -> Result<(), CommE> {
        config.validate().map_err(|_| Error::InvalidConfig)?;

        self.set_integration_time(config.integration_time)?;
        self.set_gain(config.gain)?;
        self.channel
            .set_handshake_attempts(config.polling.handshake_attempts);

        self.config = config;
        Ok(())
    }

    /// Returns `true` when `HW_VERSION` reads non-zero.
    pub fn is_connected(&mut self) -> Result<bool, CommE> {
        let hw_version = self.hardware_version()?;
        debug!("AS7265x hw version {=u8:#x}", hw_version);
        Ok(hw_version != 0)
    }

    /// Reads the `HW_VERSION` register.
    pub fn hardware_version(&mut self) -> Result<u8, CommE> {
        self.channel.read(AS7265X_VREG_HW_VERSION)
    }

    /// Reads the firmware version (`FW_VERSION_H` in the upper byte).
    pub fn firmware_version(&mut self) -> Result<u16, CommE> {
        let high = self.channel.read(AS7265X_VREG_FW_VERSION_H)?;
        let low = self.channel.read(AS7265X_VREG_FW_VERSION_L)?;
        Ok(u16::from_be_bytes([high, low]))
    }

    // ==================================================================
    // == Measurement Control ===========================================
    // ==================================================================
    /// Triggers a measurement on all chips and waits until `CONFIG[1]` clears.
    ///
    /// Fails with [`Error::MeasurementTimeout`] when the module stays busy
    /// past the configured polling budget.
    pub fn take_measurements(&mut self, delay: &mut impl DelayNs) -> Result<(), CommE> {
        self.update_config(|config| config.set_trigger(true))?;
        debug!("AS7265x measurement triggered");

        let polling = self.config.polling;
        let channel = &mut self.channel;
        let outcome = wait_for_data_ready(delay, &polling, || {
            channel
                .read_reg::<ConfigRegister>()
                .map(|config| !config.busy())
        })?;

        match outcome {
            PollOutcome::Ready { .. } => Ok(()),
            PollOutcome::TimedOut => Err(Error::MeasurementTimeout),
        }
    }

    /// Measures with `bulb` switched on.
    ///
    /// The bulb is switched off again on every exit path, including timeouts.
    pub fn take_measurements_with_bulb(
        &mut self,
        bulb: BulbType,
        delay: &mut impl DelayNs,
    ) -> Result<(), CommE> {
        self.enable_bulb(bulb)?;
        let measured = self.take_measurements(delay);
        let released = self.disable_bulb();
        measured.and(released)
    }

    /// Returns `true` when no conversion is in progress (`CONFIG[1]` clear).
    pub fn data_ready(&mut self) -> Result<bool, CommE> {
        Ok(!self.channel.read_reg::<ConfigRegister>()?.busy())
    }

    // ==================================================================
    // == Readout =======================================================
    // ==================================================================
    /// Reads the temperature of the currently selected chip, uncalibrated.
    pub fn get_temperature(&mut self) -> Result<f32, CommE> {
        let raw = self.channel.read(AS7265X_VREG_DEVICE_TEMP)?;
        Ok(raw as f32)
    }

    /// Reads the temperature of chip `bank`. An unknown bank yields `0.0`.
    pub fn get_temperature_of(&mut self, bank: u8) -> Result<f32, CommE> {
        let raw = self.channel.bank_read(bank, AS7265X_VREG_DEVICE_TEMP)?;
        Ok(raw as f32)
    }

    /// Reads the raw 16-bit count of channel `index` (0 = A … 17 = R).
    ///
    /// An unknown index yields `0` and does not touch the bus.
    pub fn get_channel_raw(&mut self, index: u8) -> Result<u16, CommE> {
        match as7265x_channel_location(index) {
            Some((bank, register)) => self.channel.bank_read_u16(bank, register),
            None => {
                warn!("AS7265x channel {} does not exist", index);
                Ok(0)
            }
        }
    }

    /// Reads channel `index` as a float. An unknown index yields `0.0`.
    pub fn get_channel(&mut self, index: u8) -> Result<f32, CommE> {
        self.get_channel_raw(index).map(counts_to_f32)
    }

    /// Reads `channel` as a float.
    pub fn channel(&mut self, channel: As7265xChannel) -> Result<f32, CommE> {
        self.get_channel(channel.index())
    }

    /// Channel A (410 nm).
    pub fn get_a(&mut self) -> Result<f32, CommE> {
        self.channel(As7265xChannel::A)
    }

    /// Channel B (435 nm).
    pub fn get_b(&mut self) -> Result<f32, CommE> {
        self.channel(As7265xChannel::B)
    }

    /// Channel C (460 nm).
    pub fn get_c(&mut self) -> Result<f32, CommE> {
        self.channel(As7265xChannel::C)
    }

    /// Channel D (485 nm).
    pub fn get_d(&mut self) -> Result<f32, CommE> {
        self.channel(As7265xChannel::D)
    }

    /// Channel E (510 nm).
    pub fn get_e(&mut self) -> Result<f32, CommE> {
        self.channel(As7265xChannel::E)
    }

    /// Channel F (535 nm).
    pub fn get_f(&mut self) -> Result<f32, CommE> {
        self.channel(As7265xChannel::F)
    }

    /// Channel G (560 nm).
    pub fn get_g(&mut self) -> Result<f32, CommE> {
        self.channel(As7265xChannel::G)
    }

    /// Channel H (585 nm).
    pub fn get_h(&mut self) -> Result<f32, CommE> {
        self.channel(As7265xChannel::H)
    }

    /// Channel I (610 nm).
    pub fn get_i(&mut self) -> Result<f32, CommE> {
        self.channel(As7265xChannel::I)
    }

    /// Channel J (645 nm).
    pub fn get_j(&mut self) -> Result<f32, CommE> {
        self.channel(As7265xChannel::J)
    }

    /// Channel K (680 nm).
    pub fn get_k(&mut self) -> Result<f32, CommE> {
        self.channel(As7265xChannel::K)
    }

    /// Channel L (705 nm).
    pub fn get_l(&mut self) -> Result<f32, CommE> {
        self.channel(As7265xChannel::L)
    }

    /// Channel M (730 nm).
    pub fn get_m(&mut self) -> Result<f32, CommE> {
        self.channel(As7265xChannel::M)
    }

    /// Channel N (760 nm).
    pub fn get_n(&mut self) -> Result<f32, CommE> {
        self.channel(As7265xChannel::N)
    }

    /// Channel O (810 nm).
    pub fn get_o(&mut self) -> Result<f32, CommE> {
        self.channel(As7265xChannel::O)
    }

    /// Channel P (860 nm).
    pub fn get_p(&mut self) -> Result<f32, CommE> {
        self.channel(As7265xChannel::P)
    }

    /// Channel Q (900 nm).
    pub fn get_q(&mut self) -> Result<f32, CommE> {
        self.channel(As7265xChannel::Q)
    }

    /// Channel R (940 nm).
    pub fn get_r(&mut self) -> Result<f32, CommE> {
        self.channel(As7265xChannel::R)
    }

    // AS7263-compatible names. R maps to channel I, not to the NIR chip.

    /// AS7263 channel R, served by channel I.
    pub fn get_r_as7263(&mut self) -> Result<f32, CommE> {
        self.channel(As7265xChannel::as7263_alias(As7263Channel::R))
    }

    /// AS7263 channel S, served by channel K.
    pub fn get_s_as7263(&mut self) -> Result<f32, CommE> {
        self.channel(As7265xChannel::as7263_alias(As7263Channel::S))
    }

    /// AS7263 channel T, served by channel M.
    pub fn get_t_as7263(&mut self) -> Result<f32, CommE> {
        self.channel(As7265xChannel::as7263_alias(As7263Channel::T))
    }

    /// AS7263 channel U, served by channel N.
    pub fn get_u_as7263(&mut self) -> Result<f32, CommE> {
        self.channel(As7265xChannel::as7263_alias(As7263Channel::U))
    }

    /// AS7263 channel V, served by channel O.
    pub fn get_v_as7263(&mut self) -> Result<f32, CommE> {
        self.channel(As7265xChannel::as7263_alias(As7263Channel::V))
    }

    /// AS7263 channel W, served by channel P.
    pub fn get_w_as7263(&mut self) -> Result<f32, CommE> {
        self.channel(As7265xChannel::as7263_alias(As7263Channel::W))
    }

    // ==================================================================
    // == Configuration Setters =========================================
    // ==================================================================
    /// Programs the integration time of all chips, in 2.8 ms ticks.
    pub fn set_integration_time(&mut self, ticks: u8) -> Result<(), CommE> {
        self.channel.write(AS7265X_VREG_INTEG_TIME, ticks)?;
        self.config.integration_time = ticks;
        Ok(())
    }

    /// Selects the gain shared by all chips (`CONFIG[5:4]`).
    pub fn set_gain(&mut self, gain: As7265xGain) -> Result<(), CommE> {
        self.update_config(|config| config.set_gain(gain))?;
        self.config.gain = gain;
        Ok(())
    }

    /// Sets the drive current of all three bulbs, clamping `level` to 3.
    ///
    /// The bulb selection in `LED_CONFIG[7:6]` is left as is.
    pub fn set_bulb_current(&mut self, level: u8) -> Result<(), CommE> {
        let current = BulbCurrent::from_level(level.min(MAX_BULB_LEVEL));
        self.update_led(|led| {
            led.set_white_current(current);
            led.set_ir_current(current);
            led.set_uv_current(current);
        })
    }

    /// Sets the drive current of one bulb, clamping `level` to 3.
    pub fn set_bulb_current_for(&mut self, bulb: BulbType, level: u8) -> Result<(), CommE> {
        let current = BulbCurrent::from_level(level.min(MAX_BULB_LEVEL));
        self.update_led(|led| match bulb {
            BulbType::White => led.set_white_current(current),
            BulbType::Ir => led.set_ir_current(current),
            BulbType::Uv => led.set_uv_current(current),
        })
    }

    /// Switches `bulb` on. Only one bulb can be lit at a time.
    pub fn enable_bulb(&mut self, bulb: BulbType) -> Result<(), CommE> {
        self.update_led(|led| led.set_bulb(BulbSelect::from(bulb)))
    }

    /// Switches all bulbs off, keeping the current settings.
    pub fn disable_bulb(&mut self) -> Result<(), CommE> {
        self.update_led(|led| led.set_bulb(BulbSelect::Off))
    }

    // ==================================================================
    // == Banked Register Access ========================================
    // ==================================================================
    /// Reads a virtual register of chip `bank`. An unknown bank yields `0`.
    pub fn bank_read(&mut self, bank: u8, register: u8) -> Result<u8, CommE> {
        self.channel.bank_read(bank, register)
    }

    /// Writes a virtual register of chip `bank`. An unknown bank is ignored.
    pub fn bank_write(&mut self, bank: u8, register: u8, value: u8) -> Result<(), CommE> {
        self.channel.bank_write(bank, register, value)
    }

    // ==================================================================
    // == Internal Helpers ==============================================
    // ==================================================================
    fn update_config<F>(&mut self, mutate: F) -> Result<(), CommE>
    where
        F: FnOnce(&mut ConfigRegister),
    {
        self.channel.update_reg::<ConfigRegister, _>(mutate)?;
        Ok(())
    }

    fn update_led<F>(&mut self, mutate: F) -> Result<(), CommE>
    where
        F: FnOnce(&mut LedConfig),
    {
        self.channel.update_reg::<LedConfig, _>(mutate)?;
        Ok(())
    }
}
