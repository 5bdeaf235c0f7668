//! Virtual register channel.
//!
//! The sensors expose only three physical registers. Every logical register is
//! reached through a handshake on those three:
//!
//! * read: wait `TX_VALID` clear, write the address to `WRITE`, wait
//!   `RX_VALID` set, read `READ`.
//! * write: wait `TX_VALID` clear, write the address to `WRITE`, wait
//!   `TX_VALID` clear, write the value to `WRITE`.
//!
//! The three-chip AS7265x additionally routes each access to one of its chips
//! by writing a bank index into a shared register first. That choice is a
//! [`BankSelect`] strategy so the handshake exists exactly once.

use crate::error::{Error, Result};
use crate::interface::As726xInterface;
use crate::registers::{Register, RegisterMap, Status};

/// Strategy deciding how (and whether) an access is routed to a bank.
pub trait BankSelect {
    /// Number of valid bank indices, starting at zero.
    fn bank_count(&self) -> u8;

    /// Virtual register receiving the bank index, or `None` when selecting a
    /// bank needs no bus traffic.
    fn select_register(&self) -> Option<u8>;
}

/// Single-chip devices: only bank 0 exists and selecting it is free.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SingleBank;

impl BankSelect for SingleBank {
    fn bank_count(&self) -> u8 {
        1
    }

    fn select_register(&self) -> Option<u8> {
        None
    }
}

/// Multi-chip devices selecting the bank through a shared virtual register.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegisterBanks {
    register: u8,
    count: u8,
}

impl RegisterBanks {
    /// Creates a strategy writing bank indices `0..count` into `register`.
    pub const fn new(register: u8, count: u8) -> Self {
        Self { register, count }
    }
}

impl BankSelect for RegisterBanks {
    fn bank_count(&self) -> u8 {
        self.count
    }

    fn select_register(&self) -> Option<u8> {
        Some(self.register)
    }
}

/// Handshake engine mapping a virtual register file onto three physical registers.
pub struct VirtualRegisterChannel<IFACE, B = SingleBank> {
    interface: IFACE,
    map: RegisterMap,
    banks: B,
    handshake_attempts: u16,
}

impl<IFACE> VirtualRegisterChannel<IFACE, SingleBank> {
    /// Creates a channel for a single-chip device.
    pub fn single(interface: IFACE, map: RegisterMap, handshake_attempts: u16) -> Self {
        Self::new(interface, map, SingleBank, handshake_attempts)
    }
}

impl<IFACE, B> VirtualRegisterChannel<IFACE, B> {
    /// Creates a channel using `banks` to route banked accesses.
    pub fn new(interface: IFACE, map: RegisterMap, banks: B, handshake_attempts: u16) -> Self {
        Self {
            interface,
            map,
            banks,
            handshake_attempts,
        }
    }

    /// Updates the number of status reads allowed per handshake step.
    pub fn set_handshake_attempts(&mut self, attempts: u16) {
        self.handshake_attempts = attempts;
    }

    /// Provides mutable access to the underlying interface.
    pub fn interface_mut(&mut self) -> &mut IFACE {
        &mut self.interface
    }

    /// Consumes the channel and returns the owned interface.
    pub fn release(self) -> IFACE {
        self.interface
    }
}

impl<IFACE, B, CommE> VirtualRegisterChannel<IFACE, B>
where
    IFACE: As726xInterface<Error = CommE>,
    B: BankSelect,
{
    // ==================================================================
    // == Virtual Register Access =======================================
    // ==================================================================
    /// Reads one virtual register.
    pub fn read(&mut self, address: u8) -> Result<u8, CommE> {
        self.wait_status(|status| !status.tx_valid())?;
        self.interface
            .write_register(self.map.write, address)
            .map_err(Error::from)?;

        self.wait_status(|status| status.rx_valid())?;
        self.interface
            .read_register(self.map.read)
            .map_err(Error::from)
    }

    /// Writes one virtual register.
    pub fn write(&mut self, address: u8, value: u8) -> Result<(), CommE> {
        self.wait_status(|status| !status.tx_valid())?;
        self.interface
            .write_register(self.map.write, address)
            .map_err(Error::from)?;

        self.wait_status(|status| !status.tx_valid())?;
        self.interface
            .write_register(self.map.write, value)
            .map_err(Error::from)
    }

    /// Reads a little-endian 16-bit value spread over `address` and `address + 1`.
    pub fn read_u16(&mut self, address: u8) -> Result<u16, CommE> {
        let low = self.read(address)?;
        let high = self.read(address.wrapping_add(1))?;
        Ok(u16::from_le_bytes([low, high]))
    }

    /// Reads `address`, applies `mutate`, and writes the result back.
    ///
    /// The write is issued even when nothing changed so trigger bits get re-asserted.
    pub fn modify<F>(&mut self, address: u8, mutate: F) -> Result<u8, CommE>
    where
        F: FnOnce(u8) -> u8,
    {
        let current = self.read(address)?;
        let updated = mutate(current);
        self.write(address, updated)?;
        Ok(updated)
    }

    /// Reads the register backing `R` as its bitfield type.
    pub fn read_reg<R: Register>(&mut self) -> Result<R, CommE> {
        self.read(R::ADDRESS).map(R::from)
    }

    /// Read-modify-write of the register backing `R`, returning the written value.
    pub fn update_reg<R, F>(&mut self, mutate: F) -> Result<R, CommE>
    where
        R: Register,
        F: FnOnce(&mut R),
    {
        let written = self.modify(R::ADDRESS, |raw| {
            let mut value = R::from(raw);
            mutate(&mut value);
            value.into()
        })?;
        Ok(R::from(written))
    }

    // ==================================================================
    // == Banked Access =================================================
    // ==================================================================
    /// Reads `register` from `bank`. Returns `0` without touching the bus for an unknown bank.
    pub fn bank_read(&mut self, bank: u8, register: u8) -> Result<u8, CommE> {
        if !self.select_bank(bank)? {
            return Ok(0);
        }
        self.read(register)
    }

    /// Writes `register` of `bank`. Does nothing for an unknown bank.
    pub fn bank_write(&mut self, bank: u8, register: u8, value: u8) -> Result<(), CommE> {
        if !self.select_bank(bank)? {
            return Ok(());
        }
        self.write(register, value)
    }

    /// Reads a 16-bit value from `bank`, re-selecting the bank for each byte.
    pub fn bank_read_u16(&mut self, bank: u8, register: u8) -> Result<u16, CommE> {
        let low = self.bank_read(bank, register)?;
        let high = self.bank_read(bank, register.wrapping_add(1))?;
        Ok(u16::from_le_bytes([low, high]))
    }

    fn select_bank(&mut self, bank: u8) -> Result<bool, CommE> {
        if bank >= self.banks.bank_count() {
            warn!("bank {} out of range, access skipped", bank);
            return Ok(false);
        }

        if let Some(register) = self.banks.select_register() {
            self.write(register, bank)?;
        }
        Ok(true)
    }

    fn wait_status<F>(&mut self, done: F) -> Result<(), CommE>
    where
        F: Fn(Status) -> bool,
    {
        for _ in 0..self.handshake_attempts {
            let status = self
                .interface
                .read_register(self.map.status)
                .map_err(Error::from)?;

            if done(Status::from(status)) {
                return Ok(());
            }
        }

        warn!(
            "virtual register handshake timed out after {} status reads",
            self.handshake_attempts
        );
        Err(Error::HandshakeTimeout)
    }
}
