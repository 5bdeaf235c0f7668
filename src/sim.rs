//! Simulated sensor used by the unit tests.
//!
//! Models the physical status/write/read triple: `TX_VALID` stays set for a
//! configurable number of status polls after every write, `RX_VALID` is set
//! once an address is latched, and a virtual register file sits behind it.
//! In banked mode the temperature register and the channel data registers
//! exist once per chip, everything else is shared.

use core::convert::Infallible;

use embedded_hal::delay::DelayNs;

use crate::interface::As726xInterface;
use crate::registers::{REG_READ, REG_STATUS, REG_WRITE};

const FILE_SIZE: usize = 0x80;

struct Flip {
    register: u8,
    mask: u8,
    remaining: u32,
}

pub(crate) struct SimulatedDevice {
    files: [[u8; FILE_SIZE]; 3],
    bank_register: Option<u8>,
    selected: usize,
    pending: Option<u8>,
    rx_valid: bool,
    busy_polls: u8,
    busy_remaining: u8,
    stuck_tx: bool,
    stuck_rx: bool,
    flip: Option<Flip>,
    busy_observed: usize,
    transactions: usize,
    physical_writes: usize,
    violations: usize,
    virtual_writes: [u16; FILE_SIZE],
}

impl SimulatedDevice {
    pub(crate) fn new() -> Self {
        Self {
            files: [[0; FILE_SIZE]; 3],
            bank_register: None,
            selected: 0,
            pending: None,
            rx_valid: false,
            busy_polls: 0,
            busy_remaining: 0,
            stuck_tx: false,
            stuck_rx: false,
            flip: None,
            busy_observed: 0,
            transactions: 0,
            physical_writes: 0,
            violations: 0,
            virtual_writes: [0; FILE_SIZE],
        }
    }

    /// Three-chip device selecting the bank through `bank_register`.
    pub(crate) fn banked(bank_register: u8) -> Self {
        Self {
            bank_register: Some(bank_register),
            ..Self::new()
        }
    }

    pub(crate) fn with_busy_polls(mut self, polls: u8) -> Self {
        self.busy_polls = polls;
        self
    }

    pub(crate) fn with_stuck_tx(mut self) -> Self {
        self.stuck_tx = true;
        self
    }

    /// `RX_VALID` never reports a full read buffer.
    pub(crate) fn with_stuck_rx(mut self) -> Self {
        self.stuck_rx = true;
        self
    }

    /// XORs `mask` into `register` once it has been read `after_reads` times.
    pub(crate) fn with_flip(mut self, register: u8, mask: u8, after_reads: u32) -> Self {
        self.flip = Some(Flip {
            register,
            mask,
            remaining: after_reads,
        });
        self
    }

    pub(crate) fn set(&mut self, bank: usize, register: u8, value: u8) {
        let file = self.file_index(bank, register);
        self.files[file][register as usize] = value;
    }

    pub(crate) fn get(&self, bank: usize, register: u8) -> u8 {
        self.files[self.file_index(bank, register)][register as usize]
    }

    pub(crate) fn transactions(&self) -> usize {
        self.transactions
    }

    pub(crate) fn total_writes(&self) -> usize {
        self.physical_writes
    }

    pub(crate) fn writes_to(&self, register: u8) -> u16 {
        self.virtual_writes[register as usize]
    }

    pub(crate) fn busy_polls_observed(&self) -> usize {
        self.busy_observed
    }

    pub(crate) fn violations(&self) -> usize {
        self.violations
    }

    pub(crate) fn selected_bank(&self) -> usize {
        self.selected
    }

    fn is_banked(&self, register: u8) -> bool {
        self.bank_register.is_some() && (register == 0x06 || (0x08..=0x13).contains(&register))
    }

    fn file_index(&self, bank: usize, register: u8) -> usize {
        if self.is_banked(register) { bank } else { 0 }
    }

    fn tx_busy(&self) -> bool {
        self.stuck_tx || self.busy_remaining > 0
    }

    fn load(&mut self, register: u8) -> u8 {
        let file = self.file_index(self.selected, register);
        let mut flip_now = None;
        if let Some(flip) = self.flip.as_mut() {
            if flip.register == register {
                if flip.remaining == 0 {
                    flip_now = Some(flip.mask);
                } else {
                    flip.remaining -= 1;
                }
            }
        }

        if let Some(mask) = flip_now {
            self.flip = None;
            self.files[file][register as usize] ^= mask;
        }
        self.files[file][register as usize]
    }

    fn store(&mut self, register: u8, value: u8) {
        self.virtual_writes[register as usize] += 1;
        if self.bank_register == Some(register) && (value as usize) < self.files.len() {
            self.selected = value as usize;
        }

        let file = self.file_index(self.selected, register);
        self.files[file][register as usize] = value;
    }
}

impl As726xInterface for SimulatedDevice {
    type Error = Infallible;

    fn write_register(&mut self, register: u8, value: u8) -> Result<(), Self::Error> {
        self.transactions += 1;
        self.physical_writes += 1;
        if register != REG_WRITE {
            return Ok(());
        }

        if self.tx_busy() {
            self.violations += 1;
        }
        self.busy_remaining = self.busy_polls;

        match self.pending.take() {
            Some(address) => {
                self.store(address & 0x7F, value);
                self.rx_valid = false;
            }
            None => {
                self.pending = Some(value);
                self.rx_valid = true;
            }
        }
        Ok(())
    }

    fn read_register(&mut self, register: u8) -> Result<u8, Self::Error> {
        self.transactions += 1;
        match register {
            REG_STATUS => {
                let busy = self.tx_busy();
                if busy {
                    self.busy_observed += 1;
                    self.busy_remaining = self.busy_remaining.saturating_sub(1);
                }
                let rx_valid = self.rx_valid && !self.stuck_rx;
                Ok(((busy as u8) << 1) | rx_valid as u8)
            }
            REG_READ => {
                if !self.rx_valid {
                    self.violations += 1;
                }
                self.rx_valid = false;
                let address = self.pending.take().unwrap_or(0);
                Ok(self.load(address & 0x7F))
            }
            _ => Ok(0),
        }
    }
}

/// Delay that only records how long it was asked to sleep.
#[derive(Debug, Default)]
pub(crate) struct CountingDelay {
    pub(crate) total_ns: u64,
    pub(crate) calls: u32,
}

impl DelayNs for CountingDelay {
    fn delay_ns(&mut self, ns: u32) {
        self.total_ns += ns as u64;
        self.calls += 1;
    }

    fn delay_ms(&mut self, ms: u32) {
        self.delay_ns(ms * 1_000_000);
    }
}

/// Delay backed by the host clock.
pub(crate) struct StdDelay;

impl DelayNs for StdDelay {
    fn delay_ns(&mut self, ns: u32) {
        std::thread::sleep(core::time::Duration::from_nanos(ns as u64));
    }
}
