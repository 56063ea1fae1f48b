#![doc = include_str!("../README.md")]
#![cfg_attr(not(target_arch = "x86_64"), no_std)]

pub mod config;
pub mod error;
mod internal;
pub mod platform;
mod record;
pub mod sequencer;
pub mod shell;

pub use crate::record::PAYLOAD_WORDS;

use crate::error::Error;
use crate::platform::FlashDriver;
use crate::record::Record;

/// How [`Eeprom::init`] found the store.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum InitOutcome {
    /// A valid record was adopted from the given slot.
    Restored { slot: usize },
    /// No slot held a valid record. The payload starts as all-erased words;
    /// the caller should seed its defaults (and save once they matter).
    ColdStart,
}

/// EEPROM-emulation store: one fixed-layout record of [`PAYLOAD_WORDS`]
/// config words, rotated round-robin across the reserved flash pages.
///
/// `get` and `set` work on the in-memory record only; `save` runs one
/// atomic commit. The store owns its flash driver and expects to be the
/// only writer of the reserved region.
pub struct Eeprom<T: FlashDriver> {
    pub(crate) flash: T,
    pub(crate) active: Option<usize>,
    pub(crate) record: Record,
}

impl<T: FlashDriver> Eeprom<T> {
    /// Mounts the store: scans the reserved pages for a record written under
    /// `schema_version` and adopts the first valid one. With no adoptable
    /// record the store cold-starts on an all-erased payload.
    ///
    /// Cold start is a signal, not an error.
    pub fn init(mut flash: T, schema_version: u32) -> (Self, InitOutcome) {
        match internal::scan(&mut flash, schema_version) {
            Some((slot, record)) => (
                Self {
                    flash,
                    active: Some(slot),
                    record,
                },
                InitOutcome::Restored { slot },
            ),
            None => (
                Self {
                    flash,
                    active: None,
                    record: Record::fresh(schema_version),
                },
                InitOutcome::ColdStart,
            ),
        }
    }

    /// Reads one config word from the in-memory record. Never touches flash.
    ///
    /// A word that was never written reads as the erased value
    /// `0xFFFF_FFFF`; substituting a semantic default is the caller's (or
    /// the config schema layer's) job.
    pub fn get(&self, key: usize) -> Result<u32, Error> {
        if key >= PAYLOAD_WORDS {
            return Err(Error::KeyOutOfRange(key));
        }
        Ok(self.record.payload[key])
    }

    /// Writes one config word in the in-memory record. Never touches flash;
    /// call [`Eeprom::save`] to persist.
    pub fn set(&mut self, key: usize, value: u32) -> Result<(), Error> {
        if key >= PAYLOAD_WORDS {
            return Err(Error::KeyOutOfRange(key));
        }
        self.record.payload[key] = value;
        Ok(())
    }

    /// Persists the in-memory record with one atomic commit and returns the
    /// slot it now lives in. On [`Error::WriteFailure`] the in-memory state
    /// is unchanged and the save may be retried.
    pub fn save(&mut self) -> Result<usize, Error> {
        let slot = internal::commit(&mut self.flash, self.active, &mut self.record)?;
        self.active = Some(slot);
        Ok(slot)
    }

    /// Slot the current record was adopted from or committed to, if any.
    pub fn active_slot(&self) -> Option<usize> {
        self.active
    }

    /// Schema version the store was mounted with.
    pub fn schema_version(&self) -> u32 {
        self.record.version
    }
}
