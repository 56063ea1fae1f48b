//! Named configuration keys, factory defaults and the ADC scaling that the
//! supervisor reads its thresholds through. Each key owns one payload word
//! of the store record, in declaration order.

use crate::platform::{ERASED_WORD, FlashDriver};
use crate::record::PAYLOAD_WORDS;
use crate::Eeprom;
use strum::{EnumCount, IntoEnumIterator};

/// Full-scale reading of the 12-bit supply ADC.
pub const ADC_MAX: u32 = 4095;

/// The supervisor settings, one payload word each.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    strum::Display,
    strum::EnumCount,
    strum::EnumIter,
    strum::EnumString,
)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE", ascii_case_insensitive)]
#[repr(usize)]
pub enum ConfigId {
    /// Divider pull-up, kilohm.
    AdcVoltPullup,
    /// Divider pull-down, kilohm.
    AdcVoltPulldown,
    /// ADC reference, millivolts.
    AdcVref,
    /// Supply level that arms the under-voltage shutdown, millivolts.
    VoltUvlo,
    /// Supply level that wakes the system from standby, millivolts.
    VoltWakeup,
    /// Seconds the wake condition must hold before starting.
    TimeWakeup,
    /// Seconds the router gets to boot before supervision begins.
    TimeStarting,
    /// Seconds between shutdown notify and dropping the rails.
    TimeShutdown,
    /// Seconds of no wake condition before standby turns into sleep.
    TimeEnterSleep,
    /// Seconds without watchdog service before the router is restarted.
    TimeoutWdt,
    /// Seconds of under-voltage before shutdown begins.
    TimeoutUvlo,
}

const _: () = assert!(
    ConfigId::COUNT <= PAYLOAD_WORDS,
    "Too many config keys for one record"
);

impl ConfigId {
    /// Factory default for this key.
    pub const fn default_value(self) -> u32 {
        match self {
            ConfigId::AdcVoltPullup => 200,
            ConfigId::AdcVoltPulldown => 20,
            ConfigId::AdcVref => 3330,
            ConfigId::VoltUvlo => 11_800,
            ConfigId::VoltWakeup => 13_000,
            ConfigId::TimeWakeup => 2,
            ConfigId::TimeStarting => 30,
            ConfigId::TimeShutdown => 30,
            ConfigId::TimeEnterSleep => 10,
            ConfigId::TimeoutWdt => 60,
            ConfigId::TimeoutUvlo => 10,
        }
    }

    /// Payload word this key is stored in.
    pub const fn index(self) -> usize {
        self as usize
    }
}

impl<T: FlashDriver> Eeprom<T> {
    /// Stored value for `id`, or its factory default when the word was never
    /// written.
    pub fn config_or_default(&self, id: ConfigId) -> u32 {
        match self.get(id.index()) {
            Ok(ERASED_WORD) | Err(_) => id.default_value(),
            Ok(value) => value,
        }
    }

    /// Writes one setting in the in-memory record.
    pub fn set_config(&mut self, id: ConfigId, value: u32) {
        // every ConfigId index is in range, proven at compile time
        let _ = self.set(id.index(), value);
    }

    /// Resets every setting to its factory default, in the in-memory record
    /// only. The factory-reset flow is this followed by a save.
    pub fn seed_defaults(&mut self) {
        for id in ConfigId::iter() {
            self.set_config(id, id.default_value());
        }
    }

    /// Snapshot of all settings with defaults substituted, for consumers
    /// that read them once per cycle.
    pub fn settings(&self) -> Settings {
        Settings {
            pullup_kohm: self.config_or_default(ConfigId::AdcVoltPullup),
            pulldown_kohm: self.config_or_default(ConfigId::AdcVoltPulldown),
            vref_mv: self.config_or_default(ConfigId::AdcVref),
            uvlo_mv: self.config_or_default(ConfigId::VoltUvlo),
            wakeup_mv: self.config_or_default(ConfigId::VoltWakeup),
            wakeup_s: self.config_or_default(ConfigId::TimeWakeup),
            starting_s: self.config_or_default(ConfigId::TimeStarting),
            shutdown_s: self.config_or_default(ConfigId::TimeShutdown),
            enter_sleep_s: self.config_or_default(ConfigId::TimeEnterSleep),
            wdt_timeout_s: self.config_or_default(ConfigId::TimeoutWdt),
            uvlo_timeout_s: self.config_or_default(ConfigId::TimeoutUvlo),
        }
    }
}

/// Materialized supervisor thresholds.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Settings {
    pub pullup_kohm: u32,
    pub pulldown_kohm: u32,
    pub vref_mv: u32,
    pub uvlo_mv: u32,
    pub wakeup_mv: u32,
    pub wakeup_s: u32,
    pub starting_s: u32,
    pub shutdown_s: u32,
    pub enter_sleep_s: u32,
    pub wdt_timeout_s: u32,
    pub uvlo_timeout_s: u32,
}

impl Settings {
    /// Factory defaults without a store behind them.
    pub const fn defaults() -> Self {
        Self {
            pullup_kohm: ConfigId::AdcVoltPullup.default_value(),
            pulldown_kohm: ConfigId::AdcVoltPulldown.default_value(),
            vref_mv: ConfigId::AdcVref.default_value(),
            uvlo_mv: ConfigId::VoltUvlo.default_value(),
            wakeup_mv: ConfigId::VoltWakeup.default_value(),
            wakeup_s: ConfigId::TimeWakeup.default_value(),
            starting_s: ConfigId::TimeStarting.default_value(),
            shutdown_s: ConfigId::TimeShutdown.default_value(),
            enter_sleep_s: ConfigId::TimeEnterSleep.default_value(),
            wdt_timeout_s: ConfigId::TimeoutWdt.default_value(),
            uvlo_timeout_s: ConfigId::TimeoutUvlo.default_value(),
        }
    }

    /// Converts a raw supply ADC reading to millivolts through the divider:
    /// `vref * raw / full_scale`, scaled back up by `(pullup + pulldown) /
    /// pulldown`, in that integer order.
    pub fn supply_millivolts(&self, raw_adc: u32) -> u32 {
        if self.pulldown_kohm == 0 {
            return 0;
        }

        let node = u64::from(self.vref_mv) * u64::from(raw_adc.min(ADC_MAX)) / u64::from(ADC_MAX);
        let range = u64::from(self.pullup_kohm) + u64::from(self.pulldown_kohm);
        let supply = node.saturating_mul(range) / u64::from(self.pulldown_kohm);
        u32::try_from(supply).unwrap_or(u32::MAX)
    }
}

impl Default for Settings {
    fn default() -> Self {
        Self::defaults()
    }
}
