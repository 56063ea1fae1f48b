//! Power-sequencing state machine for the supervised router rail.
//!
//! Pure logic clocked by a 1 Hz [`PowerSequencer::tick`]: the board loop
//! samples the inputs, ticks the machine, applies [`PowerSequencer::rails`]
//! to the output pins and honors any returned [`Request`]. One-second
//! output pulses (shutdown notify, router power-cycle) occupy one tick of
//! their own, so state dwell times match a blocking implementation.

use crate::config::Settings;
#[cfg(feature = "defmt")]
use defmt::trace;

/// Supervisor phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq, strum::Display)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[strum(serialize_all = "SCREAMING_SNAKE_CASE")]
pub enum SystemState {
    /// Rails down, waiting for a wake condition.
    Standby,
    /// Rails up, router booting; supervision starts after the grace time.
    Starting,
    /// Supervising voltage and the external watchdog.
    Running,
    /// Shutdown notify sent, waiting out the grace time before rails drop.
    ShuttingDown,
    /// Router rail power-cycled after a watchdog timeout.
    Restarting,
}

/// Latched output levels, applied by the board loop after each tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct Rails {
    pub router_enable: bool,
    pub dc_enable: bool,
    pub shutdown_notify: bool,
}

/// Input sample for one tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Inputs {
    /// ACC-style wake line level.
    pub wake: bool,
    /// Measured supply, millivolts.
    pub supply_mv: u32,
    /// Watchdog reset button level, active means held.
    pub button_held: bool,
}

/// Side requests a tick can raise for the board loop.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Request {
    /// Standby saw no wake condition for the configured time; the board
    /// should enter its deep-sleep mode.
    EnterSleep,
}

enum Pulse {
    Notify,
    RouterReset,
}

pub struct PowerSequencer {
    state: SystemState,
    rails: Rails,
    pulse: Option<Pulse>,
    wdt_count: u32,
    uvlo_count: u32,
    time_count: u32,
}

impl PowerSequencer {
    /// Starts in standby with all rails down.
    pub fn new() -> Self {
        Self {
            state: SystemState::Standby,
            rails: Rails::default(),
            pulse: None,
            wdt_count: 0,
            uvlo_count: 0,
            time_count: 0,
        }
    }

    pub fn state(&self) -> SystemState {
        self.state
    }

    pub fn rails(&self) -> Rails {
        self.rails
    }

    /// Zeroes the watchdog counter. Wired to the external watchdog input
    /// edge and to the reset-button release.
    pub fn service_watchdog(&mut self) {
        self.wdt_count = 0;
    }

    fn enter(&mut self, state: SystemState) {
        #[cfg(feature = "defmt")]
        trace!("sequencer: -> {}", state);
        self.state = state;

        match state {
            SystemState::Starting => {
                self.time_count = 0;
                self.rails.router_enable = true;
                self.rails.dc_enable = true;
            }
            SystemState::Running => {
                self.wdt_count = 0;
                self.uvlo_count = 0;
                self.time_count = 0;
            }
            SystemState::ShuttingDown => {
                self.rails.shutdown_notify = true;
                self.pulse = Some(Pulse::Notify);
                self.time_count = 0;
            }
            SystemState::Restarting => {
                self.rails.router_enable = false;
                self.pulse = Some(Pulse::RouterReset);
                self.time_count = 0;
            }
            SystemState::Standby => {
                self.time_count = 0;
                self.uvlo_count = 0;
            }
        }
    }

    /// Advances the machine by one second.
    ///
    /// A pending output pulse is finished first and consumes the whole
    /// tick; no counters move on a pulse tick.
    pub fn tick(&mut self, inputs: &Inputs, settings: &Settings) -> Option<Request> {
        if let Some(pulse) = self.pulse.take() {
            match pulse {
                Pulse::Notify => self.rails.shutdown_notify = false,
                Pulse::RouterReset => self.rails.router_enable = true,
            }
            return None;
        }

        match self.state {
            SystemState::Starting | SystemState::Restarting => {
                self.time_count += 1;
                if self.time_count >= settings.starting_s {
                    self.enter(SystemState::Running);
                }
            }
            SystemState::Running => {
                if !inputs.wake && inputs.supply_mv < settings.uvlo_mv {
                    self.uvlo_count += 1;
                    #[cfg(feature = "defmt")]
                    trace!("sequencer: uvlo count {}", self.uvlo_count);
                    if self.uvlo_count > settings.uvlo_timeout_s {
                        self.enter(SystemState::ShuttingDown);
                        return None;
                    }
                } else {
                    self.uvlo_count = 0;
                }

                self.wdt_count += 1;
                if inputs.button_held {
                    self.wdt_count = 0;
                }
                if self.wdt_count > settings.wdt_timeout_s {
                    self.enter(SystemState::Restarting);
                }
            }
            SystemState::ShuttingDown => {
                self.time_count += 1;
                if self.time_count > settings.shutdown_s {
                    self.rails.router_enable = false;
                    self.rails.dc_enable = false;
                    self.enter(SystemState::Standby);
                }
            }
            SystemState::Standby => {
                if inputs.wake || inputs.supply_mv >= settings.wakeup_mv {
                    self.time_count += 1;
                    self.uvlo_count = 0;
                    if self.time_count > settings.wakeup_s {
                        self.enter(SystemState::Starting);
                    }
                } else {
                    self.time_count = 0;
                    self.uvlo_count += 1;
                    if self.uvlo_count > settings.enter_sleep_s {
                        return Some(Request::EnterSleep);
                    }
                }
            }
        }

        None
    }
}

impl Default for PowerSequencer {
    fn default() -> Self {
        Self::new()
    }
}
