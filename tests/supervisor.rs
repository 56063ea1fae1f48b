mod common;

use common::Flash;
use powerseq::Eeprom;
use powerseq::config::ConfigId;
use powerseq::sequencer::{Inputs, PowerSequencer, SystemState};
use pretty_assertions::assert_eq;

#[test]
fn stored_settings_drive_the_sequencer() {
    let mut flash = Flash::new(64);
    let settings = {
        let (mut eeprom, _) = Eeprom::init(&mut flash, 1);
        eeprom.seed_defaults();
        eeprom.set_config(ConfigId::TimeWakeup, 0);
        eeprom.set_config(ConfigId::TimeStarting, 1);
        eeprom.save().unwrap();
        eeprom.settings()
    };

    let mut seq = PowerSequencer::new();
    let inputs = Inputs {
        wake: true,
        supply_mv: 12_000,
        button_held: false,
    };
    seq.tick(&inputs, &settings);
    assert_eq!(seq.state(), SystemState::Starting);
    seq.tick(&inputs, &settings);
    assert_eq!(seq.state(), SystemState::Running);
}

#[test]
fn stored_adc_calibration_feeds_the_voltage_conversion() {
    let mut flash = Flash::new(64);
    let (mut eeprom, _) = Eeprom::init(&mut flash, 1);
    // 200k/20k divider with a 3.0 V reference instead of the trimmed 3.33 V
    eeprom.set_config(ConfigId::AdcVref, 3000);
    let settings = eeprom.settings();
    assert_eq!(settings.supply_millivolts(4095), 33_000);
}
