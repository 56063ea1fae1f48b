use crate::error::Error;
use crate::platform::{FlashDriver, PAGE_SIZE, SLOT_COUNT, WORDS_PER_PAGE, slot_offset};
use crate::record::Record;
#[cfg(feature = "defmt")]
use defmt::trace;

/// Scans the reserved pages in ascending slot order and adopts the first
/// valid record. At most one slot is valid in steady state; after a crash
/// inside the commit window two can be, and ascending order makes the
/// lower index win deterministically.
pub(crate) fn scan<T: FlashDriver>(flash: &mut T, expected_version: u32) -> Option<(usize, Record)> {
    let mut page = [0u8; PAGE_SIZE];

    for slot in 0..SLOT_COUNT {
        if flash.read(slot_offset(slot), &mut page).is_err() {
            #[cfg(feature = "defmt")]
            trace!("scan: slot {} unreadable, skipping", slot);
            continue;
        }

        let Some(record) = Record::decode(&page) else {
            continue;
        };

        if record.is_valid(expected_version) {
            #[cfg(feature = "defmt")]
            trace!("scan: adopting slot {}", slot);
            #[cfg(feature = "debug-logs")]
            println!("scan: adopting slot {slot}");
            return Some((slot, record));
        }

        #[cfg(feature = "defmt")]
        trace!("scan: slot {} invalid, skipping", slot);
    }

    None
}

/// Commits the record to the slot after `active`, then reclaims the previous
/// slot. The whole sequence runs with interrupts masked and the flash
/// unlocked; the controller is re-locked on both success and failure paths.
///
/// A cold-start store has no active slot: the commit targets slot 0 and
/// there is nothing to reclaim.
pub(crate) fn commit<T: FlashDriver>(
    flash: &mut T,
    active: Option<usize>,
    record: &mut Record,
) -> Result<usize, Error> {
    let target = match active {
        Some(slot) => (slot + 1) % SLOT_COUNT,
        None => 0,
    };

    record.refresh_checksum();
    let words = record.to_words();

    #[cfg(feature = "debug-logs")]
    println!("commit: active {active:?} -> slot {target}");

    critical_section::with(|_| {
        flash.unlock().map_err(|_| Error::WriteFailure)?;
        let programmed = program_target(flash, target, &words, active);
        let locked = flash.lock().map_err(|_| Error::WriteFailure);
        programmed.and(locked)
    })?;

    Ok(target)
}

fn program_target<T: FlashDriver>(
    flash: &mut T,
    target: usize,
    words: &[u32; WORDS_PER_PAGE],
    previous: Option<usize>,
) -> Result<(), Error> {
    let base = slot_offset(target);

    // the target is only erased when something was ever programmed into it
    let mut page = [0u8; PAGE_SIZE];
    flash
        .read(base, &mut page)
        .map_err(|_| Error::WriteFailure)?;
    if page.iter().any(|&byte| byte != 0xFF) {
        #[cfg(feature = "defmt")]
        trace!("commit: erasing dirty target {}", target);
        flash.erase_page(base).map_err(|_| Error::WriteFailure)?;
    }

    for (index, &word) in words.iter().enumerate() {
        flash
            .program_word(base + (index * 4) as u32, word)
            .map_err(|_| Error::WriteFailure)?;
    }

    if let Some(previous) = previous {
        flash
            .erase_page(slot_offset(previous))
            .map_err(|_| Error::WriteFailure)?;
    }

    Ok(())
}
