use embedded_storage::nor_flash::{NorFlash, ReadNorFlash};

/// One store slot is one flash page.
pub const PAGE_SIZE: usize = 1024;
/// 32-bit words per page.
pub const WORDS_PER_PAGE: usize = PAGE_SIZE / 4;
/// Reserved pages, rotated round-robin.
pub const SLOT_COUNT: usize = 4;
/// Byte offset of the first reserved page (pages 60..63 of a 64 KiB part).
pub const REGION_OFFSET: u32 = 0xF000;
/// Value an erased flash word reads as.
pub const ERASED_WORD: u32 = 0xFFFF_FFFF;

pub(crate) const fn slot_offset(slot: usize) -> u32 {
    REGION_OFFSET + (slot * PAGE_SIZE) as u32
}

/// Flash controller capability the store programs through.
///
/// Matches the word-programming surface of an FMC-style embedded flash
/// controller. A blanket implementation covers every
/// [`embedded_storage::nor_flash::NorFlash`] type, so HAL flash drivers and
/// in-memory test flashes plug in directly; controllers with a real
/// lock/unlock sequence implement the trait themselves.
pub trait FlashDriver {
    type Error;

    /// Open the controller for programming.
    fn unlock(&mut self) -> Result<(), Self::Error>;

    /// Re-lock the controller.
    fn lock(&mut self) -> Result<(), Self::Error>;

    /// Erase the page starting at `offset` back to all ones.
    fn erase_page(&mut self, offset: u32) -> Result<(), Self::Error>;

    /// Program one 32-bit word at a word-aligned `offset`.
    fn program_word(&mut self, offset: u32, word: u32) -> Result<(), Self::Error>;

    /// Read `bytes.len()` bytes starting at `offset`.
    fn read(&mut self, offset: u32, bytes: &mut [u8]) -> Result<(), Self::Error>;
}

impl<T: NorFlash> FlashDriver for T {
    type Error = T::Error;

    // NorFlash implementations manage controller locking internally.
    fn unlock(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }

    fn lock(&mut self) -> Result<(), Self::Error> {
        Ok(())
    }

    fn erase_page(&mut self, offset: u32) -> Result<(), Self::Error> {
        self.erase(offset, offset + PAGE_SIZE as u32)
    }

    fn program_word(&mut self, offset: u32, word: u32) -> Result<(), Self::Error> {
        self.write(offset, &word.to_le_bytes())
    }

    fn read(&mut self, offset: u32, bytes: &mut [u8]) -> Result<(), Self::Error> {
        ReadNorFlash::read(self, offset, bytes)
    }
}
