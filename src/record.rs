use crate::platform::{ERASED_WORD, PAGE_SIZE, WORDS_PER_PAGE};

/// Start and end marker of a committed record.
pub(crate) const MAGIC: u32 = 0xAAAA_AAAA;

/// Config words per record: a full page minus start flag, schema version,
/// checksum and end flag.
pub const PAYLOAD_WORDS: usize = WORDS_PER_PAGE - 4;

const _: () = assert!(
    (PAYLOAD_WORDS + 4) * 4 == PAGE_SIZE,
    "Record layout must fill exactly one page"
);

/// One configuration record, as laid out in a flash page. All fields are
/// little-endian 32-bit words on flash.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct Record {
    pub(crate) start_flag: u32,
    pub(crate) version: u32,
    pub(crate) checksum: u32,
    pub(crate) payload: [u32; PAYLOAD_WORDS],
    pub(crate) end_flag: u32,
}

impl Record {
    /// Record for a store with no history: flags set, payload all erased
    /// words. The checksum is computed at commit time.
    pub(crate) fn fresh(version: u32) -> Self {
        Self {
            start_flag: MAGIC,
            version,
            checksum: 0,
            payload: [ERASED_WORD; PAYLOAD_WORDS],
            end_flag: MAGIC,
        }
    }

    /// Splits a page image into record fields. Rejects only on length
    /// mismatch; field contents are judged by [`Record::is_valid`].
    pub(crate) fn decode(bytes: &[u8]) -> Option<Self> {
        if bytes.len() != PAGE_SIZE {
            return None;
        }

        let mut words = [0u32; WORDS_PER_PAGE];
        for (word, raw) in words.iter_mut().zip(bytes.chunks_exact(4)) {
            *word = u32::from_le_bytes([raw[0], raw[1], raw[2], raw[3]]);
        }

        let mut payload = [0u32; PAYLOAD_WORDS];
        payload.copy_from_slice(&words[3..3 + PAYLOAD_WORDS]);

        Some(Self {
            start_flag: words[0],
            version: words[1],
            checksum: words[2],
            payload,
            end_flag: words[WORDS_PER_PAGE - 1],
        })
    }

    /// Page image in layout order, ready to be programmed word by word.
    pub(crate) fn to_words(&self) -> [u32; WORDS_PER_PAGE] {
        let mut words = [0u32; WORDS_PER_PAGE];
        words[0] = self.start_flag;
        words[1] = self.version;
        words[2] = self.checksum;
        words[3..3 + PAYLOAD_WORDS].copy_from_slice(&self.payload);
        words[WORDS_PER_PAGE - 1] = self.end_flag;
        words
    }

    /// Schema version plus the wrapping sum of all payload words.
    pub(crate) fn compute_checksum(&self) -> u32 {
        self.payload
            .iter()
            .fold(self.version, |sum, word| sum.wrapping_add(*word))
    }

    pub(crate) fn refresh_checksum(&mut self) {
        self.checksum = self.compute_checksum();
    }

    /// Both flags match, the version is the expected one and the stored
    /// checksum agrees with the payload.
    pub(crate) fn is_valid(&self, expected_version: u32) -> bool {
        self.start_flag == MAGIC
            && self.end_flag == MAGIC
            && self.version == expected_version
            && self.checksum == self.compute_checksum()
    }
}
