use thiserror::Error;

/// Errors surfaced by store operations. Slots found corrupt or written
/// under another schema version are not errors; the init scan skips them
/// silently and reports a cold start when nothing usable remains.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
#[non_exhaustive]
pub enum Error {
    /// The key index lies past the end of the record payload. The record is
    /// left unchanged.
    #[error("key index {0} out of range")]
    KeyOutOfRange(usize),

    /// A flash operation of the commit protocol failed. The in-memory record
    /// and the active slot index are unchanged; the save may be retried.
    #[error("flash write failure")]
    WriteFailure,
}
