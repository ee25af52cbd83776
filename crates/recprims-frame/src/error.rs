use std::fmt;

/// Which checksum in a frame failed verification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChecksumField {
    /// The checksum over the 8-byte length prefix.
    Length,
    /// The checksum over the payload.
    Payload,
}

impl fmt::Display for ChecksumField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ChecksumField::Length => f.write_str("length"),
            ChecksumField::Payload => f.write_str("payload"),
        }
    }
}

/// Errors that can occur while writing or reading records.
///
/// "Not yet available" and "end of stream" are not errors; see
/// [`ReadOutcome`](crate::reader::ReadOutcome).
#[derive(Debug, thiserror::Error)]
pub enum FrameError {
    /// A stored checksum does not match the recomputed one.
    #[error("corrupt record at offset {offset}: {field} checksum mismatch")]
    Corrupt { field: ChecksumField, offset: u64 },

    /// The source finished in the middle of a frame.
    #[error("truncated record at offset {offset} ({available} of {needed} bytes present)")]
    Truncated {
        offset: u64,
        available: u64,
        needed: u64,
    },

    /// The payload exceeds the configured maximum size.
    #[error("payload too large ({size} bytes, max {max})")]
    PayloadTooLarge { size: u64, max: u64 },

    /// The reader already reported corruption and cannot continue.
    #[error("reader stopped after corruption at offset {offset}")]
    Poisoned { offset: u64 },

    /// The sink accepted zero bytes.
    #[error("sink closed (incomplete record)")]
    SinkClosed,

    /// An I/O error occurred while reading or writing records.
    #[error("record I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl FrameError {
    /// True for errors that mean the stored bytes are bad, as opposed to I/O
    /// trouble or misuse.
    pub fn is_data_loss(&self) -> bool {
        matches!(
            self,
            FrameError::Corrupt { .. } | FrameError::Truncated { .. } | FrameError::Poisoned { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, FrameError>;
