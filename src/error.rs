#[derive(thiserror::Error, Debug, Clone, PartialEq)]
#[non_exhaustive]
pub enum Error {
    #[error("not enough data: got {actual}, need at least {minimum}")]
    NotEnoughData { actual: usize, minimum: usize },

    /// A run of samples whose length matches neither the single nor the double symbol window.
    #[error("invalid pulse of {count} samples at offset {offset}")]
    InvalidPulse { offset: usize, count: usize },

    /// A line-code symbol pair that is not part of the code.
    #[error("invalid symbol pair {pair:?} at offset {offset}")]
    InvalidSymbol { offset: usize, pair: [u8; 2] },

    #[error("invalid bit value {value} at offset {offset}")]
    InvalidBit { offset: usize, value: u8 },

    /// Leading ones run shorter than the preamble minimum.
    #[error("invalid preamble at offset {offset}: {count} leading ones")]
    InvalidPreamble { offset: usize, count: usize },

    #[error("bit stuffing violation at offset {offset}")]
    Stuffing { offset: usize },

    #[error("no end of frame within {limit} bits of offset {offset}")]
    MissingEndOfFrame { offset: usize, limit: usize },

    #[error("{count} bits is not a whole number of bytes")]
    Misaligned { count: usize },

    #[error("checksum mismatch: expected {expected:#06x}, got {actual:#06x}")]
    ChecksumMismatch { expected: u16, actual: u16 },

    /// Payload bytes do not fit the shape selected by the data type tag.
    #[error("payload for data type {tag} expects {expected} bytes, got {actual}")]
    PayloadLength {
        tag: u8,
        expected: usize,
        actual: usize,
    },

    #[error("invalid message: {0}")]
    InvalidMessage(String),

    #[error("invalid config: {0}")]
    Config(String),
}

pub type Result<T> = std::result::Result<T, Error>;
