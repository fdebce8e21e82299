use bytes::Bytes;
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum WireErrorKind {
    #[error("unexpected end of message")]
    InsufficientBytes,

    #[error("compression pointer does not point before the current label sequence")]
    PointerNotPriorToLabel,

    #[error("unsupported label type")]
    BadLabelType,

    #[error("label longer than 63 octets")]
    LabelTooLong,

    #[error("name longer than 255 octets")]
    NameTooLong,

    #[error("record data length does not match declared RDLENGTH")]
    RecordFraming,

    #[error("invalid record data")]
    InvalidRdata,

    #[error("value out of range")]
    ValueOutOfRange,
}

/// A codec failure, with the buffer that was being read when it happened.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error(
    "{kind} at offset {offset} (requested {requested} bytes, message is {} bytes)",
    .buffer.len()
)]
pub struct WireError {
    pub kind: WireErrorKind,
    pub offset: usize,
    pub requested: usize,
    pub buffer: Bytes,
}

impl WireError {
    pub fn new(kind: WireErrorKind, offset: usize, requested: usize, buffer: &[u8]) -> Self {
        Self {
            kind,
            offset,
            requested,
            buffer: Bytes::copy_from_slice(buffer),
        }
    }

    /// Error raised while encoding, where there is no input buffer.
    pub fn encoding(kind: WireErrorKind, offset: usize, requested: usize) -> Self {
        Self {
            kind,
            offset,
            requested,
            buffer: Bytes::new(),
        }
    }
}
