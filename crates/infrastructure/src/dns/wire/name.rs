//! Domain name encoding (RFC 1035 §3.1) and decoding with compression
//! pointers (RFC 1035 §4.1.4).

use super::error::{WireError, WireErrorKind};
use super::reader::WireReader;
use ferrous_lookup_domain::{DomainError, DomainName, MAX_LABEL_LENGTH, MAX_NAME_LENGTH};
use smallvec::SmallVec;

const POINTER_MASK: u8 = 0xC0;

/// Uncompressed wire form of `name`.
pub fn encode(name: &DomainName) -> Vec<u8> {
    let mut out = Vec::with_capacity(name.encoded_len());
    encode_into(name, &mut out);
    out
}

pub(crate) fn encode_into(name: &DomainName, out: &mut Vec<u8>) {
    for label in name.labels() {
        out.push(label.len() as u8);
        out.extend_from_slice(label);
    }
    out.push(0);
}

/// Uncompressed wire form of a label suffix, used as a compression map key.
pub(crate) fn suffix_key(labels: &[&[u8]]) -> Vec<u8> {
    let mut key = Vec::with_capacity(labels.iter().map(|l| l.len() + 1).sum::<usize>() + 1);
    for label in labels {
        key.push(label.len() as u8);
        key.extend_from_slice(label);
    }
    key.push(0);
    key
}

/// Reads a name at the reader position, following compression pointers.
///
/// The reader ends up just past the name as stored at the original position:
/// past the terminating zero, or past the first pointer. Every pointer must
/// target an offset before the start of the label sequence that contains it,
/// so decoding always terminates.
pub fn decode(reader: &mut WireReader<'_>) -> Result<DomainName, WireError> {
    let buffer = reader.buffer();
    let mut cursor = reader.position();
    let mut segment_start = cursor;
    let mut resume_at: Option<usize> = None;
    let mut encoded_len = 1usize;
    let mut labels: SmallVec<[&[u8]; 8]> = SmallVec::new();

    loop {
        let len = *buffer
            .get(cursor)
            .ok_or_else(|| reader.error_at(WireErrorKind::InsufficientBytes, cursor, 1))?;

        match len & POINTER_MASK {
            0x00 if len == 0 => {
                cursor += 1;
                break;
            }
            0x00 => {
                let len = len as usize;
                if len > MAX_LABEL_LENGTH {
                    return Err(reader.error_at(WireErrorKind::LabelTooLong, cursor, len));
                }
                let label = buffer
                    .get(cursor + 1..cursor + 1 + len)
                    .ok_or_else(|| reader.error_at(WireErrorKind::InsufficientBytes, cursor + 1, len))?;
                encoded_len += len + 1;
                if encoded_len > MAX_NAME_LENGTH {
                    return Err(reader.error_at(WireErrorKind::NameTooLong, cursor, len));
                }
                labels.push(label);
                cursor += 1 + len;
            }
            POINTER_MASK => {
                let low = *buffer
                    .get(cursor + 1)
                    .ok_or_else(|| reader.error_at(WireErrorKind::InsufficientBytes, cursor, 2))?;
                let target = (usize::from(len & !POINTER_MASK) << 8) | usize::from(low);
                if target >= segment_start {
                    return Err(reader.error_at(WireErrorKind::PointerNotPriorToLabel, cursor, 2));
                }
                if resume_at.is_none() {
                    resume_at = Some(cursor + 2);
                }
                cursor = target;
                segment_start = target;
            }
            _ => return Err(reader.error_at(WireErrorKind::BadLabelType, cursor, 1)),
        }
    }

    let name = DomainName::from_labels(labels).map_err(|e| {
        let kind = match e {
            DomainError::LabelTooLong(_) => WireErrorKind::LabelTooLong,
            _ => WireErrorKind::NameTooLong,
        };
        reader.error(kind, 0)
    })?;
    reader.set_position(resume_at.unwrap_or(cursor));
    Ok(name)
}
