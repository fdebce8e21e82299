use super::error::{WireError, WireErrorKind};
use super::name;
use ferrous_lookup_domain::DomainName;
use rustc_hash::FxHashMap;

/// Pointer targets must fit in 14 bits.
pub(crate) const MAX_POINTER_OFFSET: usize = 0x3FFF;

/// Growable output buffer for encoding messages.
///
/// When built with [`WireWriter::with_compression`], every name suffix written
/// through [`WireWriter::write_name`] is remembered and later occurrences are
/// replaced by a compression pointer.
#[derive(Debug, Default)]
pub struct WireWriter {
    buffer: Vec<u8>,
    compression: Option<FxHashMap<Vec<u8>, u16>>,
}

impl WireWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            buffer: Vec::with_capacity(capacity),
            compression: None,
        }
    }

    pub fn with_compression() -> Self {
        Self {
            buffer: Vec::with_capacity(512),
            compression: Some(FxHashMap::default()),
        }
    }

    pub fn position(&self) -> usize {
        self.buffer.len()
    }

    pub fn as_slice(&self) -> &[u8] {
        &self.buffer
    }

    pub fn into_bytes(self) -> Vec<u8> {
        self.buffer
    }

    pub fn write_u8(&mut self, value: u8) {
        self.buffer.push(value);
    }

    pub fn write_u16(&mut self, value: u16) {
        self.buffer.extend_from_slice(&value.to_be_bytes());
    }

    pub fn write_u32(&mut self, value: u32) {
        self.buffer.extend_from_slice(&value.to_be_bytes());
    }

    pub fn write_bytes(&mut self, bytes: &[u8]) {
        self.buffer.extend_from_slice(bytes);
    }

    /// Overwrites two octets at `offset`, used to back-fill RDLENGTH.
    pub fn set_u16_at(&mut self, offset: usize, value: u16) -> Result<(), WireError> {
        let slot = self
            .buffer
            .get_mut(offset..offset + 2)
            .ok_or_else(|| WireError::encoding(WireErrorKind::ValueOutOfRange, offset, 2))?;
        slot.copy_from_slice(&value.to_be_bytes());
        Ok(())
    }

    pub fn write_character_string(&mut self, bytes: &[u8]) -> Result<(), WireError> {
        let len = u8::try_from(bytes.len()).map_err(|_| {
            WireError::encoding(WireErrorKind::ValueOutOfRange, self.position(), bytes.len())
        })?;
        self.write_u8(len);
        self.write_bytes(bytes);
        Ok(())
    }

    /// Writes `name`, compressing against earlier names when enabled.
    pub fn write_name(&mut self, name: &DomainName) {
        if self.compression.is_none() {
            return self.write_name_uncompressed(name);
        }

        let labels: Vec<&[u8]> = name.labels().collect();
        for i in 0..labels.len() {
            let suffix = name::suffix_key(&labels[i..]);
            if let Some(offset) = self.compression.as_ref().and_then(|map| map.get(&suffix)) {
                self.write_u16(0xC000 | *offset);
                return;
            }

            let here = self.position();
            if here <= MAX_POINTER_OFFSET {
                if let Some(map) = self.compression.as_mut() {
                    map.insert(suffix, here as u16);
                }
            }
            self.write_u8(labels[i].len() as u8);
            self.write_bytes(labels[i]);
        }
        self.write_u8(0);
    }

    /// Writes `name` in full, as required inside RDATA of newer record types.
    pub fn write_name_uncompressed(&mut self, name: &DomainName) {
        name::encode_into(name, &mut self.buffer);
    }
}
