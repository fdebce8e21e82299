use super::error::{WireError, WireErrorKind};

/// Cursor over a received message. All integers are read big-endian.
///
/// The reader keeps the whole message so compression pointers can be
/// followed to any earlier offset.
pub struct WireReader<'a> {
    buffer: &'a [u8],
    position: usize,
}

impl<'a> WireReader<'a> {
    pub fn new(buffer: &'a [u8]) -> Self {
        Self {
            buffer,
            position: 0,
        }
    }

    pub fn buffer(&self) -> &'a [u8] {
        self.buffer
    }

    pub fn position(&self) -> usize {
        self.position
    }

    pub(crate) fn set_position(&mut self, position: usize) {
        self.position = position;
    }

    pub fn remaining(&self) -> usize {
        self.buffer.len().saturating_sub(self.position)
    }

    pub fn is_empty(&self) -> bool {
        self.remaining() == 0
    }

    pub fn error(&self, kind: WireErrorKind, requested: usize) -> WireError {
        self.error_at(kind, self.position, requested)
    }

    pub fn error_at(&self, kind: WireErrorKind, offset: usize, requested: usize) -> WireError {
        WireError::new(kind, offset, requested, self.buffer)
    }

    pub fn read_slice(&mut self, len: usize) -> Result<&'a [u8], WireError> {
        let end = self
            .position
            .checked_add(len)
            .filter(|end| *end <= self.buffer.len())
            .ok_or_else(|| self.error(WireErrorKind::InsufficientBytes, len))?;
        let slice = &self.buffer[self.position..end];
        self.position = end;
        Ok(slice)
    }

    pub fn read_u8(&mut self) -> Result<u8, WireError> {
        Ok(self.read_slice(1)?[0])
    }

    pub fn read_u16(&mut self) -> Result<u16, WireError> {
        let b = self.read_slice(2)?;
        Ok(u16::from_be_bytes([b[0], b[1]]))
    }

    pub fn read_u32(&mut self) -> Result<u32, WireError> {
        let b = self.read_slice(4)?;
        Ok(u32::from_be_bytes([b[0], b[1], b[2], b[3]]))
    }

    pub fn read_vec(&mut self, len: usize) -> Result<Vec<u8>, WireError> {
        self.read_slice(len).map(<[u8]>::to_vec)
    }

    /// A length-prefixed `<character-string>`.
    pub fn read_character_string(&mut self) -> Result<Vec<u8>, WireError> {
        let len = self.read_u8()? as usize;
        self.read_vec(len)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_reads_big_endian() {
        let data = [0x12, 0x34, 0xDE, 0xAD, 0xBE, 0xEF, 0x07];
        let mut reader = WireReader::new(&data);
        assert_eq!(reader.read_u16().unwrap(), 0x1234);
        assert_eq!(reader.read_u32().unwrap(), 0xDEAD_BEEF);
        assert_eq!(reader.read_u8().unwrap(), 7);
        assert!(reader.is_empty());
    }

    #[test]
    fn test_overrun_reports_offset_and_request() {
        let data = [0x00, 0x01, 0x02];
        let mut reader = WireReader::new(&data);
        reader.read_u16().unwrap();

        let err = reader.read_u32().unwrap_err();
        assert_eq!(err.kind, WireErrorKind::InsufficientBytes);
        assert_eq!(err.offset, 2);
        assert_eq!(err.requested, 4);
        assert_eq!(&err.buffer[..], &data[..]);
        // A failed read does not move the cursor.
        assert_eq!(reader.position(), 2);
    }

    #[test]
    fn test_character_string() {
        let data = [3, b'a', b'b', b'c', 0];
        let mut reader = WireReader::new(&data);
        assert_eq!(reader.read_character_string().unwrap(), b"abc");
        assert_eq!(reader.read_character_string().unwrap(), b"");
    }
}
