use super::error::WireError;
use super::reader::WireReader;
use super::writer::WireWriter;
use ferrous_lookup_domain::{Header, Opcode};

pub const HEADER_LEN: usize = 12;

const QR: u16 = 0x8000;
const AA: u16 = 0x0400;
const TC: u16 = 0x0200;
const RD: u16 = 0x0100;
const RA: u16 = 0x0080;
const AD: u16 = 0x0020;
const CD: u16 = 0x0010;

pub fn pack_flags(header: &Header) -> u16 {
    let mut flags = (u16::from(header.opcode.to_u8() & 0x0F) << 11)
        | u16::from(header.response_code & 0x0F);
    for (set, bit) in [
        (header.is_response, QR),
        (header.authoritative, AA),
        (header.truncated, TC),
        (header.recursion_desired, RD),
        (header.recursion_available, RA),
        (header.authentic_data, AD),
        (header.checking_disabled, CD),
    ] {
        if set {
            flags |= bit;
        }
    }
    flags
}

pub fn read(reader: &mut WireReader<'_>) -> Result<Header, WireError> {
    let id = reader.read_u16()?;
    let flags = reader.read_u16()?;
    Ok(Header {
        id,
        is_response: flags & QR != 0,
        opcode: Opcode::from_u8(((flags >> 11) & 0x0F) as u8),
        authoritative: flags & AA != 0,
        truncated: flags & TC != 0,
        recursion_desired: flags & RD != 0,
        recursion_available: flags & RA != 0,
        authentic_data: flags & AD != 0,
        checking_disabled: flags & CD != 0,
        response_code: (flags & 0x000F) as u8,
        question_count: reader.read_u16()?,
        answer_count: reader.read_u16()?,
        authority_count: reader.read_u16()?,
        additional_count: reader.read_u16()?,
    })
}

pub fn write(writer: &mut WireWriter, header: &Header) {
    writer.write_u16(header.id);
    writer.write_u16(pack_flags(header));
    writer.write_u16(header.question_count);
    writer.write_u16(header.answer_count);
    writer.write_u16(header.authority_count);
    writer.write_u16(header.additional_count);
}

/// Transaction id of a raw message, if it is long enough to carry one.
pub fn peek_id(bytes: &[u8]) -> Option<u16> {
    bytes.get(..2).map(|b| u16::from_be_bytes([b[0], b[1]]))
}
