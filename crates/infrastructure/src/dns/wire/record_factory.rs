//! Resource record decoding and encoding, dispatched on the record type tag.

use super::error::{WireError, WireErrorKind};
use super::name;
use super::reader::WireReader;
use super::writer::WireWriter;
use ferrous_lookup_domain::{
    Caa, DnsClass, DomainName, EdnsOption, RecordData, RecordType, ResourceRecord, Soa,
};
use std::net::{Ipv4Addr, Ipv6Addr};

/// The fixed part of a record preceding RDATA.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordHeader {
    pub name: DomainName,
    pub record_type: RecordType,
    pub class: DnsClass,
    pub ttl: u32,
    pub rd_length: u16,
}

pub fn read_record_header(reader: &mut WireReader<'_>) -> Result<RecordHeader, WireError> {
    Ok(RecordHeader {
        name: name::decode(reader)?,
        record_type: RecordType::from_u16(reader.read_u16()?),
        class: DnsClass::from_u16(reader.read_u16()?),
        ttl: reader.read_u32()?,
        rd_length: reader.read_u16()?,
    })
}

/// Reads one full record and checks that RDATA decoding consumed exactly
/// RDLENGTH octets.
pub fn read_record(reader: &mut WireReader<'_>) -> Result<ResourceRecord, WireError> {
    let header = read_record_header(reader)?;
    let data = decode(&header, reader)?;
    Ok(ResourceRecord::new(
        header.name,
        header.record_type,
        header.class,
        header.ttl,
        header.rd_length,
        data,
    ))
}

pub fn decode(header: &RecordHeader, reader: &mut WireReader<'_>) -> Result<RecordData, WireError> {
    let start = reader.position();
    let len = usize::from(header.rd_length);
    if reader.remaining() < len {
        return Err(reader.error(WireErrorKind::InsufficientBytes, len));
    }
    let end = start + len;

    let data = if len == 0 && header.record_type != RecordType::OPT {
        // Empty RDATA is legal for any type in update messages.
        RecordData::Unknown(Vec::new())
    } else {
        decode_rdata(header.record_type, reader, end)?
    };

    if reader.position() != end {
        return Err(reader.error_at(WireErrorKind::RecordFraming, start, len));
    }
    Ok(data)
}

fn remaining_until(reader: &WireReader<'_>, end: usize) -> Result<usize, WireError> {
    end.checked_sub(reader.position())
        .ok_or_else(|| reader.error(WireErrorKind::RecordFraming, 0))
}

fn decode_rdata(
    record_type: RecordType,
    reader: &mut WireReader<'_>,
    end: usize,
) -> Result<RecordData, WireError> {
    let data = match record_type {
        RecordType::A => {
            let b = reader.read_slice(4)?;
            RecordData::A(Ipv4Addr::new(b[0], b[1], b[2], b[3]))
        }
        RecordType::AAAA => {
            let mut octets = [0u8; 16];
            octets.copy_from_slice(reader.read_slice(16)?);
            RecordData::AAAA(Ipv6Addr::from(octets))
        }
        RecordType::NS => RecordData::NS(name::decode(reader)?),
        RecordType::CNAME => RecordData::CNAME(name::decode(reader)?),
        RecordType::DNAME => RecordData::DNAME(name::decode(reader)?),
        RecordType::PTR => RecordData::PTR(name::decode(reader)?),
        RecordType::SOA => RecordData::SOA(Soa {
            mname: name::decode(reader)?,
            rname: name::decode(reader)?,
            serial: reader.read_u32()?,
            refresh: reader.read_u32()?,
            retry: reader.read_u32()?,
            expire: reader.read_u32()?,
            minimum: reader.read_u32()?,
        }),
        RecordType::HINFO => RecordData::HINFO {
            cpu: reader.read_character_string()?,
            os: reader.read_character_string()?,
        },
        RecordType::MX => RecordData::MX {
            preference: reader.read_u16()?,
            exchange: name::decode(reader)?,
        },
        RecordType::TXT => {
            let mut strings = Vec::new();
            while reader.position() < end {
                strings.push(reader.read_character_string()?);
            }
            RecordData::TXT(strings)
        }
        RecordType::SRV => RecordData::SRV {
            priority: reader.read_u16()?,
            weight: reader.read_u16()?,
            port: reader.read_u16()?,
            target: name::decode(reader)?,
        },
        RecordType::OPT => {
            let mut options = Vec::new();
            while reader.position() < end {
                let code = reader.read_u16()?;
                let len = reader.read_u16()? as usize;
                options.push(EdnsOption {
                    code,
                    data: reader.read_vec(len)?,
                });
            }
            RecordData::OPT(options)
        }
        RecordType::DS => {
            let key_tag = reader.read_u16()?;
            let algorithm = reader.read_u8()?;
            let digest_type = reader.read_u8()?;
            let digest_len = remaining_until(reader, end)?;
            RecordData::DS {
                key_tag,
                algorithm,
                digest_type,
                digest: reader.read_vec(digest_len)?,
            }
        }
        RecordType::NSEC => {
            let next_domain = name::decode(reader)?;
            let types = read_type_bitmap(reader, end)?;
            RecordData::NSEC { next_domain, types }
        }
        RecordType::CAA => {
            let flags = reader.read_u8()?;
            let tag_len = reader.read_u8()? as usize;
            let tag_at = reader.position();
            let tag = reader.read_slice(tag_len)?;
            if tag.is_empty() || !tag.iter().all(u8::is_ascii_alphanumeric) {
                return Err(reader.error_at(WireErrorKind::InvalidRdata, tag_at, tag_len));
            }
            let tag = String::from_utf8_lossy(tag).into_owned();
            let value_len = remaining_until(reader, end)?;
            RecordData::CAA(Caa {
                flags,
                tag,
                value: reader.read_vec(value_len)?,
            })
        }
        _ => {
            let len = remaining_until(reader, end)?;
            RecordData::Unknown(reader.read_vec(len)?)
        }
    };
    Ok(data)
}

/// NSEC style type bitmap: (window, length, bitmap) blocks up to `end`.
fn read_type_bitmap(reader: &mut WireReader<'_>, end: usize) -> Result<Vec<RecordType>, WireError> {
    let mut types = Vec::new();
    while reader.position() < end {
        let window = u16::from(reader.read_u8()?);
        let len_at = reader.position();
        let len = reader.read_u8()? as usize;
        if len == 0 || len > 32 {
            return Err(reader.error_at(WireErrorKind::InvalidRdata, len_at, len));
        }
        for (i, byte) in reader.read_slice(len)?.iter().enumerate() {
            for bit in 0..8u16 {
                if byte & (0x80 >> bit) != 0 {
                    types.push(RecordType::from_u16((window << 8) | (i as u16 * 8 + bit)));
                }
            }
        }
    }
    Ok(types)
}

fn write_type_bitmap(writer: &mut WireWriter, types: &[RecordType]) {
    let mut codes: Vec<u16> = types.iter().map(RecordType::to_u16).collect();
    codes.sort_unstable();
    codes.dedup();

    let mut i = 0;
    while i < codes.len() {
        let window = codes[i] >> 8;
        let mut bitmap = [0u8; 32];
        let mut used = 0;
        while i < codes.len() && codes[i] >> 8 == window {
            let low = (codes[i] & 0xFF) as usize;
            bitmap[low / 8] |= 0x80 >> (low % 8);
            used = used.max(low / 8 + 1);
            i += 1;
        }
        writer.write_u8(window as u8);
        writer.write_u8(used as u8);
        writer.write_bytes(&bitmap[..used]);
    }
}

/// Writes a full record. RDLENGTH is back-filled once RDATA is written.
pub fn write_record(writer: &mut WireWriter, record: &ResourceRecord) -> Result<(), WireError> {
    writer.write_name(&record.name);
    writer.write_u16(record.record_type.to_u16());
    writer.write_u16(record.class.to_u16());
    writer.write_u32(record.ttl);

    let length_at = writer.position();
    writer.write_u16(0);
    write_rdata(writer, &record.data)?;
    let rd_length = writer.position() - length_at - 2;
    let rd_length = u16::try_from(rd_length)
        .map_err(|_| WireError::encoding(WireErrorKind::ValueOutOfRange, length_at, rd_length))?;
    writer.set_u16_at(length_at, rd_length)
}

pub fn write_rdata(writer: &mut WireWriter, data: &RecordData) -> Result<(), WireError> {
    match data {
        RecordData::A(ip) => writer.write_bytes(&ip.octets()),
        RecordData::AAAA(ip) => writer.write_bytes(&ip.octets()),
        RecordData::NS(name) | RecordData::CNAME(name) | RecordData::PTR(name) => {
            writer.write_name(name)
        }
        RecordData::DNAME(name) => writer.write_name_uncompressed(name),
        RecordData::SOA(soa) => {
            writer.write_name(&soa.mname);
            writer.write_name(&soa.rname);
            for value in [soa.serial, soa.refresh, soa.retry, soa.expire, soa.minimum] {
                writer.write_u32(value);
            }
        }
        RecordData::HINFO { cpu, os } => {
            writer.write_character_string(cpu)?;
            writer.write_character_string(os)?;
        }
        RecordData::MX {
            preference,
            exchange,
        } => {
            writer.write_u16(*preference);
            writer.write_name(exchange);
        }
        RecordData::TXT(strings) => {
            for s in strings {
                writer.write_character_string(s)?;
            }
        }
        RecordData::SRV {
            priority,
            weight,
            port,
            target,
        } => {
            writer.write_u16(*priority);
            writer.write_u16(*weight);
            writer.write_u16(*port);
            writer.write_name_uncompressed(target);
        }
        RecordData::OPT(options) => {
            for option in options {
                let len = u16::try_from(option.data.len()).map_err(|_| {
                    WireError::encoding(
                        WireErrorKind::ValueOutOfRange,
                        writer.position(),
                        option.data.len(),
                    )
                })?;
                writer.write_u16(option.code);
                writer.write_u16(len);
                writer.write_bytes(&option.data);
            }
        }
        RecordData::DS {
            key_tag,
            algorithm,
            digest_type,
            digest,
        } => {
            writer.write_u16(*key_tag);
            writer.write_u8(*algorithm);
            writer.write_u8(*digest_type);
            writer.write_bytes(digest);
        }
        RecordData::NSEC { next_domain, types } => {
            writer.write_name_uncompressed(next_domain);
            write_type_bitmap(writer, types);
        }
        RecordData::CAA(caa) => {
            writer.write_u8(caa.flags);
            writer.write_character_string(caa.tag.as_bytes())?;
            writer.write_bytes(&caa.value);
        }
        RecordData::Unknown(raw) => writer.write_bytes(raw),
    }
    Ok(())
}
