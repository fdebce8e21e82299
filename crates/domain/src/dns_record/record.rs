use super::{DnsClass, RecordType};
use crate::DomainName;
use std::fmt;
use std::net::{Ipv4Addr, Ipv6Addr};

/// One resource record from an answer, authority or additional section.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResourceRecord {
    pub name: DomainName,
    pub record_type: RecordType,
    pub class: DnsClass,
    /// Remaining time to live in seconds. Reduced when served from cache.
    pub ttl: u32,
    /// TTL as received on the wire.
    pub initial_ttl: u32,
    /// RDLENGTH declared on the wire.
    pub raw_length: u16,
    pub data: RecordData,
}

impl ResourceRecord {
    pub fn new(
        name: DomainName,
        record_type: RecordType,
        class: DnsClass,
        ttl: u32,
        raw_length: u16,
        data: RecordData,
    ) -> Self {
        Self {
            name,
            record_type,
            class,
            ttl,
            initial_ttl: ttl,
            raw_length,
            data,
        }
    }

    pub fn is_expired(&self, elapsed_secs: u32) -> bool {
        elapsed_secs >= self.ttl
    }

    pub fn remaining_ttl(&self, elapsed_secs: u32) -> u32 {
        self.ttl.saturating_sub(elapsed_secs)
    }

    /// Copy of the record with its TTL reduced by `elapsed_secs`.
    pub fn aged_by(&self, elapsed_secs: u32) -> Self {
        let mut aged = self.clone();
        // OPT reuses the TTL field for extended flags.
        if self.record_type != RecordType::OPT {
            aged.ttl = self.remaining_ttl(elapsed_secs);
        }
        aged
    }
}

impl fmt::Display for ResourceRecord {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}\t{}\t{}\t{}\t{}",
            self.name, self.ttl, self.class, self.record_type, self.data
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Soa {
    pub mname: DomainName,
    pub rname: DomainName,
    pub serial: u32,
    pub refresh: u32,
    pub retry: u32,
    pub expire: u32,
    pub minimum: u32,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EdnsOption {
    pub code: u16,
    pub data: Vec<u8>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Caa {
    pub flags: u8,
    pub tag: String,
    pub value: Vec<u8>,
}

impl Caa {
    pub fn is_critical(&self) -> bool {
        self.flags & 0x80 != 0
    }
}

/// Type specific payload of a resource record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordData {
    A(Ipv4Addr),
    AAAA(Ipv6Addr),
    NS(DomainName),
    CNAME(DomainName),
    DNAME(DomainName),
    PTR(DomainName),
    SOA(Soa),
    HINFO {
        cpu: Vec<u8>,
        os: Vec<u8>,
    },
    MX {
        preference: u16,
        exchange: DomainName,
    },
    TXT(Vec<Vec<u8>>),
    SRV {
        priority: u16,
        weight: u16,
        port: u16,
        target: DomainName,
    },
    OPT(Vec<EdnsOption>),
    DS {
        key_tag: u16,
        algorithm: u8,
        digest_type: u8,
        digest: Vec<u8>,
    },
    NSEC {
        next_domain: DomainName,
        types: Vec<RecordType>,
    },
    CAA(Caa),
    /// Raw RDATA of a type without a dedicated decoder.
    Unknown(Vec<u8>),
}

impl RecordData {
    pub fn as_a(&self) -> Option<Ipv4Addr> {
        match self {
            RecordData::A(ip) => Some(*ip),
            _ => None,
        }
    }

    pub fn as_aaaa(&self) -> Option<Ipv6Addr> {
        match self {
            RecordData::AAAA(ip) => Some(*ip),
            _ => None,
        }
    }

    /// Target name for the single-name record kinds.
    pub fn target_name(&self) -> Option<&DomainName> {
        match self {
            RecordData::NS(name)
            | RecordData::CNAME(name)
            | RecordData::DNAME(name)
            | RecordData::PTR(name) => Some(name),
            RecordData::MX { exchange, .. } => Some(exchange),
            RecordData::SRV { target, .. } => Some(target),
            _ => None,
        }
    }
}

fn write_character_string(f: &mut fmt::Formatter<'_>, bytes: &[u8]) -> fmt::Result {
    f.write_str("\"")?;
    for &byte in bytes {
        match byte {
            b'"' | b'\\' => write!(f, "\\{}", byte as char)?,
            0x20..=0x7E => write!(f, "{}", byte as char)?,
            other => write!(f, "\\{:03}", other)?,
        }
    }
    f.write_str("\"")
}

fn write_hex(f: &mut fmt::Formatter<'_>, bytes: &[u8]) -> fmt::Result {
    for byte in bytes {
        write!(f, "{:02X}", byte)?;
    }
    Ok(())
}

impl fmt::Display for RecordData {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecordData::A(ip) => write!(f, "{}", ip),
            RecordData::AAAA(ip) => write!(f, "{}", ip),
            RecordData::NS(name)
            | RecordData::CNAME(name)
            | RecordData::DNAME(name)
            | RecordData::PTR(name) => write!(f, "{}", name),
            RecordData::SOA(soa) => write!(
                f,
                "{} {} {} {} {} {} {}",
                soa.mname, soa.rname, soa.serial, soa.refresh, soa.retry, soa.expire, soa.minimum
            ),
            RecordData::HINFO { cpu, os } => {
                write_character_string(f, cpu)?;
                f.write_str(" ")?;
                write_character_string(f, os)
            }
            RecordData::MX {
                preference,
                exchange,
            } => write!(f, "{} {}", preference, exchange),
            RecordData::TXT(strings) => {
                for (i, s) in strings.iter().enumerate() {
                    if i > 0 {
                        f.write_str(" ")?;
                    }
                    write_character_string(f, s)?;
                }
                Ok(())
            }
            RecordData::SRV {
                priority,
                weight,
                port,
                target,
            } => write!(f, "{} {} {} {}", priority, weight, port, target),
            RecordData::OPT(options) => {
                f.write_str("; options:")?;
                for option in options {
                    write!(f, " {}=", option.code)?;
                    write_hex(f, &option.data)?;
                }
                Ok(())
            }
            RecordData::DS {
                key_tag,
                algorithm,
                digest_type,
                digest,
            } => {
                write!(f, "{} {} {} ", key_tag, algorithm, digest_type)?;
                write_hex(f, digest)
            }
            RecordData::NSEC { next_domain, types } => {
                write!(f, "{}", next_domain)?;
                for t in types {
                    write!(f, " {}", t)?;
                }
                Ok(())
            }
            RecordData::CAA(caa) => {
                write!(f, "{} {} ", caa.flags, caa.tag)?;
                write_character_string(f, &caa.value)
            }
            RecordData::Unknown(raw) => {
                write!(f, "\\# {}", raw.len())?;
                if !raw.is_empty() {
                    f.write_str(" ")?;
                    write_hex(f, raw)?;
                }
                Ok(())
            }
        }
    }
}
