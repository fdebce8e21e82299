use crate::{Question, RecordType, ResourceRecord};
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Opcode {
    Query,
    IQuery,
    Status,
    Notify,
    Update,
    Unknown(u8),
}

impl Opcode {
    pub fn to_u8(&self) -> u8 {
        match self {
            Opcode::Query => 0,
            Opcode::IQuery => 1,
            Opcode::Status => 2,
            Opcode::Notify => 4,
            Opcode::Update => 5,
            Opcode::Unknown(code) => *code,
        }
    }

    pub fn from_u8(code: u8) -> Self {
        match code {
            0 => Opcode::Query,
            1 => Opcode::IQuery,
            2 => Opcode::Status,
            4 => Opcode::Notify,
            5 => Opcode::Update,
            other => Opcode::Unknown(other),
        }
    }
}

impl fmt::Display for Opcode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Opcode::Query => f.write_str("QUERY"),
            Opcode::IQuery => f.write_str("IQUERY"),
            Opcode::Status => f.write_str("STATUS"),
            Opcode::Notify => f.write_str("NOTIFY"),
            Opcode::Update => f.write_str("UPDATE"),
            Opcode::Unknown(code) => write!(f, "OPCODE{}", code),
        }
    }
}

/// Response code, including the extended range carried in the OPT record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResponseCode {
    NoError,
    FormErr,
    ServFail,
    NXDomain,
    NotImp,
    Refused,
    YXDomain,
    YXRRSet,
    NXRRSet,
    NotAuth,
    NotZone,
    BadVers,
    Unknown(u16),
}

impl ResponseCode {
    pub fn to_u16(&self) -> u16 {
        match self {
            ResponseCode::NoError => 0,
            ResponseCode::FormErr => 1,
            ResponseCode::ServFail => 2,
            ResponseCode::NXDomain => 3,
            ResponseCode::NotImp => 4,
            ResponseCode::Refused => 5,
            ResponseCode::YXDomain => 6,
            ResponseCode::YXRRSet => 7,
            ResponseCode::NXRRSet => 8,
            ResponseCode::NotAuth => 9,
            ResponseCode::NotZone => 10,
            ResponseCode::BadVers => 16,
            ResponseCode::Unknown(code) => *code,
        }
    }

    pub fn from_u16(code: u16) -> Self {
        match code {
            0 => ResponseCode::NoError,
            1 => ResponseCode::FormErr,
            2 => ResponseCode::ServFail,
            3 => ResponseCode::NXDomain,
            4 => ResponseCode::NotImp,
            5 => ResponseCode::Refused,
            6 => ResponseCode::YXDomain,
            7 => ResponseCode::YXRRSet,
            8 => ResponseCode::NXRRSet,
            9 => ResponseCode::NotAuth,
            10 => ResponseCode::NotZone,
            16 => ResponseCode::BadVers,
            other => ResponseCode::Unknown(other),
        }
    }

    pub fn is_error(&self) -> bool {
        *self != ResponseCode::NoError
    }

    /// Human readable description used for error messages.
    pub fn description(&self) -> &'static str {
        match self {
            ResponseCode::NoError => "No error",
            ResponseCode::FormErr => "Format error",
            ResponseCode::ServFail => "Server failure",
            ResponseCode::NXDomain => "Non-existent domain",
            ResponseCode::NotImp => "Not implemented",
            ResponseCode::Refused => "Query refused",
            ResponseCode::YXDomain => "Name exists when it should not",
            ResponseCode::YXRRSet => "RR set exists when it should not",
            ResponseCode::NXRRSet => "RR set that should exist does not",
            ResponseCode::NotAuth => "Server not authoritative for zone",
            ResponseCode::NotZone => "Name not contained in zone",
            ResponseCode::BadVers => "Bad OPT version",
            ResponseCode::Unknown(_) => "Unknown error",
        }
    }
}

impl fmt::Display for ResponseCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResponseCode::NoError => f.write_str("NOERROR"),
            ResponseCode::FormErr => f.write_str("FORMERR"),
            ResponseCode::ServFail => f.write_str("SERVFAIL"),
            ResponseCode::NXDomain => f.write_str("NXDOMAIN"),
            ResponseCode::NotImp => f.write_str("NOTIMP"),
            ResponseCode::Refused => f.write_str("REFUSED"),
            ResponseCode::YXDomain => f.write_str("YXDOMAIN"),
            ResponseCode::YXRRSet => f.write_str("YXRRSET"),
            ResponseCode::NXRRSet => f.write_str("NXRRSET"),
            ResponseCode::NotAuth => f.write_str("NOTAUTH"),
            ResponseCode::NotZone => f.write_str("NOTZONE"),
            ResponseCode::BadVers => f.write_str("BADVERS"),
            ResponseCode::Unknown(code) => write!(f, "RCODE{}", code),
        }
    }
}

/// The 12 header octets of a message, unpacked.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Header {
    pub id: u16,
    pub is_response: bool,
    pub opcode: Opcode,
    pub authoritative: bool,
    pub truncated: bool,
    pub recursion_desired: bool,
    pub recursion_available: bool,
    pub authentic_data: bool,
    pub checking_disabled: bool,
    /// The four low bits of the response code as carried in the header.
    pub response_code: u8,
    pub question_count: u16,
    pub answer_count: u16,
    pub authority_count: u16,
    pub additional_count: u16,
}

impl Header {
    pub fn query(id: u16, recursion_desired: bool) -> Self {
        Self {
            id,
            is_response: false,
            opcode: Opcode::Query,
            authoritative: false,
            truncated: false,
            recursion_desired,
            recursion_available: false,
            authentic_data: false,
            checking_disabled: false,
            response_code: 0,
            question_count: 0,
            answer_count: 0,
            authority_count: 0,
            additional_count: 0,
        }
    }

    fn flag_names(&self) -> Vec<&'static str> {
        let mut names = Vec::with_capacity(7);
        if self.is_response {
            names.push("qr");
        }
        if self.authoritative {
            names.push("aa");
        }
        if self.truncated {
            names.push("tc");
        }
        if self.recursion_desired {
            names.push("rd");
        }
        if self.recursion_available {
            names.push("ra");
        }
        if self.authentic_data {
            names.push("ad");
        }
        if self.checking_disabled {
            names.push("cd");
        }
        names
    }
}

/// A decoded DNS message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DnsMessage {
    pub header: Header,
    pub questions: Vec<Question>,
    pub answers: Vec<ResourceRecord>,
    pub authorities: Vec<ResourceRecord>,
    pub additionals: Vec<ResourceRecord>,
    /// Size of the wire form this message was decoded from.
    pub message_size: usize,
}

impl DnsMessage {
    pub fn opt_record(&self) -> Option<&ResourceRecord> {
        self.additionals
            .iter()
            .find(|r| r.record_type == RecordType::OPT)
    }

    /// Full response code, combining the header bits with the extended bits of OPT.
    pub fn response_code(&self) -> ResponseCode {
        let low = u16::from(self.header.response_code & 0x0F);
        let high = self
            .opt_record()
            .map(|opt| ((opt.ttl >> 24) & 0xFF) as u16)
            .unwrap_or(0);
        ResponseCode::from_u16((high << 4) | low)
    }

    /// UDP payload size advertised by the peer through OPT, if present.
    pub fn edns_udp_payload_size(&self) -> Option<u16> {
        self.opt_record().map(|opt| opt.class.to_u16())
    }

    pub fn edns_version(&self) -> Option<u8> {
        self.opt_record().map(|opt| ((opt.ttl >> 16) & 0xFF) as u8)
    }

    pub fn dnssec_ok(&self) -> bool {
        self.opt_record()
            .map(|opt| opt.ttl & 0x0000_8000 != 0)
            .unwrap_or(false)
    }

    /// Every record in the three record sections, OPT excluded.
    pub fn all_records(&self) -> impl Iterator<Item = &ResourceRecord> {
        self.answers
            .iter()
            .chain(self.authorities.iter())
            .chain(self.additionals.iter())
            .filter(|r| r.record_type != RecordType::OPT)
    }

    /// Smallest TTL over all records, or `None` when there are no records.
    pub fn min_ttl(&self) -> Option<u32> {
        self.all_records().map(|r| r.ttl).min()
    }

    pub fn answers_of_type(&self, record_type: RecordType) -> impl Iterator<Item = &ResourceRecord> {
        self.answers
            .iter()
            .filter(move |r| r.record_type == record_type)
    }

    /// Copy with every record TTL reduced by `elapsed_secs`.
    pub fn aged_by(&self, elapsed_secs: u32) -> Self {
        let age = |records: &[ResourceRecord]| -> Vec<ResourceRecord> {
            records.iter().map(|r| r.aged_by(elapsed_secs)).collect()
        };
        Self {
            header: self.header.clone(),
            questions: self.questions.clone(),
            answers: age(&self.answers),
            authorities: age(&self.authorities),
            additionals: age(&self.additionals),
            message_size: self.message_size,
        }
    }
}

fn write_section(f: &mut fmt::Formatter<'_>, title: &str, records: &[&ResourceRecord]) -> fmt::Result {
    if records.is_empty() {
        return Ok(());
    }
    writeln!(f)?;
    writeln!(f, ";; {} SECTION:", title)?;
    for record in records {
        writeln!(f, "{}", record)?;
    }
    Ok(())
}

impl fmt::Display for DnsMessage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let h = &self.header;
        writeln!(
            f,
            ";; ->>HEADER<<- opcode: {}, status: {}, id: {}",
            h.opcode,
            self.response_code(),
            h.id
        )?;
        writeln!(
            f,
            ";; flags: {}; QUERY: {}, ANSWER: {}, AUTHORITY: {}, ADDITIONAL: {}",
            h.flag_names().join(" "),
            h.question_count,
            h.answer_count,
            h.authority_count,
            h.additional_count
        )?;

        if let Some(opt) = self.opt_record() {
            writeln!(f)?;
            writeln!(f, ";; OPT PSEUDOSECTION:")?;
            writeln!(
                f,
                "; EDNS: version: {}, flags:{}; udp: {}",
                self.edns_version().unwrap_or(0),
                if self.dnssec_ok() { " do" } else { "" },
                opt.class.to_u16()
            )?;
        }

        if !self.questions.is_empty() {
            writeln!(f)?;
            writeln!(f, ";; QUESTION SECTION:")?;
            for q in &self.questions {
                writeln!(f, ";{}", q)?;
            }
        }

        let answers: Vec<&ResourceRecord> = self.answers.iter().collect();
        let authorities: Vec<&ResourceRecord> = self.authorities.iter().collect();
        let additionals: Vec<&ResourceRecord> = self
            .additionals
            .iter()
            .filter(|r| r.record_type != RecordType::OPT)
            .collect();
        write_section(f, "ANSWER", &answers)?;
        write_section(f, "AUTHORITY", &authorities)?;
        write_section(f, "ADDITIONAL", &additionals)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{DnsClass, DomainName, RecordData};
    use std::net::Ipv4Addr;

    fn a_record(ttl: u32) -> ResourceRecord {
        ResourceRecord::new(
            "example.com".parse().unwrap(),
            RecordType::A,
            DnsClass::IN,
            ttl,
            4,
            RecordData::A(Ipv4Addr::new(192, 0, 2, 1)),
        )
    }

    fn opt_record(ttl: u32) -> ResourceRecord {
        ResourceRecord::new(
            DomainName::root(),
            RecordType::OPT,
            DnsClass::Unknown(1232),
            ttl,
            0,
            RecordData::OPT(Vec::new()),
        )
    }

    fn message() -> DnsMessage {
        DnsMessage {
            header: Header::query(7, true),
            questions: Vec::new(),
            answers: Vec::new(),
            authorities: Vec::new(),
            additionals: Vec::new(),
            message_size: 0,
        }
    }

    #[test]
    fn test_extended_response_code() {
        let mut msg = message();
        msg.header.response_code = 0;
        msg.additionals.push(opt_record(0x0100_0000));
        assert_eq!(msg.response_code(), ResponseCode::BadVers);
        assert_eq!(msg.edns_udp_payload_size(), Some(1232));
    }

    #[test]
    fn test_min_ttl_ignores_opt() {
        let mut msg = message();
        assert_eq!(msg.min_ttl(), None);

        msg.answers.push(a_record(300));
        msg.answers.push(a_record(120));
        msg.additionals.push(opt_record(0));
        assert_eq!(msg.min_ttl(), Some(120));
    }

    #[test]
    fn test_dnssec_ok_flag() {
        let mut msg = message();
        assert!(!msg.dnssec_ok());
        msg.additionals.push(opt_record(0x0000_8000));
        assert!(msg.dnssec_ok());
    }

    #[test]
    fn test_display_contains_sections() {
        let mut msg = message();
        msg.header.is_response = true;
        msg.header.answer_count = 1;
        msg.answers.push(a_record(300));
        let text = msg.to_string();
        assert!(text.contains("status: NOERROR"));
        assert!(text.contains("flags: qr rd;"));
        assert!(text.contains(";; ANSWER SECTION:"));
        assert!(text.contains("192.0.2.1"));
    }
}
