use super::error::{WireError, WireErrorKind};
use super::header::{self, HEADER_LEN};
use super::writer::WireWriter;
use ferrous_lookup_domain::{
    Header, LookupSettings, Opcode, Question, RecordType, LEGACY_UDP_PAYLOAD_SIZE,
};

const DNSSEC_OK: u32 = 0x0000_8000;

/// EDNS parameters carried by the OPT pseudo-record of a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EdnsRequest {
    pub udp_payload_size: u16,
    pub dnssec_ok: bool,
}

/// One outgoing query. A fresh value is built for every attempt; the engine
/// picks an id not yet used by the same lookup.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DnsRequestMessage {
    pub id: u16,
    pub opcode: Opcode,
    pub recursion_desired: bool,
    pub question: Question,
    pub edns: Option<EdnsRequest>,
}

pub fn next_transaction_id() -> u16 {
    fastrand::u16(..)
}

impl DnsRequestMessage {
    pub fn new(question: Question, settings: &LookupSettings) -> Self {
        Self::with_id(next_transaction_id(), question, settings)
    }

    pub fn with_id(id: u16, question: Question, settings: &LookupSettings) -> Self {
        let edns = settings.use_extended_dns().then(|| EdnsRequest {
            udp_payload_size: settings.extended_dns_buffer_size(),
            dnssec_ok: settings.request_dnssec_records(),
        });
        Self {
            id,
            opcode: Opcode::Query,
            recursion_desired: settings.recursion(),
            question,
            edns,
        }
    }

    /// Largest datagram the server may answer with.
    pub fn max_udp_payload(&self) -> u16 {
        self.edns
            .map(|e| e.udp_payload_size.max(LEGACY_UDP_PAYLOAD_SIZE))
            .unwrap_or(LEGACY_UDP_PAYLOAD_SIZE)
    }

    pub fn encode(&self) -> Result<Vec<u8>, WireError> {
        let mut header = Header::query(self.id, self.recursion_desired);
        header.opcode = self.opcode;
        header.question_count = 1;
        header.additional_count = u16::from(self.edns.is_some());

        let mut writer =
            WireWriter::with_capacity(HEADER_LEN + self.question.name.encoded_len() + 4 + 11);
        header::write(&mut writer, &header);

        writer.write_name_uncompressed(&self.question.name);
        writer.write_u16(self.question.record_type.to_u16());
        writer.write_u16(self.question.class.to_u16());

        if let Some(edns) = self.edns {
            writer.write_u8(0);
            writer.write_u16(RecordType::OPT.to_u16());
            writer.write_u16(edns.udp_payload_size);
            writer.write_u32(if edns.dnssec_ok { DNSSEC_OK } else { 0 });
            writer.write_u16(0);
        }

        if writer.position() > usize::from(u16::MAX) {
            return Err(WireError::encoding(
                WireErrorKind::ValueOutOfRange,
                0,
                writer.position(),
            ));
        }
        Ok(writer.into_bytes())
    }
}
