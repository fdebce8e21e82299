use ferrous_lookup_domain::{
    DnsClass, DnsMessage, LookupOptions, LookupSettings, Question, RecordData, RecordType,
    ResourceRecord, ResponseCode,
};
use ferrous_lookup_infrastructure::dns::wire::{decode_message, encode_message, DnsRequestMessage};
use std::net::Ipv4Addr;
use std::sync::Arc;

pub fn a_record(name: &str, ip: [u8; 4], ttl: u32) -> ResourceRecord {
    ResourceRecord::new(
        name.parse().unwrap(),
        RecordType::A,
        DnsClass::IN,
        ttl,
        4,
        RecordData::A(Ipv4Addr::from(ip)),
    )
}

pub fn cname_record(name: &str, target: &str, ttl: u32) -> ResourceRecord {
    ResourceRecord::new(
        name.parse().unwrap(),
        RecordType::CNAME,
        DnsClass::IN,
        ttl,
        0,
        RecordData::CNAME(target.parse().unwrap()),
    )
}

pub fn question(name: &str, record_type: RecordType) -> Question {
    Question::parse(name, record_type, DnsClass::IN).unwrap()
}

/// Options with a fixed server order and no background noise.
pub fn options(servers: &[&str]) -> LookupOptions {
    let mut options = LookupOptions::with_name_servers(servers.iter().copied());
    options.use_random_name_server = false;
    options.timeout_ms = 1_000;
    options
}

pub fn settings(servers: &[&str], configure: impl FnOnce(&mut LookupOptions)) -> Arc<LookupSettings> {
    let mut options = options(servers);
    configure(&mut options);
    options.build().unwrap()
}

pub struct ResponseBuilder {
    message: DnsMessage,
}

impl ResponseBuilder {
    /// Response shell echoing the id and question of `request`.
    pub fn for_request(request: &DnsRequestMessage) -> Self {
        let mut header = ferrous_lookup_domain::Header::query(request.id, request.recursion_desired);
        header.is_response = true;
        header.recursion_available = true;
        Self {
            message: DnsMessage {
                header,
                questions: vec![request.question.clone()],
                answers: vec![],
                authorities: vec![],
                additionals: vec![],
                message_size: 0,
            },
        }
    }

    /// Response shell for a raw query received by a mock server.
    pub fn for_query_bytes(query: &[u8]) -> Self {
        let query = decode_message(query).unwrap();
        let mut header = query.header.clone();
        header.is_response = true;
        header.recursion_available = true;
        header.question_count = 0;
        header.answer_count = 0;
        header.authority_count = 0;
        header.additional_count = 0;
        Self {
            message: DnsMessage {
                header,
                questions: query.questions,
                answers: vec![],
                authorities: vec![],
                additionals: vec![],
                message_size: 0,
            },
        }
    }

    pub fn answer(mut self, record: ResourceRecord) -> Self {
        self.message.answers.push(record);
        self
    }

    pub fn authority(mut self, record: ResourceRecord) -> Self {
        self.message.authorities.push(record);
        self
    }

    pub fn rcode(mut self, rcode: ResponseCode) -> Self {
        self.message.header.response_code = rcode.to_u16() as u8;
        self
    }

    pub fn truncated(mut self) -> Self {
        self.message.header.truncated = true;
        self
    }

    pub fn id(mut self, id: u16) -> Self {
        self.message.header.id = id;
        self
    }

    pub fn build(mut self) -> DnsMessage {
        let m = &mut self.message;
        m.header.question_count = m.questions.len() as u16;
        m.header.answer_count = m.answers.len() as u16;
        m.header.authority_count = m.authorities.len() as u16;
        m.header.additional_count = m.additionals.len() as u16;
        self.message
    }

    pub fn encode(self) -> Vec<u8> {
        encode_message(&self.build()).unwrap()
    }
}
