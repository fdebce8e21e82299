#![allow(dead_code)]
use ferrous_lookup_domain::{
    DnsClass, DnsMessage, DomainName, Header, Question, RecordData, RecordType, ResourceRecord,
};
use std::net::Ipv4Addr;

pub struct RecordBuilder {
    name: DomainName,
    record_type: RecordType,
    class: DnsClass,
    ttl: u32,
    data: RecordData,
}

impl RecordBuilder {
    pub fn a(name: &str, ip: Ipv4Addr) -> Self {
        Self {
            name: name.parse().unwrap(),
            record_type: RecordType::A,
            class: DnsClass::IN,
            ttl: 300,
            data: RecordData::A(ip),
        }
    }

    pub fn cname(name: &str, target: &str) -> Self {
        Self {
            name: name.parse().unwrap(),
            record_type: RecordType::CNAME,
            class: DnsClass::IN,
            ttl: 300,
            data: RecordData::CNAME(target.parse().unwrap()),
        }
    }

    pub fn ttl(mut self, ttl: u32) -> Self {
        self.ttl = ttl;
        self
    }

    pub fn build(self) -> ResourceRecord {
        ResourceRecord::new(self.name, self.record_type, self.class, self.ttl, 0, self.data)
    }
}

pub struct MessageBuilder {
    header: Header,
    questions: Vec<Question>,
    answers: Vec<ResourceRecord>,
    authorities: Vec<ResourceRecord>,
}

impl MessageBuilder {
    pub fn response(id: u16) -> Self {
        let mut header = Header::query(id, true);
        header.is_response = true;
        header.recursion_available = true;
        Self {
            header,
            questions: Vec::new(),
            answers: Vec::new(),
            authorities: Vec::new(),
        }
    }

    pub fn question(mut self, name: &str, record_type: RecordType) -> Self {
        self.questions
            .push(Question::parse(name, record_type, DnsClass::IN).unwrap());
        self
    }

    pub fn answer(mut self, record: ResourceRecord) -> Self {
        self.answers.push(record);
        self
    }

    pub fn authority(mut self, record: ResourceRecord) -> Self {
        self.authorities.push(record);
        self
    }

    pub fn rcode(mut self, code: u8) -> Self {
        self.header.response_code = code;
        self
    }

    pub fn build(mut self) -> DnsMessage {
        self.header.question_count = self.questions.len() as u16;
        self.header.answer_count = self.answers.len() as u16;
        self.header.authority_count = self.authorities.len() as u16;
        DnsMessage {
            header: self.header,
            questions: self.questions,
            answers: self.answers,
            authorities: self.authorities,
            additionals: Vec::new(),
            message_size: 0,
        }
    }
}
