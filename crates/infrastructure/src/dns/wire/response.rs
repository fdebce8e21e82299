use super::error::WireError;
use super::header;
use super::name;
use super::reader::WireReader;
use super::record_factory;
use super::writer::WireWriter;
use ferrous_lookup_domain::{DnsClass, DnsMessage, Header, Question, RecordType, ResourceRecord};

/// Decodes a complete message. Trailing octets after the last record are
/// ignored.
pub fn decode_message(bytes: &[u8]) -> Result<DnsMessage, WireError> {
    let mut reader = WireReader::new(bytes);
    let header = header::read(&mut reader)?;

    let mut questions = Vec::with_capacity(usize::from(header.question_count.min(4)));
    for _ in 0..header.question_count {
        questions.push(Question::new(
            name::decode(&mut reader)?,
            RecordType::from_u16(reader.read_u16()?),
            DnsClass::from_u16(reader.read_u16()?),
        ));
    }

    let answers = read_section(&mut reader, header.answer_count)?;
    let authorities = read_section(&mut reader, header.authority_count)?;
    let additionals = read_section(&mut reader, header.additional_count)?;

    Ok(DnsMessage {
        header,
        questions,
        answers,
        authorities,
        additionals,
        message_size: bytes.len(),
    })
}

fn read_section(reader: &mut WireReader<'_>, count: u16) -> Result<Vec<ResourceRecord>, WireError> {
    // Counts come from the peer; do not trust them for preallocation.
    let mut records = Vec::with_capacity(usize::from(count.min(32)));
    for _ in 0..count {
        records.push(record_factory::read_record(reader)?);
    }
    Ok(records)
}

/// Encodes a message with name compression. Section counts are taken from
/// the section lengths, not from the header.
pub fn encode_message(message: &DnsMessage) -> Result<Vec<u8>, WireError> {
    let header = Header {
        question_count: message.questions.len() as u16,
        answer_count: message.answers.len() as u16,
        authority_count: message.authorities.len() as u16,
        additional_count: message.additionals.len() as u16,
        ..message.header.clone()
    };

    let mut writer = WireWriter::with_compression();
    header::write(&mut writer, &header);
    for q in &message.questions {
        writer.write_name(&q.name);
        writer.write_u16(q.record_type.to_u16());
        writer.write_u16(q.class.to_u16());
    }
    for record in message
        .answers
        .iter()
        .chain(&message.authorities)
        .chain(&message.additionals)
    {
        record_factory::write_record(&mut writer, record)?;
    }
    Ok(writer.into_bytes())
}
