use ferrous_lookup_domain::{DnsMessage, Question, RecordType};

/// Whether `message` actually answers `question`.
///
/// ANY/AXFR accept any answer, A/AAAA accept a CNAME, and NS accepts a
/// referral in the authority section.
pub fn has_matching_answer(question: &Question, message: &DnsMessage) -> bool {
    let qtype = question.record_type;

    if qtype == RecordType::NS
        && message
            .authorities
            .iter()
            .any(|r| r.record_type == RecordType::NS)
    {
        return true;
    }

    if message.answers.is_empty() {
        return false;
    }

    if matches!(qtype, RecordType::ANY | RecordType::AXFR) {
        return true;
    }

    message.answers.iter().any(|r| {
        r.record_type == qtype
            || (matches!(qtype, RecordType::A | RecordType::AAAA)
                && r.record_type == RecordType::CNAME)
    })
}
