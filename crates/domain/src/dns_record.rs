pub mod class;
pub mod record;
pub mod record_type;

pub use class::DnsClass;
pub use record::{Caa, EdnsOption, RecordData, ResourceRecord, Soa};
pub use record_type::RecordType;
