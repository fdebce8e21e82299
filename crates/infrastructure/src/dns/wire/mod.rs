//! RFC 1035 wire format: names, records and whole messages.

pub mod error;
pub mod header;
pub mod name;
pub mod reader;
pub mod record_factory;
pub mod request;
pub mod response;
pub mod writer;

pub use error::{WireError, WireErrorKind};
pub use reader::WireReader;
pub use request::{next_transaction_id, DnsRequestMessage, EdnsRequest};
pub use response::{decode_message, encode_message};
pub use writer::WireWriter;
