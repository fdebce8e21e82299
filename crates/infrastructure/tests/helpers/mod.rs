#![allow(dead_code)]

pub mod builders;
pub mod dns_server_mock;
pub mod scripted_transport;

pub use builders::*;
pub use dns_server_mock::{MockDnsServer, Protocol};
pub use scripted_transport::{timed_out, Call, Reply, ScriptedTransport};
