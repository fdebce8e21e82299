pub mod audit;
pub mod client;
pub mod engine;
pub mod error;
pub mod policy;

pub use audit::AuditTrail;
pub use client::LookupClient;
pub use engine::ResolutionEngine;
pub use error::LookupError;
pub use policy::has_matching_answer;
