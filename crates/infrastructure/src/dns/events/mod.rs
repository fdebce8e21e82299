pub mod emitter;
pub mod types;

pub use emitter::{AttemptEventEmitter, EventFilter};
pub use types::{AttemptEvent, AttemptOutcome};
