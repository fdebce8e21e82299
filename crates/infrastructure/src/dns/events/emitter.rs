use super::{AttemptEvent, AttemptOutcome};
use tokio::sync::mpsc;
use tracing::trace;

/// Which attempts an enabled emitter forwards.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EventFilter {
    #[default]
    All,
    /// Everything except `AttemptOutcome::Success`.
    FailuresOnly,
}

/// Publishes one [`AttemptEvent`] per try to an unbounded channel.
///
/// The engine asks [`wants`](Self::wants) before building an event, so a
/// disabled emitter costs a branch per attempt. Sending never blocks the
/// lookup; once the receiver is gone events are dropped.
#[derive(Clone, Default)]
pub struct AttemptEventEmitter {
    sender: Option<mpsc::UnboundedSender<AttemptEvent>>,
    filter: EventFilter,
}

impl AttemptEventEmitter {
    pub fn new_disabled() -> Self {
        Self::default()
    }

    pub fn new_enabled() -> (Self, mpsc::UnboundedReceiver<AttemptEvent>) {
        Self::with_filter(EventFilter::All)
    }

    pub fn with_filter(filter: EventFilter) -> (Self, mpsc::UnboundedReceiver<AttemptEvent>) {
        let (tx, rx) = mpsc::unbounded_channel();
        (
            Self {
                sender: Some(tx),
                filter,
            },
            rx,
        )
    }

    pub fn is_enabled(&self) -> bool {
        self.sender.is_some()
    }

    pub fn filter(&self) -> EventFilter {
        self.filter
    }

    /// Whether an attempt that ended with `outcome` would be published.
    pub fn wants(&self, outcome: &AttemptOutcome) -> bool {
        match (&self.sender, self.filter) {
            (None, _) => false,
            (Some(_), EventFilter::All) => true,
            (Some(_), EventFilter::FailuresOnly) => outcome.is_failure(),
        }
    }

    pub fn emit(&self, event: AttemptEvent) {
        if !self.wants(&event.outcome) {
            return;
        }
        if let Some(tx) = &self.sender {
            if tx.send(event).is_err() {
                trace!("Attempt event receiver closed");
            }
        }
    }
}

impl std::fmt::Debug for AttemptEventEmitter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AttemptEventEmitter")
            .field("enabled", &self.is_enabled())
            .field("filter", &self.filter)
            .finish()
    }
}
