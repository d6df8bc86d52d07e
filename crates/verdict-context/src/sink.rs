use std::sync::{Arc, Mutex};
use verdict_types::EvalEvent;

/// Append-only audit sink.
///
/// Implementations must be infallible: they may drop events but never
/// block, error, or influence the evaluation outcome.
pub trait EventSink {
    fn add(&mut self, event: EvalEvent);
}

/// Sink that discards everything.
#[derive(Clone, Copy, Debug, Default)]
pub struct NoopSink;

impl EventSink for NoopSink {
    fn add(&mut self, _event: EvalEvent) {}
}

/// Sink that keeps events in memory behind a shared handle, so the host
/// can read them back after the context has been consumed.
#[derive(Clone, Debug, Default)]
pub struct RecordingSink {
    events: Arc<Mutex<Vec<EvalEvent>>>,
}

impl RecordingSink {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<EvalEvent> {
        self.events.lock().expect("sink lock poisoned").clone()
    }

    pub fn len(&self) -> usize {
        self.events.lock().expect("sink lock poisoned").len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl EventSink for RecordingSink {
    fn add(&mut self, event: EvalEvent) {
        if let Ok(mut events) = self.events.lock() {
            events.push(event);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use time::OffsetDateTime;
    use verdict_types::{EntityKind, PolicyResult};

    fn event(path: &str) -> EvalEvent {
        EvalEvent {
            context_id: "ctx".to_string(),
            kind: EntityKind::Policy,
            path: path.to_string(),
            success: true,
            result: Some(PolicyResult::Permit),
            from_cache: false,
            reason: None,
            at: OffsetDateTime::UNIX_EPOCH,
        }
    }

    #[test]
    fn recording_sink_is_readable_through_clones() {
        let sink = RecordingSink::new();
        let mut writer = sink.clone();
        writer.add(event("p1"));
        writer.add(event("p2"));
        assert_eq!(sink.len(), 2);
        assert_eq!(sink.events()[1].path, "p2");
    }
}
