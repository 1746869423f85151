use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::Barrier;

use super::{JobRequestRecord, Sink, SinkError, SinkKind};

/// In-memory sink that answers from a script of outcomes, then succeeds
pub struct ScriptedSink {
    kind: SinkKind,
    script: Mutex<VecDeque<bool>>,
    fallback: bool,
    received: Mutex<Vec<JobRequestRecord>>,
    delay: Option<Duration>,
    gate: Option<Arc<Barrier>>,
}

impl ScriptedSink {
    pub fn new(kind: SinkKind, script: impl IntoIterator<Item = bool>) -> Self {
        Self {
            kind,
            script: Mutex::new(script.into_iter().collect()),
            fallback: true,
            received: Mutex::new(Vec::new()),
            delay: None,
            gate: None,
        }
    }

    pub fn succeeding(kind: SinkKind) -> Self {
        Self::new(kind, [])
    }

    pub fn failing(kind: SinkKind) -> Self {
        Self {
            fallback: false,
            ..Self::new(kind, [])
        }
    }

    /// Sleep before answering
    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    /// Wait on a barrier shared with other sinks before answering
    pub fn with_gate(mut self, gate: Arc<Barrier>) -> Self {
        self.gate = Some(gate);
        self
    }

    pub fn calls(&self) -> usize {
        self.received.lock().unwrap().len()
    }

    pub fn received(&self) -> Vec<JobRequestRecord> {
        self.received.lock().unwrap().clone()
    }
}

#[async_trait]
impl Sink for ScriptedSink {
    fn kind(&self) -> SinkKind {
        self.kind
    }

    async fn submit(&self, record: &JobRequestRecord) -> Result<(), SinkError> {
        self.received.lock().unwrap().push(record.clone());
        if let Some(gate) = &self.gate {
            gate.wait().await;
        }
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        let ok = self
            .script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or(self.fallback);
        if ok {
            Ok(())
        } else {
            Err(SinkError::Status(503))
        }
    }
}
