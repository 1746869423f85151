use futures_util::future;
use serde::Serialize;
use tracing::info;

use crate::sinks::{Delivery, JobRequestRecord, Sinks};

/// Per-channel outcome shown after a submission
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SinkStatus {
    /// Not configured, or no submission yet
    #[default]
    Idle,
    Success,
    Error,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct SyncStatus {
    #[serde(rename = "supabase")]
    pub data_store: SinkStatus,
    #[serde(rename = "telegram")]
    pub notification: SinkStatus,
}

/// How the records of one submission are fanned out
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeliveryMode {
    /// A single record, both sinks at once
    Parallel,
    /// Record after record, data store before notification
    Sequential,
}

/// Snapshot of what a session is about to send
#[derive(Debug, Clone)]
pub struct Submission {
    pub mode: DeliveryMode,
    pub records: Vec<JobRequestRecord>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SubmissionOutcome {
    pub sync_status: SyncStatus,
    /// True only when the whole submission counts as lost
    pub failed: bool,
}

/// Running count of attempts against one sink
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SinkTally {
    pub skipped: bool,
    pub attempts: usize,
    pub successes: usize,
}

impl SinkTally {
    pub fn record(&mut self, delivery: Delivery) {
        match delivery {
            Delivery::Skipped => self.skipped = true,
            Delivery::Delivered => {
                self.attempts += 1;
                self.successes += 1;
            }
            Delivery::Failed => self.attempts += 1,
        }
    }

    pub fn failures(&self) -> usize {
        self.attempts - self.successes
    }

    /// Any success marks the channel successful, even if other records failed
    pub fn status(&self) -> SinkStatus {
        if self.attempts == 0 {
            SinkStatus::Idle
        } else if self.successes > 0 {
            SinkStatus::Success
        } else {
            SinkStatus::Error
        }
    }
}

fn single_status(delivery: Delivery) -> SinkStatus {
    match delivery {
        Delivery::Skipped => SinkStatus::Idle,
        Delivery::Delivered => SinkStatus::Success,
        Delivery::Failed => SinkStatus::Error,
    }
}

/// Single-record policy: failed only when both channels errored
pub fn aggregate_parallel(data_store: Delivery, notification: Delivery) -> SubmissionOutcome {
    let sync_status = SyncStatus {
        data_store: single_status(data_store),
        notification: single_status(notification),
    };
    SubmissionOutcome {
        failed: sync_status.data_store == SinkStatus::Error
            && sync_status.notification == SinkStatus::Error,
        sync_status,
    }
}

/// Batch policy: failed only when every attempted delivery failed. A
/// skipped channel never counts against the batch.
pub fn aggregate_sequential(data_store: &SinkTally, notification: &SinkTally) -> SubmissionOutcome {
    let attempts = data_store.attempts + notification.attempts;
    let failures = data_store.failures() + notification.failures();
    let any_skipped = data_store.skipped || notification.skipped;
    SubmissionOutcome {
        sync_status: SyncStatus {
            data_store: data_store.status(),
            notification: notification.status(),
        },
        failed: !any_skipped && attempts > 0 && failures == attempts,
    }
}

impl Submission {
    pub async fn deliver(&self, sinks: &Sinks) -> SubmissionOutcome {
        info!(
            "Submitting {} job request(s) ({:?})",
            self.records.len(),
            self.mode
        );
        let outcome = match self.mode {
            DeliveryMode::Parallel => self.deliver_parallel(sinks).await,
            DeliveryMode::Sequential => self.deliver_sequential(sinks).await,
        };
        info!(
            "Submission finished: supabase={:?}, telegram={:?}, failed={}",
            outcome.sync_status.data_store, outcome.sync_status.notification, outcome.failed
        );
        outcome
    }

    async fn deliver_parallel(&self, sinks: &Sinks) -> SubmissionOutcome {
        let Some(record) = self.records.first() else {
            return aggregate_parallel(Delivery::Skipped, Delivery::Skipped);
        };
        let (stored, notified) = future::join(
            sinks.deliver_to_data_store(record),
            sinks.deliver_notification(record),
        )
        .await;
        aggregate_parallel(stored, notified)
    }

    async fn deliver_sequential(&self, sinks: &Sinks) -> SubmissionOutcome {
        let mut data_store = SinkTally::default();
        let mut notification = SinkTally::default();
        for record in &self.records {
            data_store.record(sinks.deliver_to_data_store(record).await);
            notification.record(sinks.deliver_notification(record).await);
        }
        aggregate_sequential(&data_store, &notification)
    }
}
