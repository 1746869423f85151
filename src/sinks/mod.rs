pub mod record;
pub mod supabase;
pub mod telegram;

#[cfg(test)]
pub mod fake;

use std::fmt;
use std::sync::Arc;

use async_trait::async_trait;
use thiserror::Error;
use tracing::{debug, error, warn};

use crate::config::Config;
pub use record::JobRequestRecord;
pub use supabase::SupabaseSink;
pub use telegram::TelegramSink;

/// The two delivery channels a submission fans out to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SinkKind {
    DataStore,
    Notification,
}

impl fmt::Display for SinkKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SinkKind::DataStore => write!(f, "supabase"),
            SinkKind::Notification => write!(f, "telegram"),
        }
    }
}

#[derive(Debug, Error)]
pub enum SinkError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("unexpected response status {0}")]
    Status(u16),
}

/// An external destination for submitted job requests
#[async_trait]
pub trait Sink: Send + Sync {
    fn kind(&self) -> SinkKind;

    /// Deliver one record; any non-2xx answer is an error
    async fn submit(&self, record: &JobRequestRecord) -> Result<(), SinkError>;
}

/// Result of offering one record to one sink slot
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Delivery {
    /// Sink not configured, nothing was sent
    Skipped,
    Delivered,
    Failed,
}

/// The configured sinks. An empty slot means that channel is skipped.
#[derive(Clone, Default)]
pub struct Sinks {
    pub data_store: Option<Arc<dyn Sink>>,
    pub notification: Option<Arc<dyn Sink>>,
}

impl Sinks {
    pub fn new(data_store: Option<Arc<dyn Sink>>, notification: Option<Arc<dyn Sink>>) -> Self {
        Self {
            data_store,
            notification,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        let data_store = match &config.data_store {
            Some(settings) => Some(Arc::new(SupabaseSink::new(settings)) as Arc<dyn Sink>),
            None => {
                warn!("SUPABASE_URL or SUPABASE_KEY not set; data store sync is disabled");
                None
            }
        };
        let notification = match &config.notification {
            Some(settings) => Some(Arc::new(TelegramSink::new(settings)) as Arc<dyn Sink>),
            None => {
                warn!("TELEGRAM_TOKEN or TELEGRAM_CHAT_ID not set; admin alerts are disabled");
                None
            }
        };
        Self::new(data_store, notification)
    }

    pub async fn deliver_to_data_store(&self, record: &JobRequestRecord) -> Delivery {
        deliver(self.data_store.as_deref(), record).await
    }

    pub async fn deliver_notification(&self, record: &JobRequestRecord) -> Delivery {
        deliver(self.notification.as_deref(), record).await
    }
}

async fn deliver(sink: Option<&dyn Sink>, record: &JobRequestRecord) -> Delivery {
    let Some(sink) = sink else {
        return Delivery::Skipped;
    };
    match sink.submit(record).await {
        Ok(()) => {
            debug!("Delivered '{}' to {}", record.job_title, sink.kind());
            Delivery::Delivered
        }
        Err(e) => {
            error!("{} sync error for '{}': {}", sink.kind(), record.job_title, e);
            Delivery::Failed
        }
    }
}
