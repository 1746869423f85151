use async_trait::async_trait;
use reqwest::Client;
use tracing::debug;

use super::{JobRequestRecord, Sink, SinkError, SinkKind};
use crate::config::DataStoreConfig;

/// Inserts job requests into a PostgREST table
pub struct SupabaseSink {
    client: Client,
    endpoint: String,
    api_key: String,
}

impl SupabaseSink {
    pub fn new(config: &DataStoreConfig) -> Self {
        Self::with_client(Client::new(), config)
    }

    pub fn with_client(client: Client, config: &DataStoreConfig) -> Self {
        Self {
            client,
            endpoint: format!("{}/rest/v1/{}", config.base_url, config.table),
            api_key: config.api_key.clone(),
        }
    }
}

#[async_trait]
impl Sink for SupabaseSink {
    fn kind(&self) -> SinkKind {
        SinkKind::DataStore
    }

    async fn submit(&self, record: &JobRequestRecord) -> Result<(), SinkError> {
        debug!("POST {} for '{}'", self.endpoint, record.job_title);

        let response = self
            .client
            .post(&self.endpoint)
            .header("apikey", &self.api_key)
            .bearer_auth(&self.api_key)
            .header("Prefer", "return=minimal")
            .json(record)
            .send()
            .await?;

        let status = response.status();
        if status.is_success() {
            Ok(())
        } else {
            Err(SinkError::Status(status.as_u16()))
        }
    }
}
