//! Side-channel user lookup.
//!
//! Some attributions arrive with only the triggering user's id. The display
//! name is fetched from the service's REST API before the event is relayed.

use std::time::Duration;

use async_trait::async_trait;
use backon::{ExponentialBuilder, Retryable};
use serde::Deserialize;
use tracing::warn;

use crate::common::error::{RelayError, RelayResult};
use crate::config::types::LookupConfig;

/// Resolves a user id to a display name.
#[async_trait]
pub trait UserLookup: Send + Sync {
    async fn display_name(&self, user_id: u64) -> RelayResult<String>;
}

#[derive(Debug, Deserialize)]
struct UserResponse {
    username: String,
}

/// REST lookup with a per-attempt timeout and a bounded number of retries.
#[derive(Debug, Clone)]
pub struct HttpUserLookup {
    client: reqwest::Client,
    base_url: String,
    timeout: Duration,
    retries: usize,
}

impl HttpUserLookup {
    pub fn new(config: &LookupConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            timeout: Duration::from_secs(config.timeout_secs),
            retries: config.retries,
        }
    }

    fn user_url(&self, user_id: u64) -> String {
        format!("{}/{}", self.base_url, user_id)
    }

    async fn fetch_once(&self, user_id: u64) -> RelayResult<String> {
        let lookup_error = |message: String| RelayError::Lookup { user_id, message };

        let request = async {
            self.client
                .get(self.user_url(user_id))
                .send()
                .await?
                .error_for_status()?
                .json::<UserResponse>()
                .await
        };

        match tokio::time::timeout(self.timeout, request).await {
            Ok(Ok(user)) => Ok(user.username),
            Ok(Err(e)) => Err(lookup_error(e.to_string())),
            Err(_) => Err(lookup_error(format!("timed out after {:?}", self.timeout))),
        }
    }
}

#[async_trait]
impl UserLookup for HttpUserLookup {
    async fn display_name(&self, user_id: u64) -> RelayResult<String> {
        let backoff = ExponentialBuilder::default()
            .with_min_delay(Duration::from_millis(500))
            .with_max_delay(Duration::from_secs(5))
            .with_max_times(self.retries);

        (|| self.fetch_once(user_id))
            .retry(backoff)
            .notify(|e: &RelayError, delay: Duration| {
                warn!("{}; retrying in {:.1}s", e, delay.as_secs_f64());
            })
            .await
    }
}
