//! Dry-run adapter that logs outbound traffic instead of sending it.

use async_trait::async_trait;
use tracing::info;

use crate::common::error::RelayResult;
use crate::common::types::Platform;
use crate::platform::PlatformAdapter;

/// Writes every send and clear to the log.
#[derive(Debug, Clone)]
pub struct LogAdapter {
    platform: Platform,
}

impl LogAdapter {
    pub fn new(platform: Platform) -> Self {
        Self { platform }
    }
}

#[async_trait]
impl PlatformAdapter for LogAdapter {
    fn platform(&self) -> Platform {
        self.platform
    }

    async fn send(&self, channel: &str, text: &str) -> RelayResult<()> {
        info!(platform = %self.platform, channel, "SEND {}", text);
        Ok(())
    }

    async fn clear(&self, channel: &str) -> RelayResult<()> {
        info!(platform = %self.platform, channel, "CLEAR");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_log_adapter_always_succeeds() {
        let adapter = LogAdapter::new(Platform::Mixer);
        assert_eq!(adapter.platform(), Platform::Mixer);
        assert!(tokio_test::block_on(adapter.send("lutra", "hi")).is_ok());
        assert!(tokio_test::block_on(adapter.clear("lutra")).is_ok());
    }
}
