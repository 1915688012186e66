//! Platform adapter contract.
//!
//! An adapter hides one chat service behind two operations, `send` and
//! `clear`. Inbound traffic is pushed by the adapter as normalized
//! [`ChatEvent`](crate::common::types::ChatEvent)s into the queue it was given.

pub mod console;
pub mod log;
pub mod lookup;

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;

use crate::common::error::RelayResult;
use crate::common::types::Platform;

pub use console::ConsoleSource;
pub use log::LogAdapter;
pub use lookup::{HttpUserLookup, UserLookup};

/// Outbound side of a chat service.
#[async_trait]
pub trait PlatformAdapter: Send + Sync {
    /// The service this adapter talks to.
    fn platform(&self) -> Platform;

    /// Post a line of text to a channel.
    async fn send(&self, channel: &str, text: &str) -> RelayResult<()>;

    /// Clear a channel's chat window.
    async fn clear(&self, channel: &str) -> RelayResult<()>;
}

/// Adapters keyed by platform.
pub type AdapterMap = HashMap<Platform, Arc<dyn PlatformAdapter>>;
