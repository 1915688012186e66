//! Relay core.
//!
//! ## Module Structure
//!
//! - `channels`: Queues between adapters, forwarders, the router task and dispatchers
//! - `engine`: Router task, forwarders, dispatchers and deferred lookups
//! - `filter`: Suppression rules applied before routing
//! - `router`: Routing decisions and coop command handling (`RelayRouter`)
//! - `state`: Coop and poll session state

pub mod channels;
pub mod engine;
pub mod filter;
pub mod router;
pub mod state;

pub use channels::ChannelBundle;
pub use engine::{spawn_dispatcher, spawn_forwarder, RelayEngine};
pub use router::RelayRouter;
