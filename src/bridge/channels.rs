//! Relay channel management.
//!
//! Every queue is bounded so a slow adapter applies backpressure instead of
//! growing memory. The layout is:
//!
//! ```text
//! adapter --inbound[p]--> forwarder --router queue--> engine --outbound[p]--> dispatcher --> adapter
//!                                           ^                 |
//!                                           +-- user lookup --+
//! ```

use std::collections::HashMap;

use tokio::sync::{mpsc, watch};

use crate::common::messages::Delivery;
use crate::common::types::{ChatEvent, Platform};

/// Channels held by the adapter side of the relay.
pub struct AdapterSideChannels {
    /// Where each adapter pushes its normalized events.
    pub inbound_tx: HashMap<Platform, mpsc::Sender<ChatEvent>>,
    /// Deliveries waiting for each adapter's dispatcher.
    pub outbound_rx: HashMap<Platform, mpsc::Receiver<Delivery>>,
}

/// Channels held by the router side of the relay.
pub struct RouterSideChannels {
    /// Per-adapter inbound queues, drained by forwarders.
    pub inbound_rx: HashMap<Platform, mpsc::Receiver<ChatEvent>>,
    /// Single queue consumed by the router task.
    pub router_tx: mpsc::Sender<ChatEvent>,
    pub router_rx: mpsc::Receiver<ChatEvent>,
    /// Per-adapter outbound queues, filled by the router task.
    pub outbound_tx: HashMap<Platform, mpsc::Sender<Delivery>>,
}

/// Control channels for shutdown coordination.
pub struct ControlChannels {
    pub shutdown_tx: watch::Sender<bool>,
    pub shutdown_rx: watch::Receiver<bool>,
}

/// Bundle of all channels created for the relay.
pub struct ChannelBundle {
    pub adapters: AdapterSideChannels,
    pub router: RouterSideChannels,
    pub control: ControlChannels,
}

impl ChannelBundle {
    /// Create inbound and outbound queues of `capacity` for every platform.
    pub fn new(platforms: &[Platform], capacity: usize) -> Self {
        let mut inbound_tx = HashMap::new();
        let mut inbound_rx = HashMap::new();
        let mut outbound_tx = HashMap::new();
        let mut outbound_rx = HashMap::new();

        for &platform in platforms {
            let (tx, rx) = mpsc::channel(capacity);
            inbound_tx.insert(platform, tx);
            inbound_rx.insert(platform, rx);

            let (tx, rx) = mpsc::channel(capacity);
            outbound_tx.insert(platform, tx);
            outbound_rx.insert(platform, rx);
        }

        let (router_tx, router_rx) = mpsc::channel(capacity);
        let (shutdown_tx, shutdown_rx) = watch::channel(false);

        Self {
            adapters: AdapterSideChannels {
                inbound_tx,
                outbound_rx,
            },
            router: RouterSideChannels {
                inbound_rx,
                router_tx,
                router_rx,
                outbound_tx,
            },
            control: ControlChannels {
                shutdown_tx,
                shutdown_rx,
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bundle_has_queues_per_platform() {
        let bundle = ChannelBundle::new(&[Platform::Twitch], 4);
        assert!(bundle.adapters.inbound_tx.contains_key(&Platform::Twitch));
        assert!(!bundle.adapters.inbound_tx.contains_key(&Platform::Mixer));
        assert_eq!(bundle.router.outbound_tx.len(), 1);
        assert_eq!(bundle.router.router_tx.max_capacity(), 4);
        assert!(!*bundle.control.shutdown_rx.borrow());
    }
}
