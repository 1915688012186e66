//! Relay engine.
//!
//! One task owns the [`RelayRouter`] and handles events strictly in arrival
//! order. User lookups for deferred attributions run in their own tasks and
//! post the resolved attribution back onto the router queue. Each platform has
//! one dispatcher task, so sends to the same destination keep their order.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

use crate::bridge::router::RelayRouter;
use crate::common::error::{RelayError, RelayResult};
use crate::common::messages::{Delivery, DeliveryAction};
use crate::common::types::{ChatEvent, ChatUser, EventKind, Platform, Skill};
use crate::platform::{PlatformAdapter, UserLookup};

/// The router task.
pub struct RelayEngine {
    router: RelayRouter,
    lookup: Arc<dyn UserLookup>,
    router_tx: mpsc::Sender<ChatEvent>,
    outbound: HashMap<Platform, mpsc::Sender<Delivery>>,
}

impl RelayEngine {
    pub fn new(
        router: RelayRouter,
        lookup: Arc<dyn UserLookup>,
        router_tx: mpsc::Sender<ChatEvent>,
        outbound: HashMap<Platform, mpsc::Sender<Delivery>>,
    ) -> Self {
        Self {
            router,
            lookup,
            router_tx,
            outbound,
        }
    }

    /// Process events until the queue closes or shutdown is signalled.
    pub async fn run(
        mut self,
        mut events: mpsc::Receiver<ChatEvent>,
        mut shutdown_rx: watch::Receiver<bool>,
    ) {
        loop {
            tokio::select! {
                event = events.recv() => match event {
                    Some(event) => self.handle(event).await,
                    None => break,
                },
                changed = shutdown_rx.changed() => {
                    if changed.is_err() || *shutdown_rx.borrow() {
                        info!("Shutdown signal received, stopping relay engine");
                        break;
                    }
                }
            }
        }
        let state = self.router.state();
        info!(
            coop = ?state.coop(),
            poll = ?state.poll(),
            "Relay engine ended"
        );
    }

    /// Route one event and queue its deliveries.
    pub async fn handle(&mut self, event: ChatEvent) {
        if let EventKind::DeferredAttribution {
            triggering_user_id,
            skill,
        } = event.kind
        {
            self.spawn_lookup(event.origin, event.channel, triggering_user_id, skill);
            return;
        }

        match self.router.route(&event) {
            Ok(deliveries) => {
                for delivery in deliveries {
                    self.enqueue(delivery).await;
                }
            }
            Err(e) => warn!("Dropping {} from {}: {}", event.kind.name(), event.origin, e),
        }
    }

    async fn enqueue(&self, delivery: Delivery) {
        let target = delivery.target.clone();
        let result = match self.outbound.get(&target.platform) {
            Some(tx) => tx.send(delivery).await.map_err(|_| "dispatcher stopped".to_string()),
            None => Err("no adapter for platform".to_string()),
        };
        if let Err(message) = result {
            let err = RelayError::AdapterSend {
                target: target.to_string(),
                message,
            };
            warn!("{}", err);
        }
    }

    /// Resolve the user in the background; the result re-enters the router queue.
    fn spawn_lookup(
        &self,
        origin: Platform,
        channel: String,
        user_id: u64,
        skill: Skill,
    ) -> JoinHandle<()> {
        let lookup = Arc::clone(&self.lookup);
        let router_tx = self.router_tx.clone();
        debug!(origin = %origin, user_id, "Looking up attribution user");

        tokio::spawn(async move {
            match lookup.display_name(user_id).await {
                Ok(name) => {
                    let event = ChatEvent::new(
                        origin,
                        channel,
                        Some(ChatUser::new(name.clone(), name)),
                        EventKind::Attribution(skill),
                    );
                    if let Err(e) = router_tx.send(event).await {
                        debug!("Router queue closed before lookup finished: {}", e);
                    }
                }
                Err(e) => warn!("Dropping attribution: {}", e),
            }
        })
    }
}

/// Move events from one adapter's inbound queue onto the router queue.
pub fn spawn_forwarder(
    platform: Platform,
    mut inbound_rx: mpsc::Receiver<ChatEvent>,
    router_tx: mpsc::Sender<ChatEvent>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(event) = inbound_rx.recv().await {
            if let Err(e) = router_tx.send(event).await {
                warn!("Failed to forward {} event to router: {}", platform, e);
                break;
            }
        }
        info!("{} -> router forwarding task ended", platform);
    })
}

/// Perform one delivery on an adapter.
pub async fn deliver(adapter: &dyn PlatformAdapter, delivery: &Delivery) -> RelayResult<()> {
    match &delivery.action {
        DeliveryAction::Send(text) => adapter.send(&delivery.target.channel, text).await,
        DeliveryAction::Clear => adapter.clear(&delivery.target.channel).await,
    }
}

/// Drain one platform's outbound queue in order. Failures are logged, never retried.
pub fn spawn_dispatcher(
    adapter: Arc<dyn PlatformAdapter>,
    mut outbound_rx: mpsc::Receiver<Delivery>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let platform = adapter.platform();
        while let Some(delivery) = outbound_rx.recv().await {
            if let Err(e) = deliver(adapter.as_ref(), &delivery).await {
                warn!("{}", e);
            }
        }
        info!("{} dispatcher ended", platform);
    })
}
