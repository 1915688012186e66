//! Canonical message types for relay output.
//!
//! The router turns every accepted event into a list of [`Delivery`] values;
//! the engine hands each one to the dispatcher of its target platform.

use crate::common::types::RoutingTarget;

/// What to do on a target chat surface.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DeliveryAction {
    /// Post a line of text.
    Send(String),
    /// Clear the chat window.
    Clear,
}

/// A single outbound action for one destination.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Delivery {
    pub target: RoutingTarget,
    pub action: DeliveryAction,
}

impl Delivery {
    pub fn send(target: RoutingTarget, text: impl Into<String>) -> Self {
        Self {
            target,
            action: DeliveryAction::Send(text.into()),
        }
    }

    pub fn clear(target: RoutingTarget) -> Self {
        Self {
            target,
            action: DeliveryAction::Clear,
        }
    }

    /// Text of a send action.
    pub fn text(&self) -> Option<&str> {
        match &self.action {
            DeliveryAction::Send(text) => Some(text),
            DeliveryAction::Clear => None,
        }
    }
}
