//! In-process event bus for cross-component sidebar signals.
//!
//! Fire-and-forget and at-most-once: events published with no subscriber,
//! or missed by a lagging subscriber, are gone. The periodic refresh
//! repairs whatever a lost event would have changed.

use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;
use tokio::sync::broadcast::error::RecvError;

use crate::sidebar;
use crate::state::AppState;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum SidebarEvent {
    /// The user sent input into a usecase.
    EntityTouched {
        #[serde(rename = "entityId")]
        entity_id: String,
    },
    /// A usecase was created elsewhere in the app.
    EntityCreated {
        #[serde(rename = "entityId")]
        entity_id: String,
    },
}

#[derive(Clone)]
pub struct EventBus {
    tx: broadcast::Sender<SidebarEvent>,
}

impl EventBus {
    pub fn new(capacity: usize) -> Self {
        let (tx, _rx) = broadcast::channel(capacity);
        Self { tx }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SidebarEvent> {
        self.tx.subscribe()
    }

    /// Returns the number of subscribers that will see the event.
    pub fn publish(&self, event: SidebarEvent) -> usize {
        log::debug!("Event bus: publish {:?}", event);
        self.tx.send(event).unwrap_or(0)
    }
}

/// Background task applying bus events to the sidebar state.
///
/// Subscribe before spawning so nothing published in between is missed.
pub async fn run_event_bridge(state: Arc<AppState>, mut rx: broadcast::Receiver<SidebarEvent>) {
    log::info!("Event bridge: started");

    loop {
        match rx.recv().await {
            Ok(event) => handle_event(&state, event),
            Err(RecvError::Lagged(missed)) => {
                log::warn!(
                    "Event bridge: dropped {} events, next refresh will catch up",
                    missed
                );
            }
            Err(RecvError::Closed) => break,
        }
    }

    log::info!("Event bridge: stopped");
}

/// Touches apply inline. Adopting a created usecase waits on the network,
/// so it runs in its own task and never holds up later touches.
pub fn handle_event(state: &Arc<AppState>, event: SidebarEvent) {
    match event {
        SidebarEvent::EntityTouched { entity_id } => {
            sidebar::apply_touch(state, &entity_id);
        }
        SidebarEvent::EntityCreated { entity_id } => {
            let state = Arc::clone(state);
            tokio::spawn(async move {
                sidebar::adopt_created(&state, &entity_id).await;
            });
        }
    }
}
