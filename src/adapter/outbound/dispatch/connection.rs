//! Live infra connections.
//!
//! Each connected agent holds the receiving end of a bounded channel. A
//! dispatch never waits: a full queue or an absent agent is reported back
//! to the caller, which logs and moves on.

use dashmap::DashMap;
use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::domain::id::InfraId;
use crate::error::DispatchError;
use crate::port::outbound::dispatch::{DispatchRequest, Dispatcher};

/// Default per-infra queue depth.
pub const DEFAULT_CHANNEL_CAPACITY: usize = 64;

/// Registry of connected infra agents.
#[derive(Debug)]
pub struct InfraConnections {
    senders: DashMap<InfraId, mpsc::Sender<DispatchRequest>>,
    capacity: usize,
}

impl InfraConnections {
    /// Create an empty registry. A zero capacity is raised to one.
    #[must_use]
    pub fn new(capacity: usize) -> Self {
        Self {
            senders: DashMap::new(),
            capacity: capacity.max(1),
        }
    }

    /// Register an agent for `infra_id`, replacing any previous connection.
    ///
    /// The previous receiver sees its channel close.
    pub fn subscribe(&self, infra_id: InfraId) -> mpsc::Receiver<DispatchRequest> {
        let (tx, rx) = mpsc::channel(self.capacity);
        if self.senders.insert(infra_id.clone(), tx).is_some() {
            debug!(infra_id = %infra_id, "Replaced existing infra connection");
        }
        info!(infra_id = %infra_id, "Infra connected");
        rx
    }

    /// Drop the connection for `infra_id`. Returns whether one existed.
    pub fn unsubscribe(&self, infra_id: &InfraId) -> bool {
        let removed = self.senders.remove(infra_id).is_some();
        if removed {
            info!(infra_id = %infra_id, "Infra disconnected");
        }
        removed
    }

    #[must_use]
    pub fn is_connected(&self, infra_id: &InfraId) -> bool {
        self.senders
            .get(infra_id)
            .is_some_and(|tx| !tx.is_closed())
    }

    /// Number of registered connections.
    #[must_use]
    pub fn len(&self) -> usize {
        self.senders.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.senders.is_empty()
    }

    /// Evict the entry for `infra_id` only while its receiver is gone.
    ///
    /// A connection re-established since the failed send stays registered.
    fn prune_closed(&self, infra_id: &InfraId) -> bool {
        let pruned = self
            .senders
            .remove_if(infra_id, |_, tx| tx.is_closed())
            .is_some();
        if pruned {
            debug!(infra_id = %infra_id, "Pruned closed infra connection");
        }
        pruned
    }

    /// Drop every connection.
    pub fn close_all(&self) {
        let count = self.senders.len();
        self.senders.clear();
        debug!(count, "Closed all infra connections");
    }
}

impl Default for InfraConnections {
    fn default() -> Self {
        Self::new(DEFAULT_CHANNEL_CAPACITY)
    }
}

impl Dispatcher for InfraConnections {
    fn dispatch(&self, request: DispatchRequest) -> Result<(), DispatchError> {
        let infra_id = request.infra_id.clone();
        let sent = match self.senders.get(&infra_id) {
            Some(tx) => tx.try_send(request),
            None => return Err(DispatchError::Offline(infra_id)),
        };

        match sent {
            Ok(()) => {
                debug!(infra_id = %infra_id, "Dispatch queued");
                Ok(())
            }
            Err(mpsc::error::TrySendError::Full(_)) => Err(DispatchError::QueueFull(infra_id)),
            Err(mpsc::error::TrySendError::Closed(_)) => {
                self.prune_closed(&infra_id);
                Err(DispatchError::Closed(infra_id))
            }
        }
    }
}
