//! Active session registry.
//!
//! Maps client ids to the outbound channel of the session serving them.
//! Critical sections only touch the map: senders are cloned out before any
//! await, so no lock is held across message delivery or frame processing.

use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use dashcam_models::{ClientId, OutboundMessage};
use tokio::sync::mpsc;
use tracing::{debug, info};

use crate::error::RegistryError;

/// Outbound half of a session's delivery channel.
pub type OutboundSender = mpsc::Sender<OutboundMessage>;

struct Entry {
    generation: u64,
    tx: OutboundSender,
}

#[derive(Default)]
struct Inner {
    sessions: HashMap<ClientId, Entry>,
    next_generation: u64,
}

/// Registry of active sessions, shared by all connections.
#[derive(Clone, Default)]
pub struct SessionRegistry {
    inner: Arc<Mutex<Inner>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Inner> {
        // The map stays consistent even if a holder panicked.
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Register a session. Fails if the client already has an active session.
    ///
    /// The returned handle removes the entry when dropped.
    pub fn connect(&self, client_id: ClientId, tx: OutboundSender) -> Result<SessionHandle, RegistryError> {
        let generation = {
            let mut inner = self.lock();
            if inner.sessions.contains_key(&client_id) {
                return Err(RegistryError::DuplicateSession(client_id));
            }
            inner.next_generation += 1;
            let generation = inner.next_generation;
            inner.sessions.insert(
                client_id.clone(),
                Entry {
                    generation,
                    tx: tx.clone(),
                },
            );
            generation
        };

        info!(client_id = %client_id, "Session registered");
        Ok(SessionHandle {
            registry: self.clone(),
            client_id,
            generation,
            tx,
        })
    }

    /// Remove a session. Returns false if none was registered.
    pub fn disconnect(&self, client_id: &ClientId) -> bool {
        let removed = self.lock().sessions.remove(client_id).is_some();
        if removed {
            info!(client_id = %client_id, "Session unregistered");
        }
        removed
    }

    fn release(&self, client_id: &ClientId, generation: u64) {
        let mut inner = self.lock();
        // A newer session may have taken over after an explicit disconnect.
        if inner
            .sessions
            .get(client_id)
            .is_some_and(|entry| entry.generation == generation)
        {
            inner.sessions.remove(client_id);
            drop(inner);
            debug!(client_id = %client_id, "Session handle released");
        }
    }

    /// Best-effort delivery. Returns false when the session is absent or gone.
    pub async fn send(&self, client_id: &ClientId, message: OutboundMessage) -> bool {
        let tx = self.lock().sessions.get(client_id).map(|entry| entry.tx.clone());
        match tx {
            Some(tx) => send_outbound(&tx, message).await,
            None => {
                debug!(client_id = %client_id, "Dropping message for inactive session");
                false
            }
        }
    }

    pub fn contains(&self, client_id: &ClientId) -> bool {
        self.lock().sessions.contains_key(client_id)
    }

    /// Number of active sessions.
    pub fn len(&self) -> usize {
        self.lock().sessions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

/// Send with backpressure: try a non-blocking send first, then wait for room.
async fn send_outbound(tx: &OutboundSender, message: OutboundMessage) -> bool {
    match tx.try_send(message) {
        Ok(()) => true,
        Err(mpsc::error::TrySendError::Full(message)) => {
            debug!("Outbound buffer full, applying backpressure");
            tx.send(message).await.is_ok()
        }
        Err(mpsc::error::TrySendError::Closed(_)) => false,
    }
}

/// Registration of one live session.
///
/// Dropping the handle unregisters the session, so every exit path of the
/// session loop releases its registry entry.
pub struct SessionHandle {
    registry: SessionRegistry,
    client_id: ClientId,
    generation: u64,
    tx: OutboundSender,
}

impl SessionHandle {
    pub fn client_id(&self) -> &ClientId {
        &self.client_id
    }

    /// Deliver a message to this session's peer.
    pub async fn send(&self, message: OutboundMessage) -> bool {
        send_outbound(&self.tx, message).await
    }
}

impl Drop for SessionHandle {
    fn drop(&mut self) {
        self.registry.release(&self.client_id, self.generation);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(s: &str) -> ClientId {
        ClientId::parse(s).unwrap()
    }

    #[tokio::test]
    async fn test_connect_and_drop() {
        let registry = SessionRegistry::new();
        let (tx, _rx) = mpsc::channel(4);
        let handle = registry.connect(id("cam-1"), tx).unwrap();
        assert!(registry.contains(&id("cam-1")));
        assert_eq!(handle.client_id(), &id("cam-1"));

        drop(handle);
        assert!(registry.is_empty());
    }

    #[tokio::test]
    async fn test_duplicate_rejected() {
        let registry = SessionRegistry::new();
        let (tx, _rx) = mpsc::channel(4);
        let _handle = registry.connect(id("cam-1"), tx.clone()).unwrap();
        assert_eq!(
            registry.connect(id("cam-1"), tx).err(),
            Some(RegistryError::DuplicateSession(id("cam-1")))
        );
        assert_eq!(registry.len(), 1);
    }

    #[tokio::test]
    async fn test_disconnect_absent_is_noop() {
        let registry = SessionRegistry::new();
        assert!(!registry.disconnect(&id("nobody")));
    }

    #[tokio::test]
    async fn test_stale_handle_does_not_remove_new_session() {
        let registry = SessionRegistry::new();
        let (tx, _rx) = mpsc::channel(4);
        let old = registry.connect(id("cam-1"), tx.clone()).unwrap();
        assert!(registry.disconnect(&id("cam-1")));
        let _new = registry.connect(id("cam-1"), tx).unwrap();

        drop(old);
        assert!(registry.contains(&id("cam-1")));
    }

    #[tokio::test]
    async fn test_send_best_effort() {
        let registry = SessionRegistry::new();
        let (tx, mut rx) = mpsc::channel(4);
        let _handle = registry.connect(id("cam-1"), tx).unwrap();

        assert!(registry.send(&id("cam-1"), OutboundMessage::error("hi")).await);
        assert_eq!(rx.recv().await, Some(OutboundMessage::error("hi")));

        assert!(!registry.send(&id("cam-2"), OutboundMessage::error("hi")).await);

        drop(rx);
        assert!(!registry.send(&id("cam-1"), OutboundMessage::error("hi")).await);
    }

    #[tokio::test]
    async fn test_concurrent_connects_admit_one() {
        let registry = SessionRegistry::new();
        let (tx, _rx) = mpsc::channel(4);

        let tasks: Vec<_> = (0..16)
            .map(|_| {
                let registry = registry.clone();
                let tx = tx.clone();
                tokio::spawn(async move { registry.connect(id("cam-1"), tx).ok() })
            })
            .collect();

        let mut handles = Vec::new();
        for task in tasks {
            if let Some(handle) = task.await.unwrap() {
                handles.push(handle);
            }
        }
        assert_eq!(handles.len(), 1);
        assert_eq!(registry.len(), 1);
    }
}
