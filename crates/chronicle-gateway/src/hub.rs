use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::{RwLock, mpsc};
use tracing::warn;
use uuid::Uuid;

use chronicle_types::frames::ChatFrame;

/// Explicit registry of active chat connections. Exactly two fan-out
/// primitives exist: broadcast to all, and broadcast to all but the sender.
/// No rooms, no history, no delivery guarantee — a participant that is not
/// connected when a frame arrives simply misses it.
#[derive(Clone)]
pub struct ChatHub {
    inner: Arc<RwLock<HashMap<Uuid, mpsc::UnboundedSender<String>>>>,
}

impl ChatHub {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Register a new connection. Returns its id and the receiving half the
    /// connection's send task drains.
    pub async fn register(&self) -> (Uuid, mpsc::UnboundedReceiver<String>) {
        let conn_id = Uuid::new_v4();
        let (tx, rx) = mpsc::unbounded_channel();
        self.inner.write().await.insert(conn_id, tx);
        (conn_id, rx)
    }

    pub async fn unregister(&self, conn_id: Uuid) {
        self.inner.write().await.remove(&conn_id);
    }

    /// Deliver a frame to every connected participant, the sender included.
    pub async fn broadcast_all(&self, frame: &ChatFrame) {
        let Some(text) = serialize(frame) else { return };
        for tx in self.inner.read().await.values() {
            let _ = tx.send(text.clone());
        }
    }

    /// Deliver a frame to every connected participant except the sender.
    pub async fn broadcast_except(&self, sender_id: Uuid, frame: &ChatFrame) {
        let Some(text) = serialize(frame) else { return };
        for (&conn_id, tx) in self.inner.read().await.iter() {
            if conn_id != sender_id {
                let _ = tx.send(text.clone());
            }
        }
    }

    pub async fn connection_count(&self) -> usize {
        self.inner.read().await.len()
    }
}

impl Default for ChatHub {
    fn default() -> Self {
        Self::new()
    }
}

// ChatFrame serialization cannot fail in practice (plain struct over
// serde_json::Value); if it ever does, skip the broadcast rather than hand
// clients an unparseable frame.
fn serialize(frame: &ChatFrame) -> Option<String> {
    match serde_json::to_string(frame) {
        Ok(text) => Some(text),
        Err(err) => {
            warn!("chat frame serialization failed, frame dropped: {}", err);
            None
        }
    }
}
