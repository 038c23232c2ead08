use std::collections::HashMap;
use std::sync::{Arc, Mutex, MutexGuard};

use tokio::sync::mpsc;
use tokio::sync::mpsc::error::TrySendError;
use tracing::{debug, info};
use uuid::Uuid;

use super::DashboardFrame;

pub type SubscriberId = Uuid;

/// Explicit subscriber registry. Frames are shared, never copied per viewer.
#[derive(Debug, Clone)]
pub struct Broadcaster {
    subscribers: Arc<Mutex<HashMap<SubscriberId, mpsc::Sender<Arc<DashboardFrame>>>>>,
    queue_depth: usize,
}

impl Broadcaster {
    pub fn new(queue_depth: usize) -> Self {
        Self {
            subscribers: Arc::new(Mutex::new(HashMap::new())),
            queue_depth: queue_depth.max(1),
        }
    }

    fn registry(&self) -> MutexGuard<'_, HashMap<SubscriberId, mpsc::Sender<Arc<DashboardFrame>>>> {
        self.subscribers.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }

    pub fn add(&self) -> (SubscriberId, mpsc::Receiver<Arc<DashboardFrame>>) {
        let (tx, rx) = mpsc::channel(self.queue_depth);
        let id = Uuid::new_v4();
        self.registry().insert(id, tx);
        info!(%id, "New connection");
        (id, rx)
    }

    pub fn remove(&self, id: &SubscriberId) -> bool {
        let removed = self.registry().remove(id).is_some();
        if removed {
            info!(%id, "Connection closed");
        }
        removed
    }

    pub fn len(&self) -> usize {
        self.registry().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Delivers to every live subscriber and returns how many got the frame.
    /// Closed subscribers are dropped; slow ones miss this frame.
    pub fn publish(&self, frame: DashboardFrame) -> usize {
        let frame = Arc::new(frame);
        let mut delivered = 0;
        self.registry().retain(|id, tx| match tx.try_send(Arc::clone(&frame)) {
            Ok(()) => {
                delivered += 1;
                true
            }
            Err(TrySendError::Full(_)) => {
                debug!(%id, "subscriber lagging, frame skipped");
                true
            }
            Err(TrySendError::Closed(_)) => {
                info!(%id, "Connection closed");
                false
            }
        });
        delivered
    }
}

impl Default for Broadcaster {
    fn default() -> Self {
        Self::new(4)
    }
}
