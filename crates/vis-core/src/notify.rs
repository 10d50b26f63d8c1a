//! Notification conduit between an adapter and its consumer.
//!
//! Each adapter owns exactly one conduit. The writer side (`Notifier`) is
//! called from inside the update path and must never wait for the consumer,
//! so the conduit holds a single pending message:
//!
//! - if the slot is empty, the change set is stored and the consumer woken;
//! - if a message is still pending, the new change set is merged into it,
//!   newer values replacing older ones path by path.
//!
//! A slow consumer therefore receives fewer, larger messages, but always
//! sees the latest value of every subscribed path that changed.

use crate::model::DataMap;
use std::pin::pin;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use thiserror::Error;
use tokio::sync::Notify;
use tracing::debug;

#[derive(Debug, Default)]
struct Slot {
    pending: Option<DataMap>,
    closed: bool,
}

#[derive(Debug, Default)]
struct Shared {
    slot: Mutex<Slot>,
    ready: Notify,
}

impl Shared {
    fn lock(&self) -> MutexGuard<'_, Slot> {
        self.slot.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

/// Errors from [`SubscribeChannel::try_recv`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum TryRecvError {
    /// No message is pending right now.
    #[error("No pending notification")]
    Empty,

    /// The adapter was closed and every pending message has been consumed.
    #[error("Notification channel closed")]
    Closed,
}

/// Create a connected notifier / channel pair.
pub fn conduit() -> (Notifier, SubscribeChannel) {
    let shared = Arc::new(Shared::default());
    (
        Notifier {
            shared: shared.clone(),
        },
        SubscribeChannel { shared },
    )
}

/// Producer side of the conduit, owned by the adapter.
///
/// Dropping the notifier closes the conduit.
#[derive(Debug)]
pub struct Notifier {
    shared: Arc<Shared>,
}

impl Notifier {
    /// Hand a change set to the consumer without blocking.
    ///
    /// Returns false if the conduit is closed; the changes are discarded.
    /// An empty change set is ignored.
    pub fn notify(&self, changes: DataMap) -> bool {
        if changes.is_empty() {
            return !self.is_closed();
        }

        {
            let mut slot = self.shared.lock();
            if slot.closed {
                return false;
            }
            match slot.pending.as_mut() {
                Some(pending) => {
                    debug!(
                        paths = changes.len(),
                        "Consumer has not drained previous notification, merging"
                    );
                    pending.extend(changes);
                }
                None => slot.pending = Some(changes),
            }
        }

        self.shared.ready.notify_one();
        true
    }

    /// Close the conduit. A message still pending stays readable.
    pub fn close(&self) {
        {
            let mut slot = self.shared.lock();
            if slot.closed {
                return;
            }
            slot.closed = true;
        }
        self.shared.ready.notify_waiters();
        self.shared.ready.notify_one();
    }

    pub fn is_closed(&self) -> bool {
        self.shared.lock().closed
    }
}

impl Drop for Notifier {
    fn drop(&mut self) {
        self.close();
    }
}

/// Consumer side of the conduit.
///
/// Clones share the same slot: a message is delivered to whichever clone
/// reads it first.
#[derive(Debug, Clone)]
pub struct SubscribeChannel {
    shared: Arc<Shared>,
}

impl SubscribeChannel {
    /// Wait for the next change set.
    ///
    /// Returns `None` once the adapter is closed and nothing is pending.
    pub async fn recv(&self) -> Option<DataMap> {
        loop {
            let mut notified = pin!(self.shared.ready.notified());
            notified.as_mut().enable();

            match self.try_recv() {
                Ok(changes) => return Some(changes),
                Err(TryRecvError::Closed) => return None,
                Err(TryRecvError::Empty) => {}
            }

            notified.await;
        }
    }

    /// Take the pending change set if there is one.
    pub fn try_recv(&self) -> Result<DataMap, TryRecvError> {
        let mut slot = self.shared.lock();
        match slot.pending.take() {
            Some(changes) => Ok(changes),
            None if slot.closed => Err(TryRecvError::Closed),
            None => Err(TryRecvError::Empty),
        }
    }

    /// True once the adapter closed the conduit (pending data may remain).
    pub fn is_closed(&self) -> bool {
        self.shared.lock().closed
    }
}
