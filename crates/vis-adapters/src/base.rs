//! State shared by all adapters: name, path store and notification conduit.

use tracing::{debug, info};
use vis_core::{conduit, DataMap, Notifier, PathStore, Result, SubscribeChannel};

/// The store plus the single conduit that reports its subscribed changes.
#[derive(Debug)]
pub struct BaseAdapter {
    name: String,
    store: PathStore,
    notifier: Notifier,
    channel: SubscribeChannel,
}

impl BaseAdapter {
    /// Wrap a populated store.
    pub fn new(name: &str, store: PathStore) -> Self {
        let (notifier, channel) = conduit();
        Self {
            name: name.to_string(),
            store,
            notifier,
            channel,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn store(&self) -> &PathStore {
        &self.store
    }

    pub fn subscribe_channel(&self) -> SubscribeChannel {
        self.channel.clone()
    }

    /// Commit values locally and notify about subscribed changes.
    pub fn set_data(&self, data: DataMap) -> Result<()> {
        if let Some(changes) = self.store.update(data)? {
            debug!(adapter = %self.name, paths = changes.len(), "Notify data change");
            if !self.notifier.notify(changes) {
                debug!(adapter = %self.name, "Adapter closed, change not delivered");
            }
        }
        Ok(())
    }

    /// Close the notification conduit. Safe to call more than once.
    pub fn close(&self) {
        if !self.notifier.is_closed() {
            info!(adapter = %self.name, "Close adapter");
            self.notifier.close();
        }
    }

    pub fn is_closed(&self) -> bool {
        self.notifier.is_closed()
    }
}
