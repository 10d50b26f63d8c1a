//! The contract every adapter offers to the VIS server.

use async_trait::async_trait;
use vis_core::{DataMap, Result, SubscribeChannel};

use crate::base::BaseAdapter;

/// Uniform, path-addressed view of one upstream data source.
///
/// Everything except `set_data` and `close` is answered from the local
/// store, so the provided methods only need [`DataAdapter::base`].
/// Adapters override `set_data` to push writes upstream before committing.
#[async_trait]
pub trait DataAdapter: Send + Sync {
    /// Shared store and notification state.
    fn base(&self) -> &BaseAdapter;

    /// Write values. Implementations that mirror an upstream source must
    /// commit locally only after the upstream write succeeded.
    async fn set_data(&self, data: DataMap) -> Result<()>;

    /// Stop background work and close the notification channel.
    async fn close(&self) {
        self.base().close();
    }

    fn name(&self) -> &str {
        self.base().name()
    }

    /// All paths this adapter serves.
    fn path_list(&self) -> Result<Vec<String>> {
        Ok(self.base().store().path_list())
    }

    /// Whether `path` can be read without authorization.
    fn is_path_public(&self, path: &str) -> Result<bool> {
        self.base().store().is_path_public(path)
    }

    fn get_data(&self, paths: &[String]) -> Result<DataMap> {
        self.base().store().get_data(paths)
    }

    fn subscribe(&self, paths: &[String]) -> Result<()> {
        self.base().store().subscribe(paths)
    }

    fn unsubscribe(&self, paths: &[String]) -> Result<()> {
        self.base().store().unsubscribe(paths);
        Ok(())
    }

    fn unsubscribe_all(&self) -> Result<()> {
        self.base().store().unsubscribe_all();
        Ok(())
    }

    /// Channel on which changes of subscribed paths are delivered.
    fn subscribe_channel(&self) -> SubscribeChannel {
        self.base().subscribe_channel()
    }
}
