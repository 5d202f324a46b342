use std::sync::Arc;

use parking_lot::RwLock;
use slotmap::{Key, SlotMap};

/// Thread-safe handle-based asset container.
///
/// Decode tasks on the asset runtime insert through an `Arc<AssetStorage>`
/// clone while the render loop reads, so all access goes through the lock.
pub struct AssetStorage<H: Key, T> {
    inner: RwLock<SlotMap<H, Arc<T>>>,
}

impl<H: Key, T> Default for AssetStorage<H, T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<H: Key, T> AssetStorage<H, T> {
    #[must_use]
    pub fn new() -> Self {
        Self {
            inner: RwLock::new(SlotMap::default()),
        }
    }

    /// [Write] Adds a resource and returns a handle.
    pub fn add(&self, asset: impl Into<T>) -> H {
        let mut guard = self.inner.write();
        guard.insert(Arc::new(asset.into()))
    }

    /// [Read] Gets a single resource as a cheap `Arc` clone.
    pub fn get(&self, handle: H) -> Option<Arc<T>> {
        let guard = self.inner.read();
        guard.get(handle).cloned()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.inner.read().len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
