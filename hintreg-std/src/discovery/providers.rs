//! Shared sets of discovery sources.

use super::source::DiscoverySource;
use parking_lot::RwLock;
use std::{
    fmt,
    sync::{Arc, LazyLock},
};

/// Identifies a source added to a [`ProviderSet`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SourceId(u64);

#[derive(Default)]
struct Inner {
    sources: Vec<(SourceId, Arc<dyn DiscoverySource>)>,
    next_id: u64,
    generation: u64,
}

/// A shared, ordered set of discovery sources.
///
/// Cloning clones the handle. Registries built with the same set see every
/// source added to it; each registry merges new sources lazily, the next time
/// a category is looked up. Removing a source does not withdraw candidates a
/// registry already took from it.
#[derive(Clone, Default)]
pub struct ProviderSet {
    inner: Arc<RwLock<Inner>>,
}

static GLOBAL: LazyLock<ProviderSet> = LazyLock::new(ProviderSet::new);

impl ProviderSet {
    /// An empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// The process-wide set.
    pub fn global() -> &'static ProviderSet {
        &GLOBAL
    }

    /// Add a source.
    pub fn add<S: DiscoverySource + 'static>(&self, source: S) -> SourceId {
        self.add_shared(Arc::new(source))
    }

    /// Add a shared source.
    pub fn add_shared(&self, source: Arc<dyn DiscoverySource>) -> SourceId {
        let mut inner = self.inner.write();
        let id = SourceId(inner.next_id);
        inner.next_id += 1;
        inner.generation += 1;
        tracing::debug!(source = source.name(), "discovery source added");
        inner.sources.push((id, source));
        id
    }

    /// Remove a source. Returns whether it was present.
    pub fn remove(&self, id: SourceId) -> bool {
        let mut inner = self.inner.write();
        let before = inner.sources.len();
        inner.sources.retain(|(other, _)| *other != id);
        let removed = inner.sources.len() != before;
        if removed {
            inner.generation += 1;
        }
        removed
    }

    /// Number of sources.
    pub fn len(&self) -> usize {
        self.inner.read().sources.len()
    }

    /// Whether the set holds no source.
    pub fn is_empty(&self) -> bool {
        self.inner.read().sources.is_empty()
    }

    /// Counter bumped by every change to the set.
    pub fn generation(&self) -> u64 {
        self.inner.read().generation
    }

    /// The current sources, in insertion order.
    pub fn snapshot(&self) -> Vec<(SourceId, Arc<dyn DiscoverySource>)> {
        self.inner.read().sources.clone()
    }
}

impl fmt::Debug for ProviderSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.inner.read();
        f.debug_struct("ProviderSet")
            .field(
                "sources",
                &inner
                    .sources
                    .iter()
                    .map(|(_, source)| source.name())
                    .collect::<Vec<_>>(),
            )
            .field("generation", &inner.generation)
            .finish()
    }
}
