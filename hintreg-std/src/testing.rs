//! Testing utilities for hintreg.
//!
//! # Features
//!
//! - [`RecordingSource`]: A discovery source that counts how often it is asked
//! - [`DisposeProbe`]: A candidate that records calls to `dispose`

use crate::{
    discovery::{DiscoverySource, StaticSource},
    resolver::Resolver,
};
use hintreg_core::{BoxError, Candidate, Category, Service};
use parking_lot::Mutex;
use std::{
    collections::HashMap,
    sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    },
};

// ============================================================================
// Recording Source
// ============================================================================

/// A discovery source that records every `discover` call.
///
/// Clones share the recorded calls, so keep a clone after handing the source
/// to a registry.
///
/// # Example
///
/// ```rust,ignore
/// let source = RecordingSource::new("plugins").with::<dyn Greeter>(Arc::new(English));
/// registry.add_provider(source.clone());
///
/// registry.get::<dyn Greeter>()?;
/// registry.get::<dyn Greeter>()?;
/// assert_eq!(source.calls(Category::of::<dyn Greeter>()), 1);
/// ```
#[derive(Clone)]
pub struct RecordingSource {
    inner: StaticSource,
    calls: Arc<Mutex<HashMap<Category, usize>>>,
}

impl RecordingSource {
    /// An empty recording source.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            inner: StaticSource::new(name),
            calls: Arc::default(),
        }
    }

    /// Offer `instance` as a candidate of category `T`.
    pub fn with<T: ?Sized + Candidate>(mut self, instance: Arc<T>) -> Self {
        self.inner = self.inner.with::<T>(instance);
        self
    }

    /// Number of `discover` calls for `category`.
    pub fn calls(&self, category: Category) -> usize {
        self.calls.lock().get(&category).copied().unwrap_or(0)
    }

    /// Number of `discover` calls over all categories.
    pub fn total_calls(&self) -> usize {
        self.calls.lock().values().sum()
    }
}

impl DiscoverySource for RecordingSource {
    fn name(&self) -> &str {
        self.inner.name()
    }

    fn discover(
        &self,
        category: Category,
        resolver: &mut Resolver<'_>,
    ) -> Result<Vec<Service>, BoxError> {
        *self.calls.lock().entry(category).or_insert(0) += 1;
        self.inner.discover(category, resolver)
    }
}

// ============================================================================
// Dispose Probe
// ============================================================================

/// A candidate counting its `dispose` calls.
///
/// Clones share the counters.
#[derive(Clone, Default)]
pub struct DisposeProbe {
    disposed: Arc<AtomicUsize>,
    shutdowns: Arc<AtomicUsize>,
}

impl DisposeProbe {
    /// A probe that was never disposed.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of `dispose` calls.
    pub fn disposed(&self) -> usize {
        self.disposed.load(Ordering::SeqCst)
    }

    /// Number of `dispose(true)` calls.
    pub fn shutdowns(&self) -> usize {
        self.shutdowns.load(Ordering::SeqCst)
    }
}

impl Candidate for DisposeProbe {
    fn dispose(&self, shutdown: bool) {
        self.disposed.fetch_add(1, Ordering::SeqCst);
        if shutdown {
            self.shutdowns.fetch_add(1, Ordering::SeqCst);
        }
    }
}
