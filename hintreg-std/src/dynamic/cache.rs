//! Weak cache of constructed instances.
//!
//! The cache never keeps an instance alive. Once every caller dropped its
//! `Arc`, the entry goes stale and is pruned on the next access.

use hintreg_core::{Candidate, Category, Service};
use std::sync::{Arc, Weak};

type Upgrade = dyn Fn() -> Option<Service> + Send + Sync;

struct Entry {
    category: Category,
    address: usize,
    upgrade: Box<Upgrade>,
}

#[derive(Default)]
pub(crate) struct InstanceCache {
    entries: Vec<Entry>,
}

impl InstanceCache {
    pub(crate) fn insert<T: ?Sized + Candidate>(&mut self, instance: &Arc<T>) {
        let service = Service::new::<T>(instance.clone());
        let weak: Weak<T> = Arc::downgrade(instance);
        self.entries.push(Entry {
            category: service.category(),
            address: service.address(),
            upgrade: Box::new(move || weak.upgrade().map(Service::new::<T>)),
        });
    }

    /// Live instances cached for `category`, oldest first.
    pub(crate) fn live(&mut self, category: Category) -> Vec<Service> {
        self.prune();
        self.entries
            .iter()
            .filter(|entry| entry.category == category)
            .filter_map(|entry| (entry.upgrade)())
            .collect()
    }

    /// Number of live instances cached for `category`.
    pub(crate) fn len(&mut self, category: Category) -> usize {
        self.live(category).len()
    }

    /// Drop the live entry for the instance at `address`, returning it.
    pub(crate) fn remove(&mut self, address: usize) -> Option<Service> {
        self.prune();
        let pos = self
            .entries
            .iter()
            .position(|entry| entry.address == address)?;
        let entry = self.entries.remove(pos);
        (entry.upgrade)()
    }

    /// Remove every entry, returning the instances still alive.
    pub(crate) fn drain(&mut self) -> Vec<Service> {
        self.entries
            .drain(..)
            .filter_map(|entry| (entry.upgrade)())
            .collect()
    }

    pub(crate) fn clear(&mut self) {
        self.entries.clear();
    }

    fn prune(&mut self) {
        let before = self.entries.len();
        self.entries.retain(|entry| (entry.upgrade)().is_some());
        let pruned = before - self.entries.len();
        if pruned > 0 {
            tracing::trace!(pruned, "stale cache entries pruned");
        }
    }
}
