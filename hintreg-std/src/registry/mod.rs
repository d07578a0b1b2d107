//! The factory registry.
//!
//! A [`Registry`] serves a fixed set of categories. For each category it keeps
//! the registered candidates in registration order plus an ordering graph, and
//! answers lookups filtered by availability, a caller predicate, hint
//! compatibility and an optional acceptance hook.
//!
//! Discovery is lazy: the first lookup of a category runs its declarations
//! and asks every discovery source. Sources added later are merged on the
//! next lookup of each category.

mod builder;
mod lookup;
mod query;
mod scan;

pub use builder::RegistryBuilder;
pub use query::{Candidates, FilterFn, Query};

use crate::{
    discovery::{DiscoverySource, ProviderSet, SourceId},
    dynamic::Factories,
    resolver::{CallStack, Resolver},
};
use hintreg_core::{
    BoxError, Candidate, Category, DefaultsStore, HintSet, ImplType, NodeId, OrderingGraph,
    Organizer, RegistryError, Service, address, candidates_equal,
};
use std::{
    cmp,
    collections::{HashMap, HashSet},
    fmt::{self, Write as _},
    sync::Arc,
};

/// Registry-level acceptance hook, run after every other check.
pub type AcceptanceFn = dyn Fn(Category, &dyn Candidate, &HintSet) -> bool + Send + Sync;

/// Builds a declared service.
pub(crate) type DeclareFn = dyn Fn(&mut Resolver<'_>) -> Result<Service, BoxError> + Send + Sync;

/// A declaration made on the builder.
pub(crate) struct Declared {
    pub(crate) category: Category,
    pub(crate) build: Arc<DeclareFn>,
}

/// One stored instance, shared by every category it was registered for.
pub(crate) struct Record {
    pub(crate) candidate: Arc<dyn Candidate>,
    pub(crate) bindings: HashMap<Category, Service>,
    pub(crate) disposed: bool,
}

/// Per-category state.
#[derive(Default)]
pub(crate) struct Pool {
    pub(crate) nodes: Vec<NodeId>,
    pub(crate) graph: OrderingGraph,
    pub(crate) scanned: bool,
    pub(crate) generation: u64,
    pub(crate) consumed: HashSet<SourceId>,
}

/// A registry of candidates for a fixed set of categories.
///
/// Operations take `&mut self` and run to completion. Wrap the registry in a
/// lock to share it between threads.
///
/// # Example
///
/// ```rust,ignore
/// let mut registry = Registry::builder()
///     .declare_service::<dyn Greeter>(Arc::new(English))
///     .declare_service::<dyn Greeter>(Arc::new(French))
///     .build();
///
/// registry.set_implementation_ordering::<dyn Greeter>(
///     ImplType::of::<French>(),
///     ImplType::of::<English>(),
/// )?;
/// let greeter = registry.get::<dyn Greeter>()?;
/// ```
pub struct Registry {
    pub(crate) categories: Vec<Category>,
    pub(crate) records: Vec<Record>,
    pub(crate) pools: HashMap<Category, Pool>,
    pub(crate) declarations: Vec<Declared>,
    pub(crate) providers: ProviderSet,
    pub(crate) defaults: Option<DefaultsStore>,
    pub(crate) acceptance: Option<Arc<AcceptanceFn>>,
    #[cfg(feature = "inventory")]
    pub(crate) include_declared: bool,
    pub(crate) factories: Option<Factories>,
}

impl Registry {
    /// Start building a registry.
    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::new()
    }

    // ========================================================================
    // Registration
    // ========================================================================

    /// Register `instance` as a candidate of `T`.
    ///
    /// Returns `false` when the same instance, or a structurally equal
    /// candidate, is already registered for `T`. An instance registered for
    /// several categories is stored once.
    pub fn register<T>(&mut self, instance: Arc<T>) -> Result<bool, RegistryError>
    where
        T: ?Sized + Candidate,
    {
        self.register_service(Service::new::<T>(instance))
    }

    /// Register an already bound service under its category.
    pub fn register_service(&mut self, service: Service) -> Result<bool, RegistryError> {
        let category = service.category();
        let instance = service.address();
        let Some(pool) = self.pools.get(&category) else {
            return Err(RegistryError::UnknownCategory(category));
        };

        for &id in &pool.nodes {
            let record = &self.records[id];
            if address(record.candidate.as_ref()) == instance {
                return Ok(false);
            }
            if !record.disposed
                && candidates_equal(record.candidate.as_ref(), service.candidate().as_ref())
            {
                tracing::trace!(
                    category = %category,
                    candidate = %service.implementation_type(),
                    "equal candidate already registered"
                );
                return Ok(false);
            }
        }

        let id = match self
            .records
            .iter()
            .position(|record| address(record.candidate.as_ref()) == instance)
        {
            Some(id) => id,
            None => {
                self.records.push(Record {
                    candidate: service.candidate().clone(),
                    bindings: HashMap::new(),
                    disposed: false,
                });
                self.records.len() - 1
            }
        };
        let candidate = service.candidate().clone();
        self.records[id].bindings.insert(category, service);

        let peers: Vec<(NodeId, Arc<dyn Candidate>)> = self.pools[&category]
            .nodes
            .iter()
            .filter(|&&node| !self.records[node].disposed)
            .map(|&node| (node, self.records[node].candidate.clone()))
            .collect();
        if let Some(pool) = self.pools.get_mut(&category) {
            pool.nodes.push(id);
            let mut organizer = Organizer::new(category, id, &peers, &mut pool.graph);
            candidate.declare_ordering(&mut organizer);
        }

        tracing::debug!(
            category = %category,
            candidate = %candidate.implementation_type(),
            "candidate registered"
        );
        Ok(true)
    }

    /// Add a discovery source to this registry's provider set.
    pub fn add_provider<S>(&mut self, source: S) -> SourceId
    where
        S: DiscoverySource + 'static,
    {
        self.providers.add(source)
    }

    /// Remove a discovery source. Candidates it already supplied stay registered.
    pub fn remove_provider(&mut self, id: SourceId) -> bool {
        self.providers.remove(id)
    }

    /// The provider set this registry merges sources from.
    pub fn providers(&self) -> &ProviderSet {
        &self.providers
    }

    /// Forget what was discovered so far and scan every category again.
    ///
    /// Candidates already registered stay; rediscovered equal candidates are
    /// not registered twice.
    pub fn scan_for_plugins(&mut self) -> Result<(), RegistryError> {
        for pool in self.pools.values_mut() {
            pool.scanned = false;
            pool.consumed.clear();
        }
        let mut stack = CallStack::new();
        for category in self.categories.clone() {
            self.ensure_scanned(category, &mut stack)?;
        }
        Ok(())
    }

    // ========================================================================
    // Lookup
    // ========================================================================

    /// Every accepted candidate of `T`, most preferred first.
    pub fn lookup<T>(&mut self, query: Query<'_, T>) -> Result<Candidates<T>, RegistryError>
    where
        T: ?Sized + Candidate,
    {
        self.resolve_all(&query, &mut CallStack::new())
    }

    /// The most preferred accepted candidate of `T`.
    pub fn lookup_one<T>(&mut self, query: Query<'_, T>) -> Result<Arc<T>, RegistryError>
    where
        T: ?Sized + Candidate,
    {
        self.resolve_one(&query, &mut CallStack::new())
    }

    /// The most preferred candidate of `T` with no filter or hints.
    pub fn get<T>(&mut self) -> Result<Arc<T>, RegistryError>
    where
        T: ?Sized + Candidate,
    {
        self.lookup_one(Query::new())
    }

    // ========================================================================
    // Ordering
    // ========================================================================

    /// Prefer every candidate of `T` matching `preferred` over every one
    /// matching `other`. Returns whether any relation changed.
    pub fn set_ordering<T>(
        &mut self,
        preferred: impl Fn(&dyn Candidate) -> bool,
        other: impl Fn(&dyn Candidate) -> bool,
    ) -> Result<bool, RegistryError>
    where
        T: ?Sized + Candidate,
    {
        self.update_ordering::<T>(|graph, (a, x), (b, y)| {
            preferred(x) && other(y) && graph.set(a, b)
        })
    }

    /// Revoke what [`set_ordering`](Self::set_ordering) declared for the same
    /// filters. Returns whether any relation changed.
    pub fn unset_ordering<T>(
        &mut self,
        preferred: impl Fn(&dyn Candidate) -> bool,
        other: impl Fn(&dyn Candidate) -> bool,
    ) -> Result<bool, RegistryError>
    where
        T: ?Sized + Candidate,
    {
        self.update_ordering::<T>(|graph, (a, x), (b, y)| {
            preferred(x) && other(y) && graph.unset(a, b)
        })
    }

    /// Derive preferences from a comparator over the currently registered
    /// candidates of `T`: `Less` means the first argument is preferred.
    pub fn set_ordering_by<T>(
        &mut self,
        compare: impl Fn(&dyn Candidate, &dyn Candidate) -> cmp::Ordering,
    ) -> Result<bool, RegistryError>
    where
        T: ?Sized + Candidate,
    {
        self.update_ordering::<T>(|graph, (a, x), (b, y)| {
            compare(x, y) == cmp::Ordering::Less && graph.set(a, b)
        })
    }

    /// Prefer the candidates of vendor `preferred` over those of vendor `other`.
    pub fn set_vendor_ordering<T>(
        &mut self,
        preferred: &str,
        other: &str,
    ) -> Result<bool, RegistryError>
    where
        T: ?Sized + Candidate,
    {
        self.set_ordering::<T>(
            |c| c.vendor() == Some(preferred),
            |c| c.vendor() == Some(other),
        )
    }

    /// Prefer the candidates of implementation type `preferred` over those of `other`.
    pub fn set_implementation_ordering<T>(
        &mut self,
        preferred: ImplType,
        other: ImplType,
    ) -> Result<bool, RegistryError>
    where
        T: ?Sized + Candidate,
    {
        self.set_ordering::<T>(
            |c| c.implementation_type() == preferred,
            |c| c.implementation_type() == other,
        )
    }

    fn update_ordering<T>(
        &mut self,
        mut apply: impl FnMut(
            &mut OrderingGraph,
            (NodeId, &dyn Candidate),
            (NodeId, &dyn Candidate),
        ) -> bool,
    ) -> Result<bool, RegistryError>
    where
        T: ?Sized + Candidate,
    {
        let category = self.served(Category::of::<T>())?;
        self.ensure_scanned(category, &mut CallStack::new())?;
        let Some(pool) = self.pools.get_mut(&category) else {
            return Err(RegistryError::UnknownCategory(category));
        };
        let mut changed = false;
        for &a in &pool.nodes {
            for &b in &pool.nodes {
                if a == b {
                    continue;
                }
                let x = self.records[a].candidate.as_ref();
                let y = self.records[b].candidate.as_ref();
                changed |= apply(&mut pool.graph, (a, x), (b, y));
            }
        }
        if changed {
            tracing::debug!(category = %category, edges = pool.graph.len(), "ordering updated");
        }
        Ok(changed)
    }

    // ========================================================================
    // Lifecycle
    // ========================================================================

    /// Dispose `instance`: it is marked inert in every category and never
    /// matched again. Returns whether the registry knew the instance.
    pub fn dispose<T>(&mut self, instance: &Arc<T>) -> bool
    where
        T: ?Sized + Candidate,
    {
        let target = address(instance.clone().as_candidate().as_ref());
        let mut known = false;
        if let Some(record) = self
            .records
            .iter_mut()
            .find(|record| address(record.candidate.as_ref()) == target)
        {
            if !record.disposed {
                record.disposed = true;
                record.candidate.dispose(false);
                tracing::debug!(
                    candidate = %record.candidate.implementation_type(),
                    "candidate disposed"
                );
            }
            known = true;
        }
        if let Some(factories) = &mut self.factories {
            if let Some(service) = factories.cache.remove(target) {
                if !known {
                    service.candidate().dispose(false);
                }
                known = true;
            }
        }
        known
    }

    /// Dispose every candidate, including cached dynamic instances still alive.
    pub fn shutdown(&mut self) {
        for record in &mut self.records {
            if !record.disposed {
                record.disposed = true;
                record.candidate.dispose(true);
            }
        }
        if let Some(factories) = &mut self.factories {
            for service in factories.cache.drain() {
                service.candidate().dispose(true);
            }
        }
        tracing::debug!(candidates = self.records.len(), "registry shut down");
    }

    // ========================================================================
    // Introspection
    // ========================================================================

    /// The categories this registry serves, in declaration order.
    pub fn categories(&self) -> &[Category] {
        &self.categories
    }

    /// Whether `category` is served.
    pub fn serves(&self, category: Category) -> bool {
        self.pools.contains_key(&category)
    }

    /// Number of live registered candidates of `T`. Does not trigger discovery.
    pub fn len<T: ?Sized + 'static>(&self) -> usize {
        self.pools
            .get(&Category::of::<T>())
            .map(|pool| {
                pool.nodes
                    .iter()
                    .filter(|&&id| !self.records[id].disposed)
                    .count()
            })
            .unwrap_or(0)
    }

    /// Whether no live candidate is registered for any category.
    pub fn is_empty(&self) -> bool {
        self.records.iter().all(|record| record.disposed)
    }

    /// The defaults filled into lookup hints, if any.
    pub fn defaults(&self) -> Option<&DefaultsStore> {
        self.defaults.as_ref()
    }

    /// Render every category with its candidates in preference order.
    pub fn describe(&self) -> String {
        let mut out = String::new();
        for category in &self.categories {
            let _ = writeln!(out, "{category}");
            for id in self.ordered(*category) {
                let record = &self.records[id];
                let tree = hintreg_core::describe(record.candidate.as_ref());
                for (i, line) in tree.lines().enumerate() {
                    if i == 0 && record.disposed {
                        let _ = writeln!(out, "  {line} (disposed)");
                    } else {
                        let _ = writeln!(out, "  {line}");
                    }
                }
            }
        }
        out
    }

    // ========================================================================
    // Internals
    // ========================================================================

    pub(crate) fn served(&self, category: Category) -> Result<Category, RegistryError> {
        if self.serves(category) {
            Ok(category)
        } else {
            Err(RegistryError::UnknownCategory(category))
        }
    }

    /// Node ids of `category` in preference order.
    pub(crate) fn ordered(&self, category: Category) -> Vec<NodeId> {
        self.pools
            .get(&category)
            .map(|pool| pool.graph.sort(&pool.nodes))
            .unwrap_or_default()
    }
}

impl fmt::Debug for Registry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Registry")
            .field("categories", &self.categories)
            .field("candidates", &self.records.len())
            .field("providers", &self.providers)
            .field("dynamic", &self.factories.is_some())
            .finish()
    }
}
