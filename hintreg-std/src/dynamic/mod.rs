//! On-demand construction of candidates.
//!
//! A [`DynamicRegistry`] is a [`Registry`] with a constructor table. When no
//! registered candidate is accepted, it:
//!
//! 1. returns a cached instance built earlier, if still alive and accepted
//! 2. constructs the implementation types named by the query key, in order
//! 3. otherwise constructs the implementation types of registered candidates,
//!    in preference order, then the remaining constructors of the category
//!
//! A type already under construction further up the call stack is skipped.
//! Constructed instances that are not accepted are disposed.

mod cache;
mod constructor;

pub use constructor::Constructor;

use crate::{
    registry::{Query, Registry, RegistryBuilder},
    resolver::{CallStack, Resolver},
};
use cache::InstanceCache;
use constructor::ErasedConstructor;
use hintreg_core::{
    Candidate, Category, ConstructionError, HintSet, ImplType, RegistryError, SharedError,
};
use std::{
    collections::HashSet,
    fmt,
    ops::{Deref, DerefMut},
    sync::Arc,
};

/// Constructor table and instance cache of a dynamic registry.
#[derive(Default)]
pub(crate) struct Factories {
    pub(crate) constructors: Vec<ErasedConstructor>,
    pub(crate) cache: InstanceCache,
}

impl Factories {
    fn constructor(&self, category: Category, implementation: ImplType) -> Option<&ErasedConstructor> {
        self.constructors
            .iter()
            .find(|c| c.category == category && c.implementation == implementation)
    }
}

/// A [`Registry`] that constructs candidates on demand.
///
/// Dereferences to [`Registry`] for registration and lookups.
///
/// # Example
///
/// ```rust,ignore
/// let mut registry = Registry::builder()
///     .declare_service::<dyn Codec>(Arc::new(FastCodec::single()))
///     .build_dynamic();
/// registry.register_constructor(
///     Constructor::<dyn Codec>::new::<PreciseCodec>()
///         .hinted(|hints, _| Ok(Arc::new(PreciseCodec::new(hints)))),
/// )?;
///
/// let codec = registry.lookup_one(Query::<dyn Codec>::new().hints(&double))?;
/// ```
pub struct DynamicRegistry {
    registry: Registry,
}

impl DynamicRegistry {
    /// Start building a registry.
    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::new()
    }

    /// Add how to build an implementation of `T`.
    ///
    /// Returns `false` when it replaced a constructor for the same
    /// implementation type.
    pub fn register_constructor<T>(
        &mut self,
        constructor: Constructor<T>,
    ) -> Result<bool, RegistryError>
    where
        T: ?Sized + Candidate,
    {
        let category = self.registry.served(Category::of::<T>())?;
        let constructor = constructor.erase();
        let implementation = constructor.implementation;
        let factories = self.factories();
        let replaced = match factories
            .constructors
            .iter()
            .position(|c| c.category == category && c.implementation == implementation)
        {
            Some(pos) => {
                factories.constructors[pos] = constructor;
                true
            }
            None => {
                factories.constructors.push(constructor);
                false
            }
        };
        tracing::debug!(
            category = %category,
            implementation = %implementation,
            replaced,
            "constructor registered"
        );
        Ok(!replaced)
    }

    /// Implementation types constructible for `T`, in registration order.
    pub fn constructors<T: ?Sized + 'static>(&self) -> Vec<ImplType> {
        let category = Category::of::<T>();
        self.registry
            .factories
            .iter()
            .flat_map(|factories| factories.constructors.iter())
            .filter(|c| c.category == category)
            .map(|c| c.implementation)
            .collect()
    }

    /// Number of constructed instances of `T` still alive in the cache.
    pub fn cached_len<T: ?Sized + 'static>(&mut self) -> usize {
        self.factories().cache.len(Category::of::<T>())
    }

    /// Forget every cached instance. Instances stay alive while callers hold them.
    pub fn clear_cache(&mut self) {
        self.factories().cache.clear();
    }

    /// The plain registry, keeping its constructors.
    pub fn into_inner(self) -> Registry {
        self.registry
    }

    fn factories(&mut self) -> &mut Factories {
        self.registry
            .factories
            .get_or_insert_with(Factories::default)
    }
}

impl From<Registry> for DynamicRegistry {
    fn from(mut registry: Registry) -> Self {
        registry.factories.get_or_insert_with(Factories::default);
        Self { registry }
    }
}

impl Deref for DynamicRegistry {
    type Target = Registry;

    fn deref(&self) -> &Registry {
        &self.registry
    }
}

impl DerefMut for DynamicRegistry {
    fn deref_mut(&mut self) -> &mut Registry {
        &mut self.registry
    }
}

impl fmt::Debug for DynamicRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("DynamicRegistry").field(&self.registry).finish()
    }
}

// ============================================================================
// Construction fallback
// ============================================================================

/// State of one dynamic resolution.
struct Attempt<'a, 'q, T: ?Sized> {
    query: &'a Query<'q, T>,
    category: Category,
    hints: &'a HintSet,
    failure: Option<(ImplType, ConstructionError)>,
    cause: Option<SharedError>,
}

impl Registry {
    /// Called when no registered candidate was accepted.
    pub(crate) fn resolve_dynamic<T>(
        &mut self,
        query: &Query<'_, T>,
        category: Category,
        hints: &HintSet,
        named: &[ImplType],
        cause: Option<SharedError>,
        stack: &mut CallStack,
    ) -> Result<Arc<T>, RegistryError>
    where
        T: ?Sized + Candidate,
    {
        let mut attempt = Attempt {
            query,
            category,
            hints,
            failure: None,
            cause,
        };

        if let Some(instance) = self.cached(&mut attempt, named) {
            return Ok(instance);
        }

        for (implementation, explicit) in self.construction_plan(category, named) {
            if let Some(instance) =
                self.construct_candidate(&mut attempt, implementation, explicit, stack)?
            {
                return Ok(instance);
            }
        }

        match attempt.failure {
            Some((implementation, source)) => Err(RegistryError::Construction {
                category,
                implementation,
                source,
            }),
            None => Err(RegistryError::NotFound {
                category,
                implementation: named.first().copied(),
                cause: attempt.cause,
            }),
        }
    }

    /// A live, accepted cached instance of one of the `named` types (any type
    /// when empty).
    fn cached<T>(&mut self, attempt: &mut Attempt<'_, '_, T>, named: &[ImplType]) -> Option<Arc<T>>
    where
        T: ?Sized + Candidate,
    {
        let live = self.factories.as_mut()?.cache.live(attempt.category);
        for service in live {
            if !named.is_empty() && !named.contains(&service.implementation_type()) {
                continue;
            }
            let Some(instance) = service.downcast::<T>() else {
                continue;
            };
            if self.is_acceptable(
                attempt.category,
                service.candidate().as_ref(),
                &*instance,
                attempt.query,
                attempt.hints,
                &mut attempt.cause,
            ) {
                tracing::debug!(
                    category = %attempt.category,
                    candidate = %service.implementation_type(),
                    "cache hit"
                );
                return Some(instance);
            }
        }
        None
    }

    /// Implementation types to try, each once. The flag marks types the
    /// caller asked for explicitly.
    fn construction_plan(&self, category: Category, named: &[ImplType]) -> Vec<(ImplType, bool)> {
        let mut seen = HashSet::new();
        if !named.is_empty() {
            return named
                .iter()
                .filter(|implementation| seen.insert(**implementation))
                .map(|implementation| (*implementation, true))
                .collect();
        }
        let registered = self
            .ordered(category)
            .into_iter()
            .map(|id| self.records[id].candidate.implementation_type());
        let constructible = self
            .factories
            .iter()
            .flat_map(|factories| factories.constructors.iter())
            .filter(|c| c.category == category)
            .map(|c| c.implementation);
        registered
            .chain(constructible)
            .filter(|implementation| seen.insert(*implementation))
            .map(|implementation| (implementation, false))
            .collect()
    }

    fn construct_candidate<T>(
        &mut self,
        attempt: &mut Attempt<'_, '_, T>,
        implementation: ImplType,
        explicit: bool,
        stack: &mut CallStack,
    ) -> Result<Option<Arc<T>>, RegistryError>
    where
        T: ?Sized + Candidate,
    {
        let category = attempt.category;
        let constructor = self
            .factories
            .as_ref()
            .and_then(|factories| factories.constructor(category, implementation))
            .cloned();
        let Some(constructor) = constructor else {
            if explicit {
                attempt
                    .failure
                    .get_or_insert((implementation, ConstructionError::NoConstructor));
            }
            return Ok(None);
        };

        if !stack.begin_construction(implementation) {
            tracing::debug!(
                category = %category,
                implementation = %implementation,
                "already under construction, skipping"
            );
            return Ok(None);
        }
        let built = constructor.build(attempt.hints, &mut Resolver::new(self, stack));
        stack.end_construction(implementation);

        let service = match built {
            None => {
                attempt
                    .failure
                    .get_or_insert((implementation, ConstructionError::NoConstructor));
                return Ok(None);
            }
            Some(Ok(service)) => service,
            Some(Err(err)) => match RegistryError::recursive_from(err) {
                Ok(recursive) => return Err(recursive),
                Err(err) => {
                    tracing::warn!(
                        category = %category,
                        implementation = %implementation,
                        error = %err,
                        "constructor failed"
                    );
                    attempt.failure.get_or_insert((
                        implementation,
                        ConstructionError::Failed(SharedError::from(err)),
                    ));
                    return Ok(None);
                }
            },
        };

        let actual = service.implementation_type();
        let instance = match service.downcast::<T>() {
            Some(instance) if actual == implementation => instance,
            _ => {
                service.candidate().dispose(false);
                attempt
                    .failure
                    .get_or_insert((implementation, ConstructionError::TypeMismatch { actual }));
                return Ok(None);
            }
        };

        let accepted = self.is_acceptable(
            category,
            service.candidate().as_ref(),
            &*instance,
            attempt.query,
            attempt.hints,
            &mut attempt.cause,
        );
        if !accepted {
            tracing::debug!(
                category = %category,
                implementation = %implementation,
                "constructed candidate not accepted, disposing"
            );
            service.candidate().dispose(false);
            return Ok(None);
        }

        if let Some(factories) = &mut self.factories {
            factories.cache.insert(&instance);
        }
        tracing::debug!(
            category = %category,
            implementation = %implementation,
            "candidate constructed"
        );
        Ok(Some(instance))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::DisposeProbe;
    use hintreg_core::{HintKey, ValueType};
    use std::sync::atomic::{AtomicUsize, Ordering};

    trait Codec: Candidate {
        fn precision(&self) -> String;
    }
    impl std::fmt::Debug for dyn Codec {
        fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
            f.write_str("dyn Codec")
        }
    }
    trait Transport: Candidate {}

    struct PreciseCodec {
        hints: HintSet,
        precision: String,
    }

    impl Candidate for PreciseCodec {
        fn implementation_hints(&self) -> HintSet {
            self.hints.clone()
        }
    }

    impl Codec for PreciseCodec {
        fn precision(&self) -> String {
            self.precision.clone()
        }
    }

    impl Codec for DisposeProbe {
        fn precision(&self) -> String {
            "probe".to_string()
        }
    }

    /// Implements both categories; its codec constructor asks for a transport.
    struct Duplex;
    impl Candidate for Duplex {}
    impl Codec for Duplex {
        fn precision(&self) -> String {
            "duplex".to_string()
        }
    }
    impl Transport for Duplex {}

    fn precise(key: &HintKey, built: Arc<AtomicUsize>) -> Constructor<dyn Codec> {
        let key = key.clone();
        Constructor::<dyn Codec>::new::<PreciseCodec>().hinted(move |hints, _| {
            built.fetch_add(1, Ordering::SeqCst);
            let precision = hints
                .get(&key)
                .and_then(|value| value.as_text())
                .unwrap_or("single")
                .to_string();
            let own = HintSet::empty().with(&key, precision.as_str())?;
            Ok(Arc::new(PreciseCodec {
                hints: own,
                precision,
            }))
        })
    }

    fn registry() -> DynamicRegistry {
        Registry::builder()
            .category::<dyn Codec>()
            .category::<dyn Transport>()
            .build_dynamic()
    }

    #[test]
    fn test_constructed_instance_is_cached() {
        let key = HintKey::new("precision", ValueType::Text);
        let built = Arc::new(AtomicUsize::new(0));
        let mut registry = registry();
        assert!(registry.register_constructor(precise(&key, built.clone())).unwrap());

        let hints = HintSet::empty().with(&key, "double").unwrap();
        let first = registry
            .lookup_one(Query::<dyn Codec>::new().hints(&hints))
            .unwrap();
        let second = registry
            .lookup_one(Query::<dyn Codec>::new().hints(&hints))
            .unwrap();
        assert_eq!(first.precision(), "double");
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(built.load(Ordering::SeqCst), 1);
        assert_eq!(registry.cached_len::<dyn Codec>(), 1);

        let other = HintSet::empty().with(&key, "half").unwrap();
        let third = registry
            .lookup_one(Query::<dyn Codec>::new().hints(&other))
            .unwrap();
        assert_eq!(third.precision(), "half");
        assert_eq!(built.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_cache_does_not_keep_instances_alive() {
        let key = HintKey::new("precision", ValueType::Text);
        let built = Arc::new(AtomicUsize::new(0));
        let mut registry = registry();
        registry.register_constructor(precise(&key, built.clone())).unwrap();

        drop(registry.get::<dyn Codec>().unwrap());
        assert_eq!(registry.cached_len::<dyn Codec>(), 0);
        registry.get::<dyn Codec>().unwrap();
        assert_eq!(built.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_replacing_a_constructor() {
        let key = HintKey::new("precision", ValueType::Text);
        let mut registry = registry();
        let built = Arc::new(AtomicUsize::new(0));
        assert!(registry.register_constructor(precise(&key, built.clone())).unwrap());
        assert!(!registry.register_constructor(precise(&key, built)).unwrap());
        assert_eq!(
            registry.constructors::<dyn Codec>(),
            vec![ImplType::of::<PreciseCodec>()]
        );
    }

    #[test]
    fn test_constructor_for_unknown_category() {
        let mut registry = Registry::builder().category::<dyn Transport>().build_dynamic();
        let key = HintKey::new("precision", ValueType::Text);
        let err = registry
            .register_constructor(precise(&key, Arc::default()))
            .unwrap_err();
        assert!(matches!(err, RegistryError::UnknownCategory(_)));
    }

    #[test]
    fn test_failure_surfaces_after_alternatives() {
        let mut registry = registry();
        registry
            .register_constructor(
                Constructor::<dyn Codec>::new::<PreciseCodec>().plain(|| Err("no codec".into())),
            )
            .unwrap();
        let err = registry.get::<dyn Codec>().unwrap_err();
        assert!(matches!(
            err,
            RegistryError::Construction {
                source: ConstructionError::Failed(_),
                ..
            }
        ));
    }

    #[test]
    fn test_named_type_without_constructor() {
        let key = HintKey::type_or_instance("codec", Category::of::<dyn Codec>());
        let mut registry = registry();
        let hints = HintSet::empty().with(&key, ImplType::of::<Duplex>()).unwrap();
        let err = registry
            .lookup_one(Query::<dyn Codec>::new().hints(&hints).key(&key))
            .unwrap_err();
        assert!(matches!(
            err,
            RegistryError::Construction {
                source: ConstructionError::NoConstructor,
                ..
            }
        ));
    }

    #[test]
    fn test_named_types_tried_in_order() {
        let key = HintKey::type_or_instance("codec", Category::of::<dyn Codec>());
        let precision = HintKey::new("precision", ValueType::Text);
        let mut registry = registry();
        registry
            .register_constructor(precise(&precision, Arc::default()))
            .unwrap();
        let hints = HintSet::empty()
            .with(
                &key,
                vec![ImplType::of::<Duplex>(), ImplType::of::<PreciseCodec>()],
            )
            .unwrap();
        let codec = registry
            .lookup_one(Query::<dyn Codec>::new().hints(&hints).key(&key))
            .unwrap();
        assert_eq!(codec.precision(), "single");
    }

    #[test]
    fn test_type_mismatch_disposes_instance() {
        let probe = DisposeProbe::new();
        let produced = probe.clone();
        let mut registry = registry();
        registry
            .register_constructor(
                Constructor::<dyn Codec>::new::<PreciseCodec>()
                    .plain(move || Ok(Arc::new(produced.clone()))),
            )
            .unwrap();
        let err = registry.get::<dyn Codec>().unwrap_err();
        assert!(matches!(
            err,
            RegistryError::Construction {
                source: ConstructionError::TypeMismatch { .. },
                ..
            }
        ));
        assert_eq!(probe.disposed(), 1);
    }

    #[test]
    fn test_rejected_instance_is_disposed() {
        let probe = DisposeProbe::new();
        let produced = probe.clone();
        let mut registry = registry();
        registry
            .register_constructor(
                Constructor::<dyn Codec>::new::<DisposeProbe>()
                    .plain(move || Ok(Arc::new(produced.clone()))),
            )
            .unwrap();
        let err = registry
            .lookup_one(Query::<dyn Codec>::new().filter(&|_| false))
            .unwrap_err();
        assert!(err.is_not_found());
        assert_eq!(probe.disposed(), 1);
        assert_eq!(registry.cached_len::<dyn Codec>(), 0);
    }

    #[test]
    fn test_type_under_construction_is_skipped() {
        let mut registry = registry();
        let inner = Arc::new(parking_lot::Mutex::new(None));
        let seen = inner.clone();
        registry
            .register_constructor(Constructor::<dyn Codec>::new::<Duplex>().hinted(
                move |_, resolver| {
                    let transport = resolver.get::<dyn Transport>();
                    *seen.lock() = Some(transport.map(drop).map_err(|e| e.is_not_found()));
                    Ok(Arc::new(Duplex))
                },
            ))
            .unwrap();
        registry
            .register_constructor(Constructor::<dyn Transport>::new::<Duplex>().hinted(
                |_, resolver| {
                    let codec = resolver.get::<dyn Codec>()?;
                    drop(codec);
                    Ok(Arc::new(Duplex))
                },
            ))
            .unwrap();

        let codec = registry.get::<dyn Codec>().unwrap();
        assert_eq!(codec.precision(), "duplex");
        assert_eq!(*inner.lock(), Some(Err(true)));
    }

    #[test]
    fn test_constructor_looking_up_own_category() {
        let mut registry = registry();
        registry
            .register_constructor(Constructor::<dyn Codec>::new::<Duplex>().hinted(
                |_, resolver| {
                    let codec = resolver.get::<dyn Codec>()?;
                    drop(codec);
                    Ok(Arc::new(Duplex))
                },
            ))
            .unwrap();
        assert!(registry.get::<dyn Codec>().unwrap_err().is_recursive());
    }

    #[test]
    fn test_dispose_and_shutdown_reach_cached_instances() {
        let probe = DisposeProbe::new();
        let produced = probe.clone();
        let mut registry = registry();
        registry
            .register_constructor(
                Constructor::<dyn Codec>::new::<DisposeProbe>()
                    .plain(move || Ok(Arc::new(produced.clone()))),
            )
            .unwrap();

        let first = registry.get::<dyn Codec>().unwrap();
        assert!(registry.dispose(&first));
        assert_eq!(probe.disposed(), 1);
        assert_eq!(registry.cached_len::<dyn Codec>(), 0);

        let _second = registry.get::<dyn Codec>().unwrap();
        registry.shutdown();
        assert_eq!(probe.shutdowns(), 1);
    }
}
