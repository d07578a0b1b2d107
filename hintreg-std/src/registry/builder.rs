//! Registry construction.

use super::{AcceptanceFn, DeclareFn, Declared, Pool, Registry};
use crate::{
    discovery::ProviderSet,
    dynamic::{DynamicRegistry, Factories},
    resolver::Resolver,
};
use hintreg_core::{BoxError, Candidate, Category, DefaultsStore, HintSet, Service};
use std::{collections::HashMap, sync::Arc};

fn declare_fn<F>(build: F) -> Arc<DeclareFn>
where
    F: Fn(&mut Resolver<'_>) -> Result<Service, BoxError> + Send + Sync + 'static,
{
    Arc::new(build)
}

// ============================================================================
// RegistryBuilder - for constructing registries
// ============================================================================

/// Builder for a [`Registry`] or [`DynamicRegistry`].
///
/// The set of served categories is fixed once built: every category named
/// through [`category`](Self::category) or a declaration.
///
/// # Example
///
/// ```rust,ignore
/// let registry = RegistryBuilder::new()
///     .category::<dyn Codec>()
///     .declare::<dyn Greeter>(|_| Ok(Arc::new(English)))
///     .defaults(DefaultsStore::global().clone())
///     .build();
/// ```
pub struct RegistryBuilder {
    categories: Vec<Category>,
    declarations: Vec<Declared>,
    providers: ProviderSet,
    defaults: Option<DefaultsStore>,
    acceptance: Option<Arc<AcceptanceFn>>,
    #[cfg(feature = "inventory")]
    include_declared: bool,
}

impl Default for RegistryBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl RegistryBuilder {
    /// A builder serving no category yet.
    pub fn new() -> Self {
        Self {
            categories: Vec::new(),
            declarations: Vec::new(),
            providers: ProviderSet::new(),
            defaults: None,
            acceptance: None,
            #[cfg(feature = "inventory")]
            include_declared: true,
        }
    }

    /// Serve category `T`.
    pub fn category<T: ?Sized + 'static>(mut self) -> Self {
        self.add_category(Category::of::<T>());
        self
    }

    /// Declare a candidate of `T`, built when `T` is first scanned.
    ///
    /// The closure runs again on every [`Registry::scan_for_plugins`]; an
    /// equal result is not registered twice.
    pub fn declare<T>(
        mut self,
        build: impl Fn(&mut Resolver<'_>) -> Result<Arc<T>, BoxError> + Send + Sync + 'static,
    ) -> Self
    where
        T: ?Sized + Candidate,
    {
        let category = Category::of::<T>();
        self.add_category(category);
        self.declarations.push(Declared {
            category,
            build: declare_fn(move |resolver| build(resolver).map(Service::new::<T>)),
        });
        self
    }

    /// Declare an existing instance as a candidate of `T`.
    pub fn declare_service<T>(self, instance: Arc<T>) -> Self
    where
        T: ?Sized + Candidate,
    {
        self.declare::<T>(move |_| Ok(instance.clone()))
    }

    /// Merge discovery sources from `providers`.
    ///
    /// Defaults to a fresh, empty set. Pass [`ProviderSet::global`] to share
    /// the process-wide one.
    pub fn providers(mut self, providers: ProviderSet) -> Self {
        self.providers = providers;
        self
    }

    /// Fill absent lookup hints from `defaults`.
    pub fn defaults(mut self, defaults: DefaultsStore) -> Self {
        self.defaults = Some(defaults);
        self
    }

    /// Reject candidates for which `hook` returns `false`.
    pub fn acceptance<F>(mut self, hook: F) -> Self
    where
        F: Fn(Category, &dyn Candidate, &HintSet) -> bool + Send + Sync + 'static,
    {
        self.acceptance = Some(Arc::new(hook));
        self
    }

    /// Whether link-time declarations are scanned. Defaults to `true`.
    #[cfg(feature = "inventory")]
    pub fn include_declared(mut self, include: bool) -> Self {
        self.include_declared = include;
        self
    }

    /// Build a registry without dynamic construction.
    pub fn build(self) -> Registry {
        self.finish(None)
    }

    /// Build a registry that constructs candidates on demand.
    pub fn build_dynamic(self) -> DynamicRegistry {
        DynamicRegistry::from(self.finish(Some(Factories::default())))
    }

    fn add_category(&mut self, category: Category) {
        if !self.categories.contains(&category) {
            self.categories.push(category);
        }
    }

    fn finish(self, factories: Option<Factories>) -> Registry {
        let pools: HashMap<Category, Pool> = self
            .categories
            .iter()
            .map(|category| (*category, Pool::default()))
            .collect();
        tracing::debug!(
            categories = self.categories.len(),
            declarations = self.declarations.len(),
            dynamic = factories.is_some(),
            "registry built"
        );
        Registry {
            categories: self.categories,
            records: Vec::new(),
            pools,
            declarations: self.declarations,
            providers: self.providers,
            defaults: self.defaults,
            acceptance: self.acceptance,
            #[cfg(feature = "inventory")]
            include_declared: self.include_declared,
            factories,
        }
    }
}
