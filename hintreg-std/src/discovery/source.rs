//! Discovery sources.

use crate::resolver::Resolver;
use hintreg_core::{BoxError, Candidate, Category, Service};
use std::{fmt, sync::Arc};

/// An external supplier of candidates.
///
/// A registry asks each source once per category, the first time the
/// category is touched after the source was added, and again after
/// [`Registry::scan_for_plugins`](crate::Registry::scan_for_plugins).
pub trait DiscoverySource: Send + Sync {
    /// Name used in diagnostics.
    fn name(&self) -> &str;

    /// The candidates this source offers for `category`.
    ///
    /// Services bound to another category are ignored. The resolver may be
    /// used to look up dependencies of the discovered candidates.
    fn discover(
        &self,
        category: Category,
        resolver: &mut Resolver<'_>,
    ) -> Result<Vec<Service>, BoxError>;
}

/// A source offering a fixed list of services.
#[derive(Clone)]
pub struct StaticSource {
    name: String,
    services: Vec<Service>,
}

impl StaticSource {
    /// An empty source.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            services: Vec::new(),
        }
    }

    /// Add `instance` as a candidate of category `T`.
    pub fn with<T: ?Sized + Candidate>(mut self, instance: Arc<T>) -> Self {
        self.services.push(Service::new::<T>(instance));
        self
    }

    /// Add an already bound service.
    pub fn with_service(mut self, service: Service) -> Self {
        self.services.push(service);
        self
    }
}

impl DiscoverySource for StaticSource {
    fn name(&self) -> &str {
        &self.name
    }

    fn discover(
        &self,
        category: Category,
        _resolver: &mut Resolver<'_>,
    ) -> Result<Vec<Service>, BoxError> {
        Ok(self
            .services
            .iter()
            .filter(|service| service.category() == category)
            .cloned()
            .collect())
    }
}

impl fmt::Debug for StaticSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("StaticSource")
            .field("name", &self.name)
            .field("services", &self.services)
            .finish()
    }
}

/// A source backed by a closure.
///
/// # Example
///
/// ```rust,ignore
/// let source = FnSource::new("plugins", |category, _resolver| {
///     if category == Category::of::<dyn Greeter>() {
///         Ok(vec![Service::new::<dyn Greeter>(Arc::new(English))])
///     } else {
///         Ok(Vec::new())
///     }
/// });
/// ```
pub struct FnSource<F> {
    name: String,
    discover: F,
}

impl<F> FnSource<F>
where
    F: Fn(Category, &mut Resolver<'_>) -> Result<Vec<Service>, BoxError> + Send + Sync,
{
    /// Wrap `discover` under the given name.
    pub fn new(name: impl Into<String>, discover: F) -> Self {
        Self {
            name: name.into(),
            discover,
        }
    }
}

impl<F> DiscoverySource for FnSource<F>
where
    F: Fn(Category, &mut Resolver<'_>) -> Result<Vec<Service>, BoxError> + Send + Sync,
{
    fn name(&self) -> &str {
        &self.name
    }

    fn discover(
        &self,
        category: Category,
        resolver: &mut Resolver<'_>,
    ) -> Result<Vec<Service>, BoxError> {
        (self.discover)(category, resolver)
    }
}
