//! Constructor table entries.

use crate::resolver::Resolver;
use hintreg_core::{BoxError, Candidate, Category, HintSet, ImplType, Service};
use std::{fmt, marker::PhantomData, sync::Arc};

pub(crate) type HintedFn =
    dyn Fn(&HintSet, &mut Resolver<'_>) -> Result<Service, BoxError> + Send + Sync;
pub(crate) type PlainFn = dyn Fn() -> Result<Service, BoxError> + Send + Sync;

fn hinted_fn<F>(build: F) -> Arc<HintedFn>
where
    F: Fn(&HintSet, &mut Resolver<'_>) -> Result<Service, BoxError> + Send + Sync + 'static,
{
    Arc::new(build)
}

/// How to build implementation type `C` as a candidate of category `T`.
///
/// A constructor taking the lookup hints is preferred over a plain one when
/// both are given.
///
/// # Example
///
/// ```rust,ignore
/// let constructor = Constructor::<dyn Codec>::new::<PreciseCodec>()
///     .hinted(|hints, _resolver| Ok(Arc::new(PreciseCodec::new(hints))))
///     .plain(|| Ok(Arc::new(PreciseCodec::default())));
/// registry.register_constructor(constructor)?;
/// ```
pub struct Constructor<T: ?Sized> {
    implementation: ImplType,
    hinted: Option<Arc<HintedFn>>,
    plain: Option<Arc<PlainFn>>,
    _category: PhantomData<fn() -> Arc<T>>,
}

impl<T: ?Sized + Candidate> Constructor<T> {
    /// A constructor for implementation type `C`, with no build function yet.
    pub fn new<C: Candidate>() -> Self {
        Self {
            implementation: ImplType::of::<C>(),
            hinted: None,
            plain: None,
            _category: PhantomData,
        }
    }

    /// Build from the lookup hints. The resolver gives access to dependencies.
    pub fn hinted(
        mut self,
        build: impl Fn(&HintSet, &mut Resolver<'_>) -> Result<Arc<T>, BoxError> + Send + Sync + 'static,
    ) -> Self {
        self.hinted = Some(hinted_fn(move |hints, resolver| {
            build(hints, resolver).map(Service::new::<T>)
        }));
        self
    }

    /// Build without arguments.
    pub fn plain(
        mut self,
        build: impl Fn() -> Result<Arc<T>, BoxError> + Send + Sync + 'static,
    ) -> Self {
        self.plain = Some(Arc::new(move || build().map(Service::new::<T>)));
        self
    }

    /// The implementation type this constructor builds.
    pub fn implementation(&self) -> ImplType {
        self.implementation
    }

    pub(crate) fn erase(self) -> ErasedConstructor {
        ErasedConstructor {
            category: Category::of::<T>(),
            implementation: self.implementation,
            hinted: self.hinted,
            plain: self.plain,
        }
    }
}

impl<T: ?Sized> fmt::Debug for Constructor<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Constructor")
            .field("implementation", &self.implementation)
            .field("hinted", &self.hinted.is_some())
            .field("plain", &self.plain.is_some())
            .finish()
    }
}

/// A constructor with its category erased, as stored in the registry.
#[derive(Clone)]
pub(crate) struct ErasedConstructor {
    pub(crate) category: Category,
    pub(crate) implementation: ImplType,
    hinted: Option<Arc<HintedFn>>,
    plain: Option<Arc<PlainFn>>,
}

impl ErasedConstructor {
    /// Run the hinted build function, else the plain one. `None` if neither exists.
    pub(crate) fn build(
        &self,
        hints: &HintSet,
        resolver: &mut Resolver<'_>,
    ) -> Option<Result<Service, BoxError>> {
        if let Some(hinted) = &self.hinted {
            return Some(hinted(hints, resolver));
        }
        self.plain.as_ref().map(|plain| plain())
    }
}
