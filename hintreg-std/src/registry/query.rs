//! Lookup requests and results.

use hintreg_core::{HintKey, HintSet};
use std::{fmt, sync::Arc, vec};

/// Filter applied to candidates of category `T`.
pub type FilterFn<'a, T> = dyn Fn(&T) -> bool + 'a;

/// A lookup request for category `T`.
///
/// All parts are optional:
///
/// ```rust,ignore
/// let codec = registry.lookup_one(
///     Query::<dyn Codec>::new()
///         .hints(&hints)
///         .key(&CODEC)
///         .filter(&|codec| codec.is_lossless()),
/// )?;
/// ```
pub struct Query<'a, T: ?Sized> {
    pub(crate) filter: Option<&'a FilterFn<'a, T>>,
    pub(crate) hints: Option<&'a HintSet>,
    pub(crate) key: Option<&'a HintKey>,
}

impl<'a, T: ?Sized> Query<'a, T> {
    /// A request with no filter and no hints.
    pub fn new() -> Self {
        Self {
            filter: None,
            hints: None,
            key: None,
        }
    }

    /// Only accept candidates for which `filter` returns `true`.
    pub fn filter<F>(mut self, filter: &'a F) -> Self
    where
        F: Fn(&T) -> bool + 'a,
    {
        self.filter = Some(filter);
        self
    }

    /// Only accept candidates compatible with `hints`.
    pub fn hints(mut self, hints: &'a HintSet) -> Self {
        self.hints = Some(hints);
        self
    }

    /// The hint under `key` names the wanted implementation.
    ///
    /// A service value is returned as is. A type descriptor (or list of them)
    /// restricts the lookup to those implementation types. Both `lookup` and
    /// `lookup_one` honor it; only a dynamic `lookup_one` constructs.
    pub fn key(mut self, key: &'a HintKey) -> Self {
        self.key = Some(key);
        self
    }
}

impl<T: ?Sized> Default for Query<'_, T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: ?Sized> Clone for Query<'_, T> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<T: ?Sized> Copy for Query<'_, T> {}

impl<T: ?Sized> fmt::Debug for Query<'_, T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Query")
            .field("filter", &self.filter.is_some())
            .field("hints", &self.hints)
            .field("key", &self.key)
            .finish()
    }
}

/// Accepted candidates of a lookup, most preferred first.
pub struct Candidates<T: ?Sized> {
    inner: vec::IntoIter<Arc<T>>,
}

impl<T: ?Sized> Candidates<T> {
    pub(crate) fn new(items: Vec<Arc<T>>) -> Self {
        Self {
            inner: items.into_iter(),
        }
    }
}

impl<T: ?Sized> Iterator for Candidates<T> {
    type Item = Arc<T>;

    fn next(&mut self) -> Option<Self::Item> {
        self.inner.next()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.inner.size_hint()
    }
}

impl<T: ?Sized> ExactSizeIterator for Candidates<T> {}
