//! Error types for hintreg.
//!
//! This module provides a structured error hierarchy using `thiserror`:
//!
//! - [`RegistryError`] - Errors surfaced by registry lookups and construction
//! - [`ConstructionError`] - Why a dynamically requested implementation could not be built
//! - [`HintError`] - Errors from building hint sets and parsing hint values
//! - [`Unavailable`] - A candidate's own report that it cannot be used

use crate::types::{Category, ImplType};
use std::sync::Arc;
use thiserror::Error;

/// A boxed error type for user callbacks (declarations, sources, constructors).
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// A shared error, kept inside other errors as a cause.
pub type SharedError = Arc<dyn std::error::Error + Send + Sync + 'static>;

/// Errors returned by registry operations.
#[derive(Error, Debug)]
pub enum RegistryError {
    /// No candidate matched the request.
    #[error("no acceptable `{category}` implementation found{}", requested(.implementation))]
    NotFound {
        /// The requested category.
        category: Category,
        /// The implementation type named by the request, if any.
        implementation: Option<ImplType>,
        /// The last availability failure seen while searching.
        #[source]
        cause: Option<SharedError>,
    },

    /// A dynamically requested implementation could not be built.
    #[error("cannot construct `{implementation}` for `{category}`")]
    Construction {
        /// The requested category.
        category: Category,
        /// The implementation type that failed.
        implementation: ImplType,
        /// What went wrong.
        #[source]
        source: ConstructionError,
    },

    /// The category was requested again from within its own resolution.
    #[error("recursive lookup of `{category}` while it is being resolved")]
    RecursiveLookup {
        /// The category requested twice on the same call stack.
        category: Category,
    },

    /// The registry was not built to serve this category.
    #[error("category `{0}` is not served by this registry")]
    UnknownCategory(Category),
}

impl RegistryError {
    /// A `NotFound` error without a named implementation or cause.
    pub fn not_found(category: Category) -> Self {
        RegistryError::NotFound {
            category,
            implementation: None,
            cause: None,
        }
    }

    /// Returns `true` for [`RegistryError::NotFound`].
    pub fn is_not_found(&self) -> bool {
        matches!(self, RegistryError::NotFound { .. })
    }

    /// Returns `true` for [`RegistryError::RecursiveLookup`].
    pub fn is_recursive(&self) -> bool {
        matches!(self, RegistryError::RecursiveLookup { .. })
    }

    /// Extracts a recursive-lookup error from a boxed callback error.
    ///
    /// User callbacks box whatever they return, so a `RecursiveLookup` raised by a
    /// nested lookup arrives here boxed. Any other error is handed back unchanged.
    pub fn recursive_from(err: BoxError) -> Result<RegistryError, BoxError> {
        match err.downcast::<RegistryError>() {
            Ok(inner) if inner.is_recursive() => Ok(*inner),
            Ok(inner) => Err(inner),
            Err(other) => Err(other),
        }
    }
}

fn requested(implementation: &Option<ImplType>) -> String {
    match implementation {
        Some(implementation) => format!(" (requested `{implementation}`)"),
        None => String::new(),
    }
}

/// Why construction of an implementation type failed.
#[derive(Error, Debug)]
pub enum ConstructionError {
    /// Neither a hint-taking nor a plain constructor is registered.
    #[error("no constructor registered")]
    NoConstructor,

    /// The constructor returned an error.
    #[error("constructor failed")]
    Failed(#[source] SharedError),

    /// The constructor produced an instance of another type.
    #[error("constructor produced `{actual}`")]
    TypeMismatch {
        /// The type the constructor produced.
        actual: ImplType,
    },
}

/// Errors from hint keys and hint sets.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum HintError {
    /// The key's compatibility predicate rejected the value.
    #[error("hint key `{key}` does not accept {value}")]
    Rejected {
        /// Name of the key.
        key: String,
        /// Debug rendering of the rejected value.
        value: String,
    },

    /// The text could not be turned into a value for the key.
    #[error("cannot parse `{input}` for hint key `{key}`")]
    Unparsable {
        /// Name of the key.
        key: String,
        /// The raw input.
        input: String,
    },
}

/// A candidate's report that it cannot currently be used.
///
/// Unavailable candidates are skipped by lookups. The report only surfaces as
/// the cause of a [`RegistryError::NotFound`].
#[derive(Error, Debug, Clone)]
#[error("`{candidate}` is unavailable: {reason}")]
pub struct Unavailable {
    candidate: String,
    reason: String,
    #[source]
    cause: Option<SharedError>,
}

impl Unavailable {
    /// Create a report for the given candidate name.
    pub fn new(candidate: impl Into<String>, reason: impl Into<String>) -> Self {
        Self {
            candidate: candidate.into(),
            reason: reason.into(),
            cause: None,
        }
    }

    /// Attach the underlying failure.
    pub fn with_cause<E>(mut self, cause: E) -> Self
    where
        E: std::error::Error + Send + Sync + 'static,
    {
        self.cause = Some(Arc::new(cause));
        self
    }

    /// The human-readable explanation.
    pub fn reason(&self) -> &str {
        &self.reason
    }

    /// The underlying failure, if any.
    pub fn cause(&self) -> Option<&SharedError> {
        self.cause.as_ref()
    }
}
