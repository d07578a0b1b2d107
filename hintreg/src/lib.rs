//! # hintreg - Hint-Driven Factory Registry
//!
//! `hintreg` lets callers ask for an implementation of an abstract capability
//! (a *category*, usually a trait object type), optionally constrained by typed
//! configuration *hints*, and get back either a registered implementation or
//! one constructed on demand.
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use hintreg::prelude::*;
//! use std::sync::Arc;
//!
//! trait Greeter: Candidate {
//!     fn greet(&self) -> String;
//! }
//!
//! struct English;
//! impl Candidate for English {}
//! impl Greeter for English {
//!     fn greet(&self) -> String { "Hello".into() }
//! }
//!
//! let mut registry = Registry::builder()
//!     .declare_service::<dyn Greeter>(Arc::new(English))
//!     .build();
//! let greeter = registry.get::<dyn Greeter>()?;
//! ```
//!
//! ## Dynamic Construction
//!
//! A [`DynamicRegistry`] falls back to [`Constructor`]s when no registered
//! candidate is acceptable, and caches what it built without keeping it alive.
//!
//! ```rust,ignore
//! let mut registry = Registry::builder().category::<dyn Codec>().build_dynamic();
//! registry.register_constructor(
//!     Constructor::<dyn Codec>::new::<PreciseCodec>()
//!         .hinted(|hints, _| Ok(Arc::new(PreciseCodec::new(hints)))),
//! )?;
//! let codec = registry.lookup_one(Query::<dyn Codec>::new().hints(&hints))?;
//! ```

#![deny(clippy::wildcard_imports)]
#![warn(missing_docs)]

pub use hintreg_core::{
    // Candidate contract
    AsCandidate,
    Availability,
    // Error types
    BoxError,
    Candidate,
    // Tags
    Category,
    ConstructionError,
    // Hints
    DefaultsChange,
    DefaultsStore,
    FileAccess,
    HintError,
    HintKey,
    HintSet,
    HintValue,
    ImplType,
    KeyKind,
    ListenerId,
    // Ordering
    NodeId,
    OrderingGraph,
    Organizer,
    RegistryError,
    Service,
    SharedError,
    Unavailable,
    ValueType,
    // Matching
    candidates_equal,
    describe,
    has_compatible_hints,
};

// Registry
pub use hintreg_std::{
    AcceptanceFn, CallStack, Candidates, FilterFn, Query, Registry, RegistryBuilder, Resolver,
};

// Dynamic construction
pub use hintreg_std::{Constructor, DynamicRegistry};

/// Candidate discovery.
pub mod discovery {
    pub use hintreg_std::discovery::{
        DiscoverySource, FnSource, ProviderSet, SourceId, StaticSource,
    };

    #[cfg(feature = "inventory")]
    pub use hintreg_std::discovery::{Declaration, declarations_for};
}

/// Testing utilities.
pub mod testing {
    pub use hintreg_std::testing::{DisposeProbe, RecordingSource};
}

/// Prelude module - common imports for hintreg.
///
/// # Usage
///
/// ```rust,ignore
/// use hintreg::prelude::*;
/// ```
pub mod prelude {
    pub use crate::{
        Availability,
        BoxError,
        Candidate,
        Category,
        Constructor,
        DefaultsStore,
        DynamicRegistry,
        HintKey,
        HintSet,
        HintValue,
        ImplType,
        Organizer,
        Query,
        Registry,
        RegistryError,
        Resolver,
        Service,
        Unavailable,
        ValueType,
    };
}

#[cfg(feature = "macros")]
pub use hintreg_macros::Candidate;

#[cfg(feature = "inventory")]
pub use hintreg_std::declare_candidate;

#[cfg(feature = "inventory")]
pub use inventory;

#[doc(hidden)]
pub use hintreg_core;
