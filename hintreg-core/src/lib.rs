//! # hintreg-core
//!
//! Core types of the hintreg factory registry.
//!
//! This crate holds everything a plugin needs to *offer* implementations,
//! without pulling in the registry itself from `hintreg-std`.
//!
//! # Layers
//!
//! ## Tags ([`Category`], [`ImplType`])
//!
//! A category is the abstract capability callers ask for, usually a trait
//! object type such as `dyn Greeter`. An implementation type identifies the
//! concrete type behind a candidate.
//!
//! ## Hints ([`HintKey`], [`HintSet`], [`DefaultsStore`])
//!
//! Typed configuration values used to choose between candidates. Keys compare
//! by identity and validate every value stored under them. A [`DefaultsStore`]
//! carries the default layer that fresh hint sets start from.
//!
//! ## Candidates ([`Candidate`], [`Service`])
//!
//! The contract every implementation fulfills: implementation hints,
//! availability, ordering preferences and disposal. A [`Service`] binds an
//! instance to the category it serves.
//!
//! ## Matching ([`has_compatible_hints`], [`candidates_equal`], [`OrderingGraph`])
//!
//! The algorithms the registry runs over candidates: transitive hint
//! compatibility, structural equality for duplicate detection, and the
//! per-category preference order.
//!
//! # Error Types
//!
//! - [`RegistryError`] - Lookup, construction and recursion failures
//! - [`ConstructionError`] - Why an implementation could not be built
//! - [`HintError`] - Rejected or unparsable hint values

#![deny(clippy::wildcard_imports)]
#![warn(missing_docs)]

mod candidate;
mod compat;
mod error;
pub mod hints;
mod ordering;
mod types;

// Re-exports
pub use candidate::{AsCandidate, Availability, Candidate, Service, address, describe};
pub use compat::{candidates_equal, has_compatible_hints};
pub use error::{
    BoxError, ConstructionError, HintError, RegistryError, SharedError, Unavailable,
};
pub use hints::{
    DefaultsChange, DefaultsStore, FileAccess, HintKey, HintSet, HintValue, KeyKind, ListenerId,
    ValueType,
};
pub use ordering::{NodeId, OrderingGraph, Organizer};
pub use types::{Category, ImplType};
