//! # hintreg-std
//!
//! Registry implementations for the hintreg factory registry.
//!
//! This crate provides:
//! - **Registry**: [`Registry`], [`RegistryBuilder`], [`Query`]
//! - **Recursion guard**: [`Resolver`], [`CallStack`]
//! - **Discovery**: [`DiscoverySource`], [`ProviderSet`], link-time declarations
//! - **Dynamic construction**: [`DynamicRegistry`], [`Constructor`]
//! - **Testing helpers**: [`testing`]

#![deny(clippy::wildcard_imports)]
#![warn(missing_docs)]

// Re-export core types
pub use hintreg_core;

// Modules
pub mod discovery;
pub mod dynamic;
pub mod registry;
pub mod resolver;
pub mod testing;

pub use discovery::{DiscoverySource, FnSource, ProviderSet, SourceId, StaticSource};
pub use dynamic::{Constructor, DynamicRegistry};
pub use registry::{AcceptanceFn, Candidates, FilterFn, Query, Registry, RegistryBuilder};
pub use resolver::{CallStack, Resolver};

#[cfg(feature = "inventory")]
pub use discovery::Declaration;

#[cfg(feature = "inventory")]
pub use inventory;
