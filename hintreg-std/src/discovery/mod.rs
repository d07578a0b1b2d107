//! Candidate discovery.
//!
//! Besides candidates registered directly, a registry pulls candidates from:
//!
//! - declarations made on its builder
//! - [`DiscoverySource`]s in its [`ProviderSet`]
//! - link-time [`Declaration`]s (feature `inventory`)

mod providers;
mod source;

#[cfg(feature = "inventory")]
mod declaration;

pub use providers::{ProviderSet, SourceId};
pub use source::{DiscoverySource, FnSource, StaticSource};

#[cfg(feature = "inventory")]
pub use declaration::{Declaration, declarations_for};
