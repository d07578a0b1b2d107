//! # Hint Model
//!
//! Typed configuration hints used to select among candidates.
//!
//! - [`HintKey`]: one configuration dimension, compared by identity, with a
//!   compatibility predicate deciding which values it accepts
//! - [`HintValue`]: the values hints can carry, including type descriptors and
//!   service instances
//! - [`HintSet`]: a validated key/value map built per call
//! - [`DefaultsStore`]: the default layer, with change listeners

mod defaults;
mod key;
mod set;
mod value;

pub use defaults::{DefaultsChange, DefaultsStore, ListenerId};
pub use key::{AcceptFn, FileAccess, HintKey, KeyKind};
pub use set::{HintSet, Iter};
pub use value::{HintValue, ValueType};
