//! Type tags for categories and implementation types.
//!
//! Both tags wrap a [`TypeId`] and keep the type name around for diagnostics.
//! Equality and hashing only look at the `TypeId`.

use std::{
    any::{TypeId, type_name},
    fmt,
    hash::{Hash, Hasher},
};

/// Opaque tag of an abstract capability under which candidates compete.
///
/// A category is usually built from a trait object type:
///
/// ```rust,ignore
/// trait Greeter: Candidate { fn greet(&self) -> String; }
///
/// let category = Category::of::<dyn Greeter>();
/// ```
#[derive(Clone, Copy)]
pub struct Category {
    id: TypeId,
    name: &'static str,
}

impl Category {
    /// The category tag of `T`.
    pub fn of<T: ?Sized + 'static>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: type_name::<T>(),
        }
    }

    /// Fully qualified type name this tag was built from.
    pub fn type_name(&self) -> &'static str {
        self.name
    }

    /// Short name, without module path or `dyn` prefix.
    pub fn short_name(&self) -> &'static str {
        short_name(self.name)
    }
}

impl PartialEq for Category {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Category {}

impl Hash for Category {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Debug for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Category({})", self.short_name())
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.short_name())
    }
}

/// Tag of a concrete implementation type.
///
/// Used as a hint value to request a specific implementation, and as the key
/// of the constructor table of a dynamic registry.
#[derive(Clone, Copy)]
pub struct ImplType {
    id: TypeId,
    name: &'static str,
}

impl ImplType {
    /// The implementation tag of `C`.
    pub fn of<C: ?Sized + 'static>() -> Self {
        Self {
            id: TypeId::of::<C>(),
            name: type_name::<C>(),
        }
    }

    /// Fully qualified type name.
    pub fn type_name(&self) -> &'static str {
        self.name
    }

    /// Short name, without module path.
    pub fn short_name(&self) -> &'static str {
        short_name(self.name)
    }
}

impl PartialEq for ImplType {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for ImplType {}

impl Hash for ImplType {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl fmt::Debug for ImplType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ImplType({})", self.short_name())
    }
}

impl fmt::Display for ImplType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.short_name())
    }
}

// Generic arguments are left alone: `a::Foo<b::Bar>` becomes `Foo<b::Bar>`.
fn short_name(full: &'static str) -> &'static str {
    let full = full.strip_prefix("dyn ").unwrap_or(full);
    let head = match full.find('<') {
        Some(generic) => &full[..generic],
        None => full,
    };
    match head.rfind("::") {
        Some(pos) => &full[pos + 2..],
        None => full,
    }
}
