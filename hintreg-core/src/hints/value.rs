//! Hint values.

use crate::{
    candidate::Service,
    types::{Category, ImplType},
};
use std::{
    fmt,
    path::{Path, PathBuf},
    sync::Arc,
};

/// The kind of value a hint key expects.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueType {
    /// `true` / `false`.
    Bool,
    /// Signed integer.
    Integer,
    /// Floating point number.
    Float,
    /// Free text.
    Text,
    /// Filesystem path.
    Path,
    /// A category tag.
    Category,
    /// One or several implementation type descriptors.
    Implementation,
    /// A service instance.
    Service,
    /// Anything.
    Any,
}

/// A value stored in a [`HintSet`](super::HintSet).
#[derive(Clone)]
pub enum HintValue {
    /// Boolean flag.
    Bool(bool),
    /// Integer.
    Integer(i64),
    /// Floating point number.
    Float(f64),
    /// Text.
    Text(Arc<str>),
    /// Filesystem path.
    Path(PathBuf),
    /// A category tag.
    Category(Category),
    /// A required implementation type.
    Implementation(ImplType),
    /// A list of acceptable implementation types.
    Implementations(Vec<ImplType>),
    /// A service instance, e.g. a dependency of a candidate.
    Service(Service),
}

impl HintValue {
    /// The value type of this value.
    pub fn value_type(&self) -> ValueType {
        match self {
            HintValue::Bool(_) => ValueType::Bool,
            HintValue::Integer(_) => ValueType::Integer,
            HintValue::Float(_) => ValueType::Float,
            HintValue::Text(_) => ValueType::Text,
            HintValue::Path(_) => ValueType::Path,
            HintValue::Category(_) => ValueType::Category,
            HintValue::Implementation(_) | HintValue::Implementations(_) => {
                ValueType::Implementation
            }
            HintValue::Service(_) => ValueType::Service,
        }
    }

    /// The boolean, if this is a `Bool`.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            HintValue::Bool(value) => Some(*value),
            _ => None,
        }
    }

    /// The integer, if this is an `Integer`.
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            HintValue::Integer(value) => Some(*value),
            _ => None,
        }
    }

    /// The text, if this is `Text`.
    pub fn as_text(&self) -> Option<&str> {
        match self {
            HintValue::Text(value) => Some(value),
            _ => None,
        }
    }

    /// The path, if this is a `Path`.
    pub fn as_path(&self) -> Option<&Path> {
        match self {
            HintValue::Path(value) => Some(value),
            _ => None,
        }
    }

    /// The service, if this is a `Service`.
    pub fn as_service(&self) -> Option<&Service> {
        match self {
            HintValue::Service(service) => Some(service),
            _ => None,
        }
    }

    /// The implementation types named by this value (empty for other variants).
    pub fn implementation_types(&self) -> &[ImplType] {
        match self {
            HintValue::Implementation(ty) => std::slice::from_ref(ty),
            HintValue::Implementations(types) => types,
            _ => &[],
        }
    }

    /// Whether a candidate's actual value satisfies this requested value.
    ///
    /// Besides plain equality, a requested type descriptor matches any service
    /// whose implementation is that type (or one of the listed types), and a
    /// requested category matches any service of that category.
    pub fn matches(&self, actual: &HintValue) -> bool {
        if self == actual {
            return true;
        }
        match (self, actual) {
            (HintValue::Implementation(ty), HintValue::Service(service)) => {
                service.implementation_type() == *ty
            }
            (HintValue::Implementations(types), HintValue::Service(service)) => {
                types.contains(&service.implementation_type())
            }
            (HintValue::Category(category), HintValue::Service(service)) => {
                service.category() == *category
            }
            _ => false,
        }
    }
}

impl PartialEq for HintValue {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (HintValue::Bool(a), HintValue::Bool(b)) => a == b,
            (HintValue::Integer(a), HintValue::Integer(b)) => a == b,
            (HintValue::Float(a), HintValue::Float(b)) => a == b,
            (HintValue::Text(a), HintValue::Text(b)) => a == b,
            (HintValue::Path(a), HintValue::Path(b)) => a == b,
            (HintValue::Category(a), HintValue::Category(b)) => a == b,
            (HintValue::Implementation(a), HintValue::Implementation(b)) => a == b,
            (HintValue::Implementations(a), HintValue::Implementations(b)) => a == b,
            (HintValue::Service(a), HintValue::Service(b)) => a.same_instance(b),
            _ => false,
        }
    }
}

impl fmt::Debug for HintValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HintValue::Bool(value) => write!(f, "{value}"),
            HintValue::Integer(value) => write!(f, "{value}"),
            HintValue::Float(value) => write!(f, "{value}"),
            HintValue::Text(value) => write!(f, "{value:?}"),
            HintValue::Path(value) => write!(f, "{}", value.display()),
            HintValue::Category(value) => write!(f, "category {value}"),
            HintValue::Implementation(value) => write!(f, "type {value}"),
            HintValue::Implementations(values) => f.debug_list().entries(values).finish(),
            HintValue::Service(service) => write!(f, "{service:?}"),
        }
    }
}

impl fmt::Display for HintValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HintValue::Text(value) => f.write_str(value),
            other => fmt::Debug::fmt(other, f),
        }
    }
}

impl From<bool> for HintValue {
    fn from(value: bool) -> Self {
        HintValue::Bool(value)
    }
}

impl From<i64> for HintValue {
    fn from(value: i64) -> Self {
        HintValue::Integer(value)
    }
}

impl From<i32> for HintValue {
    fn from(value: i32) -> Self {
        HintValue::Integer(value.into())
    }
}

impl From<u32> for HintValue {
    fn from(value: u32) -> Self {
        HintValue::Integer(value.into())
    }
}

impl From<f64> for HintValue {
    fn from(value: f64) -> Self {
        HintValue::Float(value)
    }
}

impl From<&str> for HintValue {
    fn from(value: &str) -> Self {
        HintValue::Text(value.into())
    }
}

impl From<String> for HintValue {
    fn from(value: String) -> Self {
        HintValue::Text(value.into())
    }
}

impl From<Arc<str>> for HintValue {
    fn from(value: Arc<str>) -> Self {
        HintValue::Text(value)
    }
}

impl From<PathBuf> for HintValue {
    fn from(value: PathBuf) -> Self {
        HintValue::Path(value)
    }
}

impl From<&Path> for HintValue {
    fn from(value: &Path) -> Self {
        HintValue::Path(value.to_path_buf())
    }
}

impl From<Category> for HintValue {
    fn from(value: Category) -> Self {
        HintValue::Category(value)
    }
}

impl From<ImplType> for HintValue {
    fn from(value: ImplType) -> Self {
        HintValue::Implementation(value)
    }
}

impl From<Vec<ImplType>> for HintValue {
    fn from(value: Vec<ImplType>) -> Self {
        HintValue::Implementations(value)
    }
}

impl From<Service> for HintValue {
    fn from(value: Service) -> Self {
        HintValue::Service(value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::candidate::Candidate;

    trait Codec: Candidate {}
    struct FastCodec;
    impl Candidate for FastCodec {}
    impl Codec for FastCodec {}
    struct SlowCodec;

    #[test]
    fn test_value_types() {
        assert_eq!(HintValue::from(3).value_type(), ValueType::Integer);
        assert_eq!(HintValue::from("x").value_type(), ValueType::Text);
        assert_eq!(
            HintValue::from(vec![ImplType::of::<FastCodec>()]).value_type(),
            ValueType::Implementation
        );
    }

    #[test]
    fn test_type_descriptor_matches_instance() {
        let service = Service::new::<dyn Codec>(Arc::new(FastCodec));
        let actual = HintValue::Service(service);

        assert!(HintValue::from(ImplType::of::<FastCodec>()).matches(&actual));
        assert!(!HintValue::from(ImplType::of::<SlowCodec>()).matches(&actual));
        assert!(
            HintValue::from(vec![ImplType::of::<SlowCodec>(), ImplType::of::<FastCodec>()])
                .matches(&actual)
        );
        assert!(HintValue::Category(Category::of::<dyn Codec>()).matches(&actual));
        assert!(!HintValue::from("fast").matches(&actual));
    }

    #[test]
    fn test_services_compare_by_identity() {
        let a = Service::new::<dyn Codec>(Arc::new(FastCodec));
        let b = Service::new::<dyn Codec>(Arc::new(FastCodec));
        assert_eq!(HintValue::Service(a.clone()), HintValue::Service(a.clone()));
        assert_ne!(HintValue::Service(a), HintValue::Service(b));
    }
}
