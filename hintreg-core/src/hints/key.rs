//! Hint keys.
//!
//! A [`HintKey`] names one configuration dimension and decides which values it
//! accepts. Keys compare by identity: two keys created with the same name are
//! still different keys. Clone a key (or keep it in a static) to share it.

use super::value::{HintValue, ValueType};
use crate::{error::HintError, types::Category};
use bitflags::bitflags;
use std::{
    fmt,
    hash::{Hash, Hasher},
    path::Path,
    sync::Arc,
};

bitflags! {
    /// Constraints checked by file hint keys.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct FileAccess: u8 {
        /// The path must exist.
        const EXISTS = 1;
        /// The file (or, if it does not exist yet, its parent directory) must be writable.
        const WRITABLE = 1 << 1;
        /// The path must be a directory when it exists.
        const DIRECTORY = 1 << 2;
    }
}

/// Predicate used by [`HintKey::custom`].
pub type AcceptFn = dyn Fn(&HintValue) -> bool + Send + Sync;

/// The compatibility rule of a key.
#[derive(Clone)]
pub enum KeyKind {
    /// Accepts values of one value type.
    Typed(ValueType),
    /// Accepts an implementation type descriptor, the category itself, or a
    /// service instance of that category.
    TypeOrInstance(Category),
    /// Accepts text from an enumerated set.
    Options {
        /// The allowed options.
        options: Arc<[Arc<str>]>,
        /// Whether `"*"` is accepted as a wildcard.
        wildcard: bool,
    },
    /// Accepts filesystem paths satisfying the access constraints.
    File(FileAccess),
    /// Accepts integers and supplies a default when the hint is absent.
    Integer {
        /// Value used by [`HintKey::integer_or_default`] when the hint is absent.
        default: i64,
    },
    /// Accepts whatever the predicate accepts.
    Custom(Arc<AcceptFn>),
}

impl fmt::Debug for KeyKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            KeyKind::Typed(ty) => f.debug_tuple("Typed").field(ty).finish(),
            KeyKind::TypeOrInstance(category) => {
                f.debug_tuple("TypeOrInstance").field(category).finish()
            }
            KeyKind::Options { options, wildcard } => f
                .debug_struct("Options")
                .field("options", options)
                .field("wildcard", wildcard)
                .finish(),
            KeyKind::File(access) => f.debug_tuple("File").field(access).finish(),
            KeyKind::Integer { default } => {
                f.debug_struct("Integer").field("default", default).finish()
            }
            KeyKind::Custom(_) => f.write_str("Custom(..)"),
        }
    }
}

struct KeyInner {
    name: Arc<str>,
    kind: KeyKind,
}

/// A typed configuration key.
///
/// # Example
///
/// ```rust,ignore
/// static PRECISION: LazyLock<HintKey> =
///     LazyLock::new(|| HintKey::options("precision", ["single", "double"]));
///
/// let mut hints = HintSet::empty();
/// hints.insert(&PRECISION, "double")?;
/// assert!(hints.insert(&PRECISION, "quad").is_err());
/// ```
#[derive(Clone)]
pub struct HintKey {
    inner: Arc<KeyInner>,
}

impl HintKey {
    fn with_kind(name: impl Into<Arc<str>>, kind: KeyKind) -> Self {
        Self {
            inner: Arc::new(KeyInner {
                name: name.into(),
                kind,
            }),
        }
    }

    /// A key accepting values of the given type.
    pub fn new(name: impl Into<Arc<str>>, value_type: ValueType) -> Self {
        Self::with_kind(name, KeyKind::Typed(value_type))
    }

    /// A key accepting either a type descriptor or an instance of `category`.
    pub fn type_or_instance(name: impl Into<Arc<str>>, category: Category) -> Self {
        Self::with_kind(name, KeyKind::TypeOrInstance(category))
    }

    /// A key restricted to the given options.
    pub fn options<I, S>(name: impl Into<Arc<str>>, options: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<Arc<str>>,
    {
        Self::with_kind(
            name,
            KeyKind::Options {
                options: options.into_iter().map(Into::into).collect(),
                wildcard: false,
            },
        )
    }

    /// A key restricted to the given options, also accepting `"*"`.
    pub fn options_with_wildcard<I, S>(name: impl Into<Arc<str>>, options: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<Arc<str>>,
    {
        Self::with_kind(
            name,
            KeyKind::Options {
                options: options.into_iter().map(Into::into).collect(),
                wildcard: true,
            },
        )
    }

    /// A key accepting filesystem paths.
    pub fn file(name: impl Into<Arc<str>>, access: FileAccess) -> Self {
        Self::with_kind(name, KeyKind::File(access))
    }

    /// A key accepting integers, with a default for absent hints.
    pub fn integer(name: impl Into<Arc<str>>, default: i64) -> Self {
        Self::with_kind(name, KeyKind::Integer { default })
    }

    /// A key with an arbitrary compatibility predicate.
    pub fn custom<F>(name: impl Into<Arc<str>>, accepts: F) -> Self
    where
        F: Fn(&HintValue) -> bool + Send + Sync + 'static,
    {
        Self::with_kind(name, KeyKind::Custom(Arc::new(accepts)))
    }

    /// The key name, for diagnostics only.
    pub fn name(&self) -> &str {
        &self.inner.name
    }

    /// The compatibility rule.
    pub fn kind(&self) -> &KeyKind {
        &self.inner.kind
    }

    /// The value type this key expects.
    pub fn value_type(&self) -> ValueType {
        match &self.inner.kind {
            KeyKind::Typed(ty) => *ty,
            KeyKind::TypeOrInstance(_) => ValueType::Service,
            KeyKind::Options { .. } => ValueType::Text,
            KeyKind::File(_) => ValueType::Path,
            KeyKind::Integer { .. } => ValueType::Integer,
            KeyKind::Custom(_) => ValueType::Any,
        }
    }

    /// Whether `value` may be stored under this key.
    pub fn accepts(&self, value: &HintValue) -> bool {
        match &self.inner.kind {
            KeyKind::Typed(ValueType::Any) => true,
            KeyKind::Typed(ty) => value.value_type() == *ty,
            KeyKind::TypeOrInstance(category) => match value {
                HintValue::Implementation(_) | HintValue::Implementations(_) => true,
                HintValue::Category(other) => other == category,
                HintValue::Service(service) => service.category() == *category,
                _ => false,
            },
            KeyKind::Options { options, wildcard } => match value {
                HintValue::Text(text) => {
                    (*wildcard && &**text == "*") || options.iter().any(|o| o == text)
                }
                _ => false,
            },
            KeyKind::File(access) => match value {
                HintValue::Path(path) => file_accepts(*access, path),
                HintValue::Text(text) => file_accepts(*access, Path::new(&**text)),
                _ => false,
            },
            KeyKind::Integer { .. } => matches!(value, HintValue::Integer(_)),
            KeyKind::Custom(accepts) => accepts(value),
        }
    }

    /// The default of an integer key, `None` for other keys.
    pub fn default_integer(&self) -> Option<i64> {
        match &self.inner.kind {
            KeyKind::Integer { default } => Some(*default),
            _ => None,
        }
    }

    /// The integer stored under this key, or the key's default.
    ///
    /// Returns `None` when the hint is absent and the key has no default.
    pub fn integer_or_default(&self, hints: &super::HintSet) -> Option<i64> {
        match hints.get(self) {
            Some(HintValue::Integer(value)) => Some(*value),
            _ => self.default_integer(),
        }
    }

    /// Parse configuration text into a value this key accepts.
    pub fn parse(&self, input: &str) -> Result<HintValue, HintError> {
        let unparsable = || HintError::Unparsable {
            key: self.name().to_string(),
            input: input.to_string(),
        };
        let trimmed = input.trim();
        let value = match self.value_type() {
            ValueType::Bool => match trimmed.to_ascii_lowercase().as_str() {
                "true" | "yes" | "on" | "1" => HintValue::Bool(true),
                "false" | "no" | "off" | "0" => HintValue::Bool(false),
                _ => return Err(unparsable()),
            },
            ValueType::Integer => {
                HintValue::Integer(trimmed.parse::<i64>().map_err(|_| unparsable())?)
            }
            ValueType::Float => HintValue::Float(trimmed.parse::<f64>().map_err(|_| unparsable())?),
            ValueType::Text | ValueType::Any => HintValue::from(trimmed),
            ValueType::Path => HintValue::Path(trimmed.into()),
            ValueType::Category | ValueType::Implementation | ValueType::Service => {
                return Err(unparsable());
            }
        };
        self.check(&value)?;
        Ok(value)
    }

    pub(crate) fn check(&self, value: &HintValue) -> Result<(), HintError> {
        if self.accepts(value) {
            Ok(())
        } else {
            Err(HintError::Rejected {
                key: self.name().to_string(),
                value: format!("{value:?}"),
            })
        }
    }

    /// Identity of the key, stable while any handle to it is alive.
    pub(crate) fn addr(&self) -> usize {
        Arc::as_ptr(&self.inner) as usize
    }
}

impl PartialEq for HintKey {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.inner, &other.inner)
    }
}

impl Eq for HintKey {}

impl Hash for HintKey {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.addr().hash(state);
    }
}

impl fmt::Debug for HintKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "HintKey({})", self.name())
    }
}

impl fmt::Display for HintKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

fn file_accepts(access: FileAccess, path: &Path) -> bool {
    match std::fs::metadata(path) {
        Ok(meta) => {
            if access.contains(FileAccess::DIRECTORY) && !meta.is_dir() {
                return false;
            }
            !(access.contains(FileAccess::WRITABLE) && meta.permissions().readonly())
        }
        Err(_) => {
            if access.contains(FileAccess::EXISTS) {
                return false;
            }
            if !access.contains(FileAccess::WRITABLE) {
                return true;
            }
            let parent = match path.parent() {
                Some(parent) if !parent.as_os_str().is_empty() => parent,
                _ => Path::new("."),
            };
            std::fs::metadata(parent)
                .map(|meta| meta.is_dir() && !meta.permissions().readonly())
                .unwrap_or(false)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ImplType;

    trait Codec {}
    struct FastCodec;

    #[test]
    fn test_identity_not_name() {
        let a = HintKey::new("precision", ValueType::Text);
        let b = HintKey::new("precision", ValueType::Text);
        assert_ne!(a, b);
        assert_eq!(a, a.clone());
    }

    #[test]
    fn test_typed_key() {
        let key = HintKey::new("lenient", ValueType::Bool);
        assert!(key.accepts(&HintValue::Bool(true)));
        assert!(!key.accepts(&HintValue::Integer(1)));

        let any = HintKey::new("anything", ValueType::Any);
        assert!(any.accepts(&HintValue::Float(1.5)));
    }

    #[test]
    fn test_type_or_instance_key() {
        let key = HintKey::type_or_instance("codec", Category::of::<dyn Codec>());
        assert!(key.accepts(&HintValue::Implementation(ImplType::of::<FastCodec>())));
        assert!(key.accepts(&HintValue::Category(Category::of::<dyn Codec>())));
        assert!(!key.accepts(&HintValue::Category(Category::of::<FastCodec>())));
        assert!(!key.accepts(&HintValue::from("fast")));
    }

    #[test]
    fn test_options_key() {
        let key = HintKey::options("precision", ["single", "double"]);
        assert!(key.accepts(&HintValue::from("double")));
        assert!(!key.accepts(&HintValue::from("quad")));
        assert!(!key.accepts(&HintValue::from("*")));

        let wild = HintKey::options_with_wildcard("precision", ["single"]);
        assert!(wild.accepts(&HintValue::from("*")));
    }

    #[test]
    fn test_integer_key_default() {
        let key = HintKey::integer("cache_size", 50);
        let mut hints = crate::HintSet::empty();
        assert_eq!(key.integer_or_default(&hints), Some(50));
        hints.insert(&key, 8).unwrap();
        assert_eq!(key.integer_or_default(&hints), Some(8));
        assert!(!key.accepts(&HintValue::from("8")));
    }

    #[test]
    fn test_file_key() {
        let dir = tempfile::tempdir().unwrap();
        let existing = dir.path().join("present.db");
        std::fs::write(&existing, b"x").unwrap();
        let missing = dir.path().join("absent.db");

        let must_exist = HintKey::file("database", FileAccess::EXISTS);
        assert!(must_exist.accepts(&HintValue::Path(existing.clone())));
        assert!(!must_exist.accepts(&HintValue::Path(missing.clone())));

        let writable = HintKey::file("output", FileAccess::WRITABLE);
        assert!(writable.accepts(&HintValue::Path(missing.clone())));
        assert!(!writable.accepts(&HintValue::Path(dir.path().join("no/such/dir/out.db"))));

        let directory = HintKey::file("workdir", FileAccess::DIRECTORY);
        assert!(directory.accepts(&HintValue::Path(dir.path().to_path_buf())));
        assert!(!directory.accepts(&HintValue::Path(existing)));
    }

    #[test]
    fn test_custom_key() {
        let key = HintKey::custom("even", |v| matches!(v, HintValue::Integer(n) if n % 2 == 0));
        assert!(key.accepts(&HintValue::Integer(4)));
        assert!(!key.accepts(&HintValue::Integer(3)));
    }

    #[test]
    fn test_parse() {
        let flag = HintKey::new("force_xy", ValueType::Bool);
        assert_eq!(flag.parse("YES").unwrap(), HintValue::Bool(true));
        assert!(flag.parse("maybe").is_err());

        let size = HintKey::integer("cache_size", 50);
        assert_eq!(size.parse(" 12 ").unwrap(), HintValue::Integer(12));

        let precision = HintKey::options("precision", ["single", "double"]);
        assert_eq!(precision.parse("double").unwrap(), HintValue::from("double"));
        assert!(matches!(
            precision.parse("quad"),
            Err(HintError::Rejected { .. })
        ));

        let codec = HintKey::type_or_instance("codec", Category::of::<dyn Codec>());
        assert!(matches!(
            codec.parse("FastCodec"),
            Err(HintError::Unparsable { .. })
        ));
    }
}
