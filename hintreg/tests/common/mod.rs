#![allow(dead_code)]

use hintreg::{
    Availability, Candidate, Category, Constructor, HintKey, HintSet, HintValue, Service,
    Unavailable,
};
use std::sync::{
    Arc, LazyLock, OnceLock,
    atomic::{AtomicUsize, Ordering},
};

// ============================================================================
// Hint Keys
// ============================================================================

pub static PRECISION: LazyLock<HintKey> =
    LazyLock::new(|| HintKey::options("precision", ["single", "double"]));

pub static INNER: LazyLock<HintKey> =
    LazyLock::new(|| HintKey::type_or_instance("inner codec", Category::of::<dyn Codec>()));

pub static CODEC: LazyLock<HintKey> =
    LazyLock::new(|| HintKey::type_or_instance("codec", Category::of::<dyn Codec>()));

pub fn precision(value: &str) -> HintSet {
    HintSet::empty().with(&PRECISION, value).unwrap()
}

// ============================================================================
// Greeters
// ============================================================================

pub trait Greeter: Candidate {
    fn greet(&self, name: &str) -> String;
}

impl std::fmt::Debug for dyn Greeter {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("dyn Greeter")
    }
}

pub struct EnglishGreeter;

impl Candidate for EnglishGreeter {
    fn vendor(&self) -> Option<&str> {
        Some("commonwealth")
    }
}

impl Greeter for EnglishGreeter {
    fn greet(&self, name: &str) -> String {
        format!("Hello {name}")
    }
}

pub struct FrenchGreeter;

impl Candidate for FrenchGreeter {
    fn vendor(&self) -> Option<&str> {
        Some("francophonie")
    }
}

impl Greeter for FrenchGreeter {
    fn greet(&self, name: &str) -> String {
        format!("Bonjour {name}")
    }
}

/// Always unavailable: its phrasebook is missing.
pub struct OfflineGreeter;

impl Candidate for OfflineGreeter {
    fn availability(&self) -> Availability {
        let missing = std::io::Error::new(std::io::ErrorKind::NotFound, "phrasebook.db");
        Availability::Unavailable(
            Unavailable::new("OfflineGreeter", "phrasebook not installed").with_cause(missing),
        )
    }
}

impl Greeter for OfflineGreeter {
    fn greet(&self, name: &str) -> String {
        format!("... {name}")
    }
}

// ============================================================================
// Codecs
// ============================================================================

pub trait Codec: Candidate {
    fn precision(&self) -> &str;
}

impl std::fmt::Debug for dyn Codec {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("dyn Codec")
    }
}

/// A registered codec restricted to one precision.
pub struct FastCodec {
    pub precision: &'static str,
}

impl Candidate for FastCodec {
    fn implementation_hints(&self) -> HintSet {
        precision(self.precision)
    }
}

impl Codec for FastCodec {
    fn precision(&self) -> &str {
        self.precision
    }
}

/// Built from the lookup hints.
pub struct PreciseCodec {
    precision: String,
}

impl PreciseCodec {
    pub fn new(hints: &HintSet) -> Self {
        let precision = hints
            .get(&PRECISION)
            .and_then(HintValue::as_text)
            .unwrap_or("double")
            .to_string();
        Self { precision }
    }

    /// A constructor counting how often it ran.
    pub fn constructor(built: Arc<AtomicUsize>) -> Constructor<dyn Codec> {
        Constructor::<dyn Codec>::new::<PreciseCodec>().hinted(move |hints, _| {
            built.fetch_add(1, Ordering::SeqCst);
            Ok(Arc::new(PreciseCodec::new(hints)))
        })
    }
}

impl Candidate for PreciseCodec {
    fn implementation_hints(&self) -> HintSet {
        precision(&self.precision)
    }
}

impl Codec for PreciseCodec {
    fn precision(&self) -> &str {
        &self.precision
    }
}

/// Delegates to another codec; its compatibility follows the inner one.
pub struct WrappingCodec {
    pub inner: Arc<dyn Codec>,
}

impl Candidate for WrappingCodec {
    fn implementation_hints(&self) -> HintSet {
        HintSet::empty()
            .with(&INNER, Service::new::<dyn Codec>(self.inner.clone()))
            .unwrap_or_default()
    }
}

impl Codec for WrappingCodec {
    fn precision(&self) -> &str {
        self.inner.precision()
    }
}

/// Depends on itself through its implementation hints.
pub struct CyclicCodec {
    pub inner: OnceLock<Arc<dyn Codec>>,
}

impl CyclicCodec {
    pub fn new() -> Arc<Self> {
        let codec = Arc::new(CyclicCodec {
            inner: OnceLock::new(),
        });
        let _ = codec.inner.set(codec.clone());
        codec
    }
}

impl Candidate for CyclicCodec {
    fn implementation_hints(&self) -> HintSet {
        match self.inner.get() {
            Some(inner) => HintSet::empty()
                .with(&INNER, Service::new::<dyn Codec>(inner.clone()))
                .unwrap_or_default(),
            None => HintSet::empty(),
        }
    }
}

impl Codec for CyclicCodec {
    fn precision(&self) -> &str {
        "cyclic"
    }
}
