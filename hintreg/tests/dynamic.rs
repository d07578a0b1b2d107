mod common;

use common::{CODEC, Codec, FastCodec, PreciseCodec, precision};
use hintreg::{
    Constructor, DynamicRegistry, HintSet, ImplType, Query, Registry, RegistryError, Service,
};
use std::sync::{
    Arc,
    atomic::{AtomicUsize, Ordering},
};

fn codecs(built: Arc<AtomicUsize>) -> DynamicRegistry {
    let mut registry = Registry::builder()
        .declare_service::<dyn Codec>(Arc::new(FastCodec { precision: "single" }))
        .build_dynamic();
    registry
        .register_constructor(PreciseCodec::constructor(built))
        .unwrap();
    registry
}

#[test]
fn test_codec_constructed_on_mismatch() {
    let built = Arc::new(AtomicUsize::new(0));
    let mut registry = codecs(built.clone());

    let single = precision("single");
    let fast = registry
        .lookup_one(Query::<dyn Codec>::new().hints(&single))
        .unwrap();
    assert_eq!(fast.precision(), "single");
    assert_eq!(built.load(Ordering::SeqCst), 0);

    let double = precision("double");
    let first = registry
        .lookup_one(Query::<dyn Codec>::new().hints(&double))
        .unwrap();
    assert_eq!(first.precision(), "double");

    let second = registry
        .lookup_one(Query::<dyn Codec>::new().hints(&double))
        .unwrap();
    assert!(Arc::ptr_eq(&first, &second));
    assert_eq!(built.load(Ordering::SeqCst), 1);
    assert_eq!(registry.len::<dyn Codec>(), 1);
}

#[test]
fn test_plain_registry_reports_not_found() {
    let mut registry = Registry::builder()
        .declare_service::<dyn Codec>(Arc::new(FastCodec { precision: "single" }))
        .build();
    let double = precision("double");
    let err = registry
        .lookup_one(Query::<dyn Codec>::new().hints(&double))
        .unwrap_err();
    assert!(err.is_not_found());
}

#[test]
fn test_cache_entry_dropped_with_last_user() {
    let built = Arc::new(AtomicUsize::new(0));
    let mut registry = codecs(built.clone());
    let double = precision("double");

    let codec = registry
        .lookup_one(Query::<dyn Codec>::new().hints(&double))
        .unwrap();
    assert_eq!(registry.cached_len::<dyn Codec>(), 1);
    drop(codec);
    assert_eq!(registry.cached_len::<dyn Codec>(), 0);

    registry
        .lookup_one(Query::<dyn Codec>::new().hints(&double))
        .unwrap();
    assert_eq!(built.load(Ordering::SeqCst), 2);
}

#[test]
fn test_clear_cache_forces_construction() {
    let built = Arc::new(AtomicUsize::new(0));
    let mut registry = codecs(built.clone());
    let double = precision("double");

    let first = registry
        .lookup_one(Query::<dyn Codec>::new().hints(&double))
        .unwrap();
    registry.clear_cache();
    let second = registry
        .lookup_one(Query::<dyn Codec>::new().hints(&double))
        .unwrap();
    assert!(!Arc::ptr_eq(&first, &second));
    assert_eq!(built.load(Ordering::SeqCst), 2);
}

#[test]
fn test_key_names_implementation_type() {
    let built = Arc::new(AtomicUsize::new(0));
    let mut registry = codecs(built.clone());

    let hints = HintSet::empty()
        .with(&CODEC, ImplType::of::<PreciseCodec>())
        .unwrap();
    let codec = registry
        .lookup_one(Query::<dyn Codec>::new().hints(&hints).key(&CODEC))
        .unwrap();
    assert_eq!(codec.precision(), "double");
    assert_eq!(built.load(Ordering::SeqCst), 1);
}

#[test]
fn test_key_names_instance() {
    let mut registry = codecs(Arc::default());
    let mine: Arc<dyn Codec> = Arc::new(FastCodec { precision: "double" });
    let hints = HintSet::empty()
        .with(&CODEC, Service::new::<dyn Codec>(mine.clone()))
        .unwrap();
    let codec = registry
        .lookup_one(Query::<dyn Codec>::new().hints(&hints).key(&CODEC))
        .unwrap();
    assert!(Arc::ptr_eq(&codec, &mine));
}

#[test]
fn test_recursive_lookup_from_constructor() {
    let mut registry = Registry::builder().category::<dyn Codec>().build_dynamic();
    registry
        .register_constructor(Constructor::<dyn Codec>::new::<PreciseCodec>().hinted(
            |hints, resolver| {
                let inner = resolver.get::<dyn Codec>()?;
                drop(inner);
                Ok(Arc::new(PreciseCodec::new(hints)))
            },
        ))
        .unwrap();

    let err = registry.get::<dyn Codec>().unwrap_err();
    assert!(matches!(err, RegistryError::RecursiveLookup { .. }));
    assert!(err.to_string().contains("Codec"));
}
