mod common;

use common::{
    Codec, EnglishGreeter, FastCodec, FrenchGreeter, Greeter, OfflineGreeter, PreciseCodec,
    WrappingCodec, precision,
};
use hintreg::{ImplType, Query, Registry, RegistryError};
use std::{error::Error as _, sync::Arc};

fn greeters() -> Registry {
    Registry::builder()
        .declare_service::<dyn Greeter>(Arc::new(EnglishGreeter))
        .declare_service::<dyn Greeter>(Arc::new(FrenchGreeter))
        .build()
}

#[test]
fn test_french_preferred_over_english() {
    let mut registry = greeters();
    assert_eq!(registry.get::<dyn Greeter>().unwrap().greet("Ada"), "Hello Ada");

    let changed = registry
        .set_implementation_ordering::<dyn Greeter>(
            ImplType::of::<FrenchGreeter>(),
            ImplType::of::<EnglishGreeter>(),
        )
        .unwrap();
    assert!(changed);

    let greeter = registry.lookup_one(Query::<dyn Greeter>::new()).unwrap();
    assert_eq!(greeter.greet("Ada"), "Bonjour Ada");
}

#[test]
fn test_preferred_candidate_wins_whenever_both_accepted() {
    let mut registry = greeters();
    registry
        .set_vendor_ordering::<dyn Greeter>("francophonie", "commonwealth")
        .unwrap();

    let unfiltered = registry.lookup_one(Query::<dyn Greeter>::new()).unwrap();
    assert_eq!(unfiltered.greet("Ada"), "Bonjour Ada");

    let filtered = registry
        .lookup_one(Query::<dyn Greeter>::new().filter(&|g| g.greet("x").len() > 1))
        .unwrap();
    assert_eq!(filtered.greet("Ada"), "Bonjour Ada");

    let all: Vec<_> = registry
        .lookup(Query::<dyn Greeter>::new())
        .unwrap()
        .map(|g| g.greet("Ada"))
        .collect();
    assert_eq!(all, vec!["Bonjour Ada", "Hello Ada"]);
}

#[test]
fn test_lookup_contains_every_compatible_candidate() {
    let mut registry = Registry::builder().category::<dyn Codec>().build();
    registry.register::<dyn Codec>(Arc::new(FastCodec { precision: "single" })).unwrap();
    registry.register::<dyn Codec>(Arc::new(FastCodec { precision: "double" })).unwrap();
    registry
        .register::<dyn Codec>(Arc::new(PreciseCodec::new(&precision("double"))))
        .unwrap();

    let hints = precision("double");
    let found: Vec<String> = registry
        .lookup(Query::<dyn Codec>::new().hints(&hints))
        .unwrap()
        .map(|codec| codec.precision().to_string())
        .collect();
    assert_eq!(found, vec!["double", "double"]);

    let all = registry.lookup(Query::<dyn Codec>::new()).unwrap();
    assert_eq!(all.len(), 3);
}

#[test]
fn test_hint_mismatch_is_not_found() {
    let mut registry = Registry::builder()
        .declare_service::<dyn Codec>(Arc::new(FastCodec { precision: "single" }))
        .build();
    let hints = precision("double");
    let err = registry
        .lookup_one(Query::<dyn Codec>::new().hints(&hints))
        .unwrap_err();
    assert!(err.is_not_found());
}

#[test]
fn test_compatibility_follows_dependencies() {
    let mut registry = Registry::builder().category::<dyn Codec>().build();
    registry
        .register::<dyn Codec>(Arc::new(WrappingCodec {
            inner: Arc::new(FastCodec { precision: "single" }),
        }))
        .unwrap();
    registry
        .register::<dyn Codec>(Arc::new(WrappingCodec {
            inner: Arc::new(FastCodec { precision: "double" }),
        }))
        .unwrap();

    let hints = precision("double");
    let codec = registry
        .lookup_one(Query::<dyn Codec>::new().hints(&hints))
        .unwrap();
    assert_eq!(codec.precision(), "double");
}

#[test]
fn test_structurally_equal_candidates_register_once() {
    let mut registry = Registry::builder().category::<dyn Codec>().build();
    let wrap = |precision| -> Arc<dyn Codec> {
        Arc::new(WrappingCodec {
            inner: Arc::new(FastCodec { precision }),
        })
    };
    assert!(registry.register(wrap("single")).unwrap());
    assert!(!registry.register(wrap("single")).unwrap());
    assert_eq!(registry.len::<dyn Codec>(), 1);

    assert!(registry.register(wrap("double")).unwrap());
    assert_eq!(registry.len::<dyn Codec>(), 2);
}

#[test]
fn test_unavailable_candidate_is_the_cause() {
    let mut registry = Registry::builder()
        .declare_service::<dyn Greeter>(Arc::new(OfflineGreeter))
        .build();
    let err = registry.get::<dyn Greeter>().unwrap_err();

    let RegistryError::NotFound { cause, .. } = &err else {
        panic!("expected NotFound, got {err:?}");
    };
    assert!(cause.is_some());
    let report = err.source().unwrap();
    assert!(report.to_string().contains("phrasebook not installed"));
    assert!(report.source().is_some());
}

#[test]
fn test_unavailable_candidate_is_skipped() {
    let mut registry = Registry::builder()
        .declare_service::<dyn Greeter>(Arc::new(OfflineGreeter))
        .declare_service::<dyn Greeter>(Arc::new(EnglishGreeter))
        .build();
    let greeters: Vec<_> = registry.lookup(Query::<dyn Greeter>::new()).unwrap().collect();
    assert_eq!(greeters.len(), 1);
    assert_eq!(greeters[0].greet("Ada"), "Hello Ada");
}
