//! Link-time candidate declarations collected with `inventory`.

use crate::resolver::Resolver;
use hintreg_core::{BoxError, Category, Service};

/// A candidate declared anywhere in the program with [`declare_candidate!`].
///
/// Registries built with `include_declared(true)` (the default) run the
/// matching declarations when a category is first scanned.
///
/// [`declare_candidate!`]: crate::declare_candidate
pub struct Declaration {
    /// Where the declaration comes from, for diagnostics.
    pub name: &'static str,
    /// The category the built service is bound to.
    pub category: fn() -> Category,
    /// Builds the service.
    pub build: fn(&mut Resolver<'_>) -> Result<Service, BoxError>,
}

inventory::collect!(Declaration);

/// All link-time declarations for `category`.
pub fn declarations_for(category: Category) -> impl Iterator<Item = &'static Declaration> {
    inventory::iter::<Declaration>
        .into_iter()
        .filter(move |declaration| (declaration.category)() == category)
}

/// Declares a candidate for a category at link time.
///
/// The expression is evaluated each time a registry scans the category.
///
/// # Example
///
/// ```rust,ignore
/// declare_candidate!(dyn Greeter, English::new());
/// ```
#[macro_export]
macro_rules! declare_candidate {
    ($category:ty, $candidate:expr) => {
        $crate::inventory::submit! {
            $crate::discovery::Declaration {
                name: concat!(module_path!(), "::", stringify!($candidate)),
                category: || $crate::hintreg_core::Category::of::<$category>(),
                build: |_resolver| {
                    let instance: ::std::sync::Arc<$category> = ::std::sync::Arc::new($candidate);
                    Ok($crate::hintreg_core::Service::new::<$category>(instance))
                },
            }
        }
    };
}
