use proc_macro::TokenStream;
use syn::{DeriveInput, parse_macro_input};

mod candidate;

/// Derive macro implementing `hintreg::Candidate`.
///
/// # Attributes
///
/// - `#[candidate(vendor = "...")]` on the type sets [`Candidate::vendor`].
/// - `#[hint(KEY)]` on a field reports the field as an implementation hint
///   under `KEY`, an expression evaluating to a `HintKey` or to something
///   dereferencing to one. The field is cloned and converted with
///   `HintValue::from`.
/// - `#[hint(KEY, service = dyn Category)]` reports an `Arc<dyn Category>`
///   field as a dependency candidate.
///
/// # Example
///
/// ```rust,ignore
/// #[derive(Candidate)]
/// #[candidate(vendor = "acme")]
/// struct WrappingCodec {
///     #[hint(PRECISION)]
///     precision: String,
///     #[hint(INNER, service = dyn Codec)]
///     inner: Arc<dyn Codec>,
/// }
/// ```
///
/// [`Candidate::vendor`]: https://docs.rs/hintreg/latest/hintreg/trait.Candidate.html#method.vendor
#[proc_macro_derive(Candidate, attributes(candidate, hint))]
pub fn derive_candidate(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    candidate::expand(input)
        .unwrap_or_else(syn::Error::into_compile_error)
        .into()
}
