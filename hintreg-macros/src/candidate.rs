//! `#[derive(Candidate)]` expansion.

use proc_macro2::TokenStream;
use quote::{quote, quote_spanned};
use syn::{
    Data, DeriveInput, Expr, Ident, LitStr, Member, Token, Type,
    parse::{Parse, ParseStream},
    spanned::Spanned,
};

/// Arguments of `#[candidate(...)]`.
#[derive(Default)]
struct CandidateArgs {
    vendor: Option<LitStr>,
}

impl Parse for CandidateArgs {
    fn parse(input: ParseStream) -> syn::Result<Self> {
        let mut vendor = None;

        while !input.is_empty() {
            let ident: Ident = input.parse()?;
            input.parse::<Token![=]>()?;

            match ident.to_string().as_str() {
                "vendor" => {
                    vendor = Some(input.parse()?);
                }
                other => {
                    return Err(syn::Error::new(
                        ident.span(),
                        format!("unknown candidate attribute: {}", other),
                    ));
                }
            }

            if input.peek(Token![,]) {
                input.parse::<Token![,]>()?;
            }
        }

        Ok(CandidateArgs { vendor })
    }
}

/// Arguments of `#[hint(KEY, service = Category)]`.
struct HintArgs {
    key: Expr,
    service: Option<Type>,
}

impl Parse for HintArgs {
    fn parse(input: ParseStream) -> syn::Result<Self> {
        let key: Expr = input.parse()?;
        let mut service = None;

        while input.peek(Token![,]) {
            input.parse::<Token![,]>()?;
            if input.is_empty() {
                break;
            }
            let ident: Ident = input.parse()?;
            input.parse::<Token![=]>()?;

            match ident.to_string().as_str() {
                "service" => {
                    service = Some(input.parse()?);
                }
                other => {
                    return Err(syn::Error::new(
                        ident.span(),
                        format!("unknown hint attribute: {}", other),
                    ));
                }
            }
        }

        Ok(HintArgs { key, service })
    }
}

pub(crate) fn expand(input: DeriveInput) -> syn::Result<TokenStream> {
    let name = &input.ident;
    let (impl_generics, ty_generics, where_clause) = input.generics.split_for_impl();

    let mut args = CandidateArgs::default();
    for attr in input.attrs.iter().filter(|a| a.path().is_ident("candidate")) {
        let parsed: CandidateArgs = attr.parse_args()?;
        if parsed.vendor.is_some() {
            args.vendor = parsed.vendor;
        }
    }

    let fields = match &input.data {
        Data::Struct(data) => Some(&data.fields),
        Data::Enum(_) | Data::Union(_) => None,
    };

    let mut inserts = Vec::new();
    for (index, field) in fields.into_iter().flatten().enumerate() {
        let member = match &field.ident {
            Some(ident) => Member::Named(ident.clone()),
            None => Member::Unnamed(index.into()),
        };
        for attr in field.attrs.iter().filter(|a| a.path().is_ident("hint")) {
            let HintArgs { key, service } = attr.parse_args()?;
            let value = match service {
                Some(category) => quote_spanned! {field.ty.span()=>
                    ::hintreg::HintValue::from(::hintreg::Service::new::<#category>(
                        ::core::clone::Clone::clone(&self.#member),
                    ))
                },
                None => quote_spanned! {field.ty.span()=>
                    ::hintreg::HintValue::from(::core::clone::Clone::clone(&self.#member))
                },
            };
            inserts.push(quote! {
                {
                    let key: &::hintreg::HintKey = &(#key);
                    hints.extend(&::hintreg::HintSet::from_valid_pairs(
                        ::core::iter::once((key, #value)),
                    ));
                }
            });
        }
    }

    let hints_fn = if inserts.is_empty() {
        None
    } else {
        Some(quote! {
            fn implementation_hints(&self) -> ::hintreg::HintSet {
                let mut hints = ::hintreg::HintSet::empty();
                #(#inserts)*
                hints
            }
        })
    };
    let vendor_fn = vendor_fn(&args);

    Ok(quote! {
        impl #impl_generics ::hintreg::Candidate for #name #ty_generics #where_clause {
            #hints_fn
            #vendor_fn
        }
    })
}

fn vendor_fn(args: &CandidateArgs) -> Option<TokenStream> {
    args.vendor.as_ref().map(|vendor| {
        quote! {
            fn vendor(&self) -> ::core::option::Option<&str> {
                ::core::option::Option::Some(#vendor)
            }
        }
    })
}
