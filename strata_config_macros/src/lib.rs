//! Procedural macros for `strata_config`.
//!
//! The [`StrataConfig`] derive turns a struct of configuration fields into
//! the static option metadata and the path-addressed assignment code the
//! runtime engine drives. All structural validation that is statically
//! decidable — duplicate sibling ids, unsupported field types, metadata on
//! nested groups — is rejected here, at compile time.

use proc_macro::TokenStream;
use quote::quote;
use syn::{Data, DeriveInput, Fields, parse_macro_input};

mod model;
mod parse;

/// Derive macro for `strata_config::StrataConfig`.
///
/// Recognised `#[strata(...)]` field attributes: `id`, `default`, `short`
/// and `desc`. Field types may be scalars (`bool`, integers, floats,
/// `String`, `Duration`), `Vec`s of scalars, or further structs deriving
/// `StrataConfig`, which become nested option groups.
#[proc_macro_derive(StrataConfig, attributes(strata))]
pub fn derive_strata_config(input: TokenStream) -> TokenStream {
    let input = parse_macro_input!(input as DeriveInput);
    match expand(&input) {
        Ok(tokens) => tokens.into(),
        Err(err) => err.to_compile_error().into(),
    }
}

fn expand(input: &DeriveInput) -> syn::Result<proc_macro2::TokenStream> {
    let ident = &input.ident;
    if !input.generics.params.is_empty() {
        return Err(syn::Error::new_spanned(
            &input.generics,
            "StrataConfig cannot be derived for generic structs",
        ));
    }

    let fields = named_fields(input)?;
    let options = model::collect(fields)?;

    let spec_entries = options.iter().map(model::spec_tokens);
    let assign_arms = options.iter().map(model::assign_arm);

    Ok(quote! {
        #[automatically_derived]
        impl ::strata_config::StrataConfig for #ident {
            const OPTIONS: &'static [::strata_config::OptionSpec] = &[
                #( #spec_entries ),*
            ];

            fn assign(
                &mut self,
                path: &[&str],
                value: ::strata_config::Value,
            ) -> ::core::result::Result<(), ::strata_config::AssignError> {
                match path {
                    #( #assign_arms )*
                    _ => ::core::result::Result::Err(
                        ::strata_config::AssignError::unknown_path(path),
                    ),
                }
            }
        }
    })
}

fn named_fields(
    input: &DeriveInput,
) -> syn::Result<&syn::punctuated::Punctuated<syn::Field, syn::Token![,]>> {
    match &input.data {
        Data::Struct(data) => match &data.fields {
            Fields::Named(named) => Ok(&named.named),
            _ => Err(syn::Error::new_spanned(
                &data.fields,
                "StrataConfig requires named fields",
            )),
        },
        _ => Err(syn::Error::new_spanned(
            &input.ident,
            "StrataConfig can only be derived for structs",
        )),
    }
}
