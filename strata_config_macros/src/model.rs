//! Field classification and code generation.
//!
//! Field types are inspected shallowly: the final path segment decides
//! whether a field is a scalar, a sequence or a nested group. Anything else —
//! maps, tuples, references, `Option` — is rejected with a compile error.

use std::collections::HashSet;

use proc_macro2::TokenStream;
use quote::quote;
use syn::punctuated::Punctuated;
use syn::{Field, GenericArgument, Ident, PathArguments, Token, Type};

use crate::parse::{FieldAttrs, parse_field_attrs};

#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub(crate) enum ScalarTy {
    Bool,
    Int,
    Uint,
    Float,
    Str,
    Duration,
}

impl ScalarTy {
    fn tokens(self) -> TokenStream {
        match self {
            Self::Bool => quote!(::strata_config::Scalar::Bool),
            Self::Int => quote!(::strata_config::Scalar::Int),
            Self::Uint => quote!(::strata_config::Scalar::Uint),
            Self::Float => quote!(::strata_config::Scalar::Float),
            Self::Str => quote!(::strata_config::Scalar::Str),
            Self::Duration => quote!(::strata_config::Scalar::Duration),
        }
    }
}

#[derive(Debug)]
pub(crate) enum FieldKind {
    Scalar(ScalarTy),
    Sequence(ScalarTy),
    /// Nested struct; the type itself must derive `StrataConfig`.
    Group(Type),
}

#[derive(Debug)]
pub(crate) struct FieldModel {
    ident: Ident,
    id: String,
    attrs: FieldAttrs,
    kind: FieldKind,
}

/// Classify every field and derive its id, rejecting structural faults.
pub(crate) fn collect(fields: &Punctuated<Field, Token![,]>) -> syn::Result<Vec<FieldModel>> {
    let mut out = Vec::with_capacity(fields.len());
    let mut seen_ids = HashSet::new();
    let mut seen_shorts = HashSet::new();

    for field in fields {
        let ident = field.ident.clone().expect("named field");
        let attrs = parse_field_attrs(field)?;
        let kind = classify(&field.ty, field)?;

        if matches!(kind, FieldKind::Group(_)) {
            if attrs.default.is_some() {
                return Err(syn::Error::new_spanned(
                    field,
                    "`default` is not allowed on nested configuration structs",
                ));
            }
            if attrs.short.is_some() {
                return Err(syn::Error::new_spanned(
                    field,
                    "`short` is not allowed on nested configuration structs",
                ));
            }
        }

        let id = attrs
            .id
            .clone()
            .unwrap_or_else(|| ident.to_string().to_lowercase());
        if !seen_ids.insert(id.clone()) {
            return Err(syn::Error::new_spanned(
                field,
                format!("duplicate option id '{id}'"),
            ));
        }
        if let Some(short) = attrs.short {
            if !seen_shorts.insert(short) {
                return Err(syn::Error::new_spanned(
                    field,
                    format!("duplicate shorthand '{short}'"),
                ));
            }
        }

        out.push(FieldModel {
            ident,
            id,
            attrs,
            kind,
        });
    }
    Ok(out)
}

fn classify(ty: &Type, field: &Field) -> syn::Result<FieldKind> {
    if let Some(scalar) = scalar_ty(ty) {
        return Ok(FieldKind::Scalar(scalar));
    }
    if let Some(elem) = vec_inner(ty) {
        let Some(scalar) = scalar_ty(elem) else {
            return Err(syn::Error::new_spanned(
                field,
                "sequence options must hold scalar elements",
            ));
        };
        return Ok(FieldKind::Sequence(scalar));
    }

    let Type::Path(path) = ty else {
        return Err(syn::Error::new_spanned(
            field,
            "unsupported field type for a configuration option",
        ));
    };
    let last = path
        .path
        .segments
        .last()
        .ok_or_else(|| syn::Error::new_spanned(field, "unsupported field type"))?;
    match last.ident.to_string().as_str() {
        "Option" => Err(syn::Error::new_spanned(
            field,
            "optional fields are not supported; declare a default instead",
        )),
        "HashMap" | "BTreeMap" => Err(syn::Error::new_spanned(
            field,
            "map fields are not supported as configuration options",
        )),
        _ => Ok(FieldKind::Group(ty.clone())),
    }
}

/// Match a scalar type by its final path segment.
fn scalar_ty(ty: &Type) -> Option<ScalarTy> {
    let Type::Path(p) = ty else {
        return None;
    };
    let last = p.path.segments.last()?;
    if !last.arguments.is_empty() {
        return None;
    }
    match last.ident.to_string().as_str() {
        "bool" => Some(ScalarTy::Bool),
        "i8" | "i16" | "i32" | "i64" | "isize" => Some(ScalarTy::Int),
        "u8" | "u16" | "u32" | "u64" | "usize" => Some(ScalarTy::Uint),
        "f32" | "f64" => Some(ScalarTy::Float),
        "String" => Some(ScalarTy::Str),
        "Duration" => Some(ScalarTy::Duration),
        _ => None,
    }
}

/// Extract the element type if `ty` is `Vec<T>`, matching plain and
/// fully-qualified forms. The check is shallow and not recursive.
fn vec_inner(ty: &Type) -> Option<&Type> {
    let Type::Path(p) = ty else {
        return None;
    };
    let last = p.path.segments.last()?;
    if last.ident != "Vec" {
        return None;
    }
    let PathArguments::AngleBracketed(args) = &last.arguments else {
        return None;
    };
    match args.args.first()? {
        GenericArgument::Type(inner) => Some(inner),
        _ => None,
    }
}

/// Emit one `OptionSpec` literal for the `OPTIONS` const.
pub(crate) fn spec_tokens(model: &FieldModel) -> TokenStream {
    let id = &model.id;
    let short = match model.attrs.short {
        Some(c) => quote!(::core::option::Option::Some(#c)),
        None => quote!(::core::option::Option::None),
    };
    let help = model.attrs.desc.clone().unwrap_or_default();
    let default = match &model.attrs.default {
        Some(d) => quote!(::core::option::Option::Some(#d)),
        None => quote!(::core::option::Option::None),
    };
    let (kind, children) = match &model.kind {
        FieldKind::Scalar(scalar) => {
            let ty = scalar.tokens();
            (quote!(::strata_config::Kind::Scalar(#ty)), quote!(&[]))
        }
        FieldKind::Sequence(scalar) => {
            let ty = scalar.tokens();
            (quote!(::strata_config::Kind::Sequence(#ty)), quote!(&[]))
        }
        FieldKind::Group(ty) => (
            quote!(::strata_config::Kind::Group),
            quote!(<#ty as ::strata_config::StrataConfig>::OPTIONS),
        ),
    };
    quote! {
        ::strata_config::OptionSpec {
            id: #id,
            short: #short,
            help: #help,
            default: #default,
            kind: #kind,
            children: #children,
        }
    }
}

/// Emit one match arm of the generated `assign` implementation.
pub(crate) fn assign_arm(model: &FieldModel) -> TokenStream {
    let id = &model.id;
    let ident = &model.ident;
    match &model.kind {
        FieldKind::Group(_) => quote! {
            [#id, rest @ ..] => ::strata_config::StrataConfig::assign(&mut self.#ident, rest, value),
        },
        _ => quote! {
            [#id] => {
                self.#ident = ::strata_config::FromValue::from_value(value)?;
                ::core::result::Result::Ok(())
            }
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use syn::{DeriveInput, parse_quote};

    fn fields_of(input: DeriveInput) -> Punctuated<Field, Token![,]> {
        match input.data {
            syn::Data::Struct(syn::DataStruct {
                fields: syn::Fields::Named(named),
                ..
            }) => named.named,
            _ => panic!("expected a struct with named fields"),
        }
    }

    #[test]
    fn scalars_sequences_and_groups_are_classified() {
        let fields = fields_of(parse_quote! {
            struct Config {
                verbose: bool,
                port: u16,
                offset: i32,
                rate: f64,
                name: String,
                timeout: std::time::Duration,
                hosts: Vec<String>,
                database: DbConfig,
            }
        });
        let models = collect(&fields).expect("fields must classify");
        assert!(matches!(models[0].kind, FieldKind::Scalar(ScalarTy::Bool)));
        assert!(matches!(models[1].kind, FieldKind::Scalar(ScalarTy::Uint)));
        assert!(matches!(models[2].kind, FieldKind::Scalar(ScalarTy::Int)));
        assert!(matches!(models[3].kind, FieldKind::Scalar(ScalarTy::Float)));
        assert!(matches!(models[4].kind, FieldKind::Scalar(ScalarTy::Str)));
        assert!(matches!(
            models[5].kind,
            FieldKind::Scalar(ScalarTy::Duration)
        ));
        assert!(matches!(
            models[6].kind,
            FieldKind::Sequence(ScalarTy::Str)
        ));
        assert!(matches!(models[7].kind, FieldKind::Group(_)));
    }

    #[test]
    fn ids_default_to_the_lowercased_field_name() {
        let fields = fields_of(parse_quote! {
            struct Config {
                max_conns: u32,
                #[strata(id = "db")]
                database: DbConfig,
            }
        });
        let models = collect(&fields).expect("fields must classify");
        assert_eq!(models[0].id, "max_conns");
        assert_eq!(models[1].id, "db");
    }

    #[test]
    fn duplicate_ids_are_compile_errors() {
        let fields = fields_of(parse_quote! {
            struct Config {
                port: u16,
                #[strata(id = "port")]
                other: u16,
            }
        });
        let err = collect(&fields).unwrap_err();
        assert!(err.to_string().contains("duplicate option id 'port'"));
    }

    #[test]
    fn duplicate_shorthands_are_compile_errors() {
        let fields = fields_of(parse_quote! {
            struct Config {
                #[strata(short = 'p')]
                port: u16,
                #[strata(short = 'p')]
                peers: u16,
            }
        });
        assert!(collect(&fields).is_err());
    }

    #[test]
    fn unsupported_types_are_compile_errors() {
        let option_field = fields_of(parse_quote! {
            struct Config {
                port: Option<u16>,
            }
        });
        assert!(collect(&option_field).is_err());

        let map_field = fields_of(parse_quote! {
            struct Config {
                labels: std::collections::HashMap<String, String>,
            }
        });
        assert!(collect(&map_field).is_err());

        let nested_vec = fields_of(parse_quote! {
            struct Config {
                matrix: Vec<Vec<u32>>,
            }
        });
        assert!(collect(&nested_vec).is_err());
    }

    #[test]
    fn group_metadata_is_rejected() {
        let with_default = fields_of(parse_quote! {
            struct Config {
                #[strata(default = "x")]
                database: DbConfig,
            }
        });
        assert!(collect(&with_default).is_err());

        let with_short = fields_of(parse_quote! {
            struct Config {
                #[strata(short = 'd')]
                database: DbConfig,
            }
        });
        assert!(collect(&with_short).is_err());
    }
}
