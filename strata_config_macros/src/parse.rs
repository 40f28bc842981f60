//! `#[strata(...)]` attribute parsing.

use syn::meta::ParseNestedMeta;
use syn::{Lit, LitStr};

/// Field-level metadata recognised by the derive.
#[derive(Default, Clone, Debug)]
pub(crate) struct FieldAttrs {
    /// Overrides the id derived from the field name.
    pub id: Option<String>,
    /// Default literal, parsed against the field's type at load time.
    pub default: Option<String>,
    /// Single-character flag alias.
    pub short: Option<char>,
    /// Help text for the generated flag.
    pub desc: Option<String>,
}

pub(crate) fn parse_field_attrs(field: &syn::Field) -> syn::Result<FieldAttrs> {
    let mut out = FieldAttrs::default();
    for attr in field.attrs.iter().filter(|a| a.path().is_ident("strata")) {
        attr.parse_nested_meta(|meta| {
            match meta.path.get_ident().map(ToString::to_string).as_deref() {
                Some("id") => {
                    out.id = Some(lit_str(&meta, "id")?.value());
                    Ok(())
                }
                Some("default") => {
                    out.default = Some(lit_str(&meta, "default")?.value());
                    Ok(())
                }
                Some("short") => {
                    out.short = Some(lit_char(&meta, "short")?);
                    Ok(())
                }
                Some("desc") => {
                    out.desc = Some(lit_str(&meta, "desc")?.value());
                    Ok(())
                }
                _ => Err(meta.error(
                    "unknown strata attribute; expected `id`, `default`, `short` or `desc`",
                )),
            }
        })?;
    }

    if let Some(id) = &out.id {
        if id.is_empty() || id.contains('.') {
            return Err(syn::Error::new_spanned(
                field,
                "option ids must be non-empty and must not contain '.'",
            ));
        }
    }
    Ok(out)
}

/// Parses a string literal from a field attribute.
fn lit_str(meta: &ParseNestedMeta, key: &str) -> syn::Result<LitStr> {
    match meta.value()?.parse::<Lit>()? {
        Lit::Str(s) => Ok(s),
        other => Err(syn::Error::new(
            other.span(),
            format!("{key} must be a string"),
        )),
    }
}

/// Parses a character literal from a field attribute.
fn lit_char(meta: &ParseNestedMeta, key: &str) -> syn::Result<char> {
    match meta.value()?.parse::<Lit>()? {
        Lit::Char(c) => Ok(c.value()),
        other => Err(syn::Error::new(
            other.span(),
            format!("{key} must be a character"),
        )),
    }
}
