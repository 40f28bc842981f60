//! Environment source: variable name derivation and application.

use crate::StrataConfig;
use crate::coerce;
use crate::error::StrataError;
use crate::option::{Kind, NESTING_SEPARATOR, OptionTree};
use crate::resolver::apply_value;

/// Compute the environment variable name for an option.
///
/// The prefix is used verbatim (no underscore is inserted); the `full_id` is
/// uppercased with the nesting separator replaced by an underscore.
pub(crate) fn variable_name(prefix: &str, full_id: &str) -> String {
    let mut name = String::with_capacity(prefix.len() + full_id.len());
    name.push_str(prefix);
    for ch in full_id.chars() {
        name.push(if ch == NESTING_SEPARATOR {
            '_'
        } else {
            ch.to_ascii_uppercase()
        });
    }
    name
}

/// Look up an option's environment value.
///
/// A variable that is unset, or set to the empty string, counts as absent.
pub(crate) fn lookup(prefix: &str, full_id: &str) -> Option<String> {
    std::env::var(variable_name(prefix, full_id))
        .ok()
        .filter(|value| !value.is_empty())
}

/// Apply environment values to every leaf that has one.
pub(crate) fn apply<C: StrataConfig>(
    prefix: &str,
    tree: &mut OptionTree,
    target: &mut C,
) -> Result<(), StrataError> {
    for idx in tree.leaf_indices() {
        let (full_id, kind) = {
            let node = tree.node(idx);
            (node.full_id.clone(), node.spec.kind)
        };
        let Some(raw) = lookup(prefix, &full_id) else {
            continue;
        };
        let coerced = match kind {
            Kind::Scalar(ty) => coerce::parse_scalar(&raw, ty),
            Kind::Sequence(ty) => coerce::parse_sequence(&raw, ty),
            Kind::Group => continue,
        }
        .map_err(|source| StrataError::Coerce {
            key: full_id,
            source,
        })?;
        apply_value(tree, idx, target, coerced, "environment")?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn names_are_uppercased_with_underscored_nesting() {
        assert_eq!(variable_name("", "port"), "PORT");
        assert_eq!(variable_name("", "db.host"), "DB_HOST");
        assert_eq!(variable_name("APP_", "db.host"), "APP_DB_HOST");
        assert_eq!(variable_name("APP", "max_conns"), "APPMAX_CONNS");
    }
}
