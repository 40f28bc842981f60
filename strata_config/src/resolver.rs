//! The staged resolution pipeline.
//!
//! One linear, synchronous pass: build the option tree, apply defaults, then
//! let each enabled source overwrite in fixed order — file, environment,
//! flags. A source only ever touches options it actually found a value for;
//! absence never resets anything.

use crate::StrataConfig;
use crate::coerce;
use crate::env;
use crate::error::StrataError;
use crate::file;
use crate::flags;
use crate::loader::Loader;
use crate::option::{Kind, OptionTree};
use crate::value::Value;

/// Write one coerced value through to the target struct and record it on the
/// option node.
pub(crate) fn apply_value<C: StrataConfig>(
    tree: &mut OptionTree,
    idx: usize,
    target: &mut C,
    value: Value,
    origin: &'static str,
) -> Result<(), StrataError> {
    let (path, full_id, overwrites) = {
        let node = tree.node(idx);
        (node.path.clone(), node.full_id.clone(), node.current.is_some())
    };
    target
        .assign(&path, value.clone())
        .map_err(|source| StrataError::Assign {
            key: full_id.clone(),
            source,
        })?;
    if overwrites {
        tracing::debug!(option = %full_id, origin, "overwriting value from an earlier stage");
    } else {
        tracing::debug!(option = %full_id, origin, "value applied");
    }
    tree.set_current(idx, value);
    Ok(())
}

/// Parse and assign every declared default.
///
/// # Panics
///
/// A default literal that does not parse against its option's declared type
/// is a fault in the configuration struct itself, not bad user input, and
/// panics with the option's `full_id` and the offending literal.
fn apply_defaults<C: StrataConfig>(tree: &mut OptionTree, target: &mut C) {
    for idx in tree.leaf_indices() {
        let (full_id, kind, default) = {
            let node = tree.node(idx);
            (node.full_id.clone(), node.spec.kind, node.spec.default)
        };
        let Some(literal) = default else {
            continue;
        };
        let parsed = match kind {
            Kind::Scalar(ty) => coerce::parse_scalar(literal, ty),
            Kind::Sequence(ty) => coerce::parse_sequence(literal, ty),
            Kind::Group => continue,
        };
        let value = match parsed {
            Ok(value) => value,
            Err(err) => panic!("invalid default value '{literal}' for option '{full_id}': {err}"),
        };
        if let Err(err) = apply_value(tree, idx, target, value, "default") {
            panic!("failed to apply default for option '{full_id}': {err}");
        }
    }
}

/// Run the full pipeline for one resolution call.
///
/// `file_content` carries explicitly supplied file bytes; when present, file
/// discovery is bypassed entirely.
pub(crate) fn run<C: StrataConfig>(
    loader: &Loader,
    target: &mut C,
    file_content: Option<&[u8]>,
) -> Result<(), StrataError> {
    let mut tree = OptionTree::build(C::OPTIONS);
    apply_defaults(&mut tree, target);

    // Flags are parsed before the file stage so the config-file-path flag is
    // available, but applied after every other source.
    let matches = if loader.flags {
        Some(flags::parse(loader, &tree)?)
    } else {
        None
    };

    if let Some(bytes) = file_content {
        let decoded = file::decode(loader, None, bytes)?;
        file::apply_decoded(&decoded, &mut tree, target, None)?;
    } else if loader.file {
        match file::discover(loader, &tree, matches.as_ref())? {
            Some(found) => file::apply(loader, &found, &mut tree, target)?,
            None => tracing::debug!("no config file to read, skipping file source"),
        }
    }

    if loader.env {
        env::apply(&loader.env_prefix, &mut tree, target)?;
    }

    if let Some(matches) = &matches {
        flags::apply(matches, &mut tree, target)?;
    }

    Ok(())
}
