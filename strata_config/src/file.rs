//! File source: discovery, decoding and application of config-file values.
//!
//! The file source consumes a generic decoded value tree; the decoders
//! themselves are pluggable functions. Built-ins cover YAML, TOML and JSON.

use std::path::{Path, PathBuf};

use serde_json::Value as Decoded;

use crate::StrataConfig;
use crate::coerce::{self, CoerceError};
use crate::env;
use crate::error::StrataError;
use crate::flags;
use crate::loader::Loader;
use crate::option::{Kind, OptionTree, Scalar};
use crate::resolver::apply_value;

/// Pluggable decode function turning raw file bytes into a generic value
/// tree. The returned value must be a mapping at the top level.
pub type FileDecoder = fn(&[u8]) -> Result<Decoded, Box<dyn std::error::Error + Send + Sync>>;

/// Decode YAML file contents.
///
/// # Errors
///
/// Returns the parser's error when the bytes are not a YAML mapping.
pub fn decode_yaml(bytes: &[u8]) -> Result<Decoded, Box<dyn std::error::Error + Send + Sync>> {
    let map: serde_json::Map<String, Decoded> = serde_yaml::from_slice(bytes)?;
    Ok(Decoded::Object(map))
}

/// Decode TOML file contents.
///
/// # Errors
///
/// Returns the parser's error when the bytes are not a TOML document.
pub fn decode_toml(bytes: &[u8]) -> Result<Decoded, Box<dyn std::error::Error + Send + Sync>> {
    let text = std::str::from_utf8(bytes)?;
    let map: serde_json::Map<String, Decoded> = toml::from_str(text)?;
    Ok(Decoded::Object(map))
}

/// Decode JSON file contents.
///
/// # Errors
///
/// Returns the parser's error when the bytes are not a JSON object.
pub fn decode_json(bytes: &[u8]) -> Result<Decoded, Box<dyn std::error::Error + Send + Sync>> {
    let map: serde_json::Map<String, Decoded> = serde_json::from_slice(bytes)?;
    Ok(Decoded::Object(map))
}

/// Decoders attempted, in order, when the format cannot be guessed.
const FALLBACK_DECODERS: &[(&str, FileDecoder)] = &[
    ("yaml", decode_yaml),
    ("toml", decode_toml),
    ("json", decode_json),
];

fn decoder_for_extension(path: &Path) -> Option<FileDecoder> {
    let ext = path.extension()?.to_str()?.to_ascii_lowercase();
    match ext.as_str() {
        "yaml" | "yml" => Some(decode_yaml as FileDecoder),
        "toml" => Some(decode_toml as FileDecoder),
        "json" => Some(decode_json as FileDecoder),
        _ => None,
    }
}

/// A resolved config file location.
pub(crate) struct ConfigFile {
    pub path: PathBuf,
    /// Whether the user named this path explicitly (flag or environment), as
    /// opposed to the engine falling back to the default filename. Explicit
    /// paths must exist; the default may be absent.
    pub user_supplied: bool,
}

/// Resolve which config file to read, if any.
///
/// The config-file-path option is special-cased: the flag outranks the
/// environment variable here, even though flags are applied last for every
/// other option — the path must be known before the file stage runs.
///
/// # Panics
///
/// Panics when the loader names a config-file-path option that is not
/// declared at the root of the configuration struct, or that is not a
/// string option.
pub(crate) fn discover(
    loader: &Loader,
    tree: &OptionTree,
    matches: Option<&clap::ArgMatches>,
) -> Result<Option<ConfigFile>, StrataError> {
    if let Some(id) = loader.config_file_option.as_deref() {
        let Some(idx) = tree.root_option(id) else {
            panic!("config file option '{id}' is not declared in the configuration struct");
        };
        let node = tree.node(idx);
        if node.spec.kind != Kind::Scalar(Scalar::Str) {
            panic!("config file option '{id}' must be a string option");
        }
        let full_id = &node.full_id;

        let mut found = matches.and_then(|m| flags::supplied_value(m, full_id));
        if found.is_none() && loader.env {
            found = env::lookup(&loader.env_prefix, full_id);
        }
        if let Some(path) = found.filter(|p| !p.is_empty()) {
            let path = absolute(PathBuf::from(path))?;
            tracing::debug!(path = %path.display(), "config file path supplied by user");
            return Ok(Some(ConfigFile {
                path,
                user_supplied: true,
            }));
        }
    }

    if let Some(default) = &loader.default_filename {
        let path = absolute(default.clone())?;
        tracing::debug!(path = %path.display(), "falling back to default config file");
        return Ok(Some(ConfigFile {
            path,
            user_supplied: false,
        }));
    }

    Ok(None)
}

fn absolute(path: PathBuf) -> Result<PathBuf, StrataError> {
    std::path::absolute(&path).map_err(|source| StrataError::FileRead { path, source })
}

/// Read, decode and apply one config file.
///
/// A missing file is an error when the user named the path explicitly, and a
/// silent skip when the engine fell back to the default filename.
pub(crate) fn apply<C: StrataConfig>(
    loader: &Loader,
    file: &ConfigFile,
    tree: &mut OptionTree,
    target: &mut C,
) -> Result<(), StrataError> {
    // The handle is released as soon as the bytes are in memory; decoding
    // never holds the file open.
    let bytes = match std::fs::read(&file.path) {
        Ok(bytes) => bytes,
        Err(err) if !file.user_supplied && err.kind() == std::io::ErrorKind::NotFound => {
            tracing::debug!(path = %file.path.display(), "default config file absent, skipping");
            return Ok(());
        }
        Err(source) => {
            return Err(StrataError::FileRead {
                path: file.path.clone(),
                source,
            });
        }
    };
    let decoded = decode(loader, Some(&file.path), &bytes)?;
    apply_decoded(&decoded, tree, target, Some(&file.path))
}

/// Decode file bytes with the configured decoder, the extension-derived one,
/// or each built-in in fallback order.
pub(crate) fn decode(
    loader: &Loader,
    path: Option<&Path>,
    bytes: &[u8],
) -> Result<Decoded, StrataError> {
    if let Some(decoder) = loader.decoder {
        return decoder(bytes).map_err(|e| decode_error(path, e.to_string()));
    }
    if let Some(decoder) = path.and_then(decoder_for_extension) {
        return decoder(bytes).map_err(|e| decode_error(path, e.to_string()));
    }

    let mut last = String::new();
    for &(name, decoder) in FALLBACK_DECODERS {
        match decoder(bytes) {
            Ok(decoded) => {
                tracing::debug!(decoder = name, "decoded config file by fallback");
                return Ok(decoded);
            }
            Err(err) => last = format!("{name}: {err}"),
        }
    }
    Err(decode_error(path, last))
}

/// Walk the decoded tree alongside the option tree, applying every matched
/// leaf. Decoded keys with no matching option are ignored; options with no
/// matching key keep their prior value. Matching is case-sensitive.
pub(crate) fn apply_decoded<C: StrataConfig>(
    decoded: &Decoded,
    tree: &mut OptionTree,
    target: &mut C,
    path: Option<&Path>,
) -> Result<(), StrataError> {
    let Some(map) = decoded.as_object() else {
        return Err(decode_error(path, "top-level value is not a mapping"));
    };
    let roots = tree.root_indices();
    apply_group(tree, &roots, map, target)
}

fn apply_group<C: StrataConfig>(
    tree: &mut OptionTree,
    level: &[usize],
    map: &serde_json::Map<String, Decoded>,
    target: &mut C,
) -> Result<(), StrataError> {
    for &idx in level {
        let (id, kind, full_id) = {
            let node = tree.node(idx);
            (node.spec.id, node.spec.kind, node.full_id.clone())
        };
        let Some(value) = map.get(id) else {
            continue;
        };
        match kind {
            Kind::Group => {
                let Some(child_map) = value.as_object() else {
                    return Err(StrataError::Coerce {
                        key: full_id,
                        source: CoerceError::parse(value.to_string(), "mapping"),
                    });
                };
                let children = tree.node(idx).children.clone();
                apply_group(tree, &children, child_map, target)?;
            }
            Kind::Scalar(ty) => {
                let coerced = coerce::from_decoded(value, ty).map_err(|source| {
                    StrataError::Coerce {
                        key: full_id.clone(),
                        source,
                    }
                })?;
                apply_value(tree, idx, target, coerced, "file")?;
            }
            Kind::Sequence(ty) => {
                let coerced = coerce::sequence_from_decoded(value, ty).map_err(|source| {
                    StrataError::Coerce {
                        key: full_id.clone(),
                        source,
                    }
                })?;
                apply_value(tree, idx, target, coerced, "file")?;
            }
        }
    }
    Ok(())
}

fn decode_error(path: Option<&Path>, message: impl Into<String>) -> StrataError {
    StrataError::Decode {
        path: path.map(Path::to_path_buf),
        message: message.into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn extension_detection_is_case_insensitive() {
        assert!(decoder_for_extension(Path::new("app.YAML")).is_some());
        assert!(decoder_for_extension(Path::new("app.yml")).is_some());
        assert!(decoder_for_extension(Path::new("app.toml")).is_some());
        assert!(decoder_for_extension(Path::new("app.json")).is_some());
        assert!(decoder_for_extension(Path::new("app.conf")).is_none());
        assert!(decoder_for_extension(Path::new("app")).is_none());
    }

    #[test]
    fn builtin_decoders_require_a_mapping() {
        // A bare scalar is a decode failure, so format fallback can move on
        // to the next decoder instead of misreading the document.
        assert!(decode_yaml(b"just a string").is_err());
        assert!(decode_json(b"[1, 2, 3]").is_err());
        assert!(decode_yaml(b"a: 1").is_ok());
        assert!(decode_toml(b"a = 1\n").is_ok());
        assert!(decode_json(b"{\"a\": 1}").is_ok());
    }

    #[test]
    fn fallback_tries_later_decoders() {
        // TOML content is not a YAML mapping; the fallback chain must still
        // land on the TOML decoder.
        let loader = Loader::new();
        let decoded = decode(&loader, None, b"a = 1\n").expect("fallback must decode TOML");
        assert_eq!(decoded["a"], serde_json::json!(1));
    }

    #[test]
    fn fallback_reports_the_last_decoder_message() {
        let loader = Loader::new();
        let err = decode(&loader, None, b"\x00\xff").unwrap_err();
        match err {
            StrataError::Decode { path: None, message } => {
                assert!(message.starts_with("json: "), "unexpected message: {message}");
            }
            other => panic!("expected decode error, got {other:?}"),
        }
    }
}
