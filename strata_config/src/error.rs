//! Error types for configuration resolution.

use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::coerce::CoerceError;
use crate::value::AssignError;

/// Errors that can occur while resolving configuration at runtime.
///
/// These cover bad input from the user: unreadable or undecodable files,
/// malformed flag or environment values. Faults in the configuration struct
/// itself (duplicate ids, unparsable default literals, an undeclared
/// config-file-path option) are programmer errors and panic instead.
///
/// Any error means the target struct must be treated as untrustworthy:
/// values applied before the failure are left in place.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum StrataError {
    /// Command-line arguments failed to parse.
    #[error("failed to parse command-line arguments: {0}")]
    Flags(#[from] Box<clap::Error>),

    /// A config file could not be read.
    #[error("failed to read config file '{path}': {source}")]
    FileRead {
        /// Path that failed to open or read.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },

    /// Config file contents could not be decoded.
    #[error("failed to decode {}: {message}", decode_target(.path.as_deref()))]
    Decode {
        /// Path of the file, when one was involved; `None` for raw content.
        path: Option<PathBuf>,
        /// Message from the last decoder attempted.
        message: String,
    },

    /// A source supplied a value that does not parse as the option's type.
    #[error("invalid value for '{key}': {source}")]
    Coerce {
        /// `full_id` of the offending option.
        key: String,
        /// The coercion failure, including the raw literal.
        #[source]
        source: CoerceError,
    },

    /// A coerced value could not be written into the target field.
    #[error("invalid value for '{key}': {source}")]
    Assign {
        /// `full_id` of the offending option.
        key: String,
        /// The conversion failure.
        #[source]
        source: AssignError,
    },
}

fn decode_target(path: Option<&Path>) -> String {
    path.map_or_else(
        || "config content".to_owned(),
        |p| format!("config file '{}'", p.display()),
    )
}
