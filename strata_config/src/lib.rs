//! Layered configuration loading.
//!
//! One annotated struct describes every option a program accepts;
//! [`Loader`] populates it from a config file, environment variables and
//! command-line flags, in that priority order, with per-field defaults
//! underneath. The [`StrataConfig`] derive (from the companion
//! `strata_config_macros` crate) turns the struct into option metadata at
//! compile time; no runtime reflection is involved.
//!
//! ```no_run
//! use strata_config::{Loader, StrataConfig};
//!
//! #[derive(Debug, Default, StrataConfig)]
//! struct AppConfig {
//!     #[strata(default = "8080", short = 'p', desc = "port to listen on")]
//!     port: u16,
//!     #[strata(desc = "verbose logging")]
//!     verbose: bool,
//! }
//!
//! fn main() -> Result<(), strata_config::StrataError> {
//!     let mut config = AppConfig::default();
//!     Loader::new().env_prefix("APP_").load(&mut config)?;
//!     Ok(())
//! }
//! ```
//!
//! Recognised `#[strata(...)]` field attributes: `id` (override the derived
//! name), `default` (literal, parsed per type), `short` (single-character
//! flag alias), `desc` (help text).

pub use strata_config_macros::StrataConfig;

mod coerce;
mod env;
mod error;
mod file;
mod flags;
mod loader;
mod option;
mod resolver;
mod value;

pub use coerce::CoerceError;
pub use error::StrataError;
pub use file::{FileDecoder, decode_json, decode_toml, decode_yaml};
pub use loader::Loader;
pub use option::{Kind, OptionSpec, Scalar};
pub use value::{AssignError, FromValue, Value};

/// Trait connecting a configuration struct to the resolution engine.
///
/// Usually implemented with `#[derive(StrataConfig)]`. Hand-written
/// implementations must keep [`OPTIONS`](Self::OPTIONS) and
/// [`assign`](Self::assign) consistent: every leaf reachable through
/// `OPTIONS` must be assignable under its path.
pub trait StrataConfig {
    /// Static option metadata, one entry per field, nested groups included.
    const OPTIONS: &'static [OptionSpec];

    /// Write a coerced value into the field at `path`, the sequence of
    /// option ids from this struct down to the target leaf.
    ///
    /// # Errors
    ///
    /// Returns an [`AssignError`] when no option exists at `path` or the
    /// value does not fit the field's type.
    fn assign(&mut self, path: &[&str], value: Value) -> Result<(), AssignError>;
}

/// Resolve configuration with default [`Loader`] settings.
///
/// # Errors
///
/// Returns a [`StrataError`] for bad runtime input; see [`Loader::load`].
pub fn load<C: StrataConfig>(target: &mut C) -> Result<(), StrataError> {
    Loader::new().load(target)
}
