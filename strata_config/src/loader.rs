//! Engine configuration and the public entry points.

use std::ffi::OsString;
use std::path::PathBuf;

use crate::StrataConfig;
use crate::error::StrataError;
use crate::file::FileDecoder;
use crate::resolver;

/// Engine configuration: which sources run and how they are named.
///
/// A default `Loader` reads no config file (there is nothing to locate until
/// [`config_file_option`](Self::config_file_option) or
/// [`default_filename`](Self::default_filename) is set), reads unprefixed
/// environment variables, parses the process arguments and offers `--help`.
#[derive(Debug, Clone)]
pub struct Loader {
    /// Root-level option id that supplies the config file path.
    pub(crate) config_file_option: Option<String>,
    /// Fallback path when the user supplies none.
    pub(crate) default_filename: Option<PathBuf>,
    /// Explicit decoder, overriding extension detection and format fallback.
    pub(crate) decoder: Option<FileDecoder>,
    /// Prefix prepended verbatim to every environment variable name.
    pub(crate) env_prefix: String,
    pub(crate) file: bool,
    pub(crate) env: bool,
    pub(crate) flags: bool,
    pub(crate) help: bool,
    /// Text printed above the flag list in help output.
    pub(crate) help_message: Option<String>,
    /// Description of the help flag itself.
    pub(crate) help_description: Option<String>,
    /// Argument vector override; the process arguments when unset.
    pub(crate) args: Option<Vec<OsString>>,
}

impl Default for Loader {
    fn default() -> Self {
        Self::new()
    }
}

impl Loader {
    /// A loader with every source enabled and nothing configured.
    #[must_use]
    pub fn new() -> Self {
        Self {
            config_file_option: None,
            default_filename: None,
            decoder: None,
            env_prefix: String::new(),
            file: true,
            env: true,
            flags: true,
            help: true,
            help_message: None,
            help_description: None,
            args: None,
        }
    }

    /// Name the declared option whose value is the config file path.
    ///
    /// The option is looked up before the file stage runs: first in the
    /// command-line flags, then in the environment. Its declared default is
    /// ignored for this purpose; use [`default_filename`](Self::default_filename)
    /// for a fallback path.
    #[must_use]
    pub fn config_file_option(mut self, id: impl Into<String>) -> Self {
        self.config_file_option = Some(id.into());
        self
    }

    /// Path to read when the user supplies no config file.
    ///
    /// Unlike a user-supplied path, this one may be absent without failing
    /// the load.
    #[must_use]
    pub fn default_filename(mut self, path: impl Into<PathBuf>) -> Self {
        self.default_filename = Some(path.into());
        self
    }

    /// Force a specific decode function instead of guessing from the file
    /// extension.
    #[must_use]
    pub fn decoder(mut self, decoder: FileDecoder) -> Self {
        self.decoder = Some(decoder);
        self
    }

    /// Prefix for environment variable lookups, used verbatim — no
    /// underscore is inserted after it.
    #[must_use]
    pub fn env_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.env_prefix = prefix.into();
        self
    }

    /// Skip the config file source entirely.
    #[must_use]
    pub fn disable_file(mut self) -> Self {
        self.file = false;
        self
    }

    /// Skip the environment source entirely.
    #[must_use]
    pub fn disable_env(mut self) -> Self {
        self.env = false;
        self
    }

    /// Skip the command-line flags source entirely.
    #[must_use]
    pub fn disable_flags(mut self) -> Self {
        self.flags = false;
        self
    }

    /// Do not register `--help`/`-h`; an explicit `--help` then fails to
    /// parse like any other unknown flag.
    #[must_use]
    pub fn disable_help(mut self) -> Self {
        self.help = false;
        self
    }

    /// Text printed above the flag list in help output.
    #[must_use]
    pub fn help_message(mut self, message: impl Into<String>) -> Self {
        self.help_message = Some(message.into());
        self
    }

    /// Description shown for the help flag itself.
    #[must_use]
    pub fn help_description(mut self, description: impl Into<String>) -> Self {
        self.help_description = Some(description.into());
        self
    }

    /// Override the argument vector, including the program name at position
    /// zero. Defaults to the process arguments.
    #[must_use]
    pub fn args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<OsString>,
    {
        self.args = Some(args.into_iter().map(Into::into).collect());
        self
    }

    pub(crate) fn argv(&self) -> Vec<OsString> {
        self.args
            .clone()
            .unwrap_or_else(|| std::env::args_os().collect())
    }

    /// Resolve configuration from the discovered sources into `target`.
    ///
    /// Stages run in fixed order — defaults, config file, environment,
    /// command-line flags — with later stages overwriting only the options
    /// they actually carry a value for.
    ///
    /// # Errors
    ///
    /// Returns a [`StrataError`] for bad runtime input: an unreadable or
    /// undecodable user-specified file, or a value that fails coercion. On
    /// error the target must be treated as untrustworthy.
    ///
    /// # Panics
    ///
    /// Panics on structural faults in the configuration struct: duplicate
    /// ids or shorthands, defaults that do not parse against their declared
    /// type, or a [`config_file_option`](Self::config_file_option) naming an
    /// undeclared option.
    pub fn load<C: StrataConfig>(&self, target: &mut C) -> Result<(), StrataError> {
        resolver::run(self, target, None)
    }

    /// Resolve configuration using explicitly supplied file content, still
    /// layering environment and flags on top unless disabled.
    ///
    /// File discovery is bypassed; `content` is handed straight to the
    /// decoder (the configured one, or format fallback).
    ///
    /// # Errors
    ///
    /// As for [`load`](Self::load).
    ///
    /// # Panics
    ///
    /// As for [`load`](Self::load); additionally panics when the file source
    /// is disabled — supplying file content while refusing to read it is a
    /// programming error.
    pub fn load_with_file_content<C: StrataConfig>(
        &self,
        target: &mut C,
        content: &[u8],
    ) -> Result<(), StrataError> {
        assert!(
            self.file,
            "load_with_file_content requires the file source to be enabled"
        );
        resolver::run(self, target, Some(content))
    }

    /// Resolve configuration from file content alone; environment and flags
    /// are skipped regardless of the loader's settings.
    ///
    /// # Errors
    ///
    /// As for [`load`](Self::load).
    ///
    /// # Panics
    ///
    /// As for [`load_with_file_content`](Self::load_with_file_content).
    pub fn load_file_content<C: StrataConfig>(
        &self,
        target: &mut C,
        content: &[u8],
    ) -> Result<(), StrataError> {
        let mut only_file = self.clone();
        only_file.env = false;
        only_file.flags = false;
        only_file.load_with_file_content(target, content)
    }
}
