//! Flags source: clap registration, parsing and application.
//!
//! One long flag is registered per leaf option under its dotted `full_id`,
//! plus its shorthand when declared. Arguments are parsed once, up front, so
//! the file source can consult the config-file-path flag early; every other
//! flag is applied last, and only when the user actually supplied it — flag
//! defaults never clobber values resolved from earlier sources.

use std::ffi::OsString;

use clap::parser::ValueSource;
use clap::{Arg, ArgAction, ArgMatches, Command};

use crate::StrataConfig;
use crate::coerce;
use crate::error::StrataError;
use crate::loader::Loader;
use crate::option::{Kind, OptionTree, Scalar};
use crate::resolver::apply_value;

/// Long name registered for the generated help flag; reserved.
const HELP_ID: &str = "help";

/// Default description of the generated help flag.
const HELP_DESCRIPTION: &str = "show this help menu";

fn program_name(args: &[OsString]) -> String {
    args.first()
        .map(std::path::Path::new)
        .and_then(|p| p.file_stem())
        .and_then(|s| s.to_str())
        .unwrap_or("program")
        .to_owned()
}

/// Build the clap command with one flag per leaf option.
fn command(loader: &Loader, tree: &OptionTree, args: &[OsString]) -> Command {
    let mut cmd = Command::new(program_name(args))
        .disable_help_flag(true)
        .disable_version_flag(true);

    if let Some(message) = &loader.help_message {
        cmd = cmd.about(message.clone());
    }
    if loader.help {
        let description = loader
            .help_description
            .clone()
            .unwrap_or_else(|| HELP_DESCRIPTION.to_owned());
        cmd = cmd.arg(
            Arg::new(HELP_ID)
                .long(HELP_ID)
                .short('h')
                .action(ArgAction::Help)
                .help(description),
        );
    }

    for idx in tree.leaf_indices() {
        let node = tree.node(idx);
        let mut arg = Arg::new(node.full_id.clone())
            .long(node.full_id.clone())
            .action(ArgAction::Set);
        if let Some(short) = node.spec.short {
            arg = arg.short(short);
        }
        if !node.spec.help.is_empty() {
            arg = arg.help(node.spec.help);
        }
        if let Some(default) = node.spec.default {
            // Display only: defaults are applied by the resolver, and values
            // not explicitly supplied on the command line are never read.
            arg = arg.default_value(default);
        }
        if node.spec.kind == Kind::Scalar(Scalar::Bool) {
            // Bare `--flag` means true; an explicit value needs `--flag=false`.
            arg = arg
                .num_args(0..=1)
                .default_missing_value("true")
                .require_equals(true);
        }
        cmd = cmd.arg(arg);
    }
    cmd
}

/// Parse the process arguments against the option tree.
///
/// When help is enabled and requested, the help text is printed and the
/// process terminates successfully without resolving anything further.
///
/// # Panics
///
/// Panics when an option declares id `help` at the root, or shorthand `h`,
/// while the generated help flag is enabled; both names are reserved for it.
pub(crate) fn parse(loader: &Loader, tree: &OptionTree) -> Result<ArgMatches, StrataError> {
    if loader.help {
        for idx in tree.leaf_indices() {
            let node = tree.node(idx);
            if node.full_id == HELP_ID {
                panic!("option id '{HELP_ID}' is reserved for the help flag");
            }
            if node.spec.short == Some('h') {
                panic!(
                    "shorthand '-h' declared by '{}' is reserved for the help flag",
                    node.full_id
                );
            }
        }
    }

    let args = loader.argv();
    match command(loader, tree, &args).try_get_matches_from(args) {
        Ok(matches) => Ok(matches),
        Err(err) if err.kind() == clap::error::ErrorKind::DisplayHelp => {
            let _ = err.print();
            std::process::exit(0);
        }
        Err(err) => Err(StrataError::Flags(Box::new(err))),
    }
}

/// The flag's value, only when the user explicitly supplied it.
pub(crate) fn supplied_value(matches: &ArgMatches, full_id: &str) -> Option<String> {
    if matches.value_source(full_id) == Some(ValueSource::CommandLine) {
        matches.get_one::<String>(full_id).cloned()
    } else {
        None
    }
}

/// Apply explicitly supplied flag values to their options.
pub(crate) fn apply<C: StrataConfig>(
    matches: &ArgMatches,
    tree: &mut OptionTree,
    target: &mut C,
) -> Result<(), StrataError> {
    for idx in tree.leaf_indices() {
        let (full_id, kind) = {
            let node = tree.node(idx);
            (node.full_id.clone(), node.spec.kind)
        };
        let Some(raw) = supplied_value(matches, &full_id) else {
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
        apply_value(tree, idx, target, coerced, "flags")?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::option::OptionSpec;

    const SPECS: &[OptionSpec] = &[
        OptionSpec {
            id: "port",
            short: Some('p'),
            help: "listen port",
            default: Some("8080"),
            kind: Kind::Scalar(Scalar::Uint),
            children: &[],
        },
        OptionSpec {
            id: "verbose",
            short: None,
            help: "",
            default: None,
            kind: Kind::Scalar(Scalar::Bool),
            children: &[],
        },
    ];

    fn matches_for(argv: &[&str]) -> ArgMatches {
        let loader = Loader::new().disable_help();
        let tree = OptionTree::build(SPECS);
        let args: Vec<OsString> = argv.iter().map(OsString::from).collect();
        command(&loader, &tree, &args)
            .try_get_matches_from(args)
            .expect("argv must parse")
    }

    #[test]
    fn only_user_supplied_flags_are_reported() {
        let matches = matches_for(&["app", "--port=9090"]);
        assert_eq!(supplied_value(&matches, "port"), Some("9090".to_owned()));
        // `verbose` was not supplied; its clap-side absence must not read as
        // an explicit value.
        assert_eq!(supplied_value(&matches, "verbose"), None);
    }

    #[test]
    fn declared_defaults_do_not_count_as_supplied() {
        let matches = matches_for(&["app"]);
        assert_eq!(supplied_value(&matches, "port"), None);
    }

    #[test]
    fn shorthand_flags_resolve_to_their_option() {
        let matches = matches_for(&["app", "-p", "7070"]);
        assert_eq!(supplied_value(&matches, "port"), Some("7070".to_owned()));
    }

    #[test]
    fn bare_boolean_flags_read_as_true() {
        let matches = matches_for(&["app", "--verbose"]);
        assert_eq!(supplied_value(&matches, "verbose"), Some("true".to_owned()));

        let matches = matches_for(&["app", "--verbose=false"]);
        assert_eq!(
            supplied_value(&matches, "verbose"),
            Some("false".to_owned())
        );
    }
}
