//! Configuration loading helpers for the stackfx CLI.
//!
//! Leading configuration flags are routed to `ortho_config`; the command and
//! its own arguments start at the first token that is not a known
//! configuration flag.

use std::ffi::{OsStr, OsString};

use ortho_config::OrthoConfig;
use stackfx_config::Config;

use crate::{AppError, CONFIG_CLI_FLAGS};

pub(crate) trait ConfigLoader {
    /// Loads configuration from the filtered configuration arguments.
    ///
    /// `args[0]` is the program name.
    fn load(&self, args: &[OsString]) -> Result<Config, AppError>;
}

pub(crate) struct OrthoConfigLoader;

impl ConfigLoader for OrthoConfigLoader {
    fn load(&self, args: &[OsString]) -> Result<Config, AppError> {
        Config::load_from_iter(args.iter().cloned()).map_err(AppError::LoadConfiguration)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FlagAction {
    Include { needs_value: bool },
    Stop,
}

fn classify(argument: &OsStr) -> FlagAction {
    let text = argument.to_string_lossy();
    if !text.starts_with("--") {
        return FlagAction::Stop;
    }
    let (flag, has_inline_value) = match text.split_once('=') {
        Some((flag, _)) => (flag, true),
        None => (&*text, false),
    };
    if CONFIG_CLI_FLAGS.contains(&flag) {
        FlagAction::Include {
            needs_value: !has_inline_value,
        }
    } else {
        FlagAction::Stop
    }
}

/// Arguments split between the configuration loader and the command parser.
#[derive(Debug, Default, PartialEq, Eq)]
pub(crate) struct ConfigArgumentSplit {
    pub(crate) config_arguments: Vec<OsString>,
    pub(crate) command_arguments: Vec<OsString>,
}

pub(crate) fn split_config_arguments(args: &[OsString]) -> ConfigArgumentSplit {
    let Some((program, rest)) = args.split_first() else {
        return ConfigArgumentSplit::default();
    };

    let mut config_arguments = vec![program.clone()];
    let mut remaining = rest.iter();
    let mut command_arguments = vec![program.clone()];

    while let Some(argument) = remaining.next() {
        match classify(argument) {
            FlagAction::Include { needs_value } => {
                config_arguments.push(argument.clone());
                if needs_value && let Some(value) = remaining.next() {
                    config_arguments.push(value.clone());
                }
            }
            FlagAction::Stop => {
                command_arguments.push(argument.clone());
                command_arguments.extend(remaining.by_ref().cloned());
                break;
            }
        }
    }

    ConfigArgumentSplit {
        config_arguments,
        command_arguments,
    }
}

#[cfg(test)]
mod tests {
    use rstest::rstest;

    use super::*;

    fn os_args(args: &[&str]) -> Vec<OsString> {
        args.iter().map(OsString::from).collect()
    }

    #[rstest]
    #[case::inline("--log-filter=debug", FlagAction::Include { needs_value: false })]
    #[case::separate("--plugin-root", FlagAction::Include { needs_value: true })]
    #[case::command("list", FlagAction::Stop)]
    #[case::command_flag("--json", FlagAction::Stop)]
    fn classifies_arguments(#[case] argument: &str, #[case] expected: FlagAction) {
        assert_eq!(classify(OsStr::new(argument)), expected);
    }

    #[test]
    fn leading_configuration_flags_are_routed_to_the_loader() {
        let split = split_config_arguments(&os_args(&[
            "stackfx",
            "--plugin-root",
            "/srv/filters",
            "--log-format=compact",
            "list",
            "--json",
        ]));
        assert_eq!(
            split.config_arguments,
            os_args(&["stackfx", "--plugin-root", "/srv/filters", "--log-format=compact"])
        );
        assert_eq!(split.command_arguments, os_args(&["stackfx", "list", "--json"]));
    }

    #[test]
    fn configuration_flags_after_the_command_belong_to_the_command() {
        let split = split_config_arguments(&os_args(&["stackfx", "list", "--log-filter", "debug"]));
        assert_eq!(split.config_arguments, os_args(&["stackfx"]));
        assert_eq!(
            split.command_arguments,
            os_args(&["stackfx", "list", "--log-filter", "debug"])
        );
    }

    #[test]
    fn empty_arguments_split_to_nothing() {
        assert_eq!(split_config_arguments(&[]), ConfigArgumentSplit::default());
    }
}
