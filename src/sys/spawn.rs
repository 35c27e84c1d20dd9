use std::process::{Command, Stdio};

use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{error, trace};

/// A program to launch, either as one shell-like line or as an explicit
/// argument vector.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(untagged)]
pub enum SpawnCommand {
    Line(String),
    Argv(Vec<String>),
}

impl SpawnCommand {
    pub fn argv(&self) -> Vec<String> {
        match self {
            SpawnCommand::Line(line) => parse_command(line),
            SpawnCommand::Argv(argv) => argv.clone(),
        }
    }

    pub fn is_empty(&self) -> bool { self.argv().is_empty() }
}

impl std::fmt::Display for SpawnCommand {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SpawnCommand::Line(line) => f.write_str(line),
            SpawnCommand::Argv(argv) => f.write_str(&argv.join(" ")),
        }
    }
}

#[derive(Debug, Error)]
pub enum SpawnError {
    #[error("empty spawn command")]
    Empty,
    #[error("failed to spawn `{command}`: {source}")]
    Io {
        command: String,
        #[source]
        source: std::io::Error,
    },
}

/// Launches programs. Fire-and-forget: the effect of a spawn is observed
/// later, as an ordinary window-appeared event.
pub trait Spawner {
    fn spawn(&self, command: &SpawnCommand) -> Result<(), SpawnError>;
}

/// Spawns real child processes. Children are waited on from a detached
/// thread so they never linger as zombies.
#[derive(Debug, Default, Clone, Copy)]
pub struct ProcessSpawner;

impl Spawner for ProcessSpawner {
    fn spawn(&self, command: &SpawnCommand) -> Result<(), SpawnError> {
        let argv = command.argv();
        let Some((program, args)) = argv.split_first() else {
            return Err(SpawnError::Empty);
        };

        let mut child = Command::new(program)
            .args(args)
            .stdin(Stdio::null())
            .spawn()
            .map_err(|source| SpawnError::Io { command: command.to_string(), source })?;

        let command_str = command.to_string();
        std::thread::spawn(move || match child.wait() {
            Ok(status) if status.success() => trace!("Spawned command exited: {}", command_str),
            Ok(status) => error!("Spawned command failed with status {}: {}", status, command_str),
            Err(e) => error!("Failed to wait for '{}': {}", command_str, e),
        });
        Ok(())
    }
}

/// Splits a command line into words, honouring single and double quotes and
/// backslash escapes inside quotes. A quoted section only ends at the quote
/// character that opened it.
pub fn parse_command(command: &str) -> Vec<String> {
    let mut parts = Vec::new();
    let mut current_part = String::new();
    let mut quote: Option<char> = None;
    let mut chars = command.chars();

    while let Some(ch) = chars.next() {
        match ch {
            '\'' | '"' if quote.is_none() => quote = Some(ch),
            c if quote == Some(c) => quote = None,
            ' ' | '\t' if quote.is_none() => {
                if !current_part.is_empty() {
                    parts.push(std::mem::take(&mut current_part));
                }
            }
            '\\' if quote.is_some() => match chars.next() {
                Some('n') => current_part.push('\n'),
                Some('t') => current_part.push('\t'),
                Some(c @ ('\\' | '\'' | '"')) => current_part.push(c),
                Some(other) => {
                    current_part.push('\\');
                    current_part.push(other);
                }
                None => current_part.push('\\'),
            },
            _ => current_part.push(ch),
        }
    }

    if !current_part.is_empty() {
        parts.push(current_part);
    }

    parts
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn splits_plain_words() {
        assert_eq!(parse_command("xterm -class  scratch"), vec!["xterm", "-class", "scratch"]);
    }

    #[test]
    fn keeps_quoted_words_together() {
        assert_eq!(
            parse_command(r#"alacritty --title "Notes pad" -e 'nvim ~/notes'"#),
            vec!["alacritty", "--title", "Notes pad", "-e", "nvim ~/notes"]
        );
        assert_eq!(parse_command(r#"sh -c "echo \"hi\"""#), vec!["sh", "-c", "echo \"hi\""]);
    }

    #[test]
    fn other_quote_character_is_literal_inside_quotes() {
        assert_eq!(parse_command(r#"sh -c "echo it's here""#), vec!["sh", "-c", "echo it's here"]);
        assert_eq!(
            parse_command(r#"notify-send 'say "hi"' done"#),
            vec!["notify-send", r#"say "hi""#, "done"]
        );
    }

    #[test]
    fn argv_commands_are_used_verbatim() {
        let cmd = SpawnCommand::Argv(vec!["kitty".into(), "--class".into(), "a b".into()]);
        assert_eq!(cmd.argv(), vec!["kitty", "--class", "a b"]);
        assert!(SpawnCommand::Line("   ".into()).is_empty());
    }

    #[test]
    fn empty_command_is_rejected() {
        let err = ProcessSpawner.spawn(&SpawnCommand::Line(String::new())).unwrap_err();
        assert!(matches!(err, SpawnError::Empty));
    }

    #[test]
    fn missing_program_reports_the_command() {
        let cmd = SpawnCommand::Line("weft-test-no-such-program --flag".into());
        let err = ProcessSpawner.spawn(&cmd).unwrap_err();
        assert!(matches!(&err, SpawnError::Io { command, .. } if command.contains("no-such-program")));
    }

    #[cfg(unix)]
    #[test]
    fn spawns_real_processes() {
        ProcessSpawner.spawn(&SpawnCommand::Argv(vec!["true".into()])).unwrap();
    }
}
