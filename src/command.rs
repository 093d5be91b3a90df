//! Synchronous external-process invocation with captured output.

use anyhow::{Context, Result};
use std::collections::HashMap;
use std::ffi::OsStr;
use std::process::Command;
use thiserror::Error;

/// An external tool exited with a non-zero code.
///
/// Carries the shell-quoted command line, the child's exit code, and its
/// captured stderr with embedded newlines escaped to a literal `\n` so the
/// message stays on a single line in logs.
#[derive(Debug, Error)]
#[error("command {command} failed with exit code {exit_code}: {stderr}")]
pub struct CommandFailed {
    pub command: String,
    pub exit_code: i32,
    pub stderr: String,
}

/// Run an external command, block until it exits, and return its stdout.
///
/// When `env` is given the child receives exactly that environment instead
/// of inheriting the caller's. Stderr is discarded on success.
///
/// # Errors
///
/// Returns [`CommandFailed`] if the child exits non-zero. Spawn failures
/// (e.g. the tool is not installed) propagate as io errors with context.
pub fn run<I, S>(program: &str, args: I, env: Option<&HashMap<String, String>>) -> Result<String>
where
    I: IntoIterator<Item = S>,
    S: AsRef<OsStr>,
{
    let args: Vec<String> = args
        .into_iter()
        .map(|a| a.as_ref().to_string_lossy().into_owned())
        .collect();

    let mut cmd = Command::new(program);
    cmd.args(&args);
    if let Some(env) = env {
        cmd.env_clear().envs(env);
    }

    let output = cmd
        .output()
        .with_context(|| format!("failed to spawn {program}"))?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr);
        return Err(CommandFailed {
            command: quoted_command_line(program, &args),
            // code() is None when the child was killed by a signal
            exit_code: output.status.code().unwrap_or(-1),
            stderr: stderr.trim().replace('\n', "\\n"),
        }
        .into());
    }

    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}

fn quoted_command_line(program: &str, args: &[String]) -> String {
    std::iter::once(program)
        .chain(args.iter().map(String::as_str))
        .map(shell_quote)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Quote one argument for safe display in an error message.
fn shell_quote(arg: &str) -> String {
    let safe = |c: char| c.is_ascii_alphanumeric() || "@%+=:,./_-".contains(c);
    if !arg.is_empty() && arg.chars().all(safe) {
        arg.to_string()
    } else {
        format!("'{}'", arg.replace('\'', r"'\''"))
    }
}
