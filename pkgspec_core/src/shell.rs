/*============================================================
  PkgSpec Project: pkgspec
  Module: pkgspec_core::shell
  ------------------------------------------------------------
  Purpose:
    Execute a PKGBUILD inside a clean interpreter session and
    capture the variable/function namespace immediately before
    and after the descriptor runs.

  Security / Safety Notes:
    The descriptor is arbitrary shell code and runs with the
    operator's privileges. The child starts with an empty
    environment; nothing else is sandboxed.

  Dependencies:
    tokio::process for command execution.

  Operational Scope:
    Exactly one child process per conversion run.

  Revision History:
    2025-02-11 RKM  Replaced pacman integration with extractor.
    2025-02-19 RKM  Feed stdin concurrently with stdout drain.
    2025-03-09 RKM  Terminate descriptor output before end sentinel.
  ------------------------------------------------------------
  Principles Observed:
    - Deterministic command invocation with explicit checks
    - Any interpreter diagnostic is fatal
============================================================*/

use std::io;
use std::process::Stdio;

use tokio::io::AsyncWriteExt;
use tokio::process::Command;

use crate::error::{PkgspecError, Result};

const BEGIN_SENTINEL: &str = "__PKGSPEC_DESCRIPTOR_BEGIN__";
const END_SENTINEL: &str = "__PKGSPEC_DESCRIPTOR_END__";

/// Raw `set` dumps taken around descriptor execution.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnvironmentSnapshots {
    pub before: String,
    pub after: String,
}

/// Run `descriptor` through `shell` and return both namespace dumps.
pub async fn extract_environment(descriptor: &str, shell: &str) -> Result<EnvironmentSnapshots> {
    let script = compose_script(descriptor);

    let mut child = Command::new(shell)
        .env_clear()
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped())
        .kill_on_drop(true)
        .spawn()
        .map_err(|err| map_spawn_error(err, shell))?;

    let mut stdin = child
        .stdin
        .take()
        .ok_or_else(|| PkgspecError::Runtime(format!("{shell} stdin was not captured")))?;
    let feed = async move {
        let written = stdin.write_all(script.as_bytes()).await;
        drop(stdin);
        written
    };

    let (fed, output) = tokio::join!(feed, child.wait_with_output());
    let output = output.map_err(|err| PkgspecError::Runtime(format!("{shell} failed: {err}")))?;

    let stderr = String::from_utf8_lossy(&output.stderr);
    if !stderr.is_empty() {
        return Err(PkgspecError::Extraction(stderr.into_owned()));
    }

    let stdout = String::from_utf8(output.stdout).map_err(|err| {
        PkgspecError::Serialization(format!("{shell} emitted invalid UTF-8: {err}"))
    })?;
    let snapshots = split_snapshots(&stdout)?;
    fed.map_err(|err| PkgspecError::Runtime(format!("Failed to feed {shell}: {err}")))?;
    Ok(snapshots)
}

fn compose_script(descriptor: &str) -> String {
    // The bare `echo` ends any unterminated descriptor output so the end
    // sentinel always starts its own line.
    format!("\nset\necho {BEGIN_SENTINEL}\n{descriptor}\necho\necho {END_SENTINEL}\nset\n")
}

/// Split combined stdout on the sentinel lines.
///
/// Output the descriptor itself prints lands between the sentinels and is
/// discarded.
fn split_snapshots(stdout: &str) -> Result<EnvironmentSnapshots> {
    let mut before = Vec::new();
    let mut after = Vec::new();
    let mut seen_begin = false;
    let mut seen_end = false;

    for line in stdout.split('\n') {
        if !seen_begin {
            if line == BEGIN_SENTINEL {
                seen_begin = true;
            } else {
                before.push(line);
            }
        } else if !seen_end {
            seen_end = line == END_SENTINEL;
        } else {
            after.push(line);
        }
    }

    if !seen_begin || !seen_end {
        return Err(PkgspecError::Extraction(format!(
            "descriptor output is missing the {} sentinel (did it call exit?)",
            if seen_begin { "end" } else { "begin" }
        )));
    }

    Ok(EnvironmentSnapshots {
        before: before.join("\n"),
        after: after.join("\n"),
    })
}

fn map_spawn_error(err: io::Error, command: &str) -> PkgspecError {
    if err.kind() == io::ErrorKind::NotFound {
        PkgspecError::CommandMissing {
            command: command.into(),
        }
    } else {
        PkgspecError::Runtime(format!("Failed to spawn {command}: {err}"))
    }
}
