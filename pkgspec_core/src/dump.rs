/*============================================================
  PkgSpec Project: pkgspec
  Module: pkgspec_core::dump
  ------------------------------------------------------------
  Purpose:
    Parse the interpreter's `set` dump into variable and
    function maps, and isolate what the descriptor introduced
    by diffing two dumps.

  Security / Safety Notes:
    Pure text processing; no I/O performed in this module.

  Dependencies:
    regex for the per-line grammar.

  Operational Scope:
    Runs on both snapshots captured by the shell module.

  Revision History:
    2025-02-11 RKM  Authored dump parser and diff.
    2025-02-24 RKM  Reject dumps that end inside a function.
  ------------------------------------------------------------
  Principles Observed:
    - Explicit state machine instead of ad hoc matching
    - Unrecognised input is fatal and fully reported
============================================================*/

use std::collections::BTreeMap;
use std::sync::OnceLock;

use regex::Regex;

use crate::error::{PkgspecError, Result};
use crate::value::{decode_value, ShellValue};

/// Variables and functions visible in one interpreter snapshot.
///
/// Values are kept raw; decoding happens in [`crate::value`].
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Environment {
    pub variables: BTreeMap<String, String>,
    pub functions: BTreeMap<String, String>,
}

impl Environment {
    /// Decoded value of a variable.
    pub fn variable(&self, name: &str) -> Option<ShellValue> {
        self.variables.get(name).map(|raw| decode_value(raw))
    }

    /// Body of a function, as opaque text.
    pub fn function(&self, name: &str) -> Option<ShellValue> {
        self.functions
            .get(name)
            .map(|body| ShellValue::FunctionBody(body.clone()))
    }
}

enum ParseState {
    Idle,
    AwaitingBody(String),
    InFunctionBody(String, Vec<String>),
}

struct DumpGrammar {
    variable: Regex,
    function_title: Regex,
    body_open: Regex,
}

fn grammar() -> &'static DumpGrammar {
    static GRAMMAR: OnceLock<DumpGrammar> = OnceLock::new();
    GRAMMAR.get_or_init(|| DumpGrammar {
        variable: Regex::new(r"^(\w+)=(.*)$").expect("variable pattern is valid"),
        function_title: Regex::new(r"^(\w+) \(\)\s*$").expect("function pattern is valid"),
        body_open: Regex::new(r"^\{\s*$").expect("brace pattern is valid"),
    })
}

/// Parse one raw dump.
pub fn parse_dump(dump: &str) -> Result<Environment> {
    let grammar = grammar();
    let mut environment = Environment::default();
    let mut state = ParseState::Idle;

    for line in dump.lines() {
        state = match state {
            ParseState::Idle => {
                if let Some(caps) = grammar.variable.captures(line) {
                    environment
                        .variables
                        .insert(caps[1].to_string(), caps[2].to_string());
                    ParseState::Idle
                } else if let Some(caps) = grammar.function_title.captures(line) {
                    ParseState::AwaitingBody(caps[1].to_string())
                } else if line.trim().is_empty() {
                    ParseState::Idle
                } else {
                    return Err(malformed(line, dump));
                }
            }
            ParseState::AwaitingBody(name) => {
                if grammar.body_open.is_match(line) {
                    ParseState::InFunctionBody(name, Vec::new())
                } else if line.trim().is_empty() {
                    ParseState::AwaitingBody(name)
                } else {
                    return Err(malformed(line, dump));
                }
            }
            ParseState::InFunctionBody(name, mut body) => {
                if line == "}" {
                    environment.functions.insert(name, body.join("\n"));
                    ParseState::Idle
                } else {
                    body.push(line.to_string());
                    ParseState::InFunctionBody(name, body)
                }
            }
        };
    }

    match state {
        ParseState::Idle => Ok(environment),
        ParseState::AwaitingBody(name) | ParseState::InFunctionBody(name, _) => {
            Err(malformed(&format!("{name} () <unterminated>"), dump))
        }
    }
}

/// Drop every variable whose raw value did not change.
///
/// What remains in `after` is exactly what the descriptor defined or
/// modified. Functions are taken from `after` as-is.
pub fn diff_environments(before: &Environment, mut after: Environment) -> Environment {
    after
        .variables
        .retain(|name, value| before.variables.get(name) != Some(value));
    after
}

fn malformed(line: &str, dump: &str) -> PkgspecError {
    PkgspecError::DumpParse {
        line: line.to_string(),
        dump: dump.to_string(),
    }
}
