/*============================================================
  PkgSpec Project: pkgspec
  Module: pkgspec_core::mapping
  ------------------------------------------------------------
  Purpose:
    Translate Arch dependency names into RPM package names
    through the operator-maintained name mapping table.

  Security / Safety Notes:
    The mapping file is opened read-only, once per run.

  Dependencies:
    serde + serde_json for the table format.

  Operational Scope:
    Used by PackageMetadata enrichment for every derived
    package set (requires, provides, conflicts, obsoletes,
    build requires).

  Revision History:
    2025-02-11 RKM  Authored mapping table and translator.
    2025-02-24 RKM  Explicit Substitution variant for lookups.
  ------------------------------------------------------------
  Principles Observed:
    - Order preserved exactly as listed by input and table
    - Unmapped names pass through untouched
============================================================*/

use std::collections::HashMap;
use std::path::Path;

use serde::Deserialize;

use crate::error::{PkgspecError, Result};

/// One row of the mapping table.
#[derive(Debug, Clone, Default, Deserialize, PartialEq, Eq)]
pub struct MappingEntry {
    #[serde(default)]
    pub packages: Option<Vec<String>>,
    #[serde(default)]
    pub aliases: Option<Vec<String>>,
    #[serde(default)]
    pub extra_deps: Option<Vec<String>>,
}

/// Name mapping table keyed by bare Arch package name.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(transparent)]
pub struct NameMapping {
    entries: HashMap<String, MappingEntry>,
}

/// Outcome of looking up a bare name.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Substitution<'a> {
    /// Keep the source name.
    Unmapped,
    /// Replace with zero or more target names, in table order.
    Replaced(&'a [String]),
}

/// Result of translating one specifier list.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MappedPackages {
    pub packages: Vec<String>,
    pub aliases: Vec<String>,
    pub extra_deps: Vec<String>,
}

impl NameMapping {
    /// Read the table from disk. Missing or invalid files are fatal.
    pub fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|err| PkgspecError::MappingLoad {
            path: path.display().to_string(),
            reason: err.to_string(),
        })?;
        Self::from_json(&content).map_err(|err| match err {
            PkgspecError::MappingLoad { reason, .. } => PkgspecError::MappingLoad {
                path: path.display().to_string(),
                reason,
            },
            other => other,
        })
    }

    pub fn from_json(content: &str) -> Result<Self> {
        serde_json::from_str(content).map_err(|err| PkgspecError::MappingLoad {
            path: "<inline>".into(),
            reason: format!("invalid JSON: {err}"),
        })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entry(&self, bare_name: &str) -> Option<&MappingEntry> {
        self.entries.get(bare_name)
    }

    pub fn lookup(&self, bare_name: &str) -> Substitution<'_> {
        match self.entry(bare_name).and_then(|entry| entry.packages.as_deref()) {
            Some(replacements) => Substitution::Replaced(replacements),
            None => Substitution::Unmapped,
        }
    }

    /// Translate dependency specifiers, expanding each in place.
    ///
    /// Aliases and extra dependencies are gathered across the whole input
    /// in encounter order. Duplicates are kept.
    pub fn map_packages(&self, specifiers: &[String]) -> MappedPackages {
        let mut mapped = MappedPackages::default();

        for specifier in specifiers {
            let name = bare_name(specifier);
            match self.lookup(name) {
                Substitution::Replaced(replacements) => {
                    mapped.packages.extend(replacements.iter().cloned())
                }
                Substitution::Unmapped => mapped.packages.push(name.to_string()),
            }
            if let Some(entry) = self.entry(name) {
                mapped
                    .aliases
                    .extend(entry.aliases.iter().flatten().cloned());
                mapped
                    .extra_deps
                    .extend(entry.extra_deps.iter().flatten().cloned());
            }
        }

        mapped
    }
}

/// Strip a trailing version constraint such as `>=1.0` or `=2`.
///
/// The constraint is discarded; translation works on names only.
pub fn bare_name(specifier: &str) -> &str {
    match specifier.find(['<', '>', '=']) {
        Some(index) => &specifier[..index],
        None => specifier,
    }
}
