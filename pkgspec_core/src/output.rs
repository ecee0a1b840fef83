/*============================================================
  PkgSpec Project: pkgspec
  Module: pkgspec_core::output
  ------------------------------------------------------------
  Purpose:
    Persist the conversion results: `<stem>.json` with the
    enriched metadata and `<stem>.spec` with the RPM spec.

  Security / Safety Notes:
    Files land in operator-controlled paths. Each file is
    staged in its destination directory and renamed into
    place, so readers never observe a half-written file.

  Dependencies:
    serde_json for the metadata document, tempfile for
    staging files.

  Operational Scope:
    Invoked once, after rendering succeeds.

  Revision History:
    2025-02-11 RKM  Adapted manifest writer for conversion output.
    2025-02-19 RKM  Stage and rename instead of writing in place.
  ------------------------------------------------------------
  Principles Observed:
    - Byte-identical output for identical input
    - Explicit filesystem diagnostics with paths
============================================================*/

use std::ffi::OsString;
use std::io::Write;
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;

use crate::error::{PkgspecError, Result};
use crate::metadata::PackageMetadata;

/// Destination files derived from a caller-supplied stem.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OutputPaths {
    pub json: PathBuf,
    pub spec: PathBuf,
}

impl OutputPaths {
    /// `out/foo` becomes `out/foo.json` and `out/foo.spec`.
    ///
    /// The suffix is appended, so a stem like `foo-1.2` keeps its dot.
    pub fn from_stem(stem: &Path) -> Self {
        Self {
            json: with_suffix(stem, ".json"),
            spec: with_suffix(stem, ".spec"),
        }
    }
}

fn with_suffix(stem: &Path, suffix: &str) -> PathBuf {
    let mut raw: OsString = stem.as_os_str().to_os_string();
    raw.push(suffix);
    PathBuf::from(raw)
}

/// Pretty-printed JSON document for the metadata.
pub fn render_json(metadata: &PackageMetadata) -> Result<String> {
    let mut json = serde_json::to_string_pretty(metadata).map_err(|err| {
        PkgspecError::Serialization(format!("Failed to encode package metadata: {err}"))
    })?;
    json.push('\n');
    Ok(json)
}

/// Write both output files.
pub fn write_outputs(paths: &OutputPaths, json: &str, spec: &str) -> Result<()> {
    write_atomically(&paths.json, json)?;
    write_atomically(&paths.spec, spec)
}

fn write_atomically(path: &Path, contents: &str) -> Result<()> {
    let parent = match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir.to_path_buf(),
        _ => PathBuf::from("."),
    };
    std::fs::create_dir_all(&parent).map_err(|err| {
        PkgspecError::Filesystem(format!(
            "Failed to create output directory {}: {err}",
            parent.display()
        ))
    })?;

    let mut staged = NamedTempFile::new_in(&parent).map_err(|err| {
        PkgspecError::Filesystem(format!(
            "Failed to stage output in {}: {err}",
            parent.display()
        ))
    })?;
    staged
        .write_all(contents.as_bytes())
        .and_then(|_| staged.as_file().sync_all())
        .map_err(|err| {
            PkgspecError::Filesystem(format!("Failed to write {}: {err}", path.display()))
        })?;
    staged.persist(path).map_err(|err| {
        PkgspecError::Filesystem(format!(
            "Failed to move output into {}: {}",
            path.display(),
            err.error
        ))
    })?;
    Ok(())
}
