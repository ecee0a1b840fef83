/*============================================================
  PkgSpec Project: pkgspec
  Module: pkgspec_core::config
  ------------------------------------------------------------
  Purpose:
    Load the optional TOML configuration that locates the name
    mapping table, selects the extraction interpreter, and
    tunes translation behaviour.

  Security / Safety Notes:
    Read-only access to operator-controlled files.

  Dependencies:
    serde + toml for parsing, dirs for the default location.

  Operational Scope:
    Loaded once at startup; command-line flags override the
    values found here.

  Revision History:
    2025-02-11 RKM  Introduced configuration loader.
    2025-03-02 RKM  Added translate.obsoletes_from_replaces.
  ------------------------------------------------------------
  Principles Observed:
    - Missing configuration means defaults, never failure
    - Invalid configuration is reported with its path
============================================================*/

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::{PkgspecError, Result};

const CONFIG_DIR: &str = "pkgspec";
const CONFIG_FILENAME: &str = "config.toml";

/// Default name mapping table, relative to the working directory.
pub const DEFAULT_MAPPING_FILE: &str = "pkgbuild_mapping.json";
const DEFAULT_SHELL: &str = "bash";

/// Top-level configuration file schema.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PkgspecConfig {
    pub mapping: PathBuf,
    pub shell: String,
    pub log_dir: Option<PathBuf>,
    pub translate: TranslateConfig,
}

/// Controls how Arch-only fields are carried into the RPM output.
#[derive(Debug, Clone, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TranslateConfig {
    /// Map `replaces` through the name table into `Obsoletes:`.
    pub obsoletes_from_replaces: bool,
}

impl Default for PkgspecConfig {
    fn default() -> Self {
        Self {
            mapping: PathBuf::from(DEFAULT_MAPPING_FILE),
            shell: DEFAULT_SHELL.to_string(),
            log_dir: None,
            translate: TranslateConfig::default(),
        }
    }
}

impl Default for TranslateConfig {
    fn default() -> Self {
        Self {
            obsoletes_from_replaces: true,
        }
    }
}

impl PkgspecConfig {
    /// Load from an explicit path, or discover the per-user file.
    ///
    /// An explicit path must exist. The discovered location is
    /// optional and falls back to defaults when absent.
    pub fn load_from_optional_path(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(explicit) => Self::load(explicit),
            None => match default_config_path() {
                Some(candidate) if candidate.is_file() => Self::load(&candidate),
                _ => Ok(Self::default()),
            },
        }
    }

    fn load(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path).map_err(|err| {
            PkgspecError::Config(format!("Failed to read {}: {err}", path.display()))
        })?;
        toml::from_str(&content).map_err(|err| {
            PkgspecError::Config(format!("Failed to parse {}: {err}", path.display()))
        })
    }
}

fn default_config_path() -> Option<PathBuf> {
    dirs::config_dir().map(|dir| dir.join(CONFIG_DIR).join(CONFIG_FILENAME))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn partial_file_keeps_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "shell = \"/usr/bin/bash\"\n").unwrap();

        let config = PkgspecConfig::load_from_optional_path(Some(&path)).unwrap();
        assert_eq!(config.shell, "/usr/bin/bash");
        assert_eq!(config.mapping, PathBuf::from(DEFAULT_MAPPING_FILE));
        assert!(config.log_dir.is_none());
        assert!(config.translate.obsoletes_from_replaces);
    }

    #[test]
    fn full_file_is_parsed() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(
            &path,
            r#"
mapping = "/etc/pkgspec/mapping.json"
log_dir = "/tmp/pkgspec-logs"

[translate]
obsoletes_from_replaces = false
"#,
        )
        .unwrap();

        let config = PkgspecConfig::load_from_optional_path(Some(&path)).unwrap();
        assert_eq!(config.mapping, PathBuf::from("/etc/pkgspec/mapping.json"));
        assert_eq!(config.log_dir, Some(PathBuf::from("/tmp/pkgspec-logs")));
        assert!(!config.translate.obsoletes_from_replaces);
    }

    #[test]
    fn explicit_missing_file_is_an_error() {
        let dir = TempDir::new().unwrap();
        let err = PkgspecConfig::load_from_optional_path(Some(&dir.path().join("nope.toml")))
            .unwrap_err();
        assert!(matches!(err, PkgspecError::Config(_)));
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        std::fs::write(&path, "mapings = \"typo.json\"\n").unwrap();

        let err = PkgspecConfig::load_from_optional_path(Some(&path)).unwrap_err();
        assert!(err.to_string().contains("Failed to parse"));
    }
}
