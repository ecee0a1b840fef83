/*============================================================
  PkgSpec Project: pkgspec
  Module: pkgspec_core::metadata
  ------------------------------------------------------------
  Purpose:
    The package metadata extracted from a PKGBUILD and the RPM
    translation attached to it before emission.

  Security / Safety Notes:
    Pure data container; no I/O performed in this module.

  Dependencies:
    serde for the JSON output shape.

  Operational Scope:
    Built once per run from the diffed environment, enriched
    in place, then consumed by the spec writer and JSON output.

  Revision History:
    2025-02-11 RKM  Replaced VersionInfo with PackageMetadata.
    2025-03-02 RKM  Obsoletes derived from replaces (switchable).
  ------------------------------------------------------------
  Principles Observed:
    - Every field independently optional
    - Only descriptor-defined values, never interpreter defaults
============================================================*/

use serde::Serialize;

use crate::dump::Environment;
use crate::logger::Logger;
use crate::mapping::NameMapping;
use crate::value::ShellValue;

/// Metadata read from one PKGBUILD.
///
/// JSON keys follow the PKGBUILD variable names.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct PackageMetadata {
    pub name: Option<String>,
    pub version: Option<String>,
    pub release: Option<String>,
    pub description: Option<String>,
    pub url: Option<String>,
    pub source: Option<Vec<String>>,
    pub sha256sums: Option<Vec<String>>,
    pub md5sums: Option<Vec<String>>,
    #[serde(rename = "makedepends")]
    pub build_dependencies: Option<Vec<String>>,
    #[serde(rename = "depends")]
    pub runtime_dependencies: Option<Vec<String>>,
    pub provides: Option<Vec<String>>,
    pub replaces: Option<Vec<String>>,
    pub conflicts: Option<Vec<String>>,
    pub license: Option<Vec<String>>,
    #[serde(rename = "arch")]
    pub architectures: Option<Vec<String>>,
    #[serde(rename = "prepare()")]
    pub prepare_script: Option<String>,
    #[serde(rename = "build()")]
    pub build_script: Option<String>,
    #[serde(rename = "check()")]
    pub check_script: Option<String>,
    #[serde(rename = "package()")]
    pub install_script: Option<String>,
    /// `_pkgname`, passed through untouched.
    pub pkgbuild_pkgname: Option<String>,
    /// `_pkgfolder`, passed through untouched.
    pub pkgbuild_pkgfolder: Option<String>,
    #[serde(flatten)]
    pub rpm: RpmTranslation,
}

/// Translated package sets; empty until [`PackageMetadata::enrich`] runs.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RpmTranslation {
    pub rpm_requires: Vec<String>,
    pub rpm_provides: Vec<String>,
    pub rpm_conflicts: Vec<String>,
    pub rpm_obsoletes: Vec<String>,
    pub rpm_buildrequires: Vec<String>,
    pub rpm_aliases: Vec<String>,
    pub rpm_extra_deps: Vec<String>,
    pub rpm_devel: Vec<String>,
}

/// Knobs for [`PackageMetadata::enrich`].
#[derive(Debug, Clone, Copy)]
pub struct EnrichOptions {
    pub obsoletes_from_replaces: bool,
}

impl PackageMetadata {
    /// Read the fields a PKGBUILD defines from its diffed environment.
    pub fn from_environment(env: &Environment, logger: &Logger) -> Self {
        let scalar = |key: &str| read_scalar(env, key, logger);
        let list = |key: &str| read_list(env, key);
        let function = |key: &str| env.function(key).and_then(ShellValue::into_scalar);

        Self {
            name: scalar("pkgname"),
            version: scalar("pkgver"),
            release: scalar("pkgrel"),
            description: scalar("pkgdesc"),
            url: scalar("url"),
            source: list("source"),
            sha256sums: list("sha256sums"),
            md5sums: list("md5sums"),
            build_dependencies: list("makedepends"),
            runtime_dependencies: list("depends"),
            provides: list("provides"),
            replaces: list("replaces"),
            conflicts: list("conflicts"),
            license: list("license"),
            architectures: list("arch"),
            prepare_script: function("prepare"),
            build_script: function("build"),
            check_script: function("check"),
            install_script: function("package"),
            pkgbuild_pkgname: scalar("_pkgname"),
            pkgbuild_pkgfolder: scalar("_pkgfolder"),
            rpm: RpmTranslation::default(),
        }
    }

    /// Attach the RPM translation of every dependency-like field.
    pub fn enrich(&mut self, mapping: &NameMapping, options: EnrichOptions) {
        let map = |list: &Option<Vec<String>>| mapping.map_packages(list.as_deref().unwrap_or(&[]));

        let requires = map(&self.runtime_dependencies).packages;
        let build = map(&self.build_dependencies);
        let obsoletes = if options.obsoletes_from_replaces {
            map(&self.replaces).packages
        } else {
            Vec::new()
        };
        let own_name: Vec<String> = self.name.iter().cloned().collect();
        let extra_deps = mapping.map_packages(&own_name).extra_deps;

        let devel = requires
            .iter()
            .chain(&build.packages)
            .chain(&extra_deps)
            .map(|package| format!("{package}-devel"))
            .collect();

        self.rpm = RpmTranslation {
            rpm_provides: map(&self.provides).packages,
            rpm_conflicts: map(&self.conflicts).packages,
            rpm_obsoletes: obsoletes,
            rpm_buildrequires: build.packages,
            rpm_aliases: build.aliases,
            rpm_extra_deps: extra_deps,
            rpm_devel: devel,
            rpm_requires: requires,
        };
    }
}

fn read_scalar(env: &Environment, key: &str, logger: &Logger) -> Option<String> {
    let value = env.variable(key)?;
    if value.is_list() {
        logger.warn(
            "DECODE",
            format!("{key} is an array; using its first element"),
        );
    }
    value.into_scalar()
}

fn read_list(env: &Environment, key: &str) -> Option<Vec<String>> {
    env.variable(key).map(ShellValue::into_list)
}
