/*============================================================
  PkgSpec Project: pkgspec
  Module: pkgspec_core::spec_writer
  ------------------------------------------------------------
  Purpose:
    Render enriched package metadata as RPM spec file text.

  Security / Safety Notes:
    Script bodies are copied verbatim from the descriptor;
    they are not inspected or sanitised.

  Dependencies:
    std::fmt::Write only.

  Operational Scope:
    Final stage of a conversion run; output is written by the
    output module or printed on --dry-run.

  Revision History:
    2025-02-11 RKM  Authored spec renderer.
    2025-03-02 RKM  Added URL, %check and prepare() support.
  ------------------------------------------------------------
  Principles Observed:
    - Deterministic output for identical input
    - Absent values are omitted, never rendered empty
============================================================*/

use std::fmt::Write;

use crate::metadata::PackageMetadata;

const FILES_SECTION: &str = "/*\n%exclude %dir /usr/bin\n%exclude %dir /usr/lib\n";

/// Render the complete spec file.
pub fn render_spec(metadata: &PackageMetadata) -> String {
    let mut spec = SpecBuilder::default();
    let rpm = &metadata.rpm;

    spec.field("Name", metadata.name.as_deref());
    spec.field("Version", metadata.version.as_deref());
    spec.field("Release", metadata.release.as_deref());
    spec.field("Summary", metadata.description.as_deref());
    spec.field("URL", metadata.url.as_deref());
    spec.fields("License", metadata.license.as_deref().unwrap_or_default());
    spec.fields("Requires", &rpm.rpm_requires);
    spec.fields("Provides", &rpm.rpm_provides);
    spec.fields("Conflicts", &rpm.rpm_conflicts);
    spec.fields("Obsoletes", &rpm.rpm_obsoletes);
    spec.fields("BuildRequires", &rpm.rpm_buildrequires);

    let versioned_name = match (&metadata.name, &metadata.version) {
        (Some(name), Some(version)) => Some(format!("{name}-{version}")),
        _ => None,
    };
    spec.field(
        "Source",
        versioned_name.as_ref().map(|base| format!("{base}.tar.gz")).as_deref(),
    );

    spec.define("__brp_mangle_shebangs", Some("%{nil}"));
    spec.define("debug_package", Some("%{nil}"));
    spec.define(
        "srcdir",
        versioned_name
            .as_ref()
            .map(|base| format!("%{{_builddir}}/{base}"))
            .as_deref(),
    );
    spec.define("pkgname", metadata.name.as_deref());
    spec.define("_pkgname", metadata.pkgbuild_pkgname.as_deref());
    spec.define("_pkgfolder", metadata.pkgbuild_pkgfolder.as_deref());

    let mut prep = String::from("%setup");
    if let Some(prepare) = wrap_script(metadata, metadata.prepare_script.as_deref()) {
        prep.push('\n');
        prep.push_str(&prepare);
    }
    spec.section("prep", Some(prep.as_str()));
    spec.section("description", metadata.description.as_deref());
    spec.section(
        "build",
        wrap_script(metadata, metadata.build_script.as_deref()).as_deref(),
    );
    spec.section(
        "check",
        wrap_script(metadata, metadata.check_script.as_deref()).as_deref(),
    );
    spec.section(
        "install",
        wrap_script(metadata, metadata.install_script.as_deref()).as_deref(),
    );
    spec.section("files", Some(FILES_SECTION));

    spec.finish()
}

/// Prefix a script body with the PKGBUILD variable bindings and aliases.
fn wrap_script(metadata: &PackageMetadata, body: Option<&str>) -> Option<String> {
    let body = body.filter(|text| !text.is_empty())?;

    let mut script = String::from(
        "    export pkgdir=\"%{buildroot}\"\n    export srcdir=\"%{srcdir}\"\n    export pkgname=\"%{pkgname}\"\n",
    );
    if metadata.pkgbuild_pkgname.is_some() {
        script.push_str("    export _pkgname=\"%{_pkgname}\"\n");
    }
    if metadata.pkgbuild_pkgfolder.is_some() {
        script.push_str("    export _pkgfolder=\"%{_pkgfolder}\"\n");
    }
    for alias in &metadata.rpm.rpm_aliases {
        let _ = writeln!(script, "    alias {alias}");
    }
    script.push_str(body);
    Some(script)
}

#[derive(Default)]
struct SpecBuilder {
    text: String,
}

impl SpecBuilder {
    fn field(&mut self, key: &str, value: Option<&str>) {
        if let Some(value) = value.filter(|value| !value.is_empty()) {
            let _ = writeln!(self.text, "{key}: {value}");
        }
    }

    fn fields(&mut self, key: &str, values: &[String]) {
        for value in values {
            self.field(key, Some(value.as_str()));
        }
    }

    fn define(&mut self, name: &str, value: Option<&str>) {
        if let Some(value) = value.filter(|value| !value.is_empty()) {
            let _ = writeln!(self.text, "%define {name} {value}");
        }
    }

    fn section(&mut self, name: &str, body: Option<&str>) {
        if let Some(body) = body.filter(|body| !body.is_empty()) {
            let _ = writeln!(self.text, "\n%{name}\n{body}");
        }
    }

    fn finish(self) -> String {
        self.text
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::metadata::RpmTranslation;

    fn strings(items: &[&str]) -> Vec<String> {
        items.iter().map(|item| item.to_string()).collect()
    }

    fn foo() -> PackageMetadata {
        PackageMetadata {
            name: Some("foo".into()),
            version: Some("1.2".into()),
            runtime_dependencies: Some(strings(&["bar", "baz"])),
            rpm: RpmTranslation {
                rpm_requires: strings(&["bar", "baz"]),
                ..RpmTranslation::default()
            },
            ..PackageMetadata::default()
        }
    }

    #[test]
    fn header_lists_fields_in_order() {
        let spec = render_spec(&foo());
        assert!(spec.starts_with(
            "Name: foo\nVersion: 1.2\nRequires: bar\nRequires: baz\nSource: foo-1.2.tar.gz\n"
        ));
        assert!(spec.contains("%define srcdir %{_builddir}/foo-1.2\n%define pkgname foo\n"));
    }

    #[test]
    fn missing_license_emits_no_license_line() {
        let spec = render_spec(&foo());
        assert!(!spec.contains("License"));
        assert!(!spec.contains("Release"));
        assert!(!spec.contains("%description"));
    }

    #[test]
    fn every_license_gets_its_own_line() {
        let metadata = PackageMetadata {
            license: Some(strings(&["MIT", "Apache-2.0"])),
            ..foo()
        };
        let spec = render_spec(&metadata);
        assert!(spec.contains("License: MIT\nLicense: Apache-2.0\n"));
    }

    #[test]
    fn scripts_get_prologue_and_aliases() {
        let mut metadata = foo();
        metadata.build_script = Some("    make".into());
        metadata.pkgbuild_pkgname = Some("foo-bin".into());
        metadata.rpm.rpm_aliases = strings(&["cmake=cmake3"]);

        let spec = render_spec(&metadata);
        let expected = "\n%build\n    export pkgdir=\"%{buildroot}\"\n    export srcdir=\"%{srcdir}\"\n    \
                        export pkgname=\"%{pkgname}\"\n    export _pkgname=\"%{_pkgname}\"\n    \
                        alias cmake=cmake3\n    make\n";
        assert!(spec.contains(expected), "{spec}");
        assert!(!spec.contains("_pkgfolder"));
        assert!(!spec.contains("%install"));
    }

    #[test]
    fn prepare_runs_after_setup() {
        let mut metadata = foo();
        metadata.prepare_script = Some("    patch -p1 < fix.patch".into());
        let spec = render_spec(&metadata);
        assert!(spec.contains("\n%prep\n%setup\n    export pkgdir="));
        assert!(spec.contains("    patch -p1 < fix.patch\n"));
    }

    #[test]
    fn files_section_is_always_present() {
        let spec = render_spec(&PackageMetadata::default());
        assert!(spec.ends_with("\n%files\n/*\n%exclude %dir /usr/bin\n%exclude %dir /usr/lib\n\n"));
        assert!(!spec.contains("Source:"));
        assert!(!spec.contains("%define srcdir"));
        assert!(spec.contains("%define debug_package %{nil}\n"));
    }

    #[test]
    fn rendering_is_deterministic() {
        let metadata = foo();
        assert_eq!(render_spec(&metadata), render_spec(&metadata));
    }
}
