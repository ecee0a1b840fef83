//! End-to-end conversion through the `pkgspec` binary.
//!
//! These tests run a real `bash` to evaluate the PKGBUILD fixtures.

use std::fs;
use std::path::Path;

use assert_cmd::Command;
use predicates::prelude::*;
use tempfile::TempDir;

const FOO_PKGBUILD: &str = r#"
pkgname=foo
pkgver=1.2
pkgrel=1
pkgdesc="Foo, the \"friendly\" tool"
depends=(bar baz)
makedepends=('cmake>=3.20' python)
arch=('x86_64')

build() {
    cmake -B build
    make -C build
}

package() {
    make -C build DESTDIR="$pkgdir" install
}
"#;

/// Working directory holding a PKGBUILD, a mapping table and a config
/// file so the user's own configuration never leaks into a test.
fn workspace(pkgbuild: &str, mapping: &str) -> TempDir {
    let dir = TempDir::new().unwrap();
    fs::write(dir.path().join("PKGBUILD"), pkgbuild).unwrap();
    fs::write(dir.path().join("pkgbuild_mapping.json"), mapping).unwrap();
    fs::write(dir.path().join("pkgspec.toml"), "shell = \"bash\"\n").unwrap();
    dir
}

fn pkgspec(dir: &Path) -> Command {
    let mut cmd = Command::cargo_bin("pkgspec").unwrap();
    cmd.current_dir(dir)
        .arg("--config")
        .arg("pkgspec.toml")
        .arg("PKGBUILD")
        .arg("out/foo");
    cmd
}

fn read(dir: &Path, name: &str) -> String {
    fs::read_to_string(dir.join(name)).unwrap()
}

#[test]
fn unmapped_dependencies_pass_through_in_order() {
    let dir = workspace(FOO_PKGBUILD, "{}");
    pkgspec(dir.path()).assert().success();

    let spec = read(dir.path(), "out/foo.spec");
    assert!(spec.contains("Name: foo\n"));
    assert!(spec.contains("Version: 1.2\n"));
    assert!(spec.contains("Summary: Foo, the \"friendly\" tool\n"));
    assert!(spec.contains("Requires: bar\nRequires: baz\n"));
    assert!(spec.contains("BuildRequires: cmake\nBuildRequires: python\n"));
    assert!(spec.contains("\n%install\n    export pkgdir=\"%{buildroot}\"\n"));
    assert!(spec.contains("    make -C build DESTDIR=\"$pkgdir\" install\n"));
}

#[test]
fn missing_license_produces_no_license_line() {
    let dir = workspace(FOO_PKGBUILD, "{}");
    pkgspec(dir.path()).assert().success();

    let spec = read(dir.path(), "out/foo.spec");
    assert_eq!(spec.matches("License:").count(), 0);
}

#[test]
fn mapping_table_rewrites_names_and_adds_aliases() {
    let dir = workspace(
        FOO_PKGBUILD,
        r#"{
            "bar": {"packages": ["bar-libs", "bar-tools"]},
            "cmake": {"packages": ["cmake3"], "aliases": ["cmake=cmake3"]},
            "foo": {"extra_deps": ["foo-data"]}
        }"#,
    );
    pkgspec(dir.path()).assert().success();

    let spec = read(dir.path(), "out/foo.spec");
    assert!(spec.contains("Requires: bar-libs\nRequires: bar-tools\nRequires: baz\n"));
    assert!(spec.contains("BuildRequires: cmake3\n"));
    assert!(spec.contains("    alias cmake=cmake3\n    cmake -B build;\n"));

    let json: serde_json::Value = serde_json::from_str(&read(dir.path(), "out/foo.json")).unwrap();
    assert_eq!(json["depends"], serde_json::json!(["bar", "baz"]));
    assert_eq!(json["makedepends"], serde_json::json!(["cmake>=3.20", "python"]));
    assert_eq!(json["rpm_extra_deps"], serde_json::json!(["foo-data"]));
    assert_eq!(
        json["rpm_devel"],
        serde_json::json!([
            "bar-libs-devel",
            "bar-tools-devel",
            "baz-devel",
            "cmake3-devel",
            "python-devel",
            "foo-data-devel"
        ])
    );
    assert!(json["license"].is_null());
}

#[test]
fn non_ascii_values_survive_the_c_locale_dump() {
    let pkgbuild = "pkgname=cafe\npkgver=1.0\npkgdesc=\"Café tool\"\nlicense=(\"Café\" MIT)\n";
    let dir = workspace(pkgbuild, "{}");
    pkgspec(dir.path()).assert().success();

    let spec = read(dir.path(), "out/foo.spec");
    assert!(spec.contains("Summary: Café tool\n"));
    assert!(spec.contains("License: Café\nLicense: MIT\n"));
    assert!(spec.contains("\n%description\nCafé tool\n"));

    let json: serde_json::Value = serde_json::from_str(&read(dir.path(), "out/foo.json")).unwrap();
    assert_eq!(json["description"], "Café tool");
    assert_eq!(json["license"], serde_json::json!(["Café", "MIT"]));
}

#[test]
fn repeated_runs_are_byte_identical() {
    let dir = workspace(FOO_PKGBUILD, r#"{"bar": {"packages": ["bar2"]}}"#);

    pkgspec(dir.path()).assert().success();
    let first = (read(dir.path(), "out/foo.json"), read(dir.path(), "out/foo.spec"));
    pkgspec(dir.path()).assert().success();
    let second = (read(dir.path(), "out/foo.json"), read(dir.path(), "out/foo.spec"));

    assert_eq!(first, second);
}

#[test]
fn prepare_and_check_functions_become_sections() {
    let pkgbuild = format!(
        "{FOO_PKGBUILD}\nprepare() {{\n    patch -p1 < fix.patch\n}}\ncheck() {{\n    make test\n}}\n"
    );
    let dir = workspace(&pkgbuild, "{}");
    pkgspec(dir.path()).assert().success();

    let spec = read(dir.path(), "out/foo.spec");
    assert!(spec.contains("\n%prep\n%setup\n    export pkgdir="));
    assert!(spec.contains("    patch -p1 < fix.patch\n"));
    assert!(spec.contains("\n%check\n"));
    assert!(spec.contains("    make test\n"));
}

#[test]
fn dry_run_prints_spec_without_writing() {
    let dir = workspace(FOO_PKGBUILD, "{}");
    pkgspec(dir.path())
        .arg("--dry-run")
        .assert()
        .success()
        .stdout(predicate::str::starts_with("Name: foo\n"));

    assert!(!dir.path().join("out").exists());
}

#[test]
fn shell_errors_abort_with_the_diagnostic() {
    let dir = workspace("pkgname=foo\nno_such_command_pkgspec\n", "{}");
    pkgspec(dir.path())
        .assert()
        .code(11)
        .stderr(predicate::str::contains("[PkgSpec] Shell extraction failed"))
        .stderr(predicate::str::contains("no_such_command_pkgspec"))
        .stderr(predicate::str::contains("[FATAL]").not());

    assert!(!dir.path().join("out/foo.spec").exists());
}

#[test]
fn invalid_mapping_file_is_fatal() {
    let dir = workspace(FOO_PKGBUILD, "{ this is not json");
    pkgspec(dir.path())
        .assert()
        .code(21)
        .stderr(predicate::str::contains("invalid JSON"));
}

#[test]
fn missing_mapping_file_is_fatal() {
    let dir = workspace(FOO_PKGBUILD, "{}");
    fs::remove_file(dir.path().join("pkgbuild_mapping.json")).unwrap();
    pkgspec(dir.path()).assert().code(21);
}

#[test]
fn mapping_path_can_be_overridden() {
    let dir = workspace(FOO_PKGBUILD, "{}");
    fs::write(
        dir.path().join("custom.json"),
        r#"{"baz": {"packages": []}}"#,
    )
    .unwrap();
    pkgspec(dir.path())
        .arg("--mapping")
        .arg("custom.json")
        .assert()
        .success();

    let spec = read(dir.path(), "out/foo.spec");
    assert!(spec.contains("Requires: bar\n"));
    assert!(!spec.contains("Requires: baz"));
}
