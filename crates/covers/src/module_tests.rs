// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

use std::fs;

use tempfile::TempDir;

use super::*;
use crate::test_utils::{create_tree, temp_package};

#[test]
fn loads_package_name_and_dir() {
    let tmp = temp_package(&[("src/lib.rs", "")]);

    let module = ModuleRoot::load(tmp.path()).unwrap();

    assert_eq!(module.name, "demo");
    assert_eq!(module.package_dir, tmp.path().canonicalize().unwrap());
    assert_eq!(module.workspace_root, module.package_dir);
    assert!(module.extra_roots.is_empty());
    assert_eq!(module.source_roots(), vec![module.package_dir.clone()]);
}

#[test]
fn missing_manifest_is_resolution_error() {
    let tmp = TempDir::new().unwrap();

    let err = ModuleRoot::load(tmp.path()).unwrap_err();
    assert!(matches!(err, Error::Resolution { .. }), "{err:?}");
}

#[test]
fn missing_directory_is_resolution_error() {
    let tmp = TempDir::new().unwrap();

    let err = ModuleRoot::load(&tmp.path().join("gone")).unwrap_err();
    assert!(matches!(err, Error::Resolution { .. }), "{err:?}");
}

#[test]
fn manifest_without_package_is_resolution_error() {
    let tmp = TempDir::new().unwrap();
    create_tree(tmp.path(), &[("Cargo.toml", "[workspace]\nmembers = []\n")]);

    let err = ModuleRoot::load(tmp.path()).unwrap_err();
    assert!(err.to_string().contains("no [package] name"), "{err}");
}

#[test]
fn malformed_manifest_is_resolution_error() {
    let tmp = TempDir::new().unwrap();
    create_tree(tmp.path(), &[("Cargo.toml", "[package\n")]);

    let err = ModuleRoot::load(tmp.path()).unwrap_err();
    assert!(matches!(err, Error::Resolution { .. }), "{err:?}");
}

#[test]
fn targets_outside_package_become_extra_roots() {
    let tmp = TempDir::new().unwrap();
    fs::create_dir(tmp.path().join(".git")).unwrap();
    create_tree(
        tmp.path(),
        &[
            ("Cargo.toml", "[workspace]\nmembers = [\"crates/app\"]\n"),
            (
                "crates/app/Cargo.toml",
                r#"
[package]
name = "app"
version = "0.1.0"

[[test]]
name = "specs"
path = "../../tests/specs.rs"

[[test]]
name = "inside"
path = "tests/inside.rs"

[[bench]]
name = "gone"
path = "../../benches/gone.rs"
"#,
            ),
            ("crates/app/src/lib.rs", ""),
            ("crates/app/tests/inside.rs", ""),
            ("tests/specs.rs", "mod prelude;"),
            ("tests/specs/prelude.rs", ""),
        ],
    );
    let root = tmp.path().canonicalize().unwrap();

    let module = ModuleRoot::load(&tmp.path().join("crates/app")).unwrap();

    assert_eq!(module.workspace_root, root);
    assert_eq!(
        module.extra_roots,
        vec![root.join("tests/specs"), root.join("tests/specs.rs")]
    );
}

#[test]
fn lib_target_outside_uses_parent_as_module_dir() {
    let tmp = TempDir::new().unwrap();
    fs::create_dir(tmp.path().join(".git")).unwrap();
    create_tree(
        tmp.path(),
        &[
            (
                "pkg/Cargo.toml",
                "[package]\nname = \"pkg\"\n\n[lib]\npath = \"../shared/lib.rs\"\n",
            ),
            ("shared/lib.rs", "mod util;"),
            ("shared/util.rs", ""),
        ],
    );
    let root = tmp.path().canonicalize().unwrap();

    let module = ModuleRoot::load(&tmp.path().join("pkg")).unwrap();

    assert_eq!(
        module.extra_roots,
        vec![root.join("shared"), root.join("shared/lib.rs")]
    );
}

#[test]
fn workspace_root_stops_at_git_root() {
    let tmp = TempDir::new().unwrap();
    create_tree(
        tmp.path(),
        &[
            ("Cargo.toml", "[workspace]\n"),
            ("repo/pkg/Cargo.toml", "[package]\nname = \"pkg\"\n"),
        ],
    );
    fs::create_dir(tmp.path().join("repo/.git")).unwrap();

    let pkg = tmp.path().join("repo/pkg");
    assert_eq!(workspace_root(&pkg), pkg);
}
