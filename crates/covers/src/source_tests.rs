// SPDX-License-Identifier: MIT
// Copyright (c) 2026 Alfred Jean LLC

#![allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]

use yare::parameterized;

use super::*;
use crate::error::ErrorKind;
use crate::test_utils::{create_tree, temp_package};

#[parameterized(
    neither = { "fn f() {}", false, false },
    tag_only = { "fn f() {} //covers:t", true, false },
    probe_only = { "fn f() { covers::probe!(); }", false, true },
    both = { "fn f() { covers::probe!(); } //covers:t", true, true },
)]
fn prefilter_classifies_text(text: &str, tags: bool, probes: bool) {
    let prefilter = Prefilter::new().unwrap();
    assert_eq!(prefilter.classify(text), (tags, probes));
}

#[parameterized(
    empty = { "", 0 },
    one_unterminated = { "a", 1 },
    one_terminated = { "a\n", 1 },
    three = { "a\nb\nc", 3 },
)]
fn counts_lines(text: &str, expected: usize) {
    let file = SourceFile {
        path: PathBuf::from("x.rs"),
        text: text.to_string(),
        has_tags: false,
        has_probes: false,
    };
    assert_eq!(file.line_count(), expected);
}

#[test]
fn loads_only_relevant_files_sorted() {
    let tmp = temp_package(&[
        ("src/lib.rs", "mod b;\nmod a;\n"),
        ("src/b.rs", "pub fn b() { covers::probe!(); }\n"),
        ("src/a.rs", "pub fn a() {} //covers:a\n"),
    ]);
    let module = ModuleRoot::load(tmp.path()).unwrap();

    let sources = load_sources(&module, &Config::default()).unwrap();

    let names: Vec<_> = sources
        .iter()
        .map(|s| s.path.file_name().unwrap().to_string_lossy().into_owned())
        .collect();
    assert_eq!(names, vec!["a.rs", "b.rs"]);
    assert!(sources[0].has_tags && !sources[0].has_probes);
    assert!(sources[1].has_probes && !sources[1].has_tags);
    assert!(sources.iter().all(|s| s.path.is_absolute()));
}

#[test]
fn applies_config_excludes() {
    let tmp = temp_package(&[
        ("src/lib.rs", "//covers:kept\n"),
        ("tests/fixtures/broken.rs", "//covers:skipped\n"),
    ]);
    let module = ModuleRoot::load(tmp.path()).unwrap();
    let mut config = Config::default();
    config.scan.exclude = vec!["tests/fixtures".to_string()];

    let paths = source_paths(&module, &config).unwrap();

    assert_eq!(paths, vec![module.package_dir.join("src/lib.rs")]);
}

#[test]
fn adds_config_includes_relative_to_package() {
    let tmp = tempfile::TempDir::new().unwrap();
    std::fs::create_dir(tmp.path().join(".git")).unwrap();
    create_tree(
        tmp.path(),
        &[
            ("pkg/Cargo.toml", "[package]\nname = \"pkg\"\n"),
            ("pkg/src/lib.rs", ""),
            ("shared/util.rs", ""),
        ],
    );
    let module = ModuleRoot::load(&tmp.path().join("pkg")).unwrap();
    let mut config = Config::default();
    config.scan.include = vec!["../shared".to_string()];

    let paths = source_paths(&module, &config).unwrap();

    let shared = tmp.path().canonicalize().unwrap().join("shared/util.rs");
    assert_eq!(paths, vec![module.package_dir.join("src/lib.rs"), shared]);
}

#[test]
fn missing_include_is_resolution_error() {
    let tmp = temp_package(&[("src/lib.rs", "")]);
    let module = ModuleRoot::load(tmp.path()).unwrap();
    let mut config = Config::default();
    config.scan.include = vec!["does/not/exist".to_string()];

    let err = source_paths(&module, &config).unwrap_err();
    assert!(matches!(err, Error::Resolution { .. }), "{err:?}");
}

#[test]
fn unreadable_source_root_is_resolution_error() {
    let tmp = temp_package(&[("src/lib.rs", "")]);
    let mut module = ModuleRoot::load(tmp.path()).unwrap();
    module.extra_roots.push(tmp.path().join("moved/away"));

    let err = source_paths(&module, &Config::default()).unwrap_err();

    assert_eq!(err.kind(), ErrorKind::Resolution);
    let Error::Resolution { path, reason } = err else {
        panic!("expected resolution error");
    };
    assert!(path.ends_with("moved/away"), "{}", path.display());
    assert!(reason.starts_with("walk failed with 1 error(s): "), "{reason}");
}
