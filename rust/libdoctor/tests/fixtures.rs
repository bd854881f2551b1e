//! Test harness for the checker against fixture files.
//!
//! Reads the corpora under test/:
//! - test/bad/*.yaml must produce the issues listed in the companion
//!   .issues file and, when fixing, the exact .fixed output;
//! - test/good/*.yaml must check clean;
//! - test/md/*.md exercise front-matter splitting end to end.
//!
//! Fixed output is additionally re-checked: a second pass must find
//! nothing left to fix and must not change the text again.

use std::fs;
use std::path::{Path, PathBuf};

use libdoctor::{check, check_file, frontmatter, CheckOptions, CheckReport, Level};

/// Root test directory.
fn test_root() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .parent()
        .unwrap()
        .parent()
        .unwrap()
        .join("test")
}

/// All files with a given extension in a subdirectory of test/.
fn files_in(subdir: &str, ext: &str) -> Vec<PathBuf> {
    let dir = test_root().join(subdir);
    let mut files: Vec<PathBuf> = Vec::new();
    if let Ok(entries) = fs::read_dir(&dir) {
        for entry in entries.flatten() {
            let path = entry.path();
            if path.extension().map(|e| e == ext).unwrap_or(false) {
                files.push(path);
            }
        }
    }
    files.sort();
    files
}

fn companion(path: &Path, ext: &str) -> Option<String> {
    fs::read_to_string(path.with_extension(ext)).ok()
}

fn render_issues(report: &CheckReport) -> String {
    report
        .issues
        .iter()
        .map(|issue| issue.to_string())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Run one bad fixture through both modes.
fn run_bad_fixture(path: &Path) -> Result<(), String> {
    let name = path.file_name().unwrap().to_string_lossy().to_string();
    let input = fs::read_to_string(path).map_err(|e| format!("{}: {}", name, e))?;

    // Plain check: no fixed output, but the same faults at the same marks.
    let plain = check(&input, &CheckOptions::default())
        .map_err(|e| format!("{}: {}", name, e))?;
    if plain.fixed.is_some() {
        return Err(format!("{}: fixed output without fix requested", name));
    }
    if plain.issues.iter().any(|i| i.level == Level::Fixed) {
        return Err(format!("{}: fixed-level issue without fix requested", name));
    }
    for issue in &plain.issues {
        if issue.mark.position > input.len() {
            return Err(format!(
                "{}: mark {} outside the source",
                name, issue.mark.position
            ));
        }
    }

    // Fixing check, against the .issues and .fixed companions.
    let options = CheckOptions {
        fix: true,
        ..CheckOptions::default()
    };
    let fixing = check(&input, &options).map_err(|e| format!("{}: {}", name, e))?;

    if plain.issues.len() != fixing.issues.len() {
        return Err(format!(
            "{}: issue count differs between modes ({} vs {})",
            name,
            plain.issues.len(),
            fixing.issues.len()
        ));
    }
    for (a, b) in plain.issues.iter().zip(fixing.issues.iter()) {
        if a.mark != b.mark || a.reason != b.reason {
            return Err(format!("{}: issue drifted between modes", name));
        }
    }

    if let Some(expected) = companion(path, "issues") {
        let actual = render_issues(&fixing);
        if actual.trim_end() != expected.trim_end() {
            return Err(format!(
                "{}: issue mismatch\n  expected:\n{}\n  actual:\n{}",
                name, expected, actual
            ));
        }
    }

    let fixed = fixing
        .fixed
        .ok_or_else(|| format!("{}: no fixed output", name))?;
    if let Some(expected) = companion(path, "fixed") {
        if fixed != expected {
            return Err(format!(
                "{}: fixed output mismatch\n  expected:\n{:?}\n  actual:\n{:?}",
                name, expected, fixed
            ));
        }
    }

    // Idempotence: a second pass has nothing left to repair.
    let again = check(&fixed, &options).map_err(|e| format!("{}: {}", name, e))?;
    if again.issues.iter().any(|i| i.level == Level::Fixed) {
        return Err(format!("{}: second pass still fixes something", name));
    }
    if again.fixed.as_deref() != Some(fixed.as_str()) {
        return Err(format!("{}: second pass changed the output again", name));
    }

    println!("  {} => ok", name);
    Ok(())
}

#[test]
fn test_bad_fixtures() {
    let files = files_in("bad", "yaml");
    assert!(!files.is_empty(), "no bad fixtures found");

    let mut failed = 0;
    let mut errors: Vec<String> = Vec::new();
    for file in &files {
        if let Err(e) = run_bad_fixture(file) {
            failed += 1;
            errors.push(e);
        }
    }
    for error in &errors {
        println!("  - {}", error);
    }
    assert!(failed == 0, "{} bad fixtures failed", failed);
}

#[test]
fn test_good_fixtures() {
    let files = files_in("good", "yaml");
    assert!(!files.is_empty(), "no good fixtures found");

    for file in &files {
        let name = file.file_name().unwrap().to_string_lossy().to_string();
        let input = fs::read_to_string(file).unwrap();
        let report = check(&input, &CheckOptions::default()).unwrap();
        assert!(
            report.issues.is_empty(),
            "{}: unexpected issues: {}",
            name,
            render_issues(&report)
        );

        // The fixer never rewrites valid YAML.
        let options = CheckOptions {
            fix: true,
            ..CheckOptions::default()
        };
        let fixing = check(&input, &options).unwrap();
        assert_eq!(fixing.fixed.as_deref(), Some(input.as_str()), "{}", name);
        println!("  {} => ok", name);
    }
}

#[test]
fn test_md_fixtures() {
    let files = files_in("md", "md");
    assert!(!files.is_empty(), "no markdown fixtures found");

    for file in &files {
        let name = file.file_name().unwrap().to_string_lossy().to_string();
        let content = fs::read_to_string(file).unwrap();
        let options = CheckOptions {
            fix: true,
            write: false,
            ..CheckOptions::default()
        };
        let report = check_file(&file.to_string_lossy(), Some(&content), &options).unwrap();
        let fixed = report.fixed.expect("fixed output");
        if let Some(expected) = companion(file, "fixed") {
            assert_eq!(fixed, expected, "{}", name);
        } else {
            // No companion: the page must pass through untouched.
            assert_eq!(fixed, content, "{}", name);
            assert!(report.issues.is_empty(), "{}", name);
        }
        println!("  {} => ok", name);
    }
}

#[test]
fn test_md_split_round_trip() {
    for file in files_in("md", "md") {
        let content = fs::read_to_string(&file).unwrap();
        let (meta, body) = frontmatter::split(&content);
        if meta.is_empty() || meta.starts_with("---") {
            assert_eq!(
                frontmatter::join(meta, body),
                content,
                "{:?} did not round-trip",
                file
            );
        }
    }
}

// Seed scenarios, pinned as direct tests as well as fixtures.

#[test]
fn test_unescaped_single_quote() {
    let options = CheckOptions {
        fix: true,
        ..CheckOptions::default()
    };
    let report = check("some_key: 'it's a bequot'd string'", &options).unwrap();
    assert_eq!(report.issues.len(), 2);
    assert_eq!(report.issues[0].reason, "unescaped quote in quoted string");
    assert_eq!(report.issues[0].mark.line, 0);
    assert_eq!(report.issues[0].mark.column, 13);
    assert_eq!(
        report.fixed.as_deref(),
        Some("some_key: 'it''s a bequot''d string'")
    );
}

#[test]
fn test_at_sign_value() {
    let report = check("some_key: @at sign value", &CheckOptions::default()).unwrap();
    assert_eq!(report.issues.len(), 1);
    assert_eq!(report.issues[0].level, Level::Warning);
    assert_eq!(report.issues[0].reason, "'@' cannot start any token");

    let options = CheckOptions {
        fix: true,
        ..CheckOptions::default()
    };
    let fixing = check("some_key: @at sign value", &options).unwrap();
    assert_eq!(fixing.issues[0].level, Level::Fixed);
    assert_eq!(fixing.fixed.as_deref(), Some("some_key: \"@at sign value\""));
}

#[test]
fn test_unterminated_double_quote() {
    let input = "unending_string: \"Didn't you say please,\" I asked.\na_separate_value: \"Indeed.\"";
    let options = CheckOptions {
        fix: true,
        ..CheckOptions::default()
    };
    let report = check(input, &options).unwrap();
    assert_eq!(report.issues.len(), 2);
    assert_eq!(report.issues[0].reason, "unescaped quote in quoted string");
    assert_eq!(report.issues[0].mark.column, 40);
    assert_eq!(report.issues[1].reason, "quoted string has no end quote");
    assert_eq!(report.issues[1].mark.column, 50);
    assert_eq!(
        report.fixed.as_deref(),
        Some(
            "unending_string: \"\\\"Didn't you say please,\\\" I asked.\"\na_separate_value: \"Indeed.\""
        )
    );
}

#[test]
fn test_non_printables_removed() {
    let input = "has_unprintables: text\u{8}<-backspace char\u{6}<-acknowledge char";
    let report = check(input, &CheckOptions::default()).unwrap();
    assert_eq!(report.issues.len(), 2);
    assert_eq!(report.issues[0].mark.column, 22);
    assert_eq!(report.issues[1].mark.column, 39);
    assert_eq!(report.issues[0].level, Level::Error);

    let options = CheckOptions {
        fix: true,
        ..CheckOptions::default()
    };
    let fixing = check(input, &options).unwrap();
    assert_eq!(
        fixing.fixed.as_deref(),
        Some("has_unprintables: text<-backspace char<-acknowledge char")
    );
    assert!(fixing.issues.iter().all(|i| i.level == Level::Fixed));
}

#[test]
fn test_non_printables_kept_when_asked() {
    let input = "key: a\u{8}b";
    let options = CheckOptions {
        fix: true,
        remove_invalid_characters: false,
        ..CheckOptions::default()
    };
    let report = check(input, &options).unwrap();
    assert_eq!(report.issues.len(), 1);
    assert_eq!(report.issues[0].level, Level::Error);
    // The parse buffer drops the character; the fixed output keeps it.
    assert_eq!(report.fixed.as_deref(), Some(input));
}

#[test]
fn test_deficient_indentation_padding() {
    let input =
        "some_key:\n  indented_key: \"some multiline value that\nis unindented\n which really is not cool.\"";
    let plain = check(input, &CheckOptions::default()).unwrap();
    assert_eq!(plain.issues.len(), 2);
    assert!(plain
        .issues
        .iter()
        .all(|i| i.level == Level::Warning && i.reason == "deficient indentation"));
    assert_eq!(plain.issues[0].mark.line, 2);
    assert_eq!(plain.issues[1].mark.line, 3);

    let options = CheckOptions {
        fix: true,
        ..CheckOptions::default()
    };
    let fixing = check(input, &options).unwrap();
    assert_eq!(
        fixing.fixed.as_deref(),
        Some(
            "some_key:\n  indented_key: \"some multiline value that\n    is unindented\n    which really is not cool.\""
        )
    );
    assert!(fixing.issues.iter().all(|i| i.level == Level::Fixed));
}

#[test]
fn test_unquoted_template_variables() {
    let input = "a_list:\n  - {{ this_is_not_actually_a_variable }}\n  -  \"{{ this_is_a_variable }}\"\n  - an_object: {{ with_not_a_variable }}";
    let plain = check(input, &CheckOptions::default()).unwrap();
    assert_eq!(plain.issues.len(), 2);
    assert!(plain.issues.iter().all(|i| i.level == Level::Warning));

    let options = CheckOptions {
        fix: true,
        ..CheckOptions::default()
    };
    let fixing = check(input, &options).unwrap();
    assert_eq!(
        fixing.fixed.as_deref(),
        Some(
            "a_list:\n  - '{{ this_is_not_actually_a_variable }}'\n  -  \"{{ this_is_a_variable }}\"\n  - an_object: '{{ with_not_a_variable }}'"
        )
    );
}

#[test]
fn test_valid_yaml_is_untouched() {
    let input = "name: ok\nitems:\n  - 1\n  - 2\n";
    let options = CheckOptions {
        fix: true,
        ..CheckOptions::default()
    };
    let report = check(input, &options).unwrap();
    assert!(report.issues.is_empty());
    assert_eq!(report.fixed.as_deref(), Some(input));
}

#[test]
fn test_no_fix_returns_no_buffer() {
    let report = check("key: value", &CheckOptions::default()).unwrap();
    assert!(report.fixed.is_none());
}
