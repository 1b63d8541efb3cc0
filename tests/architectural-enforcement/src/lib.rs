//! Architectural Enforcement Integration Tests
//!
//! This package contains integration tests that enforce architectural principles
//! across the overlay crates:
//! - No sleep() calls in production code (time flows through the frame ticker)
//! - No unwrap()/expect() in production code (errors are propagated or logged)
//!
//! The helpers here scan source files as text. Everything after the first
//! `#[cfg(test)]` in a file is treated as test code and ignored.

use std::fs;
use std::path::{Path, PathBuf};

/// Production source directories, relative to the workspace root
pub const PRODUCTION_DIRS: &[&str] = &["overlay/core/src", "overlay/daemon/src"];

/// A forbidden pattern found in production code
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Violation {
    /// File containing the match
    pub path: PathBuf,
    /// 1-based line number
    pub line: usize,
    /// Trimmed source line
    pub text: String,
}

impl std::fmt::Display for Violation {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{} - {}", self.path.display(), self.line, self.text)
    }
}

/// Workspace root (two levels above this package)
#[must_use]
pub fn workspace_root() -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("..")
        .join("..")
}

/// Every `.rs` file under the production directories
#[must_use]
pub fn production_files() -> Vec<PathBuf> {
    let root = workspace_root();
    let mut files = Vec::new();

    for dir in PRODUCTION_DIRS {
        let path = root.join(dir);
        if !path.exists() {
            continue;
        }
        for entry in walkdir::WalkDir::new(&path)
            .into_iter()
            .filter_map(|e| e.ok())
        {
            if entry.path().extension().and_then(|s| s.to_str()) == Some("rs") {
                files.push(entry.into_path());
            }
        }
    }

    files.sort();
    files
}

/// Code lines of `source` before its test module, with comments stripped
///
/// Yields `(line_number, code)` pairs.
#[must_use]
pub fn production_lines(source: &str) -> Vec<(usize, &str)> {
    source
        .lines()
        .enumerate()
        .take_while(|(_, line)| !line.trim_start().starts_with("#[cfg(test)]"))
        .filter(|(_, line)| !line.trim_start().starts_with("//"))
        .map(|(idx, line)| (idx + 1, line.split("//").next().unwrap_or(line)))
        .collect()
}

/// Lines in production code for which `is_violation` holds
#[must_use]
pub fn find_violations(is_violation: impl Fn(&str) -> bool) -> Vec<Violation> {
    let mut violations = Vec::new();

    for path in production_files() {
        let Ok(content) = fs::read_to_string(&path) else {
            continue;
        };
        for (line, code) in production_lines(&content) {
            if is_violation(code) {
                violations.push(Violation {
                    path: path.clone(),
                    line,
                    text: code.trim().to_string(),
                });
            }
        }
    }

    violations
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_production_lines_stop_at_test_module() {
        let source = "fn a() {}\n// note\nfn b() { x.unwrap() }\n#[cfg(test)]\nmod tests {}\n";
        let lines = production_lines(source);

        assert_eq!(lines, vec![(1, "fn a() {}"), (3, "fn b() { x.unwrap() }")]);
    }

    #[test]
    fn test_trailing_comment_is_stripped() {
        let lines = production_lines("let a = 1; // b.unwrap()");
        assert_eq!(lines, vec![(1, "let a = 1; ")]);
    }

    #[test]
    fn test_production_files_found() {
        assert!(production_files()
            .iter()
            .any(|path| path.ends_with("overlay/core/src/lib.rs")));
    }
}
