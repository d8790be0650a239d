//! `.lumioignore` pattern matching.
//!
//! A deliberately reduced grammar, not full gitignore semantics: a pattern
//! ending in `/` excludes everything under a directory of that name (or under
//! that root-anchored prefix when the pattern has interior separators), a
//! pattern without `/` matches the final path segment (with `*` wildcards),
//! and a pattern containing `/` matches the whole path. No negation, no `**`.

use glob::{MatchOptions, Pattern};

/// Always-excluded paths, applied on top of user patterns.
pub const DEFAULT_PATTERNS: &[&str] = &[
    "README.md",
    "LICENSE",
    "LICENSE.*",
    ".lumioignore",
    ".git/",
    ".github/",
    "node_modules/",
    "vendor/",
];

/// Parse raw ignore-file text into patterns. `#` comments and blank lines
/// are dropped.
#[must_use]
pub fn parse_patterns(text: &str) -> Vec<String> {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(String::from)
        .collect()
}

/// Whether `path` is excluded by the user patterns or the built-in defaults.
#[must_use]
pub fn is_ignored(path: &str, patterns: &[String]) -> bool {
    let path = path.trim_start_matches('/');
    DEFAULT_PATTERNS
        .iter()
        .copied()
        .chain(patterns.iter().map(String::as_str))
        .any(|pattern| matches_pattern(path, pattern))
}

fn glob_options() -> MatchOptions {
    MatchOptions {
        // `*` must not cross path separators
        require_literal_separator: true,
        ..MatchOptions::new()
    }
}

fn matches_pattern(path: &str, pattern: &str) -> bool {
    let pattern = pattern.trim();
    if pattern.is_empty() {
        return false;
    }

    if let Some(dir) = pattern.strip_suffix('/') {
        if dir.contains('/') {
            // Root-anchored directory prefix
            return path
                .strip_prefix(dir)
                .is_some_and(|rest| rest.starts_with('/'));
        }
        // Bare directory name: matches any non-final path segment
        let segments: Vec<&str> = path.split('/').collect();
        return segments.len() > 1 && segments[..segments.len() - 1].contains(&dir);
    }

    if pattern.contains('/') {
        return Pattern::new(pattern)
            .map(|p| p.matches_with(path, glob_options()))
            .unwrap_or(false);
    }

    let file_name = path.rsplit('/').next().unwrap_or(path);
    Pattern::new(pattern)
        .map(|p| p.matches_with(file_name, glob_options()))
        .unwrap_or(false)
}
