//! Relative image references in card markdown.
//!
//! Extracts `![alt](target)` references whose target is not an absolute URL,
//! resolves them against the card's repository path, and rewrites targets in
//! the rendered body to stable storage URLs. Raw card content is never
//! rewritten.

use std::collections::HashMap;
use std::ops::Range;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImageRef {
    pub alt: String,
    pub target: String,
}

struct RawRef {
    alt: Range<usize>,
    target: Range<usize>,
}

fn is_absolute_url(target: &str) -> bool {
    target.starts_with("http://") || target.starts_with("https://")
}

/// Scan for image references, returning the byte ranges of alt text and
/// target so rewriting can splice in place.
fn scan(body: &str) -> Vec<RawRef> {
    let mut refs = Vec::new();
    let mut cursor = 0;

    while let Some(found) = body[cursor..].find("![") {
        let start = cursor + found;
        let alt_start = start + 2;
        let Some(alt_len) = body[alt_start..].find(']') else {
            break;
        };
        let alt_end = alt_start + alt_len;

        if !body[alt_end..].starts_with("](") {
            cursor = alt_end + 1;
            continue;
        }
        let target_start = alt_end + 2;
        let Some(target_len) = body[target_start..].find(')') else {
            break;
        };
        let target_end = target_start + target_len;

        // An optional `"title"` after the target is not part of the path
        let raw = &body[target_start..target_end];
        let token = raw.trim().split_whitespace().next().unwrap_or("");
        if !token.is_empty() {
            let token_start = target_start + raw.find(token).unwrap_or(0);
            refs.push(RawRef {
                alt: alt_start..alt_end,
                target: token_start..token_start + token.len(),
            });
        }

        cursor = target_end + 1;
    }

    refs
}

/// All non-absolute image references in `body`, in document order.
#[must_use]
pub fn extract_refs(body: &str) -> Vec<ImageRef> {
    scan(body)
        .into_iter()
        .filter(|raw| !is_absolute_url(&body[raw.target.clone()]))
        .map(|raw| ImageRef {
            alt: body[raw.alt].to_string(),
            target: body[raw.target].to_string(),
        })
        .collect()
}

/// Resolve a reference target against the card's repository path.
///
/// A leading `/` is repository-root relative; otherwise the target resolves
/// against the card's own directory with `.`/`..` collapsing. Ascending past
/// the root clamps to the root instead of erroring.
#[must_use]
pub fn resolve(card_path: &str, target: &str) -> String {
    let mut stack: Vec<&str> = if target.starts_with('/') {
        Vec::new()
    } else {
        match card_path.rsplit_once('/') {
            Some((dir, _)) => dir.split('/').filter(|s| !s.is_empty()).collect(),
            None => Vec::new(),
        }
    };

    for segment in target.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                stack.pop();
            }
            other => stack.push(other),
        }
    }

    stack.join("/")
}

/// Rewrite reference targets in the rendered body. `replacements` maps the
/// target exactly as written to its replacement URL.
#[must_use]
pub fn rewrite(body: &str, replacements: &HashMap<String, String>) -> String {
    if replacements.is_empty() {
        return body.to_string();
    }

    let mut out = String::with_capacity(body.len());
    let mut cursor = 0;

    for raw in scan(body) {
        let target = &body[raw.target.clone()];
        if let Some(url) = replacements.get(target) {
            out.push_str(&body[cursor..raw.target.start]);
            out.push_str(url);
            cursor = raw.target.end;
        }
    }
    out.push_str(&body[cursor..]);
    out
}

/// Whether a reference target as written in a card structurally matches an
/// incoming repository file path. Deliberately loose (direct, `./`-prefixed,
/// `/`-prefixed, or suffix match): tightening it could silently stop
/// rewriting legitimate references.
#[must_use]
pub fn matches_incoming(reference_target: &str, incoming_path: &str) -> bool {
    if reference_target == incoming_path
        || reference_target.strip_prefix("./") == Some(incoming_path)
        || reference_target.strip_prefix('/') == Some(incoming_path)
    {
        return true;
    }

    let relative = reference_target.trim_start_matches("./");
    if relative.is_empty() || relative.starts_with('/') {
        return false;
    }
    incoming_path
        .strip_suffix(relative)
        .is_some_and(|prefix| prefix.is_empty() || prefix.ends_with('/'))
}
