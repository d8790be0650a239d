//! Markdown frontmatter parsing.
//!
//! A document starting with a `---` fence carries YAML metadata (title, tags,
//! difficulty, language, plus any open keys). Malformed frontmatter degrades
//! to an empty metadata map with the whole document as body; parsing never
//! fails.

use serde_json::{Map, Value};

#[derive(Debug, Clone, Default)]
pub struct Frontmatter {
    pub metadata: Map<String, Value>,
    pub body: String,
}

pub fn parse(text: &str) -> Frontmatter {
    let Some((yaml, body)) = split_fences(text) else {
        return Frontmatter {
            metadata: Map::new(),
            body: text.to_string(),
        };
    };

    let metadata = serde_yaml::from_str::<serde_yaml::Value>(yaml)
        .ok()
        .map(yaml_to_json)
        .and_then(|value| match value {
            Value::Object(map) => Some(map),
            _ => None,
        });

    match metadata {
        Some(metadata) => Frontmatter {
            metadata,
            body: body.to_string(),
        },
        None => Frontmatter {
            metadata: Map::new(),
            body: text.to_string(),
        },
    }
}

/// The card title: frontmatter `title` if present, else the filename with
/// its extension stripped.
#[must_use]
pub fn title_for(metadata: &Map<String, Value>, file_path: &str) -> String {
    if let Some(Value::String(title)) = metadata.get("title") {
        let title = title.trim();
        if !title.is_empty() {
            return title.to_string();
        }
    }

    let file_name = file_path.rsplit('/').next().unwrap_or(file_path);
    match file_name.rsplit_once('.') {
        Some((stem, _)) if !stem.is_empty() => stem.to_string(),
        _ => file_name.to_string(),
    }
}

fn split_fences(text: &str) -> Option<(&str, &str)> {
    let rest = text.strip_prefix("---")?;
    let rest = rest.strip_prefix("\r\n").or_else(|| rest.strip_prefix('\n'))?;

    for (offset, line) in line_offsets(rest) {
        if line.trim_end() == "---" {
            let yaml = &rest[..offset];
            let body_start = offset + line.len();
            let body = rest[body_start..]
                .strip_prefix("\r\n")
                .or_else(|| rest[body_start..].strip_prefix('\n'))
                .unwrap_or(&rest[body_start..]);
            return Some((yaml, body));
        }
    }
    None
}

fn line_offsets(text: &str) -> impl Iterator<Item = (usize, &str)> {
    let mut offset = 0;
    text.split_inclusive('\n').map(move |line| {
        let start = offset;
        offset += line.len();
        (start, line)
    })
}

fn yaml_to_json(yaml: serde_yaml::Value) -> Value {
    match yaml {
        serde_yaml::Value::Null => Value::Null,
        serde_yaml::Value::Bool(b) => Value::Bool(b),
        serde_yaml::Value::Number(n) => {
            if let Some(i) = n.as_i64() {
                Value::Number(i.into())
            } else if let Some(u) = n.as_u64() {
                Value::Number(u.into())
            } else {
                serde_json::Number::from_f64(n.as_f64().unwrap_or(0.0))
                    .map(Value::Number)
                    .unwrap_or(Value::Null)
            }
        }
        serde_yaml::Value::String(s) => Value::String(s),
        serde_yaml::Value::Sequence(seq) => {
            Value::Array(seq.into_iter().map(yaml_to_json).collect())
        }
        serde_yaml::Value::Mapping(map) => {
            let mut object = Map::new();
            for (key, value) in map {
                let key = match key {
                    serde_yaml::Value::String(s) => s,
                    other => serde_yaml::to_string(&other)
                        .map(|s| s.trim().to_string())
                        .unwrap_or_default(),
                };
                object.insert(key, yaml_to_json(value));
            }
            Value::Object(object)
        }
        serde_yaml::Value::Tagged(tagged) => yaml_to_json(tagged.value),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_with_metadata() {
        let text = "---\ntitle: Goblet Squat\ntags:\n  - legs\n  - strength\ndifficulty: 2\n---\n# Setup\n";
        let parsed = parse(text);

        assert_eq!(
            parsed.metadata.get("title"),
            Some(&Value::String("Goblet Squat".to_string()))
        );
        assert_eq!(
            parsed.metadata.get("tags").and_then(Value::as_array).map(Vec::len),
            Some(2)
        );
        // Whole numbers stay integers through the YAML-to-JSON conversion
        assert_eq!(
            parsed.metadata.get("difficulty"),
            Some(&Value::Number(2.into()))
        );
        assert_eq!(parsed.body, "# Setup\n");
    }

    #[test]
    fn test_numbers_keep_their_kind() {
        let parsed = parse("---\nreps: 12\ntempo: 2.5\nbig: 9007199254740993\n---\nbody");
        assert_eq!(parsed.metadata.get("reps").and_then(Value::as_i64), Some(12));
        assert_eq!(
            parsed.metadata.get("tempo").and_then(Value::as_f64),
            Some(2.5)
        );
        assert_eq!(
            parsed.metadata.get("big").and_then(Value::as_i64),
            Some(9_007_199_254_740_993)
        );
    }

    #[test]
    fn test_no_frontmatter() {
        let parsed = parse("# Just a body\n");
        assert!(parsed.metadata.is_empty());
        assert_eq!(parsed.body, "# Just a body\n");
    }

    #[test]
    fn test_malformed_yaml_degrades() {
        let text = "---\ntitle: [unclosed\n---\nbody\n";
        let parsed = parse(text);
        assert!(parsed.metadata.is_empty());
        assert_eq!(parsed.body, text);
    }

    #[test]
    fn test_unterminated_fence_is_body() {
        let text = "---\ntitle: Squat\nbody without closing fence";
        let parsed = parse(text);
        assert!(parsed.metadata.is_empty());
        assert_eq!(parsed.body, text);
    }

    #[test]
    fn test_title_fallback_from_filename() {
        let metadata = Map::new();
        assert_eq!(title_for(&metadata, "legs/goblet-squat.md"), "goblet-squat");
        assert_eq!(title_for(&metadata, "README"), "README");

        let mut with_title = Map::new();
        with_title.insert("title".into(), Value::String("Goblet Squat".into()));
        assert_eq!(title_for(&with_title, "legs/goblet-squat.md"), "Goblet Squat");
    }

    #[test]
    fn test_crlf_fences() {
        let text = "---\r\ntitle: Squat\r\n---\r\nbody";
        let parsed = parse(text);
        assert_eq!(
            parsed.metadata.get("title"),
            Some(&Value::String("Squat".to_string()))
        );
        assert_eq!(parsed.body, "body");
    }
}
