//! Frontmatter extraction for content files.
//!
//! Supports TOML between `+++` fences and a YAML-like `key: value` subset
//! between `---` fences. Both are normalised into a JSON object so entries
//! can be deserialized into one set of serde types.

use anyhow::{Context, Result};
use serde_json::{Map, Number, Value};

/// Split a content file into its frontmatter fields and body.
///
/// Returns `None` when the file has no frontmatter block.
pub fn extract(source: &str) -> Result<Option<(Map<String, Value>, &str)>> {
    let Some((fm, body, is_toml)) = detect(source) else {
        return Ok(None);
    };

    let fields = if is_toml {
        let table: toml::Table = toml::from_str(fm).context("Invalid TOML frontmatter")?;
        match toml_to_json(toml::Value::Table(table)) {
            Value::Object(map) => map,
            _ => Map::new(),
        }
    } else {
        parse_yaml_like(fm)
    };

    Ok(Some((fields, body)))
}

fn detect(source: &str) -> Option<(&str, &str, bool)> {
    let source = source.trim_start_matches('\u{feff}');
    for (fence, is_toml) in [("+++", true), ("---", false)] {
        let Some(rest) = source.strip_prefix(fence) else {
            continue;
        };
        let rest = rest.strip_prefix("\r\n").or_else(|| rest.strip_prefix('\n'))?;
        let close = format!("\n{fence}");
        let end = rest.find(&close)?;
        let fm = &rest[..end];
        let after = &rest[end + close.len()..];
        let body = after.find('\n').map(|i| &after[i + 1..]).unwrap_or("");
        return Some((fm, body, is_toml));
    }
    None
}

/// Parse the `key: value` subset used by most entries.
///
/// Handles booleans, numbers, quoted strings, inline `[a, b]` lists and
/// block lists written as indented `- item` lines under an empty key.
fn parse_yaml_like(content: &str) -> Map<String, Value> {
    let mut fields = Map::new();
    let mut list_key: Option<String> = None;

    for raw in content.lines() {
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }

        if let Some(item) = line.strip_prefix("- ") {
            if let Some(key) = &list_key {
                if let Some(Value::Array(items)) = fields.get_mut(key) {
                    items.push(parse_scalar(item));
                }
            }
            continue;
        }

        let Some((key, value)) = line.split_once(':') else {
            continue;
        };
        let key = key.trim().to_string();
        let value = value.trim();

        if value.is_empty() {
            fields.insert(key.clone(), Value::Array(Vec::new()));
            list_key = Some(key);
            continue;
        }

        list_key = None;
        fields.insert(key, parse_value(value));
    }

    // Empty keys never followed by list items are absent, not empty lists
    fields.retain(|_, v| !matches!(v, Value::Array(items) if items.is_empty()));
    fields
}

fn parse_value(value: &str) -> Value {
    if let Some(inner) = value.strip_prefix('[').and_then(|v| v.strip_suffix(']')) {
        let items = inner
            .split(',')
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(parse_scalar)
            .collect();
        return Value::Array(items);
    }
    parse_scalar(value)
}

fn parse_scalar(value: &str) -> Value {
    let value = value.trim();
    for quote in ['"', '\''] {
        if value.len() >= 2 && value.starts_with(quote) && value.ends_with(quote) {
            return Value::String(value[1..value.len() - 1].to_string());
        }
    }
    match value {
        "true" => return Value::Bool(true),
        "false" => return Value::Bool(false),
        "null" | "~" => return Value::Null,
        _ => {}
    }
    if let Ok(i) = value.parse::<i64>() {
        return Value::Number(i.into());
    }
    if let Some(n) = value.parse::<f64>().ok().and_then(Number::from_f64) {
        return Value::Number(n);
    }
    Value::String(value.to_string())
}

fn toml_to_json(value: toml::Value) -> Value {
    match value {
        toml::Value::String(s) => Value::String(s),
        toml::Value::Integer(i) => Value::Number(i.into()),
        toml::Value::Float(f) => Number::from_f64(f).map(Value::Number).unwrap_or(Value::Null),
        toml::Value::Boolean(b) => Value::Bool(b),
        toml::Value::Datetime(dt) => Value::String(dt.to_string()),
        toml::Value::Array(items) => Value::Array(items.into_iter().map(toml_to_json).collect()),
        toml::Value::Table(table) => Value::Object(
            table
                .into_iter()
                .map(|(k, v)| (k, toml_to_json(v)))
                .collect(),
        ),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_yaml_like_frontmatter() {
        let source = "---\ntitle: \"起業のきっかけ\"\npublishedTime: 2025-01-10T09:00:00+09:00\nisDraft: false\ntags: [飲食店, 宮崎市]\nauthors:\n  - tanaka\n  - sato\n---\n本文です。\n";
        let (fields, body) = extract(source).unwrap().expect("has frontmatter");

        assert_eq!(fields["title"], "起業のきっかけ");
        assert_eq!(fields["publishedTime"], "2025-01-10T09:00:00+09:00");
        assert_eq!(fields["isDraft"], false);
        assert_eq!(fields["tags"], serde_json::json!(["飲食店", "宮崎市"]));
        assert_eq!(fields["authors"], serde_json::json!(["tanaka", "sato"]));
        assert_eq!(body, "本文です。\n");
    }

    #[test]
    fn test_toml_frontmatter_with_datetime() {
        let source = "+++\ntitle = \"Hello\"\npublishedTime = 2025-01-10T09:00:00+09:00\nisSubHeadline = true\n+++\nbody\n";
        let (fields, body) = extract(source).unwrap().expect("has frontmatter");

        assert_eq!(fields["title"], "Hello");
        assert_eq!(fields["publishedTime"], "2025-01-10T09:00:00+09:00");
        assert_eq!(fields["isSubHeadline"], true);
        assert_eq!(body, "body\n");
    }

    #[test]
    fn test_no_frontmatter() {
        assert!(extract("# Just markdown\n").unwrap().is_none());
    }

    #[test]
    fn test_invalid_toml_is_error() {
        assert!(extract("+++\ntitle = \n+++\n").is_err());
    }
}
