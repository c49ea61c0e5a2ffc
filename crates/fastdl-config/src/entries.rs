//! Turns config text into `(key, value)` pairs.
//!
//! A well-formed file is read as one TOML document. Anything else is read a
//! line at a time: `key = value`, where the value is a TOML value when it
//! parses as one and the raw text otherwise (`download_url=http://host/`).
//! A line that cannot be read is reported and the rest of the file still
//! applies. Arrays may span lines; within a broken array every element is
//! recovered on its own.

use crate::error::ConfigWarning;

pub(crate) type Entry = (String, toml::Value);

pub(crate) fn read(text: &str) -> (Vec<Entry>, Vec<ConfigWarning>) {
    match toml::from_str::<toml::Table>(text) {
        Ok(table) => return (table.into_iter().collect(), Vec::new()),
        Err(e) => {
            tracing::debug!(
                error = %e,
                "config is not a single TOML document, reading it line by line"
            )
        }
    }

    let mut entries = Vec::new();
    let mut warnings = Vec::new();
    let mut lines = text.lines().enumerate().peekable();

    while let Some((index, line)) = lines.next() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let Some((key, raw)) = split_key(line) else {
            warnings.push(ConfigWarning::MalformedLine {
                line: index + 1,
                text: line.to_string(),
                reason: "expected `key = value`",
            });
            continue;
        };

        let mut raw = raw.to_string();
        if raw.starts_with('[') {
            let mut depth = bracket_depth(&raw);
            while depth > 0 {
                // An unclosed array ends where the next key begins.
                match lines.next_if(|(_, next)| split_key(next.trim()).is_none()) {
                    Some((_, next)) => {
                        raw.push('\n');
                        raw.push_str(next);
                        depth += bracket_depth(next);
                    }
                    None => break,
                }
            }
        }
        entries.push((key.to_string(), value(&raw)));
    }

    (entries, warnings)
}

/// `key = rest` where the key is a bare TOML key.
fn split_key(line: &str) -> Option<(&str, &str)> {
    let (key, raw) = line.split_once('=')?;
    let key = key.trim();
    let bare = !key.is_empty()
        && key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '-');
    bare.then(|| (key, raw.trim()))
}

fn parse_value(raw: &str) -> Option<toml::Value> {
    let mut doc = toml::from_str::<toml::Table>(&format!("value = {raw}")).ok()?;
    doc.remove("value")
}

fn value(raw: &str) -> toml::Value {
    if let Some(value) = parse_value(raw) {
        return value;
    }
    match raw.strip_prefix('[') {
        Some(body) => {
            let body = body.trim_end();
            let body = body.strip_suffix(']').unwrap_or(body);
            let items = split_items(body).into_iter().map(|item| {
                parse_value(item).unwrap_or_else(|| toml::Value::String(item.to_string()))
            });
            toml::Value::Array(items.collect())
        }
        None => toml::Value::String(raw.to_string()),
    }
}

/// Net `[`/`]` nesting of one line, ignoring quoted text and comments.
fn bracket_depth(line: &str) -> i32 {
    let mut depth = 0;
    let mut quote = None;
    for c in line.chars() {
        match (quote, c) {
            (Some(q), c) if c == q => quote = None,
            (Some(_), _) => {}
            (None, '"' | '\'') => quote = Some(c),
            (None, '#') => break,
            (None, '[') => depth += 1,
            (None, ']') => depth -= 1,
            _ => {}
        }
    }
    depth
}

/// Top-level array elements, split on commas and line ends. A quote left
/// open runs to the end of its line only.
fn split_items(body: &str) -> Vec<&str> {
    let mut items = Vec::new();
    let mut depth = 0;
    let mut quote = None;
    let mut start = 0;
    for (i, c) in body.char_indices() {
        match (quote, c) {
            (_, '\n') => {
                quote = None;
                if depth <= 0 {
                    items.push(&body[start..i]);
                    start = i + 1;
                }
            }
            (Some(q), c) if c == q => quote = None,
            (Some(_), _) => {}
            (None, '"' | '\'') => quote = Some(c),
            (None, '[' | '{') => depth += 1,
            (None, ']' | '}') => depth -= 1,
            (None, ',') if depth <= 0 => {
                items.push(&body[start..i]);
                start = i + 1;
            }
            _ => {}
        }
    }
    items.push(&body[start..]);
    items
        .into_iter()
        .map(str::trim)
        .filter(|item| !item.is_empty() && !item.starts_with('#'))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keys(entries: &[Entry]) -> Vec<&str> {
        entries.iter().map(|(k, _)| k.as_str()).collect()
    }

    #[test]
    fn test_toml_document_read_whole() {
        let (entries, warnings) = read("flush_every = 8\nrules = [\n  \"include * *\",\n]\n");
        assert!(warnings.is_empty());
        assert_eq!(keys(&entries), vec!["flush_every", "rules"]);
    }

    #[test]
    fn test_unquoted_values_are_text() {
        let (entries, warnings) =
            read("download_url=http://cdn.example.com/%game%/\nflush_every = 8\n");
        assert!(warnings.is_empty());
        assert_eq!(
            entries,
            vec![
                (
                    "download_url".to_string(),
                    toml::Value::String("http://cdn.example.com/%game%/".to_string())
                ),
                ("flush_every".to_string(), toml::Value::Integer(8)),
            ]
        );
    }

    #[test]
    fn test_bad_line_reported_rest_kept() {
        let (entries, warnings) = read(concat!(
            "# comment\n",
            "flush_every = 8\n",
            "this is not a setting\n",
            "manifest = out.txt\n",
        ));
        assert_eq!(keys(&entries), vec!["flush_every", "manifest"]);
        assert!(matches!(
            warnings.as_slice(),
            [ConfigWarning::MalformedLine { line: 3, .. }]
        ));
    }

    #[test]
    fn test_broken_array_keeps_good_elements() {
        let (entries, _) = read(concat!(
            "download_url = http://cdn.example.com/\n",
            "rules = [\n",
            "  \"exclude sound sound/weapons\",\n",
            "  \"include sound sound/*,\n",
            "  \"include * models\", # trailing\n",
            "]\n",
        ));
        let rules = entries
            .iter()
            .find(|(k, _)| k == "rules")
            .and_then(|(_, v)| v.as_array())
            .unwrap();
        assert_eq!(
            rules,
            &vec![
                toml::Value::String("exclude sound sound/weapons".into()),
                toml::Value::String("\"include sound sound/*,".into()),
                toml::Value::String("include * models".into()),
            ]
        );
    }

    #[test]
    fn test_unclosed_array_stops_at_next_key() {
        let (entries, _) =
            read("rules = [\"include * models\"\ndownload_url = http://cdn.example.com/\n");
        assert_eq!(keys(&entries), vec!["rules", "download_url"]);
        assert_eq!(entries[0].1.as_array().map(Vec::len), Some(1));
    }

    #[test]
    fn test_bracket_depth_ignores_quotes_and_comments() {
        assert_eq!(bracket_depth("rules = ["), 1);
        assert_eq!(bracket_depth("\"a]\", # ]"), 0);
        assert_eq!(bracket_depth("]"), -1);
    }
}
