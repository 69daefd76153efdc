//! Flat document reader.
//!
//! Grammar, line by line:
//! ```text
//! # comment            ; comment
//! [section name]
//! key = value
//! key = a, b, "c, d"   (list)
//! key = single,        (list of one)
//! key = ,              (empty list)
//! key = """multi
//! line"""
//! ```
//!
//! CRLF line endings are accepted; multi-line values are read back with LF.

use super::UNKEYED_FILTER_SECTION;
use super::document::{FlatDocument, FlatValue, Section};
use crate::error::{Error, Result};

/// Parses flat document text.
///
/// # Errors
///
/// Returns [`Error::Malformed`] on syntax errors, keys outside a section,
/// duplicate keys and duplicate section names. A bare `[filter]` section may
/// repeat.
pub fn parse(text: &str) -> Result<FlatDocument> {
    let mut doc = FlatDocument::new();
    let mut current: Option<Section> = None;
    let mut lines = text.lines().enumerate().map(|(i, line)| (i + 1, line));

    while let Some((line_no, line)) = lines.next() {
        let trimmed = line.trim();
        if trimmed.is_empty() || trimmed.starts_with('#') || trimmed.starts_with(';') {
            continue;
        }

        if let Some(rest) = trimmed.strip_prefix('[') {
            let name = parse_section_header(rest, line_no)?;
            if let Some(section) = current.take() {
                doc.push(section);
            }
            if name != UNKEYED_FILTER_SECTION && doc.section(&name).is_some() {
                return Err(Error::malformed(
                    format!("line {line_no}"),
                    format!("duplicate section [{name}]"),
                ));
            }
            current = Some(Section::new(name));
            continue;
        }

        let Some((key, raw_value)) = line.split_once('=') else {
            return Err(Error::malformed(
                format!("line {line_no}"),
                "expected `key = value` or `[section]`",
            ));
        };
        let key = key.trim();
        if key.is_empty() {
            return Err(Error::malformed(format!("line {line_no}"), "empty key"));
        }
        let Some(section) = current.as_mut() else {
            return Err(Error::malformed(
                format!("line {line_no}"),
                format!("key '{key}' outside of any section"),
            ));
        };
        if section.contains(key) {
            return Err(Error::malformed(
                format!("line {line_no}"),
                format!("duplicate key '{key}' in [{}]", section.name),
            ));
        }

        let raw_value = raw_value.trim_start();
        let value = match triple_quote(raw_value) {
            Some(delimiter) => {
                FlatValue::Scalar(read_multiline(raw_value, delimiter, line_no, &mut lines)?)
            }
            None => parse_value(raw_value, line_no)?,
        };
        section.set(key, value);
    }

    if let Some(section) = current {
        doc.push(section);
    }
    Ok(doc)
}

fn parse_section_header(rest: &str, line_no: usize) -> Result<String> {
    let Some((name, tail)) = rest.split_once(']') else {
        return Err(Error::malformed(
            format!("line {line_no}"),
            "unterminated section header",
        ));
    };
    let tail = tail.trim();
    if !(tail.is_empty() || tail.starts_with('#') || tail.starts_with(';')) {
        return Err(Error::malformed(
            format!("line {line_no}"),
            "unexpected text after section header",
        ));
    }
    let name = name.trim();
    if name.is_empty() {
        return Err(Error::malformed(format!("line {line_no}"), "empty section name"));
    }
    Ok(name.to_string())
}

fn triple_quote(value: &str) -> Option<&'static str> {
    if value.starts_with("\"\"\"") {
        Some("\"\"\"")
    } else if value.starts_with("'''") {
        Some("'''")
    } else {
        None
    }
}

/// Reads a triple-quoted value that may continue over following lines.
fn read_multiline<'a>(
    first: &str,
    delimiter: &str,
    line_no: usize,
    lines: &mut impl Iterator<Item = (usize, &'a str)>,
) -> Result<String> {
    let body = &first[delimiter.len()..];
    if let Some(end) = body.find(delimiter) {
        check_trailing(&body[end + delimiter.len()..], line_no)?;
        return Ok(body[..end].to_string());
    }

    let mut value = body.to_string();
    for (next_no, line) in lines.by_ref() {
        value.push('\n');
        if let Some(end) = line.find(delimiter) {
            check_trailing(&line[end + delimiter.len()..], next_no)?;
            value.push_str(&line[..end]);
            return Ok(value);
        }
        value.push_str(line);
    }

    Err(Error::malformed(
        format!("line {line_no}"),
        "unterminated multi-line value",
    ))
}

fn check_trailing(tail: &str, line_no: usize) -> Result<()> {
    let tail = tail.trim();
    if tail.is_empty() || tail.starts_with('#') {
        Ok(())
    } else {
        Err(Error::malformed(
            format!("line {line_no}"),
            "unexpected text after closing quotes",
        ))
    }
}

/// Parses a single-line value into a scalar or a list.
fn parse_value(raw: &str, line_no: usize) -> Result<FlatValue> {
    let chars: Vec<char> = raw.chars().collect();
    let mut pos = 0;
    // (text, was_quoted)
    let mut items: Vec<(String, bool)> = Vec::new();
    let mut is_list = false;

    loop {
        skip_whitespace(&chars, &mut pos);
        if pos >= chars.len() || chars[pos] == '#' {
            break;
        }

        if chars[pos] == '"' || chars[pos] == '\'' {
            let quote = chars[pos];
            let start = pos + 1;
            let Some(len) = chars[start..].iter().position(|&c| c == quote) else {
                return Err(Error::malformed(
                    format!("line {line_no}"),
                    "unterminated quoted value",
                ));
            };
            items.push((chars[start..start + len].iter().collect(), true));
            pos = start + len + 1;
        } else {
            let start = pos;
            while pos < chars.len() && chars[pos] != ',' {
                if chars[pos] == '#' && pos > start && chars[pos - 1].is_whitespace() {
                    break;
                }
                pos += 1;
            }
            let item: String = chars[start..pos].iter().collect();
            items.push((item.trim_end().to_string(), false));
        }

        skip_whitespace(&chars, &mut pos);
        if pos < chars.len() && chars[pos] == ',' {
            is_list = true;
            pos += 1;
            continue;
        }
        if pos >= chars.len() || chars[pos] == '#' {
            break;
        }
        return Err(Error::malformed(
            format!("line {line_no}"),
            "unexpected text after quoted value",
        ));
    }

    if is_list {
        Ok(FlatValue::List(
            items
                .into_iter()
                .filter(|(text, quoted)| *quoted || !text.is_empty())
                .map(|(text, _)| text)
                .collect(),
        ))
    } else {
        Ok(FlatValue::Scalar(
            items.into_iter().next().map(|(text, _)| text).unwrap_or_default(),
        ))
    }
}

fn skip_whitespace(chars: &[char], pos: &mut usize) {
    while *pos < chars.len() && chars[*pos].is_whitespace() {
        *pos += 1;
    }
}

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::redundant_clone,
    clippy::manual_string_new,
    clippy::needless_collect,
    clippy::unreadable_literal,
    clippy::used_underscore_items,
    clippy::similar_names
)]
mod tests {
    use super::*;

    fn value(text: &str) -> FlatValue {
        parse_value(text, 1).unwrap()
    }

    #[test]
    fn test_scalar_values() {
        assert_eq!(value("INBOX"), FlatValue::from("INBOX"));
        assert_eq!(value("from:x@y.com"), FlatValue::from("from:x@y.com"));
        assert_eq!(value(""), FlatValue::from(""));
        assert_eq!(value("\"a, b\""), FlatValue::from("a, b"));
        assert_eq!(value("'say \"hi\"'"), FlatValue::from("say \"hi\""));
        assert_eq!(value("\"  padded \""), FlatValue::from("  padded "));
    }

    #[test]
    fn test_list_values() {
        assert_eq!(
            value("Work, Later"),
            FlatValue::List(vec!["Work".to_string(), "Later".to_string()])
        );
        assert_eq!(value("Work,"), FlatValue::List(vec!["Work".to_string()]));
        assert_eq!(value(","), FlatValue::List(vec![]));
        assert_eq!(
            value("\"a, b\", c"),
            FlatValue::List(vec!["a, b".to_string(), "c".to_string()])
        );
    }

    #[test]
    fn test_inline_comments() {
        assert_eq!(value("INBOX  # main folder"), FlatValue::from("INBOX"));
        assert_eq!(value("a#b"), FlatValue::from("a#b"));
        assert_eq!(value("\"x\" # note"), FlatValue::from("x"));
    }

    #[test]
    fn test_bad_values() {
        assert!(parse_value("\"open", 1).is_err());
        assert!(parse_value("\"a\" b", 1).is_err());
    }

    #[test]
    fn test_parse_document() {
        let text = "\
# Mail filters
[author]
name = Jane Doe
email = jane@example.com

[filter:100]
from = x@y.com
label = Work, Later

[response:7]
title = Away
content = \"\"\"I am away.
Back Monday.\"\"\"
";
        let doc = parse(text).unwrap();
        assert_eq!(doc.len(), 3);

        let author = doc.section("author").unwrap();
        assert_eq!(author.scalar("name"), Some("Jane Doe"));

        let filter = doc.section("filter:100").unwrap();
        assert_eq!(
            filter.get("label"),
            Some(&FlatValue::List(vec!["Work".to_string(), "Later".to_string()]))
        );

        let response = doc.section("response:7").unwrap();
        assert_eq!(response.scalar("content"), Some("I am away.\nBack Monday."));
    }

    #[test]
    fn test_key_outside_section() {
        let err = parse("key = value\n").unwrap_err();
        assert!(matches!(err, Error::Malformed { .. }));
    }

    #[test]
    fn test_duplicate_section_rejected() {
        assert!(parse("[filter:1]\n[filter:1]\n").is_err());
    }

    #[test]
    fn test_unkeyed_filter_may_repeat() {
        let doc = parse("[filter]\nfrom = a\n[filter]\nfrom = b\n").unwrap();
        assert_eq!(doc.len(), 2);
    }

    #[test]
    fn test_duplicate_key_rejected() {
        assert!(parse("[filter:1]\nfrom = a\nfrom = b\n").is_err());
    }

    #[test]
    fn test_unterminated_multiline() {
        assert!(parse("[response:1]\ncontent = '''never\nclosed\n").is_err());
    }

    #[test]
    fn test_section_header_errors() {
        assert!(parse("[author\n").is_err());
        assert!(parse("[]\n").is_err());
        assert!(parse("[author] junk\n").is_err());
    }
}
