//! Flat document writer.

use std::fmt::Write as _;

use super::document::{FlatDocument, FlatValue};
use crate::error::{Error, Result};

/// Renders a flat document as text.
///
/// Sections are separated by blank lines. Values are quoted only when the
/// reader would otherwise change them.
///
/// # Errors
///
/// Returns [`Error::Malformed`] if a section name, key or value cannot be
/// represented (e.g. a list item holding both quote characters).
pub fn render(doc: &FlatDocument) -> Result<String> {
    let mut out = String::new();

    for (index, section) in doc.sections().enumerate() {
        if section.name.contains([']', '\n']) {
            return Err(Error::malformed(
                format!("[{}]", section.name),
                "section name cannot contain ']' or newlines",
            ));
        }
        if index > 0 {
            out.push('\n');
        }
        let _ = writeln!(out, "[{}]", section.name);

        for (key, value) in section.iter() {
            if key.is_empty() || key.contains(['=', '\n']) || key.starts_with(['[', '#', ';']) {
                return Err(Error::malformed(
                    format!("[{}]", section.name),
                    format!("key '{key}' cannot be written"),
                ));
            }
            let rendered = match value {
                FlatValue::Scalar(text) => render_scalar(text),
                FlatValue::List(items) => render_list(items),
            }
            .ok_or_else(|| {
                Error::malformed(
                    format!("[{}] {key}", section.name),
                    "value cannot be quoted",
                )
            })?;
            if rendered.is_empty() {
                let _ = writeln!(out, "{key} =");
            } else {
                let _ = writeln!(out, "{key} = {rendered}");
            }
        }
    }

    Ok(out)
}

fn render_scalar(text: &str) -> Option<String> {
    if text.contains('\n') {
        return triple_quoted(text);
    }
    if needs_quotes(text) {
        return quoted(text).or_else(|| triple_quoted(text));
    }
    Some(text.to_string())
}

fn render_list(items: &[String]) -> Option<String> {
    match items {
        [] => Some(",".to_string()),
        [single] => Some(format!("{},", list_item(single)?)),
        _ => {
            let rendered: Option<Vec<String>> = items.iter().map(|item| list_item(item)).collect();
            Some(rendered?.join(", "))
        }
    }
}

fn list_item(item: &str) -> Option<String> {
    if item.contains('\n') {
        return None;
    }
    if item.is_empty() || needs_quotes(item) {
        return quoted(item);
    }
    Some(item.to_string())
}

fn needs_quotes(text: &str) -> bool {
    text.starts_with(char::is_whitespace)
        || text.ends_with(char::is_whitespace)
        || text.contains([',', '"', '\'', '#'])
}

fn quoted(text: &str) -> Option<String> {
    if !text.contains('"') {
        Some(format!("\"{text}\""))
    } else if !text.contains('\'') {
        Some(format!("'{text}'"))
    } else {
        None
    }
}

fn triple_quoted(text: &str) -> Option<String> {
    if !text.contains("\"\"\"") && !text.ends_with('"') {
        Some(format!("\"\"\"{text}\"\"\""))
    } else if !text.contains("'''") && !text.ends_with('\'') {
        Some(format!("'''{text}'''"))
    } else {
        None
    }
}
