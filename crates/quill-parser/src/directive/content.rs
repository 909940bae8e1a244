//! Split directive content into options and body.
//!
//! Two option grammars are recognized at the top of the content:
//!
//! - A YAML block between `---` lines:
//!
//!   ```text
//!   ---
//!   class: tip
//!   width: 80
//!   ---
//!   Body text
//!   ```
//!
//! - A run of colon lines:
//!
//!   ```text
//!   :class: tip
//!   :width: 80
//!   Body text
//!   ```
//!
//! Anything else is body.

use std::sync::LazyLock;

use regex::Regex;
use serde_yaml::Value;

use super::OptionsError;

/// `:key: value` option line; the value is optional.
static COLON_OPTION_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^:([^:\s]+?):(?:\s*(.*))?\s*$").unwrap());

/// A raw option in source order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct OptionEntry {
    /// Option key.
    pub key: String,
    /// Raw value text.
    pub value: String,
    /// Lines from the directive's opening fence to the option.
    pub line_offset: usize,
}

/// Result of splitting directive content.
#[derive(Debug)]
pub struct SplitContent {
    /// Body text with leading blank lines removed and trailing whitespace
    /// trimmed.
    pub body: String,
    /// Lines from the opening fence to the first body line.
    pub body_offset: usize,
    /// Options in source order, duplicates included.
    pub options: Vec<OptionEntry>,
    /// Set when a YAML block was present but could not be used.
    pub warning: Option<OptionsError>,
}

/// Separate options from body.
///
/// A malformed YAML block is not an error: the options are dropped, the
/// whole content becomes the body and the reason is reported in
/// [`SplitContent::warning`].
pub fn split_content(lines: &[String]) -> SplitContent {
    let Some(first) = lines.first() else {
        return finish(&[], 1, Vec::new(), None);
    };

    if first.trim() == "---" {
        return match yaml_options(lines) {
            Ok((options, closer)) => finish(&lines[closer + 1..], closer + 2, options, None),
            Err(err) => finish(lines, 1, Vec::new(), Some(err)),
        };
    }

    let options: Vec<OptionEntry> = lines
        .iter()
        .map_while(|line| COLON_OPTION_RE.captures(line))
        .enumerate()
        .map(|(i, caps)| OptionEntry {
            key: caps[1].to_owned(),
            value: colon_value(caps.get(2).map_or("", |m| m.as_str())),
            line_offset: i + 1,
        })
        .collect();
    let consumed = options.len();
    finish(&lines[consumed..], consumed + 1, options, None)
}

fn colon_value(raw: &str) -> String {
    let value = raw.trim_end();
    if value.is_empty() {
        "true".to_owned()
    } else {
        value.to_owned()
    }
}

/// Parse the YAML block at the top of `lines`.
///
/// Returns the options and the index of the closing `---`.
fn yaml_options(lines: &[String]) -> Result<(Vec<OptionEntry>, usize), OptionsError> {
    let closer = lines
        .iter()
        .skip(1)
        .position(|line| line.trim() == "---")
        .map(|pos| pos + 1)
        .ok_or(OptionsError::Unclosed)?;
    let block = &lines[1..closer];

    if block.iter().all(|line| line.trim().is_empty()) {
        return Err(OptionsError::NotAMapping("nothing"));
    }

    let mapping = match serde_yaml::from_str::<Value>(&block.join("\n"))? {
        Value::Mapping(mapping) => mapping,
        other => return Err(OptionsError::NotAMapping(describe(&other))),
    };

    let mut options = Vec::with_capacity(mapping.len());
    for (i, (key, value)) in mapping.iter().enumerate() {
        let key = scalar_key(key).ok_or(OptionsError::InvalidKey)?;
        let line_offset = key_line(block, &key).map_or(i + 2, |j| j + 2);
        options.push(OptionEntry {
            value: stringify(value)?,
            key,
            line_offset,
        });
    }
    Ok((options, closer))
}

fn scalar_key(key: &Value) -> Option<String> {
    match key {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

/// Index of the first top-level line of `block` declaring `key`.
fn key_line(block: &[String], key: &str) -> Option<usize> {
    block.iter().position(|line| {
        let unquoted = line
            .strip_prefix('"')
            .and_then(|l| l.strip_prefix(key))
            .and_then(|l| l.strip_prefix('"'))
            .or_else(|| line.strip_prefix(key));
        unquoted.is_some_and(|rest| rest.trim_start().starts_with(':'))
    })
}

/// String form of an option value.
///
/// Scalars keep their text; sequences and mappings are re-serialized as
/// YAML.
fn stringify(value: &Value) -> Result<String, OptionsError> {
    Ok(match value {
        Value::Null => String::new(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => n.to_string(),
        Value::String(s) => s.clone(),
        Value::Sequence(_) | Value::Mapping(_) | Value::Tagged(_) => {
            serde_yaml::to_string(value)?.trim_end().to_owned()
        }
    })
}

fn describe(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Mapping(_) => "a mapping",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Sequence(_) => "a sequence",
        Value::Tagged(_) => "a tagged value",
    }
}

/// Strip leading blank lines and trailing whitespace from the body.
fn finish(
    body: &[String],
    body_offset: usize,
    options: Vec<OptionEntry>,
    warning: Option<OptionsError>,
) -> SplitContent {
    let blank = body.iter().take_while(|line| line.trim().is_empty()).count();
    SplitContent {
        body: body[blank..].join("\n").trim_end().to_owned(),
        body_offset: body_offset + blank,
        options,
        warning,
    }
}
