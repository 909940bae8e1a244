//! Option value coercion.

use crate::ast::{OptionMap, OptionValue};

use super::OptionEntry;

/// Build the typed option map. The first occurrence of a key wins.
pub fn coerce_options(entries: &[OptionEntry]) -> OptionMap {
    let mut map = OptionMap::new();
    for entry in entries {
        if !map.contains_key(&entry.key) {
            map.insert_first(entry.key.clone(), coerce_value(&entry.value));
        }
    }
    map
}

/// Coerce a raw option value.
///
/// Numeric literals become numbers and `true`/`false` (any case) become
/// booleans. Everything else is kept as the original string.
///
/// ```
/// use quill_parser::OptionValue;
/// use quill_parser::directive::coerce_value;
///
/// assert_eq!(coerce_value("1.5e3"), OptionValue::Number(1500.0));
/// assert_eq!(coerce_value("TRUE"), OptionValue::Boolean(true));
/// assert_eq!(coerce_value("nan"), OptionValue::String("nan".to_owned()));
/// ```
pub fn coerce_value(raw: &str) -> OptionValue {
    if let Some(number) = parse_number(raw) {
        return OptionValue::Number(number);
    }
    if raw.eq_ignore_ascii_case("true") {
        OptionValue::Boolean(true)
    } else if raw.eq_ignore_ascii_case("false") {
        OptionValue::Boolean(false)
    } else {
        OptionValue::String(raw.to_owned())
    }
}

fn parse_number(raw: &str) -> Option<f64> {
    let trimmed = raw.trim();
    if trimmed.is_empty()
        || !trimmed
            .chars()
            .all(|c| c.is_ascii_digit() || matches!(c, '+' | '-' | '.' | 'e' | 'E'))
    {
        return None;
    }
    trimmed.parse::<f64>().ok().filter(|n| n.is_finite())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(key: &str, value: &str) -> OptionEntry {
        OptionEntry {
            key: key.to_owned(),
            value: value.to_owned(),
            line_offset: 1,
        }
    }

    #[test]
    fn test_numbers() {
        assert_eq!(coerce_value("5"), OptionValue::Number(5.0));
        assert_eq!(coerce_value(" -2.5 "), OptionValue::Number(-2.5));
        assert_eq!(coerce_value("+7"), OptionValue::Number(7.0));
        assert_eq!(coerce_value("1e2"), OptionValue::Number(100.0));
    }

    #[test]
    fn test_not_numbers() {
        for raw in ["", "  ", "inf", "Infinity", "NaN", "0x10", "0b11", "1,000", "5px", "1e999", "."] {
            assert_eq!(
                coerce_value(raw),
                OptionValue::String(raw.to_owned()),
                "{raw:?} should stay a string"
            );
        }
    }

    #[test]
    fn test_booleans() {
        assert_eq!(coerce_value("true"), OptionValue::Boolean(true));
        assert_eq!(coerce_value("False"), OptionValue::Boolean(false));
        assert_eq!(coerce_value("yes"), OptionValue::String("yes".to_owned()));
    }

    #[test]
    fn test_first_occurrence_wins() {
        let map = coerce_options(&[entry("x", "1"), entry("y", "a"), entry("x", "2")]);
        assert_eq!(map.len(), 2);
        assert_eq!(map.get("x"), Some(&OptionValue::Number(1.0)));
        assert_eq!(map.keys().collect::<Vec<_>>(), vec!["x", "y"]);
    }
}
