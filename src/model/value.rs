//! Coercion of loosely-typed parameter values produced by the language model.
//!
//! Models are inconsistent about JSON types (`"90"` vs `90`, `"x"` vs `"X"`),
//! so every helper here accepts the reasonable spellings and normalizes them.

use serde_json::Value;

/// One allowed value of an enumerated parameter.
#[derive(Debug, Clone, Copy)]
pub struct Choice {
    /// Canonical spelling handed to the host.
    pub canonical: &'static str,
    /// Other spellings users and models commonly produce.
    pub aliases: &'static [&'static str],
}

impl Choice {
    pub const fn new(canonical: &'static str) -> Self {
        Self {
            canonical,
            aliases: &[],
        }
    }

    pub const fn with_aliases(canonical: &'static str, aliases: &'static [&'static str]) -> Self {
        Self { canonical, aliases }
    }
}

/// `null` and blank strings carry no value.
pub fn is_absent(value: &Value) -> bool {
    match value {
        Value::Null => true,
        Value::String(s) => s.trim().is_empty(),
        _ => false,
    }
}

/// Accept a JSON number or a numeric string. Rejects NaN and infinities.
pub fn parse_float(value: &Value) -> Result<f64, String> {
    let parsed = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse::<f64>().ok(),
        _ => None,
    };
    match parsed {
        Some(f) if f.is_finite() => Ok(f),
        Some(_) => Err(format!("{value} is not a finite number")),
        None => Err(format!("expected a number, got {value}")),
    }
}

/// Accept a string (trimmed) or a scalar rendered as text.
pub fn parse_text(value: &Value) -> Result<String, String> {
    match value {
        Value::String(s) => Ok(s.trim().to_string()),
        Value::Number(n) => Ok(n.to_string()),
        Value::Bool(b) => Ok(b.to_string()),
        _ => Err(format!("expected text, got {value}")),
    }
}

/// Match against the allowed choices, case-insensitively, treating `_`, `-`
/// and spaces alike. Returns the canonical spelling.
pub fn parse_choice(value: &Value, choices: &[Choice]) -> Result<&'static str, String> {
    let Value::String(raw) = value else {
        return Err(format!("expected one of {}, got {value}", list_choices(choices)));
    };
    let wanted = normalize_token(raw);
    choices
        .iter()
        .find(|c| {
            normalize_token(c.canonical) == wanted
                || c.aliases.iter().any(|a| normalize_token(a) == wanted)
        })
        .map(|c| c.canonical)
        .ok_or_else(|| format!("'{raw}' is not one of {}", list_choices(choices)))
}

pub fn list_choices(choices: &[Choice]) -> String {
    choices
        .iter()
        .map(|c| c.canonical)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Lowercase and collapse separators so "Vertex-Paint", "vertex_paint" and
/// "vertex paint" compare equal.
pub fn normalize_token(raw: &str) -> String {
    raw.trim()
        .to_lowercase()
        .split(|c: char| c == '_' || c == '-' || c.is_whitespace())
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use serde_json::json;

    const AXES: &[Choice] = &[Choice::new("X"), Choice::new("Y"), Choice::new("Z")];

    #[test]
    fn floats_from_numbers_and_strings() {
        assert!((parse_float(&json!(2)).unwrap() - 2.0).abs() < f64::EPSILON);
        assert!((parse_float(&json!("90")).unwrap() - 90.0).abs() < f64::EPSILON);
        assert!((parse_float(&json!(" -1.5 ")).unwrap() + 1.5).abs() < f64::EPSILON);
    }

    #[test]
    fn floats_reject_other_shapes() {
        assert!(parse_float(&json!("ninety")).is_err());
        assert!(parse_float(&json!(true)).is_err());
        assert!(parse_float(&json!([1])).is_err());
        assert!(parse_float(&json!("inf")).is_err());
    }

    #[test]
    fn choices_match_loosely() {
        assert_eq!(parse_choice(&json!("x"), AXES).unwrap(), "X");
        assert_eq!(parse_choice(&json!(" Z "), AXES).unwrap(), "Z");
        assert!(parse_choice(&json!("w"), AXES).is_err());
        assert!(parse_choice(&json!(1), AXES).is_err());
    }

    #[test]
    fn choices_match_aliases() {
        let modes = [Choice::with_aliases("VERTEX_PAINT", &["vertex paint mode"])];
        assert_eq!(parse_choice(&json!("vertex-paint"), &modes).unwrap(), "VERTEX_PAINT");
        assert_eq!(
            parse_choice(&json!("Vertex Paint Mode"), &modes).unwrap(),
            "VERTEX_PAINT"
        );
    }

    #[test]
    fn blank_values_are_absent() {
        assert!(is_absent(&Value::Null));
        assert!(is_absent(&json!("   ")));
        assert!(!is_absent(&json!(0)));
    }
}
