use std::fmt;

use serde::Serialize;
use serde_json::Value;

/// RGBA color with floating-point channels in [0, 1].
///
/// Only [`parse_color`] produces values of this type; the fields are private so
/// every color that reaches the host has been validated.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct ColorValue {
    r: f64,
    g: f64,
    b: f64,
    a: f64,
}

impl ColorValue {
    const fn opaque(r: f64, g: f64, b: f64) -> Self {
        Self { r, g, b, a: 1.0 }
    }

    pub fn r(&self) -> f64 {
        self.r
    }

    pub fn g(&self) -> f64 {
        self.g
    }

    pub fn b(&self) -> f64 {
        self.b
    }

    pub fn a(&self) -> f64 {
        self.a
    }

    pub fn components(&self) -> [f64; 4] {
        [self.r, self.g, self.b, self.a]
    }
}

impl fmt::Display for ColorValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "({:.2}, {:.2}, {:.2}, {:.2})",
            self.r, self.g, self.b, self.a
        )
    }
}

/// Named colors and their canonical RGBA (alpha is always 1.0).
pub const NAMED_COLORS: &[(&str, ColorValue)] = &[
    ("red", ColorValue::opaque(1.0, 0.0, 0.0)),
    ("green", ColorValue::opaque(0.0, 1.0, 0.0)),
    ("blue", ColorValue::opaque(0.0, 0.0, 1.0)),
    ("yellow", ColorValue::opaque(1.0, 1.0, 0.0)),
    ("cyan", ColorValue::opaque(0.0, 1.0, 1.0)),
    ("magenta", ColorValue::opaque(1.0, 0.0, 1.0)),
    ("white", ColorValue::opaque(1.0, 1.0, 1.0)),
    ("black", ColorValue::opaque(0.0, 0.0, 0.0)),
    ("gray", ColorValue::opaque(0.5, 0.5, 0.5)),
    ("grey", ColorValue::opaque(0.5, 0.5, 0.5)),
    ("orange", ColorValue::opaque(1.0, 0.5, 0.0)),
    ("purple", ColorValue::opaque(0.5, 0.0, 0.5)),
    ("pink", ColorValue::opaque(1.0, 0.75, 0.8)),
    ("brown", ColorValue::opaque(0.6, 0.3, 0.1)),
];

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "code", content = "detail")]
pub enum ColorParseError {
    InvalidColorFormat { input: String },
    ComponentOutOfRange { index: usize, value: f64 },
}

impl fmt::Display for ColorParseError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ColorParseError::InvalidColorFormat { input } => write!(
                f,
                "Invalid color format: {input} (expected a color name, \"r,g,b\", \"r,g,b,a\" or a list of 3-4 numbers)"
            ),
            ColorParseError::ComponentOutOfRange { index, value } => {
                write!(f, "Color component {index} ({value}) must be between 0.0 and 1.0")
            }
        }
    }
}

impl std::error::Error for ColorParseError {}

/// Convert a loosely-typed color parameter into a [`ColorValue`].
///
/// Accepted shapes, in priority order:
/// 1. a known color name (case-insensitive)
/// 2. a string of 3 or 4 comma-separated numbers
/// 3. an array of 3 or 4 numbers
///
/// Three components imply alpha = 1.0.
pub fn parse_color(input: &Value) -> Result<ColorValue, ColorParseError> {
    match input {
        Value::String(s) => parse_color_str(s),
        Value::Array(items) => {
            let components = items
                .iter()
                .map(Value::as_f64)
                .collect::<Option<Vec<f64>>>()
                .ok_or_else(|| invalid(input))?;
            from_components(&components).ok_or_else(|| invalid(input))?
        }
        _ => Err(invalid(input)),
    }
}

/// String form of [`parse_color`]: a color name or delimited components.
pub fn parse_color_str(input: &str) -> Result<ColorValue, ColorParseError> {
    let trimmed = input.trim();
    if let Some((_, color)) = NAMED_COLORS
        .iter()
        .find(|(name, _)| name.eq_ignore_ascii_case(trimmed))
    {
        return Ok(*color);
    }

    let components = trimmed
        .split(',')
        .map(|token| token.trim().parse::<f64>().ok())
        .collect::<Option<Vec<f64>>>()
        .ok_or_else(|| ColorParseError::InvalidColorFormat {
            input: input.to_string(),
        })?;
    from_components(&components).ok_or_else(|| ColorParseError::InvalidColorFormat {
        input: input.to_string(),
    })?
}

/// Apply the 3-vs-4 component rule. `None` means the count is wrong.
fn from_components(components: &[f64]) -> Option<Result<ColorValue, ColorParseError>> {
    let (r, g, b, a) = match *components {
        [r, g, b] => (r, g, b, 1.0),
        [r, g, b, a] => (r, g, b, a),
        _ => return None,
    };
    for (index, value) in [r, g, b, a].into_iter().enumerate() {
        if !value.is_finite() || !(0.0..=1.0).contains(&value) {
            return Some(Err(ColorParseError::ComponentOutOfRange { index, value }));
        }
    }
    Some(Ok(ColorValue { r, g, b, a }))
}

fn invalid(input: &Value) -> ColorParseError {
    ColorParseError::InvalidColorFormat {
        input: input.to_string(),
    }
}
