pub mod color;
pub mod value;

pub use color::{parse_color, parse_color_str, ColorParseError, ColorValue, NAMED_COLORS};
pub use value::{is_absent, list_choices, normalize_token, parse_choice, parse_float, parse_text, Choice};
