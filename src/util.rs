use serde::Serialize;

/// Get the serde-serialized name of a unit enum variant.
/// Uses serde's own rules (rename_all, rename, etc.) as the single source of truth.
/// Returns `None` for non-string variants (data-carrying variants).
pub fn serde_variant_name<T: Serialize>(val: &T) -> Option<String> {
    match serde_json::to_value(val) {
        Ok(serde_json::Value::String(s)) => Some(s),
        _ => None,
    }
}

/// Deserialize a string into an enum variant using serde's own rules.
/// Single source of truth: uses the same rename/rename_all config as normal deserialization.
pub fn from_serde_str<T: for<'de> serde::Deserialize<'de>>(s: &str) -> Option<T> {
    serde_json::from_value(serde_json::Value::String(s.to_string())).ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::Mode;

    #[test]
    fn variant_names_round_trip() {
        assert_eq!(serde_variant_name(&Mode::VertexPaint).as_deref(), Some("VERTEX_PAINT"));
        assert_eq!(from_serde_str::<Mode>("VERTEX_PAINT"), Some(Mode::VertexPaint));
        assert_eq!(from_serde_str::<Mode>("vertex_paint"), None);
    }
}
