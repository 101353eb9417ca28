//! Coerce an intent's untyped parameter map against a command's schema.

use serde_json::{Map, Value};

use super::params::{ParamSpec, ParamType, TypedParameters, TypedValue};
use crate::error::DispatchFailure;
use crate::model::{is_absent, parse_choice, parse_color, parse_float, parse_text};

/// Produce [`TypedParameters`] for `schema` from the raw map.
///
/// All-or-nothing: the first missing required parameter or failed coercion
/// aborts the whole step. Names the schema does not declare are dropped.
pub fn coerce(
    schema: &'static [ParamSpec],
    raw: &Map<String, Value>,
) -> Result<TypedParameters, DispatchFailure> {
    for key in raw.keys() {
        if !schema.iter().any(|p| p.name == key) {
            tracing::debug!(parameter = %key, "Dropping undeclared parameter");
        }
    }

    let mut typed = TypedParameters::default();
    for spec in schema {
        match raw.get(spec.name).filter(|v| !is_absent(v)) {
            Some(value) => {
                typed.insert(spec.name, coerce_value(spec, value)?);
            }
            None if spec.required => {
                return Err(DispatchFailure::MissingParameter {
                    name: spec.name.to_string(),
                });
            }
            None => {
                if let Some(default) = spec.default_value() {
                    typed.insert(spec.name, default);
                }
            }
        }
    }
    Ok(typed)
}

fn coerce_value(spec: &ParamSpec, value: &Value) -> Result<TypedValue, DispatchFailure> {
    let coerced = match spec.ty {
        ParamType::Float => parse_float(value).map(TypedValue::Float),
        ParamType::Text => parse_text(value).map(TypedValue::Text),
        ParamType::Color => parse_color(value)
            .map(TypedValue::Color)
            .map_err(|e| e.to_string()),
        ParamType::Choice(choices) => parse_choice(value, choices).map(TypedValue::Choice),
    };
    coerced.map_err(|reason| DispatchFailure::InvalidParameterValue {
        name: spec.name.to_string(),
        reason,
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used, clippy::panic)]
mod tests {
    use super::*;
    use crate::registry::params::{
        ColorObjectParams, CommandParams, MoveObjectParams, RotateObjectParams,
    };
    use serde_json::json;

    fn map(value: Value) -> Map<String, Value> {
        value.as_object().cloned().expect("object literal")
    }

    #[test]
    fn rotate_strings_are_coerced() {
        let typed = coerce(
            RotateObjectParams::SCHEMA,
            &map(json!({"angle_degrees": "90", "axis": "x"})),
        )
        .unwrap();
        assert_eq!(typed.get("angle_degrees"), Some(&TypedValue::Float(90.0)));
        assert_eq!(typed.get("axis"), Some(&TypedValue::Choice("X")));
    }

    #[test]
    fn absent_optionals_take_defaults() {
        let typed = coerce(MoveObjectParams::SCHEMA, &map(json!({"delta_x": 2}))).unwrap();
        assert_eq!(typed.get("delta_x"), Some(&TypedValue::Float(2.0)));
        assert_eq!(typed.get("delta_y"), Some(&TypedValue::Float(0.0)));
        assert_eq!(typed.get("delta_z"), Some(&TypedValue::Float(0.0)));
    }

    #[test]
    fn unknown_parameters_are_dropped() {
        let typed = coerce(
            MoveObjectParams::SCHEMA,
            &map(json!({"delta_x": 1, "speed": "fast"})),
        )
        .unwrap();
        assert_eq!(typed.len(), 3);
        assert!(typed.get("speed").is_none());
    }

    #[test]
    fn missing_required_is_named() {
        assert_eq!(
            coerce(ColorObjectParams::SCHEMA, &Map::new()).unwrap_err(),
            DispatchFailure::MissingParameter {
                name: "color_value".into()
            }
        );
    }

    #[test]
    fn null_and_blank_count_as_absent() {
        let err = coerce(ColorObjectParams::SCHEMA, &map(json!({"color_value": "  "}))).unwrap_err();
        assert!(matches!(err, DispatchFailure::MissingParameter { .. }));

        let typed = coerce(MoveObjectParams::SCHEMA, &map(json!({"delta_y": null}))).unwrap();
        assert_eq!(typed.get("delta_y"), Some(&TypedValue::Float(0.0)));
    }

    #[test]
    fn one_bad_value_fails_the_whole_step() {
        let err = coerce(
            RotateObjectParams::SCHEMA,
            &map(json!({"angle_degrees": "ninety", "axis": "X"})),
        )
        .unwrap_err();
        assert!(matches!(
            err,
            DispatchFailure::InvalidParameterValue { ref name, .. } if name == "angle_degrees"
        ));
    }

    #[test]
    fn color_errors_carry_parser_reason() {
        let err = coerce(
            ColorObjectParams::SCHEMA,
            &map(json!({"color_value": "not,a,color"})),
        )
        .unwrap_err();
        match err {
            DispatchFailure::InvalidParameterValue { name, reason } => {
                assert_eq!(name, "color_value");
                assert!(reason.contains("not,a,color"));
            }
            other => panic!("unexpected {other:?}"),
        }
    }
}
