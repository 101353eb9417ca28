use std::fmt;

use indexmap::IndexMap;
use serde::Serialize;

use crate::error::DispatchFailure;
use crate::model::{Choice, ColorValue};
use crate::scene::{Axis, Editor, Mode, Modifier};
use crate::util::from_serde_str;

// ── Schema ──────────────────────────────────────────────────────

/// Declared type of a command parameter. Drives coercion of the untyped
/// value the model produced.
#[derive(Debug, Clone, Copy)]
pub enum ParamType {
    Float,
    Text,
    /// Color name, "r,g,b[,a]" string or list of 3-4 numbers.
    Color,
    Choice(&'static [Choice]),
}

impl ParamType {
    /// Short shape description shown to the model.
    pub fn shape(&self) -> String {
        match self {
            ParamType::Float => "number".to_string(),
            ParamType::Text => "string".to_string(),
            ParamType::Color => "color name | \"r,g,b[,a]\" | [r,g,b(,a)]".to_string(),
            ParamType::Choice(choices) => {
                let names: Vec<&str> = choices.iter().map(|c| c.canonical).collect();
                format!("one of {}", names.join("|"))
            }
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub enum ParamDefault {
    Float(f64),
    Choice(&'static str),
}

impl ParamDefault {
    fn typed(self) -> TypedValue {
        match self {
            ParamDefault::Float(f) => TypedValue::Float(f),
            ParamDefault::Choice(c) => TypedValue::Choice(c),
        }
    }
}

impl fmt::Display for ParamDefault {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ParamDefault::Float(v) => write!(f, "{v}"),
            ParamDefault::Choice(c) => f.write_str(c),
        }
    }
}

/// One entry of a command's parameter schema.
#[derive(Debug, Clone, Copy)]
pub struct ParamSpec {
    pub name: &'static str,
    pub ty: ParamType,
    pub required: bool,
    pub default: Option<ParamDefault>,
    /// Example value for the prompt's hint table.
    pub example: &'static str,
}

impl ParamSpec {
    pub const fn required(name: &'static str, ty: ParamType, example: &'static str) -> Self {
        Self {
            name,
            ty,
            required: true,
            default: None,
            example,
        }
    }

    pub const fn optional(name: &'static str, ty: ParamType, example: &'static str) -> Self {
        Self {
            name,
            ty,
            required: false,
            default: None,
            example,
        }
    }

    pub const fn float(name: &'static str, default: f64, example: &'static str) -> Self {
        Self {
            name,
            ty: ParamType::Float,
            required: false,
            default: Some(ParamDefault::Float(default)),
            example,
        }
    }

    pub const fn choice(
        name: &'static str,
        choices: &'static [Choice],
        default: &'static str,
        example: &'static str,
    ) -> Self {
        Self {
            name,
            ty: ParamType::Choice(choices),
            required: false,
            default: Some(ParamDefault::Choice(default)),
            example,
        }
    }

    /// Value used when the parameter is absent and not required.
    pub fn default_value(&self) -> Option<TypedValue> {
        self.default.map(ParamDefault::typed)
    }
}

// ── Typed values ────────────────────────────────────────────────

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum TypedValue {
    Float(f64),
    Text(String),
    Color(ColorValue),
    Choice(&'static str),
}

/// Parameters after coercion. Holds only names the schema declares.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct TypedParameters(IndexMap<&'static str, TypedValue>);

impl TypedParameters {
    pub fn insert(&mut self, name: &'static str, value: TypedValue) {
        self.0.insert(name, value);
    }

    pub fn get(&self, name: &str) -> Option<&TypedValue> {
        self.0.get(name)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn float(&self, name: &'static str) -> Result<f64, DispatchFailure> {
        match self.get(name) {
            Some(TypedValue::Float(f)) => Ok(*f),
            Some(other) => Err(mistyped(name, other)),
            None => Err(missing(name)),
        }
    }

    pub fn text(&self, name: &'static str) -> Result<String, DispatchFailure> {
        self.opt_text(name)?.ok_or_else(|| missing(name))
    }

    pub fn opt_text(&self, name: &'static str) -> Result<Option<String>, DispatchFailure> {
        match self.get(name) {
            Some(TypedValue::Text(s)) => Ok(Some(s.clone())),
            Some(other) => Err(mistyped(name, other)),
            None => Ok(None),
        }
    }

    pub fn color(&self, name: &'static str) -> Result<ColorValue, DispatchFailure> {
        match self.get(name) {
            Some(TypedValue::Color(c)) => Ok(*c),
            Some(other) => Err(mistyped(name, other)),
            None => Err(missing(name)),
        }
    }

    /// Resolve a choice into its enum via the variant's serde name.
    pub fn choice<T: for<'de> serde::Deserialize<'de>>(
        &self,
        name: &'static str,
    ) -> Result<T, DispatchFailure> {
        match self.get(name) {
            Some(TypedValue::Choice(c)) => {
                from_serde_str(c).ok_or_else(|| DispatchFailure::InvalidParameterValue {
                    name: name.to_string(),
                    reason: format!("'{c}' has no matching variant"),
                })
            }
            Some(other) => Err(mistyped(name, other)),
            None => Err(missing(name)),
        }
    }
}

fn missing(name: &str) -> DispatchFailure {
    DispatchFailure::MissingParameter {
        name: name.to_string(),
    }
}

fn mistyped(name: &str, value: &TypedValue) -> DispatchFailure {
    DispatchFailure::InvalidParameterValue {
        name: name.to_string(),
        reason: format!("unexpected value {value:?}"),
    }
}

/// A typed parameter struct bound to one command.
pub trait CommandParams: Sized {
    const SCHEMA: &'static [ParamSpec];

    fn from_typed(typed: &TypedParameters) -> Result<Self, DispatchFailure>;
}

// ── Object transforms ───────────────────────────────────────────

#[derive(Debug, Clone, Serialize)]
pub struct ScaleObjectParams {
    pub scale_x: f64,
    pub scale_y: f64,
    pub scale_z: f64,
}

impl CommandParams for ScaleObjectParams {
    const SCHEMA: &'static [ParamSpec] = &[
        ParamSpec::float("scale_x", 1.0, "2.0"),
        ParamSpec::float("scale_y", 1.0, "1.0"),
        ParamSpec::float("scale_z", 1.0, "0.5"),
    ];

    fn from_typed(typed: &TypedParameters) -> Result<Self, DispatchFailure> {
        Ok(Self {
            scale_x: typed.float("scale_x")?,
            scale_y: typed.float("scale_y")?,
            scale_z: typed.float("scale_z")?,
        })
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct RotateObjectParams {
    pub angle_degrees: f64,
    pub axis: Axis,
}

impl CommandParams for RotateObjectParams {
    const SCHEMA: &'static [ParamSpec] = &[
        ParamSpec::float("angle_degrees", 0.0, "90"),
        ParamSpec::choice("axis", Axis::CHOICES, "Z", "\"X\""),
    ];

    fn from_typed(typed: &TypedParameters) -> Result<Self, DispatchFailure> {
        Ok(Self {
            angle_degrees: typed.float("angle_degrees")?,
            axis: typed.choice("axis")?,
        })
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct MoveObjectParams {
    pub delta_x: f64,
    pub delta_y: f64,
    pub delta_z: f64,
}

impl CommandParams for MoveObjectParams {
    const SCHEMA: &'static [ParamSpec] = &[
        ParamSpec::float("delta_x", 0.0, "2.0"),
        ParamSpec::float("delta_y", 0.0, "0.0"),
        ParamSpec::float("delta_z", 0.0, "-1.5"),
    ];

    fn from_typed(typed: &TypedParameters) -> Result<Self, DispatchFailure> {
        Ok(Self {
            delta_x: typed.float("delta_x")?,
            delta_y: typed.float("delta_y")?,
            delta_z: typed.float("delta_z")?,
        })
    }
}

// ── Materials and shading ───────────────────────────────────────

#[derive(Debug, Clone, Serialize)]
pub struct ColorObjectParams {
    pub color_value: ColorValue,
    /// Defaults to the active object.
    pub object_name: Option<String>,
}

impl CommandParams for ColorObjectParams {
    const SCHEMA: &'static [ParamSpec] = &[
        ParamSpec::required("color_value", ParamType::Color, "\"red\" or \"0.1,0.2,0.9\""),
        ParamSpec::optional("object_name", ParamType::Text, "\"Cube\""),
    ];

    fn from_typed(typed: &TypedParameters) -> Result<Self, DispatchFailure> {
        Ok(Self {
            color_value: typed.color("color_value")?,
            object_name: typed.opt_text("object_name")?,
        })
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct AddShaderNodeParams {
    /// Host node identifier, e.g. `ShaderNodeTexNoise`. Validated by the host.
    pub node_type: String,
    pub object_name: Option<String>,
}

impl CommandParams for AddShaderNodeParams {
    const SCHEMA: &'static [ParamSpec] = &[
        ParamSpec::required("node_type", ParamType::Text, "\"ShaderNodeTexNoise\""),
        ParamSpec::optional("object_name", ParamType::Text, "\"Cube\""),
    ];

    fn from_typed(typed: &TypedParameters) -> Result<Self, DispatchFailure> {
        Ok(Self {
            node_type: typed.text("node_type")?,
            object_name: typed.opt_text("object_name")?,
        })
    }
}

// ── Modifiers, modes, editors ───────────────────────────────────

#[derive(Debug, Clone, Serialize)]
pub struct ApplyModifierParams {
    pub modifier_type: Modifier,
    pub object_name: Option<String>,
}

impl CommandParams for ApplyModifierParams {
    const SCHEMA: &'static [ParamSpec] = &[
        ParamSpec::required("modifier_type", ParamType::Choice(Modifier::CHOICES), "\"SUBSURF\""),
        ParamSpec::optional("object_name", ParamType::Text, "\"Cube\""),
    ];

    fn from_typed(typed: &TypedParameters) -> Result<Self, DispatchFailure> {
        Ok(Self {
            modifier_type: typed.choice("modifier_type")?,
            object_name: typed.opt_text("object_name")?,
        })
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SetModeParams {
    pub mode: Mode,
}

impl CommandParams for SetModeParams {
    const SCHEMA: &'static [ParamSpec] = &[ParamSpec::required(
        "mode",
        ParamType::Choice(Mode::CHOICES),
        "\"EDIT\"",
    )];

    fn from_typed(typed: &TypedParameters) -> Result<Self, DispatchFailure> {
        Ok(Self {
            mode: typed.choice("mode")?,
        })
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct SwitchEditorParams {
    pub editor: Editor,
}

impl CommandParams for SwitchEditorParams {
    const SCHEMA: &'static [ParamSpec] = &[ParamSpec::required(
        "editor",
        ParamType::Choice(Editor::CHOICES),
        "\"SHADER_EDITOR\"",
    )];

    fn from_typed(typed: &TypedParameters) -> Result<Self, DispatchFailure> {
        Ok(Self {
            editor: typed.choice("editor")?,
        })
    }
}

// ── Script generation ───────────────────────────────────────────

#[derive(Debug, Clone, Serialize)]
pub struct ExecuteGeneratedScriptParams {
    pub script_description: String,
}

impl CommandParams for ExecuteGeneratedScriptParams {
    const SCHEMA: &'static [ParamSpec] = &[ParamSpec::required(
        "script_description",
        ParamType::Text,
        "\"create a spiral staircase of 20 cubes\"",
    )];

    fn from_typed(typed: &TypedParameters) -> Result<Self, DispatchFailure> {
        Ok(Self {
            script_description: typed.text("script_description")?,
        })
    }
}
