//! The host application as seen by the command pipeline.
//!
//! [`Scene`] is the capability interface every handler calls through. The
//! pipeline never manipulates meshes, materials or node graphs itself.

pub mod bridge;
pub mod memory;

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::error::SceneError;
use crate::model::{Choice, ColorValue};

pub use bridge::{BridgeNotifier, BridgeScene};
pub use memory::MemoryScene;

/// Operations the host application exposes. Implementations use interior
/// mutability; the pipeline only ever holds `&dyn Scene`.
pub trait Scene: Send + Sync {
    /// Deselect everything, add the primitive at its spawn location and make it active.
    fn add_primitive(&self, shape: Primitive) -> Result<ObjectHandle, SceneError>;
    fn apply_modifier(&self, object: &ObjectHandle, modifier: Modifier) -> Result<(), SceneError>;
    fn set_mode(&self, mode: Mode) -> Result<(), SceneError>;
    fn switch_editor(&self, editor: Editor) -> Result<(), SceneError>;
    fn get_object(&self, target: &ObjectRef) -> Result<ObjectHandle, SceneError>;
    /// Return the object's first material, creating one if it has none.
    fn ensure_material(&self, object: &ObjectHandle) -> Result<MaterialHandle, SceneError>;
    fn set_base_color(&self, material: &MaterialHandle, color: ColorValue) -> Result<(), SceneError>;
    fn add_shader_node(
        &self,
        material: &MaterialHandle,
        node_type: &str,
    ) -> Result<NodeHandle, SceneError>;
    fn delete_selected_nodes(&self) -> Result<(), SceneError>;
    fn delete_selected(&self) -> Result<(), SceneError>;
    /// Multiply the object's scale per axis.
    fn scale(&self, object: &ObjectHandle, factors: [f64; 3]) -> Result<(), SceneError>;
    fn rotate(&self, object: &ObjectHandle, angle_degrees: f64, axis: Axis) -> Result<(), SceneError>;
    fn translate(&self, object: &ObjectHandle, delta: [f64; 3]) -> Result<(), SceneError>;
    fn set_view(&self, view: View) -> Result<(), SceneError>;
    /// Run arbitrary script text with full host privileges.
    fn execute_script(&self, script: &str) -> Result<(), SceneError>;
}

// ── Handles ─────────────────────────────────────────────────────

/// Which object an operation targets.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ObjectRef {
    Active,
    Named(String),
}

impl ObjectRef {
    pub fn from_name(name: Option<String>) -> Self {
        name.map_or(ObjectRef::Active, ObjectRef::Named)
    }
}

impl fmt::Display for ObjectRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ObjectRef::Active => write!(f, "active object"),
            ObjectRef::Named(name) => write!(f, "object '{name}'"),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ObjectHandle {
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct MaterialHandle {
    pub object: String,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NodeHandle {
    pub material: String,
    pub name: String,
}

// ── Enumerations ────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Primitive {
    Cube,
    Sphere,
    Cylinder,
    Plane,
    Torus,
    Cone,
    Curve,
}

impl Primitive {
    /// Default object name the host gives a freshly added primitive.
    pub fn base_name(self) -> &'static str {
        match self {
            Primitive::Cube => "Cube",
            Primitive::Sphere => "Sphere",
            Primitive::Cylinder => "Cylinder",
            Primitive::Plane => "Plane",
            Primitive::Torus => "Torus",
            Primitive::Cone => "Cone",
            Primitive::Curve => "BezierCurve",
        }
    }

    /// Where the host places a freshly added primitive.
    pub fn spawn_location(self) -> [f64; 3] {
        match self {
            Primitive::Sphere => [2.0, 0.0, 0.0],
            _ => [0.0; 3],
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Primitive::Cube => "cube",
            Primitive::Sphere => "sphere",
            Primitive::Cylinder => "cylinder",
            Primitive::Plane => "plane",
            Primitive::Torus => "torus",
            Primitive::Cone => "cone",
            Primitive::Curve => "curve",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Modifier {
    Subsurf,
    Boolean,
    Solidify,
    Mirror,
    Ocean,
    Bevel,
    Array,
    /// Only added by `open_geometry_nodes`, never by name.
    Nodes,
}

impl Modifier {
    pub const CHOICES: &'static [Choice] = &[
        Choice::with_aliases("SUBSURF", &["subdivision", "subdivision surface", "subdivide"]),
        Choice::new("BOOLEAN"),
        Choice::new("SOLIDIFY"),
        Choice::new("MIRROR"),
        Choice::new("OCEAN"),
        Choice::new("BEVEL"),
        Choice::new("ARRAY"),
    ];
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Mode {
    Object,
    Edit,
    Sculpt,
    VertexPaint,
    WeightPaint,
    TexturePaint,
    Pose,
}

impl Mode {
    pub const CHOICES: &'static [Choice] = &[
        Choice::with_aliases("OBJECT", &["object mode"]),
        Choice::with_aliases("EDIT", &["edit mode"]),
        Choice::with_aliases("SCULPT", &["sculpt mode"]),
        Choice::with_aliases("VERTEX_PAINT", &["vertex paint mode"]),
        Choice::with_aliases("WEIGHT_PAINT", &["weight paint mode"]),
        Choice::with_aliases("TEXTURE_PAINT", &["texture paint mode"]),
        Choice::with_aliases("POSE", &["pose mode"]),
    ];
}

/// Workspace editors reachable by voice. Several map to the same host area type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Editor {
    GeometryNodes,
    ShaderEditor,
    Animation,
    Timeline,
    UvEditing,
    VideoSequenceEditor,
    Scripting,
    Outliner,
    Properties,
}

impl Editor {
    pub const CHOICES: &'static [Choice] = &[
        Choice::with_aliases("GEOMETRY_NODES", &["geometry node editor"]),
        Choice::with_aliases("SHADER_EDITOR", &["shader", "shader nodes"]),
        Choice::with_aliases("ANIMATION", &["dope sheet", "dopesheet"]),
        Choice::new("TIMELINE"),
        Choice::with_aliases("UV_EDITING", &["uv editor", "uv"]),
        Choice::with_aliases("VIDEO_SEQUENCE_EDITOR", &["video editor", "sequencer"]),
        Choice::with_aliases("SCRIPTING", &["text editor", "script editor"]),
        Choice::new("OUTLINER"),
        Choice::new("PROPERTIES"),
    ];

    /// Host area type the editor lives in.
    pub fn area_type(self) -> &'static str {
        match self {
            Editor::GeometryNodes | Editor::ShaderEditor => "NODE_EDITOR",
            Editor::Animation => "DOPESHEET_EDITOR",
            Editor::Timeline => "TIMELINE",
            Editor::UvEditing => "IMAGE_EDITOR",
            Editor::VideoSequenceEditor => "SEQUENCE_EDITOR",
            Editor::Scripting => "TEXT_EDITOR",
            Editor::Outliner => "OUTLINER",
            Editor::Properties => "PROPERTIES",
        }
    }

    /// Node tree shown when the area is a node editor.
    pub fn node_tree_type(self) -> Option<&'static str> {
        match self {
            Editor::GeometryNodes => Some("GeometryNodeTree"),
            Editor::ShaderEditor => Some("ShaderNodeTree"),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum View {
    Front,
    Top,
    Right,
    Camera,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Axis {
    X,
    Y,
    Z,
}

impl Axis {
    pub const CHOICES: &'static [Choice] = &[Choice::new("X"), Choice::new("Y"), Choice::new("Z")];

    pub fn index(self) -> usize {
        match self {
            Axis::X => 0,
            Axis::Y => 1,
            Axis::Z => 2,
        }
    }
}

impl fmt::Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Axis::X => "X",
            Axis::Y => "Y",
            Axis::Z => "Z",
        };
        f.write_str(name)
    }
}

/// Shader node identifiers the host accepts for `add_shader_node`.
pub const SHADER_NODE_TYPES: &[&str] = &[
    "ShaderNodeBsdfPrincipled",
    "ShaderNodeBsdfDiffuse",
    "ShaderNodeBsdfGlass",
    "ShaderNodeEmission",
    "ShaderNodeMixShader",
    "ShaderNodeTexNoise",
    "ShaderNodeTexVoronoi",
    "ShaderNodeTexImage",
    "ShaderNodeTexCoord",
    "ShaderNodeMapping",
    "ShaderNodeValToRGB",
    "ShaderNodeBump",
    "ShaderNodeOutputMaterial",
];

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::model::parse_choice;
    use crate::util::from_serde_str;
    use serde_json::json;

    #[test]
    fn every_choice_names_a_variant() {
        for c in Modifier::CHOICES {
            assert!(from_serde_str::<Modifier>(c.canonical).is_some(), "{}", c.canonical);
        }
        for c in Mode::CHOICES {
            assert!(from_serde_str::<Mode>(c.canonical).is_some(), "{}", c.canonical);
        }
        for c in Editor::CHOICES {
            assert!(from_serde_str::<Editor>(c.canonical).is_some(), "{}", c.canonical);
        }
        for c in Axis::CHOICES {
            assert!(from_serde_str::<Axis>(c.canonical).is_some(), "{}", c.canonical);
        }
    }

    #[test]
    fn spoken_editor_names_resolve() {
        let canonical = parse_choice(&json!("geometry nodes"), Editor::CHOICES).unwrap();
        let editor: Editor = from_serde_str(canonical).unwrap();
        assert_eq!(editor.area_type(), "NODE_EDITOR");

        let canonical = parse_choice(&json!("uv editing"), Editor::CHOICES).unwrap();
        assert_eq!(from_serde_str::<Editor>(canonical), Some(Editor::UvEditing));
    }

    #[test]
    fn subdivision_alias_maps_to_subsurf() {
        let canonical = parse_choice(&json!("Subdivision"), Modifier::CHOICES).unwrap();
        assert_eq!(from_serde_str::<Modifier>(canonical), Some(Modifier::Subsurf));
    }

    #[test]
    fn geometry_nodes_is_not_a_named_modifier() {
        assert!(parse_choice(&json!("NODES"), Modifier::CHOICES).is_err());
        assert!(parse_choice(&json!("geometry nodes"), Modifier::CHOICES).is_err());
    }
}
