pub mod catalog;
pub mod execute;
pub mod handlers;
pub mod params;
pub mod typing;

use std::sync::LazyLock;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

// ── Param types (used in Command enum) ──────────────────────────
use params::{
    AddShaderNodeParams, ApplyModifierParams, ColorObjectParams, CommandParams,
    ExecuteGeneratedScriptParams, MoveObjectParams, ParamSpec, RotateObjectParams,
    ScaleObjectParams, SetModeParams, SwitchEditorParams, TypedParameters,
};

// ── Handler modules (dispatch targets) ──────────────────────────
use handlers::{material, object, primitive, script, workspace};

use crate::error::{DispatchFailure, FailureReason};
use crate::state::AppContext;

// ── Command metadata ────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum CommandCategory {
    Object,
    Modifier,
    Transform,
    Material,
    Workspace,
    View,
    Script,
}

impl CommandCategory {
    pub fn slug(&self) -> &'static str {
        match self {
            Self::Object => "object",
            Self::Modifier => "modifier",
            Self::Transform => "transform",
            Self::Material => "material",
            Self::Workspace => "workspace",
            Self::View => "view",
            Self::Script => "script",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            Self::Object => "Add primitives and delete objects",
            Self::Modifier => "Add modifiers and geometry nodes",
            Self::Transform => "Scale, rotate and move objects",
            Self::Material => "Material colors and shader nodes",
            Self::Workspace => "Interaction modes and editors",
            Self::View => "Viewport angles",
            Self::Script => "Generate and run a full host script",
        }
    }

    pub fn all() -> &'static [CommandCategory] {
        &[
            Self::Object,
            Self::Modifier,
            Self::Transform,
            Self::Material,
            Self::Workspace,
            Self::View,
            Self::Script,
        ]
    }
}

pub struct CommandInfo {
    pub name: &'static str,
    pub description: &'static str,
    pub category: CommandCategory,
}

/// Registry entry: identifier, metadata and the parameter schema (possibly empty).
/// Immutable after the registry is built.
#[derive(Debug, Clone, Copy)]
pub struct CommandSpec {
    pub name: &'static str,
    pub description: &'static str,
    pub category: CommandCategory,
    pub params: &'static [ParamSpec],
}

// ── Command output ──────────────────────────────────────────────

/// Result of executing a Command: a human-readable confirmation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CommandOutput {
    pub message: String,
}

impl CommandOutput {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

// ── define_commands! macro ──────────────────────────────────────

/// Single source of truth for all commands. Generates:
/// 1. `Command` enum, one variant per command
/// 2. `Command::info()` with name, description and category
/// 3. `Command::dispatch()` to the bound handler
/// 4. `Command::registry_entries()` with each command's parameter schema
/// 5. `Command::from_typed()` to build a variant from typed parameters
macro_rules! define_commands {
    (
        params {
            $(
                [ $pc:expr ]
                $pv:ident ( $pp:ty )
                => $ph:path, $pn:literal : $pd:literal ;
            )*
        }
        no_params {
            $(
                [ $nc:expr ]
                $nv:ident
                => $nh:path, $nn:literal : $nd:literal ;
            )*
        }
    ) => {
        // ── 1. Command enum ──
        /// Every interpretable command. Adding a variant causes compiler errors
        /// until it is fully handled.
        #[derive(Debug, Clone, Serialize)]
        #[serde(tag = "command", content = "params")]
        pub enum Command {
            $( $pv($pp), )*
            $( $nv, )*
        }

        // ── 2. Command::info() ──
        impl Command {
            pub fn info(&self) -> CommandInfo {
                match self {
                    $( Command::$pv(_) => CommandInfo {
                        name: $pn,
                        description: $pd,
                        category: $pc,
                    }, )*
                    $( Command::$nv => CommandInfo {
                        name: $nn,
                        description: $nd,
                        category: $nc,
                    }, )*
                }
            }
        }

        // ── 3. Command::dispatch() ──
        impl Command {
            pub(crate) fn dispatch(self, ctx: &AppContext) -> Result<CommandOutput, FailureReason> {
                match self {
                    $( Command::$pv(p) => $ph(ctx, p), )*
                    $( Command::$nv => $nh(ctx), )*
                }
            }
        }

        // ── 4. Command::registry_entries() ──
        impl Command {
            fn registry_entries() -> Vec<CommandSpec> {
                vec![
                    $( CommandSpec {
                        name: $pn,
                        description: $pd,
                        category: $pc,
                        params: <$pp as CommandParams>::SCHEMA,
                    }, )*
                    $( CommandSpec {
                        name: $nn,
                        description: $nd,
                        category: $nc,
                        params: &[],
                    }, )*
                ]
            }
        }

        // ── 5. Command::from_typed() ──
        impl Command {
            pub fn from_typed(
                name: &str,
                typed: &TypedParameters,
            ) -> Result<Command, DispatchFailure> {
                match name {
                    $( $pn => Ok(Command::$pv(<$pp as CommandParams>::from_typed(typed)?)), )*
                    $( $nn => Ok(Command::$nv), )*
                    _ => Err(DispatchFailure::UnknownCommand {
                        command: name.to_string(),
                    }),
                }
            }
        }
    };
}

// ── Command definitions ─────────────────────────────────────────

define_commands! {
    params {
        // ── Transform (3) ───────────────────────────────────────
        [CommandCategory::Transform]
        ScaleObject(ScaleObjectParams)
        => object::scale_object, "scale_object": "Scale the active object per axis (1.0 = unchanged).";

        [CommandCategory::Transform]
        RotateObject(RotateObjectParams)
        => object::rotate_object, "rotate_object": "Rotate the active object by an angle in degrees around one axis.";

        [CommandCategory::Transform]
        MoveObject(MoveObjectParams)
        => object::move_object, "move_object": "Move the active object by an offset.";

        // ── Material (2) ────────────────────────────────────────
        [CommandCategory::Material]
        ColorObject(ColorObjectParams)
        => material::color_object, "color_object": "Set the base color of an object's material (active object by default).";

        [CommandCategory::Material]
        AddShaderNode(AddShaderNodeParams)
        => material::add_shader_node, "add_shader_node": "Add a shader node to an object's material node tree.";

        // ── Modifier (1) ────────────────────────────────────────
        [CommandCategory::Modifier]
        ApplyModifier(ApplyModifierParams)
        => primitive::apply_modifier, "apply_modifier": "Add a modifier to an object (active object by default).";

        // ── Workspace (2) ───────────────────────────────────────
        [CommandCategory::Workspace]
        SetMode(SetModeParams)
        => workspace::set_mode, "set_mode": "Switch the interaction mode (object, edit, sculpt, paint, pose).";

        [CommandCategory::Workspace]
        SwitchEditor(SwitchEditorParams)
        => workspace::switch_editor, "switch_editor": "Change the main area to another editor.";

        // ── Script (1) ──────────────────────────────────────────
        [CommandCategory::Script]
        ExecuteGeneratedScript(ExecuteGeneratedScriptParams)
        => script::execute_generated_script, "execute_generated_script": "Generate a full host script from a description and run it. Use only when no other command fits.";
    }
    no_params {
        // ── Object (8) ──────────────────────────────────────────
        [CommandCategory::Object]
        AddCube => primitive::add_cube, "add_cube": "Add a cube at the origin.";

        [CommandCategory::Object]
        AddSphere => primitive::add_sphere, "add_sphere": "Add a UV sphere.";

        [CommandCategory::Object]
        AddCylinder => primitive::add_cylinder, "add_cylinder": "Add a cylinder at the origin.";

        [CommandCategory::Object]
        AddPlane => primitive::add_plane, "add_plane": "Add a plane at the origin.";

        [CommandCategory::Object]
        AddTorus => primitive::add_torus, "add_torus": "Add a torus at the origin.";

        [CommandCategory::Object]
        AddCone => primitive::add_cone, "add_cone": "Add a cone at the origin.";

        [CommandCategory::Object]
        AddCurve => primitive::add_curve, "add_curve": "Add a Bezier curve at the origin.";

        [CommandCategory::Object]
        DeleteObject => primitive::delete_object, "delete_object": "Delete the selected objects.";

        // ── Modifier (2) ────────────────────────────────────────
        [CommandCategory::Modifier]
        AddOceanModifier
        => primitive::add_ocean_modifier, "add_ocean_modifier": "Add an ocean modifier to the active object.";

        [CommandCategory::Modifier]
        OpenGeometryNodes
        => primitive::open_geometry_nodes, "open_geometry_nodes": "Add a geometry nodes modifier to the active object and open the node editor.";

        // ── Material (1) ────────────────────────────────────────
        [CommandCategory::Material]
        RemoveSelectedNodes
        => material::remove_selected_nodes, "remove_selected_nodes": "Delete the selected nodes in the active object's material.";

        // ── View (4) ────────────────────────────────────────────
        [CommandCategory::View]
        ViewFront => workspace::view_front, "view_front": "Look at the scene from the front.";

        [CommandCategory::View]
        ViewTop => workspace::view_top, "view_top": "Look at the scene from above.";

        [CommandCategory::View]
        ViewRight => workspace::view_right, "view_right": "Look at the scene from the right.";

        [CommandCategory::View]
        ViewCamera => workspace::view_camera, "view_camera": "Look through the active camera.";
    }
}

// ── Lookup ──────────────────────────────────────────────────────

static REGISTRY: LazyLock<IndexMap<&'static str, CommandSpec>> = LazyLock::new(|| {
    Command::registry_entries()
        .into_iter()
        .map(|spec| (spec.name, spec))
        .collect()
});

/// The closed command table, in declaration order.
pub fn registry() -> &'static IndexMap<&'static str, CommandSpec> {
    &REGISTRY
}

/// Resolve an identifier: exact match first, then the normalized spelling
/// ("Add Cube", "add-cube" → `add_cube`).
pub fn lookup(identifier: &str) -> Option<&'static CommandSpec> {
    REGISTRY
        .get(identifier)
        .or_else(|| REGISTRY.get(normalize_identifier(identifier).as_str()))
}

pub fn normalize_identifier(raw: &str) -> String {
    raw.trim()
        .to_lowercase()
        .split(|c: char| c == '-' || c.is_whitespace())
        .filter(|part| !part.is_empty())
        .collect::<Vec<_>>()
        .join("_")
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;

    #[test]
    fn identifiers_are_unique() {
        assert_eq!(REGISTRY.len(), Command::registry_entries().len());
    }

    #[test]
    fn every_entry_builds_from_its_defaults() {
        for spec in registry().values() {
            if spec.params.iter().any(|p| p.required) {
                continue;
            }
            let typed = typing::coerce(spec.params, &serde_json::Map::new()).unwrap();
            let cmd = Command::from_typed(spec.name, &typed).unwrap();
            assert_eq!(cmd.info().name, spec.name);
            assert_eq!(cmd.info().category, spec.category);
        }
    }

    #[test]
    fn lookup_normalizes_spelling() {
        assert_eq!(lookup("add_cube").map(|s| s.name), Some("add_cube"));
        assert_eq!(lookup(" Add Cube ").map(|s| s.name), Some("add_cube"));
        assert_eq!(lookup("rotate-object").map(|s| s.name), Some("rotate_object"));
        assert!(lookup("nonexistent_command").is_none());
    }

    #[test]
    fn documented_schemas_are_present() {
        let color = lookup("color_object").expect("registered");
        let names: Vec<&str> = color.params.iter().map(|p| p.name).collect();
        assert_eq!(names, ["color_value", "object_name"]);

        let rotate = lookup("rotate_object").expect("registered");
        assert!(rotate.params.iter().all(|p| !p.required));

        assert!(lookup("remove_selected_nodes").expect("registered").params.is_empty());
    }

    #[test]
    fn every_category_has_commands() {
        for cat in CommandCategory::all() {
            assert!(
                registry().values().any(|s| s.category == *cat),
                "{}",
                cat.slug()
            );
        }
    }
}
