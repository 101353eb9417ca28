//! Scene binding that drives a live 3D application through a small HTTP
//! listener running inside it.
//!
//! Listener contract:
//! - `POST {bridge_url}/exec` with `{"script": "<python>"}`. The listener runs
//!   the script with `bpy` in its globals. If the script assigns a global named
//!   `result`, its value is returned.
//! - Response `{"status": "ok", "result": ...}` on success, or
//!   `{"status": "error", "kind": "not_found" | "invalid_node_type" | "host", "message": "..."}`.
//!   The listener reports `LookupError` as `not_found` and `TypeError` as
//!   `invalid_node_type`.
//! - `POST {bridge_url}/notify` with `{"message": "..."}` shows a message in the
//!   host UI.

use std::time::Duration;

use serde::Deserialize;
use serde_json::Value;

use super::{
    Axis, Editor, MaterialHandle, Mode, Modifier, NodeHandle, ObjectHandle, ObjectRef, Primitive,
    Scene, View,
};
use crate::error::SceneError;
use crate::model::ColorValue;
use crate::notify::Notifier;
use crate::settings::HostConfig;
use crate::util::serde_variant_name;

#[derive(Debug, Deserialize)]
struct ExecResponse {
    status: String,
    #[serde(default)]
    kind: Option<String>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    result: Option<Value>,
}

impl ExecResponse {
    fn into_result(self) -> Result<Option<Value>, SceneError> {
        if self.status == "ok" {
            return Ok(self.result);
        }
        let message = self.message.unwrap_or_else(|| "unknown host error".to_string());
        Err(match self.kind.as_deref() {
            Some("not_found") => SceneError::NotFound { what: message },
            Some("invalid_node_type") => SceneError::InvalidNodeType { node_type: message },
            _ => SceneError::Host { message },
        })
    }
}

pub struct BridgeScene {
    client: reqwest::blocking::Client,
    base_url: String,
}

impl BridgeScene {
    pub fn new(config: &HostConfig) -> Result<Self, SceneError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| host_error(&e))?;
        Ok(Self {
            client,
            base_url: config.bridge_url.trim_end_matches('/').to_string(),
        })
    }

    fn exec(&self, script: &str) -> Result<Option<Value>, SceneError> {
        tracing::debug!(bytes = script.len(), "Sending script to host");
        let response = self
            .client
            .post(format!("{}/exec", self.base_url))
            .json(&serde_json::json!({ "script": script }))
            .send()
            .map_err(|e| host_error(&e))?;
        let status = response.status();
        if !status.is_success() {
            return Err(SceneError::Host {
                message: format!("Bridge returned HTTP {status}"),
            });
        }
        let body: ExecResponse = response.json().map_err(|e| host_error(&e))?;
        body.into_result()
    }

    /// Run a snippet that assigns a string `result`.
    fn exec_name(&self, script: &str) -> Result<String, SceneError> {
        match self.exec(script)? {
            Some(Value::String(name)) => Ok(name),
            other => Err(SceneError::Host {
                message: format!("Expected a name from the host, got {other:?}"),
            }),
        }
    }
}

fn host_error(e: &reqwest::Error) -> SceneError {
    SceneError::Host {
        message: e.to_string(),
    }
}

impl Scene for BridgeScene {
    fn add_primitive(&self, shape: Primitive) -> Result<ObjectHandle, SceneError> {
        let name = self.exec_name(&render::add_primitive(shape))?;
        Ok(ObjectHandle { name })
    }

    fn apply_modifier(&self, object: &ObjectHandle, modifier: Modifier) -> Result<(), SceneError> {
        self.exec(&render::apply_modifier(&object.name, modifier)).map(drop)
    }

    fn set_mode(&self, mode: Mode) -> Result<(), SceneError> {
        self.exec(&render::set_mode(mode)).map(drop)
    }

    fn switch_editor(&self, editor: Editor) -> Result<(), SceneError> {
        self.exec(&render::switch_editor(editor)).map(drop)
    }

    fn get_object(&self, target: &ObjectRef) -> Result<ObjectHandle, SceneError> {
        let name = self.exec_name(&render::get_object(target))?;
        Ok(ObjectHandle { name })
    }

    fn ensure_material(&self, object: &ObjectHandle) -> Result<MaterialHandle, SceneError> {
        let name = self.exec_name(&render::ensure_material(&object.name))?;
        Ok(MaterialHandle {
            object: object.name.clone(),
            name,
        })
    }

    fn set_base_color(&self, material: &MaterialHandle, color: ColorValue) -> Result<(), SceneError> {
        self.exec(&render::set_base_color(&material.name, color)).map(drop)
    }

    fn add_shader_node(
        &self,
        material: &MaterialHandle,
        node_type: &str,
    ) -> Result<NodeHandle, SceneError> {
        let name = self.exec_name(&render::add_shader_node(&material.name, node_type))?;
        Ok(NodeHandle {
            material: material.name.clone(),
            name,
        })
    }

    fn delete_selected_nodes(&self) -> Result<(), SceneError> {
        self.exec(render::DELETE_SELECTED_NODES).map(drop)
    }

    fn delete_selected(&self) -> Result<(), SceneError> {
        self.exec("bpy.ops.object.delete()\n").map(drop)
    }

    fn scale(&self, object: &ObjectHandle, factors: [f64; 3]) -> Result<(), SceneError> {
        self.exec(&render::scale(&object.name, factors)).map(drop)
    }

    fn rotate(&self, object: &ObjectHandle, angle_degrees: f64, axis: Axis) -> Result<(), SceneError> {
        self.exec(&render::rotate(&object.name, angle_degrees, axis)).map(drop)
    }

    fn translate(&self, object: &ObjectHandle, delta: [f64; 3]) -> Result<(), SceneError> {
        self.exec(&render::translate(&object.name, delta)).map(drop)
    }

    fn set_view(&self, view: View) -> Result<(), SceneError> {
        self.exec(&render::set_view(view)).map(drop)
    }

    fn execute_script(&self, script: &str) -> Result<(), SceneError> {
        self.exec(script).map(drop)
    }
}

/// Shows result messages in the host UI through the bridge.
pub struct BridgeNotifier {
    client: reqwest::blocking::Client,
    url: String,
}

impl BridgeNotifier {
    pub fn new(config: &HostConfig) -> Result<Self, SceneError> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| host_error(&e))?;
        Ok(Self {
            client,
            url: format!("{}/notify", config.bridge_url.trim_end_matches('/')),
        })
    }
}

impl Notifier for BridgeNotifier {
    fn notify(&self, message: &str) {
        let sent = self
            .client
            .post(&self.url)
            .json(&serde_json::json!({ "message": message }))
            .send();
        if let Err(e) = sent {
            tracing::warn!(error = %e, "Host notification failed");
            tracing::info!(target: "scene_voice::notify", "{message}");
        }
    }
}

// ── Script rendering ────────────────────────────────────────────

/// Host-side script text for each scene operation.
pub mod render {
    use std::fmt::Write;

    use super::{
        serde_variant_name, Axis, ColorValue, Editor, Mode, Modifier, ObjectRef, Primitive, View,
    };

    /// Python string literal. JSON string escapes are valid Python escapes.
    pub fn py_str(s: &str) -> String {
        serde_json::to_string(s).unwrap_or_else(|_| "\"\"".to_string())
    }

    fn py_tuple(values: &[f64]) -> String {
        let parts: Vec<String> = values.iter().map(|v| format!("{v:?}")).collect();
        format!("({})", parts.join(", "))
    }

    /// Bind `obj` to the named object and make it the only selected, active one.
    fn bind_object(name: &str) -> String {
        let lit = py_str(name);
        format!(
            "obj = bpy.data.objects.get({lit})\n\
             if obj is None:\n    raise LookupError(\"Object '\" + {lit} + \"'\")\n\
             bpy.ops.object.select_all(action='DESELECT')\n\
             obj.select_set(True)\n\
             bpy.context.view_layer.objects.active = obj\n"
        )
    }

    fn bind_material(name: &str) -> String {
        let lit = py_str(name);
        format!(
            "mat = bpy.data.materials.get({lit})\n\
             if mat is None:\n    raise LookupError(\"Material '\" + {lit} + \"'\")\n\
             mat.use_nodes = True\n"
        )
    }

    pub fn add_primitive(shape: Primitive) -> String {
        let loc = py_tuple(&shape.spawn_location());
        let op = match shape {
            Primitive::Cube => format!("mesh.primitive_cube_add(size=2, location={loc})"),
            Primitive::Sphere => format!("mesh.primitive_uv_sphere_add(radius=1, location={loc})"),
            Primitive::Cylinder => format!("mesh.primitive_cylinder_add(location={loc})"),
            Primitive::Plane => format!("mesh.primitive_plane_add(size=2, location={loc})"),
            Primitive::Torus => format!("mesh.primitive_torus_add(location={loc})"),
            Primitive::Cone => format!("mesh.primitive_cone_add(location={loc})"),
            Primitive::Curve => format!("curve.primitive_bezier_curve_add(location={loc})"),
        };
        format!(
            "bpy.ops.object.select_all(action='DESELECT')\n\
             bpy.ops.{op}\n\
             result = bpy.context.active_object.name\n"
        )
    }

    pub fn get_object(target: &ObjectRef) -> String {
        match target {
            ObjectRef::Active => "obj = bpy.context.active_object\n\
                 if obj is None:\n    raise LookupError(\"Active object\")\n\
                 result = obj.name\n"
                .to_string(),
            ObjectRef::Named(name) => format!("{}result = obj.name\n", bind_object(name)),
        }
    }

    pub fn apply_modifier(object: &str, modifier: Modifier) -> String {
        let mut script = bind_object(object);
        if modifier == Modifier::Nodes {
            script.push_str("bpy.ops.node.new_geometry_nodes_modifier()\n");
        } else {
            let kind = serde_variant_name(&modifier).unwrap_or_default();
            let _ = writeln!(script, "bpy.ops.object.modifier_add(type='{kind}')");
        }
        script
    }

    pub fn set_mode(mode: Mode) -> String {
        let name = serde_variant_name(&mode).unwrap_or_default();
        format!("bpy.ops.object.mode_set(mode='{name}')\n")
    }

    pub fn switch_editor(editor: Editor) -> String {
        let mut script = String::from(
            "areas = list(bpy.context.screen.areas)\n\
             area = next((a for a in areas if a.type == 'VIEW_3D'), areas[0] if areas else None)\n\
             if area is None:\n    raise LookupError(\"Screen area\")\n",
        );
        let _ = writeln!(script, "area.type = '{}'", editor.area_type());
        if let Some(tree) = editor.node_tree_type() {
            let _ = writeln!(script, "area.spaces.active.tree_type = '{tree}'");
        }
        script
    }

    pub fn ensure_material(object: &str) -> String {
        format!(
            "{}if not hasattr(obj.data, 'materials'):\n    raise RuntimeError(obj.name + ' cannot hold materials')\n\
             if obj.active_material is None:\n    \
             mat = bpy.data.materials.new(name='Material')\n    \
             mat.use_nodes = True\n    \
             obj.data.materials.append(mat)\n\
             result = obj.active_material.name\n",
            bind_object(object)
        )
    }

    pub fn set_base_color(material: &str, color: ColorValue) -> String {
        let rgba = py_tuple(&color.components());
        format!(
            "{}bsdf = mat.node_tree.nodes.get('Principled BSDF')\n\
             if bsdf is not None:\n    bsdf.inputs['Base Color'].default_value = {rgba}\n\
             mat.diffuse_color = {rgba}\n",
            bind_material(material)
        )
    }

    pub fn add_shader_node(material: &str, node_type: &str) -> String {
        let lit = py_str(node_type);
        format!(
            "{}for n in mat.node_tree.nodes:\n    n.select = False\n\
             try:\n    node = mat.node_tree.nodes.new({lit})\n\
             except RuntimeError:\n    raise TypeError({lit})\n\
             node.select = True\n\
             result = node.name\n",
            bind_material(material)
        )
    }

    pub const DELETE_SELECTED_NODES: &str = "obj = bpy.context.active_object\n\
        mat = obj.active_material if obj is not None else None\n\
        if mat is None or mat.node_tree is None:\n    raise LookupError(\"Node tree of the active object\")\n\
        for node in [n for n in mat.node_tree.nodes if n.select]:\n    mat.node_tree.nodes.remove(node)\n";

    pub fn scale(object: &str, factors: [f64; 3]) -> String {
        let mut script = bind_object(object);
        for (i, f) in factors.iter().enumerate() {
            let _ = writeln!(script, "obj.scale[{i}] *= {f:?}");
        }
        script
    }

    pub fn rotate(object: &str, angle_degrees: f64, axis: Axis) -> String {
        format!(
            "import math\n{}obj.rotation_euler[{}] += math.radians({angle_degrees:?})\n",
            bind_object(object),
            axis.index()
        )
    }

    pub fn translate(object: &str, delta: [f64; 3]) -> String {
        let mut script = bind_object(object);
        for (i, d) in delta.iter().enumerate() {
            let _ = writeln!(script, "obj.location[{i}] += {d:?}");
        }
        script
    }

    pub fn set_view(view: View) -> String {
        let op = match view {
            View::Camera => "bpy.ops.view3d.view_camera()".to_string(),
            other => format!(
                "bpy.ops.view3d.view_axis(type='{}')",
                serde_variant_name(&other).unwrap_or_default()
            ),
        };
        format!(
            "area = next((a for a in bpy.context.screen.areas if a.type == 'VIEW_3D'), None)\n\
             if area is None:\n    raise LookupError(\"3D viewport\")\n\
             region = next(r for r in area.regions if r.type == 'WINDOW')\n\
             with bpy.context.temp_override(area=area, region=region):\n    {op}\n"
        )
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::model::parse_color_str;
    use serde_json::json;

    #[test]
    fn primitives_render_host_ops() {
        let cube = render::add_primitive(Primitive::Cube);
        assert!(cube.contains("bpy.ops.object.select_all(action='DESELECT')"));
        assert!(cube.contains("primitive_cube_add(size=2, location=(0.0, 0.0, 0.0))"));
        assert!(cube.ends_with("result = bpy.context.active_object.name\n"));

        let sphere = render::add_primitive(Primitive::Sphere);
        assert!(sphere.contains("primitive_uv_sphere_add(radius=1, location=(2.0, 0.0, 0.0))"));
        assert!(render::add_primitive(Primitive::Curve).contains("curve.primitive_bezier_curve_add"));
    }

    #[test]
    fn names_are_quoted_safely() {
        let script = render::get_object(&ObjectRef::Named("it's \"odd\"".into()));
        assert!(script.contains(r#"bpy.data.objects.get("it's \"odd\"")"#));
    }

    #[test]
    fn modifiers_and_modes_use_host_identifiers() {
        assert!(render::apply_modifier("Cube", Modifier::Subsurf)
            .contains("bpy.ops.object.modifier_add(type='SUBSURF')"));
        assert!(render::apply_modifier("Cube", Modifier::Nodes)
            .contains("bpy.ops.node.new_geometry_nodes_modifier()"));
        assert_eq!(
            render::set_mode(Mode::VertexPaint),
            "bpy.ops.object.mode_set(mode='VERTEX_PAINT')\n"
        );
    }

    #[test]
    fn editors_switch_area_type() {
        let script = render::switch_editor(Editor::ShaderEditor);
        assert!(script.contains("area.type = 'NODE_EDITOR'"));
        assert!(script.contains("tree_type = 'ShaderNodeTree'"));
        assert!(!render::switch_editor(Editor::Timeline).contains("tree_type"));
    }

    #[test]
    fn transforms_render_per_axis() {
        let rotate = render::rotate("Cube", 90.0, Axis::X);
        assert!(rotate.contains("obj.rotation_euler[0] += math.radians(90.0)"));
        let moved = render::translate("Cube", [2.0, 0.0, -1.5]);
        assert!(moved.contains("obj.location[2] += -1.5"));
    }

    #[test]
    fn colors_render_rgba_tuple() {
        let script = render::set_base_color("Material", parse_color_str("1,0,0,0.5").unwrap());
        assert!(script.contains("default_value = (1.0, 0.0, 0.0, 0.5)"));
    }

    #[test]
    fn views_use_viewport_override() {
        assert!(render::set_view(View::Top).contains("view_axis(type='TOP')"));
        assert!(render::set_view(View::Camera).contains("view_camera()"));
    }

    #[test]
    fn error_kinds_map_to_scene_errors() {
        let parse = |v: Value| serde_json::from_value::<ExecResponse>(v).unwrap().into_result();

        assert_eq!(
            parse(json!({"status": "ok", "result": "Cube.001"})).unwrap(),
            Some(json!("Cube.001"))
        );
        assert_eq!(
            parse(json!({"status": "error", "kind": "not_found", "message": "Object 'Foo'"})),
            Err(SceneError::NotFound {
                what: "Object 'Foo'".into()
            })
        );
        assert!(matches!(
            parse(json!({"status": "error", "kind": "invalid_node_type", "message": "X"})),
            Err(SceneError::InvalidNodeType { .. })
        ));
        assert!(matches!(
            parse(json!({"status": "error", "message": "NameError"})),
            Err(SceneError::Host { .. })
        ));
    }
}
