//! Headless in-process scene. Mirrors the host's observable behavior closely
//! enough for dry runs from the CLI and for exercising every handler in tests.

use indexmap::IndexMap;
use parking_lot::Mutex;
use serde::Serialize;

use super::{
    Axis, Editor, MaterialHandle, Mode, Modifier, NodeHandle, ObjectHandle, ObjectRef, Primitive,
    Scene, View, SHADER_NODE_TYPES,
};
use crate::error::SceneError;
use crate::model::ColorValue;

#[derive(Debug, Clone, Serialize)]
pub struct SceneObject {
    pub name: String,
    pub kind: Primitive,
    pub location: [f64; 3],
    pub rotation_degrees: [f64; 3],
    pub scale: [f64; 3],
    pub modifiers: Vec<Modifier>,
    pub material: Option<String>,
    pub selected: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct ShaderNode {
    pub name: String,
    pub node_type: String,
    pub selected: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct Material {
    pub name: String,
    pub base_color: Option<ColorValue>,
    pub nodes: Vec<ShaderNode>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SceneSnapshot {
    pub objects: IndexMap<String, SceneObject>,
    pub materials: IndexMap<String, Material>,
    pub active: Option<String>,
    pub mode: Mode,
    pub editor: Option<Editor>,
    pub view: Option<View>,
    pub scripts: Vec<String>,
    /// One line per host operation, in call order.
    pub log: Vec<String>,
}

impl SceneSnapshot {
    fn empty() -> Self {
        Self {
            objects: IndexMap::new(),
            materials: IndexMap::new(),
            active: None,
            mode: Mode::Object,
            editor: None,
            view: None,
            scripts: Vec::new(),
            log: Vec::new(),
        }
    }

    fn unique_name(&self, base: &str, taken: impl Fn(&str) -> bool) -> String {
        if !taken(base) {
            return base.to_string();
        }
        (1..)
            .map(|i| format!("{base}.{i:03}"))
            .find(|candidate| !taken(candidate))
            .unwrap_or_else(|| base.to_string())
    }

    fn object_mut(&mut self, name: &str) -> Result<&mut SceneObject, SceneError> {
        self.objects.get_mut(name).ok_or_else(|| SceneError::NotFound {
            what: format!("Object '{name}'"),
        })
    }

    fn material_mut(&mut self, name: &str) -> Result<&mut Material, SceneError> {
        self.materials.get_mut(name).ok_or_else(|| SceneError::NotFound {
            what: format!("Material '{name}'"),
        })
    }
}

pub struct MemoryScene {
    state: Mutex<SceneSnapshot>,
    script_failure: Option<String>,
}

impl Default for MemoryScene {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryScene {
    /// An empty scene with nothing selected.
    pub fn new() -> Self {
        Self {
            state: Mutex::new(SceneSnapshot::empty()),
            script_failure: None,
        }
    }

    /// The host's startup scene: a single active cube at the origin.
    pub fn with_default_cube() -> Self {
        let scene = Self::new();
        {
            let mut state = scene.state.lock();
            state.objects.insert(
                "Cube".to_string(),
                SceneObject {
                    name: "Cube".to_string(),
                    kind: Primitive::Cube,
                    location: [0.0; 3],
                    rotation_degrees: [0.0; 3],
                    scale: [1.0; 3],
                    modifiers: Vec::new(),
                    material: None,
                    selected: true,
                },
            );
            state.active = Some("Cube".to_string());
        }
        scene
    }

    /// Make every `execute_script` call fail with `message`.
    pub fn with_script_failure(mut self, message: impl Into<String>) -> Self {
        self.script_failure = Some(message.into());
        self
    }

    pub fn snapshot(&self) -> SceneSnapshot {
        self.state.lock().clone()
    }

    pub fn log(&self) -> Vec<String> {
        self.state.lock().log.clone()
    }

    /// Number of logged operations whose entry starts with `op`.
    pub fn count_ops(&self, op: &str) -> usize {
        self.state
            .lock()
            .log
            .iter()
            .filter(|entry| entry.split_whitespace().next() == Some(op))
            .count()
    }
}

impl Scene for MemoryScene {
    fn add_primitive(&self, shape: Primitive) -> Result<ObjectHandle, SceneError> {
        let mut state = self.state.lock();
        let name = state.unique_name(shape.base_name(), |n| state.objects.contains_key(n));
        for obj in state.objects.values_mut() {
            obj.selected = false;
        }
        state.objects.insert(
            name.clone(),
            SceneObject {
                name: name.clone(),
                kind: shape,
                location: shape.spawn_location(),
                rotation_degrees: [0.0; 3],
                scale: [1.0; 3],
                modifiers: Vec::new(),
                material: None,
                selected: true,
            },
        );
        state.active = Some(name.clone());
        state.log.push(format!("add_primitive {}", shape.label()));
        Ok(ObjectHandle { name })
    }

    fn apply_modifier(&self, object: &ObjectHandle, modifier: Modifier) -> Result<(), SceneError> {
        let mut state = self.state.lock();
        state.object_mut(&object.name)?.modifiers.push(modifier);
        state.log.push(format!("apply_modifier {} {modifier:?}", object.name));
        Ok(())
    }

    fn set_mode(&self, mode: Mode) -> Result<(), SceneError> {
        let mut state = self.state.lock();
        if mode != Mode::Object && state.active.is_none() {
            return Err(SceneError::Host {
                message: format!("Cannot enter {mode:?} mode without an active object"),
            });
        }
        state.mode = mode;
        state.log.push(format!("set_mode {mode:?}"));
        Ok(())
    }

    fn switch_editor(&self, editor: Editor) -> Result<(), SceneError> {
        let mut state = self.state.lock();
        state.editor = Some(editor);
        state.log.push(format!("switch_editor {}", editor.area_type()));
        Ok(())
    }

    fn get_object(&self, target: &ObjectRef) -> Result<ObjectHandle, SceneError> {
        let mut state = self.state.lock();
        let name = match target {
            ObjectRef::Active => state.active.clone().ok_or_else(|| SceneError::NotFound {
                what: "Active object".to_string(),
            })?,
            ObjectRef::Named(name) => {
                if !state.objects.contains_key(name) {
                    return Err(SceneError::NotFound {
                        what: format!("Object '{name}'"),
                    });
                }
                // Looking an object up by name also makes it active, like the host does.
                for obj in state.objects.values_mut() {
                    obj.selected = obj.name == *name;
                }
                state.active = Some(name.clone());
                name.clone()
            }
        };
        Ok(ObjectHandle { name })
    }

    fn ensure_material(&self, object: &ObjectHandle) -> Result<MaterialHandle, SceneError> {
        let mut state = self.state.lock();
        if let Some(existing) = state.object_mut(&object.name)?.material.clone() {
            return Ok(MaterialHandle {
                object: object.name.clone(),
                name: existing,
            });
        }
        let name = state.unique_name("Material", |n| state.materials.contains_key(n));
        state.materials.insert(
            name.clone(),
            Material {
                name: name.clone(),
                base_color: None,
                nodes: vec![
                    ShaderNode {
                        name: "Principled BSDF".to_string(),
                        node_type: "ShaderNodeBsdfPrincipled".to_string(),
                        selected: false,
                    },
                    ShaderNode {
                        name: "Material Output".to_string(),
                        node_type: "ShaderNodeOutputMaterial".to_string(),
                        selected: false,
                    },
                ],
            },
        );
        state.object_mut(&object.name)?.material = Some(name.clone());
        state.log.push(format!("ensure_material {} {name}", object.name));
        Ok(MaterialHandle {
            object: object.name.clone(),
            name,
        })
    }

    fn set_base_color(&self, material: &MaterialHandle, color: ColorValue) -> Result<(), SceneError> {
        let mut state = self.state.lock();
        state.material_mut(&material.name)?.base_color = Some(color);
        state.log.push(format!("set_base_color {} {color}", material.name));
        Ok(())
    }

    fn add_shader_node(
        &self,
        material: &MaterialHandle,
        node_type: &str,
    ) -> Result<NodeHandle, SceneError> {
        if !SHADER_NODE_TYPES.contains(&node_type) {
            return Err(SceneError::InvalidNodeType {
                node_type: node_type.to_string(),
            });
        }
        let mut state = self.state.lock();
        let mat = state.material_mut(&material.name)?;
        let base = node_type.trim_start_matches("ShaderNode").to_string();
        let name = if mat.nodes.iter().any(|n| n.name == base) {
            (1..)
                .map(|i| format!("{base}.{i:03}"))
                .find(|candidate| !mat.nodes.iter().any(|n| n.name == *candidate))
                .unwrap_or_else(|| base.clone())
        } else {
            base
        };
        for node in &mut mat.nodes {
            node.selected = false;
        }
        mat.nodes.push(ShaderNode {
            name: name.clone(),
            node_type: node_type.to_string(),
            selected: true,
        });
        state.log.push(format!("add_shader_node {} {node_type}", material.name));
        Ok(NodeHandle {
            material: material.name.clone(),
            name,
        })
    }

    fn delete_selected_nodes(&self) -> Result<(), SceneError> {
        let mut state = self.state.lock();
        let material = state
            .active
            .as_ref()
            .and_then(|active| state.objects.get(active))
            .and_then(|obj| obj.material.clone())
            .ok_or_else(|| SceneError::NotFound {
                what: "Node tree of the active object".to_string(),
            })?;
        state.material_mut(&material)?.nodes.retain(|n| !n.selected);
        state.log.push(format!("delete_selected_nodes {material}"));
        Ok(())
    }

    fn delete_selected(&self) -> Result<(), SceneError> {
        let mut state = self.state.lock();
        state.objects.retain(|_, obj| !obj.selected);
        if let Some(active) = state.active.clone() {
            if !state.objects.contains_key(&active) {
                state.active = None;
            }
        }
        state.log.push("delete_selected".to_string());
        Ok(())
    }

    fn scale(&self, object: &ObjectHandle, factors: [f64; 3]) -> Result<(), SceneError> {
        let mut state = self.state.lock();
        let obj = state.object_mut(&object.name)?;
        for (current, factor) in obj.scale.iter_mut().zip(factors) {
            *current *= factor;
        }
        state.log.push(format!("scale {} {factors:?}", object.name));
        Ok(())
    }

    fn rotate(&self, object: &ObjectHandle, angle_degrees: f64, axis: Axis) -> Result<(), SceneError> {
        let mut state = self.state.lock();
        let obj = state.object_mut(&object.name)?;
        if let Some(component) = obj.rotation_degrees.get_mut(axis.index()) {
            *component += angle_degrees;
        }
        state.log.push(format!("rotate {} {angle_degrees} {axis}", object.name));
        Ok(())
    }

    fn translate(&self, object: &ObjectHandle, delta: [f64; 3]) -> Result<(), SceneError> {
        let mut state = self.state.lock();
        let obj = state.object_mut(&object.name)?;
        for (current, d) in obj.location.iter_mut().zip(delta) {
            *current += d;
        }
        state.log.push(format!("translate {} {delta:?}", object.name));
        Ok(())
    }

    fn set_view(&self, view: View) -> Result<(), SceneError> {
        let mut state = self.state.lock();
        state.view = Some(view);
        state.log.push(format!("set_view {view:?}"));
        Ok(())
    }

    fn execute_script(&self, script: &str) -> Result<(), SceneError> {
        let mut state = self.state.lock();
        state.log.push(format!("execute_script {} bytes", script.len()));
        if let Some(message) = &self.script_failure {
            return Err(SceneError::Host {
                message: message.clone(),
            });
        }
        state.scripts.push(script.to_string());
        Ok(())
    }
}
