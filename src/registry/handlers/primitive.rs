#![allow(clippy::needless_pass_by_value)]

use crate::error::FailureReason;
use crate::registry::params::ApplyModifierParams;
use crate::registry::CommandOutput;
use crate::scene::{Editor, Modifier, ObjectRef, Primitive};
use crate::state::AppContext;
use crate::util::serde_variant_name;

use super::target_object;

fn add(ctx: &AppContext, shape: Primitive) -> Result<CommandOutput, FailureReason> {
    let added = ctx.scene.add_primitive(shape)?;
    tracing::debug!(object = %added.name, "Primitive added");
    Ok(CommandOutput::new(format!(
        "Added a {} to the scene.",
        shape.label()
    )))
}

pub fn add_cube(ctx: &AppContext) -> Result<CommandOutput, FailureReason> {
    add(ctx, Primitive::Cube)
}

pub fn add_sphere(ctx: &AppContext) -> Result<CommandOutput, FailureReason> {
    add(ctx, Primitive::Sphere)
}

pub fn add_cylinder(ctx: &AppContext) -> Result<CommandOutput, FailureReason> {
    add(ctx, Primitive::Cylinder)
}

pub fn add_plane(ctx: &AppContext) -> Result<CommandOutput, FailureReason> {
    add(ctx, Primitive::Plane)
}

pub fn add_torus(ctx: &AppContext) -> Result<CommandOutput, FailureReason> {
    add(ctx, Primitive::Torus)
}

pub fn add_cone(ctx: &AppContext) -> Result<CommandOutput, FailureReason> {
    add(ctx, Primitive::Cone)
}

pub fn add_curve(ctx: &AppContext) -> Result<CommandOutput, FailureReason> {
    add(ctx, Primitive::Curve)
}

pub fn delete_object(ctx: &AppContext) -> Result<CommandOutput, FailureReason> {
    ctx.scene.delete_selected()?;
    Ok(CommandOutput::new("Deleted the selected objects."))
}

pub fn apply_modifier(
    ctx: &AppContext,
    p: ApplyModifierParams,
) -> Result<CommandOutput, FailureReason> {
    let object = target_object(ctx, p.object_name)?;
    ctx.scene.apply_modifier(&object, p.modifier_type)?;
    Ok(CommandOutput::new(format!(
        "Applied {} modifier to {}",
        serde_variant_name(&p.modifier_type).unwrap_or_default(),
        object.name
    )))
}

pub fn add_ocean_modifier(ctx: &AppContext) -> Result<CommandOutput, FailureReason> {
    let object = ctx.scene.get_object(&ObjectRef::Active)?;
    ctx.scene.apply_modifier(&object, Modifier::Ocean)?;
    Ok(CommandOutput::new(format!(
        "Applied OCEAN modifier to {}",
        object.name
    )))
}

pub fn open_geometry_nodes(ctx: &AppContext) -> Result<CommandOutput, FailureReason> {
    let object = ctx.scene.get_object(&ObjectRef::Active)?;
    ctx.scene.apply_modifier(&object, Modifier::Nodes)?;
    ctx.scene.switch_editor(Editor::GeometryNodes)?;
    Ok(CommandOutput::new(format!(
        "Opened geometry nodes for {}",
        object.name
    )))
}
