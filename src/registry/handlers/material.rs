#![allow(clippy::needless_pass_by_value)]

use crate::error::FailureReason;
use crate::registry::params::{AddShaderNodeParams, ColorObjectParams};
use crate::registry::CommandOutput;
use crate::state::AppContext;

use super::target_object;

pub fn color_object(ctx: &AppContext, p: ColorObjectParams) -> Result<CommandOutput, FailureReason> {
    let object = target_object(ctx, p.object_name)?;
    let material = ctx.scene.ensure_material(&object)?;
    ctx.scene.set_base_color(&material, p.color_value)?;
    Ok(CommandOutput::new(format!(
        "Set the color of {} to {}",
        object.name, p.color_value
    )))
}

pub fn add_shader_node(
    ctx: &AppContext,
    p: AddShaderNodeParams,
) -> Result<CommandOutput, FailureReason> {
    let object = target_object(ctx, p.object_name)?;
    let material = ctx.scene.ensure_material(&object)?;
    let node = ctx.scene.add_shader_node(&material, &p.node_type)?;
    Ok(CommandOutput::new(format!(
        "Added {} node '{}' to material {}",
        p.node_type, node.name, material.name
    )))
}

pub fn remove_selected_nodes(ctx: &AppContext) -> Result<CommandOutput, FailureReason> {
    ctx.scene.delete_selected_nodes()?;
    Ok(CommandOutput::new("Removed the selected nodes."))
}
