#![allow(clippy::needless_pass_by_value)]

use crate::error::FailureReason;
use crate::registry::params::{MoveObjectParams, RotateObjectParams, ScaleObjectParams};
use crate::registry::CommandOutput;
use crate::scene::ObjectRef;
use crate::state::AppContext;

pub fn scale_object(ctx: &AppContext, p: ScaleObjectParams) -> Result<CommandOutput, FailureReason> {
    let object = ctx.scene.get_object(&ObjectRef::Active)?;
    ctx.scene.scale(&object, [p.scale_x, p.scale_y, p.scale_z])?;
    Ok(CommandOutput::new(format!(
        "Scaled {} by ({}, {}, {})",
        object.name, p.scale_x, p.scale_y, p.scale_z
    )))
}

pub fn rotate_object(
    ctx: &AppContext,
    p: RotateObjectParams,
) -> Result<CommandOutput, FailureReason> {
    let object = ctx.scene.get_object(&ObjectRef::Active)?;
    ctx.scene.rotate(&object, p.angle_degrees, p.axis)?;
    Ok(CommandOutput::new(format!(
        "Rotated {} by {} degrees around the {} axis",
        object.name, p.angle_degrees, p.axis
    )))
}

pub fn move_object(ctx: &AppContext, p: MoveObjectParams) -> Result<CommandOutput, FailureReason> {
    let object = ctx.scene.get_object(&ObjectRef::Active)?;
    ctx.scene
        .translate(&object, [p.delta_x, p.delta_y, p.delta_z])?;
    Ok(CommandOutput::new(format!(
        "Moved {} by ({}, {}, {})",
        object.name, p.delta_x, p.delta_y, p.delta_z
    )))
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::llm::ScriptedModel;
    use crate::scene::{Axis, MemoryScene};

    fn context(scene: &Arc<MemoryScene>) -> AppContext {
        AppContext::new(scene.clone(), Arc::new(ScriptedModel::replying(&[])))
    }

    #[test]
    fn scale_multiplies() {
        let scene = Arc::new(MemoryScene::with_default_cube());
        let ctx = context(&scene);
        let p = ScaleObjectParams {
            scale_x: 2.0,
            scale_y: 1.0,
            scale_z: 0.5,
        };
        scale_object(&ctx, p.clone()).unwrap();
        let out = scale_object(&ctx, p).unwrap();
        assert_eq!(out.message, "Scaled Cube by (2, 1, 0.5)");
        assert_eq!(scene.snapshot().objects["Cube"].scale, [4.0, 1.0, 0.25]);
    }

    #[test]
    fn rotation_names_angle_and_axis() {
        let scene = Arc::new(MemoryScene::with_default_cube());
        let ctx = context(&scene);
        let out = rotate_object(
            &ctx,
            RotateObjectParams {
                angle_degrees: 45.0,
                axis: Axis::Y,
            },
        )
        .unwrap();
        assert_eq!(out.message, "Rotated Cube by 45 degrees around the Y axis");
        assert_eq!(scene.snapshot().objects["Cube"].rotation_degrees, [0.0, 45.0, 0.0]);
    }

    #[test]
    fn transforms_need_an_active_object() {
        let scene = Arc::new(MemoryScene::new());
        let ctx = context(&scene);
        let err = move_object(
            &ctx,
            MoveObjectParams {
                delta_x: 1.0,
                delta_y: 0.0,
                delta_z: 0.0,
            },
        )
        .unwrap_err();
        assert!(err.to_string().contains("Active object not found"));
        assert_eq!(scene.count_ops("translate"), 0);
    }
}
