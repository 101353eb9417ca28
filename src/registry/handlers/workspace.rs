#![allow(clippy::needless_pass_by_value)]

use crate::error::FailureReason;
use crate::model::normalize_token;
use crate::registry::params::{SetModeParams, SwitchEditorParams};
use crate::registry::CommandOutput;
use crate::scene::View;
use crate::state::AppContext;
use crate::util::serde_variant_name;

fn spoken<T: serde::Serialize>(value: &T) -> String {
    normalize_token(&serde_variant_name(value).unwrap_or_default())
}

pub fn set_mode(ctx: &AppContext, p: SetModeParams) -> Result<CommandOutput, FailureReason> {
    ctx.scene.set_mode(p.mode)?;
    Ok(CommandOutput::new(format!("Switched to {} mode", spoken(&p.mode))))
}

pub fn switch_editor(
    ctx: &AppContext,
    p: SwitchEditorParams,
) -> Result<CommandOutput, FailureReason> {
    ctx.scene.switch_editor(p.editor)?;
    Ok(CommandOutput::new(format!("Opened {}", spoken(&p.editor))))
}

fn view(ctx: &AppContext, view: View) -> Result<CommandOutput, FailureReason> {
    ctx.scene.set_view(view)?;
    Ok(CommandOutput::new(format!("Switched to {} view", spoken(&view))))
}

pub fn view_front(ctx: &AppContext) -> Result<CommandOutput, FailureReason> {
    view(ctx, View::Front)
}

pub fn view_top(ctx: &AppContext) -> Result<CommandOutput, FailureReason> {
    view(ctx, View::Top)
}

pub fn view_right(ctx: &AppContext) -> Result<CommandOutput, FailureReason> {
    view(ctx, View::Right)
}

pub fn view_camera(ctx: &AppContext) -> Result<CommandOutput, FailureReason> {
    view(ctx, View::Camera)
}
