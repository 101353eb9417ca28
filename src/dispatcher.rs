//! Typed dispatch of an interpreted intent.
//!
//! lookup → coerce → build the typed command → execute. Every step converts
//! its failure into a [`DispatchResult`]; nothing escapes as a panic or error.

use crate::error::{DispatchFailure, DispatchResult, FailureReason};
use crate::interpret::ParsedIntent;
use crate::registry::execute::execute;
use crate::registry::{lookup, typing, Command, CommandOutput};
use crate::state::AppContext;

/// Dispatch one intent and surface the result through the notifier.
/// The returned result and the notification carry the same text.
pub fn dispatch(ctx: &AppContext, intent: &ParsedIntent) -> DispatchResult {
    let result = match run(ctx, intent) {
        Ok(output) => {
            tracing::info!(command = %intent.command, "{}", output.message);
            DispatchResult::success(output.message)
        }
        Err(reason) => {
            tracing::warn!(command = %intent.command, error = %reason, "Dispatch failed");
            DispatchResult::failure(reason)
        }
    };
    ctx.notify(&result.text());
    result
}

/// Resolve the intent into a typed [`Command`] without executing it.
pub fn resolve(intent: &ParsedIntent) -> Result<Command, DispatchFailure> {
    let spec = lookup(&intent.command).ok_or_else(|| DispatchFailure::UnknownCommand {
        command: intent.command.clone(),
    })?;
    let typed = typing::coerce(spec.params, &intent.parameters)?;
    tracing::debug!(command = spec.name, params = typed.len(), "Parameters coerced");
    Command::from_typed(spec.name, &typed)
}

fn run(ctx: &AppContext, intent: &ParsedIntent) -> Result<CommandOutput, FailureReason> {
    let cmd = resolve(intent)?;
    execute(ctx, cmd)
}
