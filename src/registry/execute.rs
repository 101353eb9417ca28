use std::any::Any;
use std::panic::{self, AssertUnwindSafe};

use crate::error::{DispatchFailure, FailureReason};
use crate::state::AppContext;

use super::{Command, CommandOutput};

/// Execute a Command against the application context.
/// This is the single dispatch point for every surface (loop, CLI, tests).
/// A panicking handler or host binding is reported as an operation error.
pub fn execute(ctx: &AppContext, cmd: Command) -> Result<CommandOutput, FailureReason> {
    let name = cmd.info().name;
    panic::catch_unwind(AssertUnwindSafe(|| cmd.dispatch(ctx))).unwrap_or_else(|payload| {
        let detail = panic_message(payload.as_ref());
        tracing::error!(command = name, %detail, "Command panicked");
        Err(DispatchFailure::OperationError { detail }.into())
    })
}

fn panic_message(payload: &(dyn Any + Send)) -> String {
    if let Some(s) = payload.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = payload.downcast_ref::<String>() {
        s.clone()
    } else {
        "operation panicked".to_string()
    }
}
