//! Generated-script path.
//!
//! The model writes a complete host script which runs with full host
//! privileges: no sandbox, no dry run, no allow-list of operations. The only
//! check before execution is that the script is not blank. The path is off
//! unless `allow_script_execution` is set.

#![allow(clippy::needless_pass_by_value)]

use crate::error::{DispatchFailure, FailureReason};
use crate::interpret::interpret_script;
use crate::prompt::build_script_prompt;
use crate::registry::params::ExecuteGeneratedScriptParams;
use crate::registry::CommandOutput;
use crate::state::AppContext;

pub fn execute_generated_script(
    ctx: &AppContext,
    p: ExecuteGeneratedScriptParams,
) -> Result<CommandOutput, FailureReason> {
    if !ctx.policy.allow_script_execution {
        return Err(DispatchFailure::ScriptExecutionDisabled.into());
    }

    let prompt = build_script_prompt(&p.script_description);
    let raw = ctx.model.complete(&prompt, &ctx.options.script)?;
    let script = interpret_script(&raw)?;

    tracing::warn!(
        description = %p.script_description,
        bytes = script.len(),
        "Executing generated script with full host privileges"
    );
    ctx.record_script(&script);
    ctx.scene
        .execute_script(&script)
        .map_err(|e| DispatchFailure::ScriptExecutionError {
            detail: e.to_string(),
        })?;

    Ok(CommandOutput::new(format!(
        "Executed generated script for: {}",
        p.script_description
    )))
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::indexing_slicing, clippy::panic)]
mod tests {
    use std::sync::Arc;

    use super::*;
    use crate::error::ParseFailure;
    use crate::llm::ScriptedModel;
    use crate::scene::MemoryScene;
    use crate::state::ScriptPolicy;

    fn params() -> ExecuteGeneratedScriptParams {
        ExecuteGeneratedScriptParams {
            script_description: "a row of five cubes".into(),
        }
    }

    fn context(scene: &Arc<MemoryScene>, model: &Arc<ScriptedModel>) -> AppContext {
        AppContext::new(scene.clone(), model.clone()).with_policy(ScriptPolicy {
            allow_script_execution: true,
        })
    }

    #[test]
    fn disabled_policy_never_calls_the_model() {
        let scene = Arc::new(MemoryScene::new());
        let model = Arc::new(ScriptedModel::replying(&["print(1)"]));
        let ctx = AppContext::new(scene.clone(), model.clone());

        let err = execute_generated_script(&ctx, params()).unwrap_err();
        assert_eq!(
            err,
            FailureReason::Dispatch(DispatchFailure::ScriptExecutionDisabled)
        );
        assert_eq!(model.calls(), 0);
        assert_eq!(scene.count_ops("execute_script"), 0);
    }

    #[test]
    fn fenced_script_runs_and_is_recorded() {
        let scene = Arc::new(MemoryScene::new());
        let model = Arc::new(ScriptedModel::replying(&[
            "Here you go:\n```python\nfor i in range(5):\n    bpy.ops.mesh.primitive_cube_add(location=(i*2, 0, 0))\n```",
        ]));
        let ctx = context(&scene, &model);

        let out = execute_generated_script(&ctx, params()).unwrap();
        assert!(out.message.contains("a row of five cubes"));

        let expected = "for i in range(5):\n    bpy.ops.mesh.primitive_cube_add(location=(i*2, 0, 0))";
        assert_eq!(scene.snapshot().scripts, vec![expected.to_string()]);
        assert_eq!(ctx.take_executed_script().as_deref(), Some(expected));
        assert!(model.prompts()[0].0.contains("a row of five cubes"));
    }

    #[test]
    fn host_failure_is_a_script_execution_error() {
        let scene = Arc::new(MemoryScene::new().with_script_failure("NameError: name 'foo' is not defined"));
        let model = Arc::new(ScriptedModel::replying(&["foo()"]));
        let ctx = context(&scene, &model);

        match execute_generated_script(&ctx, params()).unwrap_err() {
            FailureReason::Dispatch(DispatchFailure::ScriptExecutionError { detail }) => {
                assert!(detail.contains("NameError"));
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn blank_script_is_not_executed() {
        let scene = Arc::new(MemoryScene::new());
        let model = Arc::new(ScriptedModel::replying(&["```python\n```"]));
        let ctx = context(&scene, &model);

        let err = execute_generated_script(&ctx, params()).unwrap_err();
        assert_eq!(err, FailureReason::Parse(ParseFailure::EmptyScript));
        assert_eq!(scene.count_ops("execute_script"), 0);
        assert!(ctx.take_executed_script().is_none());
    }
}
