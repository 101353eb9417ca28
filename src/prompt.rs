//! Instruction text sent to the language model.
//!
//! Both builders are pure and deterministic: the same input always yields
//! the same prompt, byte for byte.

use std::fmt::Write as _;

use crate::registry::CommandSpec;

/// Prompt for the intent step: the user's words, the closed list of command
/// identifiers, a parameter hint table, and the single-JSON output contract.
pub fn build_intent_prompt<'a>(
    user_text: &str,
    commands: impl IntoIterator<Item = &'a CommandSpec>,
) -> String {
    let commands: Vec<&CommandSpec> = commands.into_iter().collect();
    let mut out = String::new();

    out.push_str(
        "You translate requests for a 3D modeling application into exactly one command.\n\n",
    );

    out.push_str("Valid commands:\n");
    for spec in &commands {
        let _ = writeln!(out, "- {}: {}", spec.name, spec.description);
    }

    out.push_str("\nParameters (commands not listed take none):\n");
    for spec in commands.iter().filter(|s| !s.params.is_empty()) {
        let _ = writeln!(out, "- {}:", spec.name);
        for p in spec.params {
            let requirement = match (p.required, p.default) {
                (true, _) => "required".to_string(),
                (false, Some(d)) => format!("default {d}"),
                (false, None) => "optional".to_string(),
            };
            let _ = writeln!(
                out,
                "    {}: {} ({requirement}), e.g. {}",
                p.name,
                p.ty.shape(),
                p.example
            );
        }
    }

    out.push_str(
        "\nRespond with a single JSON object and nothing else, in this exact shape:\n\
         {\"command\": \"<identifier>\", \"parameters\": {<name>: <value>, ...}}\n\
         The command must be one of the identifiers above. Omit parameters you do not need.\n\
         Do not explain, do not add prose, do not wrap the JSON in markdown.\n\n",
    );
    let _ = writeln!(out, "User request: {user_text}");
    out
}

/// Prompt for the script-generation path. Asks for raw script text only.
pub fn build_script_prompt(description: &str) -> String {
    format!(
        "Convert this into a Blender Python script: {description}\n\n\
         Rules:\n\
         - Output only the Python code. No explanations, no comments about the code, no markdown.\n\
         - The `bpy` module is already available.\n\
         - Operate on the current scene and the active object unless the request says otherwise.\n"
    )
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::registry::registry;

    #[test]
    fn intent_prompt_is_deterministic() {
        let a = build_intent_prompt("add a cube", registry().values());
        let b = build_intent_prompt("add a cube", registry().values());
        assert_eq!(a, b);
    }

    #[test]
    fn intent_prompt_embeds_text_and_identifiers() {
        let prompt = build_intent_prompt("make the cube red", registry().values());
        assert!(prompt.contains("User request: make the cube red"));
        for name in registry().keys() {
            assert!(prompt.contains(&format!("- {name}: ")), "{name}");
        }
        assert!(prompt.contains("{\"command\": \"<identifier>\", \"parameters\""));
    }

    #[test]
    fn hint_table_lists_shapes_and_defaults() {
        let prompt = build_intent_prompt("spin it", registry().values());
        assert!(prompt.contains("    axis: one of X|Y|Z (default Z), e.g. \"X\""));
        assert!(prompt.contains("    color_value: color name"));
        assert!(prompt.contains("(required)"));
        assert!(!prompt.contains("- add_cube:\n"));
    }

    #[test]
    fn restricted_command_set_is_honored() {
        let only = [*crate::registry::lookup("view_top").unwrap()];
        let prompt = build_intent_prompt("look down", only.iter());
        assert!(prompt.contains("- view_top: "));
        assert!(!prompt.contains("add_cube"));
    }

    #[test]
    fn script_prompt_demands_raw_code() {
        let prompt = build_script_prompt("a spiral staircase");
        assert!(prompt.starts_with("Convert this into a Blender Python script: a spiral staircase"));
        assert!(prompt.contains("Output only the Python code"));
        assert!(prompt.contains("`bpy`"));
    }
}
