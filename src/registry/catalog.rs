use serde::Serialize;
use serde_json::{json, Map, Value};

use super::params::{ParamSpec, ParamType};
use super::{registry, CommandCategory, CommandSpec};

/// A registry entry as shown to users: metadata plus a flattened parameter list.
#[derive(Debug, Clone, Serialize)]
pub struct CommandRegistryEntry {
    pub name: &'static str,
    pub description: &'static str,
    pub category: CommandCategory,
    pub params: Vec<ParamEntry>,
}

#[derive(Debug, Clone, Serialize)]
pub struct ParamEntry {
    pub name: &'static str,
    pub shape: String,
    pub required: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub default: Option<String>,
    pub example: &'static str,
}

impl From<&ParamSpec> for ParamEntry {
    fn from(p: &ParamSpec) -> Self {
        Self {
            name: p.name,
            shape: p.ty.shape(),
            required: p.required,
            default: p.default.map(|d| d.to_string()),
            example: p.example,
        }
    }
}

fn entry(spec: &CommandSpec) -> CommandRegistryEntry {
    CommandRegistryEntry {
        name: spec.name,
        description: spec.description,
        category: spec.category,
        params: spec.params.iter().map(ParamEntry::from).collect(),
    }
}

/// The complete command registry, in declaration order.
pub fn command_registry() -> Vec<CommandRegistryEntry> {
    registry().values().map(entry).collect()
}

/// Help text for command discovery.
/// Three tiers: no topic → categories, category → command list, command → parameters.
pub fn help_text(topic: Option<&str>) -> String {
    let entries = command_registry();

    let Some(topic) = topic else {
        let mut lines = vec!["Available command categories:".to_string()];
        for cat in CommandCategory::all() {
            let count = entries.iter().filter(|e| e.category == *cat).count();
            if count > 0 {
                lines.push(format!("  {} ({count}): {}", cat.slug(), cat.description()));
            }
        }
        lines.push(String::new());
        lines.push("Use `commands <category>` to list commands in a category.".to_string());
        lines.push("Use `commands <command>` for parameter details.".to_string());
        return lines.join("\n");
    };

    // Command name first (tier 3)
    if let Some(spec) = super::lookup(topic) {
        let mut lines = vec![
            format!("{}: {}", spec.name, spec.description),
            format!("Category: {}", spec.category.slug()),
        ];
        if spec.params.is_empty() {
            lines.push("No parameters.".to_string());
        } else {
            lines.push(String::new());
            lines.push("Parameters:".to_string());
            for p in spec.params.iter().map(ParamEntry::from) {
                let requirement = match (&p.default, p.required) {
                    (_, true) => "required".to_string(),
                    (Some(d), false) => format!("default {d}"),
                    (None, false) => "optional".to_string(),
                };
                lines.push(format!(
                    "  {} ({requirement}): {}, e.g. {}",
                    p.name, p.shape, p.example
                ));
            }
        }
        return lines.join("\n");
    }

    // Category (tier 2)
    let slug = topic.trim().to_lowercase();
    let matching: Vec<&CommandRegistryEntry> = entries
        .iter()
        .filter(|e| e.category.slug() == slug)
        .collect();
    if matching.is_empty() {
        return format!("Unknown topic: \"{topic}\". Use `commands` to see categories.");
    }
    let mut lines = vec![format!("{slug} commands:")];
    for e in matching {
        lines.push(format!("  - {}: {}", e.name, e.description));
    }
    lines.join("\n")
}

/// JSON Schema of one parameter type.
fn param_schema(ty: ParamType) -> Value {
    match ty {
        ParamType::Float => json!({ "type": ["number", "string"] }),
        ParamType::Text => json!({ "type": "string" }),
        ParamType::Color => json!({
            "oneOf": [
                { "type": "string" },
                { "type": "array", "items": { "type": "number" }, "minItems": 3, "maxItems": 4 }
            ]
        }),
        ParamType::Choice(choices) => {
            let names: Vec<&str> = choices.iter().map(|c| c.canonical).collect();
            json!({ "type": "string", "enum": names })
        }
    }
}

/// Every command with a JSON Schema for its parameters.
pub fn to_json_schema() -> Value {
    Value::Array(
        registry()
            .values()
            .map(|spec| {
                let mut properties = Map::new();
                for p in spec.params {
                    properties.insert(p.name.to_string(), param_schema(p.ty));
                }
                let required: Vec<&str> =
                    spec.params.iter().filter(|p| p.required).map(|p| p.name).collect();
                json!({
                    "name": spec.name,
                    "description": spec.description,
                    "category": spec.category.slug(),
                    "inputSchema": {
                        "type": "object",
                        "properties": properties,
                        "required": required,
                    },
                })
            })
            .collect(),
    )
}
