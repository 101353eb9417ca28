// CLI binary: exiting on unrecoverable setup errors is standard for CLI tools.
#![allow(clippy::unwrap_used, clippy::expect_used, clippy::indexing_slicing)]

use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use std::process;
use std::sync::Arc;

use clap::{Parser, Subcommand, ValueEnum};
use tracing_subscriber::EnvFilter;

use scene_voice::audit::AuditLog;
use scene_voice::demo::DemoScript;
use scene_voice::error::DispatchResult;
use scene_voice::interpret::interpret_intent;
use scene_voice::llm::HttpModelClient;
use scene_voice::pipeline::Pipeline;
use scene_voice::prompt::{build_intent_prompt, build_script_prompt};
use scene_voice::registry::{catalog, registry};
use scene_voice::scene::{BridgeNotifier, BridgeScene, MemoryScene, Scene};
use scene_voice::settings::{self, AppSettings};
use scene_voice::speech::WhisperHttpTranscriber;
use scene_voice::state::AppContext;
use scene_voice::paths;

// ── CLI argument parsing ─────────────────────────────────────────

#[derive(Parser)]
#[command(name = "scene-voice", about = "Drive a 3D modeling host by voice or text", version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Config directory override
    #[arg(long, global = true)]
    config_dir: Option<PathBuf>,

    /// Output raw JSON instead of formatted text
    #[arg(long, global = true)]
    json: bool,

    /// Run model-generated scripts in the host for this session (unsandboxed)
    #[arg(long, global = true)]
    allow_scripts: bool,

    /// Scene binding: headless in-process scene or the host bridge
    #[arg(long, global = true, value_enum, default_value_t = HostKind::Memory)]
    host: HostKind,
}

#[derive(Clone, Copy, PartialEq, Eq, ValueEnum)]
enum HostKind {
    Memory,
    Bridge,
}

#[derive(Subcommand)]
enum Commands {
    /// Interactive loop. `next` plays the next demo utterance, `quit` exits
    Run {
        /// Capture each utterance from the microphone (press Enter to record)
        #[arg(long)]
        speech: bool,
    },
    /// Handle a single text utterance
    Once { text: String },
    /// Dispatch an intent JSON directly, skipping the model
    Dispatch { intent: String },
    /// List commands: no topic for categories, or a category or command name
    Commands { topic: Option<String> },
    /// Print the intent prompt for a text
    Prompt { text: String },
    /// Print the script-generation prompt for a description
    ScriptPrompt { description: String },
    /// Settings management
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Print the effective settings
    Show,
    /// Print the JSON Schema of settings.json
    Schema,
    /// Write default settings
    Init {
        /// Overwrite an existing settings file
        #[arg(long)]
        force: bool,
    },
}

// ── Setup ────────────────────────────────────────────────────────

fn init_tracing() {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("scene_voice=info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .init();
}

fn fatal(message: &str) -> ! {
    eprintln!("Error: {message}");
    process::exit(1);
}

struct Session {
    pipeline: Pipeline,
    /// Present when running against the headless scene, for `--json` output.
    memory: Option<Arc<MemoryScene>>,
}

fn build_session(cli: &Cli, config_dir: &Path, speech: bool) -> Session {
    let mut settings = settings::load_or_default(config_dir);
    if cli.allow_scripts {
        settings.allow_script_execution = true;
    }

    let (scene, memory): (Arc<dyn Scene>, Option<Arc<MemoryScene>>) = match cli.host {
        HostKind::Memory => {
            let scene = Arc::new(MemoryScene::with_default_cube());
            (scene.clone(), Some(scene))
        }
        HostKind::Bridge => {
            let scene = BridgeScene::new(&settings.host)
                .unwrap_or_else(|e| fatal(&format!("Cannot reach host bridge: {e}")));
            (Arc::new(scene), None)
        }
    };
    let model = HttpModelClient::new(&settings.model)
        .unwrap_or_else(|e| fatal(&e.to_string()));

    let mut ctx = AppContext::new(scene, Arc::new(model)).with_settings(&settings);
    if cli.host == HostKind::Bridge {
        match BridgeNotifier::new(&settings.host) {
            Ok(notifier) => ctx = ctx.with_notifier(Box::new(notifier)),
            Err(e) => tracing::warn!(error = %e, "Host notifications unavailable, logging instead"),
        }
    }
    if settings.allow_script_execution {
        tracing::warn!("Generated scripts will run in the host with full privileges");
    }

    let mut pipeline = Pipeline::new(ctx);
    if settings.audit {
        pipeline = pipeline.with_audit(AuditLog::new(config_dir));
    }
    if speech {
        let transcriber =
            WhisperHttpTranscriber::new(settings.speech.clone(), settings.model.api_key.clone())
                .unwrap_or_else(|e| fatal(&e.to_string()));
        pipeline = pipeline.with_transcriber(Box::new(transcriber));
    }
    Session { pipeline, memory }
}

// ── Output formatting ────────────────────────────────────────────

fn print_result(result: &DispatchResult, session: &Session, raw_json: bool) {
    if raw_json {
        let mut json = serde_json::json!({ "result": result });
        if let Some(scene) = &session.memory {
            json["scene"] = serde_json::to_value(scene.snapshot()).unwrap_or_default();
        }
        println!("{}", serde_json::to_string_pretty(&json).unwrap_or_default());
    } else {
        println!("{}", result.text());
    }
}

fn print_json(value: &serde_json::Value) {
    println!("{}", serde_json::to_string_pretty(value).unwrap_or_default());
}

// ── Interactive loop ─────────────────────────────────────────────

fn run_loop(session: &Session, speech: bool, raw_json: bool) {
    let mut demo = DemoScript::new();
    if speech {
        eprintln!("Press Enter to speak a command. Type `next` for a demo utterance, `quit` to exit.");
    } else {
        eprintln!("Type a command. `next` plays a demo utterance, `quit` exits.");
    }

    let stdin = io::stdin();
    let mut lines = stdin.lock().lines();
    loop {
        print!("> ");
        let _ = io::stdout().flush();
        let Some(line) = next_input(&mut lines) else {
            break;
        };
        let line = line.trim();
        let result = match line.to_lowercase().as_str() {
            "quit" | "exit" => break,
            "next" => {
                let utterance = demo.next_utterance();
                println!("{utterance}");
                session.pipeline.handle_text(utterance)
            }
            "" if speech => session.pipeline.handle_speech(),
            "" => continue,
            _ => session.pipeline.handle_text(line),
        };
        print_result(&result, session, raw_json);
    }
}

/// Next readable line. Unreadable lines are reported and skipped; `None`
/// only at end of input.
fn next_input(lines: &mut impl Iterator<Item = io::Result<String>>) -> Option<String> {
    for line in lines {
        match line {
            Ok(line) => return Some(line),
            Err(e) => eprintln!("Could not read input: {e}"),
        }
    }
    None
}

fn run_config(action: &ConfigAction, config_dir: &Path, raw_json: bool) {
    match action {
        ConfigAction::Show => {
            let settings = settings::load_or_default(config_dir);
            if !raw_json {
                eprintln!("# {}", paths::settings_path(config_dir).display());
            }
            print_json(&serde_json::to_value(&settings).unwrap_or_default());
        }
        ConfigAction::Schema => print_json(&settings::settings_schema()),
        ConfigAction::Init { force } => {
            let path = paths::settings_path(config_dir);
            if path.exists() && !force {
                fatal(&format!("{} already exists (use --force)", path.display()));
            }
            settings::save_settings(config_dir, &AppSettings::default())
                .unwrap_or_else(|e| fatal(&e.to_string()));
            println!("Wrote {}", path.display());
        }
    }
}

fn exit_with(result: &DispatchResult) {
    if !result.is_success() {
        process::exit(1);
    }
}

// ── Main ─────────────────────────────────────────────────────────

fn main() {
    init_tracing();
    let cli = Cli::parse();
    let config_dir = cli.config_dir.clone().unwrap_or_else(paths::default_config_dir);
    let raw = cli.json;

    match &cli.command {
        Commands::Commands { topic } => {
            if raw {
                print_json(&catalog::to_json_schema());
            } else {
                println!("{}", catalog::help_text(topic.as_deref()));
            }
        }
        Commands::Prompt { text } => print!("{}", build_intent_prompt(text, registry().values())),
        Commands::ScriptPrompt { description } => print!("{}", build_script_prompt(description)),
        Commands::Config { action } => run_config(action, &config_dir, raw),
        Commands::Once { text } => {
            let session = build_session(&cli, &config_dir, false);
            let result = session.pipeline.handle_text(text);
            print_result(&result, &session, raw);
            exit_with(&result);
        }
        Commands::Dispatch { intent } => {
            let parsed = interpret_intent(intent)
                .unwrap_or_else(|e| fatal(&format!("Invalid intent: {e}")));
            let session = build_session(&cli, &config_dir, false);
            let result = session.pipeline.handle_intent(&parsed);
            print_result(&result, &session, raw);
            exit_with(&result);
        }
        Commands::Run { speech } => {
            let session = build_session(&cli, &config_dir, *speech);
            run_loop(&session, *speech, raw);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn global_flags_parse_after_subcommand() {
        let cli = Cli::try_parse_from([
            "scene-voice",
            "once",
            "add a cube",
            "--host",
            "bridge",
            "--allow-scripts",
        ])
        .unwrap();
        assert!(cli.allow_scripts);
        assert!(cli.host == HostKind::Bridge);
        assert!(matches!(cli.command, Commands::Once { .. }));
    }

    #[test]
    fn unreadable_line_does_not_end_input() {
        let mut lines = vec![
            Err(io::Error::new(io::ErrorKind::InvalidData, "stream did not contain valid UTF-8")),
            Ok("add a cube".to_string()),
        ]
        .into_iter();
        assert_eq!(next_input(&mut lines).as_deref(), Some("add a cube"));
        assert_eq!(next_input(&mut lines), None);
    }
}
