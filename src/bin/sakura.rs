//! Thin CLI front end over the Sakura execution core: register a small demo
//! handler group, trigger a tree from a JSON file, and print the resulting
//! environment.
//!
//! This binary is cosmetic scaffolding around [`sakura_lang::facade::SakuraLang`];
//! it is not part of the crate's semantic contract.

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use sakura_lang::config::SakuraConfig;
use sakura_lang::facade::SakuraLang;
use sakura_lang::handler::{Blossom, HandlerSchema, RunOutcome};
use sakura_lang::value::Value;
use sakura_lang::value_item::{ValueItem, ValueItemMap};
use std::path::PathBuf;
use std::sync::Mutex;

#[derive(Parser)]
#[command(name = "sakura")]
#[command(author, version, about = "Sakura workflow execution core demo CLI", long_about = None)]
struct Cli {
    /// Worker-pool size; defaults to the host's CPU count.
    #[arg(long)]
    workers: Option<usize>,

    /// Enable verbose tracing output.
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Register `tree_file` under its own id and trigger it, printing the
    /// resulting environment as JSON.
    Run {
        /// Path to a JSON-serialized tree document (see `src/parser.rs`).
        tree_file: PathBuf,

        /// `name=value` pairs seeded into the call-site inputs. Values are
        /// parsed as JSON when possible, else kept as strings.
        #[arg(short = 'i', long = "input")]
        inputs: Vec<String>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    if cli.verbose {
        tracing_subscriber::fmt().with_env_filter("sakura_lang=debug").init();
    }

    let config = SakuraConfig {
        worker_count: cli.workers.unwrap_or_else(|| SakuraConfig::default().worker_count),
        ..SakuraConfig::default()
    };
    let facade = SakuraLang::new(config).context("failed to construct the Sakura facade")?;
    register_demo_handlers(&facade);

    match cli.command {
        Command::Run { tree_file, inputs } => run_tree_file(&facade, &tree_file, &inputs)?,
    }

    facade.shutdown();
    Ok(())
}

fn run_tree_file(facade: &SakuraLang, tree_file: &PathBuf, raw_inputs: &[String]) -> Result<()> {
    let source = std::fs::read_to_string(tree_file)
        .with_context(|| format!("reading tree file {}", tree_file.display()))?;
    let id = tree_file
        .file_stem()
        .map(|s| s.to_string_lossy().to_string())
        .unwrap_or_else(|| "tree".to_string());

    let mut inputs = ValueItemMap::new();
    for raw in raw_inputs {
        let (name, value) = raw
            .split_once('=')
            .with_context(|| format!("expected name=value, got '{raw}'"))?;
        let value = serde_json::from_str::<Value>(value).unwrap_or_else(|_| Value::from(value));
        inputs.insert(name, ValueItem::input(value));
    }

    let result = facade
        .run_tree(&id, &source, inputs)
        .with_context(|| format!("running tree '{id}'"))?;
    print_environment(&result);
    Ok(())
}

#[cfg(feature = "terminal-output")]
fn print_environment(env: &ValueItemMap) {
    let width = terminal_width();
    println!("{}", "=".repeat(width));
    for (name, item) in env.iter() {
        println!("{name} = {item:?}");
    }
    println!("{}", "=".repeat(width));
}

#[cfg(not(feature = "terminal-output"))]
fn print_environment(env: &ValueItemMap) {
    for (name, item) in env.iter() {
        println!("{name} = {item:?}");
    }
}

/// Separator width, capped at 300 columns — cosmetic only, gated behind the
/// `terminal-output` feature.
#[cfg(feature = "terminal-output")]
fn terminal_width() -> usize {
    std::env::var("COLUMNS")
        .ok()
        .and_then(|s| s.parse::<usize>().ok())
        .unwrap_or(80)
        .min(300)
}

/// A minimal `std` handler group sufficient to exercise this crate's worked
/// scenarios: `set`, `append`, `fail`, `sleep_then_set`.
fn register_demo_handlers(facade: &SakuraLang) {
    facade.add_blossom("std", "set", std::sync::Arc::new(SetHandler));
    facade.add_blossom("std", "append", std::sync::Arc::new(AppendHandler::default()));
    facade.add_blossom("std", "fail", std::sync::Arc::new(FailHandler));
    facade.add_blossom("std", "sleep_then_set", std::sync::Arc::new(SleepThenSetHandler));
}

struct SetHandler;
impl Blossom for SetHandler {
    fn schema(&self) -> HandlerSchema {
        HandlerSchema::default()
    }
    fn run(&self, inputs: Value) -> RunOutcome {
        let Some(Value::String(key)) = inputs.get_field("key") else {
            return RunOutcome::failure("std.set requires a string 'key' input");
        };
        let value = inputs.get_field("value").cloned().unwrap_or(Value::Null);
        RunOutcome::success(Value::object(vec![(key.clone(), value)]))
    }
}

#[derive(Default)]
struct AppendHandler {
    items: Mutex<Vec<Value>>,
}
impl Blossom for AppendHandler {
    fn schema(&self) -> HandlerSchema {
        HandlerSchema::default()
    }
    fn run(&self, inputs: Value) -> RunOutcome {
        let value = inputs.get_field("value").cloned().unwrap_or(Value::Null);
        let mut items = self.items.lock().expect("append handler lock poisoned");
        items.push(value);
        RunOutcome::success(Value::object(vec![("count".to_string(), Value::Integer(items.len() as i64))]))
    }
}

struct FailHandler;
impl Blossom for FailHandler {
    fn schema(&self) -> HandlerSchema {
        HandlerSchema::default()
    }
    fn run(&self, inputs: Value) -> RunOutcome {
        let message = match inputs.get_field("msg") {
            Some(Value::String(m)) => m.clone(),
            _ => "std.fail invoked".to_string(),
        };
        RunOutcome::failure(message)
    }
}

struct SleepThenSetHandler;
impl Blossom for SleepThenSetHandler {
    fn schema(&self) -> HandlerSchema {
        HandlerSchema::default()
    }
    fn run(&self, inputs: Value) -> RunOutcome {
        let ms = inputs.get_field("ms").and_then(Value::as_integer).unwrap_or(0);
        std::thread::sleep(std::time::Duration::from_millis(ms.max(0) as u64));
        let Some(Value::String(key)) = inputs.get_field("k") else {
            return RunOutcome::failure("std.sleep_then_set requires a string 'k' input");
        };
        let value = inputs.get_field("v").cloned().unwrap_or(Value::Null);
        RunOutcome::success(Value::object(vec![(key.clone(), value)]))
    }
}
