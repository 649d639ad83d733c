use std::fs;

use anyhow::Context;
use colored::Colorize;
use serde_json::{json, Value};
use stl_client::{
    ArtifactInstaller, ClientConfig, ClientResult, DecoderKind, Dialect, Storage,
};

use crate::cli::*;

pub fn run_command(cli: Cli) -> anyhow::Result<()> {
    let config = effective_config(&cli)?;
    let format = cli.format;
    match cli.command {
        Command::List => {
            let value = with_storage(&config, |s| s.list())?;
            print_value(&value, &format)
        }
        Command::Timelines(args) => {
            let value = with_storage(&config, |s| s.schema(&args.schema).list())?;
            print_value(&value, &format)
        }
        Command::Numbers(args) => {
            let value = with_storage(&config, |s| {
                s.schema(&args.schema).time_line(&args.timeline).all_numbers()
            })?;
            print_value(&value, &format)
        }
        Command::Strings(args) => {
            let value = with_storage(&config, |s| {
                s.schema(&args.schema).time_line(&args.timeline).all_strings()
            })?;
            print_value(&value, &format)
        }
        Command::Documents(args) => {
            let value = with_storage(&config, |s| {
                s.schema(&args.schema).time_line(&args.timeline).all_documents()
            })?;
            print_value(&value, &format)
        }
        Command::AddNumber(args) => {
            let value = with_storage(&config, |s| {
                s.schema(&args.schema)
                    .time_line(&args.timeline)
                    .add_number(args.value, args.time)
            })?;
            print_added(&args.schema, &args.timeline, &value, &format)
        }
        Command::AddString(args) => {
            let value = with_storage(&config, |s| {
                s.schema(&args.schema)
                    .time_line(&args.timeline)
                    .add_string(&args.value, args.time)
            })?;
            print_added(&args.schema, &args.timeline, &value, &format)
        }
        Command::Install(args) => cmd_install(&config, args),
        Command::Decode(args) => cmd_decode(&config, args, &format),
        Command::Dialect(args) => cmd_dialect(args, &format),
    }
}

/// Configuration file values with command-line overrides applied.
fn effective_config(cli: &Cli) -> anyhow::Result<ClientConfig> {
    let mut config = match &cli.config {
        Some(path) => ClientConfig::load(path)?,
        None => ClientConfig::default(),
    };
    if let Some(uri) = &cli.uri {
        config.uri = Some(uri.clone());
    }
    if cli.binary {
        config.binary = true;
    }
    if cli.native {
        config.decoder.kind = DecoderKind::Native;
    }
    Ok(config)
}

/// Open the storage, run one call, and release the decoder whatever the outcome.
fn with_storage<F>(config: &ClientConfig, call: F) -> anyhow::Result<Value>
where
    F: FnOnce(&Storage) -> ClientResult<Value>,
{
    let mut storage = Storage::from_config(config)?;
    tracing::debug!(uri = storage.uri(), dialect = storage.dialect().name(), "storage opened");
    let result = call(&storage);
    storage.close();
    Ok(result?)
}

fn cmd_install(config: &ClientConfig, args: InstallArgs) -> anyhow::Result<()> {
    let dir = args.dir.unwrap_or_else(|| config.decoder.install_dir());
    let artifacts = ArtifactInstaller::new(&config.transport, &dir)?.install()?;
    println!("{} Installed decoder artifacts in {}", "✓".green().bold(), dir.display().to_string().bold());
    println!("  Module: {}", artifacts.module.display().to_string().cyan());
    println!("  Environment: {}", artifacts.env_script.display().to_string().cyan());
    Ok(())
}

fn cmd_decode(config: &ClientConfig, args: DecodeArgs, format: &OutputFormat) -> anyhow::Result<()> {
    let payload = fs::read(&args.file)
        .with_context(|| format!("cannot read {}", args.file.display()))?;
    let mut decoder = config.decoder.build()?;
    let result = decoder.decode(&payload);
    decoder.release();
    print_value(&result?, format)
}

fn cmd_dialect(args: DialectArgs, format: &OutputFormat) -> anyhow::Result<()> {
    let dialect = Dialect::classify(&args.uri);
    match format {
        OutputFormat::Json => {
            println!("{}", json!({ "uri": args.uri, "dialect": dialect }));
        }
        OutputFormat::Text => {
            let shape = match dialect {
                Dialect::V1 => "path-based endpoints",
                Dialect::V2 => "single endpoint with format/action selectors",
            };
            println!("{} {} ({})", args.uri.bold(), dialect.name().yellow().bold(), shape);
        }
    }
    Ok(())
}

fn print_added(schema: &str, timeline: &str, answer: &Value, format: &OutputFormat) -> anyhow::Result<()> {
    match format {
        OutputFormat::Json => print_value(answer, format),
        OutputFormat::Text => {
            println!("{} Added to {}/{}", "✓".green().bold(), schema.bold(), timeline.yellow());
            if !answer.is_null() {
                println!("  Server: {}", answer);
            }
            Ok(())
        }
    }
}

fn print_value(value: &Value, format: &OutputFormat) -> anyhow::Result<()> {
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(value)?),
        OutputFormat::Text => {
            for (time, text) in text_rows(value) {
                match time {
                    Some(time) => println!("{}  {}", time.dimmed(), text),
                    None => println!("{text}"),
                }
            }
        }
    }
    Ok(())
}

/// One row per element: an optional timestamp column and the value.
fn text_rows(value: &Value) -> Vec<(Option<String>, String)> {
    match value {
        Value::Array(items) => items.iter().map(text_row).collect(),
        other => vec![text_row(other)],
    }
}

fn text_row(item: &Value) -> (Option<String>, String) {
    if let Value::Object(fields) = item {
        if let Some(value) = fields.get("value") {
            let time = fields
                .get("timestamp")
                .or_else(|| fields.get("time"))
                .map(|t| t.to_string());
            return (time, scalar_text(value));
        }
    }
    (None, scalar_text(item))
}

fn scalar_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}
