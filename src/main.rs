//! layerconf
//!
//! Loads layered key/value configuration from the sources given on the
//! command line and prints it, a single typed value, or live changes.

use anyhow::{Result, bail};
use clap::Parser;
use layerconf::cli::{Cli, Command, GetArgs, ValueType, WatchArgs};
use layerconf::config::watcher::{WatcherConfig, start_watcher};
use layerconf::format::{
    OutputFormat, TypedValue, format_error, format_reload_event, format_settings, format_value,
};
use layerconf::{Config, FromSetting, Lookup, Settings, logging};
use std::io::Write;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, info};

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    logging::init(&cli.log, cli.verbose)?;

    debug!("Sources: {:?}", cli.sources);
    let loaders = cli.sources.into_iter().map(|s| s.into_loader());
    let config = match Config::load(loaders) {
        Ok(config) => config,
        Err(e) => {
            match cli.format {
                OutputFormat::Text => eprint!("{}", format_error(&e, cli.format)),
                OutputFormat::Json => print!("{}", format_error(&e, cli.format)),
            }
            std::process::exit(1);
        }
    };

    match cli.command {
        Command::Dump => {
            print!("{}", format_settings(&config.snapshot(), cli.format));
        }
        Command::Get(args) => run_get(&config.snapshot(), args, cli.format)?,
        Command::Watch(args) => run_watch(Arc::new(config), args, cli.format).await?,
    }

    Ok(())
}

fn require<T: FromSetting>(settings: &Settings, key: &str) -> Result<T> {
    match settings.lookup(key) {
        Lookup::Present(value) => Ok(value),
        Lookup::Absent => bail!("key '{}' is not set", key),
        Lookup::Malformed { error, .. } => bail!("key '{}': {}", key, error),
    }
}

/// Run the get command
fn run_get(settings: &Settings, args: GetArgs, format: OutputFormat) -> Result<()> {
    let key = args.key.as_str();
    let value = match args.value_type {
        ValueType::String => TypedValue::String(require(settings, key)?),
        ValueType::Bool => TypedValue::Bool(require(settings, key)?),
        ValueType::Int => TypedValue::Int(require(settings, key)?),
        ValueType::Float => TypedValue::Float(require(settings, key)?),
        ValueType::Duration => TypedValue::Duration(require(settings, key)?),
    };
    print!("{}", format_value(key, &value, format));
    Ok(())
}

/// Run the watch command until interrupted
async fn run_watch(config: Arc<Config>, args: WatchArgs, format: OutputFormat) -> Result<()> {
    let watcher_config = WatcherConfig {
        debounce_duration: Duration::from_millis(args.debounce_ms),
        poll_interval: Duration::from_secs(args.poll_secs),
    };
    let mut handle = start_watcher(Arc::clone(&config), watcher_config)?;
    info!(
        "Watching {} file(s){}",
        handle.watched_files().len(),
        if handle.is_polling() {
            " and the environment"
        } else {
            ""
        }
    );

    let mut stdout = std::io::stdout();
    write!(stdout, "{}", format_settings(&config.snapshot(), format))?;
    stdout.flush()?;

    loop {
        tokio::select! {
            event = handle.wait_for_change() => {
                let Some(event) = event else {
                    info!("Watcher stopped");
                    break;
                };
                let text = format_reload_event(&event, &config.snapshot(), format);
                write!(stdout, "{}", text)?;
                stdout.flush()?;
            }
            _ = tokio::signal::ctrl_c() => {
                info!("Interrupted, stopping watcher");
                break;
            }
        }
    }

    Ok(())
}
