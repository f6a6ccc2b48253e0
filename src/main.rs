//! `confcache` command line tool.
//!
//! Resolves, parses and queries configuration files the same way the library
//! does, which makes it handy for checking what an application will see.

use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand};
use confcache::observability::logging::init_logging;
use confcache::{ConfigHandle, Overrides, WatchMode};

#[derive(Parser)]
#[command(name = "confcache")]
#[command(about = "Resolve, parse and query configuration files", long_about = None)]
struct Cli {
    /// Search directory; repeat for several, first match wins
    #[arg(short, long = "path", global = true)]
    paths: Vec<String>,

    /// Default configuration file name
    #[arg(short, long, global = true)]
    file: Option<String>,

    /// Try every grouping of key segments when looking up dotted keys
    #[arg(long, global = true)]
    violence_check: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the value at a dotted key
    Get {
        key: String,
        /// File to read instead of the default one
        #[arg(short, long)]
        name: Option<String>,
    },
    /// Print where a file name resolves to
    Locate { name: Option<String> },
    /// Print a whole document as JSON
    Dump { name: Option<String> },
    /// Print a value now and again every time its file is reloaded
    Watch {
        key: String,
        #[arg(short, long)]
        name: Option<String>,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_logging("confcache=warn");
    let cli = Cli::parse();

    let watching = matches!(cli.command, Commands::Watch { .. });
    let mut builder = ConfigHandle::builder()
        .overrides(Overrides::from_process())
        .violence_check(cli.violence_check)
        .watch_mode(if watching { WatchMode::Notify } else { WatchMode::Manual });
    if let Some(file) = &cli.file {
        builder = builder.file_name(file.clone());
    }
    for path in &cli.paths {
        builder = builder.search_path(path.clone());
    }
    let handle = builder.build();

    match cli.command {
        Commands::Get { key, name } => {
            let doc = handle.document_of(name.as_deref().unwrap_or(""))?;
            match doc.get(&key) {
                Some(value) => println!("{}", render(value)),
                None => return Err(format!("key \"{key}\" not found").into()),
            }
        }
        Commands::Locate { name } => {
            let name = name.unwrap_or_default();
            match handle.file_path(&name) {
                Some(location) => println!("{location}"),
                None => {
                    // Surface the full "searched in" message.
                    handle.document_of(&name)?;
                }
            }
        }
        Commands::Dump { name } => {
            let doc = handle.document_of(name.as_deref().unwrap_or(""))?;
            println!("{}", doc.dump());
        }
        Commands::Watch { key, name } => {
            watch(&handle, &key, name.as_deref().unwrap_or("")).await?;
        }
    }

    Ok(())
}

async fn watch(handle: &ConfigHandle, key: &str, name: &str) -> Result<(), Box<dyn std::error::Error>> {
    let mut current = handle.document_of(name)?;
    print_value(&current, key);

    let shutdown = tokio::signal::ctrl_c();
    tokio::pin!(shutdown);
    let mut interval = tokio::time::interval(Duration::from_millis(500));
    loop {
        tokio::select! {
            _ = &mut shutdown => {
                tracing::info!("Shutdown signal received");
                return Ok(());
            }
            _ = interval.tick() => {
                match handle.document_of(name) {
                    Ok(doc) if !Arc::ptr_eq(&doc, &current) => {
                        print_value(&doc, key);
                        current = doc;
                    }
                    Ok(_) => {}
                    Err(e) => tracing::warn!(error = %e, "reload failed, keeping previous document"),
                }
            }
        }
    }
}

fn print_value(doc: &confcache::Document, key: &str) {
    match doc.get(key) {
        Some(value) => println!("{}", render(value)),
        None => println!(),
    }
}

fn render(value: &serde_json::Value) -> String {
    match value {
        serde_json::Value::String(s) => s.clone(),
        serde_json::Value::Array(_) | serde_json::Value::Object(_) => {
            serde_json::to_string_pretty(value).unwrap_or_default()
        }
        other => other.to_string(),
    }
}
