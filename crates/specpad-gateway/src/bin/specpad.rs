#!/usr/bin/env cargo
//! specpad binary
//!
//! Edit a document in the browser while it is kept in sync with disk.
//!
//! # Usage
//! ```bash
//! specpad [-f api-spec.yaml] [-s STATIC_DIR] [-p 8765] [--editor builtin|DIR]
//! ```

use clap::Parser;
use specpad_gateway::{EditorSource, Gateway, GatewayConfig};
use std::path::PathBuf;
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

/// specpad - local editing backend for a browser-based editor
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// The full path to the document being edited (default: api-spec.yaml)
    #[arg(short = 'f', long = "file", value_name = "FILE")]
    file: Option<PathBuf>,

    /// All files under this path are served at /static/ (default: the document's directory)
    #[arg(short = 's', long = "static", value_name = "DIR")]
    static_path: Option<PathBuf>,

    /// Port for the editor's HTTP backend (default: 8765)
    #[arg(short, long)]
    port: Option<u16>,

    /// Host to bind to (default: 127.0.0.1)
    #[arg(long)]
    host: Option<String>,

    /// Editor to serve: "builtin" or the path to an editor installation
    #[arg(long, alias = "se", value_name = "builtin|DIR")]
    editor: Option<EditorSource>,

    /// JSON configuration file; command line flags take precedence
    #[arg(long, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Do not open a browser window
    #[arg(long)]
    no_browser: bool,

    /// Enable verbose debug logging
    #[arg(short, long)]
    verbose: bool,
}

impl Args {
    fn into_config(self) -> anyhow::Result<GatewayConfig> {
        let mut config = match &self.config {
            Some(path) => GatewayConfig::from_file(path)?,
            None => GatewayConfig::default(),
        };

        if let Some(file) = self.file {
            config = config.with_document(file);
        }
        if let Some(dir) = self.static_path {
            config = config.with_static_path(dir);
        }
        if let Some(port) = self.port {
            config = config.with_port(port);
        }
        if let Some(host) = self.host {
            config = config.with_host(host);
        }
        if let Some(editor) = self.editor {
            config = config.with_editor(editor);
        }
        if self.no_browser {
            config = config.with_open_browser(false);
        }

        config.validate()?;
        Ok(config)
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Initialize logging
    let default_level = if args.verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(args.verbose)
        .init();

    let config = args.into_config()?;
    let gateway = Arc::new(Gateway::new(config));

    let signal_gateway = gateway.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            signal_gateway.shutdown();
        }
    });

    gateway.start().await?;

    Ok(())
}
