// ABOUTME: Main entry point for the present-plus server.
// ABOUTME: Provides the CLI, loads configuration and runs the HTTP server.

use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// HTTP service address (e.g., '127.0.0.1:4999')
    #[arg(long)]
    http: Option<String>,

    /// Base path for templates and static resources
    #[arg(long)]
    base: Option<PathBuf>,

    /// Root of the document tree to serve
    #[arg(long)]
    content: Option<PathBuf>,

    /// The default theme to apply when no custom styles are defined
    #[arg(long)]
    theme: Option<String>,

    /// Path of the shared theme repository
    #[arg(long)]
    repo: Option<PathBuf>,

    /// Title of directory listings
    #[arg(long)]
    title: Option<String>,

    /// Stage each theme once and reuse the copy across requests
    #[arg(long)]
    reuse_staging: bool,

    /// Config file to read instead of ~/.ppconfig
    #[arg(long)]
    config: Option<PathBuf>,
}

impl Cli {
    fn apply(self, mut config: present::Config) -> present::Config {
        if let Some(http) = self.http {
            config.http = http;
        }
        if let Some(base) = self.base {
            config.base = base;
        }
        if let Some(content) = self.content {
            config.content = content;
        }
        if let Some(theme) = self.theme {
            config.theme = Some(theme).filter(|t| !t.is_empty());
        }
        if let Some(repo) = self.repo {
            config.repo = Some(repo);
        }
        if let Some(title) = self.title {
            config.title = title;
        }
        config.reuse_staging |= self.reuse_staging;
        config
    }
}

fn run(cli: Cli) -> anyhow::Result<()> {
    let config = present::Config::load(cli.config.as_deref())
        .map_err(|e| anyhow::anyhow!("Failed to load configuration: {}", e))?;
    let config = cli
        .apply(config)
        .validate()
        .map_err(|e| anyhow::anyhow!("Invalid configuration: {}", e))?;
    log::debug!("Effective configuration: {:?}", config);

    let dispatcher = present::Dispatcher::from_config(&config);
    dispatcher
        .reset_staging()
        .map_err(|e| anyhow::anyhow!("Couldn't remove staging directory: {}", e))?;

    let server = present::server::bind(&config.http)?;
    present::server::serve(server, Arc::new(dispatcher));
    Ok(())
}

fn main() {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    if let Err(e) = run(Cli::parse()) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}
