//! cli
//!
//! Command-line interface for hubgate.
//!
//! # Responsibilities
//!
//! - Parse command-line arguments and global flags
//! - Install the tracing subscriber (stderr only; stdout carries results)
//! - Build the gateway from the config file, the environment and the flags
//! - Run one of the transports: `tools`, `call`, or `serve`
//!
//! # Architecture
//!
//! The CLI layer is thin. Every tool invocation goes through
//! [`Gateway::call`]; the CLI never talks to the remote itself.

pub mod args;
pub mod serve;

pub use args::{Cli, Command};

use std::process::ExitCode;
use std::sync::Arc;

use anyhow::{Context as _, Result};
use serde_json::Value;
use tracing_subscriber::EnvFilter;

use crate::env::{FileConfig, OverrideSource, Resolver, HOST_VAR, REPOSITORY_VAR};
use crate::envelope::{Envelope, ErrorKind};
use crate::forge::{ClientFactory, GitHubClientFactory};
use crate::gateway::Gateway;
use crate::tools::{self, TOOLS};

/// Run the CLI application.
///
/// This is the main entry point called from `main.rs`.
pub fn run() -> Result<ExitCode> {
    let cli = Cli::parse_args();
    init_tracing(cli.debug);

    match cli.command {
        Command::Tools { json } => {
            print_tools(json)?;
            Ok(ExitCode::SUCCESS)
        }
        Command::Call { tool, args } => {
            let gateway = build_gateway(cli.host, cli.repo)?;
            let rt = tokio::runtime::Runtime::new()?;
            let envelope = rt.block_on(call(&gateway, &tool, &args));
            println!("{}", serde_json::to_string_pretty(&envelope.to_value())?);
            Ok(if envelope.is_success() {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            })
        }
        Command::Serve => {
            let gateway = Arc::new(build_gateway(cli.host, cli.repo)?);
            let rt = tokio::runtime::Runtime::new()?;
            rt.block_on(serve::serve_stdio(gateway))?;
            Ok(ExitCode::SUCCESS)
        }
    }
}

/// Filter from `RUST_LOG`, else `debug` with `--debug`, else `info`.
fn init_tracing(debug: bool) {
    let fallback = if debug { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));
    // A subscriber may already be installed when embedded; keep that one.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}

/// Gateway over the standard lookup chain, with flags as overrides.
pub fn build_gateway(
    host: Option<String>,
    repo: Option<String>,
) -> Result<Gateway<GitHubClientFactory>> {
    let loaded = FileConfig::load().context("failed to load hubgate config")?;
    if let Some(path) = &loaded.path {
        tracing::debug!(path = %path.display(), "loaded config file");
    }

    let overrides = OverrideSource::new()
        .with_opt(HOST_VAR, host)
        .with_opt(REPOSITORY_VAR, repo);
    let resolver = Resolver::standard(overrides, loaded.config.lookup_source());
    let factory = GitHubClientFactory::new(loaded.config.http_settings());
    Ok(Gateway::new(resolver, factory))
}

/// Run one tool with arguments given as JSON text.
pub async fn call<F: ClientFactory>(gateway: &Gateway<F>, tool: &str, args: &str) -> Envelope {
    match serde_json::from_str::<Value>(args) {
        Ok(arguments) => gateway.call(tool, arguments).await,
        Err(e) => Envelope::error(
            ErrorKind::InvalidArgument,
            format!("--args is not valid JSON: {}", e),
        ),
    }
}

fn print_tools(json: bool) -> Result<()> {
    if json {
        let listing: Vec<Value> = TOOLS.iter().map(tools::ToolSpec::describe).collect();
        println!("{}", serde_json::to_string_pretty(&listing)?);
        return Ok(());
    }

    let width = TOOLS.iter().map(|t| t.name.len()).max().unwrap_or(0);
    for tool in TOOLS {
        let access = if tool.read_only { "read " } else { "write" };
        println!(
            "{:width$}  {}  {}",
            tool.name,
            access,
            tool.description,
            width = width
        );
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::forge::mock::{MockClientFactory, MockForge};
    use serde_json::json;

    fn gateway() -> Gateway<MockClientFactory> {
        let resolver = Resolver::new(vec![Arc::new(
            OverrideSource::new().with("GITHUB_TOKEN", "ghp_1234567890"),
        )]);
        Gateway::new(resolver, MockClientFactory::new(MockForge::new()))
    }

    #[tokio::test]
    async fn call_rejects_invalid_json() {
        let gw = gateway();
        let envelope = call(&gw, "get_repository", "{not json").await;
        assert_eq!(envelope.error_kind(), Some(ErrorKind::InvalidArgument));
        assert_eq!(gw.factory().calls(), 0);
    }

    #[tokio::test]
    async fn call_passes_arguments_through() {
        let gw = gateway();
        let args = json!({"repository": "mock/repo"}).to_string();
        let envelope = call(&gw, "get_repository", &args).await;
        assert!(envelope.is_success());
        assert_eq!(
            envelope.result().unwrap()["repository"]["full_name"],
            "mock/repo"
        );
    }
}
