//! cli::args
//!
//! Command-line argument definitions using clap derive.
//!
//! # Global Flags
//!
//! These flags are available on all commands:
//! - `--help` / `-h`: Show help
//! - `--version`: Show version
//! - `--debug`: Enable debug logging (unless `RUST_LOG` is set)
//! - `--host <host>`: GitHub host, overriding `GITHUB_HOST`
//! - `--repo <owner/name>`: Default repository, overriding `GITHUB_REPOSITORY`

use clap::{Parser, Subcommand};

/// hubgate - GitHub operations as tools for automated agents
#[derive(Parser, Debug)]
#[command(name = "hubgate")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Enable debug logging
    #[arg(long, global = true)]
    pub debug: bool,

    /// GitHub host (github.com or an Enterprise host)
    #[arg(long, global = true, value_name = "HOST")]
    pub host: Option<String>,

    /// Default repository for operations that take one
    #[arg(long, global = true, value_name = "OWNER/NAME")]
    pub repo: Option<String>,

    #[command(subcommand)]
    pub command: Command,
}

impl Cli {
    /// Parse command-line arguments.
    pub fn parse_args() -> Self {
        Parser::parse()
    }
}

/// Available commands.
#[derive(Subcommand, Debug)]
pub enum Command {
    /// List the available tools
    Tools {
        /// Print names, descriptions and argument schemas as JSON
        #[arg(long)]
        json: bool,
    },

    /// Run one tool and print its result envelope
    #[command(after_help = "\
EXAMPLES:
    hubgate call get_issue --args '{\"issue_number\": 3, \"repository\": \"acme/widgets\"}'
    hubgate --repo acme/widgets call list_branches --args '{\"filter\": \"feature/\"}'

Exits with status 1 when the envelope reports an error.")]
    Call {
        /// Tool name, as shown by `hubgate tools`
        tool: String,

        /// Arguments as a JSON object
        #[arg(long, value_name = "JSON", default_value = "{}")]
        args: String,
    },

    /// Serve line-delimited JSON requests on stdin, answering on stdout
    #[command(after_help = "\
PROTOCOL:
    request:  {\"id\": 1, \"tool\": \"get_repository\", \"arguments\": {\"repository\": \"acme/widgets\"}}
    response: {\"id\": 1, \"envelope\": {\"status\": \"success\", \"result\": {...}}}

Requests are handled concurrently; responses may arrive out of order.")]
    Serve,
}
