//! Command-line definitions

use std::path::PathBuf;

use chrono::{DateTime, Utc};
use clap::{Args, Parser, Subcommand};

/// Inspect, version and edit page-composition plans
#[derive(Debug, Parser)]
#[command(name = "plan", version, about, long_about = None)]
pub(crate) struct Cli {
    /// Emit logs as JSON lines
    #[arg(long, global = true)]
    pub(crate) json_logs: bool,

    #[command(subcommand)]
    pub(crate) command: Command,
}

#[derive(Debug, Subcommand)]
pub(crate) enum Command {
    /// Print the default plan for a tenant
    Seed {
        #[arg(long, default_value = "default")]
        tenant: String,

        /// Timestamp stamped into the plan (RFC 3339); defaults to now
        #[arg(long)]
        at: Option<DateTime<Utc>>,

        #[arg(long)]
        pretty: bool,
    },

    /// Check a plan file and list every violation
    Validate(InputArgs),

    /// Print the canonical form of a plan
    Canonicalize {
        #[command(flatten)]
        input: InputArgs,

        #[arg(long)]
        pretty: bool,
    },

    /// Print the version token of a plan
    Hash(InputArgs),

    /// Print the `encodedPlan` form, or decode one with `--decode`
    Encode {
        #[command(flatten)]
        input: InputArgs,

        /// Treat input as base64url and print the plan JSON
        #[arg(long)]
        decode: bool,
    },

    /// Fetch the current plan from the store
    Fetch {
        #[command(flatten)]
        remote: RemoteArgs,

        /// Print only the hash
        #[arg(long)]
        hash_only: bool,
    },

    /// Move a block and save with the fetched hash as precondition
    Move {
        #[command(flatten)]
        remote: RemoteArgs,

        /// Block key
        #[arg(long)]
        key: String,

        /// Target position, 0-based
        #[arg(long)]
        to: usize,
    },
}

#[derive(Debug, Args)]
pub(crate) struct InputArgs {
    /// Plan file, or `-` for stdin
    #[arg(default_value = "-")]
    pub(crate) file: PathBuf,
}

#[derive(Debug, Args)]
pub(crate) struct RemoteArgs {
    /// TOML config file
    #[arg(long, env = "PLAN_SYNC_CONFIG")]
    pub(crate) config: Option<PathBuf>,

    /// Store base URL
    #[arg(long)]
    pub(crate) base_url: Option<String>,

    #[arg(long)]
    pub(crate) tenant: Option<String>,
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
    fn parses_move() {
        let cli = Cli::parse_from([
            "plan", "move", "--key", "chat", "--to", "0", "--tenant", "acme",
        ]);
        match cli.command {
            Command::Move { key, to, remote } => {
                assert_eq!(key, "chat");
                assert_eq!(to, 0);
                assert_eq!(remote.tenant.as_deref(), Some("acme"));
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn file_defaults_to_stdin() {
        let cli = Cli::parse_from(["plan", "hash"]);
        let Command::Hash(input) = cli.command else {
            panic!("expected hash");
        };
        assert_eq!(input.file, PathBuf::from("-"));
    }
}
