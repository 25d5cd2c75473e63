//! CLI command definitions and execution
//!
//! Every command except `completions` shares one [`Context`]: the loaded
//! configuration, the CLI overrides applied on top of it, and the formatter.

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use dt_core::{Config, ConfigManager, Result, StoreClient};
use dt_s3::S3Store;

use crate::exit_code::ExitCode;
use crate::output::{Formatter, OutputConfig};

mod completions;
mod config;
mod ls;
mod pull;
mod push;
mod rm;

/// dt - move processing results between local disk and S3
///
/// Uploads files, directories or a single tar.gz bundle under an S3 prefix,
/// replacing whatever was there, and downloads objects or whole prefixes back.
#[derive(Parser, Debug)]
#[command(name = "dt")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Output format: human-readable or JSON
    #[arg(long, global = true, default_value = "false")]
    pub json: bool,

    /// Disable colored output
    #[arg(long, global = true, default_value = "false")]
    pub no_color: bool,

    /// Suppress non-error output
    #[arg(short, long, global = true, default_value = "false")]
    pub quiet: bool,

    /// Enable debug logging
    #[arg(long, global = true, default_value = "false")]
    pub debug: bool,

    /// Path to the configuration file
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,

    /// S3 endpoint URL, overriding the configuration file
    #[arg(long, global = true, env = "DT_ENDPOINT", value_name = "URL")]
    pub endpoint: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Replace everything under an S3 prefix with local files
    Push(push::PushArgs),

    /// Download an object or every object under a prefix
    Pull(pull::PullArgs),

    /// List object keys under a prefix
    Ls(ls::LsArgs),

    /// Delete every object under a prefix
    Rm(rm::RmArgs),

    /// Show or edit the configuration file
    #[command(subcommand)]
    Config(config::ConfigCommands),

    /// Generate shell completion scripts
    Completions(completions::CompletionsArgs),
}

/// State shared by commands that talk to the store
pub struct Context {
    pub manager: ConfigManager,
    /// Configuration with CLI overrides applied
    pub config: Config,
    pub formatter: Formatter,
}

impl Context {
    /// Load the configuration and derive output settings from flags and file defaults
    fn load(cli: &Cli) -> std::result::Result<Self, (Formatter, dt_core::Error)> {
        let flags_only = Formatter::new(OutputConfig {
            json: cli.json,
            no_color: cli.no_color,
            quiet: cli.quiet,
        });

        let manager = match &cli.config {
            Some(path) => ConfigManager::with_path(path.clone()),
            None => ConfigManager::new().map_err(|e| (flags_only.clone(), e))?,
        };
        let mut config = manager.load().map_err(|e| (flags_only.clone(), e))?;

        if let Some(endpoint) = &cli.endpoint {
            config.store.endpoint = Some(endpoint.clone());
        }

        let formatter = Formatter::new(OutputConfig {
            json: cli.json || config.defaults.output == "json",
            no_color: cli.no_color || !config.defaults.color,
            quiet: cli.quiet,
        });

        Ok(Self {
            manager,
            config,
            formatter,
        })
    }

    /// Build a store client from the effective configuration
    pub fn connect(&self) -> Result<StoreClient<S3Store>> {
        let store = S3Store::new(&self.config.store)?;
        Ok(StoreClient::new(store))
    }

    /// Report an error and return the matching exit code
    pub fn fail(&self, error: &dt_core::Error) -> ExitCode {
        self.formatter.error(&error.to_string());
        ExitCode::from_error(error)
    }
}

/// Execute the CLI command and return an exit code
pub fn execute(cli: Cli) -> ExitCode {
    if let Commands::Completions(args) = &cli.command {
        return completions::execute(args);
    }

    let ctx = match Context::load(&cli) {
        Ok(ctx) => ctx,
        Err((formatter, e)) => {
            formatter.error(&format!("Failed to load configuration: {e}"));
            return ExitCode::from_error(&e);
        }
    };

    tracing::debug!(config = %ctx.manager.config_path().display(), "Loaded configuration");

    match cli.command {
        Commands::Push(args) => push::execute(args, &ctx),
        Commands::Pull(args) => pull::execute(args, &ctx),
        Commands::Ls(args) => ls::execute(args, &ctx),
        Commands::Rm(args) => rm::execute(args, &ctx),
        Commands::Config(cmd) => config::execute(cmd, &ctx),
        Commands::Completions(_) => ExitCode::Success,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn cli_with_config(dir: &TempDir, extra: &[&str]) -> Cli {
        let config = dir.path().join("config.toml");
        let mut args = vec!["dt", "--config", config.to_str().unwrap()];
        args.extend_from_slice(extra);
        Cli::try_parse_from(args).unwrap()
    }

    #[test]
    fn test_parse_push() {
        let cli = Cli::try_parse_from([
            "dt",
            "push",
            "s3://bucket/prefix",
            "a.txt",
            "dir",
            "--archive",
            "/tmp/out.tar.gz",
        ])
        .unwrap();
        match cli.command {
            Commands::Push(args) => {
                assert_eq!(args.uri, "s3://bucket/prefix");
                assert_eq!(args.paths, vec![PathBuf::from("a.txt"), PathBuf::from("dir")]);
                assert_eq!(args.archive, Some(PathBuf::from("/tmp/out.tar.gz")));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_parse_push_requires_paths() {
        assert!(Cli::try_parse_from(["dt", "push", "s3://bucket/prefix"]).is_err());
    }

    #[test]
    fn test_parse_pull_with_global_flags() {
        let cli = Cli::try_parse_from([
            "dt",
            "pull",
            "s3://bucket/a/b.tar.gz",
            "out",
            "--provenance",
            "--json",
            "--endpoint",
            "http://localhost:9000",
        ])
        .unwrap();
        assert!(cli.json);
        assert_eq!(cli.endpoint.as_deref(), Some("http://localhost:9000"));
        match cli.command {
            Commands::Pull(args) => {
                assert!(args.provenance);
                assert_eq!(args.output, PathBuf::from("out"));
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_context_applies_overrides() {
        let dir = TempDir::new().unwrap();
        std::fs::write(
            dir.path().join("config.toml"),
            "schema_version = 1\n[defaults]\noutput = \"json\"\ncolor = false\n",
        )
        .unwrap();

        let cli = cli_with_config(&dir, &["--endpoint", "http://localhost:9000", "ls", "s3://b/p"]);
        let ctx = Context::load(&cli).unwrap();

        assert_eq!(
            ctx.config.store.endpoint.as_deref(),
            Some("http://localhost:9000")
        );
        assert!(ctx.formatter.is_json());
        assert!(!ctx.formatter.colors_enabled());
    }

    #[test]
    fn test_context_rejects_broken_config() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("config.toml"), "schema_version = \"one\"").unwrap();

        let cli = cli_with_config(&dir, &["ls", "s3://b/p"]);
        let Err((_, e)) = Context::load(&cli) else {
            panic!("expected load failure");
        };
        assert_eq!(ExitCode::from_error(&e), ExitCode::GeneralError);
    }

    #[test]
    fn test_execute_rejects_invalid_uri_before_connecting() {
        let dir = TempDir::new().unwrap();
        let cli = cli_with_config(&dir, &["--quiet", "ls", "bucket/prefix"]);
        assert_eq!(execute(cli), ExitCode::UsageError);
    }
}
