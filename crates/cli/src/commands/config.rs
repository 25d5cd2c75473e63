//! Configuration commands
//!
//! `show` prints the effective settings with the secret key masked, `set` and
//! `unset` edit the configuration file in place. Edits are validated before
//! they are written.

use std::path::PathBuf;

use clap::{Subcommand, ValueEnum};
use dt_core::{Config, Error};
use serde::Serialize;

use super::Context;
use crate::exit_code::ExitCode;

/// Configuration subcommands
#[derive(Subcommand, Debug)]
pub enum ConfigCommands {
    /// Show the effective configuration
    Show,

    /// Set a configuration value
    Set(SetArgs),

    /// Remove an optional configuration value
    Unset(UnsetArgs),
}

/// Settings that can be changed from the command line
#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigKey {
    /// S3 endpoint URL
    Endpoint,
    /// AWS region
    Region,
    /// Access key ID
    AccessKey,
    /// Secret access key
    SecretKey,
    /// Bucket lookup style: auto, path or dns
    BucketLookup,
    /// Default output format: human or json
    Output,
    /// Colored output: true or false
    Color,
}

/// Arguments for the `config set` command
#[derive(clap::Args, Debug)]
pub struct SetArgs {
    /// Setting to change
    #[arg(value_enum)]
    pub key: ConfigKey,

    /// New value
    pub value: String,
}

/// Arguments for the `config unset` command
#[derive(clap::Args, Debug)]
pub struct UnsetArgs {
    /// Setting to remove (endpoint, access-key or secret-key)
    #[arg(value_enum)]
    pub key: ConfigKey,
}

/// Configuration as shown to the user (secret masked)
#[derive(Debug, Serialize)]
struct ConfigView {
    path: PathBuf,
    endpoint: Option<String>,
    region: String,
    access_key: Option<String>,
    secret_key: Option<&'static str>,
    bucket_lookup: String,
    output: String,
    color: bool,
}

impl ConfigView {
    fn new(path: PathBuf, config: &Config) -> Self {
        Self {
            path,
            endpoint: config.store.endpoint.clone(),
            region: config.store.region.clone(),
            access_key: config.store.access_key.clone(),
            secret_key: config.store.secret_key.as_ref().map(|_| "***"),
            bucket_lookup: config.store.bucket_lookup.clone(),
            output: config.defaults.output.clone(),
            color: config.defaults.color,
        }
    }
}

impl std::fmt::Display for ConfigView {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let unset = "(not set)";
        writeln!(f, "Config file:   {}", self.path.display())?;
        writeln!(
            f,
            "Endpoint:      {}",
            self.endpoint.as_deref().unwrap_or("(AWS default)")
        )?;
        writeln!(f, "Region:        {}", self.region)?;
        writeln!(
            f,
            "Access key:    {}",
            self.access_key.as_deref().unwrap_or(unset)
        )?;
        writeln!(f, "Secret key:    {}", self.secret_key.unwrap_or(unset))?;
        writeln!(f, "Bucket lookup: {}", self.bucket_lookup)?;
        writeln!(f, "Output:        {}", self.output)?;
        write!(f, "Color:         {}", self.color)
    }
}

/// Execute a config subcommand
pub fn execute(cmd: ConfigCommands, ctx: &Context) -> ExitCode {
    match cmd {
        ConfigCommands::Show => {
            let path = ctx.manager.config_path().clone();
            ctx.formatter.output(&ConfigView::new(path, &ctx.config));
            ExitCode::Success
        }
        ConfigCommands::Set(args) => edit(ctx, args.key, |config| {
            apply_set(config, args.key, &args.value)
        }),
        ConfigCommands::Unset(args) => edit(ctx, args.key, |config| apply_unset(config, args.key)),
    }
}

/// Load the file as written (without CLI overrides), change it and save it
fn edit(
    ctx: &Context,
    key: ConfigKey,
    change: impl FnOnce(&mut Config) -> dt_core::Result<()>,
) -> ExitCode {
    let result = ctx.manager.load().and_then(|mut config| {
        change(&mut config)?;
        ctx.manager.save(&config)
    });

    match result {
        Ok(()) => {
            tracing::info!(
                "Updated {key:?} in {}",
                ctx.manager.config_path().display()
            );
            ctx.formatter.success(&format!(
                "Configuration saved to {}",
                ctx.manager.config_path().display()
            ));
            ExitCode::Success
        }
        Err(e) => ctx.fail(&e),
    }
}

fn apply_set(config: &mut Config, key: ConfigKey, value: &str) -> dt_core::Result<()> {
    if value.is_empty() {
        return Err(Error::Config(
            "Value cannot be empty, use `dt config unset` instead".into(),
        ));
    }

    match key {
        ConfigKey::Endpoint => config.store.endpoint = Some(value.to_string()),
        ConfigKey::Region => config.store.region = value.to_string(),
        ConfigKey::AccessKey => config.store.access_key = Some(value.to_string()),
        ConfigKey::SecretKey => config.store.secret_key = Some(value.to_string()),
        ConfigKey::BucketLookup => config.store.bucket_lookup = value.to_string(),
        ConfigKey::Output => {
            if value != "human" && value != "json" {
                return Err(Error::Config(format!(
                    "output must be 'human' or 'json', got '{value}'"
                )));
            }
            config.defaults.output = value.to_string();
        }
        ConfigKey::Color => {
            config.defaults.color = value.parse().map_err(|_| {
                Error::Config(format!("color must be 'true' or 'false', got '{value}'"))
            })?;
        }
    }
    Ok(())
}

fn apply_unset(config: &mut Config, key: ConfigKey) -> dt_core::Result<()> {
    match key {
        ConfigKey::Endpoint => config.store.endpoint = None,
        ConfigKey::AccessKey => config.store.access_key = None,
        ConfigKey::SecretKey => config.store.secret_key = None,
        other => {
            return Err(Error::Config(format!(
                "{other:?} always has a value, use `dt config set` instead"
            )));
        }
    }
    Ok(())
}
