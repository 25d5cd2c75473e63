//! rm command - Delete every object under a prefix
//!
//! Keys are removed in batches of at most 1000 using fresh listings until the
//! prefix is empty.

use clap::Args;
use dt_core::parse_uri;
use serde::Serialize;

use super::Context;
use crate::exit_code::ExitCode;

/// Delete all objects under a prefix
#[derive(Args, Debug)]
pub struct RmArgs {
    /// Prefix to clear (s3://bucket/prefix)
    pub uri: String,

    /// Required confirmation; the prefix is cleared recursively
    #[arg(long)]
    pub force: bool,
}

#[derive(Debug, Serialize)]
struct RmOutput {
    success: bool,
    bucket: String,
    prefix: String,
}

impl std::fmt::Display for RmOutput {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Cleared s3://{}/{}", self.bucket, self.prefix)
    }
}

/// Execute the rm command
pub fn execute(args: RmArgs, ctx: &Context) -> ExitCode {
    let uri = match parse_uri(&args.uri) {
        Ok(uri) => uri,
        Err(e) => return ctx.fail(&e),
    };

    if !args.force {
        ctx.formatter
            .error(&format!("Refusing to clear {uri} without --force"));
        return ExitCode::UsageError;
    }

    let client = match ctx.connect() {
        Ok(client) => client,
        Err(e) => return ctx.fail(&e),
    };

    if !client.clear_prefix(&uri.bucket, &uri.object_name) {
        ctx.formatter
            .error(&format!("Failed to clear {uri}, see log for details"));
        return ExitCode::TransferFailed;
    }

    ctx.formatter.output(&RmOutput {
        success: true,
        bucket: uri.bucket,
        prefix: uri.object_name,
    });
    ExitCode::Success
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::commands::Cli;
    use clap::Parser;

    #[test]
    fn test_rm_output_display() {
        let output = RmOutput {
            success: true,
            bucket: "b".to_string(),
            prefix: "assets/abc".to_string(),
        };
        assert_eq!(output.to_string(), "Cleared s3://b/assets/abc");
    }

    #[test]
    fn test_rm_without_force_is_usage_error() {
        let dir = tempfile::TempDir::new().unwrap();
        let config = dir.path().join("config.toml");
        let cli = Cli::try_parse_from([
            "dt",
            "--quiet",
            "--config",
            config.to_str().unwrap(),
            "rm",
            "s3://b/assets/abc",
        ])
        .unwrap();
        assert_eq!(crate::commands::execute(cli), ExitCode::UsageError);
    }
}
