//! ls command - List object keys under a prefix

use clap::Args;
use dt_core::parse_uri;
use serde::Serialize;

use super::Context;
use crate::exit_code::ExitCode;

/// List object keys
#[derive(Args, Debug)]
pub struct LsArgs {
    /// Prefix to list (s3://bucket/prefix)
    pub uri: String,

    /// Only print the number of keys
    #[arg(long)]
    pub summarize: bool,
}

#[derive(Debug, Serialize)]
struct LsOutput {
    bucket: String,
    prefix: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    keys: Vec<String>,
    total: usize,
}

impl std::fmt::Display for LsOutput {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for key in &self.keys {
            writeln!(f, "{key}")?;
        }
        write!(f, "Total: {} object(s)", self.total)
    }
}

/// Execute the ls command
pub fn execute(args: LsArgs, ctx: &Context) -> ExitCode {
    let uri = match parse_uri(&args.uri) {
        Ok(uri) => uri,
        Err(e) => return ctx.fail(&e),
    };

    let client = match ctx.connect() {
        Ok(client) => client,
        Err(e) => return ctx.fail(&e),
    };

    let mut keys = Vec::new();
    let mut total = 0;
    for key in client.list(&uri.bucket, &uri.object_name) {
        match key {
            Ok(key) => {
                total += 1;
                if !args.summarize {
                    keys.push(key);
                }
            }
            Err(e) => return ctx.fail(&e),
        }
    }

    ctx.formatter.output(&LsOutput {
        bucket: uri.bucket,
        prefix: uri.object_name,
        keys,
        total,
    });
    ExitCode::Success
}
