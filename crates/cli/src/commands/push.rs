//! push command - Replace the contents of a prefix with local files
//!
//! Everything under the prefix is deleted first, then the given files and
//! directories (or a single tar.gz bundle of them) are uploaded. The upload
//! stops at the first failed file.

use std::path::PathBuf;

use clap::Args;
use dt_core::parse_uri;
use serde::Serialize;

use super::Context;
use crate::exit_code::ExitCode;

/// Upload local files under an S3 prefix
#[derive(Args, Debug)]
pub struct PushArgs {
    /// Target prefix (s3://bucket/prefix)
    pub uri: String,

    /// Files and directories to upload
    #[arg(required = true)]
    pub paths: Vec<PathBuf>,

    /// Bundle all paths into this .tar.gz file and upload only the bundle
    #[arg(long, value_name = "FILE")]
    pub archive: Option<PathBuf>,
}

#[derive(Debug, Serialize)]
struct PushOutput {
    success: bool,
    bucket: String,
    prefix: String,
    paths: Vec<PathBuf>,
    #[serde(skip_serializing_if = "Option::is_none")]
    archive: Option<PathBuf>,
}

impl std::fmt::Display for PushOutput {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.archive {
            Some(archive) => write!(
                f,
                "Uploaded {} to s3://{}/{}",
                archive.display(),
                self.bucket,
                self.prefix
            ),
            None => write!(
                f,
                "Uploaded {} path(s) to s3://{}/{}",
                self.paths.len(),
                self.bucket,
                self.prefix
            ),
        }
    }
}

/// Execute the push command
pub fn execute(args: PushArgs, ctx: &Context) -> ExitCode {
    let uri = match parse_uri(&args.uri) {
        Ok(uri) => uri,
        Err(e) => return ctx.fail(&e),
    };

    if let Some(archive) = args.archive.as_deref().filter(|a| a.exists()) {
        ctx.formatter
            .warning(&format!("Overwriting existing {}", archive.display()));
    }

    let client = match ctx.connect() {
        Ok(client) => client,
        Err(e) => return ctx.fail(&e),
    };

    match client.clear_and_transfer(
        &uri.bucket,
        &uri.object_name,
        &args.paths,
        args.archive.as_deref(),
    ) {
        Ok(true) => {
            ctx.formatter.output(&PushOutput {
                success: true,
                bucket: uri.bucket,
                prefix: uri.object_name,
                paths: args.paths,
                archive: args.archive,
            });
            ExitCode::Success
        }
        Ok(false) => {
            ctx.formatter
                .error(&format!("Transfer to {uri} did not complete, see log for details"));
            ExitCode::TransferFailed
        }
        Err(e) => ctx.fail(&e),
    }
}
