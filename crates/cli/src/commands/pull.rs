//! pull command - Download an archive object or a whole prefix
//!
//! URIs whose object name contains `tar.gz` are fetched as one file; anything
//! else is treated as a prefix and mirrored below the output folder.

use std::path::PathBuf;

use clap::Args;
use dt_core::{DownloadResult, Provenance, parse_uri};
use serde::Serialize;

use super::Context;
use crate::exit_code::ExitCode;

/// Download from S3 into a local folder
#[derive(Args, Debug)]
pub struct PullArgs {
    /// Source object or prefix (s3://bucket/object_name)
    pub uri: String,

    /// Folder to download into, created if missing
    pub output: PathBuf,

    /// Include a provenance record of the download in the output
    #[arg(long)]
    pub provenance: bool,
}

#[derive(Debug, Serialize)]
struct PullOutput {
    uri: String,
    #[serde(flatten)]
    result: DownloadResult,
    #[serde(skip_serializing_if = "Option::is_none")]
    provenance: Option<Provenance>,
}

impl std::fmt::Display for PullOutput {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "Downloaded {} -> {} in {} ms",
            self.uri,
            self.result.local_path.display(),
            self.result.elapsed_ms
        )?;
        if let Some(provenance) = &self.provenance {
            let json = provenance.to_json().map_err(|_| std::fmt::Error)?;
            write!(f, "\n{json}")?;
        }
        Ok(())
    }
}

/// Execute the pull command
pub fn execute(args: PullArgs, ctx: &Context) -> ExitCode {
    // Rejecting the URI here keeps usage errors apart from failed downloads
    if let Err(e) = parse_uri(&args.uri) {
        return ctx.fail(&e);
    }

    let client = match ctx.connect() {
        Ok(client) => client,
        Err(e) => return ctx.fail(&e),
    };

    let start_time = jiff::Timestamp::now();
    let result = client.resolve_and_download(&args.uri, &args.output);

    if !result.success {
        ctx.formatter.error(&format!(
            "Download of {} did not complete, see log for details",
            args.uri
        ));
        return ExitCode::TransferFailed;
    }

    let provenance = args
        .provenance
        .then(|| result.to_provenance(&args.uri, start_time, env!("CARGO_PKG_VERSION")));

    ctx.formatter.output(&PullOutput {
        uri: args.uri,
        result,
        provenance,
    });
    ExitCode::Success
}
