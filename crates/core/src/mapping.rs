//! Local path to remote key mapping
//!
//! Turns a list of local files and directories into (local path, object key)
//! pairs under a key prefix. Directory structure below each listed directory
//! is kept as key infixes; with an archive path the whole list is bundled
//! and mapped to a single key instead.

use std::path::{Path, PathBuf};

use crate::archive::build_archive;
use crate::error::{Error, Result};

/// A local file and the object key it is uploaded to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileKeyPair {
    pub local_path: PathBuf,
    pub remote_key: String,
}

impl FileKeyPair {
    pub fn new(local_path: impl Into<PathBuf>, remote_key: impl Into<String>) -> Self {
        Self {
            local_path: local_path.into(),
            remote_key: remote_key.into(),
        }
    }
}

/// File name of `input_file`, optionally without its extension
///
/// Used as the asset ID that results are stored under.
pub fn asset_id(input_file: &Path, with_extension: bool) -> String {
    let name = if with_extension {
        input_file.file_name()
    } else {
        input_file.file_stem()
    };
    let Some(name) = name else {
        return String::new();
    };
    match name.to_str() {
        Some(name) => name.to_string(),
        None => {
            // Lossy names can collide; a later upload would replace an earlier one
            let lossy = name.to_string_lossy().into_owned();
            tracing::warn!(
                "{} is not valid UTF-8, using '{lossy}' as its name",
                input_file.display()
            );
            lossy
        }
    }
}

/// Append a key segment to a prefix, adding a `/` only where one is missing
pub fn join_key(prefix: &str, name: &str) -> String {
    if prefix.is_empty() {
        name.to_string()
    } else if prefix.ends_with('/') {
        format!("{prefix}{name}")
    } else {
        format!("{prefix}/{name}")
    }
}

/// Map `file_list` onto object keys under `prefix`
///
/// Without an archive path every file yields one pair and every directory
/// contributes its contents with the directory name added to the prefix.
/// With an archive path the list is tarred first and the result is the single
/// pair `(archive_path, prefix/archive_name)`; a failed archive aborts the
/// mapping with [`Error::Archive`], the only error this returns. Directories
/// that cannot be read are skipped with a warning.
///
/// The order of the returned pairs is unspecified.
pub fn map_files<P: AsRef<Path>>(
    file_list: &[P],
    prefix: &str,
    archive_path: Option<&Path>,
) -> Result<Vec<FileKeyPair>> {
    if let Some(archive_path) = archive_path {
        if !build_archive(archive_path, file_list) {
            return Err(Error::Archive(format!(
                "could not archive the file list into {}",
                archive_path.display()
            )));
        }
        let key = join_key(prefix, &asset_id(archive_path, true));
        return Ok(vec![FileKeyPair::new(archive_path, key)]);
    }

    Ok(walk_files(file_list, prefix, read_dir_paths))
}

fn read_dir_paths(dir: &Path) -> std::io::Result<Vec<PathBuf>> {
    std::fs::read_dir(dir)?
        .map(|entry| entry.map(|e| e.path()))
        .collect()
}

/// Worklist traversal behind [`map_files`]
///
/// A directory that cannot be read is skipped with a warning; its siblings
/// are still mapped.
fn walk_files<P, F>(file_list: &[P], prefix: &str, mut read_dir: F) -> Vec<FileKeyPair>
where
    P: AsRef<Path>,
    F: FnMut(&Path) -> std::io::Result<Vec<PathBuf>>,
{
    let mut pairs = Vec::new();
    let mut worklist: Vec<(PathBuf, String)> = file_list
        .iter()
        .map(|f| (f.as_ref().to_path_buf(), prefix.to_string()))
        .collect();

    while let Some((path, key_prefix)) = worklist.pop() {
        if path.is_dir() {
            let dir_prefix = join_key(&key_prefix, &asset_id(&path, true));
            match read_dir(&path) {
                Ok(entries) => {
                    worklist.extend(entries.into_iter().map(|e| (e, dir_prefix.clone())));
                }
                Err(e) => {
                    tracing::warn!("Skipping unreadable directory {}: {e}", path.display());
                }
            }
        } else {
            let key = join_key(&key_prefix, &asset_id(&path, true));
            tracing::debug!("{} -> {key}", path.display());
            pairs.push(FileKeyPair::new(path, key));
        }
    }

    pairs
}
