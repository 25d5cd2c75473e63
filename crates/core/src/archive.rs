//! Compressed tar bundles
//!
//! Packs a list of local paths into a single `.tar.gz` file so that a whole
//! file set can be transferred as one object. Entries are stored under their
//! basename only, so any directory nesting above a member is dropped.

use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

use flate2::Compression;
use flate2::write::GzEncoder;

use crate::error::{Error, Result};

/// The only archive extension accepted
pub const COMPRESSED_TAR_EXTENSION: &str = ".tar.gz";

/// An archive to be written and the paths it should contain
#[derive(Debug, Clone)]
pub struct ArchiveRequest {
    /// Destination of the archive, must end in `.tar.gz`
    pub archive_path: PathBuf,
    /// Files or directories to add
    pub members: Vec<PathBuf>,
}

impl ArchiveRequest {
    pub fn new(archive_path: impl Into<PathBuf>, members: Vec<PathBuf>) -> Self {
        Self {
            archive_path: archive_path.into(),
            members,
        }
    }

    /// Check the archive path contract: existing parent, `.tar.gz` suffix
    pub fn validate(&self) -> Result<()> {
        let path = &self.archive_path;

        // A bare file name lives in the current directory
        let parent = match path.parent() {
            Some(p) if !p.as_os_str().is_empty() => p,
            _ => Path::new("."),
        };
        if !parent.is_dir() {
            return Err(Error::InvalidArchivePath(format!(
                "parent directory does not exist: {}",
                path.display()
            )));
        }

        if !path.to_string_lossy().ends_with(COMPRESSED_TAR_EXTENSION) {
            return Err(Error::InvalidArchivePath(format!(
                "{} should have the extension {COMPRESSED_TAR_EXTENSION}",
                path.display()
            )));
        }

        Ok(())
    }

    /// Validate, then write the archive
    ///
    /// A failed write may leave a partial file behind; removing it is up to
    /// the caller.
    pub fn build(&self) -> Result<()> {
        self.validate()?;
        tracing::info!(
            "Tarring {} path(s) into {}",
            self.members.len(),
            self.archive_path.display()
        );

        let file = File::create(&self.archive_path)?;
        // The archive may sit inside a member directory; it must not add itself
        let own_path = self.archive_path.canonicalize()?;
        let mut builder = tar::Builder::new(GzEncoder::new(file, Compression::default()));

        for member in &self.members {
            let name = member.file_name().ok_or_else(|| {
                Error::Archive(format!("{} has no file name", member.display()))
            })?;
            tracing::debug!("adding {}", member.display());

            if member.is_dir() {
                append_tree(&mut builder, member, Path::new(name), &own_path)?;
            } else if member.canonicalize()? != own_path {
                builder.append_path_with_name(member, name)?;
            }
        }

        builder.into_inner()?.finish()?;
        tracing::info!("Created {}", self.archive_path.display());
        Ok(())
    }
}

/// Add `dir` and everything below it under `name`, leaving out `own_path`
///
/// Symlinks are followed. Entries are added in file name order.
fn append_tree<W: Write>(
    builder: &mut tar::Builder<W>,
    dir: &Path,
    name: &Path,
    own_path: &Path,
) -> Result<()> {
    let mut worklist = vec![(dir.to_path_buf(), name.to_path_buf())];

    while let Some((dir, name)) = worklist.pop() {
        builder.append_dir(&name, &dir)?;

        let mut entries = std::fs::read_dir(&dir)?
            .map(|entry| entry.map(|e| e.path()))
            .collect::<std::io::Result<Vec<_>>>()?;
        entries.sort();

        for path in entries {
            let Some(file_name) = path.file_name() else {
                continue;
            };
            let entry_name = name.join(file_name);
            if path.is_dir() {
                worklist.push((path, entry_name));
            } else if path.canonicalize()? == own_path {
                tracing::debug!("skipping the archive itself at {}", path.display());
            } else {
                builder.append_path_with_name(&path, &entry_name)?;
            }
        }
    }

    Ok(())
}

/// Check an archive path, logging why it is rejected
pub fn is_valid_archive_path(archive_path: &Path) -> bool {
    match ArchiveRequest::new(archive_path, Vec::new()).validate() {
        Ok(()) => true,
        Err(e) => {
            tracing::error!("{e}");
            false
        }
    }
}

/// Build a `.tar.gz` at `archive_path` containing `members`
///
/// Returns false, after logging the cause, if the path is invalid or any
/// member cannot be added.
pub fn build_archive<P: AsRef<Path>>(archive_path: &Path, members: &[P]) -> bool {
    let request = ArchiveRequest::new(
        archive_path,
        members.iter().map(|m| m.as_ref().to_path_buf()).collect(),
    );

    match request.build() {
        Ok(()) => true,
        Err(e) => {
            tracing::error!("Failed to create archive {}: {e}", archive_path.display());
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::read::GzDecoder;
    use tempfile::TempDir;

    fn entry_names(archive_path: &Path) -> Vec<String> {
        let file = File::open(archive_path).unwrap();
        let mut archive = tar::Archive::new(GzDecoder::new(file));
        let mut names: Vec<String> = archive
            .entries()
            .unwrap()
            .map(|e| e.unwrap().path().unwrap().to_string_lossy().to_string())
            .collect();
        names.sort();
        names
    }

    #[test]
    fn test_valid_archive_path() {
        let temp_dir = TempDir::new().unwrap();
        assert!(is_valid_archive_path(&temp_dir.path().join("bundle.tar.gz")));
        assert!(is_valid_archive_path(Path::new("bundle.tar.gz")));
    }

    #[test]
    fn test_rejects_missing_parent() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("missing").join("bundle.tar.gz");
        assert!(!is_valid_archive_path(&path));
    }

    #[test]
    fn test_rejects_wrong_extension() {
        let temp_dir = TempDir::new().unwrap();
        assert!(!is_valid_archive_path(&temp_dir.path().join("bundle.tar")));
        assert!(!is_valid_archive_path(&temp_dir.path().join("bundle.tgz")));
        assert!(!is_valid_archive_path(&temp_dir.path().join("bundle.tar.gz.bak")));
    }

    #[test]
    fn test_build_flattens_member_names() {
        let temp_dir = TempDir::new().unwrap();
        let nested = temp_dir.path().join("a").join("b");
        std::fs::create_dir_all(&nested).unwrap();
        let deep_file = nested.join("deep.txt");
        let top_file = temp_dir.path().join("top.txt");
        std::fs::write(&deep_file, "deep").unwrap();
        std::fs::write(&top_file, "top").unwrap();

        let archive_path = temp_dir.path().join("out.tar.gz");
        assert!(build_archive(&archive_path, &[deep_file, top_file]));
        assert_eq!(entry_names(&archive_path), vec!["deep.txt", "top.txt"]);
    }

    #[test]
    fn test_build_adds_directory_under_its_basename() {
        let temp_dir = TempDir::new().unwrap();
        let dir = temp_dir.path().join("assets");
        std::fs::create_dir_all(dir.join("sub")).unwrap();
        std::fs::write(dir.join("sub").join("x.txt"), "x").unwrap();

        let archive_path = temp_dir.path().join("out.tar.gz");
        assert!(build_archive(&archive_path, &[&dir]));

        let names = entry_names(&archive_path);
        assert!(names.iter().all(|n| n.starts_with("assets")));
        assert!(names.iter().any(|n| n == "assets/sub/x.txt"));
    }

    #[test]
    fn test_build_skips_archive_inside_member_directory() {
        let temp_dir = TempDir::new().unwrap();
        let out = temp_dir.path().join("out");
        std::fs::create_dir_all(out.join("frames")).unwrap();
        std::fs::write(out.join("meta.json"), "{}").unwrap();
        std::fs::write(out.join("frames").join("1.jpg"), vec![7u8; 64 * 1024]).unwrap();

        let archive_path = out.join("bundle.tar.gz");
        assert!(build_archive(&archive_path, &[&out]));

        let names = entry_names(&archive_path);
        assert!(names.iter().all(|n| !n.ends_with("bundle.tar.gz")));
        assert!(names.iter().any(|n| n == "out/meta.json"));
        assert!(names.iter().any(|n| n == "out/frames/1.jpg"));

        // Archiving the same tree again must not pick up the previous bundle
        let first_len = std::fs::metadata(&archive_path).unwrap().len();
        assert!(build_archive(&archive_path, &[&out]));
        let second_len = std::fs::metadata(&archive_path).unwrap().len();
        assert!(second_len < first_len * 2);
    }

    #[test]
    fn test_build_skips_archive_listed_as_member() {
        let temp_dir = TempDir::new().unwrap();
        let file = temp_dir.path().join("f.txt");
        std::fs::write(&file, "f").unwrap();

        let archive_path = temp_dir.path().join("out.tar.gz");
        assert!(build_archive(&archive_path, &[file, archive_path.clone()]));
        assert_eq!(entry_names(&archive_path), vec!["f.txt"]);
    }

    #[test]
    fn test_build_fails_on_missing_member() {
        let temp_dir = TempDir::new().unwrap();
        let archive_path = temp_dir.path().join("out.tar.gz");
        let missing = temp_dir.path().join("nope.txt");
        assert!(!build_archive(&archive_path, &[missing]));
    }

    #[test]
    fn test_build_fails_on_invalid_path_without_writing() {
        let temp_dir = TempDir::new().unwrap();
        let file = temp_dir.path().join("f.txt");
        std::fs::write(&file, "f").unwrap();

        let archive_path = temp_dir.path().join("out.zip");
        assert!(!build_archive(&archive_path, &[file]));
        assert!(!archive_path.exists());
    }
}
