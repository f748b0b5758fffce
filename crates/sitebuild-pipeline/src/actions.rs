//! Filesystem operations performed between delegated commands.

use std::io;
use std::path::{Path, PathBuf};

use tokio::fs;
use walkdir::WalkDir;

/// Remove `dir` recursively if it exists, then recreate it empty.
pub async fn clean_output_dir(dir: &Path) -> io::Result<()> {
    if fs::try_exists(dir).await? {
        tracing::debug!("Removing {}", dir.display());
        fs::remove_dir_all(dir).await?;
    }
    fs::create_dir_all(dir).await
}

/// Copy `source` into `dest_dir`, keeping its file name.
///
/// Returns `Ok(None)` when `source` does not exist; the caller decides how
/// loudly to complain. Any other failure is an error.
pub async fn copy_asset(source: &Path, dest_dir: &Path) -> io::Result<Option<PathBuf>> {
    if !fs::try_exists(source).await? {
        return Ok(None);
    }

    let file_name = source.file_name().ok_or_else(|| {
        io::Error::new(
            io::ErrorKind::InvalidInput,
            format!("{} has no file name", source.display()),
        )
    })?;
    let dest = dest_dir.join(file_name);

    fs::copy(source, &dest).await?;
    Ok(Some(dest))
}

/// Whether the expected build artifact is present.
pub async fn verify_artifact(artifact: &Path) -> io::Result<bool> {
    fs::try_exists(artifact).await
}

/// Number of regular files below `dir`.
pub fn count_files(dir: &Path) -> usize {
    WalkDir::new(dir)
        .into_iter()
        .filter_map(|e| e.ok())
        .filter(|e| e.file_type().is_file())
        .count()
}
