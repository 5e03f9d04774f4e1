use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use walkdir::WalkDir;
use zip::ZipArchive;

/// Create the parent directory of `path` if it doesn’t exist; error if a non-directory exists there.
pub fn ensure_parent_dir(path: &Path) -> Result<()> {
    let Some(parent) = path.parent().filter(|parent| !parent.as_os_str().is_empty()) else {
        return Ok(())
    };
    if parent.exists() {
        if !parent.is_dir() {
            bail!("Path exists but is not a directory: {}", parent.display());
        }
    } else {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory {}", parent.display()))?;
    }
    Ok(())
}

/// Error if `path` exists and overwriting was not requested.
pub fn require_writable(path: &Path, force: bool) -> Result<()> {
    if path.exists() && !force {
        bail!("Output already exists (use --force to overwrite): {}", path.display());
    }
    Ok(())
}

/// Extracts the given `.zip` file to the target directory.
pub fn extract_zip(zip_path: &Path, dest_dir: &Path) -> Result<()> {
    let file = fs::File::open(zip_path)
        .with_context(|| format!("failed to open {}", zip_path.display()))?;
    let mut archive = ZipArchive::new(file)
        .with_context(|| format!("failed to read zip archive {}", zip_path.display()))?;

    archive
        .extract(dest_dir)
        .with_context(|| format!("failed to extract {} to {}", zip_path.display(), dest_dir.display()))?;

    Ok(())
}

/// Find the first file with the given extension under `dir`, searching recursively in
/// sorted path order so the choice is reproducible.
pub fn find_file_with_extension(dir: &Path, extension: &str) -> Result<Option<PathBuf>> {
    for entry in WalkDir::new(dir).sort_by_file_name() {
        let entry = entry.with_context(|| format!("failed to list {}", dir.display()))?;
        let matches = entry.path().extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case(extension));
        if entry.file_type().is_file() && matches {
            return Ok(Some(entry.into_path()));
        }
    }
    Ok(None)
}
