pub mod credentials;
pub mod ledger;
pub mod settings;

use anyhow::{Context, Result};
use std::fs;
use std::path::{Path, PathBuf};

/// Lets `write` fill a sibling temp file, then renames it over `path` so a
/// crash mid-write leaves the previous file intact.
pub(crate) fn replace_file(path: &Path, write: impl FnOnce(&Path) -> Result<()>) -> Result<()> {
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Create directory {}", parent.display()))?;
        }
    }
    let tmp = temp_path(path);
    write(&tmp)?;
    fs::rename(&tmp, path).with_context(|| format!("Replace {}", path.display()))?;
    Ok(())
}

fn temp_path(path: &Path) -> PathBuf {
    let mut name = path
        .file_name()
        .map(|n| n.to_os_string())
        .unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}
