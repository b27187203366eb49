use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::Local;
use serde::Serialize;

/// Pretty-print `value` to `dir/filename` through a temp file and rename, so
/// the graphics layer never reads a half-written document.
pub fn write_json<T: Serialize + ?Sized>(dir: &Path, filename: &str, value: &T) -> Result<PathBuf> {
    fs::create_dir_all(dir).with_context(|| format!("create output dir {}", dir.display()))?;
    let path = dir.join(filename);
    let tmp = path.with_extension("json.tmp");
    let json = serde_json::to_string_pretty(value).context("serialize output document")?;
    fs::write(&tmp, json).with_context(|| format!("write {}", tmp.display()))?;
    fs::rename(&tmp, &path).with_context(|| format!("swap {}", path.display()))?;
    log::info!("wrote {}", path.display());
    Ok(path)
}

/// Write `latest_<stem>.json`, plus a timestamped `<stem>_<YYYYmmdd_HHMMSS>.json`
/// copy when `keep_history` is set. Returns the latest path.
pub fn write_json_with_history<T: Serialize + ?Sized>(
    dir: &Path,
    stem: &str,
    value: &T,
    keep_history: bool,
) -> Result<PathBuf> {
    if keep_history {
        let stamp = Local::now().format("%Y%m%d_%H%M%S");
        write_json(dir, &format!("{stem}_{stamp}.json"), value)?;
    }
    write_json(dir, &format!("latest_{stem}.json"), value)
}
