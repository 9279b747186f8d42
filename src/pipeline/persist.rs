//! Artifact writers: `<stem>.png` and `<stem>.json`.
//!
//! Both writers overwrite an existing file of the same name. The JSON writer
//! goes through a temp file + rename so a crash mid-write never leaves a
//! truncated result behind for a downstream reader to pick up.

use serde::Serialize;
use std::io;
use std::path::{Path, PathBuf};
use tracing::debug;

/// Write PNG bytes to `<dir>/<stem>.png`.
pub fn write_image(dir: &Path, stem: &str, png: &[u8]) -> io::Result<PathBuf> {
    let path = dir.join(format!("{stem}.png"));
    std::fs::write(&path, png)?;
    debug!("Wrote {} bytes to {}", png.len(), path.display());
    Ok(path)
}

/// Serialise `value` as UTF-8 JSON, 2-space indented, non-ASCII unescaped.
pub fn to_pretty_json<T: Serialize>(value: &T) -> serde_json::Result<String> {
    serde_json::to_string_pretty(value)
}

/// Write `value` to `<dir>/<stem>.json` atomically.
pub fn write_json<T: Serialize>(dir: &Path, stem: &str, value: &T) -> io::Result<PathBuf> {
    let path = dir.join(format!("{stem}.json"));
    let tmp_path = dir.join(format!("{stem}.json.tmp"));

    let text = to_pretty_json(value)?;
    if let Err(e) =
        std::fs::write(&tmp_path, text.as_bytes()).and_then(|()| std::fs::rename(&tmp_path, &path))
    {
        let _ = std::fs::remove_file(&tmp_path);
        return Err(e);
    }

    debug!("Wrote {}", path.display());
    Ok(path)
}
