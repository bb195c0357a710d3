use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use serde::Serialize;
use serde_json::Value;

use crate::config::PLAYLIST_KEY;
use crate::error::ScrapeError;
use crate::parser::Playlist;

/// Pretty JSON (2-space indent, non-ASCII unescaped) with a trailing newline.
pub fn to_pretty_json<T: Serialize + ?Sized>(data: &T) -> Result<String> {
    let mut out = serde_json::to_string_pretty(data)?;
    out.push('\n');
    Ok(out)
}

pub fn write_json<T: Serialize + ?Sized>(path: &Path, data: &T) -> Result<()> {
    fs::write(path, to_pretty_json(data)?)
        .with_context(|| format!("Failed to write {}", path.display()))
}

pub fn load_json(path: &Path) -> Result<Value> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&text).with_context(|| format!("Invalid JSON in {}", path.display()))
}

/// Replace the playlist key of the sidecar document, keeping every other key
/// and the existing key order.
pub fn merge_playlist(path: &Path, playlist: &Playlist) -> Result<()> {
    if !path.exists() {
        return Err(ScrapeError::MissingSidecar(path.to_path_buf()).into());
    }

    let mut doc = load_json(path)?;
    let obj = doc
        .as_object_mut()
        .with_context(|| format!("{} does not hold a JSON object", path.display()))?;
    obj.insert(PLAYLIST_KEY.to_string(), serde_json::to_value(playlist)?);

    write_json(path, &doc)
}
