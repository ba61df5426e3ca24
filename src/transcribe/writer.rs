use std::path::{Path, PathBuf};

use crate::error::{Error, Result};

pub const TRANSCRIPT_EXTENSION: &str = "txt";

/// Path of the transcript file for `title` inside `dir`.
pub fn transcript_path(dir: &Path, title: &str) -> Result<PathBuf> {
    if title.trim().is_empty()
        || title == "."
        || title == ".."
        || title.contains(['/', '\\'])
    {
        return Err(Error::InvalidTitle(title.to_string()));
    }
    Ok(dir.join(format!("{}.{}", title, TRANSCRIPT_EXTENSION)))
}

/// Write `text` to `<dir>/<title>.txt`, replacing any previous contents.
pub fn write_transcript(dir: &Path, title: &str, text: &str) -> Result<PathBuf> {
    let path = transcript_path(dir, title)?;
    std::fs::create_dir_all(dir).map_err(|e| Error::io(dir, e))?;
    std::fs::write(&path, text).map_err(|e| Error::io(&path, e))?;
    Ok(path)
}
