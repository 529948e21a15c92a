use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use walkdir::WalkDir;

use crate::error::CoreError;

pub const SCRIPT_EXTENSION: &str = "jas";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScriptFile {
    /// Path relative to the directory that was searched.
    pub path: PathBuf,
    pub contents: String,
}

/// Reads a single script.
pub fn read_script(path: impl AsRef<Path>) -> Result<String, CoreError> {
    Ok(fs::read_to_string(path)?)
}

/// Reads every `.jas` file below `root`, sorted by path.
pub fn load_scripts(root: impl AsRef<Path>) -> Result<Vec<ScriptFile>, CoreError> {
    let root = root.as_ref();
    let mut files = Vec::new();
    for entry in WalkDir::new(root).sort_by_file_name() {
        let entry = entry.map_err(io::Error::from)?;
        let path = entry.path();
        if path.is_file() && path.extension().is_some_and(|ext| ext == SCRIPT_EXTENSION) {
            let contents = read_script(path)?;
            let relative = path.strip_prefix(root).unwrap_or(path).to_path_buf();
            files.push(ScriptFile {
                path: relative,
                contents,
            });
        }
    }
    Ok(files)
}
