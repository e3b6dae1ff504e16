pub mod output;
pub mod traits;
pub mod walker;

// Re-export I/O traits for convenient access
pub use traits::{FileSystem, MemoryFileSystem, OsFileSystem};

use anyhow::Result;
use std::fs;
use std::path::Path;

pub fn read_file(path: &Path) -> Result<String> {
    Ok(fs::read_to_string(path)?)
}

pub fn write_file(path: &Path, content: &str) -> Result<()> {
    fs::write(path, content)?;
    Ok(())
}
