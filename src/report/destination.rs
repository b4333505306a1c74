use std::fs::OpenOptions;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

/// Somewhere report bytes can be appended
pub trait ReportDestination: Send + Sync {
    /// Whether anything was written before; decides if the header goes first
    fn exists(&self) -> bool;

    /// Append `bytes` in one write. Any error is treated as transient.
    fn append(&self, bytes: &[u8]) -> io::Result<()>;

    /// Name shown in logs and operator prompts
    fn describe(&self) -> String;
}

/// CSV file on disk, created on first append
#[derive(Debug, Clone)]
pub struct FileDestination {
    path: PathBuf,
}

impl FileDestination {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl ReportDestination for FileDestination {
    fn exists(&self) -> bool {
        self.path.exists()
    }

    fn append(&self, bytes: &[u8]) -> io::Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                std::fs::create_dir_all(parent)?;
            }
        }
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        file.write_all(bytes)?;
        file.flush()
    }

    fn describe(&self) -> String {
        self.path.display().to_string()
    }
}
