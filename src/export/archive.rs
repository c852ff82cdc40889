//! Archive sinks: the last step of an export.
//!
//! Packaging is all-or-nothing. A sink either delivers every file or leaves
//! nothing behind.

use crate::error::ResourceError;
use std::ffi::OsString;
use std::path::{Component, Path, PathBuf};

/// One generated file. `path` is relative and `/`-separated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveFile {
    pub path: String,
    pub bytes: Vec<u8>,
}

impl ArchiveFile {
    pub fn new(path: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            path: path.into(),
            bytes: bytes.into(),
        }
    }
}

/// Where a delivered archive can be found.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ArchiveHandle {
    Memory { files: usize },
    Directory(PathBuf),
}

#[allow(async_fn_in_trait)]
pub trait ArchiveSink {
    async fn package_and_deliver(
        &mut self,
        files: Vec<ArchiveFile>,
    ) -> Result<ArchiveHandle, ResourceError>;
}

/// Keeps delivered files in memory.
#[derive(Debug, Default)]
pub struct MemoryArchive {
    files: Vec<ArchiveFile>,
}

impl MemoryArchive {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn files(&self) -> &[ArchiveFile] {
        &self.files
    }

    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.files.iter().map(|f| f.path.as_str())
    }

    pub fn get(&self, path: &str) -> Option<&[u8]> {
        self.files
            .iter()
            .find(|f| f.path == path)
            .map(|f| f.bytes.as_slice())
    }

    pub fn get_str(&self, path: &str) -> Option<&str> {
        self.get(path).and_then(|b| std::str::from_utf8(b).ok())
    }

    pub fn is_empty(&self) -> bool {
        self.files.is_empty()
    }
}

impl ArchiveSink for MemoryArchive {
    async fn package_and_deliver(
        &mut self,
        files: Vec<ArchiveFile>,
    ) -> Result<ArchiveHandle, ResourceError> {
        self.files = files;
        Ok(ArchiveHandle::Memory {
            files: self.files.len(),
        })
    }
}

/// Writes the archive as a directory tree. Files are staged under
/// `<dest>.partial` and renamed into place once all of them are written.
#[derive(Debug, Clone)]
pub struct DirectoryArchive {
    dest: PathBuf,
}

impl DirectoryArchive {
    pub fn new(dest: impl Into<PathBuf>) -> Self {
        Self { dest: dest.into() }
    }

    pub fn dest(&self) -> &Path {
        &self.dest
    }

    pub fn staging_dir(&self) -> PathBuf {
        let mut name: OsString = self.dest.as_os_str().to_owned();
        name.push(".partial");
        PathBuf::from(name)
    }

    async fn write_all(&self, staging: &Path, files: &[ArchiveFile]) -> Result<(), ResourceError> {
        tokio::fs::create_dir_all(staging)
            .await
            .map_err(|e| ResourceError::io(staging, e))?;
        for file in files {
            let target = staging.join(relative_path(&file.path)?);
            if let Some(parent) = target.parent() {
                tokio::fs::create_dir_all(parent)
                    .await
                    .map_err(|e| ResourceError::io(parent, e))?;
            }
            tokio::fs::write(&target, &file.bytes)
                .await
                .map_err(|e| ResourceError::io(&target, e))?;
        }
        tokio::fs::rename(staging, &self.dest)
            .await
            .map_err(|e| ResourceError::io(&self.dest, e))
    }
}

/// Reject absolute paths and `..` so archive entries stay inside the root.
fn relative_path(path: &str) -> Result<PathBuf, ResourceError> {
    let rel = Path::new(path);
    if rel
        .components()
        .all(|c| matches!(c, Component::Normal(_) | Component::CurDir))
    {
        Ok(rel.to_path_buf())
    } else {
        Err(ResourceError::corrupt(rel, "archive entry escapes the archive root"))
    }
}

impl ArchiveSink for DirectoryArchive {
    async fn package_and_deliver(
        &mut self,
        files: Vec<ArchiveFile>,
    ) -> Result<ArchiveHandle, ResourceError> {
        if tokio::fs::try_exists(&self.dest)
            .await
            .map_err(|e| ResourceError::io(&self.dest, e))?
        {
            return Err(ResourceError::Unavailable(format!(
                "{} already exists",
                self.dest.display()
            )));
        }

        let staging = self.staging_dir();
        if tokio::fs::try_exists(&staging)
            .await
            .map_err(|e| ResourceError::io(&staging, e))?
        {
            log::warn!("Removing stale staging directory {}", staging.display());
            tokio::fs::remove_dir_all(&staging)
                .await
                .map_err(|e| ResourceError::io(&staging, e))?;
        }

        match self.write_all(&staging, &files).await {
            Ok(()) => {
                log::info!("Wrote {} files to {}", files.len(), self.dest.display());
                Ok(ArchiveHandle::Directory(self.dest.clone()))
            }
            Err(e) => {
                if let Err(cleanup) = tokio::fs::remove_dir_all(&staging).await {
                    log::warn!("Failed to remove {}: {}", staging.display(), cleanup);
                }
                Err(e)
            }
        }
    }
}
