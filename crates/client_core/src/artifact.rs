use std::{
    io::ErrorKind,
    path::{Path, PathBuf},
};

use async_trait::async_trait;
use tempfile::TempPath;
use tokio::io::AsyncWriteExt;
use tracing::{info, warn};

use crate::error::ArtifactError;

const MAX_NAME_ATTEMPTS: usize = 1000;

/// Turns response bytes into a named file the user can open.
#[async_trait]
pub trait ArtifactSink: Send + Sync {
    async fn materialize(&self, filename: &str, bytes: &[u8]) -> Result<PathBuf, ArtifactError>;
}

/// Saves artifacts into a download directory.
pub struct DirectorySink {
    dir: PathBuf,
}

impl DirectorySink {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }
}

fn candidate_names(filename: &str) -> impl Iterator<Item = String> + '_ {
    let path = Path::new(filename);
    let stem = path
        .file_stem()
        .map(|stem| stem.to_string_lossy().into_owned())
        .unwrap_or_else(|| filename.to_string());
    let extension = path
        .extension()
        .map(|ext| format!(".{}", ext.to_string_lossy()))
        .unwrap_or_default();

    std::iter::once(filename.to_string())
        .chain((1..=MAX_NAME_ATTEMPTS).map(move |n| format!("{stem} ({n}){extension}")))
}

fn validate_name(filename: &str) -> Result<(), ArtifactError> {
    let mut components = Path::new(filename).components();
    match (components.next(), components.next()) {
        (Some(std::path::Component::Normal(_)), None) if !filename.starts_with('.') => Ok(()),
        _ => Err(ArtifactError::InvalidName(filename.to_string())),
    }
}

/// Writes `bytes` to a uniquely named staging file in `dir`. The file is
/// removed when the returned path is dropped without being persisted.
async fn stage(dir: &Path, filename: &str, bytes: &[u8]) -> Result<TempPath, ArtifactError> {
    let staged = tempfile::Builder::new()
        .prefix(&format!(".{filename}."))
        .suffix(".part")
        .tempfile_in(dir)
        .map_err(|source| ArtifactError::Write {
            path: dir.join(filename),
            source,
        })?;
    let (file, path) = staged.into_parts();
    let write_err = |source| ArtifactError::Write {
        path: path.to_path_buf(),
        source,
    };

    let mut file = tokio::fs::File::from_std(file);
    file.write_all(bytes).await.map_err(write_err)?;
    file.sync_all().await.map_err(write_err)?;
    drop(file);
    Ok(path)
}

#[async_trait]
impl ArtifactSink for DirectorySink {
    async fn materialize(&self, filename: &str, bytes: &[u8]) -> Result<PathBuf, ArtifactError> {
        validate_name(filename)?;
        tokio::fs::create_dir_all(&self.dir)
            .await
            .map_err(|source| ArtifactError::Directory {
                dir: self.dir.clone(),
                source,
            })?;

        let mut staged = stage(&self.dir, filename, bytes).await?;
        for name in candidate_names(filename) {
            let destination = self.dir.join(name);
            match staged.persist_noclobber(&destination) {
                Ok(()) => {
                    info!(
                        "artifact: saved {} ({} bytes)",
                        destination.display(),
                        bytes.len()
                    );
                    return Ok(destination);
                }
                Err(err) if err.error.kind() == ErrorKind::AlreadyExists => staged = err.path,
                Err(err) => {
                    return Err(ArtifactError::Write {
                        path: destination,
                        source: err.error,
                    })
                }
            }
        }
        warn!("artifact: every name for {filename} is taken, dropping staged copy");
        Err(ArtifactError::Exhausted(filename.to_string()))
    }
}

#[cfg(test)]
#[path = "tests/artifact_tests.rs"]
mod tests;
