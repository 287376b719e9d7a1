//! Loading and atomically storing index documents

use std::fs::{self, File};
use std::io::{self, BufReader, Write};
use std::path::{Path, PathBuf};

use tempfile::NamedTempFile;
use tracing::{debug, info, warn};

use crate::config::{DEFAULT_TEMP_SUFFIX, StoreConfig};
use crate::index::error::IndexError;
use crate::index::ops::IndexStorer;
use crate::index::types::RepoIndex;

/// Read and decode the index document at `path`
pub fn load(path: &Path) -> Result<RepoIndex, IndexError> {
    debug!("Loading index document from {:?}", path);

    let file = File::open(path).map_err(|source| IndexError::DocumentUnavailable {
        path: path.to_path_buf(),
        source,
    })?;

    let index: RepoIndex = serde_json::from_reader(BufReader::new(file)).map_err(|source| {
        // A read failure after open is an availability problem, not bad content
        if source.is_io() {
            IndexError::DocumentUnavailable {
                path: path.to_path_buf(),
                source: source.into(),
            }
        } else {
            IndexError::DocumentMalformed {
                path: path.to_path_buf(),
                source,
            }
        }
    })?;

    info!(
        "Loaded index from {:?}: {} apps, {} packages",
        path,
        index.apps.len(),
        index.packages.len()
    );
    Ok(index)
}

/// Serialize the index document, terminated by a newline
pub fn encode(index: &RepoIndex, config: &StoreConfig) -> Result<Vec<u8>, IndexError> {
    let mut bytes = if config.pretty {
        serde_json::to_vec_pretty(index)
    } else {
        serde_json::to_vec(index)
    }
    .map_err(IndexError::EncodingFailed)?;

    bytes.push(b'\n');
    Ok(bytes)
}

/// Write the index document to `path` without ever exposing a partial file
///
/// The document is written to a uniquely named sibling temp file which is
/// then renamed over `path`. On failure `path` is left untouched and the temp
/// file is removed.
pub fn store(path: &Path, index: &RepoIndex, config: &StoreConfig) -> Result<(), IndexError> {
    let bytes = encode(index, config)?;
    write_atomically(path, config, |file| file.write_all(&bytes))?;

    info!("Stored index to {:?} ({} bytes)", path, bytes.len());
    Ok(())
}

fn write_atomically<F>(path: &Path, config: &StoreConfig, write: F) -> Result<(), IndexError>
where
    F: FnOnce(&mut File) -> io::Result<()>,
{
    let dir = parent_dir(path);
    let storage_failed = |path: &Path, source| IndexError::StorageFailed {
        path: path.to_path_buf(),
        source,
    };

    // Dropping `temp` on any early return deletes the temp file
    let mut temp = create_temp(path, dir, &config.temp_suffix)
        .map_err(|source| storage_failed(dir, source))?;
    debug!("Writing index to temp file {:?}", temp.path());

    let written = copy_permissions(path, temp.as_file())
        .and_then(|()| write(temp.as_file_mut()))
        .and_then(|()| temp.as_file_mut().flush())
        .and_then(|()| {
            if config.fsync {
                temp.as_file().sync_all()
            } else {
                Ok(())
            }
        });
    if let Err(source) = written {
        return Err(storage_failed(temp.path(), source));
    }

    temp.persist(path).map_err(|e| storage_failed(path, e.error))?;

    if config.fsync {
        if let Err(e) = fsync_dir(dir) {
            warn!("Failed to sync directory {:?}: {}", dir, e);
        }
    }
    Ok(())
}

/// Create a uniquely named temp file `.<file name>.<random><suffix>` next to
/// the target, so the final rename never crosses filesystems
fn create_temp(path: &Path, dir: &Path, suffix: &str) -> io::Result<NamedTempFile> {
    let suffix = if suffix.is_empty() {
        DEFAULT_TEMP_SUFFIX
    } else {
        suffix
    };
    let file_name = path
        .file_name()
        .and_then(|name| name.to_str())
        .unwrap_or("index");
    let prefix = format!(".{}.", file_name);

    tempfile::Builder::new()
        .prefix(&prefix)
        .suffix(suffix)
        .tempfile_in(dir)
}

fn parent_dir(path: &Path) -> &Path {
    match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    }
}

/// Keep the target's permissions; a new target gets the usual 0644
fn copy_permissions(target: &Path, temp: &File) -> io::Result<()> {
    match fs::metadata(target) {
        Ok(metadata) => temp.set_permissions(metadata.permissions()),
        Err(e) if e.kind() == io::ErrorKind::NotFound => set_default_permissions(temp),
        Err(e) => Err(e),
    }
}

#[cfg(unix)]
fn set_default_permissions(temp: &File) -> io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    temp.set_permissions(fs::Permissions::from_mode(0o644))
}

#[cfg(not(unix))]
fn set_default_permissions(_temp: &File) -> io::Result<()> {
    Ok(())
}

fn fsync_dir(dir: &Path) -> io::Result<()> {
    File::open(dir)?.sync_all()
}

/// Index document stored in a single file
#[derive(Debug, Clone)]
pub struct FileIndexStore {
    path: PathBuf,
    config: StoreConfig,
}

impl FileIndexStore {
    pub fn new(path: impl Into<PathBuf>, config: StoreConfig) -> Self {
        Self {
            path: path.into(),
            config,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl IndexStorer for FileIndexStore {
    fn load(&self) -> Result<RepoIndex, IndexError> {
        load(&self.path)
    }

    fn store(&self, index: &RepoIndex) -> Result<(), IndexError> {
        store(&self.path, index, &self.config)
    }
}
