//! Sandboxed temp-file store for generated PEM material.

use std::io::Write;
use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex, PoisonError};

use tempfile::TempDir;
use tracing::{debug, warn};

use crate::error::{CaError, Result};

/// Owns the temporary key/cert files of one audit run.
///
/// Files land in a private directory (0700 on unix, files 0600) and are
/// deleted by [`FileBag::close`], which the controller invokes on normal
/// exit and on stop. Clones share the same underlying directory.
#[derive(Debug, Clone)]
pub struct FileBag {
    inner: Arc<Inner>,
}

#[derive(Debug)]
struct Inner {
    dir: Mutex<Option<TempDir>>,
    seq: AtomicUsize,
}

impl FileBag {
    /// Create a fresh bag backed by a private temp directory.
    pub fn new() -> Result<Self> {
        let dir = tempfile::Builder::new().prefix("badcert-").tempdir()?;
        debug!(path = %dir.path().display(), "file bag opened");
        Ok(Self {
            inner: Arc::new(Inner {
                dir: Mutex::new(Some(dir)),
                seq: AtomicUsize::new(0),
            }),
        })
    }

    /// Directory holding the bag's files, `None` once closed.
    pub fn path(&self) -> Option<PathBuf> {
        let guard = self.inner.dir.lock().unwrap_or_else(PoisonError::into_inner);
        guard.as_ref().map(|d| d.path().to_path_buf())
    }

    /// Persist `bytes` under a fresh name derived from `name_hint`.
    ///
    /// The file is readable only by the running user.
    pub fn write_temp(&self, name_hint: &str, bytes: &[u8]) -> Result<PathBuf> {
        let guard = self.inner.dir.lock().unwrap_or_else(PoisonError::into_inner);
        let dir = guard.as_ref().ok_or_else(|| {
            CaError::Io(std::io::Error::other("file bag is closed"))
        })?;

        let seq = self.inner.seq.fetch_add(1, Ordering::Relaxed);
        let path = dir.path().join(format!("{seq:03}-{}", sanitize(name_hint)));

        let mut opts = std::fs::OpenOptions::new();
        opts.write(true).create_new(true);
        #[cfg(unix)]
        {
            use std::os::unix::fs::OpenOptionsExt;
            opts.mode(0o600);
        }
        let mut file = opts.open(&path)?;
        file.write_all(bytes)?;
        Ok(path)
    }

    /// Delete the directory and everything in it. Idempotent; failures are
    /// logged, never raised.
    pub fn close(&self) {
        let taken = {
            let mut guard = self.inner.dir.lock().unwrap_or_else(PoisonError::into_inner);
            guard.take()
        };
        if let Some(dir) = taken {
            let path = dir.path().to_path_buf();
            if let Err(e) = dir.close() {
                warn!(path = %path.display(), error = %e, "file bag cleanup failed");
            } else {
                debug!(path = %path.display(), "file bag closed");
            }
        }
    }
}

/// Keep hints filesystem-safe; CNs may contain wildcards and the like.
fn sanitize(hint: &str) -> String {
    hint.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect()
}
