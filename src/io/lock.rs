use std::fs::{self, File, OpenOptions};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

/// Lock file name inside the grocery/ directory
pub const LOCK_FILE: &str = ".lock";

const DEFAULT_TIMEOUT: Duration = Duration::from_secs(5);

/// Advisory lock serializing writers of `list.json`.
///
/// Uses flock on Unix so the TUI's sync worker and CLI invocations never
/// interleave a read-modify-write.
pub struct ListLock {
    _file: File,
    path: PathBuf,
}

/// Error type for lock operations
#[derive(Debug, thiserror::Error)]
pub enum LockError {
    #[error("could not create lock file at {path}: {source}")]
    Create {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("timed out waiting for {path}: another gl process is writing the list")]
    Timeout { path: PathBuf },
}

impl ListLock {
    /// Take the lock in `grocery_dir`, retrying for up to `timeout`.
    pub fn acquire(grocery_dir: &Path, timeout: Duration) -> Result<Self, LockError> {
        let path = grocery_dir.join(LOCK_FILE);
        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(false)
            .open(&path)
            .map_err(|source| LockError::Create {
                path: path.clone(),
                source,
            })?;

        let start = Instant::now();
        loop {
            match try_lock(&file) {
                Ok(()) => return Ok(ListLock { _file: file, path }),
                Err(_) if start.elapsed() < timeout => {
                    std::thread::sleep(Duration::from_millis(10));
                }
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "list lock timed out");
                    return Err(LockError::Timeout { path });
                }
            }
        }
    }

    pub fn acquire_default(grocery_dir: &Path) -> Result<Self, LockError> {
        Self::acquire(grocery_dir, DEFAULT_TIMEOUT)
    }
}

impl Drop for ListLock {
    fn drop(&mut self) {
        // flock is released with the file descriptor
        let _ = fs::remove_file(&self.path);
    }
}

#[cfg(unix)]
fn try_lock(file: &File) -> Result<(), std::io::Error> {
    use std::os::unix::io::AsRawFd;
    let result = unsafe { libc::flock(file.as_raw_fd(), libc::LOCK_EX | libc::LOCK_NB) };
    if result == 0 {
        Ok(())
    } else {
        Err(std::io::Error::last_os_error())
    }
}

#[cfg(not(unix))]
fn try_lock(_file: &File) -> Result<(), std::io::Error> {
    Ok(())
}
