use std::fs::{File, OpenOptions};
use std::io::{self, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use log::debug;

/// Name of the lock file inside a data directory
pub const LOCK_FILE: &str = "write.lock";
pub const DEFAULT_LOCK_TIMEOUT: Duration = Duration::from_secs(5);

const FIRST_BACKOFF: Duration = Duration::from_millis(5);
const MAX_BACKOFF: Duration = Duration::from_millis(100);

/// Exclusive hold on a data directory for one batch of writes.
///
/// The lock is an advisory `flock` on `write.lock`. The holder's pid is
/// written into the file so a waiter can say who it is waiting for. The file
/// itself is never removed: unlinking it would let a waiter lock a file that
/// no longer has a name while a newcomer locks a fresh one.
pub struct WriteLock {
    _file: File,
    path: PathBuf,
}

/// Error type for lock operations
#[derive(Debug, thiserror::Error)]
pub enum LockError {
    #[error("could not open lock file {path}: {source}")]
    Open { path: PathBuf, source: io::Error },
    #[error("{path} is held by {}; another fm may be writing", holder_name(.holder))]
    Busy { path: PathBuf, holder: Option<u32> },
    #[error("could not lock {path}: {source}")]
    Io { path: PathBuf, source: io::Error },
}

fn holder_name(holder: &Option<u32>) -> String {
    match holder {
        Some(pid) => format!("process {}", pid),
        None => "another process".to_string(),
    }
}

impl WriteLock {
    /// Lock `dir`, retrying with growing pauses until `timeout` has passed.
    pub fn acquire(dir: &Path, timeout: Duration) -> Result<Self, LockError> {
        let path = dir.join(LOCK_FILE);
        let mut file = OpenOptions::new()
            .create(true)
            .read(true)
            .write(true)
            .truncate(false)
            .open(&path)
            .map_err(|source| LockError::Open {
                path: path.clone(),
                source,
            })?;

        let deadline = Instant::now() + timeout;
        let mut pause = FIRST_BACKOFF;
        loop {
            let locked = try_lock(&file).map_err(|source| LockError::Io {
                path: path.clone(),
                source,
            })?;
            if locked {
                break;
            }
            let now = Instant::now();
            if now >= deadline {
                return Err(LockError::Busy {
                    holder: read_holder(&mut file),
                    path,
                });
            }
            std::thread::sleep(pause.min(deadline - now));
            pause = (pause * 2).min(MAX_BACKOFF);
        }

        record_holder(&mut file).map_err(|source| LockError::Io {
            path: path.clone(),
            source,
        })?;
        debug!("locked {}", path.display());
        Ok(WriteLock { _file: file, path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Drop for WriteLock {
    fn drop(&mut self) {
        // flock is released with the descriptor
        debug!("unlocked {}", self.path.display());
    }
}

fn record_holder(file: &mut File) -> io::Result<()> {
    file.set_len(0)?;
    file.seek(SeekFrom::Start(0))?;
    writeln!(file, "{}", std::process::id())?;
    file.flush()
}

fn read_holder(file: &mut File) -> Option<u32> {
    let mut text = String::new();
    file.seek(SeekFrom::Start(0)).ok()?;
    file.read_to_string(&mut text).ok()?;
    text.trim().parse().ok()
}

/// `Ok(false)` when someone else holds the lock
#[cfg(unix)]
fn try_lock(file: &File) -> io::Result<bool> {
    use std::os::unix::io::AsRawFd;
    let result = unsafe { libc::flock(file.as_raw_fd(), libc::LOCK_EX | libc::LOCK_NB) };
    if result == 0 {
        return Ok(true);
    }
    let err = io::Error::last_os_error();
    if err.kind() == io::ErrorKind::WouldBlock {
        Ok(false)
    } else {
        Err(err)
    }
}

#[cfg(not(unix))]
fn try_lock(_file: &File) -> io::Result<bool> {
    Ok(true)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn lock_file_stays_and_names_the_holder() {
        let tmp = TempDir::new().unwrap();
        let lock = WriteLock::acquire(tmp.path(), DEFAULT_LOCK_TIMEOUT).unwrap();
        let recorded = std::fs::read_to_string(lock.path()).unwrap();
        assert_eq!(recorded.trim(), std::process::id().to_string());
        drop(lock);

        assert!(tmp.path().join(LOCK_FILE).exists());
        assert!(WriteLock::acquire(tmp.path(), DEFAULT_LOCK_TIMEOUT).is_ok());
    }

    #[cfg(unix)]
    #[test]
    fn busy_lock_reports_its_holder() {
        let tmp = TempDir::new().unwrap();
        let _held = WriteLock::acquire(tmp.path(), DEFAULT_LOCK_TIMEOUT).unwrap();

        let started = Instant::now();
        let err = WriteLock::acquire(tmp.path(), Duration::from_millis(40))
            .err()
            .unwrap();
        assert!(started.elapsed() >= Duration::from_millis(40));
        match err {
            LockError::Busy { holder, .. } => assert_eq!(holder, Some(std::process::id())),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn missing_directory_is_an_open_error() {
        let tmp = TempDir::new().unwrap();
        let gone = tmp.path().join("nope");
        assert!(matches!(
            WriteLock::acquire(&gone, DEFAULT_LOCK_TIMEOUT),
            Err(LockError::Open { .. })
        ));
    }
}
