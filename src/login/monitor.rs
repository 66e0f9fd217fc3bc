//! Change notification for seats and sessions
//!
//! The daemon's marker directories double as notification channels: a
//! monitor is an inotify watch on `<root>/<category>s`.

use std::io::ErrorKind;
use std::os::fd::{AsFd, AsRawFd, BorrowedFd, RawFd};
use std::path::{Path, PathBuf};

use inotify::{Inotify, WatchMask};

use crate::error::{LoginError, Result};

pub const DEFAULT_ROOT: &str = "/run/systemd";
pub const DEFAULT_CATEGORY: &str = "seat";

pub struct LoginMonitor {
    inotify: Inotify,
    path: PathBuf,
}

impl LoginMonitor {
    /// Watch `/run/systemd/<category>s`; no category means seats
    pub fn new(category: Option<&str>) -> Result<Self> {
        Self::with_root(DEFAULT_ROOT, category)
    }

    pub fn with_root(root: impl AsRef<Path>, category: Option<&str>) -> Result<Self> {
        let category = category.unwrap_or(DEFAULT_CATEGORY);
        if category.is_empty() || category.contains('/') {
            return Err(LoginError::InvalidArgument(format!(
                "bad monitor category '{}'",
                category
            )));
        }

        let path = root.as_ref().join(format!("{}s", category));
        log::debug!("Creating a {} monitor on {}", category, path.display());

        let inotify = Inotify::init()?;
        inotify
            .watches()
            .add(&path, WatchMask::CREATE | WatchMask::DELETE)?;

        Ok(Self { inotify, path })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The descriptor to poll
    pub fn fd(&self) -> RawFd {
        self.inotify.as_raw_fd()
    }

    /// poll(2) events to wait for
    pub fn events(&self) -> i32 {
        i32::from(libc::POLLIN | libc::POLLERR)
    }

    /// Timeout in microseconds; there is none
    pub fn timeout(&self) -> u64 {
        u64::MAX
    }

    /// Discard queued events without blocking. Returns how many were dropped.
    pub fn flush(&mut self) -> Result<usize> {
        let mut buffer = [0u8; 4096];
        let mut drained = 0;

        loop {
            match self.inotify.read_events(&mut buffer) {
                Ok(events) => {
                    let n = events.count();
                    if n == 0 {
                        break;
                    }
                    drained += n;
                }
                Err(e) if e.kind() == ErrorKind::WouldBlock => break,
                Err(e) => return Err(e.into()),
            }
        }

        Ok(drained)
    }
}

impl AsFd for LoginMonitor {
    fn as_fd(&self) -> BorrowedFd<'_> {
        self.inotify.as_fd()
    }
}
