//! Runtime marker directories
//!
//! Clients check for `<run>/<prefix>/seats` to decide whether a login1
//! implementation is running, and watch `seats`/`sessions` for changes.

use std::fs::DirBuilder;
use std::io;
use std::os::unix::fs::DirBuilderExt;
use std::path::{Path, PathBuf};

/// ConsoleKit session ids are object paths, so per-session markers nest
/// below this namespace.
const MULTI_SESSION_NAMESPACE: &str = "org/freedesktop/ConsoleKit";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MarkerDirs {
    root: PathBuf,
}

impl MarkerDirs {
    pub fn new(run_dir: impl AsRef<Path>, prefix: &str) -> Self {
        Self {
            root: run_dir.as_ref().join(prefix),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn seats(&self) -> PathBuf {
        self.root.join("seats")
    }

    pub fn sessions(&self) -> PathBuf {
        self.root.join("sessions")
    }

    pub fn multi_session(&self) -> PathBuf {
        self.root.join("multi-session-x").join(MULTI_SESSION_NAMESPACE)
    }

    /// Create all marker directories (0755). Existing ones are left alone.
    pub fn create(&self) -> io::Result<()> {
        let mut builder = DirBuilder::new();
        builder.recursive(true).mode(0o755);

        for dir in [self.seats(), self.sessions(), self.multi_session()] {
            builder.create(&dir)?;
            log::debug!("Marker directory {} ready", dir.display());
        }
        Ok(())
    }

    pub fn exist(&self) -> bool {
        [self.seats(), self.sessions(), self.multi_session()]
            .iter()
            .all(|dir| dir.is_dir())
    }
}

impl Default for MarkerDirs {
    fn default() -> Self {
        Self::new("/run", "systemd")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_layout() {
        let markers = MarkerDirs::default();
        assert_eq!(markers.seats(), PathBuf::from("/run/systemd/seats"));
        assert_eq!(markers.sessions(), PathBuf::from("/run/systemd/sessions"));
        assert_eq!(
            markers.multi_session(),
            PathBuf::from("/run/systemd/multi-session-x/org/freedesktop/ConsoleKit")
        );
    }
}
