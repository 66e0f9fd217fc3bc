//! Error types shared by the daemon and the client library
//!
//! Every failure surfaces as one of a handful of kinds:
//! - the bus could not be reached
//! - the backing service answered with an error or an unexpected reply
//! - the requested field has no ConsoleKit counterpart
//! - the caller passed something malformed

use zbus::fdo;

pub type Result<T> = std::result::Result<T, LoginError>;

#[derive(Debug, thiserror::Error)]
pub enum LoginError {
    #[error("System bus unavailable: {0}")]
    BusUnavailable(String),

    #[error("{method}() failed: {message}")]
    Backend { method: &'static str, message: String },

    #[error("Not provided by ConsoleKit: {0}")]
    NotModelled(&'static str),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("No such session: {0}")]
    NotFound(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl LoginError {
    /// Build a backend error and log it; callers never log it again.
    pub fn backend(method: &'static str, err: impl std::fmt::Display) -> Self {
        let message = err.to_string();
        log::warn!("{}() failed: {}", method, message);
        Self::Backend { method, message }
    }

    /// Negative errno for the C calling convention
    pub fn errno(&self) -> i32 {
        match self {
            Self::NotFound(_) => -libc::ENOENT,
            Self::Io(e) => -e.raw_os_error().unwrap_or(libc::EIO),
            Self::BusUnavailable(_)
            | Self::Backend { .. }
            | Self::NotModelled(_)
            | Self::InvalidArgument(_) => -libc::EINVAL,
        }
    }
}

impl From<nix::Error> for LoginError {
    fn from(e: nix::Error) -> Self {
        Self::Io(std::io::Error::from(e))
    }
}

impl From<LoginError> for fdo::Error {
    fn from(e: LoginError) -> Self {
        match e {
            LoginError::InvalidArgument(msg) => fdo::Error::InvalidArgs(msg),
            LoginError::NotFound(id) => fdo::Error::Failed(format!("No session '{}' known", id)),
            other => fdo::Error::Failed(other.to_string()),
        }
    }
}
