//! sd-daemon entry points
//!
//! systemd is never PID 1 here, so the notification protocol and socket
//! activation have nothing to talk to.

use std::os::fd::{AsRawFd, BorrowedFd};

use nix::sys::socket::{
    getsockname, getsockopt, sockopt, AddressFamily, SockType, SockaddrLike, SockaddrStorage,
};

use crate::error::Result;

/// Whether the system was booted with systemd
pub fn booted() -> bool {
    false
}

/// Service status notification. Accepted and dropped.
pub fn notify(_unset_environment: bool, state: &str) -> Result<()> {
    log::debug!("Ignoring notification: {}", state);
    Ok(())
}

/// Number of sockets passed by socket activation
pub fn listen_fds(_unset_environment: bool) -> usize {
    0
}

/// Check that `fd` is a socket of the given family and type, listening or
/// not. `None` skips a check.
pub fn is_socket(
    fd: BorrowedFd<'_>,
    family: Option<AddressFamily>,
    sock_type: Option<SockType>,
    listening: Option<bool>,
) -> Result<bool> {
    if let Some(family) = family {
        let addr: SockaddrStorage = getsockname(fd.as_raw_fd())?;
        if addr.family() != Some(family) {
            return Ok(false);
        }
    }

    if let Some(sock_type) = sock_type {
        if getsockopt(&fd, sockopt::SockType)? != sock_type {
            return Ok(false);
        }
    }

    if let Some(listening) = listening {
        if getsockopt(&fd, sockopt::AcceptConn)? != listening {
            return Ok(false);
        }
    }

    Ok(true)
}
