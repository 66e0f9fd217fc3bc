//! Journal shim
//!
//! There is no journal to talk to; messages go to the local syslog
//! transport instead.

use std::ffi::CString;
use std::os::fd::{AsFd, AsRawFd, OwnedFd};

use nix::poll::{poll, PollFd, PollFlags, PollTimeout};
use nix::sys::signal::{pthread_sigmask, SigSet, SigmaskHow};
use nix::sys::socket::{recv, socketpair, AddressFamily, MsgFlags, SockFlag, SockType};

use crate::error::{LoginError, Result};

/// Largest record a stream client can send in one write
const MAX_RECORD: usize = 64 * 1024;

fn to_cstring(text: &str) -> Result<CString> {
    CString::new(text).map_err(|_| LoginError::InvalidArgument("message contains NUL".into()))
}

fn syslog(priority: i32, message: &CString) {
    // SAFETY: both pointers are valid NUL-terminated strings and the format
    // consumes exactly one string argument.
    unsafe { libc::syslog(priority, c"%s".as_ptr(), message.as_ptr()) }
}

/// Log one message at `priority`
pub fn print(priority: i32, message: &str) -> Result<()> {
    syslog(priority, &to_cstring(message)?);
    Ok(())
}

/// Log `message` followed by the description of the current errno
pub fn perror(message: Option<&str>) -> Result<()> {
    let err = std::io::Error::last_os_error();
    let text = match message {
        Some(m) if !m.is_empty() => format!("{}: {}", m, err),
        _ => err.to_string(),
    };
    print(libc::LOG_ERR, &text)
}

/// Split a leading `<N>` priority off a record
pub fn parse_priority_prefix(record: &[u8]) -> Option<(i32, &[u8])> {
    match record {
        [b'<', digit @ b'0'..=b'7', b'>', rest @ ..] => Some((i32::from(digit - b'0'), rest)),
        _ => None,
    }
}

/// Read records from `sock` until the peer hangs up, handing each one to
/// `sink` with its priority.
pub fn relay<F>(sock: OwnedFd, priority: i32, level_prefix: bool, mut sink: F) -> Result<()>
where
    F: FnMut(i32, &str),
{
    let mut buffer = vec![0u8; MAX_RECORD];

    loop {
        let mut fds = [PollFd::new(sock.as_fd(), PollFlags::POLLIN)];
        poll(&mut fds, PollTimeout::NONE)?;
        let revents = fds[0].revents().unwrap_or(PollFlags::empty());

        if revents.contains(PollFlags::POLLERR) {
            return Err(LoginError::Io(std::io::Error::other("stream socket error")));
        }

        let len = recv(sock.as_raw_fd(), &mut buffer, MsgFlags::empty())?;
        if len == 0 {
            if revents.contains(PollFlags::POLLHUP) {
                return Ok(());
            }
            continue;
        }

        let mut record = &buffer[..len];
        let mut record_priority = priority;
        if level_prefix {
            if let Some((p, rest)) = parse_priority_prefix(record) {
                record_priority = p;
                record = rest;
            }
        }
        if let [head @ .., b'\n'] = record {
            record = head;
        }

        let text = String::from_utf8_lossy(record).replace('\0', "");
        sink(record_priority, &text);
    }
}

/// Create a socket whose records end up in syslog tagged with `identifier`.
///
/// The caller gets one end of a SOCK_SEQPACKET pair; a detached worker
/// thread owns the other end and exits once the caller closes theirs.
pub fn stream_fd(identifier: &str, priority: i32, level_prefix: bool) -> Result<OwnedFd> {
    let (ours, theirs) = socketpair(
        AddressFamily::Unix,
        SockType::SeqPacket,
        None,
        SockFlag::SOCK_CLOEXEC,
    )?;
    let identifier = identifier.to_string();

    std::thread::Builder::new()
        .name(format!("journal-{}", identifier))
        .spawn(move || {
            if let Err(e) = pthread_sigmask(SigmaskHow::SIG_BLOCK, Some(&SigSet::all()), None) {
                log::warn!("Failed to block signals in the stream worker: {}", e);
            }

            let result = relay(ours, priority, level_prefix, |p, line| {
                if let Ok(text) = to_cstring(&format!("{}: {}", identifier, line)) {
                    syslog(p, &text);
                }
            });
            if let Err(e) = result {
                log::debug!("Stream relay for {} ended: {}", identifier, e);
            }
        })?;

    Ok(theirs)
}
