//! Integration tests for the journal stream relay

use std::io::Write;
use std::os::fd::OwnedFd;
use std::os::unix::net::UnixStream;
use std::sync::mpsc;
use std::thread;

use loginkit::journal;
use nix::sys::socket::{send, socketpair, AddressFamily, MsgFlags, SockFlag, SockType};
use std::os::fd::AsRawFd;

fn pair() -> (OwnedFd, OwnedFd) {
    socketpair(
        AddressFamily::Unix,
        SockType::SeqPacket,
        None,
        SockFlag::SOCK_CLOEXEC,
    )
    .unwrap()
}

fn relay_records(records: &[&[u8]], level_prefix: bool) -> Vec<(i32, String)> {
    let (reader, writer) = pair();
    let (tx, rx) = mpsc::channel();

    let worker = thread::spawn(move || {
        journal::relay(reader, libc::LOG_INFO, level_prefix, |p, line| {
            tx.send((p, line.to_string())).unwrap();
        })
    });

    for record in records {
        send(writer.as_raw_fd(), record, MsgFlags::empty()).unwrap();
    }
    drop(writer);

    worker.join().unwrap().unwrap();
    rx.iter().collect()
}

#[test]
fn test_relay_strips_priority() {
    let got = relay_records(&[b"<3>disk full\n", b"plain message", b"<9>odd"], true);
    assert_eq!(
        got,
        vec![
            (3, "disk full".to_string()),
            (libc::LOG_INFO, "plain message".to_string()),
            (libc::LOG_INFO, "<9>odd".to_string()),
        ]
    );
}

#[test]
fn test_relay_keeps_prefix_when_disabled() {
    let got = relay_records(&[b"<3>disk full"], false);
    assert_eq!(got, vec![(libc::LOG_INFO, "<3>disk full".to_string())]);
}

#[test]
fn test_relay_ends_on_hangup() {
    let got = relay_records(&[], true);
    assert!(got.is_empty());
}

#[test]
fn test_stream_fd_accepts_writes() {
    let fd = journal::stream_fd("loginkit-test", libc::LOG_DEBUG, true).unwrap();
    let mut stream = UnixStream::from(fd);
    stream.write_all(b"<7>loginkit stream test\n").unwrap();
}
