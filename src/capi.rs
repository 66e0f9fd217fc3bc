//! sd-login/sd-daemon/sd-journal C ABI
//!
//! Return convention: `0` (or a positive answer) on success, negative errno
//! on failure. String results are `malloc`ed and freed by the caller;
//! string arrays are NULL-terminated. Out-pointers are cleared on failure.

use std::ffi::{c_char, c_int, c_uint, CStr, CString};
use std::os::fd::{BorrowedFd, IntoRawFd};
use std::ptr;

use nix::sys::socket::{AddressFamily, SockType};

use crate::error::{LoginError, Result};
use crate::login::{self, LoginMonitor};
use crate::{compat, journal};

fn arg_str<'a>(p: *const c_char) -> Result<Option<&'a str>> {
    if p.is_null() {
        return Ok(None);
    }
    // SAFETY: non-null arguments are NUL-terminated strings per the ABI
    unsafe { CStr::from_ptr(p) }
        .to_str()
        .map(Some)
        .map_err(|_| LoginError::InvalidArgument("argument is not UTF-8".into()))
}

fn pid_arg(pid: libc::pid_t) -> Result<u32> {
    u32::try_from(pid).map_err(|_| LoginError::InvalidArgument(format!("bad pid {}", pid)))
}

fn strdup(value: &str) -> Result<*mut c_char> {
    let value = CString::new(value)
        .map_err(|_| LoginError::InvalidArgument("value contains NUL".into()))?;
    // SAFETY: value is a valid C string; the copy is owned by the caller
    let copy = unsafe { libc::strdup(value.as_ptr()) };
    if copy.is_null() {
        return Err(LoginError::Io(std::io::Error::from_raw_os_error(libc::ENOMEM)));
    }
    Ok(copy)
}

/// Store a string result, or clear `out` and return the error code
fn put_string(out: *mut *mut c_char, value: Result<impl AsRef<str>>) -> c_int {
    if out.is_null() {
        return -libc::EINVAL;
    }
    let result = value.and_then(|v| strdup(v.as_ref()));
    // SAFETY: out was checked for null and points to caller storage
    unsafe {
        match result {
            Ok(s) => {
                *out = s;
                0
            }
            Err(e) => {
                *out = ptr::null_mut();
                e.errno()
            }
        }
    }
}

/// malloc a NULL-terminated copy of `values`
fn string_array(values: &[String]) -> Result<*mut *mut c_char> {
    // SAFETY: calloc zero-fills, so every unset slot is already the sentinel
    let array = unsafe { libc::calloc(values.len() + 1, std::mem::size_of::<*mut c_char>()) }
        as *mut *mut c_char;
    if array.is_null() {
        return Err(LoginError::Io(std::io::Error::from_raw_os_error(libc::ENOMEM)));
    }

    for (i, value) in values.iter().enumerate() {
        match strdup(value) {
            // SAFETY: i < values.len() and the array holds len + 1 slots
            Ok(s) => unsafe { *array.add(i) = s },
            Err(e) => {
                free_string_array(array);
                return Err(e);
            }
        }
    }
    Ok(array)
}

fn free_string_array(array: *mut *mut c_char) {
    // SAFETY: array is NULL-terminated and every entry came from strdup
    unsafe {
        let mut i = 0;
        while !(*array.add(i)).is_null() {
            libc::free(*array.add(i) as *mut libc::c_void);
            i += 1;
        }
        libc::free(array as *mut libc::c_void);
    }
}

#[no_mangle]
pub extern "C" fn sd_pid_get_session(pid: libc::pid_t, session: *mut *mut c_char) -> c_int {
    put_string(session, pid_arg(pid).and_then(login::pid_get_session))
}

#[no_mangle]
pub extern "C" fn sd_pid_get_owner_uid(pid: libc::pid_t, uid: *mut libc::uid_t) -> c_int {
    if uid.is_null() {
        return -libc::EINVAL;
    }
    match pid_arg(pid).and_then(login::pid_get_owner_uid) {
        Ok(owner) => {
            // SAFETY: checked for null above
            unsafe { *uid = owner };
            0
        }
        Err(e) => e.errno(),
    }
}

#[no_mangle]
pub extern "C" fn sd_pid_get_machine_name(pid: libc::pid_t, name: *mut *mut c_char) -> c_int {
    put_string(name, pid_arg(pid).and_then(login::pid_get_machine_name))
}

#[no_mangle]
pub extern "C" fn sd_pid_get_unit(pid: libc::pid_t, unit: *mut *mut c_char) -> c_int {
    put_string(unit, pid_arg(pid).and_then(login::pid_get_unit))
}

#[no_mangle]
pub extern "C" fn sd_pid_get_user_unit(pid: libc::pid_t, unit: *mut *mut c_char) -> c_int {
    put_string(unit, pid_arg(pid).and_then(login::pid_get_user_unit))
}

#[no_mangle]
pub extern "C" fn sd_pid_get_slice(pid: libc::pid_t, slice: *mut *mut c_char) -> c_int {
    put_string(slice, pid_arg(pid).and_then(login::pid_get_slice))
}

#[no_mangle]
pub extern "C" fn sd_session_is_active(session: *const c_char) -> c_int {
    match arg_str(session).and_then(login::session_is_active) {
        Ok(active) => c_int::from(active),
        Err(e) => e.errno(),
    }
}

#[no_mangle]
pub extern "C" fn sd_session_get_state(session: *const c_char, state: *mut *mut c_char) -> c_int {
    put_string(
        state,
        arg_str(session)
            .and_then(login::session_get_state)
            .map(|s| s.as_str()),
    )
}

#[no_mangle]
pub extern "C" fn sd_session_get_type(session: *const c_char, kind: *mut *mut c_char) -> c_int {
    put_string(kind, arg_str(session).and_then(login::session_get_type))
}

#[no_mangle]
pub extern "C" fn sd_session_get_seat(session: *const c_char, seat: *mut *mut c_char) -> c_int {
    put_string(seat, arg_str(session).and_then(login::session_get_seat))
}

#[no_mangle]
pub extern "C" fn sd_session_get_class(session: *const c_char, class: *mut *mut c_char) -> c_int {
    put_string(class, arg_str(session).and_then(login::session_get_class))
}

#[no_mangle]
pub extern "C" fn sd_session_get_remote_host(
    session: *const c_char,
    host: *mut *mut c_char,
) -> c_int {
    put_string(host, arg_str(session).and_then(login::session_get_remote_host))
}

#[no_mangle]
pub extern "C" fn sd_session_get_uid(session: *const c_char, uid: *mut libc::uid_t) -> c_int {
    if uid.is_null() {
        return -libc::EINVAL;
    }
    match arg_str(session).and_then(login::session_get_uid) {
        Ok(owner) => {
            // SAFETY: checked for null above
            unsafe { *uid = owner };
            0
        }
        Err(e) => e.errno(),
    }
}

#[no_mangle]
pub extern "C" fn sd_seat_can_multi_session(seat: *const c_char) -> c_int {
    match arg_str(seat) {
        Ok(seat) => c_int::from(login::seat_can_multi_session(seat)),
        Err(e) => e.errno(),
    }
}

/// Any of the out-pointers may be NULL
#[no_mangle]
pub extern "C" fn sd_seat_get_sessions(
    seat: *const c_char,
    sessions: *mut *mut *mut c_char,
    uid: *mut *mut libc::uid_t,
    n_uids: *mut c_uint,
) -> c_int {
    let result = arg_str(seat).and_then(login::seat_get_sessions).and_then(|(ssids, uids)| {
        let array = if sessions.is_null() {
            ptr::null_mut()
        } else {
            string_array(&ssids)?
        };
        Ok((array, uids))
    });

    // SAFETY: every out-pointer is checked for null before it is written
    unsafe {
        match result {
            Ok((array, uids)) => {
                if !sessions.is_null() {
                    *sessions = array;
                }
                if !uid.is_null() {
                    let list = libc::calloc(uids.len().max(1), std::mem::size_of::<libc::uid_t>())
                        as *mut libc::uid_t;
                    if list.is_null() {
                        if !array.is_null() {
                            free_string_array(array);
                            *sessions = ptr::null_mut();
                        }
                        return -libc::ENOMEM;
                    }
                    for (i, owner) in uids.iter().enumerate() {
                        *list.add(i) = *owner;
                    }
                    *uid = list;
                }
                if !n_uids.is_null() {
                    *n_uids = uids.len() as c_uint;
                }
                0
            }
            Err(e) => {
                if !sessions.is_null() {
                    *sessions = ptr::null_mut();
                }
                if !uid.is_null() {
                    *uid = ptr::null_mut();
                }
                e.errno()
            }
        }
    }
}

#[no_mangle]
pub extern "C" fn sd_uid_get_seats(
    uid: libc::uid_t,
    require_active: c_int,
    seats: *mut *mut *mut c_char,
) -> c_int {
    if seats.is_null() {
        return -libc::EINVAL;
    }
    let result = login::uid_get_seats(uid, require_active != 0).and_then(|s| string_array(&s));
    // SAFETY: checked for null above
    unsafe {
        match result {
            Ok(array) => {
                *seats = array;
                0
            }
            Err(e) => {
                *seats = ptr::null_mut();
                e.errno()
            }
        }
    }
}

#[no_mangle]
pub extern "C" fn sd_login_monitor_new(
    category: *const c_char,
    monitor: *mut *mut LoginMonitor,
) -> c_int {
    if monitor.is_null() {
        return -libc::EINVAL;
    }
    let result = arg_str(category).and_then(LoginMonitor::new);
    // SAFETY: checked for null above
    unsafe {
        match result {
            Ok(m) => {
                *monitor = Box::into_raw(Box::new(m));
                0
            }
            Err(e) => {
                *monitor = ptr::null_mut();
                e.errno()
            }
        }
    }
}

#[no_mangle]
pub extern "C" fn sd_login_monitor_unref(monitor: *mut LoginMonitor) -> *mut LoginMonitor {
    if !monitor.is_null() {
        // SAFETY: the pointer came from sd_login_monitor_new
        drop(unsafe { Box::from_raw(monitor) });
    }
    ptr::null_mut()
}

#[no_mangle]
pub extern "C" fn sd_login_monitor_flush(monitor: *mut LoginMonitor) -> c_int {
    // SAFETY: the pointer came from sd_login_monitor_new
    match unsafe { monitor.as_mut() } {
        Some(m) => match m.flush() {
            Ok(_) => 0,
            Err(e) => e.errno(),
        },
        None => -libc::EINVAL,
    }
}

#[no_mangle]
pub extern "C" fn sd_login_monitor_get_fd(monitor: *mut LoginMonitor) -> c_int {
    // SAFETY: the pointer came from sd_login_monitor_new
    match unsafe { monitor.as_ref() } {
        Some(m) => m.fd(),
        None => -libc::EINVAL,
    }
}

#[no_mangle]
pub extern "C" fn sd_login_monitor_get_events(monitor: *mut LoginMonitor) -> c_int {
    // SAFETY: the pointer came from sd_login_monitor_new
    match unsafe { monitor.as_ref() } {
        Some(m) => m.events(),
        None => -libc::EINVAL,
    }
}

#[no_mangle]
pub extern "C" fn sd_login_monitor_get_timeout(
    monitor: *mut LoginMonitor,
    timeout_usec: *mut u64,
) -> c_int {
    // SAFETY: the pointer came from sd_login_monitor_new
    match (unsafe { monitor.as_ref() }, timeout_usec.is_null()) {
        (Some(m), false) => {
            // SAFETY: checked for null above
            unsafe { *timeout_usec = m.timeout() };
            0
        }
        _ => -libc::EINVAL,
    }
}

#[no_mangle]
pub extern "C" fn sd_booted() -> c_int {
    c_int::from(compat::booted())
}

#[no_mangle]
pub extern "C" fn sd_notify(unset_environment: c_int, state: *const c_char) -> c_int {
    match arg_str(state) {
        Ok(Some(state)) => match compat::notify(unset_environment != 0, state) {
            Ok(()) => 0,
            Err(e) => e.errno(),
        },
        Ok(None) => -libc::EINVAL,
        Err(e) => e.errno(),
    }
}

#[no_mangle]
pub extern "C" fn sd_listen_fds(unset_environment: c_int) -> c_int {
    compat::listen_fds(unset_environment != 0) as c_int
}

#[no_mangle]
pub extern "C" fn sd_is_socket(fd: c_int, family: c_int, kind: c_int, listening: c_int) -> c_int {
    if fd < 0 {
        return -libc::EBADF;
    }
    let family = match family {
        libc::AF_UNSPEC => None,
        f => match AddressFamily::from_i32(f) {
            Some(f) => Some(f),
            None => return 0,
        },
    };
    let kind = match kind {
        0 => None,
        k => match SockType::try_from(k) {
            Ok(k) => Some(k),
            Err(_) => return 0,
        },
    };
    let listening = (listening >= 0).then_some(listening > 0);

    // SAFETY: the caller keeps fd open for the duration of the call
    let fd = unsafe { BorrowedFd::borrow_raw(fd) };
    match compat::is_socket(fd, family, kind, listening) {
        Ok(matches) => c_int::from(matches),
        Err(e) => e.errno(),
    }
}

#[no_mangle]
pub extern "C" fn sd_journal_print_str(priority: c_int, message: *const c_char) -> c_int {
    match arg_str(message) {
        Ok(Some(message)) => match journal::print(priority, message) {
            Ok(()) => 0,
            Err(e) => e.errno(),
        },
        Ok(None) => -libc::EINVAL,
        Err(e) => e.errno(),
    }
}

#[no_mangle]
pub extern "C" fn sd_journal_perror(message: *const c_char) -> c_int {
    match arg_str(message).and_then(journal::perror) {
        Ok(()) => 0,
        Err(e) => e.errno(),
    }
}

#[no_mangle]
pub extern "C" fn sd_journal_stream_fd(
    identifier: *const c_char,
    priority: c_int,
    level_prefix: c_int,
) -> c_int {
    let result = arg_str(identifier).and_then(|ident| {
        journal::stream_fd(ident.unwrap_or("loginkit"), priority, level_prefix != 0)
    });
    match result {
        Ok(fd) => fd.into_raw_fd(),
        Err(e) => e.errno(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_string_array_is_terminated() {
        let values = vec!["Session1".to_string(), "Session2".to_string()];
        let array = string_array(&values).unwrap();
        unsafe {
            assert_eq!(CStr::from_ptr(*array.add(0)).to_str().unwrap(), "Session1");
            assert_eq!(CStr::from_ptr(*array.add(1)).to_str().unwrap(), "Session2");
            assert!((*array.add(2)).is_null());
        }
        free_string_array(array);
    }

    #[test]
    fn test_unmodelled_clears_output() {
        let mut unit: *mut c_char = 0x1 as *mut c_char;
        assert_eq!(sd_pid_get_unit(1, &mut unit), -libc::EINVAL);
        assert!(unit.is_null());
        assert_eq!(sd_pid_get_slice(-1, &mut unit), -libc::EINVAL);
    }

    #[test]
    fn test_class_is_user() {
        let mut class: *mut c_char = ptr::null_mut();
        assert_eq!(sd_session_get_class(ptr::null(), &mut class), 0);
        unsafe {
            assert_eq!(CStr::from_ptr(class).to_str().unwrap(), "user");
            libc::free(class as *mut libc::c_void);
        }
    }

    #[test]
    fn test_daemon_answers() {
        assert_eq!(sd_booted(), 0);
        assert_eq!(sd_listen_fds(0), 0);
        assert_eq!(sd_notify(0, c"READY=1".as_ptr()), 0);
        assert_eq!(sd_notify(0, ptr::null()), -libc::EINVAL);
        assert_eq!(sd_is_socket(-1, 0, 0, -1), -libc::EBADF);
    }
}
