//! Blocking client library with the sd-login vocabulary
//!
//! Every call goes over the process-wide bus handle and blocks until
//! ConsoleKit has answered. Fields ConsoleKit has no notion of fail with
//! `LoginError::NotModelled` without touching the bus.

pub mod client;
pub mod monitor;

pub use client::LoginClient;
pub use monitor::LoginMonitor;

use std::future::Future;

use crate::backend::BusBackend;
use crate::bus;
use crate::error::{LoginError, Result};
use crate::registry::SessionState;

/// Run `f` against a client on the shared bus connection
fn with_client<T, F, Fut>(f: F) -> Result<T>
where
    F: FnOnce(LoginClient<BusBackend>) -> Fut,
    Fut: Future<Output = Result<T>>,
{
    let conn = bus::shared().get()?;
    zbus::block_on(f(LoginClient::new(BusBackend::new(conn))))
}

pub fn pid_get_session(pid: u32) -> Result<String> {
    with_client(|c| async move { c.pid_get_session(pid).await })
}

pub fn pid_get_owner_uid(pid: u32) -> Result<u32> {
    with_client(|c| async move { c.pid_get_owner_uid(pid).await })
}

/// Remote host name of the process's session
pub fn pid_get_machine_name(pid: u32) -> Result<String> {
    with_client(|c| async move { c.pid_get_machine_name(pid).await })
}

pub fn pid_get_unit(_pid: u32) -> Result<String> {
    Err(LoginError::NotModelled("unit"))
}

pub fn pid_get_user_unit(_pid: u32) -> Result<String> {
    Err(LoginError::NotModelled("user_unit"))
}

pub fn pid_get_slice(_pid: u32) -> Result<String> {
    Err(LoginError::NotModelled("slice"))
}

pub fn session_is_active(ssid: Option<&str>) -> Result<bool> {
    with_client(|c| async move { c.session_is_active(ssid).await })
}

pub fn session_get_state(ssid: Option<&str>) -> Result<SessionState> {
    with_client(|c| async move { c.session_get_state(ssid).await })
}

pub fn session_get_type(ssid: Option<&str>) -> Result<String> {
    with_client(|c| async move { c.session_get_type(ssid).await })
}

pub fn session_get_seat(ssid: Option<&str>) -> Result<String> {
    with_client(|c| async move { c.session_get_seat(ssid).await })
}

pub fn session_get_uid(ssid: Option<&str>) -> Result<u32> {
    with_client(|c| async move { c.session_get_uid(ssid).await })
}

pub fn session_get_remote_host(ssid: Option<&str>) -> Result<String> {
    with_client(|c| async move { c.session_get_remote_host(ssid).await })
}

/// ConsoleKit sessions carry no class
pub fn session_get_class(_ssid: Option<&str>) -> Result<&'static str> {
    Ok("user")
}

/// ConsoleKit cannot tell, so every seat is assumed to be
pub fn seat_can_multi_session(_seat: Option<&str>) -> bool {
    true
}

pub fn seat_get_sessions(seat: Option<&str>) -> Result<(Vec<String>, Vec<u32>)> {
    with_client(|c| async move { c.seat_get_sessions(seat).await })
}

pub fn uid_get_seats(uid: u32, require_active: bool) -> Result<Vec<String>> {
    with_client(|c| async move { c.uid_get_seats(uid, require_active).await })
}
