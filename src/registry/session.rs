//! Session lookups against ConsoleKit
//!
//! login1 clients name sessions by an opaque id; ConsoleKit addresses them
//! by object path. Resolving an id means scanning every session and
//! asking each for its id, so lookups here are O(n) in the session count.

use zbus::zvariant::{ObjectPath, OwnedObjectPath};

use crate::backend::{parse_object_path, Backend};
use crate::error::{LoginError, Result};

/// login1 session state derived from `IsActive`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    Active,
    Online,
}

impl SessionState {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Active => "active",
            Self::Online => "online",
        }
    }
}

impl std::fmt::Display for SessionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A session attached to a seat
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SeatSession {
    pub ssid: String,
    pub path: OwnedObjectPath,
    pub uid: u32,
}

/// Sessions on a seat with their owners.
///
/// Strict: one failing lookup fails the whole call, so the id and uid
/// lists built from the result always line up.
pub async fn list_sessions_on_seat<B: Backend>(
    backend: &B,
    seat: &ObjectPath<'_>,
) -> Result<Vec<SeatSession>> {
    let paths = backend.seat_sessions(seat).await?;
    let mut sessions = Vec::with_capacity(paths.len());

    for path in paths {
        let ssid = backend.session_id(&path).await?;
        let uid = backend.session_unix_user(&path).await?;
        sessions.push(SeatSession { ssid, path, uid });
    }

    Ok(sessions)
}

/// Seats on which `uid` has a session, optionally only active ones
pub async fn list_sessions_of_uid<B: Backend>(
    backend: &B,
    uid: u32,
    require_active: bool,
) -> Result<Vec<OwnedObjectPath>> {
    let mut seats = Vec::new();

    for session in backend.sessions_for_unix_user(uid).await? {
        if require_active && !backend.session_is_active(&session).await? {
            continue;
        }
        seats.push(backend.session_seat(&session).await?);
    }

    Ok(seats)
}

/// Find the session path whose id is `ssid`. First match wins.
pub async fn resolve_ssid<B: Backend>(backend: &B, ssid: &str) -> Result<OwnedObjectPath> {
    for path in backend.sessions().await? {
        match backend.session_id(&path).await {
            Ok(id) if id == ssid => return Ok(path),
            Ok(_) => {}
            Err(_) => log::debug!("Skipping session {} without an id", path.as_str()),
        }
    }

    Err(LoginError::NotFound(ssid.to_string()))
}

pub async fn derive_state<B: Backend>(backend: &B, session: &ObjectPath<'_>) -> Result<SessionState> {
    if backend.session_is_active(session).await? {
        Ok(SessionState::Active)
    } else {
        Ok(SessionState::Online)
    }
}

/// Session of a process; `pid == 0` means this process
pub async fn current_session_for_pid<B: Backend>(backend: &B, pid: u32) -> Result<OwnedObjectPath> {
    let pid = if pid == 0 { std::process::id() } else { pid };
    backend.session_for_unix_process(pid).await
}

/// Map a caller-supplied session reference to a ConsoleKit path.
///
/// `None` is the caller's own session. Object paths are taken as they are;
/// anything else is looked up by id.
pub async fn locate<B: Backend>(backend: &B, ssid: Option<&str>) -> Result<OwnedObjectPath> {
    match ssid {
        None => current_session_for_pid(backend, 0).await,
        Some(s) if s.starts_with('/') => parse_object_path(s),
        Some(s) => resolve_ssid(backend, s).await,
    }
}
