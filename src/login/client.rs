//! Async client over any `Backend`

use zbus::zvariant::ObjectPath;

use crate::backend::{parse_object_path, Backend};
use crate::error::{LoginError, Result};
use crate::registry::{self, SessionState};

pub struct LoginClient<B> {
    backend: B,
}

impl<B: Backend> LoginClient<B> {
    pub fn new(backend: B) -> Self {
        Self { backend }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Session id of a process (`0` for the caller)
    pub async fn pid_get_session(&self, pid: u32) -> Result<String> {
        log::debug!("Getting the session of process {}", pid);
        let path = registry::current_session_for_pid(&self.backend, pid).await?;
        self.backend.session_id(&path).await
    }

    pub async fn pid_get_owner_uid(&self, pid: u32) -> Result<u32> {
        let path = registry::current_session_for_pid(&self.backend, pid).await?;
        self.backend.session_unix_user(&path).await
    }

    /// Remote host of the process's session. There are no machines or
    /// containers to report, so a local session has no name.
    pub async fn pid_get_machine_name(&self, pid: u32) -> Result<String> {
        let path = registry::current_session_for_pid(&self.backend, pid).await?;
        let host = self.backend.session_remote_host(&path).await?;
        if host.is_empty() {
            return Err(LoginError::NotModelled("machine_name"));
        }
        Ok(host)
    }

    pub async fn session_is_active(&self, ssid: Option<&str>) -> Result<bool> {
        let path = registry::locate(&self.backend, ssid).await?;
        self.backend.session_is_active(&path).await
    }

    pub async fn session_get_state(&self, ssid: Option<&str>) -> Result<SessionState> {
        let path = registry::locate(&self.backend, ssid).await?;
        registry::derive_state(&self.backend, &path).await
    }

    pub async fn session_get_type(&self, ssid: Option<&str>) -> Result<String> {
        let path = registry::locate(&self.backend, ssid).await?;
        self.backend.session_type(&path).await
    }

    /// Seat of a session, as the seat's object path
    pub async fn session_get_seat(&self, ssid: Option<&str>) -> Result<String> {
        let path = registry::locate(&self.backend, ssid).await?;
        let seat = self.backend.session_seat(&path).await?;
        Ok(seat.as_str().to_string())
    }

    pub async fn session_get_uid(&self, ssid: Option<&str>) -> Result<u32> {
        let path = registry::locate(&self.backend, ssid).await?;
        self.backend.session_unix_user(&path).await
    }

    pub async fn session_get_remote_host(&self, ssid: Option<&str>) -> Result<String> {
        let path = registry::locate(&self.backend, ssid).await?;
        self.backend.session_remote_host(&path).await
    }

    /// Session ids on a seat with their owners; `None` is the caller's seat.
    /// Both vectors have the same length.
    pub async fn seat_get_sessions(&self, seat: Option<&str>) -> Result<(Vec<String>, Vec<u32>)> {
        let seat = match seat {
            Some(seat) => parse_object_path(seat)?,
            None => {
                let session = registry::locate(&self.backend, None).await?;
                self.backend.session_seat(&session).await?
            }
        };

        log::debug!("Listing the sessions on {}", seat.as_str());
        let sessions = registry::list_sessions_on_seat(&self.backend, &seat).await?;
        Ok(sessions.into_iter().map(|s| (s.ssid, s.uid)).unzip())
    }

    /// Seats on which `uid` has sessions
    pub async fn uid_get_seats(&self, uid: u32, require_active: bool) -> Result<Vec<String>> {
        let seats = registry::list_sessions_of_uid(&self.backend, uid, require_active).await?;
        Ok(seats.iter().map(|s| s.as_str().to_string()).collect())
    }

    pub async fn seat_id(&self, seat: &ObjectPath<'_>) -> Result<String> {
        registry::resolve_seat_id(&self.backend, seat).await
    }
}
