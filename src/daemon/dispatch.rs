//! Handlers behind the org.freedesktop.login1.Manager methods
//!
//! The bus interface is a thin shell around `Dispatcher`; everything that
//! decides what to ask ConsoleKit and how to shape the answer lives here so
//! it can be exercised without a bus.

use std::os::fd::OwnedFd;

use zbus::zvariant::OwnedObjectPath;

use crate::backend::{parse_object_path, Backend, PowerAction};
use crate::error::Result;
use crate::power::{self, Capability};
use crate::registry::{self, SeatEntry};

pub struct Dispatcher<B> {
    backend: B,
    strict_get_session: bool,
}

impl<B: Backend> Dispatcher<B> {
    pub fn new(backend: B, strict_get_session: bool) -> Self {
        Self {
            backend,
            strict_get_session,
        }
    }

    pub fn backend(&self) -> &B {
        &self.backend
    }

    /// Unlock a session. Failures are logged, never reported to the caller.
    pub async fn unlock_session(&self, id: &str) {
        let result = async {
            let path = registry::locate(&self.backend, Some(id)).await?;
            self.backend.unlock_session(&path).await
        }
        .await;

        if let Err(e) = result {
            log::warn!("UnlockSession {} failed: {}", id, e);
        }
    }

    /// Activate a session. Failures are logged, never reported to the caller.
    pub async fn activate_session_on_seat(&self, session: &str, seat: &str) {
        let result = async {
            let path = registry::locate(&self.backend, Some(session)).await?;
            self.backend.activate_session(&path).await
        }
        .await;

        if let Err(e) = result {
            log::warn!("ActivateSessionOnSeat {} on {} failed: {}", session, seat, e);
        }
    }

    pub async fn list_seats(&self) -> Result<Vec<SeatEntry>> {
        registry::list_seats(&self.backend).await
    }

    /// Object path of a session.
    ///
    /// ConsoleKit session ids are already object paths, so by default the
    /// id is handed back unchanged. In strict mode it must be the id of a
    /// session ConsoleKit currently lists, path-shaped or not.
    pub async fn get_session(&self, ssid: &str) -> Result<OwnedObjectPath> {
        if self.strict_get_session {
            registry::resolve_ssid(&self.backend, ssid).await
        } else {
            parse_object_path(ssid)
        }
    }

    pub async fn can(&self, action: PowerAction) -> Capability {
        power::can(&self.backend, action).await
    }

    pub async fn power(&self, action: PowerAction, interactive: bool) -> Result<()> {
        power::perform(&self.backend, action, interactive).await
    }

    pub fn inhibit(&self, what: &str, who: &str, why: &str, mode: &str) -> Result<OwnedFd> {
        power::inhibit(what, who, why, mode)
    }
}
