//! Backing client: typed access to ConsoleKit and UPower
//!
//! Every operation is a single bus round trip. Failures are converted into
//! `LoginError::Backend` (and logged) right here, so nothing above this
//! layer deals with raw zbus errors or retries.

pub mod proxy;

#[cfg(test)]
pub(crate) mod mock;

use std::future::Future;

use zbus::proxy::CacheProperties;
use zbus::zvariant::{ObjectPath, OwnedObjectPath, Value};
use zbus::Connection;

use crate::error::{LoginError, Result};
use proxy::{CkManagerProxy, CkSeatProxy, CkSessionProxy, UPowerProxy};

pub const CONSOLEKIT_SERVICE: &str = "org.freedesktop.ConsoleKit";
pub const CONSOLEKIT_MANAGER_PATH: &str = "/org/freedesktop/ConsoleKit/Manager";
pub const UPOWER_SERVICE: &str = "org.freedesktop.UPower";

/// Power transitions forwarded to ConsoleKit
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PowerAction {
    PowerOff,
    Reboot,
    Suspend,
    Hibernate,
    HybridSleep,
}

impl PowerAction {
    /// ConsoleKit method name
    pub fn method(&self) -> &'static str {
        match self {
            Self::PowerOff => "PowerOff",
            Self::Reboot => "Reboot",
            Self::Suspend => "Suspend",
            Self::Hibernate => "Hibernate",
            Self::HybridSleep => "HybridSleep",
        }
    }
}

/// Sleep states UPower can be asked about
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SleepState {
    Suspend,
    Hibernate,
}

/// Parameters for `OpenSessionWithParameters`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionParameters {
    pub unix_user: u32,
}

/// The operations the daemon and the library need from the backing services
///
/// Futures are `Send` so generic callers can run inside zbus handlers.
pub trait Backend: Send + Sync {
    fn open_session(&self, params: &SessionParameters) -> impl Future<Output = Result<String>> + Send;
    fn session_for_cookie(&self, cookie: &str) -> impl Future<Output = Result<OwnedObjectPath>> + Send;
    fn close_session(&self, cookie: &str) -> impl Future<Output = Result<bool>> + Send;
    fn sessions(&self) -> impl Future<Output = Result<Vec<OwnedObjectPath>>> + Send;
    fn seats(&self) -> impl Future<Output = Result<Vec<OwnedObjectPath>>> + Send;
    fn current_session(&self) -> impl Future<Output = Result<OwnedObjectPath>> + Send;
    fn session_for_unix_process(&self, pid: u32) -> impl Future<Output = Result<OwnedObjectPath>> + Send;
    fn sessions_for_unix_user(&self, uid: u32) -> impl Future<Output = Result<Vec<OwnedObjectPath>>> + Send;
    fn power_action(&self, action: PowerAction, interactive: bool) -> impl Future<Output = Result<()>> + Send;

    fn session_id(&self, session: &ObjectPath<'_>) -> impl Future<Output = Result<String>> + Send;
    fn session_unix_user(&self, session: &ObjectPath<'_>) -> impl Future<Output = Result<u32>> + Send;
    fn session_seat(&self, session: &ObjectPath<'_>) -> impl Future<Output = Result<OwnedObjectPath>> + Send;
    fn session_type(&self, session: &ObjectPath<'_>) -> impl Future<Output = Result<String>> + Send;
    fn session_is_active(&self, session: &ObjectPath<'_>) -> impl Future<Output = Result<bool>> + Send;
    fn session_remote_host(&self, session: &ObjectPath<'_>) -> impl Future<Output = Result<String>> + Send;
    fn unlock_session(&self, session: &ObjectPath<'_>) -> impl Future<Output = Result<()>> + Send;
    fn activate_session(&self, session: &ObjectPath<'_>) -> impl Future<Output = Result<()>> + Send;

    fn seat_id(&self, seat: &ObjectPath<'_>) -> impl Future<Output = Result<String>> + Send;
    fn seat_sessions(&self, seat: &ObjectPath<'_>) -> impl Future<Output = Result<Vec<OwnedObjectPath>>> + Send;

    /// UPower `CanSuspend`/`CanHibernate`
    fn sleep_supported(&self, state: SleepState) -> impl Future<Output = Result<bool>> + Send;
    /// UPower `SuspendAllowed`/`HibernateAllowed`
    fn sleep_allowed(&self, state: SleepState) -> impl Future<Output = Result<bool>> + Send;
}

/// Parse a caller-supplied string as an object path
pub fn parse_object_path(s: &str) -> Result<OwnedObjectPath> {
    OwnedObjectPath::try_from(s)
        .map_err(|_| LoginError::InvalidArgument(format!("'{}' is not an object path", s)))
}

/// Backend talking to the real services over a bus connection
#[derive(Clone)]
pub struct BusBackend {
    conn: Connection,
}

impl BusBackend {
    pub fn new(conn: Connection) -> Self {
        Self { conn }
    }

    pub fn connection(&self) -> &Connection {
        &self.conn
    }

    async fn manager(&self) -> Result<CkManagerProxy<'static>> {
        CkManagerProxy::builder(&self.conn)
            .cache_properties(CacheProperties::No)
            .build()
            .await
            .map_err(|e| LoginError::backend("Manager", e))
    }

    async fn session(&self, path: &ObjectPath<'_>) -> Result<CkSessionProxy<'static>> {
        CkSessionProxy::builder(&self.conn)
            .path(path.to_owned())
            .map_err(|e| LoginError::backend("Session", e))?
            .cache_properties(CacheProperties::No)
            .build()
            .await
            .map_err(|e| LoginError::backend("Session", e))
    }

    async fn seat(&self, path: &ObjectPath<'_>) -> Result<CkSeatProxy<'static>> {
        CkSeatProxy::builder(&self.conn)
            .path(path.to_owned())
            .map_err(|e| LoginError::backend("Seat", e))?
            .cache_properties(CacheProperties::No)
            .build()
            .await
            .map_err(|e| LoginError::backend("Seat", e))
    }

    async fn upower(&self) -> Result<UPowerProxy<'static>> {
        UPowerProxy::builder(&self.conn)
            .cache_properties(CacheProperties::No)
            .build()
            .await
            .map_err(|e| LoginError::backend("UPower", e))
    }
}

impl Backend for BusBackend {
    async fn open_session(&self, params: &SessionParameters) -> Result<String> {
        // ConsoleKit expects the uid as a signed 32-bit value
        let unix_user = Value::from(params.unix_user as i32);
        let entry = ("unix-user", &unix_user);
        self.manager()
            .await?
            .open_session_with_parameters(&[&entry])
            .await
            .map_err(|e| LoginError::backend("OpenSessionWithParameters", e))
    }

    async fn session_for_cookie(&self, cookie: &str) -> Result<OwnedObjectPath> {
        self.manager()
            .await?
            .get_session_for_cookie(cookie)
            .await
            .map_err(|e| LoginError::backend("GetSessionForCookie", e))
    }

    async fn close_session(&self, cookie: &str) -> Result<bool> {
        self.manager()
            .await?
            .close_session(cookie)
            .await
            .map_err(|e| LoginError::backend("CloseSession", e))
    }

    async fn sessions(&self) -> Result<Vec<OwnedObjectPath>> {
        self.manager()
            .await?
            .get_sessions()
            .await
            .map_err(|e| LoginError::backend("GetSessions", e))
    }

    async fn seats(&self) -> Result<Vec<OwnedObjectPath>> {
        self.manager()
            .await?
            .get_seats()
            .await
            .map_err(|e| LoginError::backend("GetSeats", e))
    }

    async fn current_session(&self) -> Result<OwnedObjectPath> {
        self.manager()
            .await?
            .get_current_session()
            .await
            .map_err(|e| LoginError::backend("GetCurrentSession", e))
    }

    async fn session_for_unix_process(&self, pid: u32) -> Result<OwnedObjectPath> {
        self.manager()
            .await?
            .get_session_for_unix_process(pid)
            .await
            .map_err(|e| LoginError::backend("GetSessionForUnixProcess", e))
    }

    async fn sessions_for_unix_user(&self, uid: u32) -> Result<Vec<OwnedObjectPath>> {
        self.manager()
            .await?
            .get_sessions_for_unix_user(uid)
            .await
            .map_err(|e| LoginError::backend("GetSessionsForUnixUser", e))
    }

    async fn power_action(&self, action: PowerAction, interactive: bool) -> Result<()> {
        let manager = self.manager().await?;
        let reply = match action {
            PowerAction::PowerOff => manager.power_off(interactive).await,
            PowerAction::Reboot => manager.reboot(interactive).await,
            PowerAction::Suspend => manager.suspend(interactive).await,
            PowerAction::Hibernate => manager.hibernate(interactive).await,
            PowerAction::HybridSleep => manager.hybrid_sleep(interactive).await,
        };
        reply.map_err(|e| LoginError::backend(action.method(), e))
    }

    async fn session_id(&self, session: &ObjectPath<'_>) -> Result<String> {
        self.session(session)
            .await?
            .get_id()
            .await
            .map(|id| id.as_str().to_string())
            .map_err(|e| LoginError::backend("GetId", e))
    }

    async fn session_unix_user(&self, session: &ObjectPath<'_>) -> Result<u32> {
        self.session(session)
            .await?
            .get_unix_user()
            .await
            .map_err(|e| LoginError::backend("GetUnixUser", e))
    }

    async fn session_seat(&self, session: &ObjectPath<'_>) -> Result<OwnedObjectPath> {
        self.session(session)
            .await?
            .get_seat_id()
            .await
            .map_err(|e| LoginError::backend("GetSeatId", e))
    }

    async fn session_type(&self, session: &ObjectPath<'_>) -> Result<String> {
        self.session(session)
            .await?
            .get_session_type()
            .await
            .map_err(|e| LoginError::backend("GetSessionType", e))
    }

    async fn session_is_active(&self, session: &ObjectPath<'_>) -> Result<bool> {
        self.session(session)
            .await?
            .is_active()
            .await
            .map_err(|e| LoginError::backend("IsActive", e))
    }

    async fn session_remote_host(&self, session: &ObjectPath<'_>) -> Result<String> {
        self.session(session)
            .await?
            .get_remote_host_name()
            .await
            .map_err(|e| LoginError::backend("GetRemoteHostName", e))
    }

    async fn unlock_session(&self, session: &ObjectPath<'_>) -> Result<()> {
        self.session(session)
            .await?
            .unlock()
            .await
            .map_err(|e| LoginError::backend("Unlock", e))
    }

    async fn activate_session(&self, session: &ObjectPath<'_>) -> Result<()> {
        self.session(session)
            .await?
            .activate()
            .await
            .map_err(|e| LoginError::backend("Activate", e))
    }

    async fn seat_id(&self, seat: &ObjectPath<'_>) -> Result<String> {
        self.seat(seat)
            .await?
            .get_id()
            .await
            .map(|id| id.as_str().to_string())
            .map_err(|e| LoginError::backend("GetId", e))
    }

    async fn seat_sessions(&self, seat: &ObjectPath<'_>) -> Result<Vec<OwnedObjectPath>> {
        self.seat(seat)
            .await?
            .get_sessions()
            .await
            .map_err(|e| LoginError::backend("GetSessions", e))
    }

    async fn sleep_supported(&self, state: SleepState) -> Result<bool> {
        let upower = self.upower().await?;
        match state {
            SleepState::Suspend => upower
                .can_suspend()
                .await
                .map_err(|e| LoginError::backend("CanSuspend", e)),
            SleepState::Hibernate => upower
                .can_hibernate()
                .await
                .map_err(|e| LoginError::backend("CanHibernate", e)),
        }
    }

    async fn sleep_allowed(&self, state: SleepState) -> Result<bool> {
        let upower = self.upower().await?;
        match state {
            SleepState::Suspend => upower
                .suspend_allowed()
                .await
                .map_err(|e| LoginError::backend("SuspendAllowed", e)),
            SleepState::Hibernate => upower
                .hibernate_allowed()
                .await
                .map_err(|e| LoginError::backend("HibernateAllowed", e)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_power_action_method_names() {
        assert_eq!(PowerAction::PowerOff.method(), "PowerOff");
        assert_eq!(PowerAction::HybridSleep.method(), "HybridSleep");
    }

    #[test]
    fn test_parse_object_path() {
        assert!(parse_object_path("/org/freedesktop/ConsoleKit/Seat1").is_ok());
        assert!(matches!(
            parse_object_path("Seat1"),
            Err(LoginError::InvalidArgument(_))
        ));
        assert!(parse_object_path("/trailing/").is_err());
    }
}
