//! In-memory ConsoleKit/UPower stand-in for unit tests
//!
//! Absent map entries make the corresponding call fail, which is how tests
//! model broken seats, vanished sessions or a missing power service.

use std::collections::HashMap;
use std::sync::Mutex;

use zbus::zvariant::{ObjectPath, OwnedObjectPath};

use super::{Backend, PowerAction, SessionParameters, SleepState};
use crate::error::{LoginError, Result};

pub(crate) fn op(path: &str) -> OwnedObjectPath {
    OwnedObjectPath::try_from(path).unwrap()
}

fn fail(method: &'static str) -> LoginError {
    LoginError::Backend {
        method,
        message: "mock failure".into(),
    }
}

#[derive(Default)]
pub(crate) struct MockState {
    pub seats: Vec<String>,
    pub seat_ids: HashMap<String, String>,
    pub seat_sessions: HashMap<String, Vec<String>>,
    pub sessions: Vec<String>,
    pub session_ids: HashMap<String, String>,
    pub session_uids: HashMap<String, u32>,
    pub session_seats: HashMap<String, String>,
    pub session_types: HashMap<String, String>,
    pub session_active: HashMap<String, bool>,
    pub remote_hosts: HashMap<String, String>,
    pub user_sessions: HashMap<u32, Vec<String>>,
    pub process_sessions: HashMap<u32, String>,
    pub current_session: Option<String>,
    /// Cookie handed out by the next OpenSessionWithParameters
    pub next_cookie: Option<String>,
    pub cookies: HashMap<String, String>,
    /// Reply of CloseSession; `None` makes it fail
    pub close_result: Option<bool>,
    pub sleep_supported: HashMap<SleepState, bool>,
    pub sleep_allowed: HashMap<SleepState, bool>,
    pub actions_fail: bool,
    pub calls: Vec<String>,
}

impl MockState {
    pub fn seat(mut self, path: &str, id: Option<&str>) -> Self {
        self.seats.push(path.to_string());
        if let Some(id) = id {
            self.seat_ids.insert(path.to_string(), id.to_string());
        }
        self
    }

    pub fn session(mut self, path: &str, id: &str, uid: u32, seat: &str, active: bool) -> Self {
        let key = path.to_string();
        self.sessions.push(key.clone());
        self.session_ids.insert(key.clone(), id.to_string());
        self.session_uids.insert(key.clone(), uid);
        self.session_seats.insert(key.clone(), seat.to_string());
        self.session_types.insert(key.clone(), "x11".to_string());
        self.session_active.insert(key.clone(), active);
        self.seat_sessions
            .entry(seat.to_string())
            .or_default()
            .push(key.clone());
        self.user_sessions.entry(uid).or_default().push(key);
        self
    }

    /// A seat as ConsoleKit reports it: its id is its object path
    pub fn ck_seat(self, path: &str) -> Self {
        self.seat(path, Some(path))
    }

    /// A session as ConsoleKit reports it: its id is its object path
    pub fn ck_session(self, path: &str, uid: u32, seat: &str, active: bool) -> Self {
        self.session(path, path, uid, seat, active)
    }
}

pub(crate) struct MockBackend {
    state: Mutex<MockState>,
}

impl MockBackend {
    pub fn new(state: MockState) -> Self {
        Self {
            state: Mutex::new(state),
        }
    }

    pub fn with<R>(&self, f: impl FnOnce(&mut MockState) -> R) -> R {
        f(&mut self.state.lock().unwrap())
    }

    pub fn calls(&self) -> Vec<String> {
        self.with(|s| s.calls.clone())
    }

    fn record(&self, call: String) {
        self.with(|s| s.calls.push(call));
    }

    fn lookup<T: Clone>(
        &self,
        method: &'static str,
        key: &ObjectPath<'_>,
        map: impl FnOnce(&MockState) -> &HashMap<String, T>,
    ) -> Result<T> {
        self.record(format!("{} {}", method, key.as_str()));
        self.with(|s| map(s).get(key.as_str()).cloned())
            .ok_or_else(|| fail(method))
    }
}

fn paths(list: &[String]) -> Vec<OwnedObjectPath> {
    list.iter().map(|p| op(p)).collect()
}

impl Backend for MockBackend {
    async fn open_session(&self, params: &SessionParameters) -> Result<String> {
        self.record(format!("OpenSessionWithParameters unix-user={}", params.unix_user));
        self.with(|s| s.next_cookie.clone())
            .ok_or_else(|| fail("OpenSessionWithParameters"))
    }

    async fn session_for_cookie(&self, cookie: &str) -> Result<OwnedObjectPath> {
        self.record(format!("GetSessionForCookie {}", cookie));
        self.with(|s| s.cookies.get(cookie).cloned())
            .map(|p| op(&p))
            .ok_or_else(|| fail("GetSessionForCookie"))
    }

    async fn close_session(&self, cookie: &str) -> Result<bool> {
        self.record(format!("CloseSession {}", cookie));
        self.with(|s| s.close_result).ok_or_else(|| fail("CloseSession"))
    }

    async fn sessions(&self) -> Result<Vec<OwnedObjectPath>> {
        self.record("GetSessions".into());
        Ok(self.with(|s| paths(&s.sessions)))
    }

    async fn seats(&self) -> Result<Vec<OwnedObjectPath>> {
        self.record("GetSeats".into());
        Ok(self.with(|s| paths(&s.seats)))
    }

    async fn current_session(&self) -> Result<OwnedObjectPath> {
        self.record("GetCurrentSession".into());
        self.with(|s| s.current_session.clone())
            .map(|p| op(&p))
            .ok_or_else(|| fail("GetCurrentSession"))
    }

    async fn session_for_unix_process(&self, pid: u32) -> Result<OwnedObjectPath> {
        self.record(format!("GetSessionForUnixProcess {}", pid));
        self.with(|s| s.process_sessions.get(&pid).cloned())
            .map(|p| op(&p))
            .ok_or_else(|| fail("GetSessionForUnixProcess"))
    }

    async fn sessions_for_unix_user(&self, uid: u32) -> Result<Vec<OwnedObjectPath>> {
        self.record(format!("GetSessionsForUnixUser {}", uid));
        Ok(self.with(|s| s.user_sessions.get(&uid).map(|l| paths(l)).unwrap_or_default()))
    }

    async fn power_action(&self, action: PowerAction, interactive: bool) -> Result<()> {
        self.record(format!("{} {}", action.method(), interactive));
        if self.with(|s| s.actions_fail) {
            return Err(fail(action.method()));
        }
        Ok(())
    }

    async fn session_id(&self, session: &ObjectPath<'_>) -> Result<String> {
        self.lookup("GetId", session, |s| &s.session_ids)
    }

    async fn session_unix_user(&self, session: &ObjectPath<'_>) -> Result<u32> {
        self.lookup("GetUnixUser", session, |s| &s.session_uids)
    }

    async fn session_seat(&self, session: &ObjectPath<'_>) -> Result<OwnedObjectPath> {
        self.lookup("GetSeatId", session, |s| &s.session_seats)
            .map(|p| op(&p))
    }

    async fn session_type(&self, session: &ObjectPath<'_>) -> Result<String> {
        self.lookup("GetSessionType", session, |s| &s.session_types)
    }

    async fn session_is_active(&self, session: &ObjectPath<'_>) -> Result<bool> {
        self.lookup("IsActive", session, |s| &s.session_active)
    }

    async fn session_remote_host(&self, session: &ObjectPath<'_>) -> Result<String> {
        self.lookup("GetRemoteHostName", session, |s| &s.remote_hosts)
    }

    async fn unlock_session(&self, session: &ObjectPath<'_>) -> Result<()> {
        self.lookup("Unlock", session, |s| &s.session_ids).map(|_| ())
    }

    async fn activate_session(&self, session: &ObjectPath<'_>) -> Result<()> {
        self.lookup("Activate", session, |s| &s.session_ids).map(|_| ())
    }

    async fn seat_id(&self, seat: &ObjectPath<'_>) -> Result<String> {
        self.lookup("GetId", seat, |s| &s.seat_ids)
    }

    async fn seat_sessions(&self, seat: &ObjectPath<'_>) -> Result<Vec<OwnedObjectPath>> {
        self.lookup("GetSessions", seat, |s| &s.seat_sessions)
            .map(|l| paths(&l))
    }

    async fn sleep_supported(&self, state: SleepState) -> Result<bool> {
        self.record(format!("Can{:?}", state));
        self.with(|s| s.sleep_supported.get(&state).copied())
            .ok_or_else(|| fail("CanSuspend"))
    }

    async fn sleep_allowed(&self, state: SleepState) -> Result<bool> {
        self.record(format!("{:?}Allowed", state));
        self.with(|s| s.sleep_allowed.get(&state).copied())
            .ok_or_else(|| fail("SuspendAllowed"))
    }
}
