//! PAM session adapter
//!
//! Opens a ConsoleKit session when a user logs in and publishes the
//! variables login1-aware programs look for:
//! - XDG_SESSION_COOKIE, XDG_SESSION_ID, XDG_SEAT_ID, XDG_SESSION_TYPE
//! - XDG_RUNTIME_DIR, created as `<runtime root>/<uid>`
//!
//! A failure after ConsoleKit has issued the cookie closes the session
//! again before reporting the error.

#[cfg(feature = "pam-module")]
pub mod module;

use std::fs::{DirBuilder, Permissions};
use std::io::ErrorKind;
use std::os::unix::fs::{DirBuilderExt, PermissionsExt};
use std::path::{Path, PathBuf};

use nix::unistd::{chown, Gid, Uid, User};

use crate::backend::{Backend, SessionParameters};
use crate::error::{LoginError, Result};

pub const PAM_SUCCESS: i32 = 0;
pub const PAM_SESSION_ERR: i32 = 14;

pub const ENV_SESSION_COOKIE: &str = "XDG_SESSION_COOKIE";
pub const ENV_SESSION_ID: &str = "XDG_SESSION_ID";
pub const ENV_SEAT_ID: &str = "XDG_SEAT_ID";
pub const ENV_SESSION_TYPE: &str = "XDG_SESSION_TYPE";
pub const ENV_RUNTIME_DIR: &str = "XDG_RUNTIME_DIR";

pub const DEFAULT_RUNTIME_ROOT: &str = "/run/user";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PamOutcome {
    Success,
    SessionError,
}

impl PamOutcome {
    /// PAM return code
    pub fn code(&self) -> i32 {
        match self {
            Self::Success => PAM_SUCCESS,
            Self::SessionError => PAM_SESSION_ERR,
        }
    }
}

/// What the adapter needs from a PAM handle
pub trait PamContext {
    fn user(&self) -> Result<String>;

    fn getenv(&self, name: &str) -> Option<String>;

    fn putenv(&mut self, name: &str, value: &str) -> Result<()>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Account {
    pub uid: u32,
    pub gid: u32,
}

/// User name to account resolution
pub trait AccountDb {
    fn lookup(&self, name: &str) -> Result<Account>;
}

/// The system user database
#[derive(Debug, Default, Clone, Copy)]
pub struct SystemAccounts;

impl AccountDb for SystemAccounts {
    fn lookup(&self, name: &str) -> Result<Account> {
        let user = User::from_name(name)?
            .ok_or_else(|| LoginError::InvalidArgument(format!("unknown user '{}'", name)))?;
        Ok(Account {
            uid: user.uid.as_raw(),
            gid: user.gid.as_raw(),
        })
    }
}

/// Create a user's runtime directory (0755) and hand it to them
pub fn create_runtime_dir(path: &Path, account: Account) -> Result<()> {
    match DirBuilder::new().mode(0o755).create(path) {
        Ok(()) => {}
        Err(e) if e.kind() == ErrorKind::AlreadyExists => {}
        Err(e) => return Err(e.into()),
    }
    std::fs::set_permissions(path, Permissions::from_mode(0o755))?;
    chown(
        path,
        Some(Uid::from_raw(account.uid)),
        Some(Gid::from_raw(account.gid)),
    )?;
    Ok(())
}

pub struct SessionAdapter<B, A = SystemAccounts> {
    backend: B,
    accounts: A,
    runtime_root: PathBuf,
}

impl<B: Backend> SessionAdapter<B> {
    pub fn new(backend: B) -> Self {
        Self::with_accounts(backend, SystemAccounts)
    }
}

impl<B: Backend, A: AccountDb> SessionAdapter<B, A> {
    pub fn with_accounts(backend: B, accounts: A) -> Self {
        Self {
            backend,
            accounts,
            runtime_root: PathBuf::from(DEFAULT_RUNTIME_ROOT),
        }
    }

    pub fn runtime_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.runtime_root = root.into();
        self
    }

    pub async fn open_session<P: PamContext>(&self, pam: &mut P) -> PamOutcome {
        let account = match pam.user().and_then(|name| {
            log::debug!("Opening a session for {}", name);
            self.accounts.lookup(&name)
        }) {
            Ok(account) => account,
            Err(e) => {
                log::error!("Cannot resolve the session user: {}", e);
                return PamOutcome::SessionError;
            }
        };

        let params = SessionParameters {
            unix_user: account.uid,
        };
        let cookie = match self.backend.open_session(&params).await {
            Ok(cookie) => cookie,
            Err(e) => {
                log::error!("Failed to open a session for uid {}: {}", account.uid, e);
                return PamOutcome::SessionError;
            }
        };

        let published = match self.prepare(&cookie, account).await {
            Ok(vars) => publish(pam, &vars),
            Err(e) => Err(e),
        };
        if let Err(e) = published {
            log::error!("Failed to set up the session for uid {}: {}", account.uid, e);
            match self.backend.close_session(&cookie).await {
                Ok(true) => {}
                Ok(false) => log::warn!("ConsoleKit refused to close the failed session"),
                Err(e) => log::warn!("Closing the failed session failed: {}", e),
            }
            return PamOutcome::SessionError;
        }

        log::info!("Opened a session for uid {}", account.uid);
        PamOutcome::Success
    }

    /// Look the session up and create the runtime directory. Nothing is
    /// written to the PAM environment until all of it succeeded.
    async fn prepare(&self, cookie: &str, account: Account) -> Result<Vec<(&'static str, String)>> {
        let session = self.backend.session_for_cookie(cookie).await?;
        let seat = self.backend.session_seat(&session).await?;
        let session_type = self.backend.session_type(&session).await?;

        let runtime_dir = self.runtime_root.join(account.uid.to_string());
        create_runtime_dir(&runtime_dir, account)?;
        let runtime_dir = runtime_dir
            .into_os_string()
            .into_string()
            .map_err(|_| LoginError::InvalidArgument("runtime directory is not UTF-8".into()))?;

        Ok(vec![
            (ENV_SESSION_COOKIE, cookie.to_string()),
            (ENV_SESSION_ID, session.as_str().to_string()),
            (ENV_SEAT_ID, seat.as_str().to_string()),
            (ENV_SESSION_TYPE, session_type),
            (ENV_RUNTIME_DIR, runtime_dir),
        ])
    }

    /// Close the session named by XDG_SESSION_COOKIE
    pub async fn close_session<P: PamContext>(&self, pam: &P) -> PamOutcome {
        let Some(cookie) = pam.getenv(ENV_SESSION_COOKIE) else {
            log::error!("{} is not set", ENV_SESSION_COOKIE);
            return PamOutcome::SessionError;
        };

        match self.backend.close_session(&cookie).await {
            Ok(true) => PamOutcome::Success,
            Ok(false) => {
                log::error!("ConsoleKit refused to close the session");
                PamOutcome::SessionError
            }
            Err(_) => PamOutcome::SessionError,
        }
    }
}

fn publish<P: PamContext>(pam: &mut P, vars: &[(&'static str, String)]) -> Result<()> {
    for (name, value) in vars {
        pam.putenv(name, value)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::mock::{MockBackend, MockState};
    use std::collections::HashMap;
    use std::os::unix::fs::MetadataExt;
    use std::sync::atomic::{AtomicU32, Ordering};

    static COUNTER: AtomicU32 = AtomicU32::new(0);

    fn temp_root() -> PathBuf {
        let n = COUNTER.fetch_add(1, Ordering::SeqCst);
        let path = PathBuf::from(format!("/tmp/loginkit-pam-{}-{}", std::process::id(), n));
        let _ = std::fs::remove_dir_all(&path);
        std::fs::create_dir_all(&path).unwrap();
        path
    }

    #[derive(Default)]
    struct FakePam {
        user: Option<String>,
        env: HashMap<String, String>,
    }

    impl PamContext for FakePam {
        fn user(&self) -> Result<String> {
            self.user
                .clone()
                .ok_or_else(|| LoginError::InvalidArgument("no user".into()))
        }

        fn getenv(&self, name: &str) -> Option<String> {
            self.env.get(name).cloned()
        }

        fn putenv(&mut self, name: &str, value: &str) -> Result<()> {
            self.env.insert(name.to_string(), value.to_string());
            Ok(())
        }
    }

    struct FakeAccounts(Account);

    impl AccountDb for FakeAccounts {
        fn lookup(&self, name: &str) -> Result<Account> {
            if name == "alice" {
                Ok(self.0)
            } else {
                Err(LoginError::InvalidArgument(name.to_string()))
            }
        }
    }

    fn me() -> Account {
        Account {
            uid: nix::unistd::getuid().as_raw(),
            gid: nix::unistd::getgid().as_raw(),
        }
    }

    fn adapter(state: MockState) -> (SessionAdapter<MockBackend, FakeAccounts>, PathBuf) {
        let root = temp_root();
        let adapter = SessionAdapter::with_accounts(MockBackend::new(state), FakeAccounts(me()))
            .runtime_root(&root);
        (adapter, root)
    }

    fn working_session() -> MockState {
        let mut state = MockState::default()
            .seat("/Seat0001", Some("Seat1"))
            .session("/Session0001", "Session1", me().uid, "/Seat0001", true);
        state.next_cookie = Some("C".into());
        state.cookies.insert("C".into(), "/Session0001".into());
        state.close_result = Some(true);
        state
    }

    fn alice() -> FakePam {
        FakePam {
            user: Some("alice".into()),
            ..Default::default()
        }
    }

    #[tokio::test]
    async fn test_open_session_publishes_environment() {
        let (adapter, root) = adapter(working_session());
        let mut pam = alice();

        assert_eq!(adapter.open_session(&mut pam).await, PamOutcome::Success);

        let runtime_dir = root.join(me().uid.to_string());
        assert_eq!(pam.env[ENV_SESSION_COOKIE], "C");
        assert_eq!(pam.env[ENV_SESSION_ID], "/Session0001");
        assert_eq!(pam.env[ENV_SEAT_ID], "/Seat0001");
        assert_eq!(pam.env[ENV_SESSION_TYPE], "x11");
        assert_eq!(pam.env[ENV_RUNTIME_DIR], runtime_dir.to_str().unwrap());

        let meta = std::fs::metadata(&runtime_dir).unwrap();
        assert!(meta.is_dir());
        assert_eq!(meta.mode() & 0o777, 0o755);
        assert_eq!((meta.uid(), meta.gid()), (me().uid, me().gid));

        assert_eq!(
            adapter.backend.calls()[0],
            format!("OpenSessionWithParameters unix-user={}", me().uid)
        );
        assert!(!adapter.backend.calls().iter().any(|c| c.starts_with("CloseSession")));

        std::fs::remove_dir_all(&root).unwrap();
    }

    #[tokio::test]
    async fn test_round_trip() {
        let (adapter, root) = adapter(working_session());
        let mut pam = alice();

        assert_eq!(adapter.open_session(&mut pam).await, PamOutcome::Success);
        assert_eq!(adapter.close_session(&pam).await, PamOutcome::Success);
        assert_eq!(adapter.backend.calls().last().unwrap(), "CloseSession C");

        adapter.backend.with(|s| s.close_result = Some(false));
        assert_eq!(adapter.close_session(&pam).await, PamOutcome::SessionError);

        std::fs::remove_dir_all(&root).unwrap();
    }

    #[tokio::test]
    async fn test_close_without_cookie() {
        let (adapter, root) = adapter(working_session());

        assert_eq!(
            adapter.close_session(&alice()).await,
            PamOutcome::SessionError
        );
        assert!(adapter.backend.calls().is_empty());

        std::fs::remove_dir_all(&root).unwrap();
    }

    #[tokio::test]
    async fn test_compensates_after_cookie() {
        let breakages: [fn(&mut MockState); 3] = [
            |s| {
                s.cookies.clear();
            },
            |s| {
                s.session_seats.clear();
            },
            |s| {
                s.session_types.clear();
            },
        ];

        for breakage in breakages {
            let mut state = working_session();
            breakage(&mut state);
            let (adapter, root) = adapter(state);
            let mut pam = alice();

            assert_eq!(adapter.open_session(&mut pam).await, PamOutcome::SessionError);
            assert_eq!(adapter.backend.calls().last().unwrap(), "CloseSession C");
            assert!(pam.env.is_empty());

            std::fs::remove_dir_all(&root).unwrap();
        }
    }

    #[tokio::test]
    async fn test_compensates_when_runtime_dir_fails() {
        let (adapter, root) = adapter(working_session());
        let adapter = adapter.runtime_root(root.join("missing-parent"));
        let mut pam = alice();

        assert_eq!(adapter.open_session(&mut pam).await, PamOutcome::SessionError);
        assert_eq!(adapter.backend.calls().last().unwrap(), "CloseSession C");
        assert!(pam.env.is_empty());

        std::fs::remove_dir_all(&root).unwrap();
    }

    #[tokio::test]
    async fn test_no_compensation_before_cookie() {
        let (adapter, root) = adapter(working_session());
        let mut stranger = FakePam {
            user: Some("mallory".into()),
            ..Default::default()
        };
        assert_eq!(
            adapter.open_session(&mut stranger).await,
            PamOutcome::SessionError
        );
        assert!(adapter.backend.calls().is_empty());

        adapter.backend.with(|s| s.next_cookie = None);
        assert_eq!(adapter.open_session(&mut alice()).await, PamOutcome::SessionError);
        assert!(!adapter.backend.calls().iter().any(|c| c.starts_with("CloseSession")));

        std::fs::remove_dir_all(&root).unwrap();
    }

    #[test]
    fn test_outcome_codes() {
        assert_eq!(PamOutcome::Success.code(), 0);
        assert_eq!(PamOutcome::SessionError.code(), 14);
    }
}
