//! Power capability mediation and power actions
//!
//! ConsoleKit performs the transitions, UPower knows whether sleep states
//! are available. login1 folds both into one of four answers.

use std::future::Future;
use std::os::fd::OwnedFd;

use crate::backend::{Backend, PowerAction, SleepState};
use crate::error::Result;

/// Answer to a `Can*` query
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Capability {
    Yes,
    No,
    Challenge,
    NotAvailable,
}

impl Capability {
    /// Wire string used by login1
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Yes => "yes",
            Self::No => "no",
            Self::Challenge => "challenge",
            Self::NotAvailable => "na",
        }
    }
}

impl std::fmt::Display for Capability {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Combine a "supported" probe and an "allowed" probe.
///
/// `allowed` only runs when the state is supported.
pub async fn mediate<C, A, F>(can: C, allowed: A) -> Capability
where
    C: Future<Output = Result<bool>>,
    A: FnOnce() -> F,
    F: Future<Output = Result<bool>>,
{
    match can.await {
        Ok(false) => Capability::No,
        Ok(true) => match allowed().await {
            Ok(true) => Capability::Yes,
            Ok(false) => Capability::Challenge,
            Err(_) => Capability::NotAvailable,
        },
        Err(_) => Capability::NotAvailable,
    }
}

pub async fn can_sleep<B: Backend>(backend: &B, state: SleepState) -> Capability {
    mediate(backend.sleep_supported(state), move || {
        backend.sleep_allowed(state)
    })
    .await
}

/// Capability of a power action as reported to login1 clients
pub async fn can<B: Backend>(backend: &B, action: PowerAction) -> Capability {
    match action {
        PowerAction::PowerOff | PowerAction::Reboot => Capability::Yes,
        PowerAction::HybridSleep => Capability::NotAvailable,
        PowerAction::Suspend => can_sleep(backend, SleepState::Suspend).await,
        PowerAction::Hibernate => can_sleep(backend, SleepState::Hibernate).await,
    }
}

pub async fn perform<B: Backend>(backend: &B, action: PowerAction, interactive: bool) -> Result<()> {
    log::info!("{} requested (interactive={})", action.method(), interactive);
    backend.power_action(action, interactive).await
}

/// Hand out an inhibitor descriptor.
///
/// No lock is taken anywhere; the returned pipe end is never written to and
/// closing it has no effect.
pub fn inhibit(what: &str, who: &str, why: &str, mode: &str) -> Result<OwnedFd> {
    log::info!("Inhibit what={} who={} why={} mode={} (not enforced)", what, who, why, mode);
    let (read, _write) = nix::unistd::pipe()?;
    Ok(read)
}
