//! org.freedesktop.login1.Manager interface

use zbus::{
    fdo, interface,
    object_server::SignalEmitter,
    zvariant::{ObjectPath, OwnedFd, OwnedObjectPath},
};

use super::dispatch::Dispatcher;
use crate::backend::{Backend, PowerAction};
use crate::registry::SeatEntry;

pub struct LoginManagerInterface<B> {
    dispatcher: Dispatcher<B>,
}

impl<B: Backend + 'static> LoginManagerInterface<B> {
    pub fn new(dispatcher: Dispatcher<B>) -> Self {
        Self { dispatcher }
    }

    /// Emit SeatNew signal
    pub async fn emit_seat_new(emitter: &SignalEmitter<'_>, seat: &SeatEntry) -> zbus::Result<()> {
        Self::seat_new(emitter, &seat.id, seat.path.as_ref()).await
    }

    /// Emit SeatRemoved signal
    pub async fn emit_seat_removed(
        emitter: &SignalEmitter<'_>,
        seat: &SeatEntry,
    ) -> zbus::Result<()> {
        Self::seat_removed(emitter, &seat.id, seat.path.as_ref()).await
    }
}

#[interface(name = "org.freedesktop.login1.Manager")]
impl<B: Backend + 'static> LoginManagerInterface<B> {
    async fn unlock_session(&self, session_id: &str) -> fdo::Result<()> {
        log::debug!("D-Bus UnlockSession: {}", session_id);
        self.dispatcher.unlock_session(session_id).await;
        Ok(())
    }

    async fn activate_session_on_seat(&self, session_id: &str, seat_id: &str) -> fdo::Result<()> {
        log::debug!("D-Bus ActivateSessionOnSeat: {} {}", session_id, seat_id);
        self.dispatcher
            .activate_session_on_seat(session_id, seat_id)
            .await;
        Ok(())
    }

    /// List seats as (id, object path) pairs
    async fn list_seats(&self) -> fdo::Result<Vec<SeatEntry>> {
        Ok(self.dispatcher.list_seats().await?)
    }

    async fn get_session(&self, session_id: &str) -> fdo::Result<OwnedObjectPath> {
        Ok(self.dispatcher.get_session(session_id).await?)
    }

    async fn can_power_off(&self) -> String {
        self.dispatcher.can(PowerAction::PowerOff).await.to_string()
    }

    async fn can_reboot(&self) -> String {
        self.dispatcher.can(PowerAction::Reboot).await.to_string()
    }

    async fn can_suspend(&self) -> String {
        self.dispatcher.can(PowerAction::Suspend).await.to_string()
    }

    async fn can_hibernate(&self) -> String {
        self.dispatcher.can(PowerAction::Hibernate).await.to_string()
    }

    async fn can_hybrid_sleep(&self) -> String {
        self.dispatcher.can(PowerAction::HybridSleep).await.to_string()
    }

    /// Take an inhibitor lock. Nothing is actually inhibited.
    async fn inhibit(&self, what: &str, who: &str, why: &str, mode: &str) -> fdo::Result<OwnedFd> {
        let fd = self.dispatcher.inhibit(what, who, why, mode)?;
        Ok(OwnedFd::from(fd))
    }

    async fn power_off(&self, interactive: bool) -> fdo::Result<()> {
        Ok(self.dispatcher.power(PowerAction::PowerOff, interactive).await?)
    }

    async fn reboot(&self, interactive: bool) -> fdo::Result<()> {
        Ok(self.dispatcher.power(PowerAction::Reboot, interactive).await?)
    }

    async fn suspend(&self, interactive: bool) -> fdo::Result<()> {
        Ok(self.dispatcher.power(PowerAction::Suspend, interactive).await?)
    }

    async fn hibernate(&self, interactive: bool) -> fdo::Result<()> {
        Ok(self.dispatcher.power(PowerAction::Hibernate, interactive).await?)
    }

    async fn hybrid_sleep(&self, interactive: bool) -> fdo::Result<()> {
        Ok(self
            .dispatcher
            .power(PowerAction::HybridSleep, interactive)
            .await?)
    }

    /// A seat appeared
    #[zbus(signal)]
    async fn seat_new(
        emitter: &SignalEmitter<'_>,
        seat_id: &str,
        object_path: ObjectPath<'_>,
    ) -> zbus::Result<()>;

    /// A seat went away
    #[zbus(signal)]
    async fn seat_removed(
        emitter: &SignalEmitter<'_>,
        seat_id: &str,
        object_path: ObjectPath<'_>,
    ) -> zbus::Result<()>;
}
