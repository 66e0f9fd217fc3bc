//! D-Bus proxies for ConsoleKit and UPower
//!
//! Signatures follow what ConsoleKit actually puts on the wire: session and
//! seat ids are object paths, not strings.

use zbus::proxy;
use zbus::zvariant::{OwnedObjectPath, Value};

#[proxy(
    interface = "org.freedesktop.ConsoleKit.Manager",
    default_service = "org.freedesktop.ConsoleKit",
    default_path = "/org/freedesktop/ConsoleKit/Manager"
)]
pub trait CkManager {
    fn open_session_with_parameters(
        &self,
        parameters: &[&(&str, &Value<'_>)],
    ) -> zbus::Result<String>;

    fn get_session_for_cookie(&self, cookie: &str) -> zbus::Result<OwnedObjectPath>;

    fn close_session(&self, cookie: &str) -> zbus::Result<bool>;

    fn get_sessions(&self) -> zbus::Result<Vec<OwnedObjectPath>>;

    fn get_seats(&self) -> zbus::Result<Vec<OwnedObjectPath>>;

    fn get_current_session(&self) -> zbus::Result<OwnedObjectPath>;

    fn get_session_for_unix_process(&self, pid: u32) -> zbus::Result<OwnedObjectPath>;

    fn get_sessions_for_unix_user(&self, uid: u32) -> zbus::Result<Vec<OwnedObjectPath>>;

    fn power_off(&self, interactive: bool) -> zbus::Result<()>;

    fn reboot(&self, interactive: bool) -> zbus::Result<()>;

    fn suspend(&self, interactive: bool) -> zbus::Result<()>;

    fn hibernate(&self, interactive: bool) -> zbus::Result<()>;

    fn hybrid_sleep(&self, interactive: bool) -> zbus::Result<()>;

    #[zbus(signal)]
    fn seat_added(&self, seat: OwnedObjectPath) -> zbus::Result<()>;

    #[zbus(signal)]
    fn seat_removed(&self, seat: OwnedObjectPath) -> zbus::Result<()>;
}

#[proxy(
    interface = "org.freedesktop.ConsoleKit.Session",
    default_service = "org.freedesktop.ConsoleKit"
)]
pub trait CkSession {
    fn get_id(&self) -> zbus::Result<OwnedObjectPath>;

    fn get_unix_user(&self) -> zbus::Result<u32>;

    fn get_seat_id(&self) -> zbus::Result<OwnedObjectPath>;

    fn get_session_type(&self) -> zbus::Result<String>;

    fn is_active(&self) -> zbus::Result<bool>;

    fn get_remote_host_name(&self) -> zbus::Result<String>;

    fn unlock(&self) -> zbus::Result<()>;

    fn activate(&self) -> zbus::Result<()>;
}

#[proxy(
    interface = "org.freedesktop.ConsoleKit.Seat",
    default_service = "org.freedesktop.ConsoleKit"
)]
pub trait CkSeat {
    fn get_id(&self) -> zbus::Result<OwnedObjectPath>;

    fn get_sessions(&self) -> zbus::Result<Vec<OwnedObjectPath>>;
}

#[proxy(
    interface = "org.freedesktop.UPower",
    default_service = "org.freedesktop.UPower",
    default_path = "/org/freedesktop/UPower"
)]
pub trait UPower {
    /// Whether the kernel and hardware can suspend at all
    #[zbus(property)]
    fn can_suspend(&self) -> zbus::Result<bool>;

    #[zbus(property)]
    fn can_hibernate(&self) -> zbus::Result<bool>;

    /// Whether the caller may suspend without authenticating
    fn suspend_allowed(&self) -> zbus::Result<bool>;

    fn hibernate_allowed(&self) -> zbus::Result<bool>;
}
