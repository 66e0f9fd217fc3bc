//! Seat and session registries
//!
//! ConsoleKit only hands out object paths. These helpers pair paths with
//! the textual ids the login1 vocabulary uses, and decide which lookups
//! are best-effort and which are strict.

pub mod seat;
pub mod session;

pub use seat::{list_seats, resolve_seat_id, translate_seat_signal, SeatEntry};
pub use session::{
    current_session_for_pid, derive_state, list_sessions_of_uid, list_sessions_on_seat, locate,
    resolve_ssid, SeatSession, SessionState,
};
