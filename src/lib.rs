//! loginkit - systemd-logind compatibility on top of ConsoleKit
//!
//! Programs written against logind get what they expect on hosts that only
//! run ConsoleKit and UPower:
//! - `loginkitd` owns org.freedesktop.login1 and translates its Manager
//!   interface into ConsoleKit/UPower calls
//! - `login`, `journal` and `compat` emulate the sd-login, sd-journal and
//!   sd-daemon client APIs (exported to C with the `capi` feature)
//! - `pam` opens ConsoleKit sessions at login (`pam-module` feature)
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────┐
//! │  daemon (login1)  │  login / journal  │   pam    │
//! ├──────────────────────────────────────────────────┤
//! │     registry (seats, sessions)  │  power         │
//! ├──────────────────────────────────────────────────┤
//! │     backend (ConsoleKit, UPower)                 │
//! ├──────────────────────────────────────────────────┤
//! │     bus (shared system bus handle)               │
//! └──────────────────────────────────────────────────┘
//! ```

pub mod backend;
pub mod bus;
pub mod compat;
pub mod daemon;
pub mod error;
pub mod journal;
pub mod login;
pub mod pam;
pub mod power;
pub mod registry;

#[cfg(feature = "capi")]
pub mod capi;

pub use error::{LoginError, Result};
