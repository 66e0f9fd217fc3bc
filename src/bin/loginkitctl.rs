//! loginkitctl - query sessions and seats through the loginkit library

use std::process::ExitCode;

use clap::{Parser, Subcommand};
use loginkit::{login, LoginError};

#[derive(Parser)]
#[command(name = "loginkitctl")]
#[command(about = "Inspect ConsoleKit sessions with logind vocabulary")]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List the sessions on a seat and their owners
    SeatSessions {
        /// Seat object path (defaults to the caller's seat)
        seat: Option<String>,
    },

    /// Show the state of a session
    SessionStatus {
        /// Session id or object path (defaults to the caller's session)
        ssid: Option<String>,
    },

    /// List the seats a user has sessions on
    UserSeats {
        uid: u32,
        /// Only count active sessions
        #[arg(long)]
        active: bool,
    },

    /// Show the session and owner of a process
    PidSession {
        /// Process id (defaults to loginkitctl itself)
        #[arg(default_value_t = 0)]
        pid: u32,
    },
}

fn run(command: Command) -> Result<(), LoginError> {
    match command {
        Command::SeatSessions { seat } => {
            let (ssids, uids) = login::seat_get_sessions(seat.as_deref())?;
            if ssids.is_empty() {
                println!("No sessions");
            }
            for (ssid, uid) in ssids.iter().zip(&uids) {
                println!("{:<48} {}", ssid, uid);
            }
        }
        Command::SessionStatus { ssid } => {
            let ssid = ssid.as_deref();
            println!("State: {}", login::session_get_state(ssid)?);
            println!("Type:  {}", login::session_get_type(ssid)?);
            println!("Seat:  {}", login::session_get_seat(ssid)?);
            println!("UID:   {}", login::session_get_uid(ssid)?);
            println!("Class: {}", login::session_get_class(ssid)?);
            match login::session_get_remote_host(ssid) {
                Ok(host) if !host.is_empty() => println!("Host:  {}", host),
                _ => {}
            }
        }
        Command::UserSeats { uid, active } => {
            for seat in login::uid_get_seats(uid, active)? {
                println!("{}", seat);
            }
        }
        Command::PidSession { pid } => {
            println!("Session: {}", login::pid_get_session(pid)?);
            println!("Owner:   {}", login::pid_get_owner_uid(pid)?);
        }
    }
    Ok(())
}

fn main() -> ExitCode {
    let args = Args::parse();

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    let result = run(args.command);
    loginkit::bus::shared().close();

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}
