//! loginkitd - org.freedesktop.login1 on top of ConsoleKit
//!
//! Usage: loginkitd [--run-dir /run] [--prefix systemd] [--replace]

use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use clap::Parser;
use loginkit::bus::{BusHandle, SystemConnector};
use loginkit::daemon::{self, DaemonConfig};

#[derive(Parser)]
#[command(name = "loginkitd")]
#[command(about = "Serve the logind API by translating it to ConsoleKit")]
struct Args {
    /// Root for the runtime marker directories
    #[arg(long, default_value = "/run")]
    run_dir: PathBuf,

    /// Directory under the run dir that clients probe
    #[arg(long, default_value = "systemd")]
    prefix: String,

    /// Take over the bus name from a running instance
    #[arg(long)]
    replace: bool,

    /// Make GetSession fail for sessions ConsoleKit does not know
    #[arg(long)]
    strict_get_session: bool,
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let config = DaemonConfig {
        run_dir: args.run_dir,
        prefix: args.prefix,
        replace: args.replace,
        strict_get_session: args.strict_get_session,
    };
    log::info!("loginkitd starting (markers under {})", config.markers().root().display());

    let bus = Arc::new(BusHandle::new(SystemConnector));
    match daemon::run(config, bus).await {
        Ok(()) => {
            log::info!("loginkitd stopped");
            ExitCode::SUCCESS
        }
        Err(e) => {
            log::error!("loginkitd failed: {}", e);
            ExitCode::FAILURE
        }
    }
}
