pub mod core;

use std::path::PathBuf;

use tracing_subscriber::EnvFilter;

use crate::core::error::{LauncherError, LauncherResult};
use crate::core::launch::{LaunchEvent, LaunchOrchestrator, LaunchRequest};

/// Entry point of the `modlaunch` binary: launches the request file given as
/// the first argument and exits with the game's exit code.
pub fn run() {
    // Initialize structured logging
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,modlaunch_lib=debug")),
        )
        .init();

    tracing::info!("ModLaunch {} starting...", env!("CARGO_PKG_VERSION"));

    let code = match launch_from_args() {
        Ok(code) => code,
        Err(e) => {
            tracing::error!("Launch failed: {}", e);
            1
        }
    };
    std::process::exit(code);
}

fn launch_from_args() -> LauncherResult<i32> {
    let request_path = std::env::args_os()
        .nth(1)
        .map(PathBuf::from)
        .ok_or_else(|| LauncherError::Configuration("usage: modlaunch <request.json>".into()))?;
    let request = LaunchRequest::load(&request_path)?;

    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(async move {
        let orchestrator = LaunchOrchestrator::from_request(request)?;
        let mut handle = orchestrator.launch().await?;

        let mut exit_code = 0;
        loop {
            let polled = tokio::select! {
                event = handle.next_event() => Some(event),
                _ = tokio::signal::ctrl_c() => None,
            };
            let Some(event) = polled else {
                handle.kill();
                continue;
            };
            match event {
                Some(LaunchEvent::Stdout(line)) => println!("{}", line),
                Some(LaunchEvent::Stderr(line)) => eprintln!("{}", line),
                Some(LaunchEvent::Exited { code, signal }) => {
                    exit_code = code.unwrap_or_else(|| 128 + signal.unwrap_or(0));
                }
                None => break,
            }
        }
        Ok(exit_code)
    })
}
