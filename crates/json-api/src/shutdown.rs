//! Stop the server when the process is asked to exit.

use std::{fmt, io, time::Duration};

use salvo::server::ServerHandle;
use thiserror::Error;
use tokio::signal;
use tracing::info;

#[derive(Debug, Error)]
#[error("failed to install {signal} handler")]
pub(crate) struct ShutdownSignalError {
    signal: ExitSignal,
    #[source]
    source: io::Error,
}

#[derive(Debug, Clone, Copy)]
enum ExitSignal {
    Interrupt,
    Terminate,
}

impl fmt::Display for ExitSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Interrupt => "SIGINT",
            Self::Terminate => "SIGTERM",
        })
    }
}

/// Resolve once SIGINT or SIGTERM arrives, then drain in-flight requests for
/// at most `grace` before the server stops.
pub(crate) async fn listen(handle: ServerHandle, grace: Duration) -> Result<(), ShutdownSignalError> {
    let received = wait_for_exit_signal().await?;

    info!(signal = %received, grace_ms = grace.as_millis(), "draining connections");

    handle.stop_graceful(Some(grace));

    Ok(())
}

#[cfg(unix)]
async fn wait_for_exit_signal() -> Result<ExitSignal, ShutdownSignalError> {
    use signal::unix::{SignalKind, signal as unix_signal};

    let install = |signal: ExitSignal, kind: SignalKind| {
        unix_signal(kind).map_err(|source| ShutdownSignalError { signal, source })
    };

    let mut interrupt = install(ExitSignal::Interrupt, SignalKind::interrupt())?;
    let mut terminate = install(ExitSignal::Terminate, SignalKind::terminate())?;

    Ok(tokio::select! {
        _ = interrupt.recv() => ExitSignal::Interrupt,
        _ = terminate.recv() => ExitSignal::Terminate,
    })
}

#[cfg(not(unix))]
async fn wait_for_exit_signal() -> Result<ExitSignal, ShutdownSignalError> {
    signal::ctrl_c()
        .await
        .map_err(|source| ShutdownSignalError {
            signal: ExitSignal::Interrupt,
            source,
        })?;

    Ok(ExitSignal::Interrupt)
}
