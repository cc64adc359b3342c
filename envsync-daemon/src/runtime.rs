use tokio::task::JoinError;

use crate::backend::WatchBackend;
use crate::detector::ChangeDetector;
use crate::error::{io_err, DaemonError};

/// Run `detector` on a fresh multi-threaded runtime, blocking the current
/// thread until Ctrl-C or until the detector fails.
pub fn start_blocking<B>(detector: ChangeDetector<B>) -> Result<(), DaemonError>
where
    B: WatchBackend + 'static,
{
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .map_err(|e| io_err("tokio-runtime", e))?;
    runtime.block_on(run_until_ctrl_c(detector))
}

/// Drive `detector`, stopping it on Ctrl-C.
pub async fn run_until_ctrl_c<B>(detector: ChangeDetector<B>) -> Result<(), DaemonError>
where
    B: WatchBackend + 'static,
{
    let handle = detector.handle();
    let mut detector_task = tokio::spawn(detector.run());

    tokio::select! {
        result = &mut detector_task => return handle_join("detector", result),
        signal = tokio::signal::ctrl_c() => {
            match signal {
                Ok(()) => tracing::info!("received ctrl-c, stopping watcher"),
                Err(err) => tracing::warn!(error = %err, "ctrl-c handler failed, stopping watcher"),
            }
            handle.stop();
        }
    }

    handle_join("detector", detector_task.await)
}

fn handle_join(
    task: &str,
    result: Result<Result<(), DaemonError>, JoinError>,
) -> Result<(), DaemonError> {
    match result {
        Ok(inner) => inner,
        Err(err) => Err(DaemonError::Runtime(format!("{task} task join failure: {err}"))),
    }
}

/// Install the global stderr subscriber. `RUST_LOG` wins; otherwise `info`,
/// or `debug` when `verbose`. Records from `log`-based crates are bridged.
pub fn init_tracing(verbose: bool, json: bool) {
    use tracing_subscriber::{fmt, EnvFilter};

    let fallback = if verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(fallback));
    if json {
        let _ = fmt()
            .json()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .try_init();
    } else {
        let _ = fmt()
            .with_env_filter(filter)
            .with_target(false)
            .with_writer(std::io::stderr)
            .try_init();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn init_tracing_is_idempotent() {
        init_tracing(true, false);
        init_tracing(false, true);
        tracing::debug!("still alive");
    }

    #[tokio::test]
    async fn panicking_task_is_reported_as_runtime_error() {
        let task = tokio::spawn(async {
            if true {
                panic!("boom");
            }
            Ok::<(), DaemonError>(())
        });
        let err = handle_join("watcher", task.await).unwrap_err();
        assert!(matches!(err, DaemonError::Runtime(msg) if msg.contains("watcher")));
    }
}
