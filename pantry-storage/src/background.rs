//! Detached background tasks.

use std::future::Future;

use tokio::task::JoinHandle;
use tracing::{error, info_span, Instrument};

use pantry_core::PantryResult;

/// Spawn `fut` without awaiting it. Errors are logged inside the task.
///
/// The handle is returned for tests; production callers drop it.
pub fn spawn_detached<F>(name: &'static str, fut: F) -> JoinHandle<()>
where
    F: Future<Output = PantryResult<()>> + Send + 'static,
{
    let span = info_span!("background", task = name);
    tokio::spawn(
        async move {
            if let Err(e) = fut.await {
                error!(error = %e, "Background task failed");
            }
        }
        .instrument(span),
    )
}
