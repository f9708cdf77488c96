use std::future::Future;
use std::time::Duration;

use tokio::time::Instant;

/// Awaits `operation` and returns its output together with the monotonic time
/// it took, whether the operation succeeded or not.
pub async fn measure<F, T>(operation: F) -> (T, Duration)
where
    F: Future<Output = T>,
{
    let start = Instant::now();
    let result = operation.await;
    (result, start.elapsed())
}
