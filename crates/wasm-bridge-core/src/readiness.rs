//! Readiness wait loop.
//!
//! Callers suspend here until the embedded module signals readiness. Each
//! iteration races the readiness notification against a short fallback
//! sleep, so per-iteration latency is bounded by the tick even if a
//! notification is missed; the aggregate wait is unbounded only when the
//! module genuinely never becomes ready. There is no cancellation primitive.

use std::time::Duration;

use tokio::time::sleep;

use crate::registry::Registry;

/// Suspend until the registry's readiness flag reads true.
pub(crate) async fn wait_ready(registry: &Registry, fallback_tick: Duration) {
    let mut rx = registry.ready_rx();
    loop {
        if *rx.borrow() {
            return;
        }
        tokio::select! {
            changed = rx.changed() => {
                // The sender lives inside the registry we borrow, so it
                // cannot drop mid-wait; fall back to the tick if it somehow
                // does rather than spinning.
                if changed.is_err() {
                    sleep(fallback_tick).await;
                }
            }
            () = sleep(fallback_tick) => {}
        }
    }
}
