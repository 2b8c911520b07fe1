//! Broadcast executor.

use tracing::{info, warn};

use crate::relay::transport::Transport;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BroadcastOutcome {
    pub sent: usize,
    pub failed: usize,
}

/// Send `text` to every recipient, one at a time. Sequential on purpose: a
/// burst of parallel sends is exactly what platform rate limits punish. A
/// failed recipient is counted and skipped, never retried, and never aborts
/// the rest of the batch.
pub async fn broadcast<T: Transport>(
    transport: &T,
    recipients: &[String],
    text: &str,
) -> BroadcastOutcome {
    let mut outcome = BroadcastOutcome::default();
    for recipient in recipients {
        match transport.send_message(recipient, text, None).await {
            Ok(_) => outcome.sent += 1,
            Err(e) => {
                warn!("Broadcast to {recipient} failed: {e}");
                outcome.failed += 1;
            }
        }
    }
    info!("📣 Broadcast done: {} sent, {} failed", outcome.sent, outcome.failed);
    outcome
}
