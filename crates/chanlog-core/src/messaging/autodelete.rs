use std::{sync::Arc, time::Duration};

use tokio::task::JoinHandle;

use crate::{domain::MessageRef, messaging::port::MessagingPort};

/// Delete `msg` after `delay` on a background task.
///
/// Fire-and-forget: the caller is never blocked and a failed delete is only
/// logged. A zero delay schedules nothing. If the runtime shuts down first
/// the message is simply kept.
pub fn schedule_delete(
    client: Arc<dyn MessagingPort>,
    msg: MessageRef,
    delay: Duration,
) -> Option<JoinHandle<()>> {
    if delay.is_zero() {
        return None;
    }
    Some(tokio::spawn(async move {
        tokio::time::sleep(delay).await;
        if let Err(e) = client.delete_message(msg).await {
            tracing::debug!(
                chat_id = msg.chat_id.0,
                message_id = msg.message_id.0,
                "auto delete failed: {e}"
            );
        }
    }))
}
