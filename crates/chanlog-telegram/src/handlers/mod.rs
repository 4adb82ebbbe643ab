//! Telegram update handlers.
//!
//! - new chat members in welcome chats get the stored welcome message
//! - slash commands from allowed users drive the channel logger

use std::sync::Arc;

use teloxide::{prelude::*, types::Message};

use chanlog_core::{
    domain::{ChatId, MessageId},
    messaging::{autodelete::schedule_delete, types::SendOptions},
};

use crate::router::AppState;

mod commands;
mod welcome;

pub async fn handle_message(msg: Message, state: Arc<AppState>) -> ResponseResult<()> {
    if msg.new_chat_members().is_some() {
        return welcome::handle_new_members(msg, state).await;
    }

    if msg.text().is_some_and(|t| t.starts_with('/')) {
        return commands::handle_command(msg, state).await;
    }

    Ok(())
}

/// Reply in `chat_id`, auto-deleting after `MSG_DELETE_TIMEOUT`.
///
/// Replies are best-effort: failures are logged, never surfaced.
pub(crate) async fn reply(state: &AppState, chat_id: ChatId, reply_to: MessageId, html: &str) {
    let opts = SendOptions {
        disable_preview: true,
        reply_to: Some(reply_to),
        keyboard: None,
    };
    match state.messenger.send_text(chat_id, html, opts).await {
        Ok(sent) => {
            schedule_delete(state.messenger.clone(), sent, state.cfg.msg_delete_timeout);
        }
        Err(e) => tracing::warn!(chat_id = chat_id.0, "reply failed: {e}"),
    }
}
