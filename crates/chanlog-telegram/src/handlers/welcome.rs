use std::sync::Arc;

use teloxide::{prelude::*, types::Message};

use chanlog_core::{
    domain::{ChatId, MessageId, UserId},
    logger::ForwardRequest,
};

use crate::router::AppState;

/// Only groups listed in `WELCOME_CHATS` greet newcomers.
fn greets_in(is_group: bool, chat_id: ChatId, welcome_chats: &[i64]) -> bool {
    is_group && welcome_chats.contains(&chat_id.0)
}

/// New members worth greeting: everyone but bots.
fn humans(members: impl IntoIterator<Item = (UserId, bool)>) -> Vec<UserId> {
    members
        .into_iter()
        .filter(|(_, is_bot)| !is_bot)
        .map(|(id, _)| id)
        .collect()
}

/// Welcome each new human member of a welcome-enabled group.
pub async fn handle_new_members(msg: Message, state: Arc<AppState>) -> ResponseResult<()> {
    let chat_id = ChatId(msg.chat.id.0);
    let is_group = msg.chat.is_group() || msg.chat.is_supergroup();
    if !greets_in(is_group, chat_id, &state.cfg.welcome_chats) {
        return Ok(());
    }
    let Some(members) = msg.new_chat_members() else {
        return Ok(());
    };
    let Some(stored) = state.welcome.get(chat_id).await else {
        tracing::debug!(chat_id = chat_id.0, "no welcome message stored");
        return Ok(());
    };

    let newcomers = humans(members.iter().map(|u| (UserId(u.id.0 as i64), u.is_bot)));
    for user_id in newcomers {
        let req = ForwardRequest {
            message_id: Some(stored),
            chat_id,
            user_id,
            reply_to: Some(MessageId(msg.id.0)),
            del_in: state.cfg.welcome_delete_timeout,
        };
        if let Err(e) = state
            .logger
            .forward_stored(state.messenger.clone(), &*state.users, req)
            .await
        {
            tracing::warn!(
                chat_id = chat_id.0,
                user_id = user_id.0,
                "welcome failed: {e}"
            );
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn only_listed_groups_greet() {
        let listed = [-1001, -1002];
        assert!(greets_in(true, ChatId(-1001), &listed));
        assert!(!greets_in(true, ChatId(-1003), &listed));
        // A private chat never greets, even if its id is listed.
        assert!(!greets_in(false, ChatId(-1001), &listed));
        assert!(!greets_in(true, ChatId(-1001), &[]));
    }

    #[test]
    fn bots_are_not_greeted() {
        let joined = [(UserId(1), false), (UserId(2), true), (UserId(3), false)];
        assert_eq!(humans(joined), vec![UserId(1), UserId(3)]);
        assert!(humans([(UserId(9), true)]).is_empty());
    }
}
