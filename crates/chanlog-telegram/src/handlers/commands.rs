use std::sync::Arc;

use teloxide::prelude::*;

use chanlog_core::{
    domain::{ChatId, MessageId, UserId},
    formatting::escape_html,
    logger::ForwardRequest,
    security::is_authorized,
};

use crate::{router::AppState, to_chat_message};

use super::reply;

const OWNER_SOURCE: &str = "chanlog.commands.owner";

const HELP: &str = "<b>chanlog</b>\n\n\
/log &lt;text&gt; - write text to the log channel\n\
/store [caption] - (reply) store a message in the log channel\n\
/fwd - (reply) copy a message into the log channel\n\
/setwelcome [caption] - (reply, group) store this chat's welcome message\n\
/delwelcome - remove this chat's welcome message\n\
/showwelcome - preview this chat's welcome message\n\n\
Welcome captions may use {fname} {lname} {flname} {uname} {mention} {id} \
{chat} {count} and [label][buttonurl:https://...] buttons.";

fn parse_command(text: &str) -> (String, String) {
    // Telegram may send `/cmd@botname arg1 ...`
    let mut parts = text.trim().splitn(2, char::is_whitespace);
    let first = parts.next().unwrap_or("").trim();
    let rest = parts.next().unwrap_or("").trim().to_string();

    let cmd = first
        .trim_start_matches('/')
        .split('@')
        .next()
        .unwrap_or("")
        .to_lowercase();

    (cmd, rest)
}

fn non_empty(s: &str) -> Option<&str> {
    (!s.trim().is_empty()).then_some(s)
}

/// Command arguments arrive as plain text; the logger sends HTML.
fn html_arg(args: &str) -> Option<String> {
    non_empty(args).map(escape_html)
}

pub async fn handle_command(msg: Message, state: Arc<AppState>) -> ResponseResult<()> {
    let Some(text) = msg.text() else {
        return Ok(());
    };
    let user_id = msg.from().map(|u| UserId(u.id.0 as i64));
    if !is_authorized(user_id, &state.cfg.telegram_allowed_users) {
        return Ok(());
    }
    let Some(user_id) = user_id else {
        return Ok(());
    };

    let chat_id = ChatId(msg.chat.id.0);
    let msg_id = MessageId(msg.id.0);

    let (allowed, retry_after) = state.rate_limiter.lock().await.check(user_id);
    if !allowed {
        let secs = retry_after.map(|d| d.as_secs_f64().ceil() as u64).unwrap_or(1);
        reply(&state, chat_id, msg_id, &format!("⏳ Rate limited. Try again in {secs}s.")).await;
        return Ok(());
    }

    let (cmd, args) = parse_command(text);
    let arg = html_arg(&args);
    let replied = msg.reply_to_message().map(to_chat_message);

    let outcome: chanlog_core::Result<Option<String>> = match cmd.as_str() {
        "start" | "help" => Ok(Some(HELP.to_string())),

        "log" => match &arg {
            None => Ok(Some("Usage: /log &lt;text&gt;".to_string())),
            Some(body) => state
                .logger
                .log(body, Some(OWNER_SOURCE))
                .await
                .map(|id| Some(format!("📝 Logged. {}", state.logger.get_link(id)))),
        },

        "store" => match &replied {
            None => Ok(Some("Reply to a message to store it.".to_string())),
            Some(m) => state
                .logger
                .store(Some(m), arg.as_deref())
                .await
                .map(|id| Some(format!("💾 Stored. {}", state.logger.get_link(id)))),
        },

        "fwd" => match &replied {
            None => Ok(Some("Reply to a message to forward it.".to_string())),
            Some(m) => state
                .logger
                .fwd_msg(m, Some(OWNER_SOURCE), true)
                .await
                .map(|_| Some("📨 Sent to log channel.".to_string())),
        },

        "setwelcome" => {
            if !(msg.chat.is_group() || msg.chat.is_supergroup()) {
                Ok(Some("Welcome messages only work in groups.".to_string()))
            } else if let Some(m) = &replied {
                match state.logger.store(Some(m), arg.as_deref()).await {
                    Ok(id) => state.welcome.set(chat_id, id).await.map(|_| {
                        let mut note = format!("👋 Welcome message saved. {}", state.logger.get_link(id));
                        if !state.cfg.is_welcome_chat(chat_id) {
                            note.push_str("\n\n⚠️ This chat is not listed in WELCOME_CHATS.");
                        }
                        Some(note)
                    }),
                    Err(e) => Err(e),
                }
            } else {
                Ok(Some("Reply to a message to use it as welcome.".to_string()))
            }
        }

        "delwelcome" => state.welcome.remove(chat_id).await.map(|removed| {
            Some(if removed {
                "🗑 Welcome message removed.".to_string()
            } else {
                "No welcome message set.".to_string()
            })
        }),

        "showwelcome" => match state.welcome.get(chat_id).await {
            None => Ok(Some("No welcome message set.".to_string())),
            Some(stored) => {
                let req = ForwardRequest {
                    message_id: Some(stored),
                    chat_id,
                    user_id,
                    reply_to: Some(msg_id),
                    del_in: state.cfg.msg_delete_timeout,
                };
                state
                    .logger
                    .forward_stored(state.messenger.clone(), &*state.users, req)
                    .await
                    .map(|_| None)
            }
        },

        _ => Ok(Some(format!("Unknown command: /{}", escape_html(&cmd)))),
    };

    match outcome {
        Ok(Some(text)) => reply(&state, chat_id, msg_id, &text).await,
        Ok(None) => {}
        Err(e) => {
            tracing::warn!(command = %cmd, "command failed: {e}");
            reply(
                &state,
                chat_id,
                msg_id,
                &format!("❌ {}", escape_html(&e.to_string())),
            )
            .await;
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_command_with_bot_suffix_and_args() {
        assert_eq!(
            parse_command("/Store@chanlog_bot  my caption "),
            ("store".to_string(), "my caption".to_string())
        );
        assert_eq!(parse_command("/help"), ("help".to_string(), String::new()));
    }

    #[test]
    fn blank_args_are_absent() {
        assert_eq!(non_empty("  "), None);
        assert_eq!(non_empty("x"), Some("x"));
        assert_eq!(html_arg(" "), None);
    }

    #[test]
    fn args_are_escaped_for_html_sends() {
        assert_eq!(html_arg("a<b & c").as_deref(), Some("a&lt;b &amp; c"));
    }
}
