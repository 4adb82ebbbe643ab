//! Channel logger: audit messages into a fixed log channel, store messages
//! there and re-send stored messages later.

use std::{sync::Arc, time::Duration};

use crate::{
    buttons::parse_buttons,
    domain::{ChatId, MessageId, MessageRef, UserId},
    errors::Error,
    formatting::escape_html,
    messaging::{
        autodelete::schedule_delete,
        port::{MessagingPort, UserDirectory},
        types::{ChatMessage, SendOptions},
    },
    template::{format_safe, strip_header, LogTemplate},
    Result,
};

const LOG_FILE_NAME: &str = "logs.log";
const FORWARDING_NOTICE: &str = "**Forwarding Message...**";
const UNTITLED_CHAT: &str = "this group";

/// Parameters of a single `forward_stored` call.
#[derive(Clone, Debug)]
pub struct ForwardRequest {
    /// Stored message id in the log channel. `None` means nothing is stored.
    pub message_id: Option<MessageId>,
    pub chat_id: ChatId,
    pub user_id: UserId,
    pub reply_to: Option<MessageId>,
    /// Delete the sent message after this delay. Zero keeps it.
    pub del_in: Duration,
}

pub struct ChannelLogger {
    client: Arc<dyn MessagingPort>,
    channel: ChatId,
    template: LogTemplate,
}

impl ChannelLogger {
    pub fn new(client: Arc<dyn MessagingPort>, channel: ChatId, name: &str) -> Self {
        Self {
            client,
            channel,
            template: LogTemplate::for_name(name),
        }
    }

    /// Clickable "Preview" link to a message in the log channel.
    pub fn get_link(&self, message_id: MessageId) -> String {
        let raw = self.channel.0.to_string();
        let internal = raw.get(4..).unwrap_or_default();
        let link = format!("https://t.me/c/{internal}/{}", message_id.0);
        format!("<b><a href='{link}'>Preview</a></b>")
    }

    fn template_for(&self, name: Option<&str>) -> LogTemplate {
        match name.filter(|n| !n.is_empty()) {
            Some(n) => LogTemplate::for_name(n),
            None => self.template.clone(),
        }
    }

    /// Send `text` to the log channel, falling back to a `logs.log`
    /// attachment when it is too long for a message.
    pub async fn log(&self, text: &str, name: Option<&str>) -> Result<MessageId> {
        let template = self.template_for(name);
        let rendered = template.render(text.trim());

        let limit = self.client.capabilities().max_message_len;
        if rendered.chars().count() <= limit {
            match self
                .client
                .send_text(self.channel, &rendered, SendOptions::no_preview())
                .await
            {
                Ok(msg) => return Ok(msg.message_id),
                Err(Error::ContentTooLarge(reason)) => {
                    tracing::debug!("log message rejected as too long ({reason}), sending as file");
                }
                Err(e) => return Err(e),
            }
        }

        let msg = self
            .client
            .send_as_file(self.channel, &rendered, LOG_FILE_NAME, &template.raw())
            .await?;
        Ok(msg.message_id)
    }

    /// Copy (or forward) a received message into the log channel.
    ///
    /// Messages without media are logged as text instead.
    pub async fn fwd_msg(
        &self,
        message: &ChatMessage,
        name: Option<&str>,
        as_copy: bool,
    ) -> Result<()> {
        if !message.has_media() {
            self.log(message.text.as_deref().unwrap_or_default(), name)
                .await?;
            return Ok(());
        }

        self.log(FORWARDING_NOTICE, name).await?;
        let sent = if as_copy {
            self.client
                .copy_message(message.reference, self.channel)
                .await
        } else {
            self.client
                .forward_message(message.reference, self.channel)
                .await
        };
        match sent {
            Err(Error::DestinationForbidden(reason)) => {
                tracing::debug!("log channel refused forwarded message: {reason}");
                Ok(())
            }
            other => other,
        }
    }

    /// Store a message (or just a caption) in the log channel and return its id.
    pub async fn store(
        &self,
        message: Option<&ChatMessage>,
        caption: Option<&str>,
    ) -> Result<MessageId> {
        let mut caption = caption.unwrap_or_default().to_string();
        if caption.is_empty() {
            if let Some(own) = message.and_then(|m| m.caption.as_deref()) {
                caption = own.to_string();
            }
        }

        let Some(media) = message.and_then(|m| m.cached_media()) else {
            return self.log(&caption, None).await;
        };

        if !caption.is_empty() {
            caption = self.template.render(caption.trim());
        }
        let msg = self
            .client
            .send_cached_media(self.channel, media, &caption, SendOptions::default())
            .await?;
        Ok(msg.message_id)
    }

    /// Re-send a stored message to `req.chat_id` through `client`.
    ///
    /// The stored caption loses its log header, gets `{placeholders}` filled
    /// from `users` plus `{chat}`/`{count}`, and has its button markup turned
    /// into an inline keyboard (bot clients only). A destination that refuses
    /// writes makes the whole call a silent no-op.
    pub async fn forward_stored(
        &self,
        client: Arc<dyn MessagingPort>,
        users: &dyn UserDirectory,
        req: ForwardRequest,
    ) -> Result<()> {
        let Some(message_id) = req.message_id.filter(|id| id.0 > 0) else {
            return Ok(());
        };

        let stored = client
            .get_message(MessageRef::new(self.channel, message_id))
            .await?;

        let mut caption = stored
            .caption_or_text()
            .map(|c| strip_header(c).to_string())
            .unwrap_or_default();

        if !caption.is_empty() {
            let mut values = users.user_dict(req.user_id).await?;
            let chat = client.chat_info(req.chat_id).await?;
            values.insert(
                "chat".to_string(),
                chat.title
                    .filter(|t| !t.is_empty())
                    .map(|t| escape_html(&t))
                    .unwrap_or_else(|| UNTITLED_CHAT.to_string()),
            );
            if let Some(count) = chat.members_count {
                values.insert("count".to_string(), count.to_string());
            }
            caption = format_safe(&caption, &values);
        }

        let (caption, keyboard) = parse_buttons(&caption);
        let opts = SendOptions {
            disable_preview: true,
            reply_to: req.reply_to,
            keyboard: keyboard.filter(|_| client.capabilities().is_bot),
        };

        let sent = match stored.cached_media() {
            Some(media) => {
                client
                    .send_cached_media(req.chat_id, media, &caption, opts)
                    .await
            }
            None => client.send_text(req.chat_id, &caption, opts).await,
        };

        match sent {
            Ok(msg) => {
                schedule_delete(client, msg, req.del_in);
                Ok(())
            }
            Err(Error::DestinationForbidden(reason)) => {
                tracing::debug!(chat_id = req.chat_id.0, "stored message not sent: {reason}");
                Ok(())
            }
            Err(e) => Err(e),
        }
    }
}
