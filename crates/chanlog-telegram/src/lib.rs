//! Telegram adapter (teloxide).
//!
//! This crate implements the `chanlog-core` ports over the Telegram Bot API.

use std::collections::HashMap;

use async_trait::async_trait;

use teloxide::{
    prelude::*,
    types::{InlineKeyboardButton, InlineKeyboardMarkup, InputFile, ParseMode},
    ApiError, RequestError,
};

pub mod handlers;
pub mod router;

use chanlog_core::{
    domain::{ChatId, MessageId, MessageRef, UserId},
    errors::Error,
    formatting::{escape_html, markdown_to_html, unescape_html},
    messaging::{
        port::{MessagingPort, UserDirectory},
        types::{
            ChatInfo, ChatMessage, InlineKeyboard, Media, MediaKind, MessagingCapabilities,
            SendOptions, UserProfile,
        },
    },
    Result,
};

#[derive(Clone)]
pub struct TelegramMessenger {
    bot: Bot,
    max_message_len: usize,
}

impl TelegramMessenger {
    pub fn new(bot: Bot, max_message_len: usize) -> Self {
        Self {
            bot,
            max_message_len,
        }
    }

    fn tg_chat(chat_id: ChatId) -> teloxide::types::ChatId {
        teloxide::types::ChatId(chat_id.0)
    }

    fn tg_msg_id(message_id: MessageId) -> teloxide::types::MessageId {
        teloxide::types::MessageId(message_id.0)
    }

    fn sent(msg: &Message) -> MessageRef {
        MessageRef::new(ChatId(msg.chat.id.0), MessageId(msg.id.0))
    }

    fn map_err(e: RequestError) -> Error {
        if let RequestError::Api(api) = &e {
            let description = api.to_string();
            match api {
                ApiError::MessageIsTooLong => return Error::ContentTooLarge(description),
                ApiError::BotBlocked | ApiError::BotKicked | ApiError::BotKickedFromSupergroup => {
                    return Error::DestinationForbidden(description)
                }
                _ => {}
            }
            if let Some(err) = classify_description(&description) {
                return err;
            }
        }
        Error::External(format!("telegram error: {e}"))
    }
}

/// Classify Bot API error descriptions that have no dedicated `ApiError` variant.
pub fn classify_description(description: &str) -> Option<Error> {
    let lower = description.to_lowercase();
    if lower.contains("too long") {
        return Some(Error::ContentTooLarge(description.to_string()));
    }
    const FORBIDDEN: [&str; 5] = [
        "chat_write_forbidden",
        "not enough rights to send",
        "have no rights to send",
        "need administrator rights in the channel chat",
        "bot is not a member",
    ];
    if FORBIDDEN.iter().any(|p| lower.contains(p)) {
        return Some(Error::DestinationForbidden(description.to_string()));
    }
    None
}

/// Bot API URLs must be absolute; `buttonurl:example.com` gets `https://`.
fn button_url(raw: &str) -> Option<reqwest::Url> {
    let raw = unescape_html(raw.trim());
    raw.parse::<reqwest::Url>()
        .ok()
        .or_else(|| format!("https://{raw}").parse::<reqwest::Url>().ok())
}

fn tg_keyboard(keyboard: &InlineKeyboard) -> Option<InlineKeyboardMarkup> {
    let rows: Vec<Vec<InlineKeyboardButton>> = keyboard
        .rows
        .iter()
        .map(|row| {
            row.iter()
                .filter_map(|b| match button_url(&b.url) {
                    Some(url) => Some(InlineKeyboardButton::url(b.label.clone(), url)),
                    None => {
                        tracing::warn!(url = %b.url, "dropping button with invalid url");
                        None
                    }
                })
                .collect::<Vec<_>>()
        })
        .filter(|row| !row.is_empty())
        .collect();
    (!rows.is_empty()).then(|| InlineKeyboardMarkup::new(rows))
}

/// Convert a teloxide message into the core message model.
///
/// Bot API hands out plain text plus entities; we keep the plain text,
/// HTML-escaped, which is what the HTML parse mode expects back.
pub fn to_chat_message(msg: &Message) -> ChatMessage {
    ChatMessage {
        reference: TelegramMessenger::sent(msg),
        text: msg.text().map(escape_html),
        caption: msg.caption().map(escape_html),
        media: media_of(msg),
    }
}

fn media_of(msg: &Message) -> Option<Media> {
    if let Some(sizes) = msg.photo() {
        return sizes
            .last()
            .map(|p| Media::cached(MediaKind::Photo, p.file.id.clone()));
    }
    if let Some(a) = msg.animation() {
        return Some(Media::cached(MediaKind::Animation, a.file.id.clone()));
    }
    if let Some(v) = msg.video() {
        return Some(Media::cached(MediaKind::Video, v.file.id.clone()));
    }
    if let Some(a) = msg.audio() {
        return Some(Media::cached(MediaKind::Audio, a.file.id.clone()));
    }
    if let Some(d) = msg.document() {
        return Some(Media::cached(MediaKind::Document, d.file.id.clone()));
    }
    if let Some(v) = msg.voice() {
        return Some(Media::cached(MediaKind::Voice, v.file.id.clone()));
    }
    if let Some(s) = msg.sticker() {
        return Some(Media::cached(MediaKind::Sticker, s.file.id.clone()));
    }
    if let Some(v) = msg.video_note() {
        return Some(Media::cached(MediaKind::VideoNote, v.file.id.clone()));
    }

    let kind = if msg.poll().is_some() {
        MediaKind::Poll
    } else if msg.venue().is_some() {
        MediaKind::Venue
    } else if msg.location().is_some() {
        MediaKind::Location
    } else if msg.contact().is_some() {
        MediaKind::Contact
    } else if msg.dice().is_some() {
        MediaKind::Dice
    } else {
        return None;
    };
    Some(Media {
        kind,
        file_id: None,
    })
}

/// Reply target accepted by both `MessageId`- and `i32`-typed setters
/// (teloxide-core 0.9 types `send_sticker`'s reply id as `i32`).
trait ReplyId {
    fn reply_id(id: MessageId) -> Self;
}

impl ReplyId for teloxide::types::MessageId {
    fn reply_id(id: MessageId) -> Self {
        TelegramMessenger::tg_msg_id(id)
    }
}

impl ReplyId for i32 {
    fn reply_id(id: MessageId) -> Self {
        id.0
    }
}

/// Apply caption, reply target and keyboard to a media request, then send it.
macro_rules! send_media {
    (@common $req:ident, $opts:expr) => {{
        let mut req = $req;
        if let Some(reply_to) = $opts.reply_to {
            req = req.reply_to_message_id(ReplyId::reply_id(reply_to));
        }
        if let Some(markup) = $opts.keyboard.as_ref().and_then(tg_keyboard) {
            req = req.reply_markup(markup);
        }
        req.await.map_err(TelegramMessenger::map_err)?
    }};
    (@bare $req:expr, $opts:expr) => {{
        let req = $req;
        send_media!(@common req, $opts)
    }};
    ($req:expr, $caption:expr, $opts:expr) => {{
        let mut req = $req;
        if !$caption.is_empty() {
            req = req.caption($caption.clone()).parse_mode(ParseMode::Html);
        }
        send_media!(@common req, $opts)
    }};
}

#[async_trait]
impl MessagingPort for TelegramMessenger {
    fn capabilities(&self) -> MessagingCapabilities {
        MessagingCapabilities {
            is_bot: true,
            max_message_len: self.max_message_len,
        }
    }

    async fn send_text(
        &self,
        chat_id: ChatId,
        text: &str,
        opts: SendOptions,
    ) -> Result<MessageRef> {
        let mut req = self
            .bot
            .send_message(Self::tg_chat(chat_id), markdown_to_html(text))
            .parse_mode(ParseMode::Html)
            .disable_web_page_preview(opts.disable_preview);
        if let Some(reply_to) = opts.reply_to {
            req = req.reply_to_message_id(Self::tg_msg_id(reply_to));
        }
        if let Some(markup) = opts.keyboard.as_ref().and_then(tg_keyboard) {
            req = req.reply_markup(markup);
        }
        let msg = req.await.map_err(Self::map_err)?;
        Ok(Self::sent(&msg))
    }

    async fn send_as_file(
        &self,
        chat_id: ChatId,
        text: &str,
        filename: &str,
        caption: &str,
    ) -> Result<MessageRef> {
        let file = InputFile::memory(text.as_bytes().to_vec()).file_name(filename.to_string());
        let msg = self
            .bot
            .send_document(Self::tg_chat(chat_id), file)
            .caption(markdown_to_html(caption))
            .parse_mode(ParseMode::Html)
            .await
            .map_err(Self::map_err)?;
        Ok(Self::sent(&msg))
    }

    async fn send_cached_media(
        &self,
        chat_id: ChatId,
        media: &Media,
        caption: &str,
        opts: SendOptions,
    ) -> Result<MessageRef> {
        let Some(file_id) = media.file_id.clone() else {
            return Err(Error::External(format!(
                "{:?} media has no file id to re-send",
                media.kind
            )));
        };
        let chat = Self::tg_chat(chat_id);
        let file = InputFile::file_id(file_id);
        let caption = markdown_to_html(caption);
        if !media.kind.accepts_caption() {
            if !caption.is_empty() {
                tracing::debug!(kind = ?media.kind, "caption dropped, media kind takes none");
            }
            let msg = match media.kind {
                MediaKind::Sticker => send_media!(@bare self.bot.send_sticker(chat, file), opts),
                _ => send_media!(@bare self.bot.send_video_note(chat, file), opts),
            };
            return Ok(Self::sent(&msg));
        }

        let msg = match media.kind {
            MediaKind::Photo => send_media!(self.bot.send_photo(chat, file), caption, opts),
            MediaKind::Video => send_media!(self.bot.send_video(chat, file), caption, opts),
            MediaKind::Audio => send_media!(self.bot.send_audio(chat, file), caption, opts),
            MediaKind::Animation => {
                send_media!(self.bot.send_animation(chat, file), caption, opts)
            }
            MediaKind::Voice => send_media!(self.bot.send_voice(chat, file), caption, opts),
            _ => send_media!(self.bot.send_document(chat, file), caption, opts),
        };
        Ok(Self::sent(&msg))
    }

    async fn get_message(&self, msg: MessageRef) -> Result<ChatMessage> {
        // Bot API has no "get message by id": forward it into its own chat,
        // read the copy, then drop the copy.
        let chat = Self::tg_chat(msg.chat_id);
        let copy = self
            .bot
            .forward_message(chat, chat, Self::tg_msg_id(msg.message_id))
            .disable_notification(true)
            .await
            .map_err(Self::map_err)?;

        let mut out = to_chat_message(&copy);
        out.reference = msg;

        if let Err(e) = self.bot.delete_message(copy.chat.id, copy.id).await {
            tracing::debug!("failed to clean up lookup copy: {e}");
        }
        Ok(out)
    }

    async fn copy_message(&self, msg: MessageRef, to: ChatId) -> Result<()> {
        self.bot
            .copy_message(
                Self::tg_chat(to),
                Self::tg_chat(msg.chat_id),
                Self::tg_msg_id(msg.message_id),
            )
            .await
            .map_err(Self::map_err)?;
        Ok(())
    }

    async fn forward_message(&self, msg: MessageRef, to: ChatId) -> Result<()> {
        self.bot
            .forward_message(
                Self::tg_chat(to),
                Self::tg_chat(msg.chat_id),
                Self::tg_msg_id(msg.message_id),
            )
            .await
            .map_err(Self::map_err)?;
        Ok(())
    }

    async fn delete_message(&self, msg: MessageRef) -> Result<()> {
        self.bot
            .delete_message(Self::tg_chat(msg.chat_id), Self::tg_msg_id(msg.message_id))
            .await
            .map_err(Self::map_err)?;
        Ok(())
    }

    async fn chat_info(&self, chat_id: ChatId) -> Result<ChatInfo> {
        let chat = self
            .bot
            .get_chat(Self::tg_chat(chat_id))
            .await
            .map_err(Self::map_err)?;
        let members_count = self
            .bot
            .get_chat_member_count(Self::tg_chat(chat_id))
            .await
            .map_err(Self::map_err)?;
        Ok(ChatInfo {
            title: chat.title().map(str::to_string),
            members_count: Some(members_count),
        })
    }
}

#[async_trait]
impl UserDirectory for TelegramMessenger {
    async fn user_dict(&self, user_id: UserId) -> Result<HashMap<String, String>> {
        let chat = self
            .bot
            .get_chat(teloxide::types::ChatId(user_id.0))
            .await
            .map_err(Self::map_err)?;
        let profile = UserProfile {
            id: user_id,
            first_name: chat.first_name().unwrap_or_default().to_string(),
            last_name: chat.last_name().map(str::to_string),
            username: chat.username().map(str::to_string),
        };
        Ok(profile.placeholders())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_forbidden_and_too_long_descriptions() {
        assert!(matches!(
            classify_description("Bad Request: CHAT_WRITE_FORBIDDEN"),
            Some(Error::DestinationForbidden(_))
        ));
        assert!(matches!(
            classify_description("Bad Request: have no rights to send a message"),
            Some(Error::DestinationForbidden(_))
        ));
        assert!(matches!(
            classify_description("Bad Request: message caption is too long"),
            Some(Error::ContentTooLarge(_))
        ));
        assert!(classify_description("Bad Request: chat not found").is_none());
    }

    #[test]
    fn button_urls_are_made_absolute_and_unescaped() {
        let url = button_url("example.com/a?x=1&amp;y=2").unwrap();
        assert_eq!(url.as_str(), "https://example.com/a?x=1&y=2");
        assert_eq!(
            button_url("https://t.me/rules").unwrap().as_str(),
            "https://t.me/rules"
        );
    }

    #[test]
    fn keyboard_conversion_keeps_rows() {
        use chanlog_core::messaging::types::InlineButton;

        let b = |l: &str, u: &str| InlineButton {
            label: l.to_string(),
            url: u.to_string(),
        };
        let kb = InlineKeyboard {
            rows: vec![
                vec![b("a", "https://a.example"), b("b", "https://b.example")],
                vec![b("bad", "")],
            ],
        };
        let markup = tg_keyboard(&kb).unwrap();
        assert_eq!(markup.inline_keyboard.len(), 1);
        assert_eq!(markup.inline_keyboard[0].len(), 2);
    }
}
