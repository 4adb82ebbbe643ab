use std::collections::HashMap;

use crate::{
    domain::{MessageId, MessageRef, UserId},
    formatting::escape_html,
};

/// Kind of media attached to a message.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum MediaKind {
    Photo,
    Video,
    Audio,
    Document,
    Animation,
    Voice,
    Sticker,
    VideoNote,
    // Kinds below never carry a reusable file id.
    Poll,
    Location,
    Contact,
    Venue,
    Dice,
}

impl MediaKind {
    /// Whether the client accepts a caption when re-sending this kind.
    pub fn accepts_caption(self) -> bool {
        matches!(
            self,
            MediaKind::Photo
                | MediaKind::Video
                | MediaKind::Audio
                | MediaKind::Document
                | MediaKind::Animation
                | MediaKind::Voice
        )
    }
}

/// Media attached to a message. `file_id` is the cached-media handle, if any.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Media {
    pub kind: MediaKind,
    pub file_id: Option<String>,
}

impl Media {
    pub fn cached(kind: MediaKind, file_id: impl Into<String>) -> Self {
        Self {
            kind,
            file_id: Some(file_id.into()),
        }
    }
}

/// A message as seen by the logger. `text` and `caption` are HTML.
#[derive(Clone, Debug)]
pub struct ChatMessage {
    pub reference: MessageRef,
    pub text: Option<String>,
    pub caption: Option<String>,
    pub media: Option<Media>,
}

impl ChatMessage {
    pub fn text(reference: MessageRef, text: impl Into<String>) -> Self {
        Self {
            reference,
            text: Some(text.into()),
            caption: None,
            media: None,
        }
    }

    pub fn has_media(&self) -> bool {
        self.media.is_some()
    }

    /// Media that can be re-sent by file id.
    pub fn cached_media(&self) -> Option<&Media> {
        self.media.as_ref().filter(|m| m.file_id.is_some())
    }

    pub fn caption_or_text(&self) -> Option<&str> {
        self.caption
            .as_deref()
            .filter(|c| !c.is_empty())
            .or(self.text.as_deref())
    }
}

/// Inline keyboard attached to an outgoing message.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct InlineKeyboard {
    pub rows: Vec<Vec<InlineButton>>,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct InlineButton {
    pub label: String,
    pub url: String,
}

impl InlineKeyboard {
    pub fn is_empty(&self) -> bool {
        self.rows.iter().all(|r| r.is_empty())
    }

    /// Start a new row with `button`.
    pub fn push_row(&mut self, button: InlineButton) {
        self.rows.push(vec![button]);
    }

    /// Append `button` to the last row (or start one).
    pub fn push_same_row(&mut self, button: InlineButton) {
        match self.rows.last_mut() {
            Some(row) => row.push(button),
            None => self.rows.push(vec![button]),
        }
    }
}

/// Per-send options shared by text and media sends.
#[derive(Clone, Debug, Default)]
pub struct SendOptions {
    pub disable_preview: bool,
    pub reply_to: Option<MessageId>,
    pub keyboard: Option<InlineKeyboard>,
}

impl SendOptions {
    pub fn no_preview() -> Self {
        Self {
            disable_preview: true,
            ..Self::default()
        }
    }
}

/// Subset of chat metadata used for placeholder substitution.
#[derive(Clone, Debug, Default)]
pub struct ChatInfo {
    pub title: Option<String>,
    pub members_count: Option<u32>,
}

/// Public profile of a user.
#[derive(Clone, Debug)]
pub struct UserProfile {
    pub id: UserId,
    pub first_name: String,
    pub last_name: Option<String>,
    pub username: Option<String>,
}

impl UserProfile {
    pub fn full_name(&self) -> String {
        match self.last_name.as_deref().filter(|l| !l.is_empty()) {
            Some(last) => format!("{} {last}", self.first_name),
            None => self.first_name.clone(),
        }
    }

    /// Placeholder map used by welcome-style templates.
    ///
    /// Keys: `id`, `fname`, `lname`, `flname`, `uname`, `mention`.
    /// Every value is HTML-safe.
    pub fn placeholders(&self) -> HashMap<String, String> {
        let flname = escape_html(&self.full_name());
        let mention = format!("<a href=\"tg://user?id={}\">{flname}</a>", self.id.0);
        let uname = self
            .username
            .as_deref()
            .map(|u| format!("@{u}"))
            .unwrap_or_else(|| mention.clone());

        HashMap::from([
            ("id".to_string(), self.id.0.to_string()),
            ("fname".to_string(), escape_html(&self.first_name)),
            (
                "lname".to_string(),
                escape_html(self.last_name.as_deref().unwrap_or_default()),
            ),
            ("flname".to_string(), flname),
            ("uname".to_string(), uname),
            ("mention".to_string(), mention),
        ])
    }
}

/// Capabilities / feature flags of a messenger implementation.
#[derive(Clone, Copy, Debug)]
pub struct MessagingCapabilities {
    /// Bot-type clients may attach inline keyboards; user clients may not.
    pub is_bot: bool,
    pub max_message_len: usize,
}
