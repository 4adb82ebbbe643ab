use std::collections::HashMap;

use async_trait::async_trait;

use crate::{
    domain::{ChatId, MessageRef, UserId},
    messaging::types::{ChatInfo, ChatMessage, Media, MessagingCapabilities, SendOptions},
    Result,
};

/// Messaging client port.
///
/// Bot and user clients fit behind the same interface; behavior that differs
/// between them is expressed through `MessagingCapabilities`.
#[async_trait]
pub trait MessagingPort: Send + Sync {
    fn capabilities(&self) -> MessagingCapabilities;

    async fn send_text(&self, chat_id: ChatId, text: &str, opts: SendOptions)
        -> Result<MessageRef>;

    /// Send `text` as a document attachment named `filename`.
    async fn send_as_file(
        &self,
        chat_id: ChatId,
        text: &str,
        filename: &str,
        caption: &str,
    ) -> Result<MessageRef>;

    /// Re-send previously uploaded media by its file id.
    async fn send_cached_media(
        &self,
        chat_id: ChatId,
        media: &Media,
        caption: &str,
        opts: SendOptions,
    ) -> Result<MessageRef>;

    async fn get_message(&self, msg: MessageRef) -> Result<ChatMessage>;

    /// Copy without the forward header.
    async fn copy_message(&self, msg: MessageRef, to: ChatId) -> Result<()>;
    async fn forward_message(&self, msg: MessageRef, to: ChatId) -> Result<()>;
    async fn delete_message(&self, msg: MessageRef) -> Result<()>;

    async fn chat_info(&self, chat_id: ChatId) -> Result<ChatInfo>;
}

/// User directory port: maps a user id to template placeholder values.
#[async_trait]
pub trait UserDirectory: Send + Sync {
    async fn user_dict(&self, user_id: UserId) -> Result<HashMap<String, String>>;
}
