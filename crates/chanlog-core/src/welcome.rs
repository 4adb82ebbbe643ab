//! Per-chat welcome messages, persisted as `{ "<chat id>": <stored id> }`.
//!
//! Values are kept as raw JSON so a hand-edited file with a bad entry still
//! loads; such entries resolve to "nothing stored".

use std::{
    collections::BTreeMap,
    path::{Path, PathBuf},
};

use serde::{Deserialize, Serialize};
use tokio::sync::Mutex;

use crate::{
    domain::{parse_stored_id, ChatId, MessageId},
    Result,
};

/// On-disk shape: chat id (as string key) to stored message id.
#[derive(Debug, Default, Serialize, Deserialize)]
#[serde(transparent)]
struct WelcomeFile {
    entries: BTreeMap<String, serde_json::Value>,
}

pub struct WelcomeStore {
    path: PathBuf,
    file: Mutex<WelcomeFile>,
}

impl WelcomeStore {
    /// Load the store from `path`; a missing file is an empty store.
    pub fn load(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let file = load_welcome_file(&path)?.unwrap_or_default();
        Ok(Self {
            path,
            file: Mutex::new(file),
        })
    }

    /// Stored welcome message for `chat_id`, if a valid one is set.
    pub async fn get(&self, chat_id: ChatId) -> Option<MessageId> {
        let file = self.file.lock().await;
        file.entries.get(&chat_id.0.to_string()).and_then(parse_stored_id)
    }

    pub async fn set(&self, chat_id: ChatId, message_id: MessageId) -> Result<()> {
        let mut file = self.file.lock().await;
        file.entries
            .insert(chat_id.0.to_string(), serde_json::json!(message_id.0));
        save_welcome_file(&self.path, &file)
    }

    /// Returns whether an entry was removed.
    pub async fn remove(&self, chat_id: ChatId) -> Result<bool> {
        let mut file = self.file.lock().await;
        let removed = file.entries.remove(&chat_id.0.to_string()).is_some();
        if removed {
            save_welcome_file(&self.path, &file)?;
        }
        Ok(removed)
    }
}

fn load_welcome_file(path: &Path) -> Result<Option<WelcomeFile>> {
    if !path.exists() {
        return Ok(None);
    }
    let txt = std::fs::read_to_string(path)?;
    if txt.trim().is_empty() {
        return Ok(None);
    }
    Ok(Some(serde_json::from_str(&txt)?))
}

fn save_welcome_file(path: &Path, file: &WelcomeFile) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let txt = serde_json::to_string_pretty(file)?;
    std::fs::write(path, txt)?;
    Ok(())
}
