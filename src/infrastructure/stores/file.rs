#[cfg(test)]
#[path = "file_test.rs"]
mod tests;

use std::path;

use anyhow::Result;
use async_trait::async_trait;
use tokio::fs;

use crate::configuration::Config;
use crate::configuration::ConfigKey;
use crate::domain::models::Message;
use crate::domain::models::Store;

/// Keeps the transcript as a JSON array of messages in a single file.
pub struct FileStore {
    pub file_path: path::PathBuf,
}

impl Default for FileStore {
    fn default() -> FileStore {
        return FileStore::new(path::PathBuf::from(Config::get(ConfigKey::HistoryFile)));
    }
}

impl FileStore {
    pub fn new(file_path: path::PathBuf) -> FileStore {
        return FileStore { file_path };
    }
}

#[async_trait]
impl Store for FileStore {
    #[allow(clippy::implicit_return)]
    async fn load(&self) -> Result<Vec<Message>> {
        if !self.file_path.exists() {
            return Ok(vec![]);
        }

        let payload = fs::read_to_string(&self.file_path).await?;
        if payload.trim().is_empty() {
            return Ok(vec![]);
        }
        let messages: Vec<Message> = serde_json::from_str(&payload)?;

        return Ok(messages);
    }

    #[allow(clippy::implicit_return)]
    async fn save(&self, messages: &[Message]) -> Result<()> {
        let payload = serde_json::to_string(messages)?;

        if let Some(parent) = self.file_path.parent() {
            if !parent.as_os_str().is_empty() && !parent.exists() {
                fs::create_dir_all(parent).await?;
            }
        }

        fs::write(&self.file_path, payload).await?;

        return Ok(());
    }

    #[allow(clippy::implicit_return)]
    async fn clear(&self) -> Result<()> {
        if !self.file_path.exists() {
            return Ok(());
        }

        fs::remove_file(&self.file_path).await?;
        return Ok(());
    }
}
