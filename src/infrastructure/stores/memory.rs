use std::sync::Arc;
use std::sync::Mutex;

use anyhow::anyhow;
use anyhow::Result;
use async_trait::async_trait;

use crate::domain::models::Message;
use crate::domain::models::Store;

/// Store that lives as long as the process. Clones share the same transcript.
#[derive(Clone, Default)]
pub struct MemoryStore {
    messages: Arc<Mutex<Vec<Message>>>,
}

#[async_trait]
impl Store for MemoryStore {
    #[allow(clippy::implicit_return)]
    async fn load(&self) -> Result<Vec<Message>> {
        let messages = self
            .messages
            .lock()
            .map_err(|_| return anyhow!("Memory store lock poisoned"))?;

        return Ok(messages.clone());
    }

    #[allow(clippy::implicit_return)]
    async fn save(&self, messages: &[Message]) -> Result<()> {
        let mut stored = self
            .messages
            .lock()
            .map_err(|_| return anyhow!("Memory store lock poisoned"))?;
        *stored = messages.to_vec();

        return Ok(());
    }

    #[allow(clippy::implicit_return)]
    async fn clear(&self) -> Result<()> {
        return self.save(&[]).await;
    }
}
