use anyhow::Result;
use async_trait::async_trait;

use super::Message;

/// Persistent copy of the transcript. Only the message sequence is stored,
/// never the transient session flags.
#[async_trait]
pub trait Store {
    /// Returns an empty sequence when nothing was stored yet.
    async fn load(&self) -> Result<Vec<Message>>;

    async fn save(&self, messages: &[Message]) -> Result<()>;

    async fn clear(&self) -> Result<()>;
}

pub type StoreBox = Box<dyn Store + Send + Sync>;
