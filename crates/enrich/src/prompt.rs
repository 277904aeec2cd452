//! Model replies memoized by verbatim prompt.

use lessonlens_client::CompletionClient;
use lessonlens_core::{CacheDb, CacheStats, StatsSnapshot};
use std::sync::Arc;

/// Get-or-compute memoization of model replies.
///
/// Only non-empty replies are stored. Entries are never evicted except by
/// an explicit purge or [`PromptCache::forget`].
pub struct PromptCache {
    db: CacheDb,
    client: Arc<dyn CompletionClient>,
    max_tokens: u32,
    stats: CacheStats,
}

impl PromptCache {
    pub fn new(db: CacheDb, client: Arc<dyn CompletionClient>, max_tokens: u32) -> Self {
        Self { db, client, max_tokens, stats: CacheStats::new() }
    }

    pub fn stats(&self) -> StatsSnapshot {
        self.stats.snapshot()
    }

    /// Reply to `prompt`, from the store or from the model.
    ///
    /// Returns None when the model call fails or the reply is empty; neither
    /// outcome is stored, so the next call asks again.
    pub async fn ask(&self, prompt: &str) -> Option<String> {
        match self.db.get_prompt_response(prompt).await {
            Ok(Some(reply)) => {
                self.stats.record_hit();
                return Some(reply);
            }
            Ok(None) => self.stats.record_miss(),
            Err(e) => {
                tracing::warn!("prompt cache read failed, asking the model: {e}");
                self.stats.record_miss();
            }
        }

        let reply = match self.client.complete(prompt, self.max_tokens).await {
            Ok(reply) if reply.trim().is_empty() => {
                tracing::warn!("model returned an empty reply");
                return None;
            }
            Ok(reply) => reply,
            Err(e) => {
                tracing::warn!("model call failed: {e}");
                return None;
            }
        };

        if let Err(e) = self.db.put_prompt_response(prompt, &reply).await {
            tracing::warn!("failed to store model reply: {e}");
        }

        Some(reply)
    }

    /// Drop the stored reply for `prompt`, so the next `ask` reaches the model.
    pub async fn forget(&self, prompt: &str) {
        if let Err(e) = self.db.delete_prompt_response(prompt).await {
            tracing::warn!("failed to drop model reply: {e}");
        }
    }
}
