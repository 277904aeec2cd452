//! Classification result storage.
//!
//! Rows are keyed by [`compute_cache_key`](super::hash::compute_cache_key)
//! over (url, content type, facet).

use super::connection::CacheDb;
use crate::Error;
use crate::types::ClassificationResult;
use tokio_rusqlite::params;
use tokio_rusqlite::rusqlite;

impl CacheDb {
    /// Get a stored classification result by key.
    ///
    /// Empty or unparseable rows read as None and are logged; they are
    /// overwritten by the next successful result for the key.
    pub async fn get_result(&self, key_hash: &str) -> Result<Option<ClassificationResult>, Error> {
        let key = key_hash.to_string();
        let row = self
            .conn
            .call(move |conn| -> Result<Option<(String, String, Option<String>, String)>, Error> {
                let result = conn.query_row(
                    "SELECT url, content_type, facet, response_json FROM classification_results WHERE key_hash = ?1",
                    params![key],
                    |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?)),
                );

                match result {
                    Ok(row) => Ok(Some(row)),
                    Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                    Err(e) => Err(e.into()),
                }
            })
            .await
            .map_err(Error::from)?;

        let Some((url, content_type, facet, response_json)) = row else {
            return Ok(None);
        };

        if response_json.trim().is_empty() {
            tracing::warn!(key = key_hash, url = %url, "empty cached classification, treating as miss");
            return Ok(None);
        }

        let response = match serde_json::from_str(&response_json) {
            Ok(value) => value,
            Err(e) => {
                tracing::warn!(key = key_hash, url = %url, "corrupt cached classification, treating as miss: {e}");
                return Ok(None);
            }
        };

        let result = ClassificationResult { url, content_type, facet, response };
        if !result.is_cacheable() {
            tracing::warn!(key = key_hash, url = %result.url, "unusable cached classification, treating as miss");
            return Ok(None);
        }

        Ok(Some(result))
    }

    /// Insert or replace a classification result.
    pub async fn put_result(&self, result: &ClassificationResult) -> Result<(), Error> {
        let key_hash = result.cache_key();
        let url = result.url.clone();
        let content_type = result.content_type.clone();
        let facet = result.facet.clone();
        let response_json = serde_json::to_string(&result.response)?;
        let created_at = chrono::Utc::now().to_rfc3339();

        self.conn
            .call(move |conn| -> Result<(), Error> {
                conn.execute(
                    "INSERT INTO classification_results (key_hash, url, content_type, facet, response_json, created_at)
                    VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                    ON CONFLICT(key_hash) DO UPDATE SET
                        url = excluded.url,
                        content_type = excluded.content_type,
                        facet = excluded.facet,
                        response_json = excluded.response_json,
                        created_at = excluded.created_at",
                    params![key_hash, url, content_type, facet, response_json, created_at],
                )?;
                Ok(())
            })
            .await
            .map_err(Error::from)
    }

    /// Delete classification results with the given content type tag.
    ///
    /// Returns the number of deleted entries.
    pub async fn purge_results(&self, content_type: &str) -> Result<u64, Error> {
        let content_type = content_type.to_string();
        self.conn
            .call(move |conn| -> Result<u64, Error> {
                let count =
                    conn.execute("DELETE FROM classification_results WHERE content_type = ?1", params![content_type])?;
                Ok(count as u64)
            })
            .await
            .map_err(Error::from)
    }
}
