//! Model reply storage keyed by verbatim prompt.

use super::connection::CacheDb;
use super::hash::prompt_key;
use crate::Error;
use tokio_rusqlite::params;
use tokio_rusqlite::rusqlite;

impl CacheDb {
    /// Get the stored reply for a prompt.
    ///
    /// Blank rows read as None.
    pub async fn get_prompt_response(&self, prompt: &str) -> Result<Option<String>, Error> {
        let key = prompt_key(prompt);
        self.conn
            .call(move |conn| -> Result<Option<String>, Error> {
                let result = conn.query_row(
                    "SELECT response FROM prompt_responses WHERE prompt_hash = ?1",
                    params![key],
                    |row| row.get::<_, String>(0),
                );

                match result {
                    Ok(response) if response.trim().is_empty() => Ok(None),
                    Ok(response) => Ok(Some(response)),
                    Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                    Err(e) => Err(e.into()),
                }
            })
            .await
            .map_err(Error::from)
    }

    /// Insert or replace the reply for a prompt.
    pub async fn put_prompt_response(&self, prompt: &str, response: &str) -> Result<(), Error> {
        if response.trim().is_empty() {
            return Err(Error::InvalidInput("refusing to store an empty model reply".into()));
        }

        let key = prompt_key(prompt);
        let prompt = prompt.to_string();
        let response = response.to_string();
        let created_at = chrono::Utc::now().to_rfc3339();

        self.conn
            .call(move |conn| -> Result<(), Error> {
                conn.execute(
                    "INSERT INTO prompt_responses (prompt_hash, prompt, response, created_at)
                    VALUES (?1, ?2, ?3, ?4)
                    ON CONFLICT(prompt_hash) DO UPDATE SET
                        prompt = excluded.prompt,
                        response = excluded.response,
                        created_at = excluded.created_at",
                    params![key, prompt, response, created_at],
                )?;
                Ok(())
            })
            .await
            .map_err(Error::from)
    }

    /// Delete the stored reply for one prompt.
    ///
    /// Returns whether a reply was stored.
    pub async fn delete_prompt_response(&self, prompt: &str) -> Result<bool, Error> {
        let key = prompt_key(prompt);
        self.conn
            .call(move |conn| -> Result<bool, Error> {
                let count = conn.execute("DELETE FROM prompt_responses WHERE prompt_hash = ?1", params![key])?;
                Ok(count > 0)
            })
            .await
            .map_err(Error::from)
    }

    /// Delete every stored model reply.
    pub async fn purge_prompt_responses(&self) -> Result<u64, Error> {
        self.conn
            .call(move |conn| -> Result<u64, Error> {
                let count = conn.execute("DELETE FROM prompt_responses", [])?;
                Ok(count as u64)
            })
            .await
            .map_err(Error::from)
    }
}
