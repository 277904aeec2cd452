//! Page content and extracted text storage.
//!
//! Raw bytes and extracted text live in separate tables so a change to the
//! extraction step never forces a re-download. Both are keyed by
//! [`url_key`](super::hash::url_key) of the canonical URL.

use super::connection::CacheDb;
use crate::Error;
use serde::{Deserialize, Serialize};
use tokio_rusqlite::params;
use tokio_rusqlite::rusqlite;

/// A fetched page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ContentRecord {
    pub url_hash: String,
    pub url: String,
    pub content_type: Option<String>,
    pub raw_content: Option<Vec<u8>>,
    /// Extracted text, `None` until extraction has run.
    pub extracted_text: Option<String>,
    pub status_code: Option<i32>,
    pub fetched_at: String,
    pub fetch_ms: Option<i64>,
}

impl CacheDb {
    /// Insert or replace the raw content of a page.
    pub async fn put_content(&self, record: &ContentRecord) -> Result<(), Error> {
        let record = record.clone();
        self.conn
            .call(move |conn| -> Result<(), Error> {
                conn.execute(
                    "INSERT INTO page_content (url_hash, url, content_type, raw_bytes, status_code, fetched_at, fetch_ms)
                    VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)
                    ON CONFLICT(url_hash) DO UPDATE SET
                        url = excluded.url,
                        content_type = excluded.content_type,
                        raw_bytes = excluded.raw_bytes,
                        status_code = excluded.status_code,
                        fetched_at = excluded.fetched_at,
                        fetch_ms = excluded.fetch_ms",
                    params![
                        &record.url_hash,
                        &record.url,
                        &record.content_type,
                        &record.raw_content,
                        &record.status_code,
                        &record.fetched_at,
                        &record.fetch_ms,
                    ],
                )?;
                Ok(())
            })
            .await
            .map_err(Error::from)
    }

    /// Get a page by URL hash, together with its extracted text if any.
    ///
    /// Returns None if the page was never fetched.
    pub async fn get_content(&self, url_hash: &str) -> Result<Option<ContentRecord>, Error> {
        let url_hash = url_hash.to_string();
        self.conn
            .call(move |conn| -> Result<Option<ContentRecord>, Error> {
                let mut stmt = conn.prepare(
                    "SELECT c.url_hash, c.url, c.content_type, c.raw_bytes, t.text,
                            c.status_code, c.fetched_at, c.fetch_ms
                    FROM page_content c
                    LEFT JOIN page_text t ON t.url_hash = c.url_hash
                    WHERE c.url_hash = ?1",
                )?;

                let result = stmt.query_row(params![url_hash], |row| {
                    Ok(ContentRecord {
                        url_hash: row.get(0)?,
                        url: row.get(1)?,
                        content_type: row.get(2)?,
                        raw_content: row.get(3)?,
                        extracted_text: row.get(4)?,
                        status_code: row.get(5)?,
                        fetched_at: row.get(6)?,
                        fetch_ms: row.get(7)?,
                    })
                });

                match result {
                    Ok(record) => Ok(Some(record)),
                    Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                    Err(e) => Err(e.into()),
                }
            })
            .await
            .map_err(Error::from)
    }

    /// Get the extracted text of a page.
    ///
    /// `Some("")` means extraction ran and produced nothing; `None` means it
    /// never ran.
    pub async fn get_text(&self, url_hash: &str) -> Result<Option<String>, Error> {
        let url_hash = url_hash.to_string();
        self.conn
            .call(move |conn| -> Result<Option<String>, Error> {
                let result =
                    conn.query_row("SELECT text FROM page_text WHERE url_hash = ?1", params![url_hash], |row| {
                        row.get(0)
                    });

                match result {
                    Ok(text) => Ok(Some(text)),
                    Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                    Err(e) => Err(e.into()),
                }
            })
            .await
            .map_err(Error::from)
    }

    /// Insert or replace the extracted text of a page.
    pub async fn put_text(&self, url_hash: &str, url: &str, text: &str, extractor: &str) -> Result<(), Error> {
        let url_hash = url_hash.to_string();
        let url = url.to_string();
        let text = text.to_string();
        let extractor = extractor.to_string();
        let extracted_at = chrono::Utc::now().to_rfc3339();

        self.conn
            .call(move |conn| -> Result<(), Error> {
                conn.execute(
                    "INSERT INTO page_text (url_hash, url, text, extractor, extracted_at)
                    VALUES (?1, ?2, ?3, ?4, ?5)
                    ON CONFLICT(url_hash) DO UPDATE SET
                        url = excluded.url,
                        text = excluded.text,
                        extractor = excluded.extractor,
                        extracted_at = excluded.extracted_at",
                    params![url_hash, url, text, extractor, extracted_at],
                )?;
                Ok(())
            })
            .await
            .map_err(Error::from)
    }

    /// Delete pages and their text by domain pattern.
    ///
    /// Returns the number of deleted pages.
    pub async fn purge_content_by_domain(&self, domain: &str) -> Result<u64, Error> {
        let pattern = format!("%{domain}%");
        self.conn
            .call(move |conn| -> Result<u64, Error> {
                let tx = conn.transaction()?;
                tx.execute("DELETE FROM page_text WHERE url LIKE ?1", params![pattern])?;
                let count = tx.execute("DELETE FROM page_content WHERE url LIKE ?1", params![pattern])?;
                tx.commit()?;
                Ok(count as u64)
            })
            .await
            .map_err(Error::from)
    }

    /// Delete every extracted text, keeping raw content.
    ///
    /// The next text request re-runs extraction on the stored bytes.
    pub async fn purge_all_text(&self) -> Result<u64, Error> {
        self.conn
            .call(move |conn| -> Result<u64, Error> {
                let count = conn.execute("DELETE FROM page_text", [])?;
                Ok(count as u64)
            })
            .await
            .map_err(Error::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::hash::url_key;

    fn make_record(url: &str) -> ContentRecord {
        ContentRecord {
            url_hash: url_key(url),
            url: url.to_string(),
            content_type: Some("text/html".to_string()),
            raw_content: Some(b"<html><body><p>Atoms</p></body></html>".to_vec()),
            extracted_text: None,
            status_code: Some(200),
            fetched_at: chrono::Utc::now().to_rfc3339(),
            fetch_ms: Some(42),
        }
    }

    #[tokio::test]
    async fn test_put_and_get_content() {
        let db = CacheDb::open_in_memory().await.unwrap();
        let record = make_record("https://example.edu/lesson");

        db.put_content(&record).await.unwrap();

        let retrieved = db.get_content(&record.url_hash).await.unwrap().unwrap();
        assert_eq!(retrieved, record);
    }

    #[tokio::test]
    async fn test_get_missing_content() {
        let db = CacheDb::open_in_memory().await.unwrap();
        assert!(db.get_content(&url_key("https://nowhere.example/")).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_text_is_stored_separately() {
        let db = CacheDb::open_in_memory().await.unwrap();
        let record = make_record("https://example.edu/lesson");
        db.put_content(&record).await.unwrap();

        assert!(db.get_text(&record.url_hash).await.unwrap().is_none());

        db.put_text(&record.url_hash, &record.url, "Atoms", "html").await.unwrap();
        assert_eq!(db.get_text(&record.url_hash).await.unwrap().as_deref(), Some("Atoms"));

        let joined = db.get_content(&record.url_hash).await.unwrap().unwrap();
        assert_eq!(joined.extracted_text.as_deref(), Some("Atoms"));
    }

    #[tokio::test]
    async fn test_empty_text_is_a_cached_value() {
        let db = CacheDb::open_in_memory().await.unwrap();
        let hash = url_key("https://example.edu/empty");
        db.put_text(&hash, "https://example.edu/empty", "", "html").await.unwrap();
        assert_eq!(db.get_text(&hash).await.unwrap().as_deref(), Some(""));
    }

    #[tokio::test]
    async fn test_purge_content_by_domain() {
        let db = CacheDb::open_in_memory().await.unwrap();
        let a = make_record("https://example.edu/a");
        let b = make_record("https://other.org/b");
        db.put_content(&a).await.unwrap();
        db.put_content(&b).await.unwrap();
        db.put_text(&a.url_hash, &a.url, "a", "html").await.unwrap();

        let deleted = db.purge_content_by_domain("example.edu").await.unwrap();
        assert_eq!(deleted, 1);
        assert!(db.get_content(&a.url_hash).await.unwrap().is_none());
        assert!(db.get_text(&a.url_hash).await.unwrap().is_none());
        assert!(db.get_content(&b.url_hash).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_purge_all_text_keeps_content() {
        let db = CacheDb::open_in_memory().await.unwrap();
        let a = make_record("https://example.edu/a");
        db.put_content(&a).await.unwrap();
        db.put_text(&a.url_hash, &a.url, "a", "html").await.unwrap();

        assert_eq!(db.purge_all_text().await.unwrap(), 1);
        assert!(db.get_text(&a.url_hash).await.unwrap().is_none());
        assert!(db.get_content(&a.url_hash).await.unwrap().is_some());
    }
}
