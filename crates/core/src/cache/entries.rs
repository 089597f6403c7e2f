//! SQLite-backed [`CacheStorage`] implementation.
//!
//! Stores are rows in `stores`; entries live in `entries` keyed by
//! `(store_name, key_hash)` and are upserted, so the last write for a key wins.

use super::connection::CacheDb;
use super::storage::CacheStorage;
use crate::Error;
use crate::model::{RequestKey, Response, ResponseType};
use tokio_rusqlite::params;
use tokio_rusqlite::rusqlite;
use url::Url;

/// Raw entry columns, decoded outside the connection thread.
struct EntryRow {
    response_url: String,
    status: i64,
    response_type: String,
    headers_json: String,
    body: Vec<u8>,
}

impl EntryRow {
    fn into_response(self) -> Result<Response, Error> {
        let url = Url::parse(&self.response_url).map_err(|e| Error::Corrupt(format!("response url: {e}")))?;
        let status = u16::try_from(self.status).map_err(|_| Error::Corrupt(format!("status {}", self.status)))?;
        let response_type: ResponseType = self.response_type.parse()?;
        let headers: Vec<(String, String)> = serde_json::from_str(&self.headers_json)?;

        Ok(Response { url, status, response_type, headers, body: self.body.into() })
    }
}

#[async_trait::async_trait]
impl CacheStorage for CacheDb {
    async fn open_store(&self, name: &str) -> Result<(), Error> {
        let name = name.to_string();
        let created_at = chrono::Utc::now().to_rfc3339();
        self.conn
            .call(move |conn| -> Result<(), Error> {
                conn.execute(
                    "INSERT OR IGNORE INTO stores (name, created_at) VALUES (?1, ?2)",
                    params![name, created_at],
                )?;
                Ok(())
            })
            .await
            .map_err(Error::from)
    }

    async fn delete_store(&self, name: &str) -> Result<bool, Error> {
        let name = name.to_string();
        self.conn
            .call(move |conn| -> Result<bool, Error> {
                let count = conn.execute("DELETE FROM stores WHERE name = ?1", params![name])?;
                Ok(count > 0)
            })
            .await
            .map_err(Error::from)
    }

    async fn store_names(&self) -> Result<Vec<String>, Error> {
        self.conn
            .call(|conn| -> Result<Vec<String>, Error> {
                let mut stmt = conn.prepare("SELECT name FROM stores ORDER BY rowid")?;
                let names = stmt
                    .query_map([], |row| row.get(0))?
                    .collect::<Result<Vec<String>, _>>()?;
                Ok(names)
            })
            .await
            .map_err(Error::from)
    }

    async fn get_entry(&self, store: &str, key: &RequestKey) -> Result<Option<Response>, Error> {
        let store = store.to_string();
        let key_hash = key.hash();
        let row = self
            .conn
            .call(move |conn| -> Result<Option<EntryRow>, Error> {
                let mut stmt = conn.prepare(
                    "SELECT response_url, status, response_type, headers_json, body
                     FROM entries WHERE store_name = ?1 AND key_hash = ?2",
                )?;

                let result = stmt.query_row(params![store, key_hash], |row| {
                    Ok(EntryRow {
                        response_url: row.get(0)?,
                        status: row.get(1)?,
                        response_type: row.get(2)?,
                        headers_json: row.get(3)?,
                        body: row.get(4)?,
                    })
                });

                match result {
                    Ok(r) => Ok(Some(r)),
                    Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
                    Err(e) => Err(e.into()),
                }
            })
            .await
            .map_err(Error::from)?;

        row.map(EntryRow::into_response).transpose()
    }

    async fn put_entry(&self, store: &str, key: &RequestKey, response: &Response) -> Result<(), Error> {
        let store = store.to_string();
        let key = key.clone();
        let key_hash = key.hash();
        let headers_json = serde_json::to_string(&response.headers)?;
        let response_url = response.url.to_string();
        let status = i64::from(response.status);
        let response_type = response.response_type.as_str();
        let body = response.body.to_vec();
        let stored_at = chrono::Utc::now().to_rfc3339();

        self.conn
            .call(move |conn| -> Result<(), Error> {
                let exists: bool =
                    conn.query_row("SELECT EXISTS(SELECT 1 FROM stores WHERE name = ?1)", params![store], |row| {
                        row.get(0)
                    })?;
                if !exists {
                    return Err(Error::StoreMissing(store));
                }

                conn.execute(
                    "INSERT INTO entries (
                        store_name, key_hash, method, url, response_url,
                        status, response_type, headers_json, body, stored_at
                    ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
                    ON CONFLICT(store_name, key_hash) DO UPDATE SET
                        response_url = excluded.response_url,
                        status = excluded.status,
                        response_type = excluded.response_type,
                        headers_json = excluded.headers_json,
                        body = excluded.body,
                        stored_at = excluded.stored_at",
                    params![
                        store,
                        key_hash,
                        key.method,
                        key.url,
                        response_url,
                        status,
                        response_type,
                        headers_json,
                        body,
                        stored_at,
                    ],
                )?;
                Ok(())
            })
            .await
            .map_err(Error::from)
    }

    async fn entry_keys(&self, store: &str) -> Result<Vec<RequestKey>, Error> {
        let store = store.to_string();
        self.conn
            .call(move |conn| -> Result<Vec<RequestKey>, Error> {
                let mut stmt =
                    conn.prepare("SELECT method, url FROM entries WHERE store_name = ?1 ORDER BY url, method")?;
                let keys = stmt
                    .query_map(params![store], |row| Ok(RequestKey { method: row.get(0)?, url: row.get(1)? }))?
                    .collect::<Result<Vec<_>, _>>()?;
                Ok(keys)
            })
            .await
            .map_err(Error::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use bytes::Bytes;

    fn make_entry(url: &str, body: &'static [u8]) -> (RequestKey, Response) {
        let url = Url::parse(url).unwrap();
        let response = Response::new(url.clone(), 200, ResponseType::Basic, Bytes::from_static(body))
            .with_header("Content-Type", "text/html");
        (RequestKey::new("GET", &url), response)
    }

    #[tokio::test]
    async fn test_put_and_get() {
        let db = CacheDb::open_in_memory().await.unwrap();
        db.open_store("runtime-v1").await.unwrap();
        let (key, response) = make_entry("https://example.com/", b"<html></html>");

        db.put_entry("runtime-v1", &key, &response).await.unwrap();

        let retrieved = db.get_entry("runtime-v1", &key).await.unwrap().unwrap();
        assert_eq!(retrieved, response);
        assert_eq!(retrieved.header("content-type"), Some("text/html"));
    }

    #[tokio::test]
    async fn test_get_missing() {
        let db = CacheDb::open_in_memory().await.unwrap();
        let (key, _) = make_entry("https://example.com/", b"");
        assert!(db.get_entry("runtime-v1", &key).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_entries_are_scoped_by_store() {
        let db = CacheDb::open_in_memory().await.unwrap();
        db.open_store("precache-v1").await.unwrap();
        db.open_store("runtime-v1").await.unwrap();
        let (key, response) = make_entry("https://example.com/logo.svg", b"<svg/>");

        db.put_entry("precache-v1", &key, &response).await.unwrap();

        assert!(db.get_entry("precache-v1", &key).await.unwrap().is_some());
        assert!(db.get_entry("runtime-v1", &key).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_upsert_overwrites() {
        let db = CacheDb::open_in_memory().await.unwrap();
        db.open_store("runtime-v1").await.unwrap();
        let (key, old) = make_entry("https://example.com/", b"old");
        let (_, new) = make_entry("https://example.com/", b"new");

        db.put_entry("runtime-v1", &key, &old).await.unwrap();
        db.put_entry("runtime-v1", &key, &new).await.unwrap();

        let keys = db.entry_keys("runtime-v1").await.unwrap();
        assert_eq!(keys, vec![key.clone()]);
        let retrieved = db.get_entry("runtime-v1", &key).await.unwrap().unwrap();
        assert_eq!(&retrieved.body[..], b"new");
    }

    #[tokio::test]
    async fn test_put_into_missing_store() {
        let db = CacheDb::open_in_memory().await.unwrap();
        let (key, response) = make_entry("https://example.com/", b"");
        let result = db.put_entry("runtime-v0", &key, &response).await;
        assert!(matches!(result, Err(Error::StoreMissing(name)) if name == "runtime-v0"));
        assert!(db.store_names().await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_delete_store_cascades() {
        let db = CacheDb::open_in_memory().await.unwrap();
        db.open_store("runtime-v0").await.unwrap();
        db.open_store("runtime-v1").await.unwrap();
        let (key, response) = make_entry("https://example.com/", b"home");
        db.put_entry("runtime-v0", &key, &response).await.unwrap();

        assert!(db.delete_store("runtime-v0").await.unwrap());
        assert!(!db.delete_store("runtime-v0").await.unwrap());
        assert_eq!(db.store_names().await.unwrap(), vec!["runtime-v1".to_string()]);

        db.open_store("runtime-v0").await.unwrap();
        assert!(db.entry_keys("runtime-v0").await.unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_opaque_round_trip() {
        let db = CacheDb::open_in_memory().await.unwrap();
        db.open_store("runtime-v1").await.unwrap();
        let url = Url::parse("https://fonts.gstatic.com/s/roboto.woff2").unwrap();
        let key = RequestKey::new("GET", &url);
        let response = Response::new(url, 0, ResponseType::Opaque, Bytes::new());

        db.put_entry("runtime-v1", &key, &response).await.unwrap();

        let retrieved = db.get_entry("runtime-v1", &key).await.unwrap().unwrap();
        assert_eq!(retrieved.response_type, ResponseType::Opaque);
        assert_eq!(retrieved.status, 0);
    }
}
