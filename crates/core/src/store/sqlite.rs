//! SQLite-backed media item store.

use std::path::Path;
use std::sync::{Mutex, MutexGuard};

use chrono::{DateTime, NaiveDate, Utc};
use rusqlite::{params, Connection, ToSql};
use uuid::Uuid;

use super::{MediaItemFilter, MediaItemRepository, MediaStoreError};
use crate::media::{
    normalize_title, MediaData, MediaItem, MediaType, SyncClients, MAX_CLIENT_ID,
};

const ITEM_COLUMNS: &str = "id, uuid, media_type, title, release_year, release_date, \
     stream_url, download_url, sync_clients, data, created_at, updated_at";

/// Matches rows whose identity map holds `(client_id, item_id)`.
const CLIENT_ITEM_CLAUSE: &str = "EXISTS (SELECT 1 FROM json_each(media_items.sync_clients) AS sc \
     WHERE json_extract(sc.value, '$.client_id') = ? AND json_extract(sc.value, '$.item_id') = ?)";

/// Matches rows known to `client_id` under any item ID.
const CLIENT_CLAUSE: &str = "EXISTS (SELECT 1 FROM json_each(media_items.sync_clients) AS sc \
     WHERE json_extract(sc.value, '$.client_id') = ?)";

/// SQLite-backed store shared by every media type.
pub struct SqliteMediaStore {
    conn: Mutex<Connection>,
}

/// Row values as stored, decoded into a typed item outside the rusqlite callback.
struct StoredRow {
    id: i64,
    uuid: String,
    media_type: String,
    title: String,
    release_year: Option<i32>,
    release_date: Option<String>,
    stream_url: Option<String>,
    download_url: Option<String>,
    sync_clients: String,
    data: String,
    created_at: String,
    updated_at: String,
}

impl StoredRow {
    fn from_row(row: &rusqlite::Row) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            uuid: row.get(1)?,
            media_type: row.get(2)?,
            title: row.get(3)?,
            release_year: row.get(4)?,
            release_date: row.get(5)?,
            stream_url: row.get(6)?,
            download_url: row.get(7)?,
            sync_clients: row.get(8)?,
            data: row.get(9)?,
            created_at: row.get(10)?,
            updated_at: row.get(11)?,
        })
    }

    fn into_item<T: MediaData>(self) -> Result<MediaItem<T>, MediaStoreError> {
        let media_type: MediaType =
            self.media_type
                .parse()
                .map_err(|_| MediaStoreError::TypeMismatch {
                    expected: T::MEDIA_TYPE,
                    found: self.media_type.clone(),
                })?;
        if media_type != T::MEDIA_TYPE {
            return Err(MediaStoreError::TypeMismatch {
                expected: T::MEDIA_TYPE,
                found: self.media_type,
            });
        }

        let uuid = Uuid::parse_str(&self.uuid)
            .map_err(|e| MediaStoreError::Serialization(format!("uuid: {}", e)))?;
        let sync_clients: SyncClients = serde_json::from_str(&self.sync_clients)
            .map_err(|e| MediaStoreError::Serialization(format!("sync_clients: {}", e)))?;
        let data: T = serde_json::from_str(&self.data)
            .map_err(|e| MediaStoreError::Serialization(format!("data: {}", e)))?;
        let release_date = self
            .release_date
            .as_deref()
            .map(|d| NaiveDate::parse_from_str(d, "%Y-%m-%d"))
            .transpose()
            .map_err(|e| MediaStoreError::Serialization(format!("release_date: {}", e)))?;

        Ok(MediaItem {
            id: self.id,
            uuid,
            media_type,
            title: self.title,
            release_year: self.release_year,
            release_date,
            sync_clients,
            stream_url: self.stream_url,
            download_url: self.download_url,
            data,
            created_at: parse_timestamp("created_at", &self.created_at)?,
            updated_at: parse_timestamp("updated_at", &self.updated_at)?,
        })
    }
}

fn parse_timestamp(field: &str, s: &str) -> Result<DateTime<Utc>, MediaStoreError> {
    DateTime::parse_from_rfc3339(s)
        .map(|dt| dt.with_timezone(&Utc))
        .map_err(|e| MediaStoreError::Serialization(format!("{}: {}", field, e)))
}

fn db_err(e: rusqlite::Error) -> MediaStoreError {
    MediaStoreError::Database(e.to_string())
}

fn encode<V: serde::Serialize>(field: &str, value: &V) -> Result<String, MediaStoreError> {
    serde_json::to_string(value)
        .map_err(|e| MediaStoreError::Serialization(format!("{}: {}", field, e)))
}

fn client_id_param(client_id: u64) -> Result<i64, MediaStoreError> {
    if client_id > MAX_CLIENT_ID {
        return Err(MediaStoreError::InvalidItem(format!(
            "client id {} exceeds {}",
            client_id, MAX_CLIENT_ID
        )));
    }
    Ok(client_id as i64)
}

fn check_sync_clients(sync_clients: &SyncClients) -> Result<(), MediaStoreError> {
    for entry in sync_clients.iter() {
        client_id_param(entry.client_id)?;
    }
    Ok(())
}

fn check_type<T: MediaData>(item: &MediaItem<T>) -> Result<(), MediaStoreError> {
    if item.has_consistent_type() {
        Ok(())
    } else {
        Err(MediaStoreError::TypeMismatch {
            expected: T::MEDIA_TYPE,
            found: item.media_type.to_string(),
        })
    }
}

impl SqliteMediaStore {
    /// Open (or create) the database file and ensure the schema exists.
    pub fn new(path: &Path) -> Result<Self, MediaStoreError> {
        let conn = Connection::open(path).map_err(db_err)?;
        Self::initialize_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    /// Create an in-memory store (useful for testing).
    pub fn in_memory() -> Result<Self, MediaStoreError> {
        let conn = Connection::open_in_memory().map_err(db_err)?;
        Self::initialize_schema(&conn)?;
        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    fn initialize_schema(conn: &Connection) -> Result<(), MediaStoreError> {
        conn.execute_batch(
            r#"
            CREATE TABLE IF NOT EXISTS media_items (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                uuid TEXT NOT NULL UNIQUE,
                media_type TEXT NOT NULL,
                title TEXT NOT NULL,
                title_key TEXT NOT NULL,
                release_year INTEGER,
                release_date TEXT,
                stream_url TEXT,
                download_url TEXT,
                sync_clients TEXT NOT NULL DEFAULT '[]',
                data TEXT NOT NULL,
                created_at TEXT NOT NULL,
                updated_at TEXT NOT NULL
            );

            CREATE INDEX IF NOT EXISTS idx_media_items_type ON media_items(media_type);
            CREATE INDEX IF NOT EXISTS idx_media_items_match
                ON media_items(media_type, title_key, release_year);
            "#,
        )
        .map_err(db_err)?;

        Ok(())
    }

    fn conn(&self) -> Result<MutexGuard<'_, Connection>, MediaStoreError> {
        self.conn
            .lock()
            .map_err(|_| MediaStoreError::Database("connection lock poisoned".to_string()))
    }

    /// Number of stored items per media type (types with no rows are omitted).
    pub fn count_by_type(&self) -> Result<Vec<(MediaType, i64)>, MediaStoreError> {
        let conn = self.conn()?;
        let mut stmt = conn
            .prepare("SELECT media_type, COUNT(*) FROM media_items GROUP BY media_type")
            .map_err(db_err)?;

        let rows = stmt
            .query_map([], |row| {
                Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?))
            })
            .map_err(db_err)?;

        let mut counts = Vec::new();
        for row in rows {
            let (media_type, count) = row.map_err(db_err)?;
            // Rows with unknown type tags are not addressable by any repository
            if let Ok(media_type) = media_type.parse::<MediaType>() {
                counts.push((media_type, count));
            }
        }
        Ok(counts)
    }

    fn query_one<T: MediaData>(
        &self,
        where_clause: &str,
        params: &[&dyn ToSql],
        not_found: impl FnOnce() -> String,
    ) -> Result<MediaItem<T>, MediaStoreError> {
        let conn = self.conn()?;
        let sql = format!(
            "SELECT {} FROM media_items WHERE media_type = ? AND {} ORDER BY id LIMIT 1",
            ITEM_COLUMNS, where_clause
        );
        let media_type = T::MEDIA_TYPE.as_str();
        let mut all_params: Vec<&dyn ToSql> = Vec::with_capacity(params.len() + 1);
        all_params.push(&media_type);
        all_params.extend_from_slice(params);

        let row = conn
            .query_row(&sql, all_params.as_slice(), StoredRow::from_row)
            .map_err(|e| match e {
                rusqlite::Error::QueryReturnedNoRows => MediaStoreError::NotFound(not_found()),
                _ => db_err(e),
            })?;

        row.into_item()
    }

    fn build_where_clause(
        filter: &MediaItemFilter,
    ) -> Result<(String, Vec<Box<dyn ToSql>>), MediaStoreError> {
        let mut conditions = vec!["media_type = ?".to_string()];
        let mut params: Vec<Box<dyn ToSql>> = Vec::new();

        if let Some(ref query) = filter.query {
            conditions.push("(title LIKE ? OR title_key LIKE ?)".to_string());
            params.push(Box::new(format!("%{}%", query)));
            params.push(Box::new(format!("%{}%", normalize_title(query))));
        }

        if let Some(client_id) = filter.client_id {
            conditions.push(CLIENT_CLAUSE.to_string());
            params.push(Box::new(client_id_param(client_id)?));
        }

        Ok((format!("WHERE {}", conditions.join(" AND ")), params))
    }
}

impl<T: MediaData> MediaItemRepository<T> for SqliteMediaStore {
    fn create(&self, mut item: MediaItem<T>) -> Result<MediaItem<T>, MediaStoreError> {
        check_type(&item)?;
        check_sync_clients(&item.sync_clients)?;

        if item.uuid.is_nil() {
            item.uuid = Uuid::new_v4();
        }
        let now = Utc::now();
        item.created_at = now;
        item.updated_at = now;

        let sync_clients_json = encode("sync_clients", &item.sync_clients)?;
        let data_json = encode("data", &item.data)?;

        let conn = self.conn()?;
        conn.execute(
            "INSERT INTO media_items (uuid, media_type, title, title_key, release_year, release_date,
                 stream_url, download_url, sync_clients, data, created_at, updated_at)
             VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)",
            params![
                item.uuid.to_string(),
                item.media_type.as_str(),
                &item.title,
                normalize_title(&item.title),
                item.release_year,
                item.release_date.map(|d| d.to_string()),
                &item.stream_url,
                &item.download_url,
                sync_clients_json,
                data_json,
                now.to_rfc3339(),
                now.to_rfc3339(),
            ],
        )
        .map_err(db_err)?;

        item.id = conn.last_insert_rowid();
        Ok(item)
    }

    fn update(&self, mut item: MediaItem<T>) -> Result<MediaItem<T>, MediaStoreError> {
        check_type(&item)?;
        check_sync_clients(&item.sync_clients)?;
        if !item.is_persisted() {
            return Err(MediaStoreError::InvalidItem(
                "cannot update an item that was never persisted".to_string(),
            ));
        }

        item.updated_at = Utc::now();
        let sync_clients_json = encode("sync_clients", &item.sync_clients)?;
        let data_json = encode("data", &item.data)?;

        let conn = self.conn()?;
        let rows_affected = conn
            .execute(
                "UPDATE media_items SET title = ?, title_key = ?, release_year = ?, release_date = ?,
                     stream_url = ?, download_url = ?, sync_clients = ?, data = ?, updated_at = ?
                 WHERE id = ? AND media_type = ?",
                params![
                    &item.title,
                    normalize_title(&item.title),
                    item.release_year,
                    item.release_date.map(|d| d.to_string()),
                    &item.stream_url,
                    &item.download_url,
                    sync_clients_json,
                    data_json,
                    item.updated_at.to_rfc3339(),
                    item.id,
                    item.media_type.as_str(),
                ],
            )
            .map_err(db_err)?;

        if rows_affected == 0 {
            return Err(MediaStoreError::NotFound(format!(
                "{} {}",
                T::MEDIA_TYPE,
                item.id
            )));
        }

        Ok(item)
    }

    fn get_by_id(&self, id: i64) -> Result<MediaItem<T>, MediaStoreError> {
        self.query_one("id = ?", &[&id as &dyn ToSql], || format!("{} {}", T::MEDIA_TYPE, id))
    }

    fn get_by_uuid(&self, uuid: &Uuid) -> Result<MediaItem<T>, MediaStoreError> {
        let uuid_str = uuid.to_string();
        self.query_one("uuid = ?", &[&uuid_str as &dyn ToSql], || {
            format!("{} {}", T::MEDIA_TYPE, uuid_str)
        })
    }

    fn get_by_client_item_id(
        &self,
        client_id: u64,
        item_id: &str,
    ) -> Result<MediaItem<T>, MediaStoreError> {
        let client_id_value = client_id_param(client_id)?;
        let params: [&dyn ToSql; 2] = [&client_id_value, &item_id];
        self.query_one(CLIENT_ITEM_CLAUSE, &params, || {
            format!("{} {} on client {}", T::MEDIA_TYPE, item_id, client_id)
        })
    }

    fn get_by_type(&self) -> Result<Vec<MediaItem<T>>, MediaStoreError> {
        self.list(&MediaItemFilter::new().with_limit(-1))
    }

    fn list(&self, filter: &MediaItemFilter) -> Result<Vec<MediaItem<T>>, MediaStoreError> {
        let conn = self.conn()?;
        let (where_clause, filter_params) = Self::build_where_clause(filter)?;
        let sql = format!(
            "SELECT {} FROM media_items {} ORDER BY id LIMIT ? OFFSET ?",
            ITEM_COLUMNS, where_clause
        );

        let media_type = T::MEDIA_TYPE.as_str();
        let mut all_params: Vec<&dyn ToSql> = Vec::new();
        all_params.push(&media_type);
        all_params.extend(filter_params.iter().map(|p| &**p));
        all_params.push(&filter.limit);
        all_params.push(&filter.offset);

        let mut stmt = conn.prepare(&sql).map_err(db_err)?;
        let rows = stmt
            .query_map(all_params.as_slice(), StoredRow::from_row)
            .map_err(db_err)?;

        let mut items = Vec::new();
        for row in rows {
            items.push(row.map_err(db_err)?.into_item()?);
        }
        Ok(items)
    }

    fn count(&self, filter: &MediaItemFilter) -> Result<i64, MediaStoreError> {
        let conn = self.conn()?;
        let (where_clause, filter_params) = Self::build_where_clause(filter)?;
        let sql = format!("SELECT COUNT(*) FROM media_items {}", where_clause);

        let media_type = T::MEDIA_TYPE.as_str();
        let mut all_params: Vec<&dyn ToSql> = Vec::new();
        all_params.push(&media_type);
        all_params.extend(filter_params.iter().map(|p| &**p));

        conn.query_row(&sql, all_params.as_slice(), |row| row.get(0))
            .map_err(db_err)
    }

    fn delete(&self, id: i64) -> Result<MediaItem<T>, MediaStoreError> {
        let item: MediaItem<T> = self.get_by_id(id)?;

        let conn = self.conn()?;
        conn.execute(
            "DELETE FROM media_items WHERE id = ? AND media_type = ?",
            params![id, T::MEDIA_TYPE.as_str()],
        )
        .map_err(db_err)?;

        Ok(item)
    }
}
