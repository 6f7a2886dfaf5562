use std::error::Error;
use std::fmt;

use rusqlite::Connection;
use serde_json::Value;
use uuid::Uuid;

use crate::db::{self, DocumentRow};
use crate::domain::series::{Document, STATUS};
use crate::domain::status::WatchStatus;

pub const SERIES_COLLECTION: &str = "series";

#[derive(Debug, Clone, PartialEq)]
pub struct StoredDocument {
    pub id: String,
    pub data: Document,
    pub created_at: String,
    pub updated_at: String,
}

/// The document collection backing the watchlist. Every call is an
/// independent round trip; nothing spans two calls.
pub trait DocumentStore {
    /// Writes all given fields under a newly generated id.
    fn create(&self, fields: &Document) -> Result<String, StoreError>;

    /// Whole collection in store order, optionally restricted to one status.
    fn query(&self, status: Option<WatchStatus>) -> Result<Vec<StoredDocument>, StoreError>;

    /// Merges the given fields into an existing document. `null` removes a
    /// field.
    fn update(&self, id: &str, fields: &Document) -> Result<(), StoreError>;

    fn delete(&self, id: &str) -> Result<(), StoreError>;
}

impl<S: DocumentStore + ?Sized> DocumentStore for &S {
    fn create(&self, fields: &Document) -> Result<String, StoreError> {
        (**self).create(fields)
    }

    fn query(&self, status: Option<WatchStatus>) -> Result<Vec<StoredDocument>, StoreError> {
        (**self).query(status)
    }

    fn update(&self, id: &str, fields: &Document) -> Result<(), StoreError> {
        (**self).update(id, fields)
    }

    fn delete(&self, id: &str) -> Result<(), StoreError> {
        (**self).delete(id)
    }
}

pub struct SqliteStore {
    conn: Connection,
    collection: String,
}

impl SqliteStore {
    pub fn open(db_path: &str, collection: &str) -> Result<Self, StoreError> {
        let conn = db::open_connection(db_path)?;
        Ok(Self {
            conn,
            collection: collection.to_string(),
        })
    }

    pub fn open_series(db_path: &str) -> Result<Self, StoreError> {
        Self::open(db_path, SERIES_COLLECTION)
    }
}

impl DocumentStore for SqliteStore {
    fn create(&self, fields: &Document) -> Result<String, StoreError> {
        let id = new_document_id();
        let body: Document = fields
            .iter()
            .filter(|(_, value)| !value.is_null())
            .map(|(key, value)| (key.clone(), value.clone()))
            .collect();
        let body = serde_json::to_string(&body)?;
        db::insert_document(&self.conn, &self.collection, &id, &body)?;
        Ok(id)
    }

    fn query(&self, status: Option<WatchStatus>) -> Result<Vec<StoredDocument>, StoreError> {
        let equals = status.map(|status| (STATUS, status.as_str()));
        db::list_documents(&self.conn, &self.collection, equals)?
            .into_iter()
            .map(StoredDocument::try_from)
            .collect()
    }

    fn update(&self, id: &str, fields: &Document) -> Result<(), StoreError> {
        let patch = serde_json::to_string(fields)?;
        let touched = db::merge_document(&self.conn, &self.collection, id, &patch)?;
        if touched == 0 {
            return Err(StoreError::NotFound(id.to_string()));
        }
        Ok(())
    }

    fn delete(&self, id: &str) -> Result<(), StoreError> {
        let touched = db::delete_document(&self.conn, &self.collection, id)?;
        if touched == 0 {
            return Err(StoreError::NotFound(id.to_string()));
        }
        Ok(())
    }
}

pub fn new_document_id() -> String {
    format!("S-{}", Uuid::now_v7())
}

impl TryFrom<DocumentRow> for StoredDocument {
    type Error = StoreError;

    fn try_from(row: DocumentRow) -> Result<Self, Self::Error> {
        let data = match serde_json::from_str::<Value>(&row.body)? {
            Value::Object(map) => map,
            _ => return Err(StoreError::CorruptDocument(row.id)),
        };
        Ok(Self {
            id: row.id,
            data,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

#[derive(Debug)]
pub enum StoreError {
    Db(rusqlite::Error),
    Json(serde_json::Error),
    NotFound(String),
    CorruptDocument(String),
}

impl fmt::Display for StoreError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreError::Db(err) => write!(f, "database error: {}", err),
            StoreError::Json(err) => write!(f, "document encoding error: {}", err),
            StoreError::NotFound(id) => write!(f, "series '{}' not found", id),
            StoreError::CorruptDocument(id) => {
                write!(f, "stored document '{}' is not a JSON object", id)
            }
        }
    }
}

impl Error for StoreError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            StoreError::Db(err) => Some(err),
            StoreError::Json(err) => Some(err),
            StoreError::NotFound(_) | StoreError::CorruptDocument(_) => None,
        }
    }
}

impl From<rusqlite::Error> for StoreError {
    fn from(value: rusqlite::Error) -> Self {
        StoreError::Db(value)
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(value: serde_json::Error) -> Self {
        StoreError::Json(value)
    }
}
