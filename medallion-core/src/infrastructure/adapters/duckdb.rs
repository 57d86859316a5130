// medallion-core/src/infrastructure/adapters/duckdb.rs

use async_trait::async_trait;
use duckdb::{Config, Connection, params};
use regex::Regex;
use std::path::Path;
use std::sync::{Arc, Mutex, MutexGuard, OnceLock};
use tracing::debug;

use crate::error::MedallionError;
use crate::infrastructure::error::InfrastructureError;
use crate::ports::document_store::{Document, DocumentFilter, DocumentStore, ID_FIELD, assign_id};

fn re_collection() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$")
            .unwrap_or_else(|_| Regex::new("$^").unwrap_or_else(|_| unreachable!()))
    })
}

/// Serving store backed by a DuckDB file. Each collection is a table of
/// `(_id, seq, doc)` rows where `doc` holds the JSON document.
pub struct DuckDbDocumentStore {
    conn: Arc<Mutex<Connection>>,
}

impl DuckDbDocumentStore {
    pub fn new(db_path: &str) -> Result<Self, InfrastructureError> {
        let config = Config::default();

        let conn = if db_path == ":memory:" {
            Connection::open_in_memory_with_flags(config)?
        } else {
            match Path::new(db_path).parent() {
                Some(parent) if !parent.as_os_str().is_empty() => {
                    std::fs::create_dir_all(parent)?
                }
                _ => {}
            }
            Connection::open_with_flags(db_path, config)?
        };

        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
        })
    }

    pub fn in_memory() -> Result<Self, InfrastructureError> {
        Self::new(":memory:")
    }

    fn lock(&self) -> Result<MutexGuard<'_, Connection>, MedallionError> {
        self.conn.lock().map_err(|_| {
            InfrastructureError::Io(std::io::Error::other("DuckDB Mutex Poisoned")).into()
        })
    }
}

fn checked(collection: &str) -> Result<&str, MedallionError> {
    if re_collection().is_match(collection) {
        Ok(collection)
    } else {
        Err(InfrastructureError::InvalidKey(format!("collection '{}'", collection)).into())
    }
}

fn table_exists(conn: &Connection, collection: &str) -> Result<bool, MedallionError> {
    let count: i64 = conn
        .query_row(
            "SELECT COUNT(*) FROM information_schema.tables WHERE table_name = ?",
            params![collection],
            |row| row.get(0),
        )
        .map_err(InfrastructureError::from)?;
    Ok(count > 0)
}

/// Stored documents in sequence order, with their `_id`.
fn load(conn: &Connection, collection: &str) -> Result<Vec<(String, Document)>, MedallionError> {
    if !table_exists(conn, collection)? {
        return Ok(Vec::new());
    }
    let mut stmt = conn
        .prepare(&format!(
            "SELECT _id, doc FROM \"{}\" ORDER BY seq",
            collection
        ))
        .map_err(InfrastructureError::from)?;
    let rows = stmt
        .query_map([], |row| Ok((row.get::<_, String>(0)?, row.get::<_, String>(1)?)))
        .map_err(InfrastructureError::from)?;

    let mut docs = Vec::new();
    for row in rows {
        let (id, raw) = row.map_err(InfrastructureError::from)?;
        let doc: Document = serde_json::from_str(&raw).map_err(InfrastructureError::from)?;
        docs.push((id, doc));
    }
    Ok(docs)
}

#[async_trait]
impl DocumentStore for DuckDbDocumentStore {
    async fn delete_many(
        &self,
        collection: &str,
        filter: Option<&DocumentFilter>,
    ) -> Result<u64, MedallionError> {
        let collection = checked(collection)?;
        let conn = self.lock()?;
        if !table_exists(&conn, collection)? {
            return Ok(0);
        }

        let deleted = match filter {
            None => conn
                .execute(&format!("DELETE FROM \"{}\"", collection), [])
                .map_err(InfrastructureError::from)?,
            Some(filter) => {
                let ids: Vec<String> = load(&conn, collection)?
                    .into_iter()
                    .filter(|(_, doc)| filter.matches(doc))
                    .map(|(id, _)| id)
                    .collect();
                let mut stmt = conn
                    .prepare(&format!("DELETE FROM \"{}\" WHERE _id = ?", collection))
                    .map_err(InfrastructureError::from)?;
                let mut deleted = 0;
                for id in &ids {
                    deleted += stmt.execute(params![id]).map_err(InfrastructureError::from)?;
                }
                deleted
            }
        };
        debug!(collection, deleted, "Deleted documents");
        Ok(deleted as u64)
    }

    async fn insert_many(
        &self,
        collection: &str,
        docs: Vec<Document>,
    ) -> Result<u64, MedallionError> {
        let collection = checked(collection)?;
        let mut conn = self.lock()?;
        conn.execute(
            &format!(
                "CREATE TABLE IF NOT EXISTS \"{}\" (_id VARCHAR, seq BIGINT, doc VARCHAR)",
                collection
            ),
            [],
        )
        .map_err(InfrastructureError::from)?;

        let next: i64 = conn
            .query_row(
                &format!("SELECT COALESCE(MAX(seq) + 1, 0) FROM \"{}\"", collection),
                [],
                |row| row.get(0),
            )
            .map_err(InfrastructureError::from)?;

        let tx = conn.transaction().map_err(InfrastructureError::from)?;
        let count = docs.len() as u64;
        {
            let mut stmt = tx
                .prepare(&format!("INSERT INTO \"{}\" VALUES (?, ?, ?)", collection))
                .map_err(InfrastructureError::from)?;
            for (offset, mut doc) in docs.into_iter().enumerate() {
                let seq = next + offset as i64;
                assign_id(collection, seq as u64, &mut doc);
                let id = match doc.get(ID_FIELD) {
                    Some(serde_json::Value::String(s)) => s.clone(),
                    Some(other) => other.to_string(),
                    None => format!("{}:{}", collection, seq),
                };
                let raw = serde_json::to_string(&doc).map_err(InfrastructureError::from)?;
                stmt.execute(params![id, seq, raw])
                    .map_err(InfrastructureError::from)?;
            }
        }
        tx.commit().map_err(InfrastructureError::from)?;

        debug!(collection, count, "Inserted documents");
        Ok(count)
    }

    async fn find(
        &self,
        collection: &str,
        filter: Option<&DocumentFilter>,
    ) -> Result<Vec<Document>, MedallionError> {
        let collection = checked(collection)?;
        let conn = self.lock()?;
        Ok(load(&conn, collection)?
            .into_iter()
            .map(|(_, doc)| doc)
            .filter(|doc| filter.is_none_or(|f| f.matches(doc)))
            .collect())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::expect_used)]
mod tests {
    use super::*;
    use anyhow::Result;
    use serde_json::json;

    fn doc(value: serde_json::Value) -> Document {
        value.as_object().cloned().unwrap()
    }

    #[tokio::test]
    async fn test_duckdb_replace_flow() -> Result<()> {
        let store = DuckDbDocumentStore::in_memory()?;
        assert!(store.find("ca_by_year_country", None).await?.is_empty());
        assert_eq!(store.delete_many("ca_by_year_country", None).await?, 0);

        let inserted = store
            .insert_many(
                "ca_by_year_country",
                vec![
                    doc(json!({"annee": "2020", "pays": "FR", "chiffre_affaires": 100.0})),
                    doc(json!({"annee": "2021", "pays": "DE", "chiffre_affaires": 50.0})),
                ],
            )
            .await?;
        assert_eq!(inserted, 2);

        let docs = store.find("ca_by_year_country", None).await?;
        assert_eq!(docs.len(), 2);
        assert_eq!(docs[0]["_id"], "ca_by_year_country:0");
        assert_eq!(docs[1]["pays"], "DE");

        let fr = DocumentFilter::new("pays", "FR");
        let found = store.find_one("ca_by_year_country", Some(&fr)).await?.unwrap();
        assert_eq!(found["chiffre_affaires"], 100.0);

        assert_eq!(store.delete_many("ca_by_year_country", Some(&fr)).await?, 1);
        assert_eq!(store.delete_many("ca_by_year_country", None).await?, 1);
        assert!(store.find("ca_by_year_country", None).await?.is_empty());
        Ok(())
    }

    #[tokio::test]
    async fn test_file_backed_store_persists() -> Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join("target").join("serving.duckdb");
        let path = path.to_string_lossy().to_string();

        {
            let store = DuckDbDocumentStore::new(&path)?;
            store
                .insert_many("metadata", vec![doc(json!({"table": "ca_by_year"}))])
                .await?;
        }

        let store = DuckDbDocumentStore::new(&path)?;
        let docs = store.find("metadata", None).await?;
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0]["table"], "ca_by_year");
        Ok(())
    }

    #[tokio::test]
    async fn test_collection_names_are_validated() -> Result<()> {
        let store = DuckDbDocumentStore::in_memory()?;
        let err = store
            .insert_many("x\"; DROP TABLE y; --", vec![])
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            MedallionError::Infrastructure(InfrastructureError::InvalidKey(_))
        ));
        assert!(store.find("1abc", None).await.is_err());
        Ok(())
    }
}
