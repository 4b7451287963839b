use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::instrument;

use rostra_core::ids::{DebateId, DocumentId};

use crate::changes::{ChangeEvent, ChangeFeed, ChangeOp, ChangeTable};
use crate::database::Database;
use crate::error::StoreError;
use crate::row_helpers;

/// A research source persisted as a retrievable document.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Document {
    pub id: DocumentId,
    pub debate_id: DebateId,
    pub title: String,
    pub url: String,
    pub content: String,
    pub created_at: String,
}

pub struct DocumentRepo {
    db: Database,
    feed: ChangeFeed,
}

impl DocumentRepo {
    pub fn new(db: Database, feed: ChangeFeed) -> Self {
        Self { db, feed }
    }

    /// Store a discovered source, keyed by (debate, url). Re-discovering
    /// the same URL keeps the first copy.
    #[instrument(skip(self, title, content), fields(debate_id = %debate_id, url))]
    pub fn upsert(
        &self,
        debate_id: &DebateId,
        title: &str,
        url: &str,
        content: &str,
    ) -> Result<Document, StoreError> {
        let id = DocumentId::new();
        let now = Utc::now().to_rfc3339();

        let inserted = self.db.with_conn(|conn| {
            Ok(conn.execute(
                "INSERT INTO documents (id, debate_id, title, url, content, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)
                 ON CONFLICT(debate_id, url) DO NOTHING",
                rusqlite::params![id.as_str(), debate_id.as_str(), title, url, content, now],
            )?)
        })?;

        if inserted > 0 {
            self.feed.publish(ChangeEvent {
                table: ChangeTable::Documents,
                op: ChangeOp::Inserted,
                debate_id: debate_id.clone(),
                entity_id: id.as_str().to_string(),
            });
        }

        self.get_by_url(debate_id, url)
    }

    #[instrument(skip(self), fields(debate_id = %debate_id, url))]
    pub fn get_by_url(&self, debate_id: &DebateId, url: &str) -> Result<Document, StoreError> {
        self.db.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, debate_id, title, url, content, created_at
                 FROM documents WHERE debate_id = ?1 AND url = ?2",
            )?;
            let mut rows = stmt.query(rusqlite::params![debate_id.as_str(), url])?;
            match rows.next()? {
                Some(row) => row_to_document(row),
                None => Err(StoreError::NotFound(format!("document {url}"))),
            }
        })
    }

    #[instrument(skip(self), fields(debate_id = %debate_id))]
    pub fn list(&self, debate_id: &DebateId) -> Result<Vec<Document>, StoreError> {
        self.db.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, debate_id, title, url, content, created_at
                 FROM documents WHERE debate_id = ?1 ORDER BY created_at ASC, id ASC",
            )?;
            let mut rows = stmt.query([debate_id.as_str()])?;
            let mut results = Vec::new();
            while let Some(row) = rows.next()? {
                results.push(row_to_document(row)?);
            }
            Ok(results)
        })
    }
}

fn row_to_document(row: &rusqlite::Row<'_>) -> Result<Document, StoreError> {
    Ok(Document {
        id: DocumentId::from_raw(row_helpers::get::<String>(row, 0, "documents", "id")?),
        debate_id: DebateId::from_raw(row_helpers::get::<String>(row, 1, "documents", "debate_id")?),
        title: row_helpers::get(row, 2, "documents", "title")?,
        url: row_helpers::get(row, 3, "documents", "url")?,
        content: row_helpers::get(row, 4, "documents", "content")?,
        created_at: row_helpers::get(row, 5, "documents", "created_at")?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::debates::DebateRepo;
    use rostra_core::debate::DebateConfig;

    fn setup() -> (DocumentRepo, DebateId) {
        let db = Database::in_memory().unwrap();
        let feed = ChangeFeed::new(64);
        let debates = DebateRepo::new(db.clone(), feed.clone());
        let debate = debates.create("Topic", "", &DebateConfig::default()).unwrap();
        (DocumentRepo::new(db, feed), debate.id)
    }

    #[test]
    fn upsert_and_list() {
        let (repo, debate_id) = setup();
        repo.upsert(&debate_id, "Report A", "https://a.example", "body a").unwrap();
        repo.upsert(&debate_id, "Report B", "https://b.example", "body b").unwrap();

        let all = repo.list(&debate_id).unwrap();
        assert_eq!(all.len(), 2);
    }

    #[test]
    fn upsert_same_url_keeps_first() {
        let (repo, debate_id) = setup();
        let first = repo.upsert(&debate_id, "Original", "https://a.example", "v1").unwrap();
        let second = repo.upsert(&debate_id, "Changed", "https://a.example", "v2").unwrap();

        assert_eq!(second.id, first.id);
        assert_eq!(second.title, "Original");
        assert_eq!(repo.list(&debate_id).unwrap().len(), 1);
    }
}
