use bytes::Bytes;
use chrono::Utc;
use tracing::instrument;

use rostra_core::ids::{DebateId, MediaId};

use crate::database::Database;
use crate::error::StoreError;
use crate::row_helpers;

/// Binary blob storage for synthesized audio. Turns reference blobs by
/// the public URL this repo resolves.
pub struct MediaRepo {
    db: Database,
}

impl MediaRepo {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    /// Store a blob and return its ID.
    #[instrument(skip(self, data), fields(debate_id = %debate_id, content_type, bytes = data.len()))]
    pub fn put(
        &self,
        debate_id: &DebateId,
        content_type: &str,
        data: &[u8],
    ) -> Result<MediaId, StoreError> {
        let id = MediaId::new();
        let now = Utc::now().to_rfc3339();

        self.db.with_conn(|conn| {
            conn.execute(
                "INSERT INTO media (id, debate_id, content_type, data, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
                rusqlite::params![id.as_str(), debate_id.as_str(), content_type, data, now],
            )?;
            Ok(())
        })?;

        Ok(id)
    }

    /// The URL under which the serving layer exposes a blob.
    pub fn public_url(&self, id: &MediaId) -> String {
        format!("/media/{id}")
    }

    #[instrument(skip(self), fields(media_id = %id))]
    pub fn get(&self, id: &MediaId) -> Result<(String, Bytes), StoreError> {
        self.db.with_conn(|conn| {
            let mut stmt =
                conn.prepare("SELECT content_type, data FROM media WHERE id = ?1")?;
            let mut rows = stmt.query([id.as_str()])?;
            match rows.next()? {
                Some(row) => {
                    let content_type: String = row_helpers::get(row, 0, "media", "content_type")?;
                    let data: Vec<u8> = row_helpers::get(row, 1, "media", "data")?;
                    Ok((content_type, Bytes::from(data)))
                }
                None => Err(StoreError::NotFound(format!("media {id}"))),
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::changes::ChangeFeed;
    use crate::debates::DebateRepo;
    use rostra_core::debate::DebateConfig;

    fn setup() -> (MediaRepo, DebateId) {
        let db = Database::in_memory().unwrap();
        let debates = DebateRepo::new(db.clone(), ChangeFeed::new(64));
        let debate = debates.create("Topic", "", &DebateConfig::default()).unwrap();
        (MediaRepo::new(db), debate.id)
    }

    #[test]
    fn put_and_get_roundtrip() {
        let (repo, debate_id) = setup();
        let id = repo.put(&debate_id, "audio/mpeg", b"fake mp3 bytes").unwrap();

        let (content_type, data) = repo.get(&id).unwrap();
        assert_eq!(content_type, "audio/mpeg");
        assert_eq!(data.as_ref(), b"fake mp3 bytes");
    }

    #[test]
    fn public_url_uses_media_id() {
        let (repo, debate_id) = setup();
        let id = repo.put(&debate_id, "audio/mpeg", b"x").unwrap();
        assert_eq!(repo.public_url(&id), format!("/media/{id}"));
    }

    #[test]
    fn get_missing_blob() {
        let (repo, _) = setup();
        assert!(matches!(repo.get(&MediaId::new()), Err(StoreError::NotFound(_))));
    }
}
