use chrono::Utc;
use tracing::instrument;

use rostra_core::debate::{Participant, Role};
use rostra_core::ids::{DebateId, ParticipantId};

use crate::database::Database;
use crate::error::StoreError;
use crate::row_helpers;

pub struct ParticipantRepo {
    db: Database,
}

impl ParticipantRepo {
    pub fn new(db: Database) -> Self {
        Self { db }
    }

    #[instrument(skip(self, persona, voice_id), fields(debate_id = %debate_id, role = %role, display_name))]
    pub fn create(
        &self,
        debate_id: &DebateId,
        role: Role,
        display_name: &str,
        persona: &str,
        voice_id: &str,
    ) -> Result<Participant, StoreError> {
        let id = ParticipantId::new();
        let now = Utc::now().to_rfc3339();

        self.db.with_conn(|conn| {
            conn.execute(
                "INSERT INTO participants (id, debate_id, role, display_name, persona, voice_id, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7)",
                rusqlite::params![
                    id.as_str(),
                    debate_id.as_str(),
                    role.to_string(),
                    display_name,
                    persona,
                    voice_id,
                    now,
                ],
            )?;
            Ok(())
        })?;

        Ok(Participant {
            id,
            debate_id: debate_id.clone(),
            role,
            display_name: display_name.to_string(),
            persona: persona.to_string(),
            voice_id: voice_id.to_string(),
            created_at: now,
        })
    }

    /// All participants of a debate, in creation order.
    #[instrument(skip(self), fields(debate_id = %debate_id))]
    pub fn list(&self, debate_id: &DebateId) -> Result<Vec<Participant>, StoreError> {
        self.db.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, debate_id, role, display_name, persona, voice_id, created_at
                 FROM participants WHERE debate_id = ?1 ORDER BY created_at ASC",
            )?;
            let mut rows = stmt.query([debate_id.as_str()])?;
            let mut results = Vec::new();
            while let Some(row) = rows.next()? {
                results.push(row_to_participant(row)?);
            }
            Ok(results)
        })
    }

    #[instrument(skip(self), fields(participant_id = %id))]
    pub fn get(&self, id: &ParticipantId) -> Result<Participant, StoreError> {
        self.db.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, debate_id, role, display_name, persona, voice_id, created_at
                 FROM participants WHERE id = ?1",
            )?;
            let mut rows = stmt.query([id.as_str()])?;
            match rows.next()? {
                Some(row) => row_to_participant(row),
                None => Err(StoreError::NotFound(format!("participant {id}"))),
            }
        })
    }
}

fn row_to_participant(row: &rusqlite::Row<'_>) -> Result<Participant, StoreError> {
    let role_str: String = row_helpers::get(row, 2, "participants", "role")?;

    Ok(Participant {
        id: ParticipantId::from_raw(row_helpers::get::<String>(row, 0, "participants", "id")?),
        debate_id: DebateId::from_raw(row_helpers::get::<String>(row, 1, "participants", "debate_id")?),
        role: row_helpers::parse_enum(&role_str, "participants", "role")?,
        display_name: row_helpers::get(row, 3, "participants", "display_name")?,
        persona: row_helpers::get(row, 4, "participants", "persona")?,
        voice_id: row_helpers::get(row, 5, "participants", "voice_id")?,
        created_at: row_helpers::get(row, 6, "participants", "created_at")?,
    })
}
