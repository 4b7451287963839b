use chrono::Utc;
use tracing::instrument;

use rostra_core::debate::{Debate, DebateConfig, DebateStatus};
use rostra_core::ids::DebateId;

use crate::changes::{ChangeEvent, ChangeFeed, ChangeOp, ChangeTable};
use crate::database::Database;
use crate::error::StoreError;
use crate::row_helpers;

pub struct DebateRepo {
    db: Database,
    feed: ChangeFeed,
}

impl DebateRepo {
    pub fn new(db: Database, feed: ChangeFeed) -> Self {
        Self { db, feed }
    }

    /// Create a debate in `setup`.
    #[instrument(skip(self, description, config), fields(topic))]
    pub fn create(
        &self,
        topic: &str,
        description: &str,
        config: &DebateConfig,
    ) -> Result<Debate, StoreError> {
        let id = DebateId::new();
        let now = Utc::now().to_rfc3339();

        self.db.with_conn(|conn| {
            conn.execute(
                "INSERT INTO debates (id, topic, description, status, max_turns, turn_seconds,
                                      research_depth, speech_enabled, fact_checking_enabled,
                                      created_at, updated_at)
                 VALUES (?1, ?2, ?3, 'setup', ?4, ?5, ?6, ?7, ?8, ?9, ?9)",
                rusqlite::params![
                    id.as_str(),
                    topic,
                    description,
                    config.max_turns,
                    config.turn_seconds,
                    config.research_depth.to_string(),
                    config.speech_enabled,
                    config.fact_checking_enabled,
                    now,
                ],
            )?;
            Ok(())
        })?;

        self.feed.publish(ChangeEvent {
            table: ChangeTable::Debates,
            op: ChangeOp::Inserted,
            debate_id: id.clone(),
            entity_id: id.as_str().to_string(),
        });

        Ok(Debate {
            id,
            topic: topic.to_string(),
            description: description.to_string(),
            status: DebateStatus::Setup,
            config: config.clone(),
            created_at: now.clone(),
            updated_at: now,
        })
    }

    #[instrument(skip(self), fields(debate_id = %id))]
    pub fn get(&self, id: &DebateId) -> Result<Debate, StoreError> {
        self.db.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, topic, description, status, max_turns, turn_seconds, research_depth,
                        speech_enabled, fact_checking_enabled, created_at, updated_at
                 FROM debates WHERE id = ?1",
            )?;
            let mut rows = stmt.query([id.as_str()])?;
            match rows.next()? {
                Some(row) => row_to_debate(row),
                None => Err(StoreError::NotFound(format!("debate {id}"))),
            }
        })
    }

    /// List debates, newest first.
    #[instrument(skip(self))]
    pub fn list(&self, limit: u32) -> Result<Vec<Debate>, StoreError> {
        self.db.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, topic, description, status, max_turns, turn_seconds, research_depth,
                        speech_enabled, fact_checking_enabled, created_at, updated_at
                 FROM debates ORDER BY created_at DESC LIMIT ?1",
            )?;
            let mut rows = stmt.query([limit])?;
            let mut results = Vec::new();
            while let Some(row) = rows.next()? {
                results.push(row_to_debate(row)?);
            }
            Ok(results)
        })
    }

    /// Advance the lifecycle phase. Only the orchestrator writes this.
    #[instrument(skip(self), fields(debate_id = %id, status = %status))]
    pub fn update_status(&self, id: &DebateId, status: DebateStatus) -> Result<(), StoreError> {
        let now = Utc::now().to_rfc3339();
        let changed = self.db.with_conn(|conn| {
            Ok(conn.execute(
                "UPDATE debates SET status = ?1, updated_at = ?2 WHERE id = ?3",
                rusqlite::params![status.to_string(), now, id.as_str()],
            )?)
        })?;
        if changed == 0 {
            return Err(StoreError::NotFound(format!("debate {id}")));
        }

        self.feed.publish(ChangeEvent {
            table: ChangeTable::Debates,
            op: ChangeOp::Updated,
            debate_id: id.clone(),
            entity_id: id.as_str().to_string(),
        });
        Ok(())
    }

    /// Take the failure edge: force `completed` and append a readable
    /// marker to the description in a single write.
    #[instrument(skip(self, reason), fields(debate_id = %id))]
    pub fn mark_failed(&self, id: &DebateId, reason: &str) -> Result<(), StoreError> {
        let now = Utc::now().to_rfc3339();
        let marker = format!(" [orchestration failed: {reason}]");
        let changed = self.db.with_conn(|conn| {
            Ok(conn.execute(
                "UPDATE debates SET status = 'completed', description = description || ?1,
                        updated_at = ?2
                 WHERE id = ?3",
                rusqlite::params![marker, now, id.as_str()],
            )?)
        })?;
        if changed == 0 {
            return Err(StoreError::NotFound(format!("debate {id}")));
        }

        self.feed.publish(ChangeEvent {
            table: ChangeTable::Debates,
            op: ChangeOp::Updated,
            debate_id: id.clone(),
            entity_id: id.as_str().to_string(),
        });
        Ok(())
    }
}

fn row_to_debate(row: &rusqlite::Row<'_>) -> Result<Debate, StoreError> {
    let status_str: String = row_helpers::get(row, 3, "debates", "status")?;
    let depth_str: String = row_helpers::get(row, 6, "debates", "research_depth")?;

    Ok(Debate {
        id: DebateId::from_raw(row_helpers::get::<String>(row, 0, "debates", "id")?),
        topic: row_helpers::get(row, 1, "debates", "topic")?,
        description: row_helpers::get(row, 2, "debates", "description")?,
        status: row_helpers::parse_enum(&status_str, "debates", "status")?,
        config: DebateConfig {
            max_turns: row_helpers::get::<i64>(row, 4, "debates", "max_turns")? as u32,
            turn_seconds: row_helpers::get::<i64>(row, 5, "debates", "turn_seconds")? as u32,
            research_depth: row_helpers::parse_enum(&depth_str, "debates", "research_depth")?,
            speech_enabled: row_helpers::get(row, 7, "debates", "speech_enabled")?,
            fact_checking_enabled: row_helpers::get(row, 8, "debates", "fact_checking_enabled")?,
        },
        created_at: row_helpers::get(row, 9, "debates", "created_at")?,
        updated_at: row_helpers::get(row, 10, "debates", "updated_at")?,
    })
}
