use chrono::Utc;
use tracing::instrument;

use rostra_core::ids::{DebateId, VoteId};
use rostra_core::summary::{VoteSide, VoteTally};

use crate::changes::{ChangeEvent, ChangeFeed, ChangeOp, ChangeTable};
use crate::database::Database;
use crate::error::StoreError;

pub struct VoteRepo {
    db: Database,
    feed: ChangeFeed,
}

impl VoteRepo {
    pub fn new(db: Database, feed: ChangeFeed) -> Self {
        Self { db, feed }
    }

    /// Record an external vote submission.
    #[instrument(skip(self), fields(debate_id = %debate_id, side = %side))]
    pub fn record(&self, debate_id: &DebateId, side: VoteSide) -> Result<VoteId, StoreError> {
        let id = VoteId::new();
        let now = Utc::now().to_rfc3339();

        self.db.with_conn(|conn| {
            conn.execute(
                "INSERT INTO votes (id, debate_id, side, created_at) VALUES (?1, ?2, ?3, ?4)",
                rusqlite::params![id.as_str(), debate_id.as_str(), side.to_string(), now],
            )?;
            Ok(())
        })?;

        self.feed.publish(ChangeEvent {
            table: ChangeTable::Votes,
            op: ChangeOp::Inserted,
            debate_id: debate_id.clone(),
            entity_id: id.as_str().to_string(),
        });

        Ok(id)
    }

    /// Aggregate counts. Read once by the orchestrator at summary time.
    #[instrument(skip(self), fields(debate_id = %debate_id))]
    pub fn tally(&self, debate_id: &DebateId) -> Result<VoteTally, StoreError> {
        self.db.with_conn(|conn| {
            let (pro, con): (i64, i64) = conn.query_row(
                "SELECT
                     COALESCE(SUM(CASE WHEN side = 'pro' THEN 1 ELSE 0 END), 0),
                     COALESCE(SUM(CASE WHEN side = 'con' THEN 1 ELSE 0 END), 0)
                 FROM votes WHERE debate_id = ?1",
                [debate_id.as_str()],
                |row| Ok((row.get(0)?, row.get(1)?)),
            )?;
            Ok(VoteTally {
                pro: pro as u32,
                con: con as u32,
            })
        })
    }
}
