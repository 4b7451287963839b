use std::collections::BTreeMap;

use chrono::Utc;
use tracing::instrument;

use rostra_core::ids::{DebateId, SummaryId};
use rostra_core::summary::{RankedSource, Summary, VoteTally};

use crate::changes::{ChangeEvent, ChangeFeed, ChangeOp, ChangeTable};
use crate::database::Database;
use crate::error::StoreError;
use crate::row_helpers;

/// Input for the one-and-only summary of a debate.
#[derive(Clone, Debug)]
pub struct NewSummary {
    pub debate_id: DebateId,
    pub overall: String,
    pub winner_analysis: String,
    pub accuracy_scores: BTreeMap<String, f64>,
    pub key_arguments: Vec<String>,
    pub verdict_counts: BTreeMap<String, u32>,
    pub sources_used: Vec<RankedSource>,
    pub recommendations: String,
    pub vote_snapshot: VoteTally,
}

pub struct SummaryRepo {
    db: Database,
    feed: ChangeFeed,
}

impl SummaryRepo {
    pub fn new(db: Database, feed: ChangeFeed) -> Self {
        Self { db, feed }
    }

    /// Insert the summary. A debate gets exactly one; a second insert is
    /// a conflict.
    #[instrument(skip(self, new), fields(debate_id = %new.debate_id))]
    pub fn insert(&self, new: NewSummary) -> Result<Summary, StoreError> {
        let id = SummaryId::new();
        let now = Utc::now().to_rfc3339();
        let accuracy = serde_json::to_string(&new.accuracy_scores)?;
        let key_arguments = serde_json::to_string(&new.key_arguments)?;
        let verdict_counts = serde_json::to_string(&new.verdict_counts)?;
        let sources_used = serde_json::to_string(&new.sources_used)?;

        let result = self.db.with_conn(|conn| {
            Ok(conn.execute(
                "INSERT INTO summaries (id, debate_id, overall, winner_analysis, accuracy_scores,
                                        key_arguments, verdict_counts, sources_used, recommendations,
                                        votes_pro, votes_con, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12)",
                rusqlite::params![
                    id.as_str(),
                    new.debate_id.as_str(),
                    new.overall,
                    new.winner_analysis,
                    accuracy,
                    key_arguments,
                    verdict_counts,
                    sources_used,
                    new.recommendations,
                    new.vote_snapshot.pro,
                    new.vote_snapshot.con,
                    now,
                ],
            )?)
        });

        match result {
            Ok(_) => {}
            Err(StoreError::Database(detail)) if detail.contains("UNIQUE") => {
                return Err(StoreError::Conflict(format!(
                    "debate {} already has a summary",
                    new.debate_id
                )));
            }
            Err(e) => return Err(e),
        }

        self.feed.publish(ChangeEvent {
            table: ChangeTable::Summaries,
            op: ChangeOp::Inserted,
            debate_id: new.debate_id.clone(),
            entity_id: id.as_str().to_string(),
        });

        Ok(Summary {
            id,
            debate_id: new.debate_id,
            overall: new.overall,
            winner_analysis: new.winner_analysis,
            accuracy_scores: new.accuracy_scores,
            key_arguments: new.key_arguments,
            verdict_counts: new.verdict_counts,
            sources_used: new.sources_used,
            recommendations: new.recommendations,
            vote_snapshot: new.vote_snapshot,
            created_at: now,
        })
    }

    #[instrument(skip(self), fields(debate_id = %debate_id))]
    pub fn get(&self, debate_id: &DebateId) -> Result<Summary, StoreError> {
        self.db.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, debate_id, overall, winner_analysis, accuracy_scores, key_arguments,
                        verdict_counts, sources_used, recommendations, votes_pro, votes_con, created_at
                 FROM summaries WHERE debate_id = ?1",
            )?;
            let mut rows = stmt.query([debate_id.as_str()])?;
            match rows.next()? {
                Some(row) => row_to_summary(row),
                None => Err(StoreError::NotFound(format!("summary for debate {debate_id}"))),
            }
        })
    }
}

fn row_to_summary(row: &rusqlite::Row<'_>) -> Result<Summary, StoreError> {
    let accuracy_str: String = row_helpers::get(row, 4, "summaries", "accuracy_scores")?;
    let key_arguments_str: String = row_helpers::get(row, 5, "summaries", "key_arguments")?;
    let verdict_counts_str: String = row_helpers::get(row, 6, "summaries", "verdict_counts")?;
    let sources_str: String = row_helpers::get(row, 7, "summaries", "sources_used")?;

    Ok(Summary {
        id: SummaryId::from_raw(row_helpers::get::<String>(row, 0, "summaries", "id")?),
        debate_id: DebateId::from_raw(row_helpers::get::<String>(row, 1, "summaries", "debate_id")?),
        overall: row_helpers::get(row, 2, "summaries", "overall")?,
        winner_analysis: row_helpers::get(row, 3, "summaries", "winner_analysis")?,
        accuracy_scores: row_helpers::parse_json(&accuracy_str, "summaries", "accuracy_scores")?,
        key_arguments: row_helpers::parse_json(&key_arguments_str, "summaries", "key_arguments")?,
        verdict_counts: row_helpers::parse_json(&verdict_counts_str, "summaries", "verdict_counts")?,
        sources_used: row_helpers::parse_json(&sources_str, "summaries", "sources_used")?,
        recommendations: row_helpers::get(row, 8, "summaries", "recommendations")?,
        vote_snapshot: VoteTally {
            pro: row_helpers::get::<i64>(row, 9, "summaries", "votes_pro")? as u32,
            con: row_helpers::get::<i64>(row, 10, "summaries", "votes_con")? as u32,
        },
        created_at: row_helpers::get(row, 11, "summaries", "created_at")?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::debates::DebateRepo;
    use rostra_core::debate::DebateConfig;

    fn setup() -> (SummaryRepo, DebateId) {
        let db = Database::in_memory().unwrap();
        let feed = ChangeFeed::new(64);
        let debates = DebateRepo::new(db.clone(), feed.clone());
        let debate = debates.create("Topic", "", &DebateConfig::default()).unwrap();
        (SummaryRepo::new(db, feed), debate.id)
    }

    fn new_summary(debate_id: &DebateId) -> NewSummary {
        NewSummary {
            debate_id: debate_id.clone(),
            overall: "A spirited exchange.".into(),
            winner_analysis: "Pro carried the evidence.".into(),
            accuracy_scores: BTreeMap::from([("Ada".into(), 0.92)]),
            key_arguments: vec!["Costs fell tenfold.".into()],
            verdict_counts: BTreeMap::from([("true".into(), 3), ("mostly_false".into(), 1)]),
            sources_used: vec![RankedSource {
                title: "IEA".into(),
                url: "https://iea.org".into(),
                reliability: 0.9,
            }],
            recommendations: "Check the projection horizon.".into(),
            vote_snapshot: VoteTally { pro: 5, con: 2 },
        }
    }

    #[test]
    fn insert_and_get() {
        let (repo, debate_id) = setup();
        repo.insert(new_summary(&debate_id)).unwrap();

        let fetched = repo.get(&debate_id).unwrap();
        assert_eq!(fetched.vote_snapshot, VoteTally { pro: 5, con: 2 });
        assert_eq!(fetched.verdict_counts.get("true"), Some(&3));
        assert_eq!(fetched.sources_used.len(), 1);
    }

    #[test]
    fn second_summary_is_a_conflict() {
        let (repo, debate_id) = setup();
        repo.insert(new_summary(&debate_id)).unwrap();
        let result = repo.insert(new_summary(&debate_id));
        assert!(matches!(result, Err(StoreError::Conflict(_))));
    }

    #[test]
    fn get_missing_summary() {
        let (repo, debate_id) = setup();
        assert!(matches!(repo.get(&debate_id), Err(StoreError::NotFound(_))));
    }
}
