use chrono::Utc;
use tracing::instrument;

use rostra_core::ids::{DebateId, ParticipantId, TurnId};
use rostra_core::turn::{Citation, SourceSnippet, Turn, TurnType};

use crate::changes::{ChangeEvent, ChangeFeed, ChangeOp, ChangeTable};
use crate::database::Database;
use crate::error::StoreError;
use crate::row_helpers;

/// Input for a turn insert. The repo assigns the ID and timestamp.
#[derive(Clone, Debug)]
pub struct NewTurn {
    pub debate_id: DebateId,
    pub participant_id: ParticipantId,
    pub turn_no: u32,
    pub turn_type: TurnType,
    pub argument: String,
    pub citations: Vec<Citation>,
    pub sources: Vec<SourceSnippet>,
    pub audio_url: Option<String>,
}

pub struct TurnRepo {
    db: Database,
    feed: ChangeFeed,
}

impl TurnRepo {
    pub fn new(db: Database, feed: ChangeFeed) -> Self {
        Self { db, feed }
    }

    /// Insert a turn, idempotent on (debate_id, turn_no): a second insert
    /// for the same position is a no-op that returns the existing row.
    #[instrument(skip(self, new), fields(debate_id = %new.debate_id, turn_no = new.turn_no))]
    pub fn insert(&self, new: NewTurn) -> Result<Turn, StoreError> {
        let id = TurnId::new();
        let now = Utc::now().to_rfc3339();
        let citations = serde_json::to_string(&new.citations)?;
        let sources = serde_json::to_string(&new.sources)?;

        let inserted = self.db.with_conn(|conn| {
            Ok(conn.execute(
                "INSERT INTO turns (id, debate_id, participant_id, turn_no, turn_type, argument,
                                    citations, sources, audio_url, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)
                 ON CONFLICT(debate_id, turn_no) DO NOTHING",
                rusqlite::params![
                    id.as_str(),
                    new.debate_id.as_str(),
                    new.participant_id.as_str(),
                    new.turn_no,
                    new.turn_type.to_string(),
                    new.argument,
                    citations,
                    sources,
                    new.audio_url,
                    now,
                ],
            )?)
        })?;

        if inserted > 0 {
            self.feed.publish(ChangeEvent {
                table: ChangeTable::Turns,
                op: ChangeOp::Inserted,
                debate_id: new.debate_id.clone(),
                entity_id: id.as_str().to_string(),
            });
        }

        self.get_by_position(&new.debate_id, new.turn_no)
    }

    #[instrument(skip(self), fields(debate_id = %debate_id, turn_no))]
    pub fn get_by_position(&self, debate_id: &DebateId, turn_no: u32) -> Result<Turn, StoreError> {
        self.db.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, debate_id, participant_id, turn_no, turn_type, argument, citations,
                        sources, audio_url, created_at
                 FROM turns WHERE debate_id = ?1 AND turn_no = ?2",
            )?;
            let mut rows = stmt.query(rusqlite::params![debate_id.as_str(), turn_no])?;
            match rows.next()? {
                Some(row) => row_to_turn(row),
                None => Err(StoreError::NotFound(format!("turn {turn_no} of debate {debate_id}"))),
            }
        })
    }

    /// Full transcript, ordered by turn number.
    #[instrument(skip(self), fields(debate_id = %debate_id))]
    pub fn list(&self, debate_id: &DebateId) -> Result<Vec<Turn>, StoreError> {
        self.db.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, debate_id, participant_id, turn_no, turn_type, argument, citations,
                        sources, audio_url, created_at
                 FROM turns WHERE debate_id = ?1 ORDER BY turn_no ASC",
            )?;
            let mut rows = stmt.query([debate_id.as_str()])?;
            let mut results = Vec::new();
            while let Some(row) = rows.next()? {
                results.push(row_to_turn(row)?);
            }
            Ok(results)
        })
    }

    #[instrument(skip(self), fields(debate_id = %debate_id))]
    pub fn count(&self, debate_id: &DebateId) -> Result<i64, StoreError> {
        self.db.with_conn(|conn| {
            Ok(conn.query_row(
                "SELECT COUNT(*) FROM turns WHERE debate_id = ?1",
                [debate_id.as_str()],
                |row| row.get(0),
            )?)
        })
    }
}

fn row_to_turn(row: &rusqlite::Row<'_>) -> Result<Turn, StoreError> {
    let type_str: String = row_helpers::get(row, 4, "turns", "turn_type")?;
    let citations_str: String = row_helpers::get(row, 6, "turns", "citations")?;
    let sources_str: String = row_helpers::get(row, 7, "turns", "sources")?;

    Ok(Turn {
        id: TurnId::from_raw(row_helpers::get::<String>(row, 0, "turns", "id")?),
        debate_id: DebateId::from_raw(row_helpers::get::<String>(row, 1, "turns", "debate_id")?),
        participant_id: ParticipantId::from_raw(row_helpers::get::<String>(row, 2, "turns", "participant_id")?),
        turn_no: row_helpers::get::<i64>(row, 3, "turns", "turn_no")? as u32,
        turn_type: row_helpers::parse_enum(&type_str, "turns", "turn_type")?,
        argument: row_helpers::get(row, 5, "turns", "argument")?,
        citations: row_helpers::parse_json(&citations_str, "turns", "citations")?,
        sources: row_helpers::parse_json(&sources_str, "turns", "sources")?,
        audio_url: row_helpers::get_opt(row, 8, "turns", "audio_url")?,
        created_at: row_helpers::get(row, 9, "turns", "created_at")?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::debates::DebateRepo;
    use crate::participants::ParticipantRepo;
    use rostra_core::debate::{DebateConfig, Role};

    fn setup() -> (TurnRepo, DebateId, ParticipantId) {
        let db = Database::in_memory().unwrap();
        let feed = ChangeFeed::new(64);
        let debates = DebateRepo::new(db.clone(), feed.clone());
        let debate = debates.create("Topic", "", &DebateConfig::default()).unwrap();
        let participants = ParticipantRepo::new(db.clone());
        let pro = participants.create(&debate.id, Role::Pro, "Ada", "", "").unwrap();
        (TurnRepo::new(db, feed), debate.id, pro.id)
    }

    fn new_turn(debate_id: &DebateId, participant_id: &ParticipantId, turn_no: u32) -> NewTurn {
        NewTurn {
            debate_id: debate_id.clone(),
            participant_id: participant_id.clone(),
            turn_no,
            turn_type: TurnType::Opening,
            argument: format!("argument {turn_no}"),
            citations: vec![Citation { label: "src".into(), url: None }],
            sources: vec![],
            audio_url: None,
        }
    }

    #[test]
    fn insert_and_list_ordered() {
        let (repo, debate_id, participant_id) = setup();
        for n in [2, 1, 3] {
            // Insertion order deliberately scrambled
            repo.insert(new_turn(&debate_id, &participant_id, n)).unwrap();
        }

        let all = repo.list(&debate_id).unwrap();
        assert_eq!(all.len(), 3);
        let numbers: Vec<u32> = all.iter().map(|t| t.turn_no).collect();
        assert_eq!(numbers, vec![1, 2, 3]);
        assert_eq!(all[0].citations.len(), 1);
    }

    #[test]
    fn insert_is_idempotent_by_position() {
        let (repo, debate_id, participant_id) = setup();
        let first = repo.insert(new_turn(&debate_id, &participant_id, 1)).unwrap();

        let mut duplicate = new_turn(&debate_id, &participant_id, 1);
        duplicate.argument = "a different argument".into();
        let second = repo.insert(duplicate).unwrap();

        assert_eq!(second.id, first.id);
        assert_eq!(second.argument, "argument 1");
        assert_eq!(repo.count(&debate_id).unwrap(), 1);
    }

    #[test]
    fn duplicate_insert_does_not_republish() {
        let db = Database::in_memory().unwrap();
        let feed = ChangeFeed::new(64);
        let debates = DebateRepo::new(db.clone(), feed.clone());
        let debate = debates.create("Topic", "", &DebateConfig::default()).unwrap();
        let pro = ParticipantRepo::new(db.clone())
            .create(&debate.id, Role::Pro, "Ada", "", "")
            .unwrap();
        let repo = TurnRepo::new(db, feed.clone());

        let mut rx = feed.subscribe();
        repo.insert(new_turn(&debate.id, &pro.id, 1)).unwrap();
        repo.insert(new_turn(&debate.id, &pro.id, 1)).unwrap();

        let mut turn_events = 0;
        while let Ok(event) = rx.try_recv() {
            if event.table == ChangeTable::Turns {
                turn_events += 1;
            }
        }
        assert_eq!(turn_events, 1);
    }

    #[test]
    fn get_by_position_missing() {
        let (repo, debate_id, _) = setup();
        assert!(matches!(
            repo.get_by_position(&debate_id, 9),
            Err(StoreError::NotFound(_))
        ));
    }

    #[test]
    fn malformed_citations_returns_corrupt_row() {
        let (repo, debate_id, participant_id) = setup();
        let turn = repo.insert(new_turn(&debate_id, &participant_id, 1)).unwrap();

        repo.db
            .with_conn(|conn| {
                conn.execute(
                    "UPDATE turns SET citations = 'not json' WHERE id = ?1",
                    [turn.id.as_str()],
                )?;
                Ok(())
            })
            .unwrap();

        let result = repo.list(&debate_id);
        assert!(matches!(result, Err(StoreError::CorruptRow { table: "turns", .. })));
    }
}
