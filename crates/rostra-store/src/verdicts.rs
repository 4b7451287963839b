use chrono::Utc;
use tracing::instrument;

use rostra_core::ids::{AlertId, DebateId, ParticipantId, TurnId, VerdictId};
use rostra_core::verdict::{Alert, AlertSeverity, ClaimVerdict, Verdict};

use crate::changes::{ChangeEvent, ChangeFeed, ChangeOp, ChangeTable};
use crate::database::Database;
use crate::error::StoreError;
use crate::row_helpers;

/// Input for a claim-verdict insert. `is_lie` is derived by the caller
/// from the verdict/confidence rule and stored as written.
#[derive(Clone, Debug)]
pub struct NewVerdict {
    pub debate_id: DebateId,
    pub turn_id: TurnId,
    pub participant_id: ParticipantId,
    pub claim: String,
    pub verdict: Verdict,
    pub explanation: String,
    pub confidence: f64,
    pub is_lie: bool,
    pub sources: Vec<String>,
}

pub struct VerdictRepo {
    db: Database,
    feed: ChangeFeed,
}

impl VerdictRepo {
    pub fn new(db: Database, feed: ChangeFeed) -> Self {
        Self { db, feed }
    }

    #[instrument(skip(self, new), fields(debate_id = %new.debate_id, turn_id = %new.turn_id, verdict = %new.verdict))]
    pub fn insert(&self, new: NewVerdict) -> Result<ClaimVerdict, StoreError> {
        let id = VerdictId::new();
        let now = Utc::now().to_rfc3339();
        let sources = serde_json::to_string(&new.sources)?;

        self.db.with_conn(|conn| {
            conn.execute(
                "INSERT INTO claim_verdicts (id, debate_id, turn_id, participant_id, claim, verdict,
                                             explanation, confidence, is_lie, sources, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
                rusqlite::params![
                    id.as_str(),
                    new.debate_id.as_str(),
                    new.turn_id.as_str(),
                    new.participant_id.as_str(),
                    new.claim,
                    new.verdict.to_string(),
                    new.explanation,
                    new.confidence,
                    new.is_lie,
                    sources,
                    now,
                ],
            )?;
            Ok(())
        })?;

        self.feed.publish(ChangeEvent {
            table: ChangeTable::ClaimVerdicts,
            op: ChangeOp::Inserted,
            debate_id: new.debate_id.clone(),
            entity_id: id.as_str().to_string(),
        });

        Ok(ClaimVerdict {
            id,
            debate_id: new.debate_id,
            turn_id: new.turn_id,
            participant_id: new.participant_id,
            claim: new.claim,
            verdict: new.verdict,
            explanation: new.explanation,
            confidence: new.confidence,
            is_lie: new.is_lie,
            sources: new.sources,
            created_at: now,
        })
    }

    /// All verdicts of a debate, oldest first.
    #[instrument(skip(self), fields(debate_id = %debate_id))]
    pub fn list(&self, debate_id: &DebateId) -> Result<Vec<ClaimVerdict>, StoreError> {
        self.db.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, debate_id, turn_id, participant_id, claim, verdict, explanation,
                        confidence, is_lie, sources, created_at
                 FROM claim_verdicts WHERE debate_id = ?1 ORDER BY created_at ASC, id ASC",
            )?;
            let mut rows = stmt.query([debate_id.as_str()])?;
            let mut results = Vec::new();
            while let Some(row) = rows.next()? {
                results.push(row_to_verdict(row)?);
            }
            Ok(results)
        })
    }

    #[instrument(skip(self), fields(turn_id = %turn_id))]
    pub fn list_for_turn(&self, turn_id: &TurnId) -> Result<Vec<ClaimVerdict>, StoreError> {
        self.db.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, debate_id, turn_id, participant_id, claim, verdict, explanation,
                        confidence, is_lie, sources, created_at
                 FROM claim_verdicts WHERE turn_id = ?1 ORDER BY created_at ASC, id ASC",
            )?;
            let mut rows = stmt.query([turn_id.as_str()])?;
            let mut results = Vec::new();
            while let Some(row) = rows.next()? {
                results.push(row_to_verdict(row)?);
            }
            Ok(results)
        })
    }
}

fn row_to_verdict(row: &rusqlite::Row<'_>) -> Result<ClaimVerdict, StoreError> {
    let verdict_str: String = row_helpers::get(row, 5, "claim_verdicts", "verdict")?;
    let sources_str: String = row_helpers::get(row, 9, "claim_verdicts", "sources")?;

    Ok(ClaimVerdict {
        id: VerdictId::from_raw(row_helpers::get::<String>(row, 0, "claim_verdicts", "id")?),
        debate_id: DebateId::from_raw(row_helpers::get::<String>(row, 1, "claim_verdicts", "debate_id")?),
        turn_id: TurnId::from_raw(row_helpers::get::<String>(row, 2, "claim_verdicts", "turn_id")?),
        participant_id: ParticipantId::from_raw(row_helpers::get::<String>(
            row,
            3,
            "claim_verdicts",
            "participant_id",
        )?),
        claim: row_helpers::get(row, 4, "claim_verdicts", "claim")?,
        verdict: row_helpers::parse_enum(&verdict_str, "claim_verdicts", "verdict")?,
        explanation: row_helpers::get(row, 6, "claim_verdicts", "explanation")?,
        confidence: row_helpers::get(row, 7, "claim_verdicts", "confidence")?,
        is_lie: row_helpers::get(row, 8, "claim_verdicts", "is_lie")?,
        sources: row_helpers::parse_json(&sources_str, "claim_verdicts", "sources")?,
        created_at: row_helpers::get(row, 10, "claim_verdicts", "created_at")?,
    })
}

/// Input for an alert insert.
#[derive(Clone, Debug)]
pub struct NewAlert {
    pub debate_id: DebateId,
    pub verdict_id: VerdictId,
    pub participant_name: String,
    pub claim: String,
    pub explanation: String,
    pub severity: AlertSeverity,
}

pub struct AlertRepo {
    db: Database,
    feed: ChangeFeed,
}

impl AlertRepo {
    pub fn new(db: Database, feed: ChangeFeed) -> Self {
        Self { db, feed }
    }

    #[instrument(skip(self, new), fields(debate_id = %new.debate_id, severity = %new.severity))]
    pub fn insert(&self, new: NewAlert) -> Result<Alert, StoreError> {
        let id = AlertId::new();
        let now = Utc::now().to_rfc3339();

        self.db.with_conn(|conn| {
            conn.execute(
                "INSERT INTO alerts (id, debate_id, verdict_id, participant_name, claim,
                                     explanation, severity, created_at)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
                rusqlite::params![
                    id.as_str(),
                    new.debate_id.as_str(),
                    new.verdict_id.as_str(),
                    new.participant_name,
                    new.claim,
                    new.explanation,
                    new.severity.to_string(),
                    now,
                ],
            )?;
            Ok(())
        })?;

        self.feed.publish(ChangeEvent {
            table: ChangeTable::Alerts,
            op: ChangeOp::Inserted,
            debate_id: new.debate_id.clone(),
            entity_id: id.as_str().to_string(),
        });

        Ok(Alert {
            id,
            debate_id: new.debate_id,
            verdict_id: new.verdict_id,
            participant_name: new.participant_name,
            claim: new.claim,
            explanation: new.explanation,
            severity: new.severity,
            created_at: now,
        })
    }

    #[instrument(skip(self), fields(debate_id = %debate_id))]
    pub fn list(&self, debate_id: &DebateId) -> Result<Vec<Alert>, StoreError> {
        self.db.with_conn(|conn| {
            let mut stmt = conn.prepare(
                "SELECT id, debate_id, verdict_id, participant_name, claim, explanation, severity, created_at
                 FROM alerts WHERE debate_id = ?1 ORDER BY created_at ASC, id ASC",
            )?;
            let mut rows = stmt.query([debate_id.as_str()])?;
            let mut results = Vec::new();
            while let Some(row) = rows.next()? {
                let severity_str: String = row_helpers::get(row, 6, "alerts", "severity")?;
                results.push(Alert {
                    id: AlertId::from_raw(row_helpers::get::<String>(row, 0, "alerts", "id")?),
                    debate_id: DebateId::from_raw(row_helpers::get::<String>(row, 1, "alerts", "debate_id")?),
                    verdict_id: VerdictId::from_raw(row_helpers::get::<String>(row, 2, "alerts", "verdict_id")?),
                    participant_name: row_helpers::get(row, 3, "alerts", "participant_name")?,
                    claim: row_helpers::get(row, 4, "alerts", "claim")?,
                    explanation: row_helpers::get(row, 5, "alerts", "explanation")?,
                    severity: row_helpers::parse_enum(&severity_str, "alerts", "severity")?,
                    created_at: row_helpers::get(row, 7, "alerts", "created_at")?,
                });
            }
            Ok(results)
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::debates::DebateRepo;
    use crate::participants::ParticipantRepo;
    use crate::turns::{NewTurn, TurnRepo};
    use rostra_core::debate::{DebateConfig, Role};
    use rostra_core::turn::TurnType;

    struct Fixture {
        db: Database,
        feed: ChangeFeed,
        debate_id: DebateId,
        participant_id: ParticipantId,
        turn_id: TurnId,
    }

    fn setup() -> Fixture {
        let db = Database::in_memory().unwrap();
        let feed = ChangeFeed::new(64);
        let debates = DebateRepo::new(db.clone(), feed.clone());
        let debate = debates.create("Topic", "", &DebateConfig::default()).unwrap();
        let pro = ParticipantRepo::new(db.clone())
            .create(&debate.id, Role::Pro, "Ada", "", "")
            .unwrap();
        let turn = TurnRepo::new(db.clone(), feed.clone())
            .insert(NewTurn {
                debate_id: debate.id.clone(),
                participant_id: pro.id.clone(),
                turn_no: 1,
                turn_type: TurnType::Opening,
                argument: "arg".into(),
                citations: vec![],
                sources: vec![],
                audio_url: None,
            })
            .unwrap();
        Fixture {
            db,
            feed,
            debate_id: debate.id,
            participant_id: pro.id,
            turn_id: turn.id,
        }
    }

    fn new_verdict(f: &Fixture, claim: &str, verdict: Verdict, confidence: f64) -> NewVerdict {
        NewVerdict {
            debate_id: f.debate_id.clone(),
            turn_id: f.turn_id.clone(),
            participant_id: f.participant_id.clone(),
            claim: claim.into(),
            verdict,
            explanation: "checked against sources".into(),
            confidence,
            is_lie: rostra_core::verdict::is_lie(verdict, confidence),
            sources: vec!["https://example.org".into()],
        }
    }

    #[test]
    fn insert_and_list_verdicts() {
        let f = setup();
        let repo = VerdictRepo::new(f.db.clone(), f.feed.clone());
        repo.insert(new_verdict(&f, "claim one", Verdict::True, 0.9)).unwrap();
        repo.insert(new_verdict(&f, "claim two", Verdict::False, 0.85)).unwrap();

        let all = repo.list(&f.debate_id).unwrap();
        assert_eq!(all.len(), 2);
        assert_eq!(all[0].claim, "claim one");
        assert!(!all[0].is_lie);
        assert!(all[1].is_lie);

        let for_turn = repo.list_for_turn(&f.turn_id).unwrap();
        assert_eq!(for_turn.len(), 2);
    }

    #[test]
    fn verdict_roundtrips_sources() {
        let f = setup();
        let repo = VerdictRepo::new(f.db.clone(), f.feed.clone());
        repo.insert(new_verdict(&f, "claim", Verdict::Mixed, 0.5)).unwrap();
        let fetched = &repo.list(&f.debate_id).unwrap()[0];
        assert_eq!(fetched.sources, vec!["https://example.org".to_string()]);
        assert_eq!(fetched.verdict, Verdict::Mixed);
    }

    #[test]
    fn insert_and_list_alerts() {
        let f = setup();
        let verdicts = VerdictRepo::new(f.db.clone(), f.feed.clone());
        let verdict = verdicts.insert(new_verdict(&f, "the moon is cheese", Verdict::False, 0.95)).unwrap();

        let alerts = AlertRepo::new(f.db.clone(), f.feed.clone());
        alerts
            .insert(NewAlert {
                debate_id: f.debate_id.clone(),
                verdict_id: verdict.id.clone(),
                participant_name: "Ada".into(),
                claim: verdict.claim.clone(),
                explanation: verdict.explanation.clone(),
                severity: AlertSeverity::Critical,
            })
            .unwrap();

        let all = alerts.list(&f.debate_id).unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all[0].severity, AlertSeverity::Critical);
        assert_eq!(all[0].verdict_id, verdict.id);
    }

    #[test]
    fn verdict_insert_publishes_change() {
        let f = setup();
        let mut rx = f.feed.subscribe();
        let repo = VerdictRepo::new(f.db.clone(), f.feed.clone());
        repo.insert(new_verdict(&f, "claim", Verdict::True, 0.7)).unwrap();

        let mut saw_verdict = false;
        while let Ok(event) = rx.try_recv() {
            if event.table == ChangeTable::ClaimVerdicts {
                saw_verdict = true;
            }
        }
        assert!(saw_verdict);
    }
}
