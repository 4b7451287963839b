use std::sync::Arc;

use serde::Deserialize;
use tracing::{instrument, warn};

use rostra_core::debate::Participant;
use rostra_core::provider::{CompletionRequest, LanguageModel};
use rostra_core::turn::Turn;
use rostra_core::verdict::{is_lie, AlertSeverity, ClaimVerdict, Verdict};
use rostra_llm::decode::decode_lenient;
use rostra_store::verdicts::{AlertRepo, NewAlert, NewVerdict, VerdictRepo};

use crate::error::EngineError;
use crate::prompts;

/// One entry of the checker's response. Every field is optional so a
/// sloppy response still yields a usable record.
#[derive(Debug, Deserialize)]
struct ClaimFinding {
    #[serde(default)]
    verdict: String,
    #[serde(default)]
    explanation: String,
    #[serde(default)]
    confidence: f64,
    #[serde(default)]
    sources: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct VerificationReport {
    #[serde(default)]
    verdicts: Vec<ClaimFinding>,
}

/// Verifies the claims a turn made against the side's research context,
/// classifies high-confidence falsehoods as lies, and persists a verdict
/// per claim plus an alert per lie.
pub struct ClaimVerifier {
    model: Arc<dyn LanguageModel>,
    verdicts: VerdictRepo,
    alerts: AlertRepo,
}

impl ClaimVerifier {
    pub fn new(model: Arc<dyn LanguageModel>, verdicts: VerdictRepo, alerts: AlertRepo) -> Self {
        Self { model, verdicts, alerts }
    }

    /// Verification is claim-gated: a turn with no claims produces no
    /// model call, no verdicts and no alerts.
    #[instrument(skip(self, topic, turn, participant, claims, context), fields(turn_id = %turn.id, claims = claims.len()))]
    pub async fn verify(
        &self,
        topic: &str,
        turn: &Turn,
        participant: &Participant,
        claims: &[String],
        context: &str,
    ) -> Result<Vec<ClaimVerdict>, EngineError> {
        if claims.is_empty() {
            return Ok(Vec::new());
        }

        // One batched request for the whole turn.
        let request = CompletionRequest::new(
            prompts::verifier_system(),
            prompts::verification_request(topic, &turn.argument, claims, context),
        );
        let raw = self.model.complete(&request).await?;

        let findings = match decode_lenient::<VerificationReport>(&raw) {
            Some(report) => report.verdicts,
            None => {
                warn!(turn_id = %turn.id, "unparseable verification response; recording claims as unverifiable");
                Vec::new()
            }
        };

        let mut records = Vec::with_capacity(claims.len());
        for (idx, claim) in claims.iter().enumerate() {
            let (verdict, explanation, confidence, sources) = match findings.get(idx) {
                Some(finding) => (
                    Verdict::normalize(&finding.verdict),
                    finding.explanation.clone(),
                    finding.confidence.clamp(0.0, 1.0),
                    finding.sources.clone(),
                ),
                None => (
                    Verdict::Unverifiable,
                    "no verdict returned for this claim".to_string(),
                    0.0,
                    Vec::new(),
                ),
            };
            let lie = is_lie(verdict, confidence);

            let record = self.verdicts.insert(NewVerdict {
                debate_id: turn.debate_id.clone(),
                turn_id: turn.id.clone(),
                participant_id: turn.participant_id.clone(),
                claim: claim.clone(),
                verdict,
                explanation,
                confidence,
                is_lie: lie,
                sources,
            })?;

            if lie {
                self.alerts.insert(NewAlert {
                    debate_id: turn.debate_id.clone(),
                    verdict_id: record.id.clone(),
                    participant_name: participant.display_name.clone(),
                    claim: record.claim.clone(),
                    explanation: record.explanation.clone(),
                    severity: AlertSeverity::from_confidence(record.confidence),
                })?;
            }

            records.push(record);
        }
        Ok(records)
    }
}
