use std::collections::BTreeMap;

use serde::Deserialize;
use tracing::{instrument, warn};

use rostra_core::debate::{Debate, Participant};
use rostra_core::provider::{CompletionRequest, LanguageModel};
use rostra_core::summary::{RankedSource, VoteTally};
use rostra_core::turn::Turn;
use rostra_core::verdict::ClaimVerdict;
use rostra_llm::decode::decode_lenient;
use rostra_store::summaries::NewSummary;

use crate::error::EngineError;
use crate::prompts;

const SUMMARY_MAX_TOKENS: u32 = 4096;

/// Shape the analyst is asked to produce. Everything is optional; a
/// response that is not JSON at all becomes the overall narrative.
#[derive(Debug, Default, Deserialize)]
struct SummaryResponse {
    #[serde(default)]
    overall_summary: String,
    #[serde(default)]
    winner_analysis: String,
    #[serde(default)]
    accuracy_scores: BTreeMap<String, f64>,
    #[serde(default)]
    key_arguments: Vec<String>,
    #[serde(default)]
    sources_used: Vec<RankedSource>,
    #[serde(default)]
    recommendations: String,
}

/// Aggregate verdict labels deterministically from the persisted set —
/// this is counted here, never asked of the model.
fn count_verdicts(verdicts: &[ClaimVerdict]) -> BTreeMap<String, u32> {
    let mut counts = BTreeMap::new();
    for verdict in verdicts {
        *counts.entry(verdict.verdict.to_string()).or_insert(0) += 1;
    }
    counts
}

/// Synthesize the post-hoc summary from the full transcript, the verdict
/// set, and the vote tally as it stands.
#[instrument(skip_all, fields(debate_id = %debate.id, turns = transcript.len(), verdicts = verdicts.len()))]
pub async fn synthesize(
    model: &dyn LanguageModel,
    debate: &Debate,
    participants: &[Participant],
    transcript: &[Turn],
    verdicts: &[ClaimVerdict],
    tally: VoteTally,
) -> Result<NewSummary, EngineError> {
    let request = CompletionRequest::new(
        prompts::summary_system(),
        prompts::summary_request(debate, participants, transcript, verdicts, tally),
    )
    .with_max_tokens(SUMMARY_MAX_TOKENS);

    let raw = model.complete(&request).await?;

    let response = match decode_lenient::<SummaryResponse>(&raw) {
        Some(response) if !response.overall_summary.trim().is_empty() => response,
        _ => {
            warn!(debate_id = %debate.id, "unstructured summary response; using raw text as narrative");
            SummaryResponse {
                overall_summary: raw,
                ..Default::default()
            }
        }
    };

    Ok(NewSummary {
        debate_id: debate.id.clone(),
        overall: response.overall_summary,
        winner_analysis: response.winner_analysis,
        accuracy_scores: response.accuracy_scores,
        key_arguments: response.key_arguments,
        verdict_counts: count_verdicts(verdicts),
        sources_used: response.sources_used,
        recommendations: response.recommendations,
        vote_snapshot: tally,
    })
}
