use std::sync::Arc;
use std::time::Duration;

use serde::Deserialize;
use tokio::task::JoinSet;
use tracing::{instrument, warn};

use rostra_core::debate::{Debate, Participant};
use rostra_core::provider::{CompletionRequest, LanguageModel, SpeechSynthesizer};
use rostra_core::research::ResearchBundle;
use rostra_core::turn::{Citation, SourceSnippet, Turn, TurnType};
use rostra_llm::decode::decode_lenient;
use rostra_store::media::MediaRepo;
use rostra_store::turns::{NewTurn, TurnRepo};

use crate::error::EngineError;
use crate::prompts;
use crate::verify::ClaimVerifier;

/// Pacing knobs. Defaults match live delivery: 150 words per minute with
/// a 15 second floor per turn.
#[derive(Clone, Debug)]
pub struct SchedulerConfig {
    pub words_per_minute: u32,
    pub min_display: Duration,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            words_per_minute: 150,
            min_display: Duration::from_secs(15),
        }
    }
}

/// Derive a turn's kind from its position. Turns 1 and 2 open, the last
/// two close, everything between rebuts. The opening check runs first,
/// so in very short debates (max_turns <= 3) overlapping positions
/// resolve to opening.
pub fn turn_type(turn_no: u32, max_turns: u32) -> TurnType {
    if turn_no <= 2 {
        TurnType::Opening
    } else if turn_no + 1 >= max_turns {
        TurnType::Closing
    } else {
        TurnType::Rebuttal
    }
}

/// Estimated time a human needs to consume an argument.
pub fn display_duration(argument: &str, config: &SchedulerConfig) -> Duration {
    let words = argument.split_whitespace().count() as u64;
    let seconds = words * 60 / config.words_per_minute.max(1) as u64;
    Duration::from_secs(seconds).max(config.min_display)
}

/// Shape the generator is asked to produce. Decoded leniently; a
/// response that is not JSON at all becomes a bare argument.
#[derive(Debug, Deserialize)]
struct DraftTurn {
    argument: String,
    #[serde(default)]
    citations: Vec<Citation>,
    #[serde(default)]
    claims: Vec<String>,
}

fn normalize_draft(raw: String) -> DraftTurn {
    match decode_lenient::<DraftTurn>(&raw) {
        Some(draft) if !draft.argument.trim().is_empty() => draft,
        _ => DraftTurn {
            argument: raw,
            citations: Vec::new(),
            claims: Vec::new(),
        },
    }
}

/// Drives the live phase: generates and persists turns in pro/con pairs,
/// paces delivery to human reading speed, and fans claim verification
/// out as each turn lands.
pub struct TurnScheduler {
    model: Arc<dyn LanguageModel>,
    speech: Option<Arc<dyn SpeechSynthesizer>>,
    turns: TurnRepo,
    media: MediaRepo,
    verifier: Arc<ClaimVerifier>,
    config: SchedulerConfig,
}

impl TurnScheduler {
    pub fn new(
        model: Arc<dyn LanguageModel>,
        speech: Option<Arc<dyn SpeechSynthesizer>>,
        turns: TurnRepo,
        media: MediaRepo,
        verifier: Arc<ClaimVerifier>,
        config: SchedulerConfig,
    ) -> Self {
        Self {
            model,
            speech,
            turns,
            media,
            verifier,
            config,
        }
    }

    /// Run the whole turn loop. Returns the transcript in turn order.
    ///
    /// Openings carry no textual dependency, so both sides generate
    /// concurrently. Every later con turn must see the persisted pro
    /// turn it answers, so those pairs run sequentially. All spawned
    /// verification work is awaited before this returns — the verdict
    /// set is complete when the live phase ends.
    #[instrument(skip_all, fields(debate_id = %debate.id, max_turns = debate.config.max_turns))]
    pub async fn run_live_phase(
        &self,
        debate: &Debate,
        pro: &Participant,
        con: &Participant,
        pro_research: &ResearchBundle,
        con_research: &ResearchBundle,
    ) -> Result<Vec<Turn>, EngineError> {
        let max_turns = debate.config.max_turns;
        let mut verifications: JoinSet<Result<(), EngineError>> = JoinSet::new();
        let mut transcript: Vec<Turn> = Vec::new();

        let mut pro_no = 1;
        while pro_no <= max_turns {
            let con_no = pro_no + 1;
            let pair_kind = turn_type(pro_no, max_turns);

            if pair_kind == TurnType::Opening {
                let (pro_draft, con_draft) = futures::join!(
                    self.generate(debate, pro, pro_no, pair_kind, &transcript, pro_research),
                    self.generate(debate, con, con_no, turn_type(con_no, max_turns), &transcript, con_research),
                );
                let (pro_draft, con_draft) = (pro_draft?, con_draft?);

                let pro_turn = self
                    .commit(debate, pro, pro_no, pair_kind, pro_draft, pro_research, &mut verifications)
                    .await?;
                let pause = display_duration(&pro_turn.argument, &self.config);
                transcript.push(pro_turn);

                if con_no <= max_turns {
                    tokio::time::sleep(pause).await;
                    let con_turn = self
                        .commit(
                            debate,
                            con,
                            con_no,
                            turn_type(con_no, max_turns),
                            con_draft,
                            con_research,
                            &mut verifications,
                        )
                        .await?;
                    transcript.push(con_turn);
                }
            } else {
                let pro_draft = self
                    .generate(debate, pro, pro_no, pair_kind, &transcript, pro_research)
                    .await?;
                let pro_turn = self
                    .commit(debate, pro, pro_no, pair_kind, pro_draft, pro_research, &mut verifications)
                    .await?;
                let pause = display_duration(&pro_turn.argument, &self.config);
                transcript.push(pro_turn);

                if con_no <= max_turns {
                    let con_kind = turn_type(con_no, max_turns);
                    // Con rebuts the committed pro turn, which is now in
                    // the transcript it sees.
                    let con_draft = self
                        .generate(debate, con, con_no, con_kind, &transcript, con_research)
                        .await?;
                    tokio::time::sleep(pause).await;
                    let con_turn = self
                        .commit(debate, con, con_no, con_kind, con_draft, con_research, &mut verifications)
                        .await?;
                    transcript.push(con_turn);
                }
            }

            pro_no += 2;
        }

        while let Some(joined) = verifications.join_next().await {
            match joined {
                Ok(Ok(())) => {}
                Ok(Err(error)) => return Err(error),
                Err(join_error) => {
                    return Err(EngineError::Internal(format!("verification task failed: {join_error}")))
                }
            }
        }

        Ok(transcript)
    }

    async fn generate(
        &self,
        debate: &Debate,
        participant: &Participant,
        turn_no: u32,
        kind: TurnType,
        history: &[Turn],
        research: &ResearchBundle,
    ) -> Result<DraftTurn, EngineError> {
        let request = CompletionRequest::new(
            prompts::debater_system(debate, participant),
            prompts::turn_request(debate, participant, turn_no, kind, history, research),
        );
        let raw = self.model.complete(&request).await?;
        Ok(normalize_draft(raw))
    }

    /// Synthesize (optionally), persist, and hand the turn's claims to
    /// the verifier as a detached task.
    async fn commit(
        &self,
        debate: &Debate,
        participant: &Participant,
        turn_no: u32,
        kind: TurnType,
        draft: DraftTurn,
        research: &ResearchBundle,
        verifications: &mut JoinSet<Result<(), EngineError>>,
    ) -> Result<Turn, EngineError> {
        let audio_url = self.maybe_synthesize(debate, participant, &draft.argument).await;

        let turn = self.turns.insert(NewTurn {
            debate_id: debate.id.clone(),
            participant_id: participant.id.clone(),
            turn_no,
            turn_type: kind,
            argument: draft.argument,
            citations: draft.citations,
            sources: research
                .sources
                .iter()
                .map(|s| SourceSnippet {
                    title: s.title.clone(),
                    url: s.url.clone(),
                    snippet: s.snippet.clone(),
                })
                .collect(),
            audio_url,
        })?;

        if debate.config.fact_checking_enabled && !draft.claims.is_empty() {
            let verifier = Arc::clone(&self.verifier);
            let topic = debate.topic.clone();
            let turn = turn.clone();
            let participant = participant.clone();
            let claims = draft.claims;
            let context = research.context.clone();
            verifications.spawn(async move {
                verifier
                    .verify(&topic, &turn, &participant, &claims, &context)
                    .await
                    .map(|_| ())
            });
        }

        Ok(turn)
    }

    /// Speech is a best-effort embellishment: any failure leaves the
    /// turn without audio.
    async fn maybe_synthesize(
        &self,
        debate: &Debate,
        participant: &Participant,
        argument: &str,
    ) -> Option<String> {
        if !debate.config.speech_enabled {
            return None;
        }
        let synthesizer = self.speech.as_ref()?;

        match synthesizer.synthesize(argument, &participant.voice_id).await {
            Ok(audio) => match self.media.put(&debate.id, "audio/mpeg", &audio) {
                Ok(media_id) => Some(self.media.public_url(&media_id)),
                Err(error) => {
                    warn!(error = %error, "failed to store synthesized audio");
                    None
                }
            },
            Err(error) => {
                warn!(error = %error, participant = %participant.display_name, "speech synthesis failed");
                None
            }
        }
    }
}
