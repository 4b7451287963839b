use std::sync::Arc;
use std::time::Duration;

use dashmap::DashMap;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, instrument};

use rostra_core::debate::{Debate, DebateStatus, Role};
use rostra_core::ids::DebateId;
use rostra_core::provider::{LanguageModel, ResearchProvider, SpeechSynthesizer};
use rostra_store::debates::DebateRepo;
use rostra_store::documents::DocumentRepo;
use rostra_store::media::MediaRepo;
use rostra_store::participants::ParticipantRepo;
use rostra_store::summaries::SummaryRepo;
use rostra_store::turns::TurnRepo;
use rostra_store::verdicts::{AlertRepo, VerdictRepo};
use rostra_store::votes::VoteRepo;
use rostra_store::{ChangeFeed, Database, StoreError};

use crate::error::EngineError;
use crate::phase::{transition, PhaseEvent};
use crate::research::ResearchCoordinator;
use crate::summary;
use crate::turns::{SchedulerConfig, TurnScheduler};
use crate::verify::ClaimVerifier;

#[derive(Clone, Debug)]
pub struct OrchestratorConfig {
    /// Fixed window during which external vote submissions land.
    pub voting_window: Duration,
    pub scheduler: SchedulerConfig,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            voting_window: Duration::from_secs(5),
            scheduler: SchedulerConfig::default(),
        }
    }
}

/// Top-level driver. Each started debate runs as one detached background
/// task that walks the phase order; any error is caught exactly once at
/// the top and converted into the failure edge, so no debate is ever
/// left stuck in a non-terminal phase.
///
/// Cheap to clone: every field is a shared handle.
#[derive(Clone)]
pub struct DebateOrchestrator {
    db: Database,
    feed: ChangeFeed,
    model: Arc<dyn LanguageModel>,
    research: Arc<dyn ResearchProvider>,
    speech: Option<Arc<dyn SpeechSynthesizer>>,
    config: OrchestratorConfig,
    active: Arc<DashMap<DebateId, CancellationToken>>,
}

impl DebateOrchestrator {
    pub fn new(
        db: Database,
        feed: ChangeFeed,
        model: Arc<dyn LanguageModel>,
        research: Arc<dyn ResearchProvider>,
        speech: Option<Arc<dyn SpeechSynthesizer>>,
        config: OrchestratorConfig,
    ) -> Self {
        Self {
            db,
            feed,
            model,
            research,
            speech,
            config,
            active: Arc::new(DashMap::new()),
        }
    }

    fn debates(&self) -> DebateRepo {
        DebateRepo::new(self.db.clone(), self.feed.clone())
    }

    /// Kick off orchestration for a debate in `setup`. Returns once the
    /// background task is spawned; the caller does not await the run.
    #[instrument(skip(self), fields(debate_id = %debate_id))]
    pub fn start(&self, debate_id: &DebateId) -> Result<(), EngineError> {
        let debate = self.debates().get(debate_id).map_err(|e| match e {
            StoreError::NotFound(_) => EngineError::DebateNotFound(debate_id.to_string()),
            other => EngineError::Store(other),
        })?;
        if debate.status != DebateStatus::Setup {
            return Err(EngineError::InvalidPhase(debate.status));
        }
        if self.active.contains_key(debate_id) {
            return Err(EngineError::AlreadyRunning(debate_id.to_string()));
        }

        let cancel = CancellationToken::new();
        self.active.insert(debate_id.clone(), cancel.clone());

        let orchestrator = self.clone();
        let debate_id = debate_id.clone();
        tokio::spawn(async move {
            if let Err(run_error) = orchestrator.drive(&debate_id, cancel).await {
                error!(debate_id = %debate_id, error = %run_error, "debate run failed");
                if let Err(store_error) = orchestrator
                    .debates()
                    .mark_failed(&debate_id, &run_error.to_string())
                {
                    error!(debate_id = %debate_id, error = %store_error, "failed to record debate failure");
                }
            }
            orchestrator.active.remove(&debate_id);
        });

        Ok(())
    }

    /// Cancel a running debate. The run takes the failure edge.
    pub fn abort(&self, debate_id: &DebateId) -> bool {
        match self.active.get(debate_id) {
            Some(entry) => {
                entry.value().cancel();
                true
            }
            None => false,
        }
    }

    pub fn is_running(&self, debate_id: &DebateId) -> bool {
        self.active.contains_key(debate_id)
    }

    /// The phase sequence. Every early return funnels through the
    /// supervisor in `start`, which takes the failure edge.
    async fn drive(&self, debate_id: &DebateId, cancel: CancellationToken) -> Result<(), EngineError> {
        let mut debate = self.debates().get(debate_id)?;

        // Preconditions: both debaters must exist before anything runs.
        let participants = ParticipantRepo::new(self.db.clone()).list(debate_id)?;
        let pro = find_debater(&participants, Role::Pro)?;
        let con = find_debater(&participants, Role::Con)?;

        // setup → researching
        self.advance(&mut debate)?;
        let coordinator = ResearchCoordinator::new(
            Arc::clone(&self.research),
            DocumentRepo::new(self.db.clone(), self.feed.clone()),
        );
        let depth = debate.config.research_depth;
        let (pro_research, con_research) = futures::join!(
            coordinator.research(debate_id, &debate.topic, Role::Pro, depth),
            coordinator.research(debate_id, &debate.topic, Role::Con, depth),
        );

        if cancel.is_cancelled() {
            return Err(EngineError::Aborted);
        }

        // researching → live
        self.advance(&mut debate)?;
        let verifier = Arc::new(ClaimVerifier::new(
            Arc::clone(&self.model),
            VerdictRepo::new(self.db.clone(), self.feed.clone()),
            AlertRepo::new(self.db.clone(), self.feed.clone()),
        ));
        let scheduler = TurnScheduler::new(
            Arc::clone(&self.model),
            self.speech.clone(),
            TurnRepo::new(self.db.clone(), self.feed.clone()),
            MediaRepo::new(self.db.clone()),
            verifier,
            self.config.scheduler.clone(),
        );
        let transcript = scheduler
            .run_live_phase(&debate, &pro, &con, &pro_research, &con_research)
            .await?;

        if cancel.is_cancelled() {
            return Err(EngineError::Aborted);
        }

        // live → voting: wait the window out; submissions land externally.
        self.advance(&mut debate)?;
        tokio::select! {
            _ = tokio::time::sleep(self.config.voting_window) => {}
            _ = cancel.cancelled() => return Err(EngineError::Aborted),
        }

        // voting → summarizing
        self.advance(&mut debate)?;
        let tally = VoteRepo::new(self.db.clone(), self.feed.clone()).tally(debate_id)?;
        let verdicts = VerdictRepo::new(self.db.clone(), self.feed.clone()).list(debate_id)?;
        let new_summary = summary::synthesize(
            self.model.as_ref(),
            &debate,
            &participants,
            &transcript,
            &verdicts,
            tally,
        )
        .await?;
        SummaryRepo::new(self.db.clone(), self.feed.clone()).insert(new_summary)?;

        // summarizing → completed
        self.advance(&mut debate)?;
        info!(debate_id = %debate_id, turns = transcript.len(), "debate completed");
        Ok(())
    }

    fn advance(&self, debate: &mut Debate) -> Result<(), EngineError> {
        let next = transition(debate.status, PhaseEvent::Advance)?;
        self.debates().update_status(&debate.id, next)?;
        debate.status = next;
        Ok(())
    }
}

fn find_debater(participants: &[rostra_core::debate::Participant], role: Role) -> Result<rostra_core::debate::Participant, EngineError> {
    participants
        .iter()
        .find(|p| p.role == role)
        .cloned()
        .ok_or(EngineError::MissingParticipant(role))
}
