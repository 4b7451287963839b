use std::sync::Arc;

use tracing::{instrument, warn};

use rostra_core::debate::{ResearchDepth, Role};
use rostra_core::ids::DebateId;
use rostra_core::provider::ResearchProvider;
use rostra_core::research::ResearchBundle;
use rostra_store::documents::DocumentRepo;

use crate::prompts::side_phrase;

/// Runs the research lookup for one side of a debate. Research is
/// best-effort: a failed lookup degrades to an empty bundle and the
/// debate goes on without grounding material.
pub struct ResearchCoordinator {
    provider: Arc<dyn ResearchProvider>,
    documents: DocumentRepo,
}

impl ResearchCoordinator {
    pub fn new(provider: Arc<dyn ResearchProvider>, documents: DocumentRepo) -> Self {
        Self { provider, documents }
    }

    #[instrument(skip(self, topic), fields(debate_id = %debate_id, side = %side, depth = %depth))]
    pub async fn research(
        &self,
        debate_id: &DebateId,
        topic: &str,
        side: Role,
        depth: ResearchDepth,
    ) -> ResearchBundle {
        let query = format!("strongest arguments {} the motion: {topic}", side_phrase(side));

        let response = match self.provider.search(&query, depth).await {
            Ok(response) => response,
            Err(error) => {
                warn!(error = %error, "research lookup failed; continuing with empty bundle");
                return ResearchBundle::empty();
            }
        };

        let bundle = ResearchBundle::from_response(response);

        // Side channel: keep discovered sources as retrievable documents.
        // Never escalates — a full bundle is still returned.
        for source in &bundle.sources {
            if let Err(error) = self
                .documents
                .upsert(debate_id, &source.title, &source.url, &source.snippet)
            {
                warn!(error = %error, url = %source.url, "failed to persist research document");
            }
        }

        bundle
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rostra_core::debate::DebateConfig;
    use rostra_core::research::ResearchSource;
    use rostra_llm::mock::MockResearch;
    use rostra_store::changes::ChangeFeed;
    use rostra_store::debates::DebateRepo;
    use rostra_store::Database;

    fn setup() -> (Database, ChangeFeed, DebateId) {
        let db = Database::in_memory().unwrap();
        let feed = ChangeFeed::new(64);
        let debate = DebateRepo::new(db.clone(), feed.clone())
            .create("Remote work beats office work", "", &DebateConfig::default())
            .unwrap();
        (db, feed, debate.id)
    }

    fn sources() -> Vec<ResearchSource> {
        vec![
            ResearchSource {
                title: "Stanford study".into(),
                url: "https://stanford.example/study".into(),
                snippet: "13% productivity gain".into(),
            },
            ResearchSource {
                title: "Meta-analysis".into(),
                url: "https://meta.example".into(),
                snippet: "mixed results across sectors".into(),
            },
        ]
    }

    #[tokio::test]
    async fn failed_lookup_degrades_to_empty_bundle() {
        let (db, feed, debate_id) = setup();
        let coordinator = ResearchCoordinator::new(
            Arc::new(MockResearch::failing()),
            DocumentRepo::new(db, feed),
        );

        let bundle = coordinator
            .research(&debate_id, "topic", Role::Pro, ResearchDepth::Basic)
            .await;
        assert!(bundle.is_empty());
    }

    #[tokio::test]
    async fn query_is_biased_per_side() {
        let (db, feed, debate_id) = setup();
        let provider = Arc::new(MockResearch::with_answer("answer", vec![]));
        let coordinator =
            ResearchCoordinator::new(Arc::clone(&provider) as Arc<dyn ResearchProvider>, DocumentRepo::new(db, feed));

        coordinator
            .research(&debate_id, "the motion", Role::Pro, ResearchDepth::Basic)
            .await;
        coordinator
            .research(&debate_id, "the motion", Role::Con, ResearchDepth::Basic)
            .await;

        let queries = provider.queries();
        assert!(queries[0].contains("in favor of"));
        assert!(queries[1].contains("against"));
        assert!(queries.iter().all(|q| q.contains("the motion")));
    }

    #[tokio::test]
    async fn sources_persist_as_documents() {
        let (db, feed, debate_id) = setup();
        let documents = DocumentRepo::new(db.clone(), feed.clone());
        let coordinator = ResearchCoordinator::new(
            Arc::new(MockResearch::with_answer("the answer", sources())),
            DocumentRepo::new(db, feed),
        );

        let bundle = coordinator
            .research(&debate_id, "topic", Role::Pro, ResearchDepth::Advanced)
            .await;

        assert_eq!(bundle.sources.len(), 2);
        assert!(bundle.context.contains("Stanford study"));

        let stored = documents.list(&debate_id).unwrap();
        assert_eq!(stored.len(), 2);
        assert_eq!(stored[0].url, "https://stanford.example/study");
    }

    #[tokio::test]
    async fn document_persistence_failure_is_swallowed() {
        let (db, feed, debate_id) = setup();
        // Break the documents table so every upsert fails.
        db.with_conn(|conn| {
            conn.execute_batch("DROP TABLE documents;")
                .map_err(|e| rostra_store::StoreError::Database(e.to_string()))
        })
        .unwrap();

        let coordinator = ResearchCoordinator::new(
            Arc::new(MockResearch::with_answer("the answer", sources())),
            DocumentRepo::new(db, feed),
        );

        let bundle = coordinator
            .research(&debate_id, "topic", Role::Pro, ResearchDepth::Basic)
            .await;
        // The bundle is intact even though no document could be stored.
        assert_eq!(bundle.sources.len(), 2);
        assert!(!bundle.is_empty());
    }
}
