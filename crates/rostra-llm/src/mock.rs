use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use parking_lot::Mutex;

use rostra_core::debate::ResearchDepth;
use rostra_core::errors::GatewayError;
use rostra_core::provider::{CompletionRequest, LanguageModel, ResearchProvider, SpeechSynthesizer};
use rostra_core::research::{ResearchResponse, ResearchSource};

/// Pre-programmed reply for deterministic testing without API calls.
#[derive(Clone, Debug)]
pub enum MockReply {
    Text(String),
    Error(GatewayError),
    /// Wait a duration, then resolve the inner reply.
    Delayed(Duration, Box<MockReply>),
}

impl MockReply {
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text(text.into())
    }

    pub fn delayed(delay: Duration, inner: MockReply) -> Self {
        Self::Delayed(delay, Box::new(inner))
    }
}

/// Mock language model that serves replies in sequence and records every
/// request for assertions.
pub struct MockModel {
    replies: Vec<MockReply>,
    calls: AtomicUsize,
    requests: Mutex<Vec<CompletionRequest>>,
}

impl MockModel {
    pub fn new(replies: Vec<MockReply>) -> Self {
        Self {
            replies,
            calls: AtomicUsize::new(0),
            requests: Mutex::new(Vec::new()),
        }
    }

    /// A model that answers every call with the same text.
    pub fn repeating(text: impl Into<String>) -> Self {
        Self::new(vec![MockReply::text(text)])
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::Relaxed)
    }

    /// Requests seen so far, in call order.
    pub fn requests(&self) -> Vec<CompletionRequest> {
        self.requests.lock().clone()
    }
}

#[async_trait]
impl LanguageModel for MockModel {
    fn name(&self) -> &str {
        "mock"
    }

    fn model(&self) -> &str {
        "mock-model"
    }

    async fn complete(&self, request: &CompletionRequest) -> Result<String, GatewayError> {
        let idx = self.calls.fetch_add(1, Ordering::Relaxed);
        self.requests.lock().push(request.clone());

        // A single-reply mock repeats its reply for every call.
        let reply = if self.replies.len() == 1 {
            &self.replies[0]
        } else {
            self.replies.get(idx).ok_or_else(|| {
                GatewayError::InvalidRequest(format!("MockModel: no reply configured for call {idx}"))
            })?
        };

        let mut current = reply;
        loop {
            match current {
                MockReply::Text(text) => return Ok(text.clone()),
                MockReply::Error(e) => return Err(e.clone()),
                MockReply::Delayed(delay, inner) => {
                    tokio::time::sleep(*delay).await;
                    current = inner;
                }
            }
        }
    }
}

/// Mock research provider: one fixed outcome for every query.
pub struct MockResearch {
    outcome: Result<ResearchResponse, GatewayError>,
    calls: AtomicUsize,
    queries: Mutex<Vec<String>>,
}

impl MockResearch {
    pub fn with_answer(answer: impl Into<String>, sources: Vec<ResearchSource>) -> Self {
        Self {
            outcome: Ok(ResearchResponse {
                answer: answer.into(),
                sources,
            }),
            calls: AtomicUsize::new(0),
            queries: Mutex::new(Vec::new()),
        }
    }

    pub fn failing() -> Self {
        Self {
            outcome: Err(GatewayError::ServerError {
                status: 503,
                body: "search unavailable".into(),
            }),
            calls: AtomicUsize::new(0),
            queries: Mutex::new(Vec::new()),
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::Relaxed)
    }

    pub fn queries(&self) -> Vec<String> {
        self.queries.lock().clone()
    }
}

#[async_trait]
impl ResearchProvider for MockResearch {
    async fn search(&self, query: &str, _depth: ResearchDepth) -> Result<ResearchResponse, GatewayError> {
        self.calls.fetch_add(1, Ordering::Relaxed);
        self.queries.lock().push(query.to_string());
        self.outcome.clone()
    }
}

/// Mock speech synthesizer. Succeeds with recognizable bytes, or fails.
pub struct MockSpeech {
    fail: bool,
    calls: AtomicUsize,
}

impl MockSpeech {
    pub fn new() -> Self {
        Self {
            fail: false,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn failing() -> Self {
        Self {
            fail: true,
            calls: AtomicUsize::new(0),
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::Relaxed)
    }
}

impl Default for MockSpeech {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl SpeechSynthesizer for MockSpeech {
    async fn synthesize(&self, text: &str, _voice_id: &str) -> Result<Bytes, GatewayError> {
        self.calls.fetch_add(1, Ordering::Relaxed);
        if self.fail {
            return Err(GatewayError::ServerError {
                status: 500,
                body: "synthesis failed".into(),
            });
        }
        Ok(Bytes::from(format!("audio[{} chars]", text.len())))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn replies_served_in_sequence() {
        let mock = MockModel::new(vec![MockReply::text("first"), MockReply::text("second")]);
        let req = CompletionRequest::new("s", "u");

        assert_eq!(mock.complete(&req).await.unwrap(), "first");
        assert_eq!(mock.complete(&req).await.unwrap(), "second");
        assert_eq!(mock.call_count(), 2);
    }

    #[tokio::test]
    async fn exhausted_replies_error() {
        let mock = MockModel::new(vec![MockReply::text("only"), MockReply::text("two")]);
        let req = CompletionRequest::new("s", "u");
        let _ = mock.complete(&req).await;
        let _ = mock.complete(&req).await;
        assert!(mock.complete(&req).await.is_err());
    }

    #[tokio::test]
    async fn repeating_mock_never_exhausts() {
        let mock = MockModel::repeating("same");
        let req = CompletionRequest::new("s", "u");
        for _ in 0..5 {
            assert_eq!(mock.complete(&req).await.unwrap(), "same");
        }
    }

    #[tokio::test]
    async fn error_reply_propagates() {
        let mock = MockModel::new(vec![
            MockReply::Error(GatewayError::RateLimited { retry_after: None }),
            MockReply::text("after"),
        ]);
        let req = CompletionRequest::new("s", "u");
        assert!(matches!(
            mock.complete(&req).await,
            Err(GatewayError::RateLimited { .. })
        ));
        assert_eq!(mock.complete(&req).await.unwrap(), "after");
    }

    #[tokio::test(start_paused = true)]
    async fn delayed_reply_waits() {
        let mock = MockModel::new(vec![MockReply::delayed(
            Duration::from_secs(3),
            MockReply::text("late"),
        )]);
        let req = CompletionRequest::new("s", "u");

        let start = tokio::time::Instant::now();
        let result = mock.complete(&req).await.unwrap();
        assert_eq!(result, "late");
        assert!(start.elapsed() >= Duration::from_secs(3));
    }

    #[tokio::test]
    async fn requests_are_recorded() {
        let mock = MockModel::repeating("ok");
        let _ = mock.complete(&CompletionRequest::new("sys", "first prompt")).await;
        let _ = mock.complete(&CompletionRequest::new("sys", "second prompt")).await;

        let requests = mock.requests();
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[0].user, "first prompt");
        assert_eq!(requests[1].user, "second prompt");
    }

    #[tokio::test]
    async fn research_mock_failing() {
        let mock = MockResearch::failing();
        let result = mock.search("anything", ResearchDepth::Basic).await;
        assert!(result.is_err());
        assert_eq!(mock.call_count(), 1);
        assert_eq!(mock.queries(), vec!["anything".to_string()]);
    }

    #[tokio::test]
    async fn speech_mock_roundtrip() {
        let ok = MockSpeech::new();
        let audio = ok.synthesize("hello", "voice-1").await.unwrap();
        assert!(!audio.is_empty());

        let bad = MockSpeech::failing();
        assert!(bad.synthesize("hello", "voice-1").await.is_err());
    }
}
