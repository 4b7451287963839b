use async_trait::async_trait;
use bytes::Bytes;

use crate::debate::ResearchDepth;
use crate::errors::GatewayError;
use crate::research::ResearchResponse;

/// A single completion request to the text-generation capability. The
/// caller owns prompt construction; the response is raw model text that
/// the caller decodes (leniently) into whatever shape it asked for.
#[derive(Clone, Debug)]
pub struct CompletionRequest {
    pub system: String,
    pub user: String,
    pub max_tokens: u32,
}

impl CompletionRequest {
    pub fn new(system: impl Into<String>, user: impl Into<String>) -> Self {
        Self {
            system: system.into(),
            user: user.into(),
            max_tokens: 2048,
        }
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }
}

/// Text-generation capability. Backs argument generation, claim
/// verification, and summary synthesis.
#[async_trait]
pub trait LanguageModel: Send + Sync {
    fn name(&self) -> &str;
    fn model(&self) -> &str;

    async fn complete(&self, request: &CompletionRequest) -> Result<String, GatewayError>;
}

/// Web research lookup capability.
#[async_trait]
pub trait ResearchProvider: Send + Sync {
    async fn search(&self, query: &str, depth: ResearchDepth) -> Result<ResearchResponse, GatewayError>;
}

/// Speech synthesis capability. Implementations handle any service
/// length limit internally (chunk, then concatenate in order).
#[async_trait]
pub trait SpeechSynthesizer: Send + Sync {
    async fn synthesize(&self, text: &str, voice_id: &str) -> Result<Bytes, GatewayError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn completion_request_builder() {
        let req = CompletionRequest::new("system framing", "user context").with_max_tokens(512);
        assert_eq!(req.system, "system framing");
        assert_eq!(req.user, "user context");
        assert_eq!(req.max_tokens, 512);
    }

    #[test]
    fn completion_request_default_budget() {
        let req = CompletionRequest::new("s", "u");
        assert_eq!(req.max_tokens, 2048);
    }
}
