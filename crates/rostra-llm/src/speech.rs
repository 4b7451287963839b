use std::time::Duration;

use async_trait::async_trait;
use bytes::{Bytes, BytesMut};
use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde_json::json;
use tracing::instrument;

use rostra_core::errors::GatewayError;
use rostra_core::provider::SpeechSynthesizer;

const DEFAULT_API_URL: &str = "https://api.elevenlabs.io";
const DEFAULT_MODEL: &str = "eleven_multilingual_v2";
const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

/// Service limit on characters per synthesis request. Longer arguments
/// are chunked and the audio parts concatenated in order.
pub const MAX_CHUNK_CHARS: usize = 4500;

#[derive(Clone)]
pub struct ElevenLabsConfig {
    pub api_key: SecretString,
    pub model: String,
    pub base_url: String,
}

impl ElevenLabsConfig {
    pub fn new(api_key: SecretString) -> Self {
        Self {
            api_key,
            model: DEFAULT_MODEL.to_string(),
            base_url: DEFAULT_API_URL.to_string(),
        }
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into();
        self
    }
}

pub struct ElevenLabsClient {
    client: Client,
    config: ElevenLabsConfig,
}

impl ElevenLabsClient {
    pub fn new(config: ElevenLabsConfig) -> Self {
        Self {
            client: Client::builder()
                .timeout(REQUEST_TIMEOUT)
                .build()
                .expect("failed to build HTTP client"),
            config,
        }
    }

    async fn synthesize_chunk(&self, text: &str, voice_id: &str) -> Result<Bytes, GatewayError> {
        let body = json!({
            "text": text,
            "model_id": self.config.model,
        });

        let response = self
            .client
            .post(format!("{}/v1/text-to-speech/{voice_id}", self.config.base_url))
            .header("xi-api-key", self.config.api_key.expose_secret())
            .header("accept", "audio/mpeg")
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    GatewayError::Timeout(REQUEST_TIMEOUT)
                } else {
                    GatewayError::NetworkError(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(GatewayError::from_status(status.as_u16(), body));
        }

        response
            .bytes()
            .await
            .map_err(|e| GatewayError::NetworkError(e.to_string()))
    }
}

#[async_trait]
impl SpeechSynthesizer for ElevenLabsClient {
    #[instrument(skip(self, text), fields(voice_id, chars = text.len()))]
    async fn synthesize(&self, text: &str, voice_id: &str) -> Result<Bytes, GatewayError> {
        let mut audio = BytesMut::new();
        for chunk in chunk_text(text, MAX_CHUNK_CHARS) {
            let part = self.synthesize_chunk(&chunk, voice_id).await?;
            audio.extend_from_slice(&part);
        }
        Ok(audio.freeze())
    }
}

/// Split text into chunks of at most `limit` characters, preferring
/// sentence boundaries. Falls back to a hard split for a single run of
/// text longer than the limit.
pub fn chunk_text(text: &str, limit: usize) -> Vec<String> {
    let text = text.trim();
    if text.is_empty() {
        return Vec::new();
    }
    if text.len() <= limit {
        return vec![text.to_string()];
    }

    let mut chunks = Vec::new();
    let mut current = String::new();
    for sentence in split_sentences(text) {
        if !current.is_empty() && current.len() + sentence.len() > limit {
            chunks.push(std::mem::take(&mut current));
        }
        if sentence.len() > limit {
            // A single oversized sentence: hard-split on char boundaries.
            let mut rest = sentence;
            while rest.len() > limit {
                let mut cut = limit;
                while !rest.is_char_boundary(cut) {
                    cut -= 1;
                }
                let (head, tail) = rest.split_at(cut);
                chunks.push(head.to_string());
                rest = tail;
            }
            current.push_str(rest);
        } else {
            current.push_str(sentence);
        }
    }
    if !current.is_empty() {
        chunks.push(current);
    }
    chunks
}

/// Split on sentence-final punctuation, keeping the punctuation and any
/// trailing whitespace with the sentence.
fn split_sentences(text: &str) -> Vec<&str> {
    let mut sentences = Vec::new();
    let mut start = 0;
    let mut chars = text.char_indices().peekable();
    while let Some((i, c)) = chars.next() {
        if matches!(c, '.' | '!' | '?') {
            let mut end = i + c.len_utf8();
            while let Some(&(j, next)) = chars.peek() {
                if next.is_whitespace() {
                    end = j + next.len_utf8();
                    chars.next();
                } else {
                    break;
                }
            }
            sentences.push(&text[start..end]);
            start = end;
        }
    }
    if start < text.len() {
        sentences.push(&text[start..]);
    }
    sentences
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_text_is_one_chunk() {
        let chunks = chunk_text("One sentence. Two sentences.", 100);
        assert_eq!(chunks, vec!["One sentence. Two sentences."]);
    }

    #[test]
    fn empty_text_has_no_chunks() {
        assert!(chunk_text("", 100).is_empty());
        assert!(chunk_text("   ", 100).is_empty());
    }

    #[test]
    fn long_text_splits_on_sentence_boundaries() {
        let text = "Alpha alpha alpha. Beta beta beta. Gamma gamma gamma.";
        let chunks = chunk_text(text, 25);
        assert_eq!(chunks.len(), 3);
        assert!(chunks[0].starts_with("Alpha"));
        assert!(chunks[1].starts_with("Beta"));
        assert!(chunks[2].starts_with("Gamma"));
        // Concatenation must reproduce the input in order.
        assert_eq!(chunks.concat(), text);
    }

    #[test]
    fn oversized_sentence_is_hard_split() {
        let text = "a".repeat(120);
        let chunks = chunk_text(&text, 50);
        assert!(chunks.len() >= 3);
        assert!(chunks.iter().all(|c| c.len() <= 50));
        assert_eq!(chunks.concat(), text);
    }

    #[test]
    fn sentence_split_keeps_punctuation() {
        let sentences = split_sentences("First. Second! Third?");
        assert_eq!(sentences.len(), 3);
        assert_eq!(sentences[0], "First. ");
        assert_eq!(sentences[2], "Third?");
    }
}
