use regex::Regex;
use serde::de::DeserializeOwned;
use std::sync::OnceLock;

/// Decode model output that was asked to be JSON but may arrive wrapped
/// in prose or a code fence. Three stages: strict parse, fenced-block
/// extraction, outermost-braces extraction. Returns None when nothing
/// parses — the caller supplies its own fixed fallback.
pub fn decode_lenient<T: DeserializeOwned>(raw: &str) -> Option<T> {
    let trimmed = raw.trim();
    if let Ok(value) = serde_json::from_str(trimmed) {
        return Some(value);
    }
    if let Some(fenced) = extract_fenced(trimmed) {
        if let Ok(value) = serde_json::from_str(fenced.trim()) {
            return Some(value);
        }
    }
    if let Some(braced) = extract_braced(trimmed) {
        if let Ok(value) = serde_json::from_str(braced) {
            return Some(value);
        }
    }
    None
}

fn fence_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"(?s)```(?:json)?\s*(.*?)```").expect("fence regex"))
}

fn extract_fenced(text: &str) -> Option<&str> {
    fence_regex()
        .captures(text)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
}

/// The span from the first `{` to the last `}` (inclusive).
fn extract_braced(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let end = text.rfind('}')?;
    if end > start {
        Some(&text[start..=end])
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;

    #[derive(Debug, Deserialize, PartialEq)]
    struct Payload {
        argument: String,
        #[serde(default)]
        claims: Vec<String>,
    }

    #[test]
    fn strict_json_decodes() {
        let parsed: Payload =
            decode_lenient(r#"{"argument": "solar is cheap", "claims": ["costs fell"]}"#).unwrap();
        assert_eq!(parsed.argument, "solar is cheap");
        assert_eq!(parsed.claims.len(), 1);
    }

    #[test]
    fn fenced_json_decodes() {
        let raw = "Here is the answer:\n```json\n{\"argument\": \"fenced\"}\n```\nDone.";
        let parsed: Payload = decode_lenient(raw).unwrap();
        assert_eq!(parsed.argument, "fenced");
    }

    #[test]
    fn bare_fence_decodes() {
        let raw = "```\n{\"argument\": \"bare fence\"}\n```";
        let parsed: Payload = decode_lenient(raw).unwrap();
        assert_eq!(parsed.argument, "bare fence");
    }

    #[test]
    fn embedded_json_decodes() {
        let raw = "I considered the topic carefully. {\"argument\": \"embedded\"} Hope that helps!";
        let parsed: Payload = decode_lenient(raw).unwrap();
        assert_eq!(parsed.argument, "embedded");
    }

    #[test]
    fn garbage_returns_none() {
        assert!(decode_lenient::<Payload>("no json to be found here").is_none());
        assert!(decode_lenient::<Payload>("{broken json").is_none());
        assert!(decode_lenient::<Payload>("").is_none());
    }

    #[test]
    fn wrong_shape_returns_none() {
        // Valid JSON, wrong type for the target.
        assert!(decode_lenient::<Payload>(r#"{"argument": 42}"#).is_none());
    }
}
