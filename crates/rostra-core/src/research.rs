use serde::{Deserialize, Serialize};

/// One hit returned by the research lookup.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct ResearchSource {
    pub title: String,
    pub url: String,
    pub snippet: String,
}

/// Raw result of a single research lookup.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ResearchResponse {
    pub answer: String,
    pub sources: Vec<ResearchSource>,
}

/// Merged research material for one side of a debate. `context` is the
/// grounding text handed verbatim to generation and verification; it is
/// a deterministic function of the answer and the source order.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct ResearchBundle {
    pub answer: String,
    pub sources: Vec<ResearchSource>,
    pub context: String,
}

impl ResearchBundle {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn from_response(response: ResearchResponse) -> Self {
        let context = combined_context(&response.answer, &response.sources);
        Self {
            answer: response.answer,
            sources: response.sources,
            context,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.answer.is_empty() && self.sources.is_empty()
    }
}

fn combined_context(answer: &str, sources: &[ResearchSource]) -> String {
    let mut out = String::new();
    if !answer.is_empty() {
        out.push_str(answer);
    }
    if !sources.is_empty() {
        if !out.is_empty() {
            out.push_str("\n\n");
        }
        out.push_str("Sources:\n");
        for source in sources {
            out.push_str(&format!("- {} ({}): {}\n", source.title, source.url, source.snippet));
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn source(title: &str) -> ResearchSource {
        ResearchSource {
            title: title.into(),
            url: format!("https://example.org/{title}"),
            snippet: format!("snippet for {title}"),
        }
    }

    #[test]
    fn empty_bundle_has_no_context() {
        let bundle = ResearchBundle::empty();
        assert!(bundle.is_empty());
        assert!(bundle.context.is_empty());
    }

    #[test]
    fn context_is_deterministic_and_ordered() {
        let response = ResearchResponse {
            answer: "Short answer.".into(),
            sources: vec![source("alpha"), source("beta")],
        };
        let a = ResearchBundle::from_response(response.clone());
        let b = ResearchBundle::from_response(response);
        assert_eq!(a.context, b.context);

        let alpha = a.context.find("alpha").unwrap();
        let beta = a.context.find("beta").unwrap();
        assert!(alpha < beta, "source order must be preserved");
        assert!(a.context.starts_with("Short answer."));
        assert!(a.context.contains("Sources:"));
    }

    #[test]
    fn answer_only_response_skips_source_list() {
        let bundle = ResearchBundle::from_response(ResearchResponse {
            answer: "Just the answer.".into(),
            sources: vec![],
        });
        assert_eq!(bundle.context, "Just the answer.");
        assert!(!bundle.is_empty());
    }
}
