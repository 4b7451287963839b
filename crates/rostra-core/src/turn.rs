use serde::{Deserialize, Serialize};

use crate::ids::{DebateId, ParticipantId, TurnId};

/// Position-derived kind of a turn.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TurnType {
    Opening,
    Rebuttal,
    Closing,
}

impl std::fmt::Display for TurnType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Opening => write!(f, "opening"),
            Self::Rebuttal => write!(f, "rebuttal"),
            Self::Closing => write!(f, "closing"),
        }
    }
}

impl std::str::FromStr for TurnType {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "opening" => Ok(Self::Opening),
            "rebuttal" => Ok(Self::Rebuttal),
            "closing" => Ok(Self::Closing),
            other => Err(format!("unknown turn type: {other}")),
        }
    }
}

/// A reference the speaker cited for an argument.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Citation {
    pub label: String,
    #[serde(default)]
    pub url: Option<String>,
}

/// A fragment of research material attributed to a turn.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SourceSnippet {
    pub title: String,
    pub url: String,
    pub snippet: String,
}

/// One participant's contribution at a fixed position in the debate.
/// Immutable once persisted; exactly one exists per (debate, turn_no).
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Turn {
    pub id: TurnId,
    pub debate_id: DebateId,
    pub participant_id: ParticipantId,
    /// 1-based, strictly increasing, no gaps.
    pub turn_no: u32,
    pub turn_type: TurnType,
    pub argument: String,
    pub citations: Vec<Citation>,
    pub sources: Vec<SourceSnippet>,
    pub audio_url: Option<String>,
    pub created_at: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn turn_type_roundtrip() {
        for tt in [TurnType::Opening, TurnType::Rebuttal, TurnType::Closing] {
            let parsed: TurnType = tt.to_string().parse().unwrap();
            assert_eq!(parsed, tt);
        }
        assert!("monologue".parse::<TurnType>().is_err());
    }

    #[test]
    fn citation_url_is_optional() {
        let c: Citation = serde_json::from_str(r#"{"label": "IPCC AR6"}"#).unwrap();
        assert_eq!(c.label, "IPCC AR6");
        assert!(c.url.is_none());
    }

    #[test]
    fn turn_serde_roundtrip() {
        let turn = Turn {
            id: TurnId::new(),
            debate_id: DebateId::new(),
            participant_id: ParticipantId::new(),
            turn_no: 3,
            turn_type: TurnType::Rebuttal,
            argument: "The data says otherwise.".into(),
            citations: vec![Citation { label: "WHO 2024".into(), url: Some("https://who.int".into()) }],
            sources: vec![],
            audio_url: None,
            created_at: "2026-08-01T00:00:00Z".into(),
        };
        let json = serde_json::to_string(&turn).unwrap();
        let parsed: Turn = serde_json::from_str(&json).unwrap();
        assert_eq!(parsed.turn_no, 3);
        assert_eq!(parsed.turn_type, TurnType::Rebuttal);
        assert_eq!(parsed.citations.len(), 1);
    }
}
