use serde::{Deserialize, Serialize};

use crate::ids::{AlertId, DebateId, ParticipantId, TurnId, VerdictId};

/// Confidence at or above this, on a false-leaning verdict, makes the
/// claim a lie.
pub const LIE_CONFIDENCE_THRESHOLD: f64 = 0.8;
/// Confidence at or above this escalates a lie alert to critical.
pub const CRITICAL_CONFIDENCE_THRESHOLD: f64 = 0.9;

/// Truth classification of a single claim.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    True,
    MostlyTrue,
    Mixed,
    MostlyFalse,
    False,
    Unverifiable,
}

impl Verdict {
    pub fn is_false_leaning(&self) -> bool {
        matches!(self, Self::False | Self::MostlyFalse)
    }

    /// Normalize a model-produced verdict string. Accepts space, dash, and
    /// underscore separators; anything unrecognized is unverifiable.
    pub fn normalize(raw: &str) -> Verdict {
        let canonical = raw.trim().to_lowercase().replace([' ', '-'], "_");
        canonical.parse().unwrap_or(Verdict::Unverifiable)
    }
}

impl std::fmt::Display for Verdict {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::True => write!(f, "true"),
            Self::MostlyTrue => write!(f, "mostly_true"),
            Self::Mixed => write!(f, "mixed"),
            Self::MostlyFalse => write!(f, "mostly_false"),
            Self::False => write!(f, "false"),
            Self::Unverifiable => write!(f, "unverifiable"),
        }
    }
}

impl std::str::FromStr for Verdict {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "true" => Ok(Self::True),
            "mostly_true" => Ok(Self::MostlyTrue),
            "mixed" => Ok(Self::Mixed),
            "mostly_false" => Ok(Self::MostlyFalse),
            "false" => Ok(Self::False),
            "unverifiable" => Ok(Self::Unverifiable),
            other => Err(format!("unknown verdict: {other}")),
        }
    }
}

/// A claim is a lie when the checker is confident it is false-leaning.
pub fn is_lie(verdict: Verdict, confidence: f64) -> bool {
    confidence >= LIE_CONFIDENCE_THRESHOLD && verdict.is_false_leaning()
}

/// The verification outcome for one claim of one turn. Created once,
/// never mutated.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ClaimVerdict {
    pub id: VerdictId,
    pub debate_id: DebateId,
    pub turn_id: TurnId,
    pub participant_id: ParticipantId,
    pub claim: String,
    pub verdict: Verdict,
    pub explanation: String,
    /// Clamped to [0, 1].
    pub confidence: f64,
    pub is_lie: bool,
    pub sources: Vec<String>,
    pub created_at: String,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AlertSeverity {
    Warning,
    Critical,
}

impl AlertSeverity {
    pub fn from_confidence(confidence: f64) -> Self {
        if confidence >= CRITICAL_CONFIDENCE_THRESHOLD {
            Self::Critical
        } else {
            Self::Warning
        }
    }
}

impl std::fmt::Display for AlertSeverity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Warning => write!(f, "warning"),
            Self::Critical => write!(f, "critical"),
        }
    }
}

impl std::str::FromStr for AlertSeverity {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "warning" => Ok(Self::Warning),
            "critical" => Ok(Self::Critical),
            other => Err(format!("unknown alert severity: {other}")),
        }
    }
}

/// Raised once per lie verdict.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Alert {
    pub id: AlertId,
    pub debate_id: DebateId,
    pub verdict_id: VerdictId,
    pub participant_name: String,
    pub claim: String,
    pub explanation: String,
    pub severity: AlertSeverity,
    pub created_at: String,
}
