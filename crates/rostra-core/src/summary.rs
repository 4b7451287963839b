use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::ids::{DebateId, SummaryId};

/// Which side a vote backs.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VoteSide {
    Pro,
    Con,
}

impl std::fmt::Display for VoteSide {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pro => write!(f, "pro"),
            Self::Con => write!(f, "con"),
        }
    }
}

impl std::str::FromStr for VoteSide {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pro" => Ok(Self::Pro),
            "con" => Ok(Self::Con),
            other => Err(format!("unknown vote side: {other}")),
        }
    }
}

/// Aggregate vote counts for a debate.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoteTally {
    pub pro: u32,
    pub con: u32,
}

impl VoteTally {
    pub fn total(&self) -> u32 {
        self.pro + self.con
    }
}

/// A source the summary ranks by how much it could be relied on.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RankedSource {
    pub title: String,
    pub url: String,
    /// Reliability in [0, 1] as judged at synthesis time.
    #[serde(default)]
    pub reliability: f64,
}

/// Post-hoc analytical summary. Created exactly once per debate at the
/// end of the summarizing phase.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Summary {
    pub id: SummaryId,
    pub debate_id: DebateId,
    pub overall: String,
    pub winner_analysis: String,
    /// Per-participant factual-accuracy score, keyed by display name.
    pub accuracy_scores: BTreeMap<String, f64>,
    /// Strongest arguments, best first.
    pub key_arguments: Vec<String>,
    /// Count of claim verdicts per verdict label.
    pub verdict_counts: BTreeMap<String, u32>,
    pub sources_used: Vec<RankedSource>,
    pub recommendations: String,
    /// Vote tally as it stood when the summary was synthesized.
    pub vote_snapshot: VoteTally,
    pub created_at: String,
}
