use serde::{Deserialize, Serialize};

use crate::ids::{DebateId, ParticipantId};

/// Lifecycle phase of a debate. Phases advance in a fixed order; the only
/// other edge is the failure jump straight to `Completed`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DebateStatus {
    Setup,
    Researching,
    Live,
    Voting,
    Summarizing,
    Completed,
}

impl DebateStatus {
    /// The next phase in the fixed order, or None from the terminal phase.
    pub fn next(&self) -> Option<DebateStatus> {
        match self {
            Self::Setup => Some(Self::Researching),
            Self::Researching => Some(Self::Live),
            Self::Live => Some(Self::Voting),
            Self::Voting => Some(Self::Summarizing),
            Self::Summarizing => Some(Self::Completed),
            Self::Completed => None,
        }
    }

    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Completed)
    }
}

impl std::fmt::Display for DebateStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Setup => write!(f, "setup"),
            Self::Researching => write!(f, "researching"),
            Self::Live => write!(f, "live"),
            Self::Voting => write!(f, "voting"),
            Self::Summarizing => write!(f, "summarizing"),
            Self::Completed => write!(f, "completed"),
        }
    }
}

impl std::str::FromStr for DebateStatus {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "setup" => Ok(Self::Setup),
            "researching" => Ok(Self::Researching),
            "live" => Ok(Self::Live),
            "voting" => Ok(Self::Voting),
            "summarizing" => Ok(Self::Summarizing),
            "completed" => Ok(Self::Completed),
            other => Err(format!("unknown debate status: {other}")),
        }
    }
}

/// How deep the research lookup should go. Maps onto the search
/// collaborator's depth tiers.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResearchDepth {
    Basic,
    Advanced,
}

impl std::fmt::Display for ResearchDepth {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Basic => write!(f, "basic"),
            Self::Advanced => write!(f, "advanced"),
        }
    }
}

impl std::str::FromStr for ResearchDepth {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "basic" => Ok(Self::Basic),
            "advanced" => Ok(Self::Advanced),
            other => Err(format!("unknown research depth: {other}")),
        }
    }
}

/// Per-debate knobs. Immutable once research begins.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct DebateConfig {
    pub max_turns: u32,
    /// Speaking-time budget per turn, in seconds. Used as a length hint
    /// for generation.
    pub turn_seconds: u32,
    pub research_depth: ResearchDepth,
    pub speech_enabled: bool,
    pub fact_checking_enabled: bool,
}

impl Default for DebateConfig {
    fn default() -> Self {
        Self {
            max_turns: 6,
            turn_seconds: 60,
            research_depth: ResearchDepth::Basic,
            speech_enabled: false,
            fact_checking_enabled: true,
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Debate {
    pub id: DebateId,
    pub topic: String,
    pub description: String,
    pub status: DebateStatus,
    pub config: DebateConfig,
    pub created_at: String,
    pub updated_at: String,
}

/// Which seat a participant occupies.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Pro,
    Con,
    FactChecker,
    Moderator,
}

impl Role {
    pub fn is_debater(&self) -> bool {
        matches!(self, Self::Pro | Self::Con)
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pro => write!(f, "pro"),
            Self::Con => write!(f, "con"),
            Self::FactChecker => write!(f, "fact_checker"),
            Self::Moderator => write!(f, "moderator"),
        }
    }
}

impl std::str::FromStr for Role {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pro" => Ok(Self::Pro),
            "con" => Ok(Self::Con),
            "fact_checker" => Ok(Self::FactChecker),
            "moderator" => Ok(Self::Moderator),
            other => Err(format!("unknown role: {other}")),
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Participant {
    pub id: ParticipantId,
    pub debate_id: DebateId,
    pub role: Role,
    pub display_name: String,
    pub persona: String,
    pub voice_id: String,
    pub created_at: String,
}
