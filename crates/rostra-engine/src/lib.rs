pub mod error;
pub mod orchestrator;
pub mod phase;
pub mod prompts;
pub mod research;
pub mod summary;
pub mod turns;
pub mod verify;

pub use error::EngineError;
pub use orchestrator::{DebateOrchestrator, OrchestratorConfig};
pub use research::ResearchCoordinator;
pub use turns::{display_duration, turn_type, SchedulerConfig, TurnScheduler};
pub use verify::ClaimVerifier;
