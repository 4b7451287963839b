use rostra_core::debate::{DebateStatus, Role};
use rostra_core::errors::GatewayError;
use rostra_store::StoreError;

#[derive(Debug, thiserror::Error)]
pub enum EngineError {
    #[error("gateway error: {0}")]
    Gateway(#[from] GatewayError),

    #[error("store error: {0}")]
    Store(#[from] StoreError),

    #[error("debate not found: {0}")]
    DebateNotFound(String),

    #[error("missing {0} participant")]
    MissingParticipant(Role),

    #[error("debate is in phase {0}, expected setup")]
    InvalidPhase(DebateStatus),

    #[error("debate {0} is already being orchestrated")]
    AlreadyRunning(String),

    #[error("no further phase after {0}")]
    TerminalPhase(DebateStatus),

    #[error("debate aborted")]
    Aborted,

    #[error("{0}")]
    Internal(String),
}
