use rostra_core::debate::DebateStatus;

use crate::error::EngineError;

/// The two things that can happen to a running debate.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PhaseEvent {
    /// Move to the next phase in the fixed order.
    Advance,
    /// Jump to the terminal phase, whatever the current phase is.
    Fail,
}

/// The single place lifecycle transitions are computed. Callers persist
/// the returned status; nothing else writes the debate's phase.
pub fn transition(current: DebateStatus, event: PhaseEvent) -> Result<DebateStatus, EngineError> {
    match event {
        PhaseEvent::Fail => Ok(DebateStatus::Completed),
        PhaseEvent::Advance => current.next().ok_or(EngineError::TerminalPhase(current)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const ALL: [DebateStatus; 6] = [
        DebateStatus::Setup,
        DebateStatus::Researching,
        DebateStatus::Live,
        DebateStatus::Voting,
        DebateStatus::Summarizing,
        DebateStatus::Completed,
    ];

    #[test]
    fn advance_follows_fixed_order() {
        for pair in ALL.windows(2) {
            assert_eq!(transition(pair[0], PhaseEvent::Advance).unwrap(), pair[1]);
        }
    }

    #[test]
    fn advance_from_terminal_is_an_error() {
        assert!(matches!(
            transition(DebateStatus::Completed, PhaseEvent::Advance),
            Err(EngineError::TerminalPhase(DebateStatus::Completed))
        ));
    }

    #[test]
    fn fail_edge_reaches_completed_from_every_phase() {
        for status in ALL {
            assert_eq!(transition(status, PhaseEvent::Fail).unwrap(), DebateStatus::Completed);
        }
    }

    #[test]
    fn no_phase_is_skippable() {
        // Walking Advance from setup must visit every phase exactly once.
        let mut status = DebateStatus::Setup;
        let mut visited = vec![status];
        while let Ok(next) = transition(status, PhaseEvent::Advance) {
            visited.push(next);
            status = next;
        }
        assert_eq!(visited, ALL.to_vec());
    }
}
