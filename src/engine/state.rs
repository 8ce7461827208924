use serde::{Deserialize, Serialize};

/// Why a loop stopped without a fault
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum StopReason {
    /// The source closed the stream cleanly
    EndOfStream,
    /// Someone asked the loop to stop
    Shutdown,
}

/// Ingest loop lifecycle
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum IngestState {
    Starting,
    Running { endpoint: String },
    Terminated { reason: StopReason },
    Faulted { error_msg: String },
}

impl IngestState {
    /// Check if transition from current state to target state is valid
    pub fn can_transition_to(&self, target: &IngestState) -> bool {
        use IngestState::*;

        matches!(
            (self, target),
            (Starting, Running { .. })
                | (Starting, Faulted { .. })
                | (Starting, Terminated { reason: StopReason::Shutdown })
                | (Running { .. }, Terminated { .. })
                | (Running { .. }, Faulted { .. })
        )
    }

    pub fn name(&self) -> &str {
        match self {
            Self::Starting => "Starting",
            Self::Running { .. } => "Running",
            Self::Terminated { .. } => "Terminated",
            Self::Faulted { .. } => "Faulted",
        }
    }

    pub fn is_final(&self) -> bool {
        matches!(self, Self::Terminated { .. } | Self::Faulted { .. })
    }

    pub fn is_faulted(&self) -> bool {
        matches!(self, Self::Faulted { .. })
    }
}

impl Default for IngestState {
    fn default() -> Self {
        Self::Starting
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn running() -> IngestState {
        IngestState::Running {
            endpoint: "mock://test".to_string(),
        }
    }

    fn faulted() -> IngestState {
        IngestState::Faulted {
            error_msg: "boom".to_string(),
        }
    }

    #[test]
    fn test_valid_transitions() {
        assert!(IngestState::Starting.can_transition_to(&running()));
        assert!(IngestState::Starting.can_transition_to(&faulted()));
        assert!(running().can_transition_to(&IngestState::Terminated {
            reason: StopReason::EndOfStream
        }));
        assert!(running().can_transition_to(&faulted()));
    }

    #[test]
    fn test_final_states_are_terminal() {
        let terminated = IngestState::Terminated {
            reason: StopReason::Shutdown,
        };
        for target in [IngestState::Starting, running(), faulted()] {
            assert!(!faulted().can_transition_to(&target));
            assert!(!terminated.can_transition_to(&target));
        }
        assert!(faulted().is_final());
        assert!(terminated.is_final());
        assert!(!running().is_final());
    }

    #[test]
    fn test_cannot_end_of_stream_before_running() {
        assert!(!IngestState::Starting.can_transition_to(&IngestState::Terminated {
            reason: StopReason::EndOfStream
        }));
        assert!(!running().can_transition_to(&IngestState::Starting));
    }
}
