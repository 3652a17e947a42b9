// crates/tally-daemon/src/state.rs
//
// Node lifecycle state machine for the Tally ledger daemon.
//
// Valid transitions:
//   Initializing -> Loading -> Producing
//   Any state -> ShuttingDown

use std::fmt;

/// Lifecycle states of the daemon node.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum NodeState {
    /// Node is starting up and loading configuration.
    Initializing,
    /// Node is restoring the ledger from a checkpoint or from genesis.
    Loading,
    /// Node is producing and applying blocks.
    Producing,
    /// Node is writing its final checkpoint and exiting.
    ShuttingDown,
}

impl fmt::Display for NodeState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            NodeState::Initializing => write!(f, "Initializing"),
            NodeState::Loading => write!(f, "Loading"),
            NodeState::Producing => write!(f, "Producing"),
            NodeState::ShuttingDown => write!(f, "ShuttingDown"),
        }
    }
}

/// State machine for managing node lifecycle transitions.
pub struct NodeStateMachine {
    pub current: NodeState,
}

impl NodeStateMachine {
    /// Create a new state machine starting in the Initializing state.
    pub fn new() -> Self {
        Self {
            current: NodeState::Initializing,
        }
    }

    /// Attempt to transition to a new state.
    ///
    /// Returns an error if the transition is not valid.
    pub fn transition(&mut self, new_state: NodeState) -> Result<(), String> {
        let valid = matches!(
            (&self.current, &new_state),
            (_, NodeState::ShuttingDown)
                | (NodeState::Initializing, NodeState::Loading)
                | (NodeState::Loading, NodeState::Producing)
        );

        if valid {
            tracing::info!("State transition: {} -> {}", self.current, new_state);
            self.current = new_state;
            Ok(())
        } else {
            Err(format!(
                "Invalid state transition: {} -> {}",
                self.current, new_state
            ))
        }
    }
}

impl Default for NodeStateMachine {
    fn default() -> Self {
        Self::new()
    }
}
