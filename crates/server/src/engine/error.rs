//! Engine process error types

use std::time::Duration;

use thiserror::Error;

use super::gtp::SessionState;

#[derive(Error, Debug)]
pub enum EngineError {
    #[error("Failed to start engine {program:?}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Engine did not answer within {0:?}")]
    Timeout(Duration),

    #[error("Engine crashed: {0}")]
    Crashed(String),

    #[error("Engine rejected {command:?}: {message}")]
    Rejected { command: String, message: String },

    #[error("Engine session is {state:?}, cannot {operation}")]
    State {
        state: SessionState,
        operation: &'static str,
    },
}
