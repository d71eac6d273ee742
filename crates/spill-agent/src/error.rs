use crate::session::AgentState;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum AgentError {
    #[error("Invalid pipeline configuration: {0}")]
    Config(String),

    #[error("Invalid state transition from {from} to {to}")]
    InvalidTransition { from: AgentState, to: AgentState },

    #[error("Unknown tool: {0}")]
    UnknownTool(String),

    #[error("Invalid arguments for tool '{tool}': {message}")]
    InvalidToolArguments { tool: String, message: String },

    #[error("Platform error: {0}")]
    Platform(String),

    #[error("Protocol error: {0}")]
    Protocol(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
