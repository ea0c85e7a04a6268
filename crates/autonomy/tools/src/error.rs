use thiserror::Error;

#[derive(Error, Debug)]
pub enum ToolError {
    #[error("invalid tool contract '{name}': {reason}")]
    InvalidContract { name: String, reason: String },

    #[error("unknown tool: {0}")]
    UnknownTool(String),
}
