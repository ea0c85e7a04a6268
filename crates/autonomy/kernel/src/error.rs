use thiserror::Error;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum KernelError {
    #[error("unknown kernel trigger: {0}")]
    UnknownTrigger(String),

    #[error("unknown kernel state: {0}")]
    UnknownState(String),
}
