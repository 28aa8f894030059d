use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCode {
    SlotOutOfRange,
    Bridge,
    Config,
}

#[derive(Debug, Error)]
pub enum WidgetError {
    #[error("slot index {index} is out of range for {len} slots")]
    SlotOutOfRange { index: usize, len: usize },
    #[error("host bridge unavailable: {0}")]
    Bridge(String),
    #[error("invalid configuration: {0}")]
    Config(String),
}

impl WidgetError {
    pub fn code(&self) -> ErrorCode {
        match self {
            Self::SlotOutOfRange { .. } => ErrorCode::SlotOutOfRange,
            Self::Bridge(_) => ErrorCode::Bridge,
            Self::Config(_) => ErrorCode::Config,
        }
    }
}
