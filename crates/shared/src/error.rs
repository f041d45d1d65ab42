use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Optional JSON body a backend may attach to a failed response.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ApiError {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

impl ApiError {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            error: None,
            message: Some(message.into()),
        }
    }

    pub fn detail(&self) -> Option<&str> {
        self.error
            .as_deref()
            .or(self.message.as_deref())
            .map(str::trim)
            .filter(|text| !text.is_empty())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SchemaError {
    #[error("unknown form field '{0}'")]
    UnknownField(String),
    #[error("unknown attachment slot '{0}'")]
    UnknownSlot(String),
}
