use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

/// `{ success, data, message?, count?, total? }`
#[derive(Debug, Serialize, Deserialize, JsonSchema)]
pub struct ApiResponse<T> {
    pub success: bool,
    pub data: T,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Items in `data`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub count: Option<u64>,
    /// Matches ignoring pagination
    #[serde(skip_serializing_if = "Option::is_none")]
    pub total: Option<u64>,
}

impl<T> ApiResponse<T> {
    pub fn ok(data: T) -> Self {
        Self {
            success: true,
            data,
            message: None,
            count: None,
            total: None,
        }
    }

    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.message = Some(message.into());
        self
    }

    pub fn with_counts(mut self, count: u64, total: u64) -> Self {
        self.count = Some(count);
        self.total = Some(total);
        self
    }
}
