use serde::{Deserialize, Serialize};

/// Body of every non-token response.
#[derive(Debug, Serialize, Deserialize)]
pub struct CommonResponse {
    pub code: u16,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}
