use serde::{Deserialize, Serialize};
use types::InvalidRequest;

/// Simple message envelope returned by the mutation endpoints.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ApiMessage {
    pub message: String,
}

impl ApiMessage {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            message: message.into(),
        }
    }
}

/// Raw query parameters of the book stream subscription. Extraction never
/// rejects: the upgrade happens unconditionally and bad parameters are
/// reported as an error frame over the socket.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BookStreamQuery {
    pub size: Option<String>,
    pub offset: Option<String>,
}

impl BookStreamQuery {
    /// Parse `size` and `offset` as level counts. Both are required numbers.
    pub fn levels(&self) -> Result<(usize, usize), InvalidRequest> {
        let size = self
            .size
            .as_deref()
            .ok_or_else(|| InvalidRequest::Malformed("size is required".to_string()))?
            .parse()
            .map_err(|_| InvalidRequest::Malformed("size should be a number".to_string()))?;
        let offset = self
            .offset
            .as_deref()
            .ok_or_else(|| InvalidRequest::Malformed("offset is required".to_string()))?
            .parse()
            .map_err(|_| InvalidRequest::Malformed("offset should be a number".to_string()))?;
        Ok((size, offset))
    }
}

fn default_page_size() -> u32 {
    50
}

/// Query parameters of the order listing endpoint.
#[derive(Debug, Clone, Copy, Deserialize)]
pub struct ListOrdersParams {
    pub account_id: i32,
    #[serde(default)]
    pub page: u32,
    #[serde(default = "default_page_size")]
    pub size: u32,
}
