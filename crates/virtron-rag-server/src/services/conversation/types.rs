use serde::{Deserialize, Serialize};

use crate::config::MemoryConfig;
use crate::utils::size_estimator;

/// Who produced a message
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Query,
    Response,
}

impl Role {
    pub fn as_str(&self) -> &str {
        match self {
            Self::Query => "query",
            Self::Response => "response",
        }
    }
}

/// One dialogue turn held by the conversation store.
///
/// Fields are private: a message is never mutated after the store creates it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    role: Role,
    text: String,
    /// Creation time, Unix milliseconds
    timestamp: i64,
}

impl Message {
    pub fn new(role: Role, text: impl Into<String>) -> Self {
        Self {
            role,
            text: text.into(),
            timestamp: chrono::Utc::now().timestamp_millis(),
        }
    }

    pub fn query(text: impl Into<String>) -> Self {
        Self::new(Role::Query, text)
    }

    pub fn response(text: impl Into<String>) -> Self {
        Self::new(Role::Response, text)
    }

    pub fn role(&self) -> Role {
        self.role
    }

    pub fn text(&self) -> &str {
        &self.text
    }

    /// Estimated byte cost used for capacity accounting
    pub fn estimated_bytes(&self) -> usize {
        size_estimator::estimate_bytes(self)
    }
}

/// Capacity configuration fixed at store construction
#[derive(Debug, Clone, Copy)]
pub struct StoreLimits {
    pub max_size_bytes: usize,
    pub max_message_count: usize,
    pub strict_count_limit: bool,
}

impl StoreLimits {
    pub fn new(max_size_bytes: usize, max_message_count: usize) -> Self {
        Self {
            max_size_bytes: max_size_bytes.max(1),
            max_message_count: max_message_count.max(1),
            strict_count_limit: false,
        }
    }

    pub fn strict(mut self, strict: bool) -> Self {
        self.strict_count_limit = strict;
        self
    }
}

impl From<&MemoryConfig> for StoreLimits {
    fn from(config: &MemoryConfig) -> Self {
        Self::new(config.max_size_bytes, config.max_message_count)
            .strict(config.strict_count_limit)
    }
}

impl Default for StoreLimits {
    fn default() -> Self {
        Self::from(&MemoryConfig::default())
    }
}

/// Store statistics for monitoring
#[derive(Debug, Clone, Serialize)]
pub struct MemoryStats {
    pub message_count: usize,
    pub total_bytes: usize,
    pub max_message_count: usize,
    pub max_size_bytes: usize,
    pub strategy: &'static str,
}
