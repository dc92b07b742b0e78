//! Message intent as decided by the classifier call.

use serde::{Deserialize, Serialize};

/// Marker the classifier reply is searched for.
const CONTEXT_SPECIFIC: &str = "context-specific";

/// Which branch a chat message takes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Intent {
    /// About the owner: answered from retrieved documents.
    ContextSpecific,
    /// Anything else: answered with a scope reminder.
    Generic,
}

impl Intent {
    /// Read a classifier reply. Case and surrounding whitespace are ignored,
    /// and the marker may appear anywhere in the reply.
    pub fn from_label(reply: &str) -> Self {
        if reply.trim().to_lowercase().contains(CONTEXT_SPECIFIC) {
            Self::ContextSpecific
        } else {
            Self::Generic
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ContextSpecific => CONTEXT_SPECIFIC,
            Self::Generic => "generic",
        }
    }
}

impl std::fmt::Display for Intent {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
