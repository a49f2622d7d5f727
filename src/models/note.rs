use std::fmt;

use chrono::Utc;
use serde::{Deserialize, Serialize};

/// A note attached to a web page.
///
/// Identity is the `(scope, key)` pair. The key is derived from a URL by
/// [`crate::keys::derive_key`]; `url_sample` only records one literal URL that
/// produced it, for display.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Note {
    pub key: String,
    #[serde(default)]
    pub url_sample: String,
    pub scope: Scope,
    /// Last known page title.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    pub content: String,
    /// Epoch milliseconds of the last successful write.
    pub updated_at: i64,
}

impl Note {
    /// Whether the content is empty once surrounding whitespace is removed.
    pub fn is_blank(&self) -> bool {
        is_blank(&self.content)
    }

    pub fn matches_id(&self, scope: Scope, key: &str) -> bool {
        self.scope == scope && self.key == key
    }
}

/// Granularity at which a URL is collapsed to a note identity.
///
/// - `Exact`: the full URL including query and fragment
/// - `Path`: scheme, host and path; query and fragment ignored
/// - `Origin`: scheme, host and non-default port only
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Scope {
    Exact,
    #[default]
    Path,
    Origin,
}

impl Scope {
    pub const ALL: [Scope; 3] = [Scope::Exact, Scope::Path, Scope::Origin];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Exact => "exact",
            Self::Path => "path",
            Self::Origin => "origin",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "exact" => Some(Self::Exact),
            "path" => Some(Self::Path),
            "origin" => Some(Self::Origin),
            _ => None,
        }
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

pub fn is_blank(content: &str) -> bool {
    content.trim().is_empty()
}

/// Current wall-clock time in epoch milliseconds.
pub fn now_millis() -> i64 {
    Utc::now().timestamp_millis()
}
