use chrono::{Local, TimeZone};
use serde::Serialize;
use url::Url;

use super::{Note, Scope};

/// A note prepared for display in the recent/search list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct NoteSummary {
    pub scope: Scope,
    pub key: String,
    pub url_sample: String,
    /// Page title, or the URL's host when the note has no usable title.
    pub display_title: String,
    /// First line of the content.
    pub excerpt: String,
    pub updated_at: i64,
    pub updated_at_label: String,
}

impl From<&Note> for NoteSummary {
    fn from(note: &Note) -> Self {
        let display_title = note
            .title
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(str::to_string)
            .unwrap_or_else(|| host_of(&note.url_sample));

        Self {
            scope: note.scope,
            key: note.key.clone(),
            url_sample: note.url_sample.clone(),
            display_title,
            excerpt: note.content.lines().next().unwrap_or_default().to_string(),
            updated_at: note.updated_at,
            updated_at_label: format_timestamp(note.updated_at),
        }
    }
}

/// `host[:port]` of a URL, or the input itself when it does not parse.
pub fn host_of(url: &str) -> String {
    let Ok(parsed) = Url::parse(url) else {
        return url.to_string();
    };
    match (parsed.host_str(), parsed.port()) {
        (Some(host), Some(port)) => format!("{}:{}", host, port),
        (Some(host), None) => host.to_string(),
        (None, _) => String::new(),
    }
}

fn format_timestamp(millis: i64) -> String {
    match Local.timestamp_millis_opt(millis).single() {
        Some(dt) => dt.format("%Y-%m-%d %H:%M:%S").to_string(),
        None => millis.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn note(title: Option<&str>, url: &str, content: &str) -> Note {
        Note {
            key: url.to_string(),
            url_sample: url.to_string(),
            scope: Scope::Path,
            title: title.map(str::to_string),
            content: content.to_string(),
            updated_at: 0,
        }
    }

    #[test]
    fn uses_trimmed_title_when_present() {
        let summary = NoteSummary::from(&note(Some("  Docs  "), "https://a.dev/x", "body"));
        assert_eq!(summary.display_title, "Docs");
    }

    #[test]
    fn falls_back_to_host_with_port() {
        let summary = NoteSummary::from(&note(Some("   "), "http://Example.com:8080/x", "body"));
        assert_eq!(summary.display_title, "example.com:8080");
    }

    #[test]
    fn falls_back_to_raw_sample_when_unparsable() {
        let summary = NoteSummary::from(&note(None, "not a url", "body"));
        assert_eq!(summary.display_title, "not a url");
    }

    #[test]
    fn excerpt_is_first_line() {
        let summary = NoteSummary::from(&note(None, "https://a.dev/", "first\nsecond"));
        assert_eq!(summary.excerpt, "first");
    }
}
