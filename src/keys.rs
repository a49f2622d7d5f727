//! Stable storage keys for URLs.
//!
//! `path` and `origin` collapse trivially different URLs (trailing slash,
//! query variants, fragments) onto one note, while `exact` keeps them apart.
//! Hostnames are lowercased so case-insensitive domains do not fork notes.

use url::Url;

use crate::models::Scope;

/// The storage key for a URL under a scope, plus the literal URL for display.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DerivedKey {
    pub key: String,
    pub sample: String,
}

/// Derive the note key for `url` under `scope`.
///
/// Never fails. Inputs that do not parse as URLs are used verbatim as both key
/// and sample.
pub fn derive_key(url: &str, scope: Scope) -> DerivedKey {
    let sample = url.to_string();
    let Ok(parsed) = Url::parse(url) else {
        tracing::debug!("Unparsable URL, using it verbatim as key: {}", url);
        return DerivedKey {
            key: sample.clone(),
            sample,
        };
    };

    let protocol = format!("{}:", parsed.scheme());
    let hostname = parsed.host_str().unwrap_or_default().to_lowercase();

    let key = match scope {
        Scope::Exact => parsed.as_str().to_string(),
        Scope::Path => {
            let mut pathname = match parsed.path() {
                "" => "/".to_string(),
                p => p.to_string(),
            };
            if !pathname.ends_with('/') {
                pathname.push('/');
            }
            format!("{}//{}{}", protocol, hostname, pathname)
        }
        Scope::Origin => {
            let port = parsed.port().map(|p| format!(":{}", p)).unwrap_or_default();
            format!("{}//{}{}/", protocol, hostname, port)
        }
    };

    DerivedKey { key, sample }
}
