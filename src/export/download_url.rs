use serde_json::Value;

/// One place a download URL may appear in the resolution response.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UrlSource {
    /// The whole body is the URL
    BareString,
    /// A top-level string field
    Field(&'static str),
}

/// Sources in priority order; the first match wins.
pub const URL_SOURCES: &[UrlSource] = &[
    UrlSource::BareString,
    UrlSource::Field("url"),
    UrlSource::Field("download_url"),
    UrlSource::Field("signed_url"),
];

impl UrlSource {
    pub fn extract<'a>(&self, body: &'a Value) -> Option<&'a str> {
        let candidate = match self {
            UrlSource::BareString => body.as_str(),
            UrlSource::Field(name) => body.get(*name).and_then(Value::as_str),
        }?;
        let candidate = candidate.trim();
        (!candidate.is_empty()).then_some(candidate)
    }
}

/// Returns the first non-empty URL found by [`URL_SOURCES`].
pub fn extract_download_url(body: &Value) -> Option<&str> {
    URL_SOURCES.iter().find_map(|source| source.extract(body))
}
