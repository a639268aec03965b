use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Per-query deadline for the backend HTTP call. Fixed, never retried.
pub const BACKEND_TIMEOUT: Duration = Duration::from_secs(5);

/// The settings the resolution core consumes.
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct BackendConfig {
    /// Base URL queried as `<url>?name=<qname>&type=<numeric type>`.
    #[serde(default)]
    pub url: String,

    /// Pass DNSSEC signalling (AD, DO) through instead of stripping it.
    #[serde(default)]
    pub dnssec: bool,

    /// Authority section records, in the order they are emitted.
    ///
    /// Each entry is one resource record line that may reference the query
    /// name as `{qname}` or through `{{ .Name }}`-style directives.
    #[serde(default)]
    pub authority: Vec<String>,
}

impl BackendConfig {
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            url: url.into(),
            ..Self::default()
        }
    }

    pub fn with_dnssec(mut self, dnssec: bool) -> Self {
        self.dnssec = dnssec;
        self
    }

    pub fn with_authority<I, S>(mut self, authority: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.authority = authority.into_iter().map(Into::into).collect();
        self
    }

    pub fn timeout(&self) -> Duration {
        BACKEND_TIMEOUT
    }
}
