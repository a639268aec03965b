use super::RecordType;
use serde::{Deserialize, Serialize};

/// JSON body returned by the resolution backend on HTTP 200.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct BackendAnswer {
    #[serde(rename = "RCODE")]
    pub rcode: u16,

    #[serde(rename = "AD", default)]
    pub authenticated_data: bool,

    #[serde(rename = "Answer", default)]
    pub answers: Vec<BackendRecord>,

    /// Echo of the question; carried in the payload but unused by synthesis.
    #[serde(rename = "Question", default)]
    pub questions: Vec<BackendQuestion>,
}

impl BackendAnswer {
    pub fn from_json(body: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(body)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct BackendRecord {
    pub name: String,

    #[serde(rename = "type")]
    pub record_type: u16,

    #[serde(rename = "TTL")]
    pub ttl: u32,

    pub data: String,
}

impl BackendRecord {
    pub fn new(name: impl Into<String>, record_type: u16, ttl: u32, data: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            record_type,
            ttl,
            data: data.into(),
        }
    }

    /// Single-line presentation form: `<name> <ttl> <TYPE> <data>`.
    pub fn presentation(&self) -> String {
        format!(
            "{} {} {} {}",
            self.name,
            self.ttl,
            RecordType::mnemonic(self.record_type),
            self.data
        )
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
pub struct BackendQuestion {
    pub name: String,

    #[serde(rename = "type")]
    pub record_type: u16,
}

/// What the backend said about a name, after HTTP status mapping.
///
/// Any status other than 200/404 never reaches this type: it is reported as
/// `DomainError::UpstreamUnexpectedStatus`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendOutcome {
    NotFound,
    Answer(BackendAnswer),
}
