use thiserror::Error;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    #[error("Backend unreachable: {0}")]
    UpstreamUnreachable(String),

    #[error("Backend returned a malformed payload: {0}")]
    UpstreamMalformedPayload(String),

    #[error("Backend returned unexpected HTTP status {0}")]
    UpstreamUnexpectedStatus(u16),

    #[error("Invalid resource record: {0}")]
    RecordParse(String),

    #[error("Authority template error: {0}")]
    AuthorityTemplate(String),

    #[error("Malformed DNS query: {0}")]
    MalformedQuery(String),

    #[error("Unsupported opcode {0}")]
    UnsupportedOpcode(u8),

    #[error("Failed to encode DNS message: {0}")]
    Encode(String),
}

impl DomainError {
    /// Errors that abort the whole query and surface as SERVFAIL.
    pub fn is_upstream(&self) -> bool {
        matches!(
            self,
            DomainError::UpstreamUnreachable(_)
                | DomainError::UpstreamMalformedPayload(_)
                | DomainError::UpstreamUnexpectedStatus(_)
        )
    }
}
