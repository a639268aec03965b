use async_trait::async_trait;
use json_dns_domain::{BackendOutcome, DomainError};

/// The JSON resolution backend, seen from the core.
///
/// Implementations own transport concerns (deadline, connection reuse).
/// They map HTTP 200 to [`BackendOutcome::Answer`], HTTP 404 to
/// [`BackendOutcome::NotFound`] and everything else to an upstream
/// `DomainError`.
#[async_trait]
pub trait DnsBackend: Send + Sync {
    async fn lookup(&self, name: &str, record_type: u16) -> Result<BackendOutcome, DomainError>;
}
