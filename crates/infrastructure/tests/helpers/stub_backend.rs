use async_trait::async_trait;
use json_dns_application::ports::DnsBackend;
use json_dns_domain::{BackendOutcome, DomainError};
use std::sync::atomic::{AtomicUsize, Ordering};

/// Backend that answers every lookup with the same canned result.
pub struct StubBackend {
    result: Result<BackendOutcome, DomainError>,
    calls: AtomicUsize,
}

impl StubBackend {
    pub fn answering(outcome: BackendOutcome) -> Self {
        Self {
            result: Ok(outcome),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn failing(error: DomainError) -> Self {
        Self {
            result: Err(error),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn call_count(&self) -> usize {
        self.calls.load(Ordering::Relaxed)
    }
}

#[async_trait]
impl DnsBackend for StubBackend {
    async fn lookup(&self, _name: &str, _record_type: u16) -> Result<BackendOutcome, DomainError> {
        self.calls.fetch_add(1, Ordering::Relaxed);
        self.result.clone()
    }
}
