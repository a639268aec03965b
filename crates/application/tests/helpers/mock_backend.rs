use async_trait::async_trait;
use json_dns_application::ports::DnsBackend;
use json_dns_domain::{BackendOutcome, DomainError};
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// Backend double keyed by `(name, type)`; unknown keys answer NotFound.
#[derive(Clone, Default)]
pub struct MockDnsBackend {
    responses: Arc<Mutex<HashMap<(String, u16), Result<BackendOutcome, DomainError>>>>,
    calls: Arc<Mutex<Vec<(String, u16)>>>,
}

impl MockDnsBackend {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_response(&self, name: &str, record_type: u16, outcome: BackendOutcome) {
        self.responses
            .lock()
            .unwrap()
            .insert((name.to_string(), record_type), Ok(outcome));
    }

    pub fn set_error(&self, name: &str, record_type: u16, error: DomainError) {
        self.responses
            .lock()
            .unwrap()
            .insert((name.to_string(), record_type), Err(error));
    }

    pub fn calls(&self) -> Vec<(String, u16)> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }
}

#[async_trait]
impl DnsBackend for MockDnsBackend {
    async fn lookup(&self, name: &str, record_type: u16) -> Result<BackendOutcome, DomainError> {
        self.calls
            .lock()
            .unwrap()
            .push((name.to_string(), record_type));

        self.responses
            .lock()
            .unwrap()
            .get(&(name.to_string(), record_type))
            .cloned()
            .unwrap_or(Ok(BackendOutcome::NotFound))
    }
}
