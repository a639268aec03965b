use crate::ports::DnsBackend;
use crate::services::QueryClassifier;
use json_dns_domain::{BackendOutcome, DnsQuery, DomainError, QueryRoute};
use std::sync::Arc;
use std::time::Instant;
use tracing::{debug, warn};

/// Result of running one query through classification and, when needed,
/// the backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryResolution {
    DnssecBlocked,
    SoaDirect,
    Backend(BackendOutcome),
}

impl QueryResolution {
    pub fn route(&self) -> QueryRoute {
        match self {
            QueryResolution::DnssecBlocked => QueryRoute::DnssecBlock,
            QueryResolution::SoaDirect => QueryRoute::SoaDirect,
            QueryResolution::Backend(_) => QueryRoute::Normal,
        }
    }
}

pub struct HandleDnsQueryUseCase {
    classifier: QueryClassifier,
    backend: Arc<dyn DnsBackend>,
}

impl HandleDnsQueryUseCase {
    pub fn new(classifier: QueryClassifier, backend: Arc<dyn DnsBackend>) -> Self {
        Self {
            classifier,
            backend,
        }
    }

    pub fn classifier(&self) -> &QueryClassifier {
        &self.classifier
    }

    /// Classify `query` and consult the backend only on the normal path.
    ///
    /// Backend failures are returned once, unretried; the caller answers
    /// them with SERVFAIL.
    pub async fn execute(&self, query: &DnsQuery) -> Result<QueryResolution, DomainError> {
        let route = self.classifier.classify(query);

        match route {
            QueryRoute::DnssecBlock => {
                debug!(
                    domain = %query.name,
                    record_type = query.record_type,
                    "DNSSEC query received but DNSSEC not enabled"
                );
                Ok(QueryResolution::DnssecBlocked)
            }
            QueryRoute::SoaDirect => {
                debug!(domain = %query.name, "Answering SOA from authority configuration");
                Ok(QueryResolution::SoaDirect)
            }
            QueryRoute::Normal => {
                let start = Instant::now();
                match self.backend.lookup(&query.name, query.record_type).await {
                    Ok(outcome) => {
                        debug!(
                            domain = %query.name,
                            record_type = query.record_type,
                            not_found = matches!(outcome, BackendOutcome::NotFound),
                            elapsed_ms = start.elapsed().as_millis() as u64,
                            "Backend lookup complete"
                        );
                        Ok(QueryResolution::Backend(outcome))
                    }
                    Err(e) => {
                        warn!(
                            domain = %query.name,
                            record_type = query.record_type,
                            error = %e,
                            elapsed_ms = start.elapsed().as_millis() as u64,
                            "Backend lookup failed"
                        );
                        Err(e)
                    }
                }
            }
        }
    }
}
