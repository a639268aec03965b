use json_dns_application::services::QueryClassifier;
use json_dns_application::use_cases::HandleDnsQueryUseCase;
use json_dns_domain::Config;
use json_dns_infrastructure::backend::HttpDnsBackend;
use json_dns_infrastructure::dns::{AuthorityCatalog, DnsServerHandler, ResponseSynthesizer};
use std::sync::Arc;
use tracing::{info, warn};

pub struct DnsServices {
    pub handler: DnsServerHandler,
}

impl DnsServices {
    pub fn new(config: &Config) -> anyhow::Result<Self> {
        let backend_config = &config.backend;

        let authority = Arc::new(AuthorityCatalog::load(backend_config.authority.as_slice()));
        if authority.is_empty() {
            warn!("No authority templates configured, responses will carry no authority data");
        }

        let backend = Arc::new(HttpDnsBackend::from_config(backend_config)?);
        let classifier = QueryClassifier::new(backend_config.dnssec, authority.has_soa());
        let use_case = Arc::new(HandleDnsQueryUseCase::new(classifier, backend));
        let synthesizer = Arc::new(ResponseSynthesizer::new(
            backend_config.dnssec,
            Arc::clone(&authority),
        ));

        info!(
            backend_url = %backend_config.url,
            dnssec = backend_config.dnssec,
            authority_templates = authority.len(),
            soa_direct = authority.has_soa(),
            timeout_secs = backend_config.timeout().as_secs(),
            "DNS services initialized"
        );

        Ok(Self {
            handler: DnsServerHandler::new(use_case, synthesizer),
        })
    }
}
