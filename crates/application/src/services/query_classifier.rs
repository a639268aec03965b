use json_dns_domain::{DnsQuery, QueryRoute, RecordType};

/// Picks the response path for a query. Pure; holds only load-time facts.
#[derive(Debug, Clone, Copy)]
pub struct QueryClassifier {
    dnssec_enabled: bool,
    soa_authority: bool,
}

impl QueryClassifier {
    /// `soa_authority` is true when at least one configured authority
    /// template declares an SOA record.
    pub fn new(dnssec_enabled: bool, soa_authority: bool) -> Self {
        Self {
            dnssec_enabled,
            soa_authority,
        }
    }

    pub fn dnssec_enabled(&self) -> bool {
        self.dnssec_enabled
    }

    pub fn classify(&self, query: &DnsQuery) -> QueryRoute {
        let record_type = query.known_type();

        if self.soa_authority && record_type == Some(RecordType::SOA) {
            return QueryRoute::SoaDirect;
        }

        if !self.dnssec_enabled && record_type.is_some_and(|rt| rt.is_dnssec_signaling()) {
            return QueryRoute::DnssecBlock;
        }

        QueryRoute::Normal
    }
}
