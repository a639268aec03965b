use std::fmt;

/// Which response path a query takes. Exactly one applies per query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum QueryRoute {
    /// DNSSEC-specific type while DNSSEC support is off: answered locally
    /// with an empty NOERROR.
    DnssecBlock,
    /// SOA query answered from the configured authority records.
    SoaDirect,
    /// Resolved through the backend.
    Normal,
}

impl QueryRoute {
    pub fn as_str(&self) -> &'static str {
        match self {
            QueryRoute::DnssecBlock => "dnssec_block",
            QueryRoute::SoaDirect => "soa_direct",
            QueryRoute::Normal => "normal",
        }
    }
}

impl fmt::Display for QueryRoute {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
