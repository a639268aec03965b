pub mod presentation;

pub use presentation::{parse_name, parse_record, DEFAULT_TTL};

use hickory_proto::rr::Record;
use json_dns_domain::{BackendRecord, DomainError};

/// Builds a resource record from a backend answer entry.
pub fn record_from_backend(record: &BackendRecord) -> Result<Record, DomainError> {
    parse_record(&record.presentation())
}
