use super::records::parse_record;
use hickory_proto::rr::{Record, RecordType};
use json_dns_domain::{AuthorityTemplate, DomainError};
use tracing::{debug, warn};

/// Query name used to render templates once at load time.
pub const SAMPLE_QNAME: &str = "sample.invalid.";

#[derive(Debug, Clone)]
struct AuthorityEntry {
    template: AuthorityTemplate,
    /// Record type the template renders to, `None` when the sample render
    /// did not yield a parseable record.
    declared_type: Option<RecordType>,
}

/// Records synthesized from templates, plus how many were discarded.
#[derive(Debug, Default)]
pub struct RenderedRecords {
    pub records: Vec<Record>,
    pub dropped: usize,
}

/// Configured authority templates with their declared record types cached.
#[derive(Debug, Clone, Default)]
pub struct AuthorityCatalog {
    entries: Vec<AuthorityEntry>,
}

impl AuthorityCatalog {
    pub fn load<S: AsRef<str>>(sources: &[S]) -> Self {
        let entries = sources
            .iter()
            .map(|source| {
                let template = AuthorityTemplate::new(source.as_ref());
                let declared_type = match declared_type_of(&template) {
                    Ok(record_type) => Some(record_type),
                    Err(e) => {
                        warn!(
                            template = %template.source(),
                            error = %e,
                            "Authority template does not render to a record"
                        );
                        None
                    }
                };
                AuthorityEntry {
                    template,
                    declared_type,
                }
            })
            .collect();

        Self { entries }
    }

    pub fn empty() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Declared types in configuration order.
    pub fn declared_types(&self) -> Vec<Option<RecordType>> {
        self.entries.iter().map(|e| e.declared_type).collect()
    }

    pub fn has_soa(&self) -> bool {
        self.entries
            .iter()
            .any(|e| e.declared_type == Some(RecordType::SOA))
    }

    /// Renders every template for `qname`, in configured order.
    ///
    /// Templates that fail to render or parse are skipped and counted.
    pub fn render_authority(&self, qname: &str) -> RenderedRecords {
        let mut rendered = RenderedRecords::default();

        if self.entries.is_empty() {
            warn!(qname = %qname, "No authority templates configured, authority section left empty");
            return rendered;
        }

        for entry in &self.entries {
            let result = entry
                .template
                .render_for(qname)
                .and_then(|text| parse_record(&text));
            match result {
                Ok(record) => rendered.records.push(record),
                Err(e) => {
                    debug!(
                        qname = %qname,
                        template = %entry.template.source(),
                        error = %e,
                        "Skipping authority record"
                    );
                    rendered.dropped += 1;
                }
            }
        }

        rendered
    }

    /// SOA records for a direct SOA answer.
    ///
    /// Only templates declared as SOA take part, and they go through literal
    /// `{qname}` replacement, never the directive engine.
    pub fn soa_answers(&self, qname: &str) -> RenderedRecords {
        let mut rendered = RenderedRecords::default();

        for entry in self
            .entries
            .iter()
            .filter(|e| e.declared_type == Some(RecordType::SOA))
        {
            match parse_record(&entry.template.substitute_qname(qname)) {
                Ok(record) if record.record_type() == RecordType::SOA => {
                    rendered.records.push(record)
                }
                Ok(record) => {
                    debug!(
                        qname = %qname,
                        record_type = %record.record_type(),
                        "Ignoring non-SOA record on SOA path"
                    );
                    rendered.dropped += 1;
                }
                Err(e) => {
                    debug!(qname = %qname, error = %e, "Skipping SOA template");
                    rendered.dropped += 1;
                }
            }
        }

        rendered
    }
}

fn declared_type_of(template: &AuthorityTemplate) -> Result<RecordType, DomainError> {
    let text = template.render_for(SAMPLE_QNAME)?;
    Ok(parse_record(&text)?.record_type())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_declared_type_cached_at_load() {
        let catalog = AuthorityCatalog::load(&[
            "{qname} 60 IN NS ns1.example.com.",
            "{{ .Zone }} 60 IN SOA ns1.example.com. admin.example.com. 1 2 3 4 5",
            "not a record",
        ]);
        assert_eq!(
            catalog.declared_types(),
            vec![Some(RecordType::NS), Some(RecordType::SOA), None]
        );
        assert!(catalog.has_soa());
    }
}
