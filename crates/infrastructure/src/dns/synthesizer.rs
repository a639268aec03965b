//! Response synthesis.
//!
//! Every reply carries AA=1 and RA=0, echoes RD and CD from the query and
//! repeats the question. AD is only ever set on the backend path, and only
//! when DNSSEC is enabled and the backend vouched for the data. An OPT record
//! is attached exactly when the query had one; its extended RCODE byte always
//! belongs to the reply.

use super::authority::AuthorityCatalog;
use super::records::{parse_name, record_from_backend};
use super::wire::append_opt;
use hickory_proto::op::{Message, MessageType, OpCode, Query, ResponseCode};
use hickory_proto::rr::{DNSClass, RecordType};
use hickory_proto::serialize::binary::{BinEncodable, BinEncoder};
use json_dns_application::use_cases::QueryResolution;
use json_dns_domain::{
    BackendAnswer, BackendOutcome, DnsQuery, DomainError, EdnsRecord, EDNS_DO_BIT,
};
use std::sync::Arc;
use tracing::{debug, warn};

/// Records discarded while building one response.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SynthesisReport {
    pub dropped_answers: usize,
    pub dropped_authority: usize,
}

impl SynthesisReport {
    pub fn total_dropped(&self) -> usize {
        self.dropped_answers + self.dropped_authority
    }
}

#[derive(Debug, Clone)]
pub struct SynthesizedResponse {
    pub message: Message,
    pub edns: Option<EdnsRecord>,
    pub report: SynthesisReport,
}

impl SynthesizedResponse {
    pub fn response_code(&self) -> ResponseCode {
        self.message.response_code()
    }

    /// Encodes the message and appends the echoed OPT record.
    pub fn to_wire(&self) -> Result<Vec<u8>, DomainError> {
        let mut buf = Vec::with_capacity(512);
        {
            let mut encoder = BinEncoder::new(&mut buf);
            self.message
                .emit(&mut encoder)
                .map_err(|e| DomainError::Encode(e.to_string()))?;
        }
        if let Some(edns) = &self.edns {
            append_opt(&mut buf, edns);
        }
        Ok(buf)
    }
}

pub struct ResponseSynthesizer {
    dnssec_enabled: bool,
    authority: Arc<AuthorityCatalog>,
}

impl ResponseSynthesizer {
    pub fn new(dnssec_enabled: bool, authority: Arc<AuthorityCatalog>) -> Self {
        Self {
            dnssec_enabled,
            authority,
        }
    }

    pub fn dnssec_enabled(&self) -> bool {
        self.dnssec_enabled
    }

    pub fn authority(&self) -> &AuthorityCatalog {
        &self.authority
    }

    pub fn build(
        &self,
        query: &DnsQuery,
        resolution: &QueryResolution,
    ) -> Result<SynthesizedResponse, DomainError> {
        match resolution {
            QueryResolution::DnssecBlocked => self.build_dnssec_blocked(query),
            QueryResolution::SoaDirect => self.build_soa_direct(query),
            QueryResolution::Backend(outcome) => self.build_normal(query, outcome),
        }
    }

    /// Empty NOERROR with authority data for a DNSSEC type while DNSSEC is
    /// off. DO is always cleared in the echoed OPT.
    pub fn build_dnssec_blocked(&self, query: &DnsQuery) -> Result<SynthesizedResponse, DomainError> {
        let mut message = reply_to(query)?;
        let authority = self.authority.render_authority(&query.name);
        for record in authority.records {
            message.add_name_server(record);
        }

        Ok(SynthesizedResponse {
            message,
            edns: query.edns.as_ref().map(|e| echo_edns(e, false)),
            report: SynthesisReport {
                dropped_answers: 0,
                dropped_authority: authority.dropped,
            },
        })
    }

    /// SOA answer straight from the configured SOA templates, NXDOMAIN when
    /// none of them produce a record.
    pub fn build_soa_direct(&self, query: &DnsQuery) -> Result<SynthesizedResponse, DomainError> {
        let mut message = reply_to(query)?;
        let soa = self.authority.soa_answers(&query.name);

        if soa.records.is_empty() {
            message.set_response_code(ResponseCode::NXDomain);
        }
        for record in soa.records {
            message.add_answer(record);
        }

        Ok(SynthesizedResponse {
            message,
            edns: self.echo(query),
            report: SynthesisReport {
                dropped_answers: soa.dropped,
                dropped_authority: 0,
            },
        })
    }

    pub fn build_normal(
        &self,
        query: &DnsQuery,
        outcome: &BackendOutcome,
    ) -> Result<SynthesizedResponse, DomainError> {
        match outcome {
            BackendOutcome::NotFound => {
                let mut message = reply_to(query)?;
                let authority = self.authority.render_authority(&query.name);
                for record in authority.records {
                    message.add_name_server(record);
                }
                Ok(SynthesizedResponse {
                    message,
                    edns: self.echo(query),
                    report: SynthesisReport {
                        dropped_answers: 0,
                        dropped_authority: authority.dropped,
                    },
                })
            }
            BackendOutcome::Answer(answer) => self.build_answer(query, answer),
        }
    }

    fn build_answer(
        &self,
        query: &DnsQuery,
        answer: &BackendAnswer,
    ) -> Result<SynthesizedResponse, DomainError> {
        let mut message = reply_to(query)?;
        let mut edns = self.echo(query);

        if !set_rcode(&mut message, edns.as_mut(), answer.rcode) {
            warn!(
                qname = %query.name,
                rcode = answer.rcode,
                has_edns = edns.is_some(),
                "Backend RCODE does not fit the reply, answering SERVFAIL"
            );
            message.set_response_code(ResponseCode::ServFail);
            return Ok(SynthesizedResponse {
                message,
                edns,
                report: SynthesisReport::default(),
            });
        }
        message.set_authentic_data(self.dnssec_enabled && answer.authenticated_data);

        let mut report = SynthesisReport::default();
        for backend_record in &answer.answers {
            match record_from_backend(backend_record) {
                Ok(record) => {
                    message.add_answer(record);
                }
                Err(e) => {
                    debug!(
                        qname = %query.name,
                        record = %backend_record.presentation(),
                        error = %e,
                        "Dropping unparseable backend record"
                    );
                    report.dropped_answers += 1;
                }
            }
        }

        if message.answers().is_empty() {
            let authority = self.authority.render_authority(&query.name);
            report.dropped_authority = authority.dropped;
            for record in authority.records {
                message.add_name_server(record);
            }
        }

        Ok(SynthesizedResponse {
            message,
            edns,
            report,
        })
    }

    /// OPT echo for error replies built outside the synthesis paths.
    pub fn echo(&self, query: &DnsQuery) -> Option<EdnsRecord> {
        query
            .edns
            .as_ref()
            .map(|e| echo_edns(e, self.dnssec_enabled))
    }
}

/// Fresh OPT record for a reply: payload size, version and Z bits copied,
/// extended RCODE zeroed, DO cleared unless `keep_dnssec_ok`, cookies dropped.
pub fn echo_edns(request: &EdnsRecord, keep_dnssec_ok: bool) -> EdnsRecord {
    let ttl = if keep_dnssec_ok {
        request.ttl
    } else {
        request.ttl & !EDNS_DO_BIT
    };
    let mut reply = EdnsRecord::new(request.udp_payload_size, ttl);
    reply.set_extended_rcode(0);
    reply.options = request
        .options
        .iter()
        .filter(|o| !o.is_cookie())
        .cloned()
        .collect();
    reply
}

/// Puts the low four bits of `rcode` in the header and the rest in the OPT
/// record. False when the value needs an OPT record the query did not bring,
/// or exceeds twelve bits.
fn set_rcode(message: &mut Message, edns: Option<&mut EdnsRecord>, rcode: u16) -> bool {
    let Ok(high_bits) = u8::try_from(rcode >> 4) else {
        return false;
    };
    match edns {
        Some(opt) => opt.set_extended_rcode(high_bits),
        None if high_bits != 0 => return false,
        None => {}
    }
    message.set_response_code(<ResponseCode as From<u16>>::from(rcode));
    true
}

fn reply_to(query: &DnsQuery) -> Result<Message, DomainError> {
    let name = parse_name(&query.name)
        .map_err(|e| DomainError::MalformedQuery(format!("query name: {}", e)))?;
    let mut question = Query::query(name, RecordType::from(query.record_type));
    question.set_query_class(question_class(query.class)?);

    let mut message = Message::new();
    message
        .set_id(query.id)
        .set_message_type(MessageType::Response)
        .set_op_code(OpCode::Query)
        .set_authoritative(true)
        .set_recursion_available(false)
        .set_recursion_desired(query.recursion_desired)
        .set_checking_disabled(query.checking_disabled)
        .set_authentic_data(false)
        .set_response_code(ResponseCode::NoError)
        .add_query(question);
    Ok(message)
}

fn question_class(class: u16) -> Result<DNSClass, DomainError> {
    match class {
        1 => Ok(DNSClass::IN),
        3 => Ok(DNSClass::CH),
        4 => Ok(DNSClass::HS),
        254 => Ok(DNSClass::NONE),
        255 => Ok(DNSClass::ANY),
        other => Err(DomainError::MalformedQuery(format!(
            "unsupported query class {}",
            other
        ))),
    }
}
