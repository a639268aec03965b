use super::synthesizer::ResponseSynthesizer;
use super::wire::{
    build_error_response, build_truncated_response, is_query_packet, parse_query, ParsedQuery,
};
use hickory_proto::op::ResponseCode;
use json_dns_application::use_cases::HandleDnsQueryUseCase;
use json_dns_domain::{DnsQuery, DomainError};
use std::sync::Arc;
use tracing::{debug, error, warn};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transport {
    Udp,
    Tcp,
}

/// Turns raw query bytes into raw response bytes.
#[derive(Clone)]
pub struct DnsServerHandler {
    use_case: Arc<HandleDnsQueryUseCase>,
    synthesizer: Arc<ResponseSynthesizer>,
}

impl DnsServerHandler {
    pub fn new(use_case: Arc<HandleDnsQueryUseCase>, synthesizer: Arc<ResponseSynthesizer>) -> Self {
        Self {
            use_case,
            synthesizer,
        }
    }

    /// Returns `None` when the packet must be dropped without a reply.
    pub async fn handle_raw(&self, buf: &[u8], transport: Transport) -> Option<Vec<u8>> {
        if !is_query_packet(buf) {
            debug!(len = buf.len(), "Dropping packet that is not a query");
            return None;
        }

        let ParsedQuery {
            query,
            question_end,
        } = match parse_query(buf) {
            Ok(parsed) => parsed,
            Err(DomainError::UnsupportedOpcode(opcode)) => {
                debug!(opcode, "Unsupported opcode");
                return Some(build_error_response(
                    buf,
                    None,
                    ResponseCode::NotImp.low(),
                    None,
                ));
            }
            Err(e) => {
                warn!(error = %e, "Malformed query");
                return Some(build_error_response(
                    buf,
                    None,
                    ResponseCode::FormErr.low(),
                    None,
                ));
            }
        };

        debug!(
            domain = %query.name,
            record_type = query.record_type,
            edns = query.has_edns(),
            "DNS query received"
        );

        let response = match self.resolve(&query).await {
            Ok(bytes) => bytes,
            Err(DomainError::MalformedQuery(reason)) => {
                warn!(domain = %query.name, reason = %reason, "Query rejected");
                return Some(build_error_response(
                    buf,
                    Some(question_end),
                    ResponseCode::FormErr.low(),
                    self.synthesizer.echo(&query).as_ref(),
                ));
            }
            Err(e) => {
                if e.is_upstream() {
                    warn!(domain = %query.name, error = %e, "Backend failure, answering SERVFAIL");
                } else {
                    error!(domain = %query.name, error = %e, "Query resolution failed");
                }
                return Some(build_error_response(
                    buf,
                    Some(question_end),
                    ResponseCode::ServFail.low(),
                    self.synthesizer.echo(&query).as_ref(),
                ));
            }
        };

        if transport == Transport::Udp && response.len() > query.max_udp_payload() {
            debug!(
                domain = %query.name,
                size = response.len(),
                limit = query.max_udp_payload(),
                "Response truncated"
            );
            return build_truncated_response(
                &response,
                buf,
                question_end,
                self.synthesizer.echo(&query).as_ref(),
            );
        }

        Some(response)
    }

    async fn resolve(&self, query: &DnsQuery) -> Result<Vec<u8>, DomainError> {
        let resolution = self.use_case.execute(query).await?;
        let response = self.synthesizer.build(query, &resolution)?;

        if response.report.total_dropped() > 0 {
            warn!(
                domain = %query.name,
                route = %resolution.route(),
                dropped_answers = response.report.dropped_answers,
                dropped_authority = response.report.dropped_authority,
                "Records dropped while building response"
            );
        }
        debug!(
            domain = %query.name,
            route = %resolution.route(),
            rcode = %response.response_code(),
            answers = response.message.answers().len(),
            authority = response.message.name_servers().len(),
            "Sending response"
        );

        response.to_wire()
    }
}
