//! Raw responses built without a full message encode: header-only errors
//! and the TC=1 fallback for oversized UDP answers.

use super::opt::append_opt;
use json_dns_domain::EdnsRecord;

const HEADER_LEN: usize = 12;

/// Reply carrying only a header, the question (when it was parsed) and an
/// optional OPT record.
///
/// Opcode, RD and CD are copied from the query. AA and RA stay clear.
pub fn build_error_response(
    query_buf: &[u8],
    question_end: Option<usize>,
    rcode: u8,
    edns: Option<&EdnsRecord>,
) -> Vec<u8> {
    let question = question_end
        .filter(|&end| end > HEADER_LEN && end <= query_buf.len())
        .map(|end| &query_buf[HEADER_LEN..end])
        .unwrap_or_default();

    let mut buf = Vec::with_capacity(HEADER_LEN + question.len() + 11);
    buf.extend_from_slice(&query_buf[..2.min(query_buf.len())]);
    buf.resize(2, 0);

    let request_flags = query_buf.get(2).copied().unwrap_or(0);
    let request_low = query_buf.get(3).copied().unwrap_or(0);
    buf.push(0x80 | (request_flags & 0x79));
    buf.push((request_low & 0x10) | (rcode & 0x0F));

    let qdcount: u16 = if question.is_empty() { 0 } else { 1 };
    buf.extend_from_slice(&qdcount.to_be_bytes());
    buf.extend_from_slice(&[0x00, 0x00, 0x00, 0x00, 0x00, 0x00]);
    buf.extend_from_slice(question);

    if let Some(edns) = edns {
        append_opt(&mut buf, edns);
    }
    buf
}

/// Truncated form of an oversized UDP response: the response header with TC
/// set, the original question and the OPT record, nothing else.
pub fn build_truncated_response(
    response: &[u8],
    query_buf: &[u8],
    question_end: usize,
    edns: Option<&EdnsRecord>,
) -> Option<Vec<u8>> {
    if response.len() < HEADER_LEN || question_end > query_buf.len() || question_end < HEADER_LEN
    {
        return None;
    }

    let question = &query_buf[HEADER_LEN..question_end];
    let mut buf = Vec::with_capacity(HEADER_LEN + question.len() + 11);
    buf.extend_from_slice(&response[..4]);
    buf[2] |= 0x02;
    buf.extend_from_slice(&[0x00, 0x01, 0x00, 0x00, 0x00, 0x00, 0x00, 0x00]);
    buf.extend_from_slice(question);

    if let Some(edns) = edns {
        append_opt(&mut buf, edns);
    }
    Some(buf)
}
