use json_dns_domain::{DnsQuery, DomainError, EdnsOption, EdnsRecord};
use std::fmt::Write;

const HEADER_LEN: usize = 12;
const OPT_TYPE: u16 = 41;
const MAX_POINTER_HOPS: usize = 64;
const MAX_NAME_WIRE_LEN: usize = 255;

/// A query decoded from the wire, plus where its question section ends.
#[derive(Debug, Clone)]
pub struct ParsedQuery {
    pub query: DnsQuery,
    /// Byte offset in the original buffer where the question section ends.
    pub question_end: usize,
}

/// True when `buf` carries a full header with QR clear.
///
/// Anything else is dropped without a reply.
pub fn is_query_packet(buf: &[u8]) -> bool {
    buf.len() >= HEADER_LEN && buf[2] & 0x80 == 0
}

/// Decodes the header, the single question and the OPT pseudo-record.
///
/// * `UnsupportedOpcode` for any opcode other than QUERY
/// * `MalformedQuery` for QDCOUNT ≠ 1, truncated sections, bad compression
///   pointers, a non-root OPT owner or more than one OPT record
pub fn parse_query(buf: &[u8]) -> Result<ParsedQuery, DomainError> {
    if buf.len() < HEADER_LEN {
        return Err(DomainError::MalformedQuery("header too short".to_string()));
    }

    let id = u16::from_be_bytes([buf[0], buf[1]]);
    let flags = u16::from_be_bytes([buf[2], buf[3]]);

    if flags & 0x8000 != 0 {
        return Err(DomainError::MalformedQuery("QR bit set".to_string()));
    }

    let opcode = ((flags >> 11) & 0x0F) as u8;
    if opcode != 0 {
        return Err(DomainError::UnsupportedOpcode(opcode));
    }

    let recursion_desired = flags & 0x0100 != 0;
    let checking_disabled = flags & 0x0010 != 0;

    let qdcount = read_u16(buf, 4)?;
    let ancount = read_u16(buf, 6)?;
    let nscount = read_u16(buf, 8)?;
    let arcount = read_u16(buf, 10)?;

    if qdcount != 1 {
        return Err(DomainError::MalformedQuery(format!(
            "expected exactly one question, got {}",
            qdcount
        )));
    }

    let (name, mut pos) = read_name(buf, HEADER_LEN)?;
    let record_type = read_u16(buf, pos)?;
    let class = read_u16(buf, pos + 2)?;
    pos += 4;
    let question_end = pos;

    for _ in 0..(usize::from(ancount) + usize::from(nscount)) {
        pos = skip_record(buf, pos)?;
    }

    let mut edns = None;
    for _ in 0..arcount {
        let owner_start = pos;
        pos = skip_name(buf, pos)?;
        let rr_type = read_u16(buf, pos)?;
        if rr_type != OPT_TYPE {
            pos = skip_fixed_and_rdata(buf, pos)?;
            continue;
        }

        if pos - owner_start != 1 || buf[owner_start] != 0 {
            return Err(DomainError::MalformedQuery(
                "OPT record owner must be the root".to_string(),
            ));
        }
        if edns.is_some() {
            return Err(DomainError::MalformedQuery(
                "more than one OPT record".to_string(),
            ));
        }

        let udp_payload_size = read_u16(buf, pos + 2)?;
        let ttl = read_u32(buf, pos + 4)?;
        let rdlen = usize::from(read_u16(buf, pos + 8)?);
        let rdata_start = pos + 10;
        let rdata_end = rdata_start + rdlen;
        if rdata_end > buf.len() {
            return Err(DomainError::MalformedQuery("OPT RDATA truncated".to_string()));
        }

        let mut record = EdnsRecord::new(udp_payload_size, ttl);
        record.options = parse_options(&buf[rdata_start..rdata_end])?;
        edns = Some(record);
        pos = rdata_end;
    }

    let mut query = DnsQuery::new(name, record_type)
        .with_id(id)
        .with_flags(recursion_desired, checking_disabled);
    query.class = class;
    query.edns = edns;

    Ok(ParsedQuery {
        query,
        question_end,
    })
}

/// Locates and decodes the OPT pseudo-record of any message.
pub fn find_opt(buf: &[u8]) -> Result<Option<EdnsRecord>, DomainError> {
    if buf.len() < HEADER_LEN {
        return Err(DomainError::MalformedQuery("header too short".to_string()));
    }

    let qdcount = read_u16(buf, 4)?;
    let ancount = read_u16(buf, 6)?;
    let nscount = read_u16(buf, 8)?;
    let arcount = read_u16(buf, 10)?;

    let mut pos = HEADER_LEN;
    for _ in 0..qdcount {
        pos = skip_name(buf, pos)? + 4;
    }
    for _ in 0..(usize::from(ancount) + usize::from(nscount)) {
        pos = skip_record(buf, pos)?;
    }
    for _ in 0..arcount {
        pos = skip_name(buf, pos)?;
        if read_u16(buf, pos)? == OPT_TYPE {
            let mut record = EdnsRecord::new(read_u16(buf, pos + 2)?, read_u32(buf, pos + 4)?);
            let rdlen = usize::from(read_u16(buf, pos + 8)?);
            let start = pos + 10;
            if start + rdlen > buf.len() {
                return Err(DomainError::MalformedQuery("OPT RDATA truncated".to_string()));
            }
            record.options = parse_options(&buf[start..start + rdlen])?;
            return Ok(Some(record));
        }
        pos = skip_fixed_and_rdata(buf, pos)?;
    }
    Ok(None)
}

fn parse_options(rdata: &[u8]) -> Result<Vec<EdnsOption>, DomainError> {
    let mut options = Vec::new();
    let mut pos = 0;
    while pos < rdata.len() {
        let code = read_u16(rdata, pos)?;
        let len = usize::from(read_u16(rdata, pos + 2)?);
        let start = pos + 4;
        if start + len > rdata.len() {
            return Err(DomainError::MalformedQuery(format!(
                "EDNS option {} overruns OPT RDATA",
                code
            )));
        }
        options.push(EdnsOption::new(code, &rdata[start..start + len]));
        pos = start + len;
    }
    Ok(options)
}

/// Reads a possibly-compressed name as presentation text.
///
/// Case is preserved. Bytes outside printable ASCII, `.` and `\` inside a
/// label are escaped. Returns the text and the offset just past the name in
/// the uncompressed stream.
fn read_name(buf: &[u8], start: usize) -> Result<(String, usize), DomainError> {
    let mut text = String::new();
    let mut pos = start;
    let mut resume_at = None;
    let mut hops = 0;
    let mut wire_len = 0;

    loop {
        let len_byte = *buf
            .get(pos)
            .ok_or_else(|| DomainError::MalformedQuery("name truncated".to_string()))?;

        match len_byte & 0xC0 {
            0x00 => {}
            0xC0 => {
                let low = *buf.get(pos + 1).ok_or_else(|| {
                    DomainError::MalformedQuery("compression pointer truncated".to_string())
                })?;
                hops += 1;
                if hops > MAX_POINTER_HOPS {
                    return Err(DomainError::MalformedQuery(
                        "compression pointer loop".to_string(),
                    ));
                }
                if resume_at.is_none() {
                    resume_at = Some(pos + 2);
                }
                pos = (usize::from(len_byte & 0x3F) << 8) | usize::from(low);
                continue;
            }
            _ => {
                return Err(DomainError::MalformedQuery(format!(
                    "unsupported label type 0x{:02x}",
                    len_byte
                )));
            }
        }

        let label_len = usize::from(len_byte);
        wire_len += label_len + 1;
        if wire_len > MAX_NAME_WIRE_LEN {
            return Err(DomainError::MalformedQuery("name too long".to_string()));
        }

        if label_len == 0 {
            pos += 1;
            break;
        }

        let label = buf
            .get(pos + 1..pos + 1 + label_len)
            .ok_or_else(|| DomainError::MalformedQuery("label truncated".to_string()))?;
        for &b in label {
            push_escaped(&mut text, b);
        }
        text.push('.');
        pos += 1 + label_len;
    }

    if text.is_empty() {
        text.push('.');
    }

    Ok((text, resume_at.unwrap_or(pos)))
}

fn push_escaped(text: &mut String, b: u8) {
    match b {
        b'.' | b'\\' | b'"' | b'(' | b')' | b';' | b'@' | b'$' => {
            text.push('\\');
            text.push(char::from(b));
        }
        0x21..=0x7E => text.push(char::from(b)),
        _ => {
            let _ = write!(text, "\\{:03}", b);
        }
    }
}

fn skip_name(buf: &[u8], mut pos: usize) -> Result<usize, DomainError> {
    loop {
        let len_byte = *buf
            .get(pos)
            .ok_or_else(|| DomainError::MalformedQuery("name truncated".to_string()))?;
        match len_byte & 0xC0 {
            0x00 if len_byte == 0 => return Ok(pos + 1),
            0x00 => pos += 1 + usize::from(len_byte),
            0xC0 => return Ok(pos + 2),
            _ => {
                return Err(DomainError::MalformedQuery(format!(
                    "unsupported label type 0x{:02x}",
                    len_byte
                )));
            }
        }
    }
}

fn skip_record(buf: &[u8], pos: usize) -> Result<usize, DomainError> {
    let pos = skip_name(buf, pos)?;
    skip_fixed_and_rdata(buf, pos)
}

/// Skips TYPE, CLASS, TTL, RDLENGTH and RDATA starting at `pos`.
fn skip_fixed_and_rdata(buf: &[u8], pos: usize) -> Result<usize, DomainError> {
    let rdlen = usize::from(read_u16(buf, pos + 8)?);
    let end = pos + 10 + rdlen;
    if end > buf.len() {
        return Err(DomainError::MalformedQuery("RDATA truncated".to_string()));
    }
    Ok(end)
}

fn read_u16(buf: &[u8], pos: usize) -> Result<u16, DomainError> {
    buf.get(pos..pos + 2)
        .map(|b| u16::from_be_bytes([b[0], b[1]]))
        .ok_or_else(|| DomainError::MalformedQuery("message truncated".to_string()))
}

fn read_u32(buf: &[u8], pos: usize) -> Result<u32, DomainError> {
    buf.get(pos..pos + 4)
        .map(|b| u32::from_be_bytes([b[0], b[1], b[2], b[3]]))
        .ok_or_else(|| DomainError::MalformedQuery("message truncated".to_string()))
}
