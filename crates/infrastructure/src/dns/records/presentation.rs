//! Single-line zone-file record parsing.
//!
//! Accepts `<owner> [<ttl>] [<class>] <type> <rdata...>` with TTL and class in
//! either order. Owner and rdata names without a trailing dot are taken as
//! relative to the root. Only class IN is supported.
//!
//! Record data goes through hickory's text parsers. The RFC 3597 generic
//! form `\# <length> <hex>` is accepted for every type.

use hickory_proto::rr::{Name, RData, Record, RecordType};
use hickory_proto::serialize::binary::{BinDecoder, BinEncodable, Restrict};
use hickory_proto::serialize::txt::RDataParser;
use json_dns_domain::{DomainError, RecordType as KnownType};
use std::str::FromStr;

/// TTL applied when a line omits one.
pub const DEFAULT_TTL: u32 = 3600;

const GENERIC_RDATA_MARKER: &str = r"\#";
const DNAME_CODE: u16 = 39;

#[derive(Debug, Clone, PartialEq, Eq)]
struct Token {
    raw: String,
    quoted: bool,
}

/// Parses one resource record in presentation format.
pub fn parse_record(line: &str) -> Result<Record, DomainError> {
    let tokens = tokenize(line)?;
    let mut tokens = tokens.iter();

    let owner = tokens
        .next()
        .ok_or_else(|| DomainError::RecordParse("empty record".to_string()))?;
    if owner.quoted || owner.raw.starts_with('$') {
        return Err(DomainError::RecordParse(format!(
            "invalid owner name '{}'",
            owner.raw
        )));
    }
    let owner = parse_name(&owner.raw)?;

    let mut ttl = None;
    let mut class_seen = false;
    let record_type = loop {
        let token = tokens
            .next()
            .ok_or_else(|| DomainError::RecordParse("missing record type".to_string()))?;
        if token.quoted {
            return Err(DomainError::RecordParse(format!(
                "unexpected quoted text '{}'",
                token.raw
            )));
        }

        if ttl.is_none() && token.raw.bytes().all(|b| b.is_ascii_digit()) {
            ttl = Some(token.raw.parse::<u32>().map_err(|e| {
                DomainError::RecordParse(format!("invalid TTL '{}': {}", token.raw, e))
            })?);
            continue;
        }

        if !class_seen && is_class(&token.raw) {
            if !token.raw.eq_ignore_ascii_case("IN") && !token.raw.eq_ignore_ascii_case("CLASS1") {
                return Err(DomainError::RecordParse(format!(
                    "unsupported class '{}'",
                    token.raw
                )));
            }
            class_seen = true;
            continue;
        }

        break parse_type(&token.raw)?;
    };

    let rdata: Vec<&Token> = tokens.collect();
    let rdata = parse_rdata(record_type, &rdata)?;

    Ok(Record::from_rdata(owner, ttl.unwrap_or(DEFAULT_TTL), rdata))
}

fn is_class(token: &str) -> bool {
    ["IN", "CH", "CS", "HS", "NONE", "ANY"]
        .iter()
        .any(|c| token.eq_ignore_ascii_case(c))
        || token.to_ascii_uppercase().starts_with("CLASS")
}

/// Resolves a type mnemonic or its `TYPEnnn` form.
fn parse_type(raw: &str) -> Result<RecordType, DomainError> {
    let upper = raw.to_ascii_uppercase();
    if let Some(code) = upper
        .strip_prefix("TYPE")
        .and_then(|code| code.parse::<u16>().ok())
    {
        return Ok(RecordType::from(code));
    }
    if let Ok(known) = KnownType::from_str(&upper) {
        return Ok(RecordType::from(known.to_u16()));
    }
    RecordType::from_str(&upper)
        .map_err(|_| DomainError::RecordParse(format!("unknown record type '{}'", raw)))
}

fn parse_rdata(record_type: RecordType, fields: &[&Token]) -> Result<RData, DomainError> {
    if let Some((marker, rest)) = fields.split_first() {
        if !marker.quoted && marker.raw == GENERIC_RDATA_MARKER {
            return parse_generic_rdata(record_type, rest);
        }
    }

    if u16::from(record_type) == DNAME_CODE {
        let [target] = fields else {
            return Err(DomainError::RecordParse(format!(
                "DNAME record expects 1 rdata field, got {}",
                fields.len()
            )));
        };
        let wire = parse_name(&target.raw)?
            .to_bytes()
            .map_err(|e| DomainError::RecordParse(format!("invalid DNAME target: {}", e)))?;
        return decode_rdata(record_type, &wire);
    }

    let values = fields
        .iter()
        .map(|t| {
            if record_type == RecordType::TXT && !t.quoted {
                unescape(&t.raw)
            } else {
                Ok(t.raw.clone())
            }
        })
        .collect::<Result<Vec<_>, _>>()?;

    let root = Name::root();
    let mut values = values.iter().map(String::as_str);
    let rdata = RData::parse(record_type, values.by_ref(), Some(&root)).map_err(|e| {
        DomainError::RecordParse(format!("invalid {} rdata: {}", record_type, e))
    })?;

    let trailing = values.count();
    if trailing > 0 {
        return Err(DomainError::RecordParse(format!(
            "{} rdata has {} unexpected trailing field(s)",
            record_type, trailing
        )));
    }
    Ok(rdata)
}

/// `\# <length> <hex...>`: raw rdata, decoded with the type's wire format.
fn parse_generic_rdata(record_type: RecordType, fields: &[&Token]) -> Result<RData, DomainError> {
    let (length, data) = fields.split_first().ok_or_else(|| {
        DomainError::RecordParse("generic rdata is missing its length".to_string())
    })?;
    let length: usize = length.raw.parse().map_err(|e| {
        DomainError::RecordParse(format!("invalid generic rdata length '{}': {}", length.raw, e))
    })?;

    let hex_text: String = data.iter().map(|t| t.raw.as_str()).collect();
    let wire = hex::decode(&hex_text)
        .map_err(|e| DomainError::RecordParse(format!("invalid generic rdata hex: {}", e)))?;
    if wire.len() != length {
        return Err(DomainError::RecordParse(format!(
            "generic rdata declares {} byte(s) but carries {}",
            length,
            wire.len()
        )));
    }
    decode_rdata(record_type, &wire)
}

fn decode_rdata(record_type: RecordType, wire: &[u8]) -> Result<RData, DomainError> {
    let length = u16::try_from(wire.len())
        .map_err(|_| DomainError::RecordParse("rdata longer than 65535 bytes".to_string()))?;
    let mut decoder = BinDecoder::new(wire);
    RData::read(&mut decoder, record_type, Restrict::new(length))
        .map_err(|e| DomainError::RecordParse(format!("invalid {} rdata: {}", record_type, e)))
}

/// Parses a domain name, treating names without a trailing dot as relative
/// to the root.
pub fn parse_name(raw: &str) -> Result<Name, DomainError> {
    if raw == "@" {
        return Err(DomainError::RecordParse(
            "'@' needs an origin, none is defined".to_string(),
        ));
    }
    let fqdn = if is_fully_qualified(raw) {
        raw.to_string()
    } else {
        format!("{}.", raw)
    };
    Name::from_ascii(&fqdn)
        .map_err(|e| DomainError::RecordParse(format!("invalid name '{}': {}", raw, e)))
}

fn is_fully_qualified(raw: &str) -> bool {
    let trailing_backslashes = raw
        .trim_end_matches('.')
        .bytes()
        .rev()
        .take_while(|&b| b == b'\\')
        .count();
    raw.ends_with('.') && trailing_backslashes % 2 == 0
}

/// Splits a line into tokens, honouring quotes, escapes, `;` comments and
/// `(` `)` grouping.
fn tokenize(line: &str) -> Result<Vec<Token>, DomainError> {
    let mut tokens = Vec::new();
    let mut chars = line.chars();
    let mut current = String::new();

    let flush = |current: &mut String, tokens: &mut Vec<Token>| {
        if !current.is_empty() {
            tokens.push(Token {
                raw: std::mem::take(current),
                quoted: false,
            });
        }
    };

    while let Some(c) = chars.next() {
        match c {
            '\\' => {
                current.push('\\');
                let escaped = chars.next().ok_or_else(|| {
                    DomainError::RecordParse("dangling escape at end of line".to_string())
                })?;
                current.push(escaped);
            }
            '"' => {
                flush(&mut current, &mut tokens);
                let mut raw = String::new();
                let mut closed = false;
                while let Some(q) = chars.next() {
                    match q {
                        '\\' => {
                            raw.push('\\');
                            if let Some(escaped) = chars.next() {
                                raw.push(escaped);
                            }
                        }
                        '"' => {
                            closed = true;
                            break;
                        }
                        other => raw.push(other),
                    }
                }
                if !closed {
                    return Err(DomainError::RecordParse(
                        "unterminated quoted string".to_string(),
                    ));
                }
                tokens.push(Token {
                    raw: unescape(&raw)?,
                    quoted: true,
                });
            }
            ';' => break,
            '(' | ')' => flush(&mut current, &mut tokens),
            c if c.is_whitespace() => flush(&mut current, &mut tokens),
            other => current.push(other),
        }
    }
    flush(&mut current, &mut tokens);
    Ok(tokens)
}

/// Resolves `\X` and `\DDD` escapes of a character-string.
fn unescape(raw: &str) -> Result<String, DomainError> {
    let bytes = raw.as_bytes();
    let mut out = Vec::with_capacity(bytes.len());
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] != b'\\' {
            out.push(bytes[i]);
            i += 1;
            continue;
        }
        let digits = bytes.get(i + 1..i + 4);
        match digits {
            Some(d) if d.iter().all(u8::is_ascii_digit) => {
                let value = d
                    .iter()
                    .fold(0u32, |acc, &b| acc * 10 + u32::from(b - b'0'));
                let byte = u8::try_from(value).map_err(|_| {
                    DomainError::RecordParse(format!("escape \\{} out of range", value))
                })?;
                out.push(byte);
                i += 4;
            }
            _ => {
                if let Some(&next) = bytes.get(i + 1) {
                    out.push(next);
                }
                i += 2;
            }
        }
    }
    Ok(String::from_utf8_lossy(&out).into_owned())
}
