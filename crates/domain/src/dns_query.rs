use super::RecordType;
use std::sync::Arc;

/// DNSSEC OK flag, bit 15 of the OPT record TTL field (RFC 3225).
pub const EDNS_DO_BIT: u32 = 0x0000_8000;

/// EDNS0 option code for DNS cookies (RFC 7873).
pub const EDNS_COOKIE_CODE: u16 = 10;

/// One option carried in the RDATA of an OPT pseudo-record.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EdnsOption {
    pub code: u16,
    pub data: Vec<u8>,
}

impl EdnsOption {
    pub fn new(code: u16, data: impl Into<Vec<u8>>) -> Self {
        Self {
            code,
            data: data.into(),
        }
    }

    pub fn is_cookie(&self) -> bool {
        self.code == EDNS_COOKIE_CODE
    }
}

/// Raw view of an OPT pseudo-record (RFC 6891 §6.1.2).
///
/// The CLASS field carries the requestor's UDP payload size and the TTL
/// field packs extended RCODE, version, DO and the remaining Z bits. Both
/// are kept verbatim so they can be echoed bit-exactly.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EdnsRecord {
    pub udp_payload_size: u16,
    pub ttl: u32,
    pub options: Vec<EdnsOption>,
}

impl EdnsRecord {
    pub fn new(udp_payload_size: u16, ttl: u32) -> Self {
        Self {
            udp_payload_size,
            ttl,
            options: Vec::new(),
        }
    }

    pub fn dnssec_ok(&self) -> bool {
        self.ttl & EDNS_DO_BIT != 0
    }

    /// Upper eight bits of the 12-bit RCODE, kept in the top TTL byte.
    pub fn extended_rcode(&self) -> u8 {
        (self.ttl >> 24) as u8
    }

    pub fn set_extended_rcode(&mut self, high_bits: u8) {
        self.ttl = (self.ttl & 0x00FF_FFFF) | (u32::from(high_bits) << 24);
    }

    pub fn option(&self, code: u16) -> Option<&EdnsOption> {
        self.options.iter().find(|o| o.code == code)
    }
}

/// Immutable view of an inbound DNS query.
#[derive(Debug, Clone)]
pub struct DnsQuery {
    pub id: u16,
    pub opcode: u8,
    /// Query name as received, fully-qualified, original case preserved.
    pub name: Arc<str>,
    pub record_type: u16,
    pub class: u16,
    pub recursion_desired: bool,
    pub checking_disabled: bool,
    pub edns: Option<EdnsRecord>,
}

impl DnsQuery {
    pub fn new(name: impl Into<Arc<str>>, record_type: u16) -> Self {
        Self {
            id: 0,
            opcode: 0,
            name: name.into(),
            record_type,
            class: 1,
            recursion_desired: false,
            checking_disabled: false,
            edns: None,
        }
    }

    pub fn with_id(mut self, id: u16) -> Self {
        self.id = id;
        self
    }

    pub fn with_flags(mut self, recursion_desired: bool, checking_disabled: bool) -> Self {
        self.recursion_desired = recursion_desired;
        self.checking_disabled = checking_disabled;
        self
    }

    pub fn with_edns(mut self, edns: EdnsRecord) -> Self {
        self.edns = Some(edns);
        self
    }

    pub fn known_type(&self) -> Option<RecordType> {
        RecordType::from_u16(self.record_type)
    }

    pub fn has_edns(&self) -> bool {
        self.edns.is_some()
    }

    pub fn dnssec_ok(&self) -> bool {
        self.edns.as_ref().is_some_and(EdnsRecord::dnssec_ok)
    }

    /// Largest response the client accepts over UDP.
    pub fn max_udp_payload(&self) -> usize {
        match &self.edns {
            Some(edns) => usize::from(edns.udp_payload_size.max(512)),
            None => 512,
        }
    }
}
