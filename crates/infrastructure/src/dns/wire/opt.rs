use json_dns_domain::EdnsRecord;

const OPT_TYPE: [u8; 2] = [0x00, 0x29];

/// Serializes `edns` as an OPT pseudo-record owned by the root name.
pub fn encode_opt(edns: &EdnsRecord) -> Vec<u8> {
    let rdata_len: usize = edns.options.iter().map(|o| 4 + o.data.len()).sum();
    let mut buf = Vec::with_capacity(11 + rdata_len);

    buf.push(0x00);
    buf.extend_from_slice(&OPT_TYPE);
    buf.extend_from_slice(&edns.udp_payload_size.to_be_bytes());
    buf.extend_from_slice(&edns.ttl.to_be_bytes());
    buf.extend_from_slice(&(rdata_len as u16).to_be_bytes());
    for option in &edns.options {
        buf.extend_from_slice(&option.code.to_be_bytes());
        buf.extend_from_slice(&(option.data.len() as u16).to_be_bytes());
        buf.extend_from_slice(&option.data);
    }
    buf
}

/// Appends an OPT record to an encoded message and bumps ARCOUNT.
pub fn append_opt(message: &mut Vec<u8>, edns: &EdnsRecord) {
    if message.len() < 12 {
        return;
    }
    let arcount = u16::from_be_bytes([message[10], message[11]]).saturating_add(1);
    message[10..12].copy_from_slice(&arcount.to_be_bytes());
    message.extend_from_slice(&encode_opt(edns));
}
