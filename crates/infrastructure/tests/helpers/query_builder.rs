/// Hand-assembled DNS query bytes.
pub struct QueryBuilder {
    id: u16,
    flags: u16,
    name: String,
    qtype: u16,
    qclass: u16,
    opt: Option<(u16, u32, Vec<(u16, Vec<u8>)>)>,
}

impl QueryBuilder {
    pub fn new(name: &str, qtype: u16) -> Self {
        Self {
            id: 0x1234,
            flags: 0x0100,
            name: name.to_string(),
            qtype,
            qclass: 1,
            opt: None,
        }
    }

    pub fn id(mut self, id: u16) -> Self {
        self.id = id;
        self
    }

    pub fn flags(mut self, flags: u16) -> Self {
        self.flags = flags;
        self
    }

    pub fn recursion_desired(mut self, rd: bool) -> Self {
        if rd {
            self.flags |= 0x0100;
        } else {
            self.flags &= !0x0100;
        }
        self
    }

    pub fn checking_disabled(mut self, cd: bool) -> Self {
        if cd {
            self.flags |= 0x0010;
        } else {
            self.flags &= !0x0010;
        }
        self
    }

    pub fn opcode(mut self, opcode: u8) -> Self {
        self.flags = (self.flags & !0x7800) | (u16::from(opcode & 0x0F) << 11);
        self
    }

    pub fn class(mut self, qclass: u16) -> Self {
        self.qclass = qclass;
        self
    }

    /// Adds an OPT record with the given payload size and raw TTL.
    pub fn edns(mut self, udp_size: u16, ttl: u32) -> Self {
        self.opt = Some((udp_size, ttl, Vec::new()));
        self
    }

    pub fn dnssec_ok(self, udp_size: u16) -> Self {
        self.edns(udp_size, 0x0000_8000)
    }

    pub fn option(mut self, code: u16, data: &[u8]) -> Self {
        let opt = self.opt.get_or_insert((1232, 0, Vec::new()));
        opt.2.push((code, data.to_vec()));
        self
    }

    pub fn build(&self) -> Vec<u8> {
        let mut buf = Vec::new();
        buf.extend_from_slice(&self.id.to_be_bytes());
        buf.extend_from_slice(&self.flags.to_be_bytes());
        buf.extend_from_slice(&[0x00, 0x01]); // QDCOUNT
        buf.extend_from_slice(&[0x00, 0x00]); // ANCOUNT
        buf.extend_from_slice(&[0x00, 0x00]); // NSCOUNT
        let arcount: u16 = if self.opt.is_some() { 1 } else { 0 };
        buf.extend_from_slice(&arcount.to_be_bytes());

        for label in self.name.trim_end_matches('.').split('.') {
            if label.is_empty() {
                continue;
            }
            buf.push(label.len() as u8);
            buf.extend_from_slice(label.as_bytes());
        }
        buf.push(0x00);
        buf.extend_from_slice(&self.qtype.to_be_bytes());
        buf.extend_from_slice(&self.qclass.to_be_bytes());

        if let Some((udp_size, ttl, options)) = &self.opt {
            let rdata_len: usize = options.iter().map(|(_, d)| 4 + d.len()).sum();
            buf.push(0x00); // root owner
            buf.extend_from_slice(&[0x00, 41]); // TYPE = OPT
            buf.extend_from_slice(&udp_size.to_be_bytes());
            buf.extend_from_slice(&ttl.to_be_bytes());
            buf.extend_from_slice(&(rdata_len as u16).to_be_bytes());
            for (code, data) in options {
                buf.extend_from_slice(&code.to_be_bytes());
                buf.extend_from_slice(&(data.len() as u16).to_be_bytes());
                buf.extend_from_slice(data);
            }
        }
        buf
    }
}
