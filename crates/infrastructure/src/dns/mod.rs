pub mod authority;
pub mod records;
pub mod server;
pub mod synthesizer;
pub mod wire;

pub use authority::{AuthorityCatalog, RenderedRecords, SAMPLE_QNAME};
pub use server::{DnsServerHandler, Transport};
pub use synthesizer::{echo_edns, ResponseSynthesizer, SynthesisReport, SynthesizedResponse};
