pub mod opt;
pub mod query_parser;
pub mod response;

pub use opt::{append_opt, encode_opt};
pub use query_parser::{find_opt, is_query_packet, parse_query, ParsedQuery};
pub use response::{build_error_response, build_truncated_response};
