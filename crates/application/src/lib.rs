//! json-dns application layer: ports, services and use cases
pub mod ports;
pub mod services;
pub mod use_cases;
