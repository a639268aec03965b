#![allow(dead_code)]

mod mock_backend;

pub use mock_backend::MockDnsBackend;
