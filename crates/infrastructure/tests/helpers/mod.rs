#![allow(dead_code)]
mod query_builder;
mod stub_backend;

pub use query_builder::QueryBuilder;
pub use stub_backend::StubBackend;
