//! json-dns domain layer
pub mod authority;
pub mod backend;
pub mod config;
pub mod dns_query;
pub mod dns_record;
pub mod errors;
pub mod query_route;

pub use authority::{AuthorityTemplate, TemplateBindings, TemplateSyntax};
pub use backend::{BackendAnswer, BackendOutcome, BackendQuestion, BackendRecord};
pub use config::{BackendConfig, Config, ConfigError};
pub use dns_query::{DnsQuery, EdnsOption, EdnsRecord, EDNS_COOKIE_CODE, EDNS_DO_BIT};
pub use dns_record::RecordType;
pub use errors::DomainError;
pub use query_route::QueryRoute;
