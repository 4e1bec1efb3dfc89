#![forbid(unsafe_code)]

pub mod backend;
pub mod dto;
pub mod error;
pub mod http;
pub mod memory;

pub use backend::{AuthoringApi, IdentityApi, LearnerApi};
pub use error::ApiError;
pub use http::{ApiConfig, HttpBackend};
pub use memory::{Endpoint, InMemoryBackend};
