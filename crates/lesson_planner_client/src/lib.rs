//! HTTP client for the lesson planner REST API.

pub mod config;
pub mod http;

pub use config::{ClientConfig, ClientConfigError};
pub use http::HttpClient;
