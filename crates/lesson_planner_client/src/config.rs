//! crates/lesson_planner_client/src/config.rs
//!
//! Where the client sends its requests.

/// A custom error type for client configuration failures.
#[derive(Debug, thiserror::Error)]
pub enum ClientConfigError {
    #[error("Missing the environment variable {0}")]
    MissingVar(String),
    #[error("Invalid value for the environment variable {0}: {1}")]
    InvalidValue(String, String),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ClientConfig {
    /// Scheme and authority, e.g. `http://localhost:3000`. Never ends with `/`.
    pub base_url: String,
    /// When set, request paths are rewritten to `/backend/api/<resource>.<ext>`.
    pub script_extension: Option<String>,
}

impl ClientConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            script_extension: None,
        }
    }

    /// Targets a backend that serves one script per resource.
    pub fn with_script_extension(mut self, ext: impl Into<String>) -> Self {
        self.script_extension = Some(ext.into().trim_start_matches('.').to_string());
        self
    }

    /// Reads `LESSON_PLANNER_API_URL` and the optional `LESSON_PLANNER_SCRIPT_EXT`.
    ///
    /// A `.env` file is honoured outside of tests.
    pub fn from_env() -> Result<Self, ClientConfigError> {
        if !cfg!(test) {
            dotenvy::dotenv().ok();
        }

        let base_url = std::env::var("LESSON_PLANNER_API_URL")
            .map_err(|_| ClientConfigError::MissingVar("LESSON_PLANNER_API_URL".to_string()))?;
        if !(base_url.starts_with("http://") || base_url.starts_with("https://")) {
            return Err(ClientConfigError::InvalidValue(
                "LESSON_PLANNER_API_URL".to_string(),
                format!("'{}' is not an http(s) URL", base_url),
            ));
        }

        let config = Self::new(base_url);
        Ok(match std::env::var("LESSON_PLANNER_SCRIPT_EXT") {
            Ok(ext) if !ext.trim().is_empty() => config.with_script_extension(ext.trim()),
            _ => config,
        })
    }
}
