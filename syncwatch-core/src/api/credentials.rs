//! Authentication applied to every request sent to the sync daemon

use crate::error::ConfigError;
use reqwest::RequestBuilder;
use std::path::Path;

pub const CSRF_HEADER: &str = "X-CSRF-Token";
pub const API_KEY_HEADER: &str = "X-API-Key";

/// Optional credentials; each one present is sent with every request
#[derive(Debug, Clone, Default)]
pub struct Credentials {
    pub user: Option<String>,
    pub password: Option<String>,
    pub api_key: Option<String>,
    pub csrf_token: Option<String>,
}

impl Credentials {
    /// Read the CSRF token from the last line of `path`
    pub fn read_csrf_token(path: &Path) -> Result<String, ConfigError> {
        let content = std::fs::read_to_string(path)
            .map_err(|source| ConfigError::Read { path: path.to_path_buf(), source })?;
        content
            .lines()
            .last()
            .map(|line| line.trim().to_string())
            .filter(|token| !token.is_empty())
            .ok_or_else(|| ConfigError::Invalid(format!("no CSRF token in {}", path.display())))
    }

    pub(crate) fn apply(&self, mut request: RequestBuilder) -> RequestBuilder {
        if let Some(token) = non_empty(&self.csrf_token) {
            request = request.header(CSRF_HEADER, token);
        }
        if let Some(user) = non_empty(&self.user) {
            request = request.basic_auth(user, self.password.as_deref());
        }
        if let Some(key) = non_empty(&self.api_key) {
            request = request.header(API_KEY_HEADER, key);
        }
        request
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().filter(|v| !v.is_empty())
}
