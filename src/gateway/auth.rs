//! Shared-secret check for the HTTP API.

use std::fmt;

/// Header carrying the API key.
pub const API_KEY_HEADER: &str = "x-api-key";

/// Result of an authorization check.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Authorization {
    Authorized,
    Unauthorized,
}

/// Compares a presented key against the configured secret.
#[derive(Clone)]
pub struct ApiKeyGuard {
    secret: String,
}

impl ApiKeyGuard {
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: secret.into(),
        }
    }

    /// Exact, case-sensitive match. An empty secret never authorizes.
    pub fn check(&self, presented: Option<&str>) -> Authorization {
        match presented {
            Some(key) if !self.secret.is_empty() && constant_time_eq(key, &self.secret) => {
                Authorization::Authorized
            }
            _ => Authorization::Unauthorized,
        }
    }
}

impl fmt::Debug for ApiKeyGuard {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ApiKeyGuard")
            .field("secret", &"<redacted>")
            .finish()
    }
}

/// Constant-time string comparison to prevent timing attacks on key validation.
fn constant_time_eq(a: &str, b: &str) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.bytes()
        .zip(b.bytes())
        .fold(0u8, |acc, (x, y)| acc | (x ^ y))
        == 0
}
