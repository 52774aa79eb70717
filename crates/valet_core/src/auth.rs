use std::sync::RwLock;

use valet_http::Request;

pub const API_KEY_HEADER: &str = "x-api-key";
pub const PASSCODE_PARAM: &str = "passcode";

/// Hot-reloadable shared-secret credential.
///
/// Set at startup from configuration, rotated at runtime by the admin
/// endpoint, read by every auth check. Reads and writes go through the
/// same lock; no connection can observe a torn value.
#[derive(Debug)]
pub struct Passcode {
    current: RwLock<String>,
}

impl Passcode {
    pub fn new(initial: impl Into<String>) -> Self {
        Self {
            current: RwLock::new(initial.into()),
        }
    }

    pub fn matches(&self, candidate: &str) -> bool {
        self.current
            .read()
            .map(|current| *current == candidate)
            .unwrap_or(false)
    }

    /// Replaces the credential; effective for the very next request.
    pub fn rotate(&self, next: impl Into<String>) {
        if let Ok(mut current) = self.current.write() {
            *current = next.into();
        }
    }

    /// Accepts a request carrying the passcode in the `x-api-key` header
    /// or the `passcode` query parameter. No other credential form counts.
    pub fn authorize(&self, req: &Request) -> bool {
        if let Some(candidate) = req.header(API_KEY_HEADER) {
            if self.matches(candidate) {
                return true;
            }
        }
        if let Some(candidate) = req.query_param(PASSCODE_PARAM) {
            if self.matches(candidate) {
                return true;
            }
        }
        false
    }
}
