//! Chiller error-code dictionary

use std::collections::HashMap;
use std::path::Path;
use thiserror::Error;
use tracing::{info, warn};

/// Description used when a code is missing from the dictionary
pub const UNKNOWN_ERROR_CODE: &str = "Unknown error code";

/// Errors while loading the dictionary
#[derive(Debug, Error)]
pub enum CodeBookError {
    #[error("Failed to read error code file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Malformed error code file: {0}")]
    Parse(#[from] serde_json::Error),

    #[error("Error code key {0:?} is not an integer register value")]
    InvalidKey(String),
}

/// Maps register error codes to human-readable descriptions.
///
/// Loaded once at startup from a JSON object such as
/// `{"101": "High pressure", "202": "Low refrigerant"}`.
#[derive(Debug, Clone, Default)]
pub struct ErrorCodeBook {
    entries: HashMap<u16, String>,
}

impl ErrorCodeBook {
    /// Parse a JSON document of stringified codes to descriptions
    pub fn from_json(json: &str) -> Result<Self, CodeBookError> {
        let raw: HashMap<String, String> = serde_json::from_str(json)?;
        let entries = raw
            .into_iter()
            .map(|(key, description)| {
                key.trim()
                    .parse::<u16>()
                    .map(|code| (code, description))
                    .map_err(|_| CodeBookError::InvalidKey(key))
            })
            .collect::<Result<HashMap<_, _>, _>>()?;
        Ok(Self { entries })
    }

    /// Load the dictionary from disk.
    ///
    /// A missing file is not fatal: every code then resolves to
    /// [`UNKNOWN_ERROR_CODE`].
    pub fn load(path: impl AsRef<Path>) -> Result<Self, CodeBookError> {
        let path = path.as_ref();
        let json = match std::fs::read_to_string(path) {
            Ok(json) => json,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                warn!("Error code file {} not found, descriptions unavailable", path.display());
                return Ok(Self::default());
            }
            Err(source) => {
                return Err(CodeBookError::Io {
                    path: path.display().to_string(),
                    source,
                })
            }
        };

        let book = Self::from_json(&json)?;
        info!("Loaded {} error codes from {}", book.len(), path.display());
        Ok(book)
    }

    /// Description for a code, or [`UNKNOWN_ERROR_CODE`]
    pub fn describe(&self, code: u16) -> &str {
        self.entries
            .get(&code)
            .map(String::as_str)
            .unwrap_or(UNKNOWN_ERROR_CODE)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}
