//! Deterministic digests of configurations and runs.
//!
//! Values are serialized to JSON and hashed with BLAKE3. Struct fields
//! serialize in declaration order, so the digest is stable for a given
//! build and input.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::config::EngineConfig;

/// Hex-encoded BLAKE3 digest.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RunFingerprint(pub String);

impl RunFingerprint {
    pub fn of<T: Serialize + ?Sized>(value: &T) -> Self {
        let json = serde_json::to_vec(value).expect("engine types must serialize");
        Self(blake3::hash(&json).to_hex().to_string())
    }

    /// Digest of a configuration, for labelling runs.
    pub fn of_config(config: &EngineConfig) -> Self {
        Self::of(config)
    }

    /// First 12 hex digits.
    pub fn short(&self) -> &str {
        &self.0[..self.0.len().min(12)]
    }
}

impl fmt::Display for RunFingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}
