//! Codec configuration

use serde::{Deserialize, Serialize};

/// Default upper bound on a single encoded record (16 MiB).
pub const DEFAULT_MAX_MESSAGE_SIZE: usize = 16 * 1024 * 1024;

/// Limits applied by `WireRecord::from_bytes_with`.
///
/// Hosts usually embed this in their own configuration file; every field
/// falls back to its default when omitted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct CodecConfig {
    /// Max encoded record size in bytes
    pub max_message_size: usize,
}

impl Default for CodecConfig {
    fn default() -> Self {
        Self {
            max_message_size: DEFAULT_MAX_MESSAGE_SIZE,
        }
    }
}

impl CodecConfig {
    /// Config with no effective size limit.
    pub fn unlimited() -> Self {
        Self {
            max_message_size: usize::MAX,
        }
    }
}
